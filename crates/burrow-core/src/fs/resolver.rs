//! Symlink-aware path confinement.
//!
//! Resolution must dereference symlinks against the real filesystem: a
//! purely lexical normalizer would let a symlink escape the root even
//! when the path string looks contained. This is the single most
//! safety-critical invariant in the crate.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, trace};

use crate::error::FsError;

/// Resolves untrusted relative paths against a fixed root directory.
///
/// The root is canonicalized once at construction and never changes for
/// the lifetime of the resolver. [`resolve`](Self::resolve) guarantees
/// the returned path is the root or a descendant of it on the canonical
/// path tree, or fails with [`FsError::PathEscape`] before any I/O
/// primitive touches the path.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver rooted at `root`, which must exist.
    pub fn new(root: &Path) -> io::Result<Self> {
        let root = fs::canonicalize(root)?;
        Ok(Self { root })
    }

    /// The canonical sandbox root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an untrusted relative path to a canonical absolute path
    /// contained in the root.
    ///
    /// A leading separator is stripped (treated as relative, not as an
    /// escape to the filesystem root); the empty string and a lone `/`
    /// resolve to the root itself. The target does not have to exist:
    /// components below the deepest existing directory are appended
    /// lexically after the existing prefix has been canonicalized.
    pub fn resolve(&self, raw: &str) -> Result<PathBuf, FsError> {
        let relative = raw.trim_start_matches('/');
        let resolved = self
            .soft_canonicalize(Path::new(relative))
            .map_err(FsError::Io)?;
        if resolved.starts_with(&self.root) {
            trace!(raw, resolved = %resolved.display(), "path resolved");
            Ok(resolved)
        } else {
            debug!(raw, resolved = %resolved.display(), "path escapes root");
            Err(FsError::PathEscape {
                path: raw.to_string(),
            })
        }
    }

    /// Containment check for an already-joined absolute candidate.
    ///
    /// Used to independently re-validate the final destination of an
    /// upload after the sanitized filename has been attached: if the
    /// name turns out to be a symlink pointing outside the root, the
    /// dereferenced form fails the check.
    pub(crate) fn confine(&self, candidate: &Path) -> Result<PathBuf, FsError> {
        let resolved = match fs::canonicalize(candidate) {
            Ok(path) => path,
            Err(e) if e.kind() == io::ErrorKind::NotFound => candidate.to_path_buf(),
            Err(e) => return Err(FsError::Io(e)),
        };
        if resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            debug!(candidate = %candidate.display(), "destination escapes root");
            Err(FsError::PathEscape {
                path: candidate.display().to_string(),
            })
        }
    }

    /// Canonicalize `relative` against the root, tolerating a
    /// non-existent tail.
    ///
    /// Existing components are resolved through the filesystem so
    /// symlinks are dereferenced wherever they can be; components below
    /// the deepest existing directory are handled lexically (nothing
    /// there can be a symlink). `..` pops a component and may walk above
    /// the root; the caller's containment check is what rejects that.
    fn soft_canonicalize(&self, relative: &Path) -> io::Result<PathBuf> {
        let mut resolved = self.root.clone();
        // Number of trailing components that do not exist on disk.
        let mut missing = 0usize;
        for component in relative.components() {
            match component {
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
                Component::ParentDir => {
                    resolved.pop();
                    missing = missing.saturating_sub(1);
                }
                Component::Normal(name) => {
                    resolved.push(name);
                    if missing == 0 {
                        match fs::canonicalize(&resolved) {
                            Ok(canonical) => resolved = canonical,
                            // NotADirectory: a mid-path component exists
                            // as a regular file; nothing can exist below
                            // it, so the rest is handled lexically and
                            // the subsequent operation reports NotFound.
                            Err(e) if matches!(
                                e.kind(),
                                io::ErrorKind::NotFound
                                    | io::ErrorKind::NotADirectory
                                    | io::ErrorKind::PermissionDenied
                            ) =>
                            {
                                missing = 1;
                            }
                            Err(e) => return Err(e),
                        }
                    } else {
                        missing += 1;
                    }
                }
            }
        }
        Ok(resolved)
    }
}
