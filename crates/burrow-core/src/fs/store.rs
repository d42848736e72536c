//! Filesystem operations confined to a sandbox root.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::FsError;
use crate::fs::category::FileCategory;
use crate::fs::resolver::PathResolver;

// ============================================================================
// Entry types
// ============================================================================

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    File,
}

/// One file or subdirectory in a listing.
#[derive(Debug, Clone, Serialize)]
pub struct DirEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Metadata record for a single file or directory.
#[derive(Debug, Clone, Serialize)]
pub struct EntryInfo {
    pub name: String,
    /// Path relative to the sandbox root.
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub size: u64,
    pub modified: DateTime<Utc>,
    /// Extension-derived category; `None` for directories.
    pub category: Option<FileCategory>,
}

/// Receipt for a completed upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReceipt {
    pub name: String,
    pub size: u64,
}

// ============================================================================
// Store
// ============================================================================

/// Performs directory and file operations beneath a fixed root.
///
/// Every public operation routes its path arguments through the
/// [`PathResolver`] first; no I/O primitive ever sees an unvalidated
/// path. The store holds no locks of its own: concurrent requests rely
/// on the filesystem's per-operation atomicity. Concurrent writers to
/// the same destination name race at the filesystem level and the last
/// writer wins; that is accepted behavior, not a defect.
#[derive(Debug, Clone)]
pub struct FilesystemStore {
    resolver: PathResolver,
}

impl FilesystemStore {
    /// Create a store rooted at `root`, which must be an existing
    /// directory.
    pub fn new(root: &Path) -> io::Result<Self> {
        Ok(Self {
            resolver: PathResolver::new(root)?,
        })
    }

    /// The canonical sandbox root.
    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    /// Resolve and containment-check a raw path without touching it.
    pub fn resolve(&self, raw: &str) -> Result<PathBuf, FsError> {
        self.resolver.resolve(raw)
    }

    /// Express a resolved path relative to the root, for API responses.
    pub fn relativize(&self, resolved: &Path) -> String {
        resolved
            .strip_prefix(self.root())
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// List a directory: directories first, then case-insensitive by
    /// name within each group.
    #[instrument(level = "debug", skip(self))]
    pub fn list(&self, raw: &str) -> Result<Vec<DirEntry>, FsError> {
        let resolved = self.resolver.resolve(raw)?;
        let meta = fs::metadata(&resolved).map_err(|e| not_found_or_io(e, raw))?;
        if !meta.is_dir() {
            return Err(FsError::NotADirectory {
                path: raw.to_string(),
            });
        }
        let mut entries = Vec::new();
        for dirent in fs::read_dir(&resolved)? {
            let dirent = dirent?;
            // Follow symlinks so a link to a directory lists as one;
            // fall back to the link itself when the target dangles.
            let meta = fs::metadata(dirent.path()).or_else(|_| dirent.metadata())?;
            entries.push(DirEntry {
                name: dirent.file_name().to_string_lossy().into_owned(),
                kind: kind_of(&meta),
                size: meta.len(),
                modified: modified_of(&meta),
            });
        }
        entries.sort_by_key(|e| (e.kind != EntryKind::Directory, e.name.to_lowercase()));
        Ok(entries)
    }

    /// Metadata for a single file or directory.
    #[instrument(level = "debug", skip(self))]
    pub fn info(&self, raw: &str) -> Result<EntryInfo, FsError> {
        let resolved = self.resolver.resolve(raw)?;
        let meta = fs::metadata(&resolved).map_err(|e| not_found_or_io(e, raw))?;
        let name = resolved
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let kind = kind_of(&meta);
        Ok(EntryInfo {
            path: self.relativize(&resolved),
            kind,
            size: meta.len(),
            modified: modified_of(&meta),
            category: (kind == EntryKind::File).then(|| FileCategory::from_name(&name)),
            name,
        })
    }

    /// Validated absolute path of an existing regular file, for callers
    /// that stream the content themselves (download, preview).
    pub fn file_path(&self, raw: &str) -> Result<PathBuf, FsError> {
        let resolved = self.resolver.resolve(raw)?;
        let meta = fs::metadata(&resolved).map_err(|e| not_found_or_io(e, raw))?;
        if meta.is_dir() {
            return Err(FsError::IsADirectory {
                path: raw.to_string(),
            });
        }
        Ok(resolved)
    }

    /// Read an entire file as UTF-8 text.
    pub fn read_to_string(&self, raw: &str) -> Result<String, FsError> {
        let path = self.file_path(raw)?;
        Ok(fs::read_to_string(path)?)
    }

    /// Create a directory, including missing parents. Succeeds silently
    /// if the directory already exists.
    #[instrument(level = "debug", skip(self))]
    pub fn mkdir(&self, raw: &str) -> Result<PathBuf, FsError> {
        let resolved = self.resolver.resolve(raw)?;
        fs::create_dir_all(&resolved)?;
        debug!(path = %resolved.display(), "directory created");
        Ok(resolved)
    }

    /// Rename or move a file or directory. Both endpoints are
    /// independently resolved and containment-checked; the rename itself
    /// is atomic where the filesystem supports it.
    #[instrument(level = "debug", skip(self))]
    pub fn rename(&self, old_raw: &str, new_raw: &str) -> Result<PathBuf, FsError> {
        let old = self.resolver.resolve(old_raw)?;
        let new = self.resolver.resolve(new_raw)?;
        if fs::symlink_metadata(&old).is_err() {
            return Err(FsError::NotFound {
                path: old_raw.to_string(),
            });
        }
        fs::rename(&old, &new)?;
        info!(from = %old.display(), to = %new.display(), "renamed");
        Ok(new)
    }

    /// Delete a file, or a directory and its contents recursively.
    /// Deleting the root itself is refused.
    #[instrument(level = "debug", skip(self))]
    pub fn delete(&self, raw: &str) -> Result<(), FsError> {
        let resolved = self.resolver.resolve(raw)?;
        if resolved == self.root() {
            return Err(FsError::PermissionDenied {
                reason: "refusing to delete the sandbox root".to_string(),
            });
        }
        let meta = fs::metadata(&resolved).map_err(|e| not_found_or_io(e, raw))?;
        if meta.is_dir() {
            fs::remove_dir_all(&resolved)?;
        } else {
            fs::remove_file(&resolved)?;
        }
        info!(path = %resolved.display(), "deleted");
        Ok(())
    }

    /// Start a size-capped upload into the directory at `dir_raw`.
    ///
    /// The supplied filename is reduced to its final path component, and
    /// the destination directory and the final destination path are
    /// independently containment-checked. The returned sink removes its
    /// partial file when dropped before [`UploadSink::finish`].
    #[instrument(level = "debug", skip(self))]
    pub fn begin_upload(
        &self,
        dir_raw: &str,
        filename: &str,
        limit: u64,
    ) -> Result<UploadSink, FsError> {
        let dir = self.resolver.resolve(dir_raw)?;
        if !dir.is_dir() {
            return Err(FsError::NotADirectory {
                path: dir_raw.to_string(),
            });
        }
        let name = sanitize_filename(filename)?;
        let dest = self.resolver.confine(&dir.join(&name))?;
        let file = File::create(&dest).map_err(|e| write_error(e, &dest))?;
        debug!(dest = %dest.display(), limit, "upload started");
        Ok(UploadSink {
            file: Some(file),
            dest,
            name,
            written: 0,
            limit,
        })
    }
}

// ============================================================================
// Upload sink
// ============================================================================

/// Incremental writer for a single upload.
///
/// Bytes are counted as they arrive so an oversized stream is aborted
/// before it exhausts memory or disk. Every failure path removes the
/// partial file: nothing is left behind at the destination on
/// [`FsError::TooLarge`], [`FsError::StorageExhausted`], any other write
/// error, or an unfinished drop (client disconnect).
#[derive(Debug)]
pub struct UploadSink {
    file: Option<File>,
    dest: PathBuf,
    name: String,
    written: u64,
    limit: u64,
}

impl UploadSink {
    /// Sanitized destination filename.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bytes accepted so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Append one chunk, enforcing the byte cap.
    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), FsError> {
        let Some(file) = self.file.as_mut() else {
            return Err(FsError::Io(io::Error::other("upload already closed")));
        };
        self.written += chunk.len() as u64;
        if self.written > self.limit {
            let limit = self.limit;
            self.discard();
            warn!(limit, "upload exceeded size limit");
            return Err(FsError::TooLarge { limit });
        }
        if let Err(e) = file.write_all(chunk) {
            let err = write_error(e, &self.dest);
            self.discard();
            return Err(err);
        }
        Ok(())
    }

    /// Flush and keep the file, returning the stored name and byte
    /// count.
    pub fn finish(mut self) -> Result<UploadReceipt, FsError> {
        if let Some(mut file) = self.file.take() {
            if let Err(e) = file.flush().and_then(|()| file.sync_all()) {
                let err = write_error(e, &self.dest);
                drop(file);
                let _ = fs::remove_file(&self.dest);
                return Err(err);
            }
        }
        info!(name = %self.name, size = self.written, "upload complete");
        Ok(UploadReceipt {
            name: self.name.clone(),
            size: self.written,
        })
    }

    /// Abandon the upload and remove the partial file.
    pub fn abort(mut self) {
        self.discard();
    }

    fn discard(&mut self) {
        if let Some(file) = self.file.take() {
            drop(file);
            let _ = fs::remove_file(&self.dest);
        }
    }
}

impl Drop for UploadSink {
    fn drop(&mut self) {
        self.discard();
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn kind_of(meta: &fs::Metadata) -> EntryKind {
    if meta.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    }
}

fn modified_of(meta: &fs::Metadata) -> DateTime<Utc> {
    meta.modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Reduce an untrusted filename to its final path component.
fn sanitize_filename(filename: &str) -> Result<String, FsError> {
    Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| FsError::InvalidFilename {
            name: filename.to_string(),
        })
}

fn not_found_or_io(e: io::Error, raw: &str) -> FsError {
    // NotADirectory means a path component exists as a regular file;
    // nothing exists at the full path, same as NotFound to the client.
    if matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    ) {
        FsError::NotFound {
            path: raw.to_string(),
        }
    } else {
        FsError::Io(e)
    }
}

fn write_error(e: io::Error, dest: &Path) -> FsError {
    if e.kind() == io::ErrorKind::StorageFull {
        FsError::StorageExhausted {
            path: dest.display().to_string(),
        }
    } else {
        FsError::Io(e)
    }
}
