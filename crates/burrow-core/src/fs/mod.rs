//! Path confinement and filesystem operations.
//!
//! Every path string a client supplies is routed through
//! [`PathResolver`] before any I/O happens; [`FilesystemStore`] performs
//! the actual operations against the resolved paths. Side effects are
//! confined to the subtree under the root.

pub mod category;
pub mod resolver;
pub mod store;

pub use category::FileCategory;
pub use resolver::PathResolver;
pub use store::{DirEntry, EntryInfo, EntryKind, FilesystemStore, UploadReceipt, UploadSink};
