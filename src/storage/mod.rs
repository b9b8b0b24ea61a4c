//! Filesystem access
//!
//! Virtual path handling, the filesystem provider capability consumed by
//! sessions, and structured directory listings.

pub mod listing;
pub mod paths;
pub mod provider;

pub use listing::{EntryKind, FileEntry, format_list, format_nlst};
pub use paths::{resolve_virtual, virtual_to_real};
pub use provider::{FilesystemProvider, LocalFs};
