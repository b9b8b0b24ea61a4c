//! Filesystem provider capability
//!
//! Sessions never touch the disk directly; every filesystem operation
//! goes through a `FilesystemProvider` scoped to the session's home root.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::time::UNIX_EPOCH;

use log::error;

use crate::error::StorageError;
use crate::storage::listing::{EntryKind, FileEntry};
use crate::storage::paths::virtual_to_real;

/// Abstract filesystem capability consumed by a session.
///
/// `root` is the authenticated home root; `virtual_path` is an absolute
/// normalized virtual path as produced by `paths::resolve_virtual`.
/// Implementations must reject any operation that would resolve outside
/// `root`.
pub trait FilesystemProvider: Send + Sync {
    /// Lists a directory as structured entries.
    fn list_dir(&self, root: &Path, virtual_path: &str) -> Result<Vec<FileEntry>, StorageError>;

    /// Opens a file for reading.
    fn open_read(
        &self,
        root: &Path,
        virtual_path: &str,
    ) -> Result<Box<dyn Read + Send>, StorageError>;

    /// Opens a file for writing with create-or-truncate semantics.
    fn create_write(
        &self,
        root: &Path,
        virtual_path: &str,
    ) -> Result<Box<dyn Write + Send>, StorageError>;

    /// Creates a directory.
    fn make_dir(&self, root: &Path, virtual_path: &str) -> Result<(), StorageError>;

    /// Removes an empty directory.
    fn remove_dir(&self, root: &Path, virtual_path: &str) -> Result<(), StorageError>;

    /// Whether the virtual path names an existing directory.
    fn dir_exists(&self, root: &Path, virtual_path: &str) -> bool;
}

/// Local-disk provider mapping virtual paths directly under the root.
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }

    /// Resolves a virtual path and verifies the existing portion of it
    /// stays under the root, guarding against symlink escapes.
    fn resolve_checked(
        &self,
        root: &Path,
        virtual_path: &str,
    ) -> Result<std::path::PathBuf, StorageError> {
        let real = virtual_to_real(root, virtual_path);

        let canonical_root = root
            .canonicalize()
            .map_err(|_| StorageError::NotFound(virtual_path.to_string()))?;

        // The target may not exist yet (STOR, MKD); check the nearest
        // existing ancestor instead.
        let mut probe = real.as_path();
        let contained = loop {
            match probe.canonicalize() {
                Ok(canonical) => break canonical.starts_with(&canonical_root),
                Err(_) => match probe.parent() {
                    Some(parent) => probe = parent,
                    None => break false,
                },
            }
        };

        if !contained {
            error!("Path traversal attempt: {}", virtual_path);
            return Err(StorageError::PathEscapesRoot(virtual_path.to_string()));
        }

        Ok(real)
    }
}

impl Default for LocalFs {
    fn default() -> Self {
        Self::new()
    }
}

impl FilesystemProvider for LocalFs {
    fn list_dir(&self, root: &Path, virtual_path: &str) -> Result<Vec<FileEntry>, StorageError> {
        let real = self.resolve_checked(root, virtual_path)?;

        let metadata = fs::metadata(&real).map_err(|e| map_io(e, virtual_path))?;
        if !metadata.is_dir() {
            return Err(StorageError::NotADirectory(virtual_path.to_string()));
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&real).map_err(|e| map_io(e, virtual_path))? {
            let entry = entry.map_err(StorageError::Io)?;
            let name = entry.file_name().to_string_lossy().to_string();
            match entry.metadata() {
                Ok(meta) => {
                    let kind = if meta.is_dir() {
                        EntryKind::Directory
                    } else {
                        EntryKind::File
                    };
                    entries.push(FileEntry {
                        name,
                        size: if meta.is_dir() { 0 } else { meta.len() },
                        kind,
                        modified: meta.modified().unwrap_or(UNIX_EPOCH),
                    });
                }
                Err(_) => entries.push(FileEntry {
                    name,
                    size: 0,
                    kind: EntryKind::File,
                    modified: UNIX_EPOCH,
                }),
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn open_read(
        &self,
        root: &Path,
        virtual_path: &str,
    ) -> Result<Box<dyn Read + Send>, StorageError> {
        let real = self.resolve_checked(root, virtual_path)?;

        let metadata = fs::metadata(&real).map_err(|e| map_io(e, virtual_path))?;
        if metadata.is_dir() {
            return Err(StorageError::NotAFile(virtual_path.to_string()));
        }

        let file = fs::File::open(&real).map_err(|e| map_io(e, virtual_path))?;
        Ok(Box::new(file))
    }

    fn create_write(
        &self,
        root: &Path,
        virtual_path: &str,
    ) -> Result<Box<dyn Write + Send>, StorageError> {
        let real = self.resolve_checked(root, virtual_path)?;

        match real.parent() {
            Some(parent) if parent.is_dir() => {}
            _ => return Err(StorageError::NotFound(virtual_path.to_string())),
        }

        let file = fs::File::create(&real).map_err(|e| map_io(e, virtual_path))?;
        Ok(Box::new(file))
    }

    fn make_dir(&self, root: &Path, virtual_path: &str) -> Result<(), StorageError> {
        let real = self.resolve_checked(root, virtual_path)?;

        if real.exists() {
            return Err(StorageError::AlreadyExists(virtual_path.to_string()));
        }

        fs::create_dir(&real).map_err(|e| map_io(e, virtual_path))
    }

    fn remove_dir(&self, root: &Path, virtual_path: &str) -> Result<(), StorageError> {
        let real = self.resolve_checked(root, virtual_path)?;

        if !real.is_dir() {
            return Err(StorageError::NotADirectory(virtual_path.to_string()));
        }

        fs::remove_dir(&real).map_err(|e| map_io(e, virtual_path))
    }

    fn dir_exists(&self, root: &Path, virtual_path: &str) -> bool {
        match self.resolve_checked(root, virtual_path) {
            Ok(real) => real.is_dir(),
            Err(_) => false,
        }
    }
}

fn map_io(e: std::io::Error, virtual_path: &str) -> StorageError {
    match e.kind() {
        std::io::ErrorKind::NotFound => StorageError::NotFound(virtual_path.to_string()),
        std::io::ErrorKind::PermissionDenied => {
            StorageError::PermissionDenied(virtual_path.to_string())
        }
        _ => StorageError::Io(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};

    static COUNTER: AtomicU32 = AtomicU32::new(0);

    fn temp_root(tag: &str) -> PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "tern-ftp-provider-{}-{}-{}",
            tag,
            std::process::id(),
            n
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn list_reports_structured_entries() {
        let root = temp_root("list");
        fs::write(root.join("a.txt"), b"hello").unwrap();
        fs::create_dir(root.join("sub")).unwrap();

        let fs_provider = LocalFs::new();
        let entries = fs_provider.list_dir(&root, "/").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "a.txt");
        assert_eq!(entries[0].size, 5);
        assert_eq!(entries[0].kind, EntryKind::File);
        assert_eq!(entries[1].kind, EntryKind::Directory);

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn read_write_round_trip() {
        let root = temp_root("rw");
        let fs_provider = LocalFs::new();

        {
            let mut w = fs_provider.create_write(&root, "/f.bin").unwrap();
            w.write_all(b"payload").unwrap();
        }
        let mut r = fs_provider.open_read(&root, "/f.bin").unwrap();
        let mut buf = Vec::new();
        r.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"payload");

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn create_write_truncates_existing_file() {
        let root = temp_root("trunc");
        let fs_provider = LocalFs::new();
        fs::write(root.join("f"), b"old contents").unwrap();

        {
            let mut w = fs_provider.create_write(&root, "/f").unwrap();
            w.write_all(b"new").unwrap();
        }
        assert_eq!(fs::read(root.join("f")).unwrap(), b"new");

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn mkd_and_rmd() {
        let root = temp_root("dirs");
        let fs_provider = LocalFs::new();

        fs_provider.make_dir(&root, "/sub").unwrap();
        assert!(fs_provider.dir_exists(&root, "/sub"));
        assert!(matches!(
            fs_provider.make_dir(&root, "/sub"),
            Err(StorageError::AlreadyExists(_))
        ));

        fs_provider.remove_dir(&root, "/sub").unwrap();
        assert!(!fs_provider.dir_exists(&root, "/sub"));

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn missing_file_is_not_found() {
        let root = temp_root("missing");
        let fs_provider = LocalFs::new();
        assert!(matches!(
            fs_provider.open_read(&root, "/nope"),
            Err(StorageError::NotFound(_))
        ));
        fs::remove_dir_all(&root).unwrap();
    }
}
