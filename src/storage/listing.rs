//! Directory listing entries
//!
//! Listings are kept structured internally and serialized to the
//! Unix-style LIST text format only at the protocol boundary.

use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local};

/// Kind of a listed entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One directory entry as reported by the filesystem provider.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub name: String,
    pub size: u64,
    pub kind: EntryKind,
    pub modified: SystemTime,
}

/// Entries older than this are shown with a year instead of a time,
/// matching the conventional `ls -l` cutoff.
const RECENT_CUTOFF: Duration = Duration::from_secs(180 * 24 * 60 * 60);

impl FileEntry {
    /// Serializes the entry to one LIST line:
    /// `permissions links owner group size month day time-or-year name`.
    pub fn to_list_line(&self) -> String {
        let permissions = match self.kind {
            EntryKind::Directory => "drwxr-xr-x",
            EntryKind::File => "-rw-r--r--",
        };

        let modified: DateTime<Local> = self.modified.into();
        let age = SystemTime::now()
            .duration_since(self.modified)
            .unwrap_or(Duration::ZERO);
        let when = if age < RECENT_CUTOFF {
            modified.format("%b %e %H:%M")
        } else {
            modified.format("%b %e  %Y")
        };

        format!(
            "{} 1 owner group {:>12} {} {}",
            permissions, self.size, when, self.name
        )
    }
}

/// Serializes entries to the full LIST payload, one line per entry.
pub fn format_list(entries: &[FileEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.to_list_line());
        out.push_str("\r\n");
    }
    out
}

/// Serializes entries to the NLST payload: bare names only.
pub fn format_nlst(entries: &[FileEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.name);
        out.push_str("\r\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    fn entry(name: &str, size: u64, kind: EntryKind, modified: SystemTime) -> FileEntry {
        FileEntry {
            name: name.to_string(),
            size,
            kind,
            modified,
        }
    }

    #[test]
    fn file_line_has_unix_shape() {
        let e = entry("notes.txt", 2134, EntryKind::File, SystemTime::now());
        let line = e.to_list_line();
        assert!(line.starts_with("-rw-r--r-- 1 owner group"));
        assert!(line.contains("2134"));
        assert!(line.ends_with("notes.txt"));
        // Recent entries show a clock time
        assert!(line.contains(':'));
    }

    #[test]
    fn directory_line_is_marked() {
        let e = entry("sub", 0, EntryKind::Directory, SystemTime::now());
        assert!(e.to_list_line().starts_with("drwxr-xr-x"));
    }

    #[test]
    fn old_entries_show_the_year() {
        // Mid-1979, far past the recent cutoff in any timezone
        let old = UNIX_EPOCH + Duration::from_secs(299_592_000);
        let e = entry("ancient", 1, EntryKind::File, old);
        let line = e.to_list_line();
        assert!(line.contains("1979"), "line was: {line}");
    }

    #[test]
    fn list_and_nlst_payloads() {
        let entries = vec![
            entry("a.txt", 1, EntryKind::File, SystemTime::now()),
            entry("sub", 0, EntryKind::Directory, SystemTime::now()),
        ];
        let list = format_list(&entries);
        assert_eq!(list.matches("\r\n").count(), 2);
        assert!(list.contains("a.txt"));

        let nlst = format_nlst(&entries);
        assert_eq!(nlst, "a.txt\r\nsub\r\n");
    }
}
