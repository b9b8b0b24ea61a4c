//! Virtual path resolution
//!
//! Client-visible paths are absolute, normalized, and rooted at `/`.
//! Resolution clamps `..` at the root instead of erroring, so no command
//! argument sequence can name a path above the session's home root.

use std::path::{Path, PathBuf};

/// Resolves a command argument against the current virtual directory.
///
/// Absolute arguments replace the base; relative arguments are joined to
/// it. `.` segments are dropped and `..` pops one level, clamped at `/`.
/// The result is always an absolute normalized virtual path.
pub fn resolve_virtual(cwd: &str, arg: &str) -> String {
    let mut segments: Vec<&str> = if arg.starts_with('/') {
        Vec::new()
    } else {
        cwd.split('/').filter(|s| !s.is_empty()).collect()
    };

    for segment in arg.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            name => segments.push(name),
        }
    }

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Maps a normalized virtual path onto a real path under `root`.
///
/// Expects input produced by [`resolve_virtual`]; the leading `/` is
/// stripped and the remainder joined to the root.
pub fn virtual_to_real(root: &Path, virtual_path: &str) -> PathBuf {
    let relative = virtual_path.trim_start_matches('/');
    if relative.is_empty() {
        root.to_path_buf()
    } else {
        root.join(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_joins_against_cwd() {
        assert_eq!(resolve_virtual("/", "docs"), "/docs");
        assert_eq!(resolve_virtual("/docs", "sub"), "/docs/sub");
    }

    #[test]
    fn absolute_argument_replaces_cwd() {
        assert_eq!(resolve_virtual("/docs", "/other"), "/other");
        assert_eq!(resolve_virtual("/docs", "/"), "/");
    }

    #[test]
    fn dot_and_empty_segments_are_dropped() {
        assert_eq!(resolve_virtual("/", "./a//b/."), "/a/b");
        assert_eq!(resolve_virtual("/a", ""), "/a");
    }

    #[test]
    fn parent_pops_one_level() {
        assert_eq!(resolve_virtual("/a/b", ".."), "/a");
        assert_eq!(resolve_virtual("/a/b", "../c"), "/a/c");
    }

    #[test]
    fn parent_clamps_at_root() {
        assert_eq!(resolve_virtual("/", ".."), "/");
        assert_eq!(resolve_virtual("/a", "../../../.."), "/");
        assert_eq!(resolve_virtual("/", "../../etc/passwd"), "/etc/passwd");
    }

    #[test]
    fn no_cwd_sequence_escapes_root() {
        // Property from the design: arbitrary CWD argument sequences stay
        // inside the virtual root.
        let sequences = [
            vec!["..", "..", ".."],
            vec!["a", "../..", "b", "../../.."],
            vec!["/x", "../../y", ".."],
        ];
        for seq in sequences {
            let mut cwd = "/".to_string();
            for arg in seq {
                cwd = resolve_virtual(&cwd, arg);
                assert!(cwd.starts_with('/'));
                assert!(!cwd.contains(".."));
            }
        }
    }

    #[test]
    fn real_path_mapping() {
        let root = Path::new("/srv/ftp");
        assert_eq!(virtual_to_real(root, "/"), PathBuf::from("/srv/ftp"));
        assert_eq!(
            virtual_to_real(root, "/a/b.txt"),
            PathBuf::from("/srv/ftp/a/b.txt")
        );
    }
}
