//! FTP replies
//!
//! A reply is a 3-digit code plus text. Multi-line replies follow the
//! RFC 959 continuation convention: every line but the last is written
//! as `code-text`, the last as `code text`.

use std::fmt;

/// A reply written on the control channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    code: u16,
    lines: Vec<String>,
}

impl Reply {
    /// Single-line reply.
    pub fn new(code: u16, text: impl Into<String>) -> Self {
        Self {
            code,
            lines: vec![text.into()],
        }
    }

    /// Multi-line reply. An empty `lines` collapses to a bare code line.
    pub fn multi(code: u16, lines: Vec<String>) -> Self {
        let lines = if lines.is_empty() {
            vec![String::new()]
        } else {
            lines
        };
        Self { code, lines }
    }

    pub fn code(&self) -> u16 {
        self.code
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last = self.lines.len() - 1;
        for (i, line) in self.lines.iter().enumerate() {
            if i < last {
                write!(f, "{}-{}\r\n", self.code, line)?;
            } else {
                write!(f, "{} {}\r\n", self.code, line)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_format() {
        let reply = Reply::new(226, "Transfer complete");
        assert_eq!(reply.to_string(), "226 Transfer complete\r\n");
        assert_eq!(reply.code(), 226);
    }

    #[test]
    fn multi_line_uses_continuation_convention() {
        let reply = Reply::multi(
            214,
            vec!["Commands:".into(), "USER PASS QUIT".into(), "End".into()],
        );
        assert_eq!(
            reply.to_string(),
            "214-Commands:\r\n214-USER PASS QUIT\r\n214 End\r\n"
        );
    }

    #[test]
    fn multi_with_single_line_degenerates_to_single() {
        let reply = Reply::multi(220, vec!["Ready".into()]);
        assert_eq!(reply.to_string(), "220 Ready\r\n");
    }
}
