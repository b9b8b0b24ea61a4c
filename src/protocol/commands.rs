//! Module `commands`
//!
//! Data structures representing parsed FTP commands and the outcome of
//! dispatching one.

use crate::protocol::responses::Reply;

/// An FTP command parsed from one control-channel line.
///
/// Verbs are matched case-insensitively; arguments are carried verbatim.
/// Commands whose argument may be omitted (LIST, NLST) carry an empty
/// string in that case.
#[derive(Debug, PartialEq)]
pub enum Command {
    User(String),
    Pass(String),
    Quit,
    Pwd,
    Cwd(String),
    Cdup,
    Mkd(String),
    Rmd(String),
    Type(String),
    Pasv,
    Port(String),
    List(String),
    Nlst(String),
    Retr(String),
    Stor(String),
    Noop,
    Syst,
    /// Verb not in the command table; the raw verb is kept for logging.
    Unknown(String),
}

/// Outcome status of executing a command.
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

/// Full result of a command execution: final status plus the reply to
/// write on the control channel, if any.
pub struct CommandResult {
    pub status: CommandStatus,
    pub reply: Option<Reply>,
}

impl CommandResult {
    pub fn success(reply: Reply) -> Self {
        Self {
            status: CommandStatus::Success,
            reply: Some(reply),
        }
    }

    pub fn failure(reason: impl Into<String>, reply: Reply) -> Self {
        Self {
            status: CommandStatus::Failure(reason.into()),
            reply: Some(reply),
        }
    }

    pub fn close(reply: Reply) -> Self {
        Self {
            status: CommandStatus::CloseConnection,
            reply: Some(reply),
        }
    }
}
