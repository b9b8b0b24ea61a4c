//! FTP command parsing
//!
//! Splits a control-channel line into verb and argument and maps the verb
//! against the fixed command table.

use crate::protocol::commands::Command;

/// Parses a raw command line (already stripped of its terminator) into a
/// `Command`.
///
/// The verb is everything up to the first whitespace run, upper-cased;
/// the remainder is the argument, trimmed. Argument presence is validated
/// by the individual handlers, not here, so that missing-argument errors
/// reply 500 rather than 502.
pub fn parse_command(raw: &str) -> Command {
    let trimmed = raw.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let verb = parts.next().unwrap_or("").to_ascii_uppercase();
    let arg = parts.next().unwrap_or("").trim();

    match verb.as_str() {
        "USER" => Command::User(arg.to_string()),
        "PASS" => Command::Pass(arg.to_string()),
        "QUIT" => Command::Quit,
        "PWD" => Command::Pwd,
        "CWD" => Command::Cwd(arg.to_string()),
        "CDUP" => Command::Cdup,
        "MKD" => Command::Mkd(arg.to_string()),
        "RMD" => Command::Rmd(arg.to_string()),
        "TYPE" => Command::Type(arg.to_string()),
        "PASV" => Command::Pasv,
        "PORT" => Command::Port(arg.to_string()),
        "LIST" => Command::List(arg.to_string()),
        "NLST" => Command::Nlst(arg.to_string()),
        "RETR" => Command::Retr(arg.to_string()),
        "STOR" => Command::Stor(arg.to_string()),
        "NOOP" => Command::Noop,
        "SYST" => Command::Syst,
        _ => Command::Unknown(verb),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbs_are_case_insensitive() {
        assert_eq!(parse_command("user alice"), Command::User("alice".into()));
        assert_eq!(parse_command("UsEr alice"), Command::User("alice".into()));
        assert_eq!(parse_command("QUIT"), Command::Quit);
        assert_eq!(parse_command("quit"), Command::Quit);
    }

    #[test]
    fn argument_is_split_on_first_whitespace_run() {
        assert_eq!(
            parse_command("STOR  some file.txt"),
            Command::Stor("some file.txt".into())
        );
        assert_eq!(parse_command("CWD\tsub"), Command::Cwd("sub".into()));
    }

    #[test]
    fn missing_argument_yields_empty_string() {
        assert_eq!(parse_command("PASS"), Command::Pass(String::new()));
        assert_eq!(parse_command("LIST"), Command::List(String::new()));
    }

    #[test]
    fn unknown_verb_is_preserved_for_logging() {
        assert_eq!(parse_command("FEAT"), Command::Unknown("FEAT".into()));
        assert_eq!(parse_command("abor now"), Command::Unknown("ABOR".into()));
    }

    #[test]
    fn full_command_table_is_recognized() {
        assert_eq!(parse_command("PWD"), Command::Pwd);
        assert_eq!(parse_command("CDUP"), Command::Cdup);
        assert_eq!(parse_command("MKD d"), Command::Mkd("d".into()));
        assert_eq!(parse_command("RMD d"), Command::Rmd("d".into()));
        assert_eq!(parse_command("TYPE I"), Command::Type("I".into()));
        assert_eq!(parse_command("PASV"), Command::Pasv);
        assert_eq!(parse_command("PORT 1,2,3,4,5,6"), Command::Port("1,2,3,4,5,6".into()));
        assert_eq!(parse_command("NLST"), Command::Nlst(String::new()));
        assert_eq!(parse_command("RETR f"), Command::Retr("f".into()));
        assert_eq!(parse_command("NOOP"), Command::Noop);
        assert_eq!(parse_command("SYST"), Command::Syst);
    }
}
