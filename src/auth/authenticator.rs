//! Authenticator capability
//!
//! Validates a username/password pair and, on success, hands back the home
//! directory root the session is confined to.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::auth::credentials::CREDENTIALS;
use crate::error::AuthError;

/// Pluggable authentication capability consumed by sessions.
pub trait Authenticator: Send + Sync {
    /// Validates the pair and returns the home root on success.
    fn authenticate(&self, username: &str, password: &str) -> Result<PathBuf, AuthError>;
}

/// Rejects control characters and oversized input before any lookup.
fn check_input(input: &str, what: &str) -> Result<(), AuthError> {
    if input.len() > 256 || input.contains(['\r', '\n', '\0']) {
        return Err(AuthError::MalformedInput(format!("invalid {}", what)));
    }
    Ok(())
}

/// Authenticator backed by an in-memory user table. All users share the
/// same home root.
pub struct StaticAuthenticator {
    users: HashMap<String, String>,
    home_root: PathBuf,
}

impl StaticAuthenticator {
    pub fn new(users: HashMap<String, String>, home_root: PathBuf) -> Self {
        Self { users, home_root }
    }

    /// Demo user table used by the bundled binary.
    pub fn demo(home_root: PathBuf) -> Self {
        let users = CREDENTIALS
            .iter()
            .map(|(u, p)| (u.to_string(), p.to_string()))
            .collect();
        Self::new(users, home_root)
    }
}

impl Authenticator for StaticAuthenticator {
    fn authenticate(&self, username: &str, password: &str) -> Result<PathBuf, AuthError> {
        check_input(username, "username")?;
        check_input(password, "password")?;

        match self.users.get(username) {
            Some(stored) if stored == password => Ok(self.home_root.clone()),
            _ => Err(AuthError::BadCredentials(username.to_string())),
        }
    }
}

/// Permissive authenticator: any username with any password is accepted.
pub struct AnonymousAuthenticator {
    home_root: PathBuf,
}

impl AnonymousAuthenticator {
    pub fn new(home_root: PathBuf) -> Self {
        Self { home_root }
    }
}

impl Authenticator for AnonymousAuthenticator {
    fn authenticate(&self, username: &str, password: &str) -> Result<PathBuf, AuthError> {
        check_input(username, "username")?;
        check_input(password, "password")?;
        Ok(self.home_root.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn static_auth() -> StaticAuthenticator {
        let mut users = HashMap::new();
        users.insert("alice".to_string(), "secret".to_string());
        StaticAuthenticator::new(users, PathBuf::from("/srv/ftp"))
    }

    #[test]
    fn valid_pair_returns_home_root() {
        let auth = static_auth();
        let home = auth.authenticate("alice", "secret").unwrap();
        assert_eq!(home, PathBuf::from("/srv/ftp"));
    }

    #[test]
    fn wrong_password_and_unknown_user_are_rejected() {
        let auth = static_auth();
        assert!(matches!(
            auth.authenticate("alice", "nope"),
            Err(AuthError::BadCredentials(_))
        ));
        assert!(matches!(
            auth.authenticate("mallory", "secret"),
            Err(AuthError::BadCredentials(_))
        ));
    }

    #[test]
    fn control_characters_are_malformed() {
        let auth = static_auth();
        assert!(matches!(
            auth.authenticate("ali\nce", "secret"),
            Err(AuthError::MalformedInput(_))
        ));
    }

    #[test]
    fn anonymous_accepts_anything_including_empty_password() {
        let auth = AnonymousAuthenticator::new(PathBuf::from("/srv/ftp"));
        assert!(auth.authenticate("anon", "").is_ok());
        assert!(auth.authenticate("", "").is_ok());
    }
}
