//! Module `state`
//!
//! Protocol state for one control connection. A `Session` is owned
//! exclusively by its handling task; nothing here is shared.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use crate::transfer::DataMode;

/// Authentication phase of a session.
///
/// `Unauthenticated → AwaitingPassword → Authenticated`; QUIT closes from
/// any state. A failed PASS falls back to `Unauthenticated`.
#[derive(Debug)]
pub enum SessionState {
    Unauthenticated,
    AwaitingPassword(String),
    Authenticated { username: String, home_root: PathBuf },
}

/// Transfer type selected via TYPE. Recorded but not transforming: the
/// engine streams bytes verbatim in both modes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransferType {
    Ascii,
    Binary,
}

/// State of one connected control session.
pub struct Session {
    id: u64,
    peer_addr: SocketAddr,
    local_ip: IpAddr,
    state: SessionState,
    cwd: String,
    data_mode: DataMode,
    transfer_type: TransferType,
}

impl Session {
    pub fn new(id: u64, peer_addr: SocketAddr, local_ip: IpAddr) -> Self {
        Self {
            id,
            peer_addr,
            local_ip,
            state: SessionState::Unauthenticated,
            cwd: "/".to_string(),
            data_mode: DataMode::None,
            transfer_type: TransferType::Ascii,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Local address the control connection arrived on; passive-mode
    /// listeners bind here so the client can reach them.
    pub fn local_ip(&self) -> IpAddr {
        self.local_ip
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    pub fn username(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { username, .. } => Some(username),
            SessionState::AwaitingPassword(username) => Some(username),
            SessionState::Unauthenticated => None,
        }
    }

    pub fn home_root(&self) -> Option<&Path> {
        match &self.state {
            SessionState::Authenticated { home_root, .. } => Some(home_root),
            _ => None,
        }
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    pub fn set_cwd(&mut self, cwd: String) {
        self.cwd = cwd;
    }

    pub fn transfer_type(&self) -> TransferType {
        self.transfer_type
    }

    pub fn set_transfer_type(&mut self, transfer_type: TransferType) {
        self.transfer_type = transfer_type;
    }

    /// USER received: any prior authentication is discarded.
    pub fn begin_login(&mut self, username: String) {
        self.state = SessionState::AwaitingPassword(username);
        self.cwd = "/".to_string();
        self.data_mode = DataMode::None;
    }

    /// PASS accepted by the authenticator.
    pub fn complete_login(&mut self, username: String, home_root: PathBuf) {
        self.state = SessionState::Authenticated {
            username,
            home_root,
        };
        self.cwd = "/".to_string();
    }

    /// PASS rejected: back to square one, the client may retry.
    pub fn fail_login(&mut self) {
        self.state = SessionState::Unauthenticated;
    }

    /// Replaces the pending data mode. Dropping a previous unused
    /// `Passive` entry closes its listener.
    pub fn set_data_mode(&mut self, mode: DataMode) {
        self.data_mode = mode;
    }

    /// Consumes the pending negotiation for a transfer command.
    pub fn take_data_mode(&mut self) -> DataMode {
        std::mem::take(&mut self.data_mode)
    }

    pub fn has_data_mode(&self) -> bool {
        !self.data_mode.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(
            1,
            "127.0.0.1:50000".parse().unwrap(),
            "127.0.0.1".parse().unwrap(),
        )
    }

    #[test]
    fn fresh_session_is_unauthenticated_at_root() {
        let s = session();
        assert!(!s.is_authenticated());
        assert_eq!(s.cwd(), "/");
        assert!(!s.has_data_mode());
        assert_eq!(s.transfer_type(), TransferType::Ascii);
    }

    #[test]
    fn login_walk() {
        let mut s = session();
        s.begin_login("alice".into());
        assert!(matches!(s.state(), SessionState::AwaitingPassword(u) if u == "alice"));
        assert!(!s.is_authenticated());

        s.complete_login("alice".into(), PathBuf::from("/srv/ftp"));
        assert!(s.is_authenticated());
        assert_eq!(s.username(), Some("alice"));
        assert_eq!(s.home_root(), Some(Path::new("/srv/ftp")));
    }

    #[test]
    fn failed_password_resets_to_unauthenticated() {
        let mut s = session();
        s.begin_login("alice".into());
        s.fail_login();
        assert!(matches!(s.state(), SessionState::Unauthenticated));
        assert!(s.username().is_none());
    }

    #[test]
    fn relogin_discards_previous_authentication() {
        let mut s = session();
        s.complete_login("alice".into(), PathBuf::from("/srv/ftp"));
        s.set_cwd("/somewhere".into());
        s.begin_login("bob".into());
        assert!(!s.is_authenticated());
        assert_eq!(s.cwd(), "/");
    }

    #[test]
    fn data_mode_is_single_use() {
        let mut s = session();
        s.set_data_mode(DataMode::Active("127.0.0.1:4000".parse().unwrap()));
        assert!(s.has_data_mode());
        assert!(matches!(s.take_data_mode(), DataMode::Active(_)));
        assert!(matches!(s.take_data_mode(), DataMode::None));
    }
}
