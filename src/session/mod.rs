//! Per-connection session management
//!
//! Holds the protocol state machine for one control connection and the
//! command loop that drives it.

pub mod handler;
pub mod state;

pub use handler::run_session;
pub use state::{Session, SessionState, TransferType};
