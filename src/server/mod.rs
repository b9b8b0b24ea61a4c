//! Server core
//!
//! Listener binding over a port range, the accept loop, the live-session
//! registry, and lifecycle control (start/stop/status).

pub mod core;

pub use core::{Server, SessionHandle, SessionRegistry};
