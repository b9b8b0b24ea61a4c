//! Error handling
//!
//! Defines error types for each module of the FTP server and their
//! mapping to protocol reply codes.

pub mod handlers;
pub mod types;

pub use handlers::reply_code_for;
pub use types::{AuthError, ServerError, StorageError, TransferError};
