//! Authentication
//!
//! Pluggable authenticator capability plus the bundled implementations.

pub mod authenticator;
pub mod credentials;

pub use authenticator::{AnonymousAuthenticator, Authenticator, StaticAuthenticator};
