pub mod auth;
pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod session;
pub mod storage;
pub mod transfer;

pub use auth::{AnonymousAuthenticator, Authenticator, StaticAuthenticator};
pub use config::ServerConfig;
pub use server::Server;
pub use storage::{FilesystemProvider, LocalFs};
