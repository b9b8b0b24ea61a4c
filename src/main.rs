//! Tern FTP Server - Entry Point
//!
//! A small Rust FTP server engine implementing a practical subset of RFC 959.

use std::sync::Arc;

use log::{error, info, warn};

use tern_ftp_server::auth::StaticAuthenticator;
use tern_ftp_server::config::ServerConfig;
use tern_ftp_server::server::Server;
use tern_ftp_server::storage::LocalFs;

#[tokio::main]
async fn main() {
    // env_logger picks up the RUST_LOG environment variable
    env_logger::init();

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            warn!("No usable config file, falling back to defaults: {}", e);
            ServerConfig::default()
        }
    };

    if let Err(e) = std::fs::create_dir_all(&config.server_root) {
        warn!("Failed to create server root directory: {}", e);
    } else {
        info!("Server root directory: {}", config.server_root);
    }

    let root = std::path::PathBuf::from(&config.server_root);
    let provider = Arc::new(LocalFs::new());
    let authenticator = Arc::new(StaticAuthenticator::demo(root));

    let server = Server::new(config, provider, authenticator);

    let port = match server.start().await {
        Ok(port) => port,
        Err(e) => {
            error!("Server startup failed: {}", e);
            std::process::exit(1);
        }
    };
    info!("Listening for control connections on port {}", port);

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to wait for shutdown signal: {}", e);
    }

    info!("Shutting down...");
    server.stop().await;
}
