//! Configuration for the Tern FTP server
//!
//! Settings are loaded from `config.toml` with `TERN_FTP_` environment
//! overrides. Every field has a default so the server can also be embedded
//! with `ServerConfig::default()` and adjusted programmatically.

use config::{Config, Environment, File};
use serde::Deserialize;

/// Server configuration.
///
/// The control listener binds the first free port in the inclusive range
/// `[port_range_start, port_range_end]`.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the control listener binds to.
    pub bind_address: String,

    /// Inclusive control port range scanned at startup.
    pub port_range_start: u16,
    pub port_range_end: u16,

    /// Root directory served to clients of the bundled binary.
    pub server_root: String,

    /// Maximum concurrent control connections.
    pub max_clients: usize,

    /// Commands longer than this are rejected with 500 and the
    /// connection is dropped.
    pub max_command_length: usize,

    /// Buffer size for data channel streaming.
    pub buffer_size: usize,

    /// Seconds to wait for a data connection to be established.
    pub data_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port_range_start: 2121,
            port_range_end: 2140,
            server_root: "./server_root".to_string(),
            max_clients: 10,
            max_command_length: 8 * 1024,
            buffer_size: 8 * 1024,
            data_timeout_secs: 10,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `config.toml` with environment overrides.
    pub fn load() -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("TERN_FTP"))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the listener cannot honor.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.port_range_start == 0 {
            return Err(config::ConfigError::Message(
                "port_range_start cannot be 0".into(),
            ));
        }

        if self.port_range_start > self.port_range_end {
            return Err(config::ConfigError::Message(
                "port_range_start must not exceed port_range_end".into(),
            ));
        }

        if self.max_clients == 0 {
            return Err(config::ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.max_command_length == 0 || self.buffer_size == 0 {
            return Err(config::ConfigError::Message(
                "max_command_length and buffer_size must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Inclusive control port range as an iterator.
    pub fn port_range(&self) -> std::ops::RangeInclusive<u16> {
        self.port_range_start..=self.port_range_end
    }
}
