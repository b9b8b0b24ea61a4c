//! Error types
//!
//! Defines domain-specific error types for each module of the FTP server.

use std::fmt;
use std::io;
use std::net::SocketAddr;

/// Authentication module errors
#[derive(Debug)]
pub enum AuthError {
    BadCredentials(String),
    MalformedInput(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::BadCredentials(u) => write!(f, "Login incorrect for user: {}", u),
            AuthError::MalformedInput(s) => write!(f, "Malformed input: {}", s),
        }
    }
}

impl std::error::Error for AuthError {}

/// Storage module errors
#[derive(Debug)]
pub enum StorageError {
    NotFound(String),
    NotADirectory(String),
    NotAFile(String),
    AlreadyExists(String),
    PermissionDenied(String),
    PathEscapesRoot(String),
    Io(io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::NotFound(p) => write!(f, "No such file or directory: {}", p),
            StorageError::NotADirectory(p) => write!(f, "Not a directory: {}", p),
            StorageError::NotAFile(p) => write!(f, "Not a regular file: {}", p),
            StorageError::AlreadyExists(p) => write!(f, "Already exists: {}", p),
            StorageError::PermissionDenied(p) => write!(f, "Permission denied: {}", p),
            StorageError::PathEscapesRoot(p) => write!(f, "Path escapes root: {}", p),
            StorageError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        StorageError::Io(error)
    }
}

/// Transfer module errors
#[derive(Debug)]
pub enum TransferError {
    NotNegotiated,
    BindFailed(io::Error),
    AcceptTimeout,
    ConnectTimeout(SocketAddr),
    ConnectFailed(SocketAddr, io::Error),
    ForeignPeer { expected: String, got: String },
    InvalidPortArgument(String),
    Aborted(io::Error),
    LocalIo(io::Error),
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::NotNegotiated => {
                write!(f, "No data connection negotiated; use PASV or PORT first")
            }
            TransferError::BindFailed(e) => {
                write!(f, "Failed to bind data listener: {}", e)
            }
            TransferError::AcceptTimeout => {
                write!(f, "Timed out waiting for data connection")
            }
            TransferError::ConnectTimeout(addr) => {
                write!(f, "Timed out connecting to {}", addr)
            }
            TransferError::ConnectFailed(addr, e) => {
                write!(f, "Failed to connect to {}: {}", addr, e)
            }
            TransferError::ForeignPeer { expected, got } => {
                write!(f, "Data connection from {} rejected, expected {}", got, expected)
            }
            TransferError::InvalidPortArgument(arg) => {
                write!(f, "Invalid PORT argument: {}", arg)
            }
            TransferError::Aborted(e) => write!(f, "Transfer aborted: {}", e),
            TransferError::LocalIo(e) => write!(f, "Local I/O failure during transfer: {}", e),
        }
    }
}

impl std::error::Error for TransferError {}

/// Server lifecycle errors
#[derive(Debug)]
pub enum ServerError {
    AlreadyRunning,
    NoAvailablePort { start: u16, end: u16 },
    Io(io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::AlreadyRunning => write!(f, "Server is already running"),
            ServerError::NoAvailablePort { start, end } => {
                write!(f, "No available ports in range {}-{}", start, end)
            }
            ServerError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<io::Error> for ServerError {
    fn from(error: io::Error) -> Self {
        ServerError::Io(error)
    }
}
