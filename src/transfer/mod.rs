//! Data connection management
//!
//! Negotiation of the secondary data channel (passive and active modes)
//! and payload streaming for LIST/NLST/RETR/STOR.

pub mod data_channel;
pub mod file_ops;

pub use data_channel::{DataMode, encode_pasv_addr, open_data_stream, open_passive, parse_port_arg};
pub use file_ops::{receive_stream, send_stream};
