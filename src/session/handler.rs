//! Session command loop
//!
//! Reads control-channel lines, dispatches them, and writes replies until
//! the client quits, the connection drops, or the server shuts down.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedReadHalf;

use crate::protocol::{CommandStatus, HandlerContext, Reply, handle_command, parse_command};
use crate::server::SessionRegistry;
use crate::session::Session;

enum LineRead {
    Line,
    Eof,
    TooLong,
}

/// Reads one command line, bounded by `max` bytes so a client that never
/// sends a terminator cannot grow the buffer without limit.
async fn read_command_line(
    reader: &mut BufReader<OwnedReadHalf>,
    line: &mut String,
    max: usize,
) -> std::io::Result<LineRead> {
    line.clear();
    let mut limited = (&mut *reader).take((max + 1) as u64);
    let n = limited.read_line(line).await?;
    if n == 0 {
        return Ok(LineRead::Eof);
    }
    if line.len() > max {
        return Ok(LineRead::TooLong);
    }
    Ok(LineRead::Line)
}

/// Drives one control connection from greeting to close. Deregisters the
/// session from the server's live-session registry on exit.
pub async fn run_session(
    stream: TcpStream,
    id: u64,
    registry: SessionRegistry,
    ctx: Arc<HandlerContext>,
) {
    let peer_addr = match stream.peer_addr() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Session {}: peer address unavailable: {}", id, e);
            registry.lock().await.remove(&id);
            return;
        }
    };
    let local_ip = stream
        .local_addr()
        .map(|a| a.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut session = Session::new(id, peer_addr, local_ip);

    let greeting = Reply::new(220, "Welcome to Tern FTP Server");
    if write_half
        .write_all(greeting.to_string().as_bytes())
        .await
        .is_err()
    {
        registry.lock().await.remove(&id);
        return;
    }
    let _ = write_half.flush().await;

    let mut line = String::new();
    loop {
        match read_command_line(&mut reader, &mut line, ctx.config.max_command_length).await {
            Ok(LineRead::Eof) => {
                info!("Connection closed by client {}", peer_addr);
                break;
            }
            Ok(LineRead::TooLong) => {
                let reply = Reply::new(500, "Command line too long");
                let _ = write_half.write_all(reply.to_string().as_bytes()).await;
                warn!("Client {} exceeded command length bound, dropping", peer_addr);
                break;
            }
            Ok(LineRead::Line) => {
                let trimmed = line.trim_end_matches(['\r', '\n']);
                // Blank lines are ignored without a reply
                if trimmed.is_empty() {
                    continue;
                }

                let command = parse_command(trimmed);
                info!("Client {}: {:?}", peer_addr, command);

                let result = handle_command(&mut session, &command, &mut write_half, &ctx).await;

                if let Some(reply) = &result.reply {
                    if write_half
                        .write_all(reply.to_string().as_bytes())
                        .await
                        .is_err()
                    {
                        break;
                    }
                    let _ = write_half.flush().await;
                }

                match result.status {
                    CommandStatus::CloseConnection => {
                        info!("Client {} requested to quit", peer_addr);
                        break;
                    }
                    CommandStatus::Failure(reason) => {
                        warn!("Client {}: {}", peer_addr, reason);
                    }
                    CommandStatus::Success => {}
                }
            }
            Err(e) => {
                error!("Failed to read from {}: {}", peer_addr, e);
                break;
            }
        }
    }

    registry.lock().await.remove(&id);
    info!("Client {} disconnected", peer_addr);
}
