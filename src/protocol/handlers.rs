//! Command handlers
//!
//! Dispatches parsed FTP commands against the session state machine.
//! Every dispatch produces exactly one final reply; transfer commands
//! additionally write the 150 preliminary reply themselves before
//! streaming over the data channel.

use std::io::{Cursor, Read};
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;

use crate::auth::Authenticator;
use crate::config::ServerConfig;
use crate::error::handlers::{reply_code_for, transfer_reply_code};
use crate::error::{StorageError, TransferError};
use crate::protocol::{Command, CommandResult, Reply};
use crate::session::{Session, SessionState, TransferType};
use crate::storage::paths::resolve_virtual;
use crate::storage::{FilesystemProvider, format_list, format_nlst};
use crate::transfer::{
    DataMode, encode_pasv_addr, open_data_stream, open_passive, parse_port_arg, receive_stream,
    send_stream,
};

/// Shared collaborators handed to every session task.
pub struct HandlerContext {
    pub config: Arc<ServerConfig>,
    pub provider: Arc<dyn FilesystemProvider>,
    pub authenticator: Arc<dyn Authenticator>,
}

/// Dispatches a received FTP command to its handler.
pub async fn handle_command(
    session: &mut Session,
    command: &Command,
    control: &mut OwnedWriteHalf,
    ctx: &HandlerContext,
) -> CommandResult {
    match command {
        Command::User(username) => handle_cmd_user(session, username),
        Command::Pass(password) => handle_cmd_pass(session, password, ctx),
        Command::Quit => handle_cmd_quit(),
        Command::Pwd => handle_cmd_pwd(session),
        Command::Cwd(path) => handle_cmd_cwd(session, path, ctx),
        Command::Cdup => handle_cmd_cwd(session, "..", ctx),
        Command::Mkd(path) => handle_cmd_mkd(session, path, ctx),
        Command::Rmd(path) => handle_cmd_rmd(session, path, ctx),
        Command::Type(arg) => handle_cmd_type(session, arg),
        Command::Pasv => handle_cmd_pasv(session).await,
        Command::Port(arg) => handle_cmd_port(session, arg),
        Command::List(path) => handle_cmd_list(session, path, control, ctx, false).await,
        Command::Nlst(path) => handle_cmd_list(session, path, control, ctx, true).await,
        Command::Retr(path) => handle_cmd_retr(session, path, control, ctx).await,
        Command::Stor(path) => handle_cmd_stor(session, path, control, ctx).await,
        Command::Noop => CommandResult::success(Reply::new(200, "NOOP ok")),
        Command::Syst => CommandResult::success(Reply::new(215, "UNIX Type: L8")),
        Command::Unknown(verb) => handle_cmd_unknown(verb),
    }
}

/// Rejects commands that require authentication while the session is not
/// authenticated, returning the home root otherwise.
fn require_auth(session: &Session) -> Result<PathBuf, CommandResult> {
    match session.home_root() {
        Some(root) => Ok(root.to_path_buf()),
        None => Err(CommandResult::failure(
            "Not logged in",
            Reply::new(530, "Not logged in"),
        )),
    }
}

fn missing_argument() -> CommandResult {
    CommandResult::failure(
        "Missing argument",
        Reply::new(500, "Syntax error in parameters or arguments"),
    )
}

fn storage_failure(err: StorageError) -> CommandResult {
    let code = reply_code_for(&err);
    CommandResult::failure(err.to_string(), Reply::new(code, err.to_string()))
}

fn handle_cmd_user(session: &mut Session, username: &str) -> CommandResult {
    if username.is_empty() {
        return missing_argument();
    }

    session.begin_login(username.to_string());
    CommandResult::success(Reply::new(
        331,
        format!("Password required for {}", username),
    ))
}

fn handle_cmd_pass(session: &mut Session, password: &str, ctx: &HandlerContext) -> CommandResult {
    let username = match session.state() {
        SessionState::AwaitingPassword(username) => username.clone(),
        SessionState::Unauthenticated => {
            return CommandResult::failure(
                "PASS before USER",
                Reply::new(503, "Login with USER first"),
            );
        }
        SessionState::Authenticated { .. } => {
            return CommandResult::failure(
                "Already logged in",
                Reply::new(503, "Already logged in"),
            );
        }
    };

    match ctx.authenticator.authenticate(&username, password) {
        Ok(home_root) => {
            info!("User {} authenticated", username);
            session.complete_login(username, home_root);
            CommandResult::success(Reply::new(230, "Login successful"))
        }
        Err(e) => {
            session.fail_login();
            CommandResult::failure(e.to_string(), Reply::new(530, "Login incorrect"))
        }
    }
}

fn handle_cmd_quit() -> CommandResult {
    CommandResult::close(Reply::new(221, "Goodbye"))
}

fn handle_cmd_pwd(session: &Session) -> CommandResult {
    if let Err(denied) = require_auth(session) {
        return denied;
    }
    CommandResult::success(Reply::new(257, format!("\"{}\"", session.cwd())))
}

fn handle_cmd_cwd(session: &mut Session, path: &str, ctx: &HandlerContext) -> CommandResult {
    let root = match require_auth(session) {
        Ok(root) => root,
        Err(denied) => return denied,
    };

    if path.is_empty() {
        return missing_argument();
    }

    let target = resolve_virtual(session.cwd(), path);
    if !ctx.provider.dir_exists(&root, &target) {
        return CommandResult::failure(
            "Directory not found",
            Reply::new(550, format!("{}: No such directory", target)),
        );
    }

    session.set_cwd(target.clone());
    info!(
        "Client {} changed directory to {}",
        session.peer_addr(),
        target
    );
    CommandResult::success(Reply::new(250, "Directory changed"))
}

fn handle_cmd_mkd(session: &mut Session, path: &str, ctx: &HandlerContext) -> CommandResult {
    let root = match require_auth(session) {
        Ok(root) => root,
        Err(denied) => return denied,
    };

    if path.is_empty() {
        return missing_argument();
    }

    let target = resolve_virtual(session.cwd(), path);
    match ctx.provider.make_dir(&root, &target) {
        Ok(()) => CommandResult::success(Reply::new(257, format!("\"{}\" created", target))),
        Err(e) => storage_failure(e),
    }
}

fn handle_cmd_rmd(session: &mut Session, path: &str, ctx: &HandlerContext) -> CommandResult {
    let root = match require_auth(session) {
        Ok(root) => root,
        Err(denied) => return denied,
    };

    if path.is_empty() {
        return missing_argument();
    }

    let target = resolve_virtual(session.cwd(), path);
    match ctx.provider.remove_dir(&root, &target) {
        Ok(()) => CommandResult::success(Reply::new(250, "Directory removed")),
        Err(e) => storage_failure(e),
    }
}

fn handle_cmd_type(session: &mut Session, arg: &str) -> CommandResult {
    if let Err(denied) = require_auth(session) {
        return denied;
    }

    // RFC form is e.g. "A", "A N", "I"; only the leading code matters here
    match arg.split_whitespace().next().map(str::to_ascii_uppercase) {
        Some(code) if code == "A" => {
            session.set_transfer_type(TransferType::Ascii);
            CommandResult::success(Reply::new(200, "Type set to A"))
        }
        Some(code) if code == "I" => {
            session.set_transfer_type(TransferType::Binary);
            CommandResult::success(Reply::new(200, "Type set to I"))
        }
        _ => CommandResult::failure(
            "Unsupported type",
            Reply::new(500, "Unsupported TYPE; use A or I"),
        ),
    }
}

async fn handle_cmd_pasv(session: &mut Session) -> CommandResult {
    if let Err(denied) = require_auth(session) {
        return denied;
    }

    if session.has_data_mode() {
        info!(
            "Client {} replacing unused data-mode negotiation",
            session.peer_addr()
        );
        // Dropping a pending passive listener closes it
        session.set_data_mode(DataMode::None);
    }

    let (listener, addr) = match open_passive(session.local_ip()).await {
        Ok(bound) => bound,
        Err(e) => {
            error!("PASV setup failed for {}: {}", session.peer_addr(), e);
            return CommandResult::failure(
                e.to_string(),
                Reply::new(425, "Can't open data connection"),
            );
        }
    };

    let Some(encoded) = encode_pasv_addr(&addr) else {
        return CommandResult::failure(
            "PASV requires IPv4",
            Reply::new(425, "Can't open data connection"),
        );
    };

    session.set_data_mode(DataMode::Passive(listener));
    info!(
        "Client {} entering passive mode on {}",
        session.peer_addr(),
        addr
    );
    CommandResult::success(Reply::new(
        227,
        format!("Entering Passive Mode ({})", encoded),
    ))
}

fn handle_cmd_port(session: &mut Session, arg: &str) -> CommandResult {
    if let Err(denied) = require_auth(session) {
        return denied;
    }

    if arg.is_empty() {
        return missing_argument();
    }

    let addr = match parse_port_arg(arg) {
        Ok(addr) => addr,
        Err(e) => {
            return CommandResult::failure(
                e.to_string(),
                Reply::new(500, "Invalid PORT argument"),
            );
        }
    };

    // The advertised host must match the control peer; ports below 1024
    // would let a client bounce connections at privileged services.
    if addr.ip() != session.peer_addr().ip() {
        return CommandResult::failure(
            "PORT host mismatch",
            Reply::new(500, "PORT address must match control connection"),
        );
    }
    if addr.port() < 1024 {
        return CommandResult::failure(
            "PORT below 1024",
            Reply::new(500, "PORT must name an unprivileged port"),
        );
    }

    if session.has_data_mode() {
        info!(
            "Client {} replacing unused data-mode negotiation",
            session.peer_addr()
        );
        session.set_data_mode(DataMode::None);
    }

    session.set_data_mode(DataMode::Active(addr));
    info!("Client {} set active mode target {}", session.peer_addr(), addr);
    CommandResult::success(Reply::new(200, "PORT command successful"))
}

async fn handle_cmd_list(
    session: &mut Session,
    path: &str,
    control: &mut OwnedWriteHalf,
    ctx: &HandlerContext,
    names_only: bool,
) -> CommandResult {
    let root = match require_auth(session) {
        Ok(root) => root,
        Err(denied) => return denied,
    };

    let target = if path.is_empty() {
        session.cwd().to_string()
    } else {
        resolve_virtual(session.cwd(), path)
    };

    let entries = match ctx.provider.list_dir(&root, &target) {
        Ok(entries) => entries,
        Err(e) => return storage_failure(e),
    };

    let payload = if names_only {
        format_nlst(&entries)
    } else {
        format_list(&entries)
    };

    info!(
        "Client {} listing {} ({} entries)",
        session.peer_addr(),
        target,
        entries.len()
    );

    let mut source = Cursor::new(payload.into_bytes());
    stream_to_client(session, control, ctx, &mut source, "Directory send OK").await
}

async fn handle_cmd_retr(
    session: &mut Session,
    path: &str,
    control: &mut OwnedWriteHalf,
    ctx: &HandlerContext,
) -> CommandResult {
    let root = match require_auth(session) {
        Ok(root) => root,
        Err(denied) => return denied,
    };

    if path.is_empty() {
        return missing_argument();
    }

    let target = resolve_virtual(session.cwd(), path);
    let mut source = match ctx.provider.open_read(&root, &target) {
        Ok(source) => source,
        Err(e) => return storage_failure(e),
    };

    info!("Client {} retrieving {}", session.peer_addr(), target);
    stream_to_client(session, control, ctx, source.as_mut(), "Transfer complete").await
}

async fn handle_cmd_stor(
    session: &mut Session,
    path: &str,
    control: &mut OwnedWriteHalf,
    ctx: &HandlerContext,
) -> CommandResult {
    let root = match require_auth(session) {
        Ok(root) => root,
        Err(denied) => return denied,
    };

    if path.is_empty() {
        return missing_argument();
    }

    if !session.has_data_mode() {
        return CommandResult::failure(
            "No data mode negotiated",
            Reply::new(425, "Use PASV or PORT first"),
        );
    }

    let target = resolve_virtual(session.cwd(), path);
    info!("Client {} storing {}", session.peer_addr(), target);

    let mut data = match establish_data_connection(session, ctx).await {
        Ok(data) => data,
        Err(result) => return result,
    };

    // The sink is opened with truncate semantics, so it must not exist
    // until the data connection does; a 425 leaves the destination intact.
    let mut sink = match ctx.provider.create_write(&root, &target) {
        Ok(sink) => sink,
        Err(e) => return storage_failure(e),
    };

    if send_preliminary(control).await.is_err() {
        return CommandResult::failure("Control connection lost", Reply::new(426, "Transfer aborted"));
    }

    match receive_stream(&mut data, sink.as_mut(), ctx.config.buffer_size).await {
        Ok(_) => CommandResult::success(Reply::new(226, "Transfer complete")),
        // A partial destination file is left as-is; no rollback
        Err(e) => transfer_failure(e),
    }
}

/// Consumes the session's data-mode negotiation and establishes the data
/// connection, mapping failures to their final control reply.
async fn establish_data_connection(
    session: &mut Session,
    ctx: &HandlerContext,
) -> Result<tokio::net::TcpStream, CommandResult> {
    let mode = session.take_data_mode();
    if mode.is_none() {
        return Err(CommandResult::failure(
            "No data mode negotiated",
            Reply::new(425, "Use PASV or PORT first"),
        ));
    }

    let wait = Duration::from_secs(ctx.config.data_timeout_secs);
    let peer_ip: IpAddr = session.peer_addr().ip();
    open_data_stream(mode, peer_ip, wait).await.map_err(|e| {
        error!(
            "Data connection failed for {}: {}",
            session.peer_addr(),
            e
        );
        CommandResult::failure(
            e.to_string(),
            Reply::new(transfer_reply_code(&e), "Can't open data connection"),
        )
    })
}

async fn send_preliminary(control: &mut OwnedWriteHalf) -> std::io::Result<()> {
    let reply = Reply::new(150, "Opening data connection");
    control.write_all(reply.to_string().as_bytes()).await?;
    control.flush().await
}

fn transfer_failure(e: TransferError) -> CommandResult {
    let code = transfer_reply_code(&e);
    let text = match code {
        426 => "Connection closed; transfer aborted",
        451 => "Requested action aborted: local error",
        _ => "Can't open data connection",
    };
    CommandResult::failure(e.to_string(), Reply::new(code, text))
}

/// Shared send path for RETR and LIST/NLST payloads.
async fn stream_to_client(
    session: &mut Session,
    control: &mut OwnedWriteHalf,
    ctx: &HandlerContext,
    source: &mut (dyn Read + Send),
    success_text: &str,
) -> CommandResult {
    let mut data = match establish_data_connection(session, ctx).await {
        Ok(data) => data,
        Err(result) => return result,
    };

    if send_preliminary(control).await.is_err() {
        return CommandResult::failure("Control connection lost", Reply::new(426, "Transfer aborted"));
    }

    match send_stream(&mut data, source, ctx.config.buffer_size).await {
        Ok(_) => CommandResult::success(Reply::new(226, success_text)),
        Err(e) => transfer_failure(e),
    }
}

fn handle_cmd_unknown(verb: &str) -> CommandResult {
    CommandResult::failure(
        format!("Unknown command: {}", verb),
        Reply::new(502, "Command not implemented"),
    )
}
