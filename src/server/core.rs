//! Connection acceptor and server lifecycle
//!
//! Binds the first free port in the configured inclusive range, spawns one
//! task per accepted control connection, and tracks live sessions so
//! `stop` can force-close everything.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use log::{debug, error, info, warn};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, watch};
use tokio::task::AbortHandle;

use crate::auth::Authenticator;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::protocol::HandlerContext;
use crate::protocol::Reply;
use crate::session::run_session;
use crate::storage::FilesystemProvider;

/// Registry entry for one live session.
pub struct SessionHandle {
    pub peer_addr: SocketAddr,
    abort: AbortHandle,
}

/// Live-session registry shared between the acceptor and session tasks.
///
/// Sessions insert on accept and remove themselves on exit; `stop` drains
/// and aborts whatever is left.
pub type SessionRegistry = Arc<Mutex<HashMap<u64, SessionHandle>>>;

/// The FTP server engine.
///
/// `start` binds and returns the bound port; `stop` closes the listener
/// and force-closes every live session. The filesystem provider and
/// authenticator are supplied by the embedding layer.
pub struct Server {
    ctx: Arc<HandlerContext>,
    registry: SessionRegistry,
    running: Arc<AtomicBool>,
    bound_port: Arc<AtomicU16>,
    shutdown: watch::Sender<bool>,
}

impl Server {
    pub fn new(
        config: ServerConfig,
        provider: Arc<dyn FilesystemProvider>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        let ctx = Arc::new(HandlerContext {
            config: Arc::new(config),
            provider,
            authenticator,
        });
        let (shutdown, _) = watch::channel(false);

        Self {
            ctx,
            registry: Arc::new(Mutex::new(HashMap::new())),
            running: Arc::new(AtomicBool::new(false)),
            bound_port: Arc::new(AtomicU16::new(0)),
            shutdown,
        }
    }

    /// Binds the control listener and starts accepting connections.
    /// Returns the bound port.
    pub async fn start(&self) -> Result<u16, ServerError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ServerError::AlreadyRunning);
        }

        let listener = match self.bind_in_range().await {
            Ok(listener) => listener,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        let port = match listener.local_addr() {
            Ok(addr) => addr.port(),
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(ServerError::Io(e));
            }
        };
        self.bound_port.store(port, Ordering::SeqCst);

        self.shutdown.send_replace(false);
        let shutdown_rx = self.shutdown.subscribe();

        let registry = Arc::clone(&self.registry);
        let ctx = Arc::clone(&self.ctx);
        let running = Arc::clone(&self.running);
        tokio::spawn(accept_loop(listener, registry, ctx, running, shutdown_rx));

        info!(
            "Server started on {}:{} (max {} clients)",
            self.ctx.config.bind_address, port, self.ctx.config.max_clients
        );
        Ok(port)
    }

    /// Scans the configured inclusive port range; first free port wins.
    async fn bind_in_range(&self) -> Result<TcpListener, ServerError> {
        let config = &self.ctx.config;
        for port in config.port_range() {
            match TcpListener::bind((config.bind_address.as_str(), port)).await {
                Ok(listener) => {
                    info!("Bound control listener to {}:{}", config.bind_address, port);
                    return Ok(listener);
                }
                Err(e) => {
                    debug!("Port {} unavailable: {}", port, e);
                }
            }
        }
        Err(ServerError::NoAvailablePort {
            start: config.port_range_start,
            end: config.port_range_end,
        })
    }

    /// Stops accepting, closes the listener, and force-closes every live
    /// session. In-flight transfers are aborted, not drained.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        self.shutdown.send_replace(true);

        let mut sessions = self.registry.lock().await;
        for (id, handle) in sessions.drain() {
            info!("Closing session {} ({})", id, handle.peer_addr);
            handle.abort.abort();
        }
        drop(sessions);

        self.bound_port.store(0, Ordering::SeqCst);
        info!("Server stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Bound control port while running.
    pub fn port(&self) -> Option<u16> {
        match self.bound_port.load(Ordering::SeqCst) {
            0 => None,
            port => Some(port),
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    registry: SessionRegistry,
    ctx: Arc<HandlerContext>,
    running: Arc<AtomicBool>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut next_id: u64 = 0;

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr)) => {
                    let mut sessions = registry.lock().await;

                    // stop() flips the flag and then drains this registry
                    // under the same lock; an accept that won the race
                    // against shutdown must not be inserted after the drain.
                    if *shutdown_rx.borrow() {
                        drop(sessions);
                        tokio::spawn(refuse_connection(
                            stream,
                            "Service shutting down",
                        ));
                        break;
                    }

                    if sessions.len() >= ctx.config.max_clients {
                        warn!("Refusing {}: client limit reached", peer_addr);
                        tokio::spawn(refuse_connection(
                            stream,
                            "Too many connections, try again later",
                        ));
                        continue;
                    }

                    next_id += 1;
                    let id = next_id;
                    let task = tokio::spawn(run_session(
                        stream,
                        id,
                        Arc::clone(&registry),
                        Arc::clone(&ctx),
                    ));
                    sessions.insert(
                        id,
                        SessionHandle {
                            peer_addr,
                            abort: task.abort_handle(),
                        },
                    );
                    info!(
                        "Accepted control connection from {} ({} live sessions)",
                        peer_addr,
                        sessions.len()
                    );
                }
                Err(e) => {
                    if !running.load(Ordering::SeqCst) {
                        break;
                    }
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }

    // Dropping the listener here closes the listening socket
    info!("Accept loop stopped");
}

/// Refused connections get a 421 and are closed immediately.
async fn refuse_connection(mut stream: TcpStream, text: &'static str) {
    let reply = Reply::new(421, text);
    let _ = stream.write_all(reply.to_string().as_bytes()).await;
    let _ = stream.shutdown().await;
}
