use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::http::connection::Connection;
use crate::http::error::ServerLaunchError;
use crate::http::session::Session;
use crate::server::registry::SessionRegistry;

const BACKLOG: u32 = 1024;
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// One listening socket and the sessions accepted on it.
///
/// Lifecycle: [`initialize`](Server::initialize) binds,
/// [`start`](Server::start) spawns the accept loop,
/// [`signal_shutdown`](Server::signal_shutdown) stops accepting and
/// [`join`](Server::join) waits until every session has finished.
pub struct Server {
    config: Arc<ServerConfig>,
    listener: Option<TcpListener>,
    local_addr: Option<SocketAddr>,
    stop: watch::Sender<bool>,
    registry: Arc<SessionRegistry>,
    accept_task: Option<JoinHandle<()>>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            config: Arc::new(config),
            listener: None,
            local_addr: None,
            stop,
            registry: Arc::new(SessionRegistry::new()),
            accept_task: None,
        }
    }

    pub fn config(&self) -> &Arc<ServerConfig> {
        &self.config
    }

    /// Address actually bound, available after `initialize`.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Creates, configures, binds and listens. Must run inside a tokio
    /// runtime.
    pub fn initialize(&mut self) -> Result<(), ServerLaunchError> {
        let addr = self.config.listen_addr;
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(ServerLaunchError::SocketCreation)?;

        socket
            .set_reuseaddr(true)
            .map_err(ServerLaunchError::SocketReusable)?;
        socket.bind(addr).map_err(ServerLaunchError::SocketBind)?;
        let listener = socket
            .listen(BACKLOG)
            .map_err(ServerLaunchError::SocketListen)?;

        self.local_addr = listener.local_addr().ok();
        self.listener = Some(listener);
        info!(addr = %addr, tls = self.config.tls.is_some(), "Listening");
        Ok(())
    }

    /// Spawns the accept loop.
    pub fn start(&mut self) -> Result<(), ServerLaunchError> {
        let listener = self
            .listener
            .take()
            .ok_or(ServerLaunchError::NotInitialized)?;

        let config = Arc::clone(&self.config);
        let registry = Arc::clone(&self.registry);
        let stop = self.stop.subscribe();

        self.accept_task = Some(tokio::spawn(accept_loop(listener, config, registry, stop)));
        Ok(())
    }

    /// Stops accepting. Sessions already running finish on their own.
    pub fn signal_shutdown(&self) {
        self.stop.send_replace(true);
    }

    /// Waits for the accept loop, then for every live session.
    pub async fn join(&mut self) {
        if let Some(task) = self.accept_task.take() {
            if let Err(e) = task.await {
                error!(error = %e, "accept loop panicked");
            }
        }
        self.registry.wait_drained().await;
    }
}

async fn accept_loop(
    listener: TcpListener,
    config: Arc<ServerConfig>,
    registry: Arc<SessionRegistry>,
    mut stop: watch::Receiver<bool>,
) {
    let mut next_id: u64 = 0;

    loop {
        if *stop.borrow() {
            break;
        }

        let (socket, peer) = tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() {
                    // The server handle is gone; nobody can stop us later.
                    break;
                }
                continue;
            }
            accepted = listener.accept() => match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    // Typically fd exhaustion; back off instead of spinning.
                    warn!(cause = %e, "failed to accept");
                    tokio::select! {
                        _ = stop.changed() => {}
                        _ = tokio::time::sleep(ACCEPT_BACKOFF) => {}
                    }
                    continue;
                }
            },
        };

        next_id += 1;
        let id = next_id;
        info!(session = id, peer = %peer, "Accepted connection");

        let connection = Connection::new(socket, peer).with_read_timeout(config.read_timeout);
        let session = Session::new(id, connection, Arc::clone(&config));
        registry.spawn(id, session.run());
    }

    info!(addr = ?listener.local_addr().ok(), "Stopped accepting");
}
