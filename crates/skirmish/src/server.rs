//! The accept loop and shared server state.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use skirmish_engine::ContentCatalog;
use skirmish_session::{SessionManager, UserRegistry};
use skirmish_transport::POLL_INTERVAL;
use tokio::net::TcpListener;

use crate::handler::handle_connection;
use crate::{ServerConfig, ServerError};

/// Lifecycle stage of the whole server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ServerStatus {
    /// Normal operation.
    Running = 0,
    /// Existing games play out, but no new logins or games are accepted.
    SlowShutdown = 1,
    /// Everything stops: connections are told and dropped.
    FastShutdown = 2,
}

impl ServerStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::SlowShutdown,
            2 => Self::FastShutdown,
            _ => Self::Running,
        }
    }
}

/// Shared state handed to every connection task.
pub(crate) struct ServerState {
    pub(crate) config: ServerConfig,
    pub(crate) users: UserRegistry,
    pub(crate) sessions: SessionManager,
    status: AtomicU8,
}

impl ServerState {
    pub(crate) fn status(&self) -> ServerStatus {
        ServerStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    fn set_status(&self, status: ServerStatus) {
        self.status.store(status as u8, Ordering::Release);
    }
}

/// A cloneable handle for controlling a running server.
#[derive(Clone)]
pub struct ServerHandle {
    state: Arc<ServerState>,
}

impl ServerHandle {
    pub fn status(&self) -> ServerStatus {
        self.state.status()
    }

    /// Stops accepting logins and new games; running games finish.
    pub fn initiate_slow_shutdown(&self) {
        tracing::info!("slow shutdown initiated");
        self.state.set_status(ServerStatus::SlowShutdown);
    }

    /// Stops everything, including the accept loop and live connections.
    pub fn initiate_fast_shutdown(&self) {
        tracing::info!("fast shutdown initiated");
        self.state.set_status(ServerStatus::FastShutdown);
    }

    /// Number of games currently hosted.
    pub fn game_count(&self) -> usize {
        self.state.sessions.game_count()
    }
}

/// The Skirmish game server.
pub struct Server {
    listener: TcpListener,
    state: Arc<ServerState>,
}

impl Server {
    /// Binds the listener and prepares shared state.
    pub async fn bind(
        config: ServerConfig,
        catalog: Arc<ContentCatalog>,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(&config.bind_addr).await?;
        let state = Arc::new(ServerState {
            sessions: SessionManager::new(catalog, config.max_games),
            users: UserRegistry::new(),
            config,
            status: AtomicU8::new(ServerStatus::Running as u8),
        });
        Ok(Self { listener, state })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Runs the accept loop until a fast shutdown is initiated.
    ///
    /// Each accepted connection gets its own task; connection errors end
    /// that task, never the server.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!(addr = %self.listener.local_addr()?, "server listening");

        loop {
            if self.state.status() == ServerStatus::FastShutdown {
                break;
            }
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tracing::debug!(%peer, "connection accepted");
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
                // Wake periodically so a shutdown is noticed without a
                // new connection arriving.
                _ = tokio::time::sleep(POLL_INTERVAL) => {}
            }
        }

        tracing::info!("accept loop stopped");
        Ok(())
    }
}
