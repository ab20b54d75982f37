//! Server configuration.

use std::time::Duration;

/// Tunables for a [`Server`](crate::Server).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: String,
    /// Maximum number of concurrently hosted games.
    pub max_games: usize,
    /// A connection that sends nothing for this long is dropped.
    pub idle_timeout: Duration,
    /// How long the opening version exchange may take.
    pub handshake_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:7777".to_string(),
            max_games: 64,
            idle_timeout: Duration::from_secs(30),
            handshake_timeout: Duration::from_secs(5),
        }
    }
}
