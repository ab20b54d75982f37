//! # skirmish
//!
//! The Skirmish game server: a session layer for multiplayer turn-based
//! strategy games over length-framed TCP.
//!
//! This crate ties the layers together: transport → protocol → session →
//! engine. Library users bind a [`Server`] with a [`ServerConfig`] and a
//! content catalog, then drive it with [`Server::run`].

mod config;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::ServerError;
pub use server::{Server, ServerHandle, ServerStatus};

pub use skirmish_engine as engine;
pub use skirmish_protocol as protocol;
pub use skirmish_session as session;
pub use skirmish_transport as transport;
