//! # skirmish-protocol
//!
//! The session-layer protocol: the message catalog, the version
//! handshake, and the [`ProtocolEntity`] that pumps one connection and
//! enforces which messages are acceptable in the current phase.

pub mod entity;
pub mod error;
pub mod messages;
pub mod version;

pub use entity::{Event, ProtocolEntity};
pub use error::ProtocolError;
pub use messages::{JoinError, LoginResult, Message, MessageTag, JOIN_ANY};
pub use version::{perform_version_handshake, Version, PROTOCOL_VERSION};
