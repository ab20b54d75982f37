//! Message transport for Skirmish.
//!
//! Turns one duplex byte stream into discrete messages using a 4-byte
//! length prefix per frame. The transport owns all send/receive buffering
//! and never blocks: each [`poll`](MessageTransport::poll) moves whatever
//! bytes the socket will take right now and nothing more. Partial frames
//! are kept buffered and resumed on the next poll, never discarded.
//!
//! # Key types
//!
//! - [`FrameQueue`] — the pure framing core (no I/O), unit-testable
//! - [`MessageTransport`] — a framed, non-blocking TCP connection
//! - [`TransportError`] — I/O failure, peer disconnect, handshake timeout

mod error;
mod frame;
mod transport;

pub use error::TransportError;
pub use frame::FrameQueue;
pub use transport::{MessageTransport, POLL_INTERVAL};
