//! Binary codec for Skirmish's wire format.
//!
//! Everything that crosses the network is encoded with this crate:
//! fixed-width big-endian integers and floats, length-prefixed strings,
//! and count-prefixed sequences. The codec knows nothing about messages
//! or framing — it only converts values to and from bytes.
//!
//! # Key types
//!
//! - [`TxBuffer`] / [`RxBuffer`] — FIFO byte queues for outbound and
//!   inbound data, storing bytes in network order
//! - [`Encode`] / [`Decode`] — the conversion traits implemented by every
//!   wire-visible type
//! - [`CodecError`] — recoverable decode failures (short buffer, bad value)

mod buffer;
mod codec;
mod error;

pub use buffer::{RxBuffer, TxBuffer};
pub use codec::{Decode, Encode};
pub use error::CodecError;
