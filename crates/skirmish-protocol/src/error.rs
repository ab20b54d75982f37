//! Error types for the protocol layer.

use skirmish_codec::CodecError;
use skirmish_transport::TransportError;

use crate::messages::MessageTag;
use crate::version::Version;

/// Violations of the protocol by the peer, plus transport failures that
/// surface while talking to it.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The message's tag is filtered out in the current phase.
    #[error("message {tag:?} is not accepted right now")]
    Rejected { tag: MessageTag },

    /// The payload did not decode as its tag demands.
    #[error("malformed message: {0}")]
    Malformed(#[from] CodecError),

    /// The payload decoded but left bytes unconsumed.
    #[error("message has trailing bytes")]
    TrailingBytes,

    /// A synchronous exchange got a well-formed message of the wrong kind.
    #[error("expected {expected:?}, got {actual:?}")]
    UnexpectedMessage {
        expected: MessageTag,
        actual: MessageTag,
    },

    /// The peer speaks a protocol revision we cannot talk to.
    #[error("incompatible protocol version: ours {ours}, theirs {theirs}")]
    IncompatibleVersion { ours: Version, theirs: Version },

    #[error(transparent)]
    Transport(#[from] TransportError),
}
