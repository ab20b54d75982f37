//! Unified error type for the server.

use skirmish_codec::CodecError;
use skirmish_engine::ContentError;
use skirmish_protocol::ProtocolError;
use skirmish_session::SessionError;
use skirmish_transport::TransportError;

/// Top-level error wrapping every layer's error type, so the binary and
/// the connection handlers can use `?` throughout.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_errors_convert() {
        let err: ServerError = TransportError::Disconnected.into();
        assert!(matches!(err, ServerError::Transport(_)));

        let err: ServerError = SessionError::ServerFull.into();
        assert!(matches!(err, ServerError::Session(_)));
        assert!(err.to_string().contains("game limit"));

        let err: ServerError = CodecError::Insufficient.into();
        assert!(matches!(err, ServerError::Codec(_)));
    }
}
