//! Error type for the codec layer.

/// Errors that can occur while decoding bytes received from the network.
///
/// Both variants are recoverable: they terminate decoding of the current
/// value, never the process. Higher layers decide whether the connection
/// that produced the bytes survives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The buffer ran out of bytes before the value was complete.
    ///
    /// For a framed message this means the peer sent a truncated body;
    /// for raw buffer reads it simply means "not enough data yet".
    #[error("insufficient data in buffer")]
    Insufficient,

    /// The bytes decoded to a value outside the legal range — an unknown
    /// enum discriminant, a non-UTF-8 string, an inconsistent composite.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

impl CodecError {
    /// Shorthand for an [`CodecError::InvalidValue`] with a static reason.
    pub fn invalid(what: impl Into<String>) -> Self {
        Self::InvalidValue(what.into())
    }
}
