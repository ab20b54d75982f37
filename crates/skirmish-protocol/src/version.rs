//! Protocol versioning and the opening handshake.

use std::fmt;
use std::time::Duration;

use skirmish_codec::{CodecError, Decode, Encode, RxBuffer, TxBuffer};
use skirmish_transport::MessageTransport;

use crate::messages::{Message, MessageTag};
use crate::ProtocolError;

/// The protocol revision this build speaks.
pub const PROTOCOL_VERSION: Version = Version::new(1, 0, 0);

/// A semantic protocol version.
///
/// Two versions are compatible when major and minor match exactly; the
/// patch level never affects the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: i32,
    pub minor: i32,
    pub patch: i32,
}

impl Version {
    pub const fn new(major: i32, minor: i32, patch: i32) -> Self {
        Self { major, minor, patch }
    }

    pub fn is_compatible_with(&self, other: &Version) -> bool {
        self.major == other.major && self.minor == other.minor
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Encode for Version {
    fn encode(&self, tx: &mut TxBuffer) {
        tx.put_i32(self.major);
        tx.put_i32(self.minor);
        tx.put_i32(self.patch);
    }
}

impl Decode for Version {
    fn decode(rx: &mut RxBuffer) -> Result<Self, CodecError> {
        Ok(Self {
            major: rx.read_i32()?,
            minor: rx.read_i32()?,
            patch: rx.read_i32()?,
        })
    }
}

/// Runs the symmetric version exchange that opens every connection.
///
/// Each side sends its own `Version` message and waits for the peer's.
/// Returns the peer's version once both are known to be compatible.
pub async fn perform_version_handshake(
    transport: &mut MessageTransport,
    timeout: Duration,
) -> Result<Version, ProtocolError> {
    let mut hello = TxBuffer::new();
    hello.write(&Message::Version {
        version: PROTOCOL_VERSION,
    });
    transport.send(&hello);

    let mut frame = transport.wait_for_message(timeout).await?;
    let message: Message = frame.read()?;
    if !frame.is_empty() {
        return Err(ProtocolError::TrailingBytes);
    }
    let Message::Version { version: theirs } = message else {
        return Err(ProtocolError::UnexpectedMessage {
            expected: MessageTag::Version,
            actual: message.tag(),
        });
    };

    if !PROTOCOL_VERSION.is_compatible_with(&theirs) {
        return Err(ProtocolError::IncompatibleVersion {
            ours: PROTOCOL_VERSION,
            theirs,
        });
    }
    tracing::debug!(%theirs, "version handshake complete");
    Ok(theirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compatibility_ignores_patch() {
        let base = Version::new(1, 2, 0);
        assert!(base.is_compatible_with(&Version::new(1, 2, 9)));
        assert!(!base.is_compatible_with(&Version::new(1, 3, 0)));
        assert!(!base.is_compatible_with(&Version::new(2, 2, 0)));
    }

    #[test]
    fn test_version_wire_shape() {
        let mut tx = TxBuffer::new();
        tx.write(&Version::new(1, 2, 3));
        assert_eq!(
            tx.as_bytes(),
            &[0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3]
        );
    }
}
