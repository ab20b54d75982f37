//! The message catalog: every frame on the wire is one of these.
//!
//! A message body is `[4-byte tag][payload]`; the surrounding length
//! frame belongs to the transport. The tag doubles as the filtering key
//! for [`ProtocolEntity`](crate::ProtocolEntity) whitelists and
//! blacklists, so it is decodable without touching the payload.

use skirmish_codec::{CodecError, Decode, Encode, RxBuffer, TxBuffer};
use skirmish_engine::{GameSnapshot, Move};

use crate::version::Version;

/// Wire tag of a message. The discriminant is the wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageTag {
    Unknown = 0,
    Version = 1,
    LoginRequest = 2,
    LoginResponse = 3,
    HostGame = 4,
    HostGameAck = 5,
    JoinGame = 6,
    LeaveGame = 7,
    GameJoinError = 8,
    GameFullSync = 9,
    GameIncrementalSync = 10,
    Echo = 11,
    Alert = 12,
}

impl MessageTag {
    /// Maps a raw wire value to a tag; values outside the catalog come
    /// back as [`MessageTag::Unknown`].
    pub fn from_u32(value: u32) -> Self {
        match value {
            1 => Self::Version,
            2 => Self::LoginRequest,
            3 => Self::LoginResponse,
            4 => Self::HostGame,
            5 => Self::HostGameAck,
            6 => Self::JoinGame,
            7 => Self::LeaveGame,
            8 => Self::GameJoinError,
            9 => Self::GameFullSync,
            10 => Self::GameIncrementalSync,
            11 => Self::Echo,
            12 => Self::Alert,
            _ => Self::Unknown,
        }
    }
}

/// Outcome of a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum LoginResult {
    Ok = 0,
    AlreadyLoggedIn = 1,
}

/// Why a host or join request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum JoinError {
    NoError = 0,
    GameDoesntExist = 1,
    GameAlreadyRunning = 2,
    ServerFull = 3,
    ServerShuttingDown = 4,
    Other = 5,
}

macro_rules! u32_enum_codec {
    ($ty:ident { $($variant:ident = $value:expr),+ $(,)? }) => {
        impl Encode for $ty {
            fn encode(&self, tx: &mut TxBuffer) {
                tx.put_u32(*self as u32);
            }
        }

        impl Decode for $ty {
            fn decode(rx: &mut RxBuffer) -> Result<Self, CodecError> {
                match rx.read_u32()? {
                    $($value => Ok(Self::$variant),)+
                    other => Err(CodecError::invalid(format!(
                        concat!("unknown ", stringify!($ty), " value {}"),
                        other
                    ))),
                }
            }
        }
    };
}

u32_enum_codec!(LoginResult {
    Ok = 0,
    AlreadyLoggedIn = 1,
});

u32_enum_codec!(JoinError {
    NoError = 0,
    GameDoesntExist = 1,
    GameAlreadyRunning = 2,
    ServerFull = 3,
    ServerShuttingDown = 4,
    Other = 5,
});

/// Sentinel game id meaning "put me in any game with a free seat".
pub const JOIN_ANY: u64 = 0;

/// One protocol message, tag plus payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Version advertisement; the first message on every connection.
    Version { version: Version },
    /// Client asks to claim a username.
    LoginRequest { username: String },
    LoginResponse { result: LoginResult },
    /// Client asks to open a new game on the named map template.
    HostGame { map: String },
    /// Server acknowledges a hosted game and names its id.
    HostGameAck { game_id: u64 },
    /// Client asks for a seat in a game, or any game via [`JOIN_ANY`].
    JoinGame { game_id: u64 },
    LeaveGame,
    GameJoinError { reason: JoinError },
    /// Complete game state, sent when a game starts or resyncs.
    GameFullSync { snapshot: GameSnapshot },
    /// A run of moves from the authoritative log.
    GameIncrementalSync { first_move_index: u32, moves: Vec<Move> },
    /// Diagnostic round trip; the server echoes the text back.
    Echo { text: String },
    /// Human-readable notice from the server.
    Alert { text: String },
}

impl Message {
    pub fn tag(&self) -> MessageTag {
        match self {
            Self::Version { .. } => MessageTag::Version,
            Self::LoginRequest { .. } => MessageTag::LoginRequest,
            Self::LoginResponse { .. } => MessageTag::LoginResponse,
            Self::HostGame { .. } => MessageTag::HostGame,
            Self::HostGameAck { .. } => MessageTag::HostGameAck,
            Self::JoinGame { .. } => MessageTag::JoinGame,
            Self::LeaveGame => MessageTag::LeaveGame,
            Self::GameJoinError { .. } => MessageTag::GameJoinError,
            Self::GameFullSync { .. } => MessageTag::GameFullSync,
            Self::GameIncrementalSync { .. } => MessageTag::GameIncrementalSync,
            Self::Echo { .. } => MessageTag::Echo,
            Self::Alert { .. } => MessageTag::Alert,
        }
    }

    /// Decodes a payload whose tag has already been read and checked.
    pub fn decode_body(tag: MessageTag, rx: &mut RxBuffer) -> Result<Self, CodecError> {
        match tag {
            MessageTag::Unknown => Err(CodecError::invalid("unknown message tag")),
            MessageTag::Version => Ok(Self::Version { version: rx.read()? }),
            MessageTag::LoginRequest => Ok(Self::LoginRequest { username: rx.read()? }),
            MessageTag::LoginResponse => Ok(Self::LoginResponse { result: rx.read()? }),
            MessageTag::HostGame => Ok(Self::HostGame { map: rx.read()? }),
            MessageTag::HostGameAck => Ok(Self::HostGameAck {
                game_id: rx.read_u64()?,
            }),
            MessageTag::JoinGame => Ok(Self::JoinGame {
                game_id: rx.read_u64()?,
            }),
            MessageTag::LeaveGame => Ok(Self::LeaveGame),
            MessageTag::GameJoinError => Ok(Self::GameJoinError { reason: rx.read()? }),
            MessageTag::GameFullSync => Ok(Self::GameFullSync { snapshot: rx.read()? }),
            MessageTag::GameIncrementalSync => Ok(Self::GameIncrementalSync {
                first_move_index: rx.read_u32()?,
                moves: rx.read()?,
            }),
            MessageTag::Echo => Ok(Self::Echo { text: rx.read()? }),
            MessageTag::Alert => Ok(Self::Alert { text: rx.read()? }),
        }
    }
}

impl Encode for Message {
    fn encode(&self, tx: &mut TxBuffer) {
        tx.put_u32(self.tag() as u32);
        match self {
            Self::Version { version } => tx.write(version),
            Self::LoginRequest { username } => tx.write(username),
            Self::LoginResponse { result } => tx.write(result),
            Self::HostGame { map } => tx.write(map),
            Self::HostGameAck { game_id } => tx.put_u64(*game_id),
            Self::JoinGame { game_id } => tx.put_u64(*game_id),
            Self::LeaveGame => {}
            Self::GameJoinError { reason } => tx.write(reason),
            Self::GameFullSync { snapshot } => tx.write(snapshot),
            Self::GameIncrementalSync { first_move_index, moves } => {
                tx.put_u32(*first_move_index);
                tx.write(moves);
            }
            Self::Echo { text } => tx.write(text),
            Self::Alert { text } => tx.write(text),
        }
    }
}

impl Decode for Message {
    fn decode(rx: &mut RxBuffer) -> Result<Self, CodecError> {
        let tag = MessageTag::from_u32(rx.read_u32()?);
        Self::decode_body(tag, rx)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_engine::IVec2;

    fn round_trip(message: Message) {
        let mut tx = TxBuffer::new();
        tx.write(&message);
        let mut rx = RxBuffer::from_bytes(tx.as_bytes());
        assert_eq!(rx.read::<Message>().expect("message decodes"), message);
        assert!(rx.is_empty(), "decode must consume the whole payload");
    }

    #[test]
    fn test_catalog_round_trips() {
        round_trip(Message::Version {
            version: Version::new(1, 4, 2),
        });
        round_trip(Message::LoginRequest {
            username: "ada".to_string(),
        });
        round_trip(Message::LoginResponse {
            result: LoginResult::AlreadyLoggedIn,
        });
        round_trip(Message::HostGame {
            map: "duel-9".to_string(),
        });
        round_trip(Message::HostGameAck { game_id: 7 });
        round_trip(Message::JoinGame { game_id: JOIN_ANY });
        round_trip(Message::LeaveGame);
        round_trip(Message::GameJoinError {
            reason: JoinError::ServerFull,
        });
        round_trip(Message::GameIncrementalSync {
            first_move_index: 3,
            moves: vec![
                Move::move_unit(&[IVec2::new(0, 0), IVec2::new(1, 0)]),
                Move::end_turn(),
            ],
        });
        round_trip(Message::Echo {
            text: "ping".to_string(),
        });
        round_trip(Message::Alert {
            text: "server is shutting down".to_string(),
        });
    }

    #[test]
    fn test_tag_is_the_first_four_bytes() {
        let mut tx = TxBuffer::new();
        tx.write(&Message::LeaveGame);
        assert_eq!(tx.as_bytes(), &[0, 0, 0, 7]);
    }

    #[test]
    fn test_unknown_tag_fails_to_decode() {
        let mut rx = RxBuffer::from_bytes(&[0, 0, 0, 99]);
        assert!(matches!(
            rx.read::<Message>(),
            Err(CodecError::InvalidValue(_))
        ));
        assert_eq!(MessageTag::from_u32(99), MessageTag::Unknown);
    }

    #[test]
    fn test_truncated_payload_is_insufficient() {
        // A LoginRequest whose string length prefix lies.
        let mut tx = TxBuffer::new();
        tx.put_u32(MessageTag::LoginRequest as u32);
        tx.put_u32(50);
        tx.push_raw(b"short");
        let mut rx = RxBuffer::from_bytes(tx.as_bytes());
        assert_eq!(rx.read::<Message>(), Err(CodecError::Insufficient));
    }
}
