//! Error types for session management.

use skirmish_engine::{ContentError, InvalidMove};

use crate::GameId;

/// Why a lobby or in-game operation was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The server is at its configured game limit.
    #[error("server is at its game limit")]
    ServerFull,

    #[error("game {0} does not exist")]
    GameDoesntExist(GameId),

    /// The game already has all its players and cannot be joined.
    #[error("game {0} has already started")]
    GameAlreadyRunning(GameId),

    #[error("unknown map {0:?}")]
    UnknownMap(String),

    /// A player may be in at most one game at a time.
    #[error("player is already in a game")]
    AlreadyInGame,

    #[error("player is not in a game")]
    NotInGame,

    /// The game is still gathering players.
    #[error("game has not started yet")]
    NotReady,

    #[error("player is not seated in this game")]
    NotSeated,

    #[error("it is not this player's turn")]
    NotYourTurn,

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Move(#[from] InvalidMove),
}
