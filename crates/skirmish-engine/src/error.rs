//! Error types for content loading and move validation.

use crate::grid::IVec2;

/// Problems found while building a content catalog or reconstructing a
/// game from a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    /// The definitions were not valid JSON.
    #[error("content definition is not valid JSON: {0}")]
    Parse(String),

    /// Two entries in the same registry share a stable id.
    #[error("duplicate content id {0:?}")]
    DuplicateId(String),

    /// A definition referenced a stable id that was never registered.
    #[error("unknown content id {0:?}")]
    UnknownId(String),

    /// A numeric id (from a snapshot or a wire message) has no entry.
    #[error("unknown numeric content id {0}")]
    UnknownNumericId(u32),

    /// A stat violated a catalog invariant, e.g. zero attack accuracy.
    #[error("invalid stat for {id:?}: {reason}")]
    InvalidStat { id: String, reason: String },

    /// A position fell outside the map.
    #[error("position {0} is outside the map")]
    OutOfBounds(IVec2),

    /// Two units claimed the same cell.
    #[error("cell {0} is already occupied")]
    CellOccupied(IVec2),

    /// A unit referenced a player seat the game does not have.
    #[error("player {player} out of range for {player_count} players")]
    PlayerOutOfRange { player: u32, player_count: u32 },

    /// The roster did not match the map template's seat count.
    #[error("map wants {expected} players, got {actual}")]
    PlayerCountMismatch { expected: u32, actual: u32 },

    /// A snapshot carried a unit with impossible health or points.
    #[error("unit at {position} has invalid state: {reason}")]
    InvalidUnitState { position: IVec2, reason: String },
}

/// A well-formed move that the rules reject. The game state is untouched
/// whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidMove {
    /// The argument list does not have the shape the move kind requires.
    #[error("malformed move arguments: expected {expected}")]
    MalformedArguments { expected: &'static str },

    /// No unit stands on the cell the move names as its source.
    #[error("no unit at source {0}")]
    NoUnitAtSource(IVec2),

    /// The unit at the source belongs to another player.
    #[error("unit at {0} does not belong to the current player")]
    NotYourUnit(IVec2),

    /// A path step left the map.
    #[error("position {0} is outside the map")]
    OutOfBounds(IVec2),

    /// Two consecutive path positions are not orthogonal neighbors.
    #[error("step from {0} to {1} is not between adjacent tiles")]
    StepNotAdjacent(IVec2, IVec2),

    /// A path position other than the start is occupied.
    #[error("cell {0} is occupied")]
    CellOccupied(IVec2),

    /// The unit had no movement points left before a step.
    #[error("unit at {0} has no movement points left")]
    NoMovementPoints(IVec2),

    /// The unit had no action points left for an attack.
    #[error("unit at {0} has no action points left")]
    NoActionPoints(IVec2),

    /// No unit stands on the attack's target cell.
    #[error("no unit to attack at {0}")]
    NoTargetUnit(IVec2),

    /// A content id in the game state has no entry in the supplied
    /// catalog. Only possible when the catalog differs from the one the
    /// game was built with.
    #[error("content id {0} not present in catalog")]
    UnknownContent(u32),
}
