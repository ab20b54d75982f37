//! # skirmish-engine
//!
//! The authoritative rules engine: content catalogs loaded from JSON,
//! a grid-based board, and a [`Game`] state machine that validates every
//! move before applying it.
//!
//! The engine is deliberately free of I/O and clocks. Determinism is the
//! design constraint throughout: two participants that load the same
//! content and apply the same accepted moves hold byte-identical
//! snapshots.

pub mod content;
pub mod error;
pub mod game;
pub mod grid;
pub mod map;
pub mod moves;
pub mod registry;
pub mod unit;

pub use content::{ContentCatalog, MapId, TerrainId, TerrainType, UnitType, UnitTypeId};
pub use error::{ContentError, InvalidMove};
pub use game::{compute_damage, Game, GameSnapshot};
pub use grid::{Grid, IVec2};
pub use map::{MapTemplate, StartingUnit};
pub use moves::{Move, MoveKind};
pub use registry::{ContentItem, Registry};
pub use unit::Unit;
