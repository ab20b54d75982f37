//! Map templates: the blueprint a new game is stamped from.

use crate::content::{TerrainId, UnitTypeId};
use crate::grid::{Grid, IVec2};
use crate::registry::ContentItem;

/// One unit a seat starts the game with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartingUnit {
    pub unit_type: UnitTypeId,
    pub position: IVec2,
}

/// The immutable description of a playable map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapTemplate {
    pub stable_id: String,
    pub terrain: Grid<TerrainId>,
    /// Outer index is the player seat; inner list is that seat's units.
    pub starting_units: Vec<Vec<StartingUnit>>,
}

impl MapTemplate {
    /// How many players a game on this map has.
    pub fn player_count(&self) -> u32 {
        self.starting_units.len() as u32
    }

    pub fn size(&self) -> IVec2 {
        self.terrain.size()
    }
}

impl ContentItem for MapTemplate {
    fn stable_id(&self) -> &str {
        &self.stable_id
    }
}
