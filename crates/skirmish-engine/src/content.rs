//! Content types and the catalog that owns them.
//!
//! Terrain types, unit types, and map templates are data, not code: they
//! are loaded from JSON definitions into registries, and game state refers
//! to them by numeric id. Both sides of a connection must load the same
//! definitions for those ids to mean the same thing.

use serde::Deserialize;

use crate::grid::{Grid, IVec2};
use crate::map::{MapTemplate, StartingUnit};
use crate::registry::{ContentItem, Registry};
use crate::ContentError;

/// Numeric id of a [`TerrainType`] within a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TerrainId(pub u32);

/// Numeric id of a [`UnitType`] within a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitTypeId(pub u32);

/// Numeric id of a [`MapTemplate`] within a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MapId(pub u32);

macro_rules! id_codec {
    ($($ty:ident),+) => {
        $(
            impl skirmish_codec::Encode for $ty {
                fn encode(&self, tx: &mut skirmish_codec::TxBuffer) {
                    tx.put_u32(self.0);
                }
            }

            impl skirmish_codec::Decode for $ty {
                fn decode(
                    rx: &mut skirmish_codec::RxBuffer,
                ) -> Result<Self, skirmish_codec::CodecError> {
                    Ok(Self(rx.read_u32()?))
                }
            }

            impl std::fmt::Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )+
    };
}

id_codec!(TerrainId, UnitTypeId, MapId);

/// A kind of terrain a map tile can have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerrainType {
    pub stable_id: String,
    /// Movement points charged for touching a tile of this terrain.
    pub movement_cost: i32,
}

impl ContentItem for TerrainType {
    fn stable_id(&self) -> &str {
        &self.stable_id
    }
}

/// The immutable stats shared by all units of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitType {
    pub stable_id: String,
    pub max_health: i32,
    pub armor: i32,
    pub evasion: i32,
    /// Movement points granted at the start of each of the owner's turns.
    pub movement_points: i32,
    /// Action points granted at the start of each of the owner's turns.
    pub action_points: i32,
    pub attack_damage: i32,
    pub attack_penetration: i32,
    pub attack_accuracy: i32,
}

impl ContentItem for UnitType {
    fn stable_id(&self) -> &str {
        &self.stable_id
    }
}

// ---------------------------------------------------------------------------
// JSON definitions
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CatalogDef {
    #[serde(default)]
    terrains: Vec<TerrainDef>,
    #[serde(default)]
    units: Vec<UnitDef>,
    #[serde(default)]
    maps: Vec<MapDef>,
}

#[derive(Debug, Deserialize)]
struct TerrainDef {
    id: String,
    movement_cost: i32,
}

#[derive(Debug, Deserialize)]
struct UnitDef {
    id: String,
    max_health: i32,
    #[serde(default)]
    armor: i32,
    #[serde(default)]
    evasion: i32,
    movement_points: i32,
    action_points: i32,
    attack_damage: i32,
    attack_penetration: i32,
    attack_accuracy: i32,
}

#[derive(Debug, Deserialize)]
struct MapDef {
    id: String,
    width: i32,
    height: i32,
    /// Stable id of the terrain every tile starts as.
    fill: String,
    #[serde(default)]
    terrain_overrides: Vec<TerrainOverrideDef>,
    /// One list of starting units per player seat.
    starting_units: Vec<Vec<StartingUnitDef>>,
}

#[derive(Debug, Deserialize)]
struct TerrainOverrideDef {
    x: i32,
    y: i32,
    terrain: String,
}

#[derive(Debug, Deserialize)]
struct StartingUnitDef {
    unit: String,
    x: i32,
    y: i32,
}

/// The built-in definitions served when no content file is supplied.
const STANDARD_DEFS: &str = r#"{
  "terrains": [
    { "id": "space", "movement_cost": 10 },
    { "id": "nebula", "movement_cost": 20 }
  ],
  "units": [
    {
      "id": "fighter",
      "max_health": 10, "armor": 0, "evasion": 2,
      "movement_points": 40, "action_points": 1,
      "attack_damage": 6, "attack_penetration": 2, "attack_accuracy": 8
    },
    {
      "id": "cruiser",
      "max_health": 24, "armor": 3, "evasion": 0,
      "movement_points": 20, "action_points": 1,
      "attack_damage": 10, "attack_penetration": 4, "attack_accuracy": 6
    }
  ],
  "maps": [
    {
      "id": "duel-9",
      "width": 3, "height": 3, "fill": "space",
      "starting_units": [
        [ { "unit": "fighter", "x": 0, "y": 0 } ],
        [ { "unit": "fighter", "x": 2, "y": 2 } ]
      ]
    },
    {
      "id": "crossfire-64",
      "width": 8, "height": 8, "fill": "space",
      "terrain_overrides": [
        { "x": 3, "y": 3, "terrain": "nebula" },
        { "x": 4, "y": 3, "terrain": "nebula" },
        { "x": 3, "y": 4, "terrain": "nebula" },
        { "x": 4, "y": 4, "terrain": "nebula" }
      ],
      "starting_units": [
        [
          { "unit": "fighter", "x": 0, "y": 0 },
          { "unit": "cruiser", "x": 1, "y": 0 }
        ],
        [
          { "unit": "fighter", "x": 7, "y": 7 },
          { "unit": "cruiser", "x": 6, "y": 7 }
        ]
      ]
    }
  ]
}"#;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// All content a server (or client) knows about, behind numeric ids.
#[derive(Debug, Clone, Default)]
pub struct ContentCatalog {
    terrains: Registry<TerrainType>,
    units: Registry<UnitType>,
    maps: Registry<MapTemplate>,
}

impl ContentCatalog {
    /// Loads a catalog from a JSON definition document.
    ///
    /// Ids are assigned in document order, so two participants loading the
    /// same document end up with identical numeric ids.
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        let def: CatalogDef =
            serde_json::from_str(json).map_err(|e| ContentError::Parse(e.to_string()))?;
        Self::from_def(def)
    }

    /// The built-in catalog.
    pub fn standard() -> Self {
        Self::from_json(STANDARD_DEFS).expect("built-in content definitions are valid")
    }

    fn from_def(def: CatalogDef) -> Result<Self, ContentError> {
        let mut catalog = Self::default();

        for terrain in def.terrains {
            if terrain.movement_cost <= 0 {
                return Err(ContentError::InvalidStat {
                    id: terrain.id,
                    reason: "movement_cost must be positive".to_string(),
                });
            }
            catalog.terrains.register(TerrainType {
                stable_id: terrain.id,
                movement_cost: terrain.movement_cost,
            })?;
        }

        for unit in def.units {
            validate_unit_def(&unit)?;
            catalog.units.register(UnitType {
                stable_id: unit.id,
                max_health: unit.max_health,
                armor: unit.armor,
                evasion: unit.evasion,
                movement_points: unit.movement_points,
                action_points: unit.action_points,
                attack_damage: unit.attack_damage,
                attack_penetration: unit.attack_penetration,
                attack_accuracy: unit.attack_accuracy,
            })?;
        }

        for map in def.maps {
            let template = catalog.resolve_map_def(map)?;
            catalog.maps.register(template)?;
        }

        tracing::debug!(
            terrains = catalog.terrains.len(),
            units = catalog.units.len(),
            maps = catalog.maps.len(),
            "content catalog loaded"
        );
        Ok(catalog)
    }

    fn resolve_map_def(&self, def: MapDef) -> Result<MapTemplate, ContentError> {
        if def.width <= 0 || def.height <= 0 {
            return Err(ContentError::InvalidStat {
                id: def.id,
                reason: "map dimensions must be positive".to_string(),
            });
        }
        let fill = self.terrain_by_stable_id(&def.fill)?;
        let mut terrain = Grid::new(IVec2::new(def.width, def.height), fill);

        for over in def.terrain_overrides {
            let pos = IVec2::new(over.x, over.y);
            if !terrain.in_bounds(pos) {
                return Err(ContentError::OutOfBounds(pos));
            }
            terrain.set(pos, self.terrain_by_stable_id(&over.terrain)?);
        }

        let mut starting_units = Vec::with_capacity(def.starting_units.len());
        for seat in def.starting_units {
            let mut units = Vec::with_capacity(seat.len());
            for su in seat {
                let (id, _) = self
                    .units
                    .lookup(&su.unit)
                    .ok_or_else(|| ContentError::UnknownId(su.unit.clone()))?;
                let position = IVec2::new(su.x, su.y);
                if !terrain.in_bounds(position) {
                    return Err(ContentError::OutOfBounds(position));
                }
                units.push(StartingUnit {
                    unit_type: UnitTypeId(id),
                    position,
                });
            }
            starting_units.push(units);
        }
        if starting_units.is_empty() {
            return Err(ContentError::InvalidStat {
                id: def.id,
                reason: "map must seat at least one player".to_string(),
            });
        }

        Ok(MapTemplate {
            stable_id: def.id,
            terrain,
            starting_units,
        })
    }

    fn terrain_by_stable_id(&self, stable_id: &str) -> Result<TerrainId, ContentError> {
        self.terrains
            .lookup(stable_id)
            .map(|(id, _)| TerrainId(id))
            .ok_or_else(|| ContentError::UnknownId(stable_id.to_string()))
    }

    pub fn terrain(&self, id: TerrainId) -> Option<&TerrainType> {
        self.terrains.get(id.0)
    }

    pub fn unit_type(&self, id: UnitTypeId) -> Option<&UnitType> {
        self.units.get(id.0)
    }

    pub fn map(&self, id: MapId) -> Option<&MapTemplate> {
        self.maps.get(id.0)
    }

    pub fn map_by_stable_id(&self, stable_id: &str) -> Option<(MapId, &MapTemplate)> {
        self.maps.lookup(stable_id).map(|(id, t)| (MapId(id), t))
    }

    /// All map templates, in id order.
    pub fn maps(&self) -> impl Iterator<Item = (MapId, &MapTemplate)> {
        self.maps.iter().map(|(id, t)| (MapId(id), t))
    }
}

fn validate_unit_def(def: &UnitDef) -> Result<(), ContentError> {
    let fail = |reason: &str| {
        Err(ContentError::InvalidStat {
            id: def.id.clone(),
            reason: reason.to_string(),
        })
    };
    if def.max_health <= 0 {
        return fail("max_health must be positive");
    }
    if def.armor < 0 || def.evasion < 0 {
        return fail("armor and evasion must be non-negative");
    }
    if def.movement_points < 0 || def.action_points < 0 {
        return fail("per-turn points must be non-negative");
    }
    if def.attack_damage < 0 {
        return fail("attack_damage must be non-negative");
    }
    // The damage formula divides by (penetration + armor) and
    // (accuracy + evasion); these keep both divisors positive.
    if def.attack_penetration <= 0 {
        return fail("attack_penetration must be positive");
    }
    if def.attack_accuracy <= 0 {
        return fail("attack_accuracy must be positive");
    }
    Ok(())
}

// =========================================================================
// Tests
// =========================================================================
