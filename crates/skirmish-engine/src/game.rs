//! The authoritative game state machine.
//!
//! A [`Game`] owns the board and the units on it. The only way its state
//! changes after construction is [`Game::make_move`], which validates a
//! move completely before mutating anything: a rejected move leaves the
//! state untouched, so every participant that applies the same accepted
//! moves in the same order holds an identical state.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use skirmish_codec::{CodecError, Decode, Encode, RxBuffer, TxBuffer};

use crate::content::{ContentCatalog, TerrainId, UnitType};
use crate::grid::{Grid, IVec2};
use crate::map::MapTemplate;
use crate::moves::{Move, MoveKind};
use crate::unit::Unit;
use crate::{ContentError, InvalidMove};

/// Damage one unit type deals to another per attack.
///
/// Integer arithmetic throughout, truncating toward zero. Both divisors
/// are positive because the catalog rejects non-positive penetration and
/// accuracy and negative armor and evasion. The intermediate products run
/// in `i64`: three catalog stats multiplied together can exceed `i32`
/// while the quotient never does, since it is bounded by `attack_damage`.
pub fn compute_damage(attacker: &UnitType, defender: &UnitType) -> i32 {
    let hit = attacker.attack_damage as i64
        * attacker.attack_penetration as i64
        * attacker.attack_accuracy as i64;
    let resist = (attacker.attack_penetration as i64 + defender.armor as i64)
        * (attacker.attack_accuracy as i64 + defender.evasion as i64);
    (hit / resist) as i32
}

/// One game in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    terrain: Grid<TerrainId>,
    units: Grid<Option<Unit>>,
    /// Per seat, the positions of that player's units.
    player_positions: Vec<BTreeSet<IVec2>>,
    player_names: Vec<String>,
    current_player: u32,
}

impl Game {
    /// Stamps a new game from a map template.
    ///
    /// Seats are assigned in `player_names` order.
    pub fn new(
        catalog: &ContentCatalog,
        template: &MapTemplate,
        player_names: Vec<String>,
    ) -> Result<Self, ContentError> {
        let expected = template.player_count();
        if player_names.len() as u32 != expected {
            return Err(ContentError::PlayerCountMismatch {
                expected,
                actual: player_names.len() as u32,
            });
        }

        let mut game = Self {
            terrain: template.terrain.clone(),
            units: Grid::new(template.size(), None),
            player_positions: vec![BTreeSet::new(); player_names.len()],
            player_names,
            current_player: 0,
        };
        for (seat, units) in template.starting_units.iter().enumerate() {
            for su in units {
                let stats = catalog
                    .unit_type(su.unit_type)
                    .ok_or(ContentError::UnknownNumericId(su.unit_type.0))?;
                game.spawn(
                    catalog,
                    Unit::new(su.unit_type, stats, seat as u32, su.position),
                )?;
            }
        }
        Ok(game)
    }

    /// Rebuilds a game from a snapshot, validating every field against the
    /// catalog. Used by clients receiving a full sync.
    pub fn from_snapshot(
        catalog: &ContentCatalog,
        snapshot: &GameSnapshot,
    ) -> Result<Self, ContentError> {
        if snapshot.player_names.is_empty() {
            return Err(ContentError::PlayerCountMismatch {
                expected: 1,
                actual: 0,
            });
        }
        let player_count = snapshot.player_names.len() as u32;
        if snapshot.current_player >= player_count {
            return Err(ContentError::PlayerOutOfRange {
                player: snapshot.current_player,
                player_count,
            });
        }
        for pos in snapshot.terrain.positions() {
            if let Some(&id) = snapshot.terrain.get(pos) {
                catalog
                    .terrain(id)
                    .ok_or(ContentError::UnknownNumericId(id.0))?;
            }
        }

        let mut game = Self {
            terrain: snapshot.terrain.clone(),
            units: Grid::new(snapshot.terrain.size(), None),
            player_positions: vec![BTreeSet::new(); snapshot.player_names.len()],
            player_names: snapshot.player_names.clone(),
            current_player: snapshot.current_player,
        };
        for unit in &snapshot.units {
            game.spawn(catalog, *unit)?;
        }
        Ok(game)
    }

    /// Places a unit on the board after checking every invariant a live
    /// unit must satisfy.
    fn spawn(&mut self, catalog: &ContentCatalog, unit: Unit) -> Result<(), ContentError> {
        let stats = catalog
            .unit_type(unit.unit_type)
            .ok_or(ContentError::UnknownNumericId(unit.unit_type.0))?;
        if !self.terrain.in_bounds(unit.position) {
            return Err(ContentError::OutOfBounds(unit.position));
        }
        if self.unit_at(unit.position).is_some() {
            return Err(ContentError::CellOccupied(unit.position));
        }
        if unit.player >= self.player_count() {
            return Err(ContentError::PlayerOutOfRange {
                player: unit.player,
                player_count: self.player_count(),
            });
        }
        if unit.health < 1 || unit.health > stats.max_health {
            return Err(ContentError::InvalidUnitState {
                position: unit.position,
                reason: format!("health {} out of range", unit.health),
            });
        }
        if unit.movement_points < 0 || unit.action_points < 0 {
            return Err(ContentError::InvalidUnitState {
                position: unit.position,
                reason: "negative point pool".to_string(),
            });
        }
        self.units.set(unit.position, Some(unit));
        self.player_positions[unit.player as usize].insert(unit.position);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn size(&self) -> IVec2 {
        self.terrain.size()
    }

    pub fn player_count(&self) -> u32 {
        self.player_names.len() as u32
    }

    pub fn player_names(&self) -> &[String] {
        &self.player_names
    }

    /// Seat whose turn it is.
    pub fn current_player(&self) -> u32 {
        self.current_player
    }

    pub fn unit_at(&self, pos: IVec2) -> Option<&Unit> {
        self.units.get(pos)?.as_ref()
    }

    pub fn terrain_at(&self, pos: IVec2) -> Option<TerrainId> {
        self.terrain.get(pos).copied()
    }

    /// Positions of one player's units, in coordinate order.
    pub fn positions_of(&self, player: u32) -> &BTreeSet<IVec2> {
        &self.player_positions[player as usize]
    }

    /// A player loses once they have no units left.
    pub fn has_lost(&self, player: u32) -> bool {
        self.player_positions[player as usize].is_empty()
    }

    /// A player wins once they alone still have units.
    pub fn has_won(&self, player: u32) -> bool {
        !self.has_lost(player)
            && (0..self.player_count()).all(|p| p == player || self.has_lost(p))
    }

    pub fn winner(&self) -> Option<u32> {
        (0..self.player_count()).find(|&p| self.has_won(p))
    }

    // -----------------------------------------------------------------------
    // Moves
    // -----------------------------------------------------------------------

    /// Validates and applies one move for the current player.
    ///
    /// On error the game state is exactly what it was before the call.
    pub fn make_move(
        &mut self,
        catalog: &ContentCatalog,
        mv: &Move,
    ) -> Result<(), InvalidMove> {
        match mv.kind {
            MoveKind::MoveUnit => self.apply_move_unit(catalog, &mv.args),
            MoveKind::AttackUnit => self.apply_attack(catalog, &mv.args),
            MoveKind::EndTurn => {
                require_no_args(&mv.args)?;
                self.apply_end_turn(catalog)
            }
            MoveKind::Surrender => {
                require_no_args(&mv.args)?;
                self.apply_surrender();
                Ok(())
            }
        }
    }

    fn apply_move_unit(
        &mut self,
        catalog: &ContentCatalog,
        args: &[i32],
    ) -> Result<(), InvalidMove> {
        let path = decode_path(args)?;
        let start = path[0];
        let unit = *self
            .unit_at(start)
            .ok_or(InvalidMove::NoUnitAtSource(start))?;
        if unit.player != self.current_player {
            return Err(InvalidMove::NotYourUnit(start));
        }

        // Walk the whole path before touching the board.
        let mut movement_points = unit.movement_points;
        let mut cur = start;
        for &next in &path[1..] {
            if !self.terrain.in_bounds(next) {
                return Err(InvalidMove::OutOfBounds(next));
            }
            if !cur.is_adjacent(next) {
                return Err(InvalidMove::StepNotAdjacent(cur, next));
            }
            // The start cell holds the moving unit itself, so a path may
            // revisit it.
            if next != start && self.unit_at(next).is_some() {
                return Err(InvalidMove::CellOccupied(next));
            }
            if movement_points <= 0 {
                return Err(InvalidMove::NoMovementPoints(cur));
            }
            // Each step is charged for both the tile left and the tile
            // entered, clamped at zero.
            let step_cost = self.tile_cost(catalog, cur)? + self.tile_cost(catalog, next)?;
            movement_points = (movement_points - step_cost).max(0);
            cur = next;
        }

        let mut moved = unit;
        moved.movement_points = movement_points;
        moved.position = cur;
        self.units.set(start, None);
        self.player_positions[unit.player as usize].remove(&start);
        self.units.set(cur, Some(moved));
        self.player_positions[unit.player as usize].insert(cur);
        Ok(())
    }

    fn apply_attack(
        &mut self,
        catalog: &ContentCatalog,
        args: &[i32],
    ) -> Result<(), InvalidMove> {
        let &[ax, ay, tx, ty] = args else {
            return Err(InvalidMove::MalformedArguments {
                expected: "four integers: attacker x, y, target x, y",
            });
        };
        let attacker_pos = IVec2::new(ax, ay);
        let target_pos = IVec2::new(tx, ty);

        let attacker = *self
            .unit_at(attacker_pos)
            .ok_or(InvalidMove::NoUnitAtSource(attacker_pos))?;
        if attacker.player != self.current_player {
            return Err(InvalidMove::NotYourUnit(attacker_pos));
        }
        if attacker.action_points < 1 {
            return Err(InvalidMove::NoActionPoints(attacker_pos));
        }
        let target = *self
            .unit_at(target_pos)
            .ok_or(InvalidMove::NoTargetUnit(target_pos))?;

        let attacker_stats = catalog
            .unit_type(attacker.unit_type)
            .ok_or(InvalidMove::UnknownContent(attacker.unit_type.0))?;
        let target_stats = catalog
            .unit_type(target.unit_type)
            .ok_or(InvalidMove::UnknownContent(target.unit_type.0))?;
        let damage = compute_damage(attacker_stats, target_stats);

        let mut attacker = attacker;
        attacker.action_points -= 1;
        self.units.set(attacker_pos, Some(attacker));

        // A unit attacking its own cell damages itself.
        let mut target = if target_pos == attacker_pos { attacker } else { target };
        target.health = (target.health - damage).max(0);
        if target.is_alive() {
            self.units.set(target_pos, Some(target));
        } else {
            self.units.set(target_pos, None);
            self.player_positions[target.player as usize].remove(&target_pos);
        }
        Ok(())
    }

    fn apply_end_turn(&mut self, catalog: &ContentCatalog) -> Result<(), InvalidMove> {
        // Stage the replenished units first so a stale catalog cannot
        // leave a half-finished turn.
        let seat = self.current_player as usize;
        let mut staged = Vec::with_capacity(self.player_positions[seat].len());
        for &pos in &self.player_positions[seat] {
            let Some(mut unit) = self.unit_at(pos).copied() else {
                continue;
            };
            let stats = catalog
                .unit_type(unit.unit_type)
                .ok_or(InvalidMove::UnknownContent(unit.unit_type.0))?;
            unit.replenish(stats);
            staged.push(unit);
        }
        for unit in staged {
            self.units.set(unit.position, Some(unit));
        }
        self.advance_turn();
        Ok(())
    }

    fn apply_surrender(&mut self) {
        let seat = self.current_player as usize;
        let positions: Vec<IVec2> = self.player_positions[seat].iter().copied().collect();
        for pos in positions {
            self.units.set(pos, None);
        }
        self.player_positions[seat].clear();
        self.advance_turn();
    }

    /// Advances to the next seat that still has units, checking each seat
    /// at most once so a fully eliminated game cannot loop forever.
    fn advance_turn(&mut self) {
        let player_count = self.player_count();
        for _ in 0..player_count {
            self.current_player = (self.current_player + 1) % player_count;
            if !self.has_lost(self.current_player) {
                break;
            }
        }
    }

    fn tile_cost(&self, catalog: &ContentCatalog, pos: IVec2) -> Result<i32, InvalidMove> {
        let id = *self
            .terrain
            .get(pos)
            .ok_or(InvalidMove::OutOfBounds(pos))?;
        catalog
            .terrain(id)
            .map(|t| t.movement_cost)
            .ok_or(InvalidMove::UnknownContent(id.0))
    }

    // -----------------------------------------------------------------------
    // Pathfinding
    // -----------------------------------------------------------------------

    /// All tiles the unit at `from` could end a legal `MoveUnit` on, as a
    /// map from tile to its predecessor on a cheapest path.
    ///
    /// Ties are broken by coordinate order, so the result is a pure
    /// function of the game state.
    pub fn find_reachable_tiles(
        &self,
        catalog: &ContentCatalog,
        from: IVec2,
    ) -> Result<BTreeMap<IVec2, IVec2>, InvalidMove> {
        let unit = self
            .unit_at(from)
            .ok_or(InvalidMove::NoUnitAtSource(from))?;
        let budget = unit.movement_points;

        let mut best: BTreeMap<IVec2, i32> = BTreeMap::from([(from, 0)]);
        let mut predecessor: BTreeMap<IVec2, IVec2> = BTreeMap::new();
        let mut frontier = BinaryHeap::new();
        frontier.push(Reverse((0, from)));

        while let Some(Reverse((dist, pos))) = frontier.pop() {
            if best.get(&pos).is_some_and(|&d| dist > d) {
                continue; // stale heap entry
            }
            // A unit may only start a step while it has points left.
            if dist >= budget {
                continue;
            }
            let pos_cost = self.tile_cost(catalog, pos)?;
            for next in pos.orthogonal_neighbors() {
                if !self.terrain.in_bounds(next) || self.unit_at(next).is_some() {
                    continue;
                }
                let next_dist = dist + pos_cost + self.tile_cost(catalog, next)?;
                if best.get(&next).is_none_or(|&d| next_dist < d) {
                    best.insert(next, next_dist);
                    predecessor.insert(next, pos);
                    frontier.push(Reverse((next_dist, next)));
                }
            }
        }
        Ok(predecessor)
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    /// Captures the whole game state in a deterministic, encodable form.
    pub fn snapshot(&self) -> GameSnapshot {
        let mut units = Vec::new();
        for positions in &self.player_positions {
            for &pos in positions {
                if let Some(unit) = self.unit_at(pos) {
                    units.push(*unit);
                }
            }
        }
        GameSnapshot {
            terrain: self.terrain.clone(),
            player_names: self.player_names.clone(),
            current_player: self.current_player,
            units,
        }
    }
}

fn require_no_args(args: &[i32]) -> Result<(), InvalidMove> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(InvalidMove::MalformedArguments {
            expected: "no arguments",
        })
    }
}

fn decode_path(args: &[i32]) -> Result<Vec<IVec2>, InvalidMove> {
    if args.is_empty() || args.len() % 2 != 0 {
        return Err(InvalidMove::MalformedArguments {
            expected: "a non-empty, even-length list of coordinates",
        });
    }
    Ok(args
        .chunks_exact(2)
        .map(|pair| IVec2::new(pair[0], pair[1]))
        .collect())
}

/// The complete state of a game at one instant.
///
/// Snapshots are what a full sync carries: a client can reconstruct
/// an identical [`Game`] from one with [`Game::from_snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSnapshot {
    pub terrain: Grid<TerrainId>,
    pub player_names: Vec<String>,
    pub current_player: u32,
    pub units: Vec<Unit>,
}

impl Encode for GameSnapshot {
    fn encode(&self, tx: &mut TxBuffer) {
        tx.write(&self.terrain);
        tx.write(&self.player_names);
        tx.put_u32(self.current_player);
        tx.write(&self.units);
    }
}

impl Decode for GameSnapshot {
    fn decode(rx: &mut RxBuffer) -> Result<Self, CodecError> {
        Ok(Self {
            terrain: rx.read()?,
            player_names: rx.read()?,
            current_player: rx.read_u32()?,
            units: rx.read()?,
        })
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// A catalog with round numbers, so expected values are easy to check
    /// by hand. Damage examples:
    /// - scout vs scout: 6*2*8 / ((2+0)*(8+2)) = 96/20 = 4
    /// - scout vs tank:  96 / ((2+2)*(8+0)) = 96/32 = 3
    /// - tank vs scout:  10*4*6 / ((4+0)*(6+2)) = 240/32 = 7
    fn catalog() -> ContentCatalog {
        ContentCatalog::from_json(
            r#"{
              "terrains": [
                { "id": "plain", "movement_cost": 10 },
                { "id": "rough", "movement_cost": 20 }
              ],
              "units": [
                {
                  "id": "scout", "max_health": 10, "armor": 0, "evasion": 2,
                  "movement_points": 40, "action_points": 1,
                  "attack_damage": 6, "attack_penetration": 2, "attack_accuracy": 8
                },
                {
                  "id": "tank", "max_health": 20, "armor": 2, "evasion": 0,
                  "movement_points": 20, "action_points": 1,
                  "attack_damage": 10, "attack_penetration": 4, "attack_accuracy": 6
                }
              ],
              "maps": [
                {
                  "id": "arena", "width": 5, "height": 5, "fill": "plain",
                  "starting_units": [
                    [ { "unit": "scout", "x": 0, "y": 0 } ],
                    [ { "unit": "scout", "x": 4, "y": 4 } ]
                  ]
                }
              ]
            }"#,
        )
        .expect("test catalog is valid")
    }

    fn arena_game(catalog: &ContentCatalog) -> Game {
        let (_, template) = catalog.map_by_stable_id("arena").expect("arena exists");
        Game::new(catalog, template, vec!["ada".to_string(), "bo".to_string()])
            .expect("game should build")
    }

    fn snapshot_bytes(game: &Game) -> Vec<u8> {
        let mut tx = TxBuffer::new();
        tx.write(&game.snapshot());
        tx.as_bytes().to_vec()
    }

    /// Rebuilds `game` with one unit's fields adjusted, exercising
    /// `from_snapshot` along the way.
    fn with_unit_patched(
        catalog: &ContentCatalog,
        game: &Game,
        at: IVec2,
        patch: impl FnOnce(&mut Unit),
    ) -> Game {
        let mut snapshot = game.snapshot();
        let unit = snapshot
            .units
            .iter_mut()
            .find(|u| u.position == at)
            .expect("unit at position");
        patch(unit);
        Game::from_snapshot(catalog, &snapshot).expect("patched snapshot is valid")
    }

    #[test]
    fn test_new_game_places_starting_units() {
        let catalog = catalog();
        let game = arena_game(&catalog);
        assert_eq!(game.player_count(), 2);
        assert_eq!(game.current_player(), 0);
        assert_eq!(game.unit_at(IVec2::new(0, 0)).map(|u| u.player), Some(0));
        assert_eq!(game.unit_at(IVec2::new(4, 4)).map(|u| u.player), Some(1));
        assert!(game.unit_at(IVec2::new(2, 2)).is_none());
        assert!(game.winner().is_none());
    }

    #[test]
    fn test_player_count_mismatch_is_rejected() {
        let catalog = catalog();
        let (_, template) = catalog.map_by_stable_id("arena").unwrap();
        let result = Game::new(&catalog, template, vec!["solo".to_string()]);
        assert_eq!(
            result.unwrap_err(),
            ContentError::PlayerCountMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_move_charges_both_tiles() {
        let catalog = catalog();
        let mut game = arena_game(&catalog);

        // One step on cost-10 terrain charges 10 + 10.
        game.make_move(
            &catalog,
            &Move::move_unit(&[IVec2::new(0, 0), IVec2::new(1, 0)]),
        )
        .expect("legal move");
        let unit = game.unit_at(IVec2::new(1, 0)).expect("unit moved");
        assert_eq!(unit.movement_points, 40 - 20);
        assert!(game.unit_at(IVec2::new(0, 0)).is_none());
        assert_eq!(unit.position, IVec2::new(1, 0));
    }

    #[test]
    fn test_movement_points_clamp_at_zero() {
        let catalog = catalog();
        let game = arena_game(&catalog);
        // 15 points: one 20-cost step is allowed and clamps to zero.
        let mut game = with_unit_patched(&catalog, &game, IVec2::new(0, 0), |u| {
            u.movement_points = 15;
        });

        game.make_move(
            &catalog,
            &Move::move_unit(&[IVec2::new(0, 0), IVec2::new(1, 0)]),
        )
        .expect("a unit with points left may start a step");
        assert_eq!(
            game.unit_at(IVec2::new(1, 0)).unwrap().movement_points,
            0
        );
    }

    #[test]
    fn test_step_without_movement_points_is_rejected() {
        let catalog = catalog();
        let game = arena_game(&catalog);
        let mut game = with_unit_patched(&catalog, &game, IVec2::new(0, 0), |u| {
            u.movement_points = 0;
        });

        let result = game.make_move(
            &catalog,
            &Move::move_unit(&[IVec2::new(0, 0), IVec2::new(1, 0)]),
        );
        assert_eq!(
            result.unwrap_err(),
            InvalidMove::NoMovementPoints(IVec2::new(0, 0))
        );
    }

    #[test]
    fn test_rejected_move_leaves_state_byte_identical() {
        let catalog = catalog();
        let mut game = arena_game(&catalog);
        let before = snapshot_bytes(&game);

        // A path that starts legally and fails on the third step.
        let result = game.make_move(
            &catalog,
            &Move::move_unit(&[
                IVec2::new(0, 0),
                IVec2::new(1, 0),
                IVec2::new(2, 0),
                IVec2::new(4, 0), // not adjacent
            ]),
        );
        assert_eq!(
            result.unwrap_err(),
            InvalidMove::StepNotAdjacent(IVec2::new(2, 0), IVec2::new(4, 0))
        );
        assert_eq!(snapshot_bytes(&game), before);
    }

    #[test]
    fn test_moving_opponents_unit_is_rejected() {
        let catalog = catalog();
        let mut game = arena_game(&catalog);
        let result = game.make_move(
            &catalog,
            &Move::move_unit(&[IVec2::new(4, 4), IVec2::new(3, 4)]),
        );
        assert_eq!(
            result.unwrap_err(),
            InvalidMove::NotYourUnit(IVec2::new(4, 4))
        );
    }

    #[test]
    fn test_path_through_occupied_cell_is_rejected() {
        let catalog = catalog();
        let game = arena_game(&catalog);
        // Drop an enemy unit right next to the scout.
        let mut snapshot = game.snapshot();
        snapshot.units.push(Unit {
            unit_type: snapshot.units[0].unit_type,
            player: 1,
            health: 10,
            movement_points: 40,
            action_points: 1,
            position: IVec2::new(1, 0),
        });
        let mut game = Game::from_snapshot(&catalog, &snapshot).expect("valid snapshot");

        let result = game.make_move(
            &catalog,
            &Move::move_unit(&[IVec2::new(0, 0), IVec2::new(1, 0), IVec2::new(2, 0)]),
        );
        assert_eq!(
            result.unwrap_err(),
            InvalidMove::CellOccupied(IVec2::new(1, 0))
        );
    }

    #[test]
    fn test_path_leaving_the_map_is_rejected() {
        let catalog = catalog();
        let mut game = arena_game(&catalog);
        let result = game.make_move(
            &catalog,
            &Move::move_unit(&[IVec2::new(0, 0), IVec2::new(0, -1)]),
        );
        assert_eq!(
            result.unwrap_err(),
            InvalidMove::OutOfBounds(IVec2::new(0, -1))
        );
    }

    #[test]
    fn test_odd_argument_count_is_malformed() {
        let catalog = catalog();
        let mut game = arena_game(&catalog);
        let mv = Move {
            kind: MoveKind::MoveUnit,
            args: vec![0, 0, 1],
        };
        assert!(matches!(
            game.make_move(&catalog, &mv),
            Err(InvalidMove::MalformedArguments { .. })
        ));
    }

    #[test]
    fn test_attack_applies_damage_formula() {
        let catalog = catalog();
        let game = arena_game(&catalog);
        // Bring the defender adjacent so the test reads naturally.
        let game = with_unit_patched(&catalog, &game, IVec2::new(4, 4), |u| {
            u.position = IVec2::new(1, 0);
        });
        let mut game = game;

        game.make_move(
            &catalog,
            &Move::attack_unit(IVec2::new(0, 0), IVec2::new(1, 0)),
        )
        .expect("legal attack");

        // scout vs scout deals 4.
        assert_eq!(game.unit_at(IVec2::new(1, 0)).unwrap().health, 10 - 4);
        assert_eq!(
            game.unit_at(IVec2::new(0, 0)).unwrap().action_points,
            0,
            "an attack spends one action point"
        );
    }

    #[test]
    fn test_damage_survives_large_stat_products() {
        // damage * penetration * accuracy here is ~4.3e15, far past i32;
        // with no armor or evasion the quotient is exactly attack_damage.
        let heavy = UnitType {
            stable_id: "siege".to_string(),
            max_health: 100,
            armor: 0,
            evasion: 0,
            movement_points: 10,
            action_points: 1,
            attack_damage: 2_000_000,
            attack_penetration: 46_341,
            attack_accuracy: 46_341,
        };
        assert_eq!(compute_damage(&heavy, &heavy), 2_000_000);
    }

    #[test]
    fn test_attack_without_action_points_is_rejected() {
        let catalog = catalog();
        let game = arena_game(&catalog);
        let mut game = with_unit_patched(&catalog, &game, IVec2::new(0, 0), |u| {
            u.action_points = 0;
        });
        let result = game.make_move(
            &catalog,
            &Move::attack_unit(IVec2::new(0, 0), IVec2::new(4, 4)),
        );
        assert_eq!(
            result.unwrap_err(),
            InvalidMove::NoActionPoints(IVec2::new(0, 0))
        );
    }

    #[test]
    fn test_lethal_attack_removes_unit_and_decides_the_game() {
        let catalog = catalog();
        let game = arena_game(&catalog);
        // scout vs scout deals 4; at 3 health the defender dies.
        let mut game = with_unit_patched(&catalog, &game, IVec2::new(4, 4), |u| {
            u.health = 3;
        });

        game.make_move(
            &catalog,
            &Move::attack_unit(IVec2::new(0, 0), IVec2::new(4, 4)),
        )
        .expect("legal attack");

        assert!(game.unit_at(IVec2::new(4, 4)).is_none());
        assert!(game.positions_of(1).is_empty());
        assert!(game.has_lost(1));
        assert!(game.has_won(0));
        assert_eq!(game.winner(), Some(0));
    }

    #[test]
    fn test_attack_on_empty_cell_is_rejected() {
        let catalog = catalog();
        let mut game = arena_game(&catalog);
        let result = game.make_move(
            &catalog,
            &Move::attack_unit(IVec2::new(0, 0), IVec2::new(2, 2)),
        );
        assert_eq!(
            result.unwrap_err(),
            InvalidMove::NoTargetUnit(IVec2::new(2, 2))
        );
    }

    #[test]
    fn test_end_turn_replenishes_and_advances() {
        let catalog = catalog();
        let mut game = arena_game(&catalog);
        game.make_move(
            &catalog,
            &Move::move_unit(&[IVec2::new(0, 0), IVec2::new(1, 0)]),
        )
        .expect("legal move");
        game.make_move(
            &catalog,
            &Move::attack_unit(IVec2::new(1, 0), IVec2::new(4, 4)),
        )
        .expect("legal attack");

        game.make_move(&catalog, &Move::end_turn()).expect("end turn");
        assert_eq!(game.current_player(), 1);
        let unit = game.unit_at(IVec2::new(1, 0)).unwrap();
        assert_eq!(unit.movement_points, 40);
        assert_eq!(unit.action_points, 1);
    }

    #[test]
    fn test_end_turn_with_arguments_is_malformed() {
        let catalog = catalog();
        let mut game = arena_game(&catalog);
        let mv = Move {
            kind: MoveKind::EndTurn,
            args: vec![1],
        };
        assert!(matches!(
            game.make_move(&catalog, &mv),
            Err(InvalidMove::MalformedArguments { .. })
        ));
    }

    #[test]
    fn test_turn_skips_eliminated_players() {
        let catalog = catalog();
        let game = arena_game(&catalog);
        // Add a third seat that owns no units at all.
        let mut snapshot = game.snapshot();
        snapshot.player_names.push("cy".to_string());
        let mut game = Game::from_snapshot(&catalog, &snapshot).expect("valid snapshot");
        game.make_move(&catalog, &Move::end_turn()).unwrap();
        assert_eq!(game.current_player(), 1);
        game.make_move(&catalog, &Move::end_turn()).unwrap();
        assert_eq!(
            game.current_player(),
            0,
            "seat 2 has no units and is skipped"
        );
    }

    #[test]
    fn test_surrender_clears_units_and_advances() {
        let catalog = catalog();
        let mut game = arena_game(&catalog);

        game.make_move(&catalog, &Move::surrender()).expect("surrender");
        assert!(game.positions_of(0).is_empty());
        assert!(game.unit_at(IVec2::new(0, 0)).is_none());
        assert_eq!(game.current_player(), 1);
        assert_eq!(game.winner(), Some(1));
    }

    #[test]
    fn test_reachable_tiles_with_one_step_budget() {
        let catalog = catalog();
        let game = arena_game(&catalog);
        // 10 points on cost-10 terrain: each step charges 20, but a unit
        // with points left may always start one step.
        let game = with_unit_patched(&catalog, &game, IVec2::new(0, 0), |u| {
            u.position = IVec2::new(2, 2);
            u.movement_points = 10;
        });

        let reachable = game
            .find_reachable_tiles(&catalog, IVec2::new(2, 2))
            .expect("unit exists");
        let tiles: BTreeSet<IVec2> = reachable.keys().copied().collect();
        assert_eq!(
            tiles,
            BTreeSet::from([
                IVec2::new(1, 2),
                IVec2::new(2, 1),
                IVec2::new(2, 3),
                IVec2::new(3, 2),
            ]),
            "exactly the four neighbors"
        );
        for (_, &pred) in &reachable {
            assert_eq!(pred, IVec2::new(2, 2));
        }
    }

    #[test]
    fn test_reachable_tiles_zero_budget_is_empty() {
        let catalog = catalog();
        let game = arena_game(&catalog);
        let game = with_unit_patched(&catalog, &game, IVec2::new(0, 0), |u| {
            u.movement_points = 0;
        });
        let reachable = game
            .find_reachable_tiles(&catalog, IVec2::new(0, 0))
            .expect("unit exists");
        assert!(reachable.is_empty());
    }

    #[test]
    fn test_reachable_tiles_exclude_occupied_cells() {
        let catalog = catalog();
        let game = arena_game(&catalog);
        let game = with_unit_patched(&catalog, &game, IVec2::new(4, 4), |u| {
            u.position = IVec2::new(1, 0);
        });

        let reachable = game
            .find_reachable_tiles(&catalog, IVec2::new(0, 0))
            .expect("unit exists");
        assert!(
            !reachable.contains_key(&IVec2::new(1, 0)),
            "occupied tiles are not destinations"
        );
        assert!(!reachable.contains_key(&IVec2::new(0, 0)), "nor is the start");
    }

    #[test]
    fn test_reachable_paths_stay_within_budget() {
        let catalog = catalog();
        let game = arena_game(&catalog);
        let game = with_unit_patched(&catalog, &game, IVec2::new(0, 0), |u| {
            u.position = IVec2::new(2, 2);
        });
        let start = IVec2::new(2, 2);
        let reachable = game.find_reachable_tiles(&catalog, start).expect("unit");

        // Walking predecessors back to the start must reproduce a path
        // make_move accepts.
        for &tile in reachable.keys() {
            let mut path = vec![tile];
            let mut cur = tile;
            while cur != start {
                cur = reachable[&cur];
                path.push(cur);
            }
            path.reverse();

            let mut probe = game.clone();
            probe
                .make_move(&catalog, &Move::move_unit(&path))
                .unwrap_or_else(|e| panic!("path to {tile} should be legal: {e}"));
        }
    }

    #[test]
    fn test_reachable_tiles_are_deterministic() {
        let catalog = catalog();
        let game = arena_game(&catalog);
        let a = game.find_reachable_tiles(&catalog, IVec2::new(0, 0)).unwrap();
        let b = game.find_reachable_tiles(&catalog, IVec2::new(0, 0)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_snapshot_round_trip_reconstructs_identical_state() {
        let catalog = catalog();
        let mut game = arena_game(&catalog);
        game.make_move(
            &catalog,
            &Move::move_unit(&[IVec2::new(0, 0), IVec2::new(1, 0)]),
        )
        .unwrap();
        game.make_move(&catalog, &Move::end_turn()).unwrap();

        let mut tx = TxBuffer::new();
        tx.write(&game.snapshot());
        let mut rx = RxBuffer::from_bytes(tx.as_bytes());
        let decoded: GameSnapshot = rx.read().expect("snapshot decodes");
        assert!(rx.is_empty());

        let rebuilt = Game::from_snapshot(&catalog, &decoded).expect("snapshot is valid");
        assert_eq!(rebuilt, game);
        assert_eq!(snapshot_bytes(&rebuilt), snapshot_bytes(&game));
    }

    #[test]
    fn test_snapshot_with_overlapping_units_is_rejected() {
        let catalog = catalog();
        let game = arena_game(&catalog);
        let mut snapshot = game.snapshot();
        let mut dupe = snapshot.units[0];
        dupe.player = 1;
        snapshot.units.push(dupe);
        assert_eq!(
            Game::from_snapshot(&catalog, &snapshot).unwrap_err(),
            ContentError::CellOccupied(dupe.position)
        );
    }

    #[test]
    fn test_snapshot_with_invalid_health_is_rejected() {
        let catalog = catalog();
        let game = arena_game(&catalog);
        let mut snapshot = game.snapshot();
        snapshot.units[0].health = 0;
        assert!(matches!(
            Game::from_snapshot(&catalog, &snapshot),
            Err(ContentError::InvalidUnitState { .. })
        ));
    }
}
