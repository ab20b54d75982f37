//! Units: the mutable pieces on the board.

use skirmish_codec::{CodecError, Decode, Encode, RxBuffer, TxBuffer};

use crate::content::{UnitType, UnitTypeId};
use crate::grid::IVec2;

/// One unit on the board.
///
/// A unit stores only its mutable state plus the numeric id of its type;
/// the shared stats live in the content catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unit {
    pub unit_type: UnitTypeId,
    /// Seat of the owning player.
    pub player: u32,
    pub health: i32,
    pub movement_points: i32,
    pub action_points: i32,
    pub position: IVec2,
}

impl Unit {
    /// A fresh unit at full health with a full allotment of points.
    pub fn new(unit_type: UnitTypeId, stats: &UnitType, player: u32, position: IVec2) -> Self {
        Self {
            unit_type,
            player,
            health: stats.max_health,
            movement_points: stats.movement_points,
            action_points: stats.action_points,
            position,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Restores the per-turn point pools at the start of the owner's turn.
    pub fn replenish(&mut self, stats: &UnitType) {
        self.movement_points = stats.movement_points;
        self.action_points = stats.action_points;
    }
}

impl Encode for Unit {
    fn encode(&self, tx: &mut TxBuffer) {
        tx.write(&self.unit_type);
        tx.put_u32(self.player);
        tx.put_i32(self.health);
        tx.put_i32(self.movement_points);
        tx.put_i32(self.action_points);
        tx.write(&self.position);
    }
}

impl Decode for Unit {
    fn decode(rx: &mut RxBuffer) -> Result<Self, CodecError> {
        Ok(Self {
            unit_type: rx.read()?,
            player: rx.read_u32()?,
            health: rx.read_i32()?,
            movement_points: rx.read_i32()?,
            action_points: rx.read_i32()?,
            position: rx.read()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fighter_stats() -> UnitType {
        UnitType {
            stable_id: "fighter".to_string(),
            max_health: 10,
            armor: 0,
            evasion: 2,
            movement_points: 40,
            action_points: 1,
            attack_damage: 6,
            attack_penetration: 2,
            attack_accuracy: 8,
        }
    }

    #[test]
    fn test_new_unit_starts_full() {
        let stats = fighter_stats();
        let unit = Unit::new(UnitTypeId(0), &stats, 1, IVec2::new(2, 3));
        assert_eq!(unit.health, 10);
        assert_eq!(unit.movement_points, 40);
        assert_eq!(unit.action_points, 1);
        assert!(unit.is_alive());
    }

    #[test]
    fn test_replenish_restores_points_not_health() {
        let stats = fighter_stats();
        let mut unit = Unit::new(UnitTypeId(0), &stats, 0, IVec2::new(0, 0));
        unit.health = 4;
        unit.movement_points = 0;
        unit.action_points = 0;

        unit.replenish(&stats);
        assert_eq!(unit.movement_points, 40);
        assert_eq!(unit.action_points, 1);
        assert_eq!(unit.health, 4, "replenish must not heal");
    }

    #[test]
    fn test_unit_codec_round_trip() {
        let stats = fighter_stats();
        let unit = Unit::new(UnitTypeId(3), &stats, 1, IVec2::new(-1, 7));

        let mut tx = TxBuffer::new();
        tx.write(&unit);
        let mut rx = RxBuffer::from_bytes(tx.as_bytes());
        assert_eq!(rx.read::<Unit>().unwrap(), unit);
        assert!(rx.is_empty());
    }
}
