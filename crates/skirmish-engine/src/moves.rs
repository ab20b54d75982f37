//! Moves: the only way game state changes after setup.

use skirmish_codec::{CodecError, Decode, Encode, RxBuffer, TxBuffer};

use crate::grid::IVec2;

/// What a move does. The discriminant is the wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MoveKind {
    MoveUnit = 0,
    AttackUnit = 1,
    EndTurn = 2,
    Surrender = 3,
}

impl MoveKind {
    fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::MoveUnit),
            1 => Some(Self::AttackUnit),
            2 => Some(Self::EndTurn),
            3 => Some(Self::Surrender),
            _ => None,
        }
    }
}

impl Encode for MoveKind {
    fn encode(&self, tx: &mut TxBuffer) {
        tx.put_u32(*self as u32);
    }
}

impl Decode for MoveKind {
    fn decode(rx: &mut RxBuffer) -> Result<Self, CodecError> {
        let raw = rx.read_u32()?;
        Self::from_u32(raw)
            .ok_or_else(|| CodecError::invalid(format!("unknown move kind {raw}")))
    }
}

/// One player action: a kind plus the integer arguments it needs.
///
/// The argument layout depends on the kind; the game validates it when the
/// move is applied. Keeping arguments as a flat integer list keeps the
/// wire format independent of the move vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub kind: MoveKind,
    pub args: Vec<i32>,
}

impl Move {
    /// Moves a unit along `path`, which starts at the unit's position.
    pub fn move_unit(path: &[IVec2]) -> Self {
        let mut args = Vec::with_capacity(path.len() * 2);
        for pos in path {
            args.push(pos.x);
            args.push(pos.y);
        }
        Self {
            kind: MoveKind::MoveUnit,
            args,
        }
    }

    /// Attacks the unit at `target` with the unit at `attacker`.
    pub fn attack_unit(attacker: IVec2, target: IVec2) -> Self {
        Self {
            kind: MoveKind::AttackUnit,
            args: vec![attacker.x, attacker.y, target.x, target.y],
        }
    }

    pub fn end_turn() -> Self {
        Self {
            kind: MoveKind::EndTurn,
            args: Vec::new(),
        }
    }

    pub fn surrender() -> Self {
        Self {
            kind: MoveKind::Surrender,
            args: Vec::new(),
        }
    }
}

impl Encode for Move {
    fn encode(&self, tx: &mut TxBuffer) {
        tx.write(&self.kind);
        tx.write(&self.args);
    }
}

impl Decode for Move {
    fn decode(rx: &mut RxBuffer) -> Result<Self, CodecError> {
        Ok(Self {
            kind: rx.read()?,
            args: rx.read()?,
        })
    }
}
