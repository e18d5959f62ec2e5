//! Action Vocabulary
//!
//! The nine discrete actions an agent can take in a tick.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tile::Position;

/// A discrete agent action.
///
/// `Gather`, `Attack` and `Hide` are reserved: no policy produces them and
/// they carry no energy cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    MoveN,
    MoveS,
    MoveE,
    MoveW,
    Gather,
    Attack,
    Hide,
    Observe,
    Wait,
}

impl Action {
    /// Returns true for the four movement actions.
    pub fn is_movement(self) -> bool {
        matches!(self, Action::MoveN | Action::MoveS | Action::MoveE | Action::MoveW)
    }

    /// Neighbouring cell a movement action heads for, without bounds checks.
    ///
    /// North is `y - 1`. Returns `None` for non-movement actions.
    pub fn target(self, from: Position) -> Option<Position> {
        match self {
            Action::MoveN => Some(Position::new(from.x, from.y - 1)),
            Action::MoveS => Some(Position::new(from.x, from.y + 1)),
            Action::MoveE => Some(Position::new(from.x + 1, from.y)),
            Action::MoveW => Some(Position::new(from.x - 1, from.y)),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::MoveN => "MOVE_N",
            Action::MoveS => "MOVE_S",
            Action::MoveE => "MOVE_E",
            Action::MoveW => "MOVE_W",
            Action::Gather => "GATHER",
            Action::Attack => "ATTACK",
            Action::Hide => "HIDE",
            Action::Observe => "OBSERVE",
            Action::Wait => "WAIT",
        };
        f.write_str(name)
    }
}
