//! Intent Policies
//!
//! Each agent kind differs only in how it picks the action it *wants*; the
//! rest of the decision cycle is shared.

use serde::{Deserialize, Serialize};

use mirage_types::{Action, Tick};

/// What a policy asked for before caution and fatigue get a say.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub action: Action,
    /// Set when a local player asked to end the session
    pub quit: bool,
}

impl Intent {
    pub fn act(action: Action) -> Self {
        Self { action, quit: false }
    }

    pub fn wait() -> Self {
        Self::act(Action::Wait)
    }
}

/// Translate one key of the human alphabet.
///
/// Only the first character counts. `w/a/s/d` move, `e` observes, `q` waits
/// and requests quit; anything else (including no input) waits.
pub fn parse_key(key: &str) -> Intent {
    match key.chars().next() {
        Some('w') => Intent::act(Action::MoveN),
        Some('a') => Intent::act(Action::MoveW),
        Some('s') => Intent::act(Action::MoveS),
        Some('d') => Intent::act(Action::MoveE),
        Some('e') => Intent::act(Action::Observe),
        Some('q') => Intent {
            action: Action::Wait,
            quit: true,
        },
        _ => Intent::wait(),
    }
}

/// Intent selection for each agent kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Always heads east
    Scripted,
    /// North on even ticks, south on odd ones
    Oscillating,
    /// Local player: keys come from an input source
    Human,
    /// Remote player: keys arrive over a channel
    RemoteHuman,
}

impl Policy {
    /// Whether this policy reads a key each tick.
    pub fn takes_input(self) -> bool {
        matches!(self, Policy::Human | Policy::RemoteHuman)
    }

    pub fn intend(self, tick: Tick, input: Option<&str>) -> Intent {
        match self {
            Policy::Scripted => Intent::act(Action::MoveE),
            Policy::Oscillating => {
                if tick % 2 == 0 {
                    Intent::act(Action::MoveN)
                } else {
                    Intent::act(Action::MoveS)
                }
            }
            Policy::Human => parse_key(input.unwrap_or_default()),
            // A remote player cannot end the host's session
            Policy::RemoteHuman => Intent::act(parse_key(input.unwrap_or_default()).action),
        }
    }
}
