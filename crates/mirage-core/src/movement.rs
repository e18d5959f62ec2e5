//! Movement Resolution

use mirage_types::{Action, Position};

/// Position after applying `action` from `position` on a `width` x `height` grid.
///
/// Non-movement actions and moves that would leave `[0,width) x [0,height)`
/// return the original position.
pub fn resolve_movement(position: Position, action: Action, width: i32, height: i32) -> Position {
    match action.target(position) {
        Some(target)
            if target.x >= 0 && target.y >= 0 && target.x < width && target.y < height =>
        {
            target
        }
        _ => position,
    }
}
