//! World State
//!
//! The only mutable ground truth: where every entity stands, and the marker
//! that drifts one cell east per tick. Only the tick orchestrator mutates it.

use std::collections::BTreeMap;

use mirage_types::{glyph, AgentId, ObservationSource, Position, Tick, TileView};

use crate::config::WorldConfig;

/// Authoritative entity-position registry plus the drifting marker.
#[derive(Debug, Clone, PartialEq)]
pub struct World {
    entities: BTreeMap<AgentId, Position>,
    marker: Position,
    width: i32,
    height: i32,
}

impl World {
    pub fn new(width: i32, height: i32, marker: Position) -> Self {
        Self {
            entities: BTreeMap::new(),
            marker,
            width,
            height,
        }
    }

    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(config.width, config.height, config.marker_start)
    }

    pub fn position_of(&self, id: &AgentId) -> Option<Position> {
        self.entities.get(id).copied()
    }

    pub fn set_position(&mut self, id: AgentId, position: Position) {
        self.entities.insert(id, position);
    }

    /// Advance the marker one cell east, wrapping at the east edge.
    pub fn move_marker(&mut self) {
        self.marker.x = (self.marker.x + 1).rem_euclid(self.width);
    }

    pub fn marker_position(&self) -> Position {
        self.marker
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, position: Position) -> bool {
        position.x >= 0 && position.y >= 0 && position.x < self.width && position.y < self.height
    }

    /// All placed entities in id order
    pub fn entities(&self) -> impl Iterator<Item = (&AgentId, Position)> {
        self.entities.iter().map(|(id, pos)| (id, *pos))
    }

    /// Ground-truth glyph of a cell
    pub fn glyph_at(&self, position: Position) -> char {
        if position == self.marker {
            glyph::MARKER
        } else {
            glyph::FLOOR
        }
    }

    /// Every in-bounds cell within `radius` (Chebyshev) of `center`, as truthful views.
    pub fn visible_from(&self, center: Position, radius: i32) -> Vec<TileView> {
        let mut tiles = Vec::new();
        for x in (center.x - radius)..=(center.x + radius) {
            for y in (center.y - radius)..=(center.y + radius) {
                let position = Position::new(x, y);
                if self.in_bounds(position) {
                    tiles.push(TileView::seen(position, self.glyph_at(position)));
                }
            }
        }
        tiles
    }

    /// Snapshot of what one agent can see this tick.
    ///
    /// An unplaced agent gets an empty source with no position.
    pub fn observation_source(&self, id: &AgentId, tick: Tick, radius: i32) -> ObservationSource {
        match self.position_of(id) {
            Some(position) => ObservationSource::new(tick)
                .at(position)
                .with_visible(self.visible_from(position, radius)),
            None => ObservationSource::new(tick),
        }
    }
}
