//! Core types for the transit simulation
//!
//! Identifiers, geometry and tuning constants shared by every module.

use serde::{Deserialize, Serialize};

/// A unique identifier for simulation entities
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimId(pub usize);

/// A wrapper type for station IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(pub SimId);

/// A wrapper type for line IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(pub SimId);

/// A wrapper type for train IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainId(pub SimId);

/// A wrapper type for passenger IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassengerId(pub SimId);

/// Which way a train is travelling along its line's station sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Towards higher station indices (+1)
    Forward,
    /// Towards lower station indices (-1)
    Backward,
}

impl Direction {
    /// Signed index step for this direction
    pub fn step(self) -> isize {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

/// A 2D position on the map
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn lerp(&self, other: &Position, t: f32) -> Position {
        Position {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    /// Snap to the nearest grid point of the given tile size
    pub fn snapped(&self, tile: f32) -> Position {
        if tile <= 0.0 {
            return *self;
        }
        Position {
            x: (self.x / tile).round() * tile,
            y: (self.y / tile).round() * tile,
        }
    }

    /// Arithmetic mean of a set of positions, `None` when empty
    pub fn centroid<'a, I>(positions: I) -> Option<Position>
    where
        I: IntoIterator<Item = &'a Position>,
    {
        let mut count = 0usize;
        let mut sum_x = 0.0f32;
        let mut sum_y = 0.0f32;
        for position in positions {
            sum_x += position.x;
            sum_y += position.y;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        Some(Position::new(sum_x / count as f32, sum_y / count as f32))
    }
}

/// Grid size that map clicks snap to
pub const TILE_SIZE: f32 = 50.0;

/// Progress gained per tick by a train at normal speed
pub const TRAIN_SPEED: f32 = 0.002;

/// Base chance per station per tick that a passenger appears
pub const PASSENGER_SPAWN_RATE: f32 = 0.005;

/// Waiting passengers a station holds before it stops spawning (doubled for interchanges)
pub const BASE_STATION_CAPACITY: usize = 30;

/// Passengers a single train can carry
pub const TRAIN_CAPACITY: usize = 30;

/// Wall-clock interval between event suggestion polls, in milliseconds
pub const EVENT_CHECK_INTERVAL_MS: u64 = 30_000;

/// Time allowed for one advisory request before it counts as no suggestion
pub const ADVISORY_TIMEOUT_MS: u64 = 10_000;

/// Colors handed out to new lines in order
pub const LINE_COLORS: [&str; 8] = [
    "#FF6347", // Tomato
    "#4682B4", // SteelBlue
    "#32CD32", // LimeGreen
    "#FFD700", // Gold
    "#6A5ACD", // SlateBlue
    "#FF69B4", // HotPink
    "#00CED1", // DarkTurquoise
    "#FFA500", // Orange
];

/// Palette color for the n-th line, wrapping around
pub fn line_color(index: usize) -> &'static str {
    LINE_COLORS[index % LINE_COLORS.len()]
}
