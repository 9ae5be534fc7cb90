//! Standalone transit simulation module
//!
//! This module contains all the core simulation logic: the world that owns
//! the network, passenger spawning, train scheduling and transient events.
//! It has no knowledge of rendering or of how ticks are driven.

mod config;
mod line;
mod modifier;
mod passenger;
mod scheduler;
mod snapshot;
mod spawner;
mod station;
mod stats;
mod train;
mod types;
mod world;

pub use config::SimConfig;
pub use line::SimLine;
pub use modifier::{ActiveModifier, EffectKind, EventEffect, EventModifier, GameEvent};
pub use passenger::SimPassenger;
pub use scheduler::{TrainArrival, TrainScheduler};
pub use snapshot::{LineSummary, NetworkSnapshot, StationSummary};
pub use spawner::{PassengerSpawner, SpawnRequest};
pub use station::{station_capacity, SimStation};
pub use stats::ServiceStats;
pub use train::{SimTrain, TrainUpdateResult};
pub use types::{
    line_color, Direction, LineId, PassengerId, Position, SimId, StationId, TrainId,
    ADVISORY_TIMEOUT_MS, BASE_STATION_CAPACITY, EVENT_CHECK_INTERVAL_MS, LINE_COLORS,
    PASSENGER_SPAWN_RATE, TILE_SIZE, TRAIN_CAPACITY, TRAIN_SPEED,
};
pub use world::{LineReport, SimWorld};
