//! Passengers: units of demand travelling between two stations

use super::types::{PassengerId, StationId};

/// A passenger waiting at a station or riding a train
#[derive(Debug, Clone, PartialEq)]
pub struct SimPassenger {
    pub id: PassengerId,
    pub origin: StationId,
    pub destination: StationId,
    /// Simulation time (ms) at which the passenger appeared
    pub spawn_time: f64,
}

impl SimPassenger {
    pub fn new(id: PassengerId, origin: StationId, destination: StationId, spawn_time: f64) -> Self {
        Self {
            id,
            origin,
            destination,
            spawn_time,
        }
    }

    /// Whether either end of this trip is the given station
    pub fn references(&self, station: StationId) -> bool {
        self.origin == station || self.destination == station
    }

    pub fn wait_time(&self, now: f64) -> f64 {
        now - self.spawn_time
    }
}
