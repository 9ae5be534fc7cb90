//! Stations: fixed points where passengers queue and trains stop

use super::passenger::SimPassenger;
use super::types::{Position, StationId};

/// A station in the simulation
#[derive(Debug, Clone)]
pub struct SimStation {
    pub id: StationId,
    pub name: String,
    pub position: Position,
    /// Passengers waiting here, in arrival order
    pub passengers: Vec<SimPassenger>,
}

impl SimStation {
    pub fn new(id: StationId, name: String, position: Position) -> Self {
        Self {
            id,
            name,
            position,
            passengers: Vec::new(),
        }
    }

    pub fn waiting(&self) -> usize {
        self.passengers.len()
    }

    /// Drop every waiting passenger whose trip touches `station`.
    /// Returns how many were removed.
    pub fn purge_referencing(&mut self, station: StationId) -> usize {
        let before = self.passengers.len();
        self.passengers.retain(|p| !p.references(station));
        before - self.passengers.len()
    }
}

/// Queue limit for a station served by `lines_through` lines
pub fn station_capacity(lines_through: usize, base_capacity: usize) -> usize {
    if lines_through >= 2 {
        base_capacity * 2
    } else {
        base_capacity
    }
}
