//! Train state for the transit simulation
//!
//! A train's position is a station index on its line plus the fraction of
//! the way travelled towards the neighbouring station in its direction.

use super::passenger::SimPassenger;
use super::types::{Direction, LineId, StationId, TrainId};

/// Result of advancing a train's progress for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrainUpdateResult {
    /// Still between stations with the given progress
    InTransit(f32),
    /// Progress reached the next station; arrival must be resolved
    Arriving,
}

/// A train in the transit simulation
#[derive(Debug, Clone)]
pub struct SimTrain {
    pub id: TrainId,
    pub line: LineId,
    pub current_station_index: usize,
    /// Fraction of the way to `current_station_index + direction`, in [0, 1)
    pub progress: f32,
    pub direction: Direction,
    /// Boarded passengers
    pub passengers: Vec<SimPassenger>,
}

impl SimTrain {
    pub fn new(id: TrainId, line: LineId) -> Self {
        Self {
            id,
            line,
            current_station_index: 0,
            progress: 0.0,
            direction: Direction::Forward,
            passengers: Vec::new(),
        }
    }

    /// Index of the station the train is heading towards
    pub fn next_station_index(&self) -> isize {
        self.current_station_index as isize + self.direction.step()
    }

    /// Progress after moving `step` further, without committing it
    pub fn advance(&self, step: f32) -> TrainUpdateResult {
        let progress = self.progress + step;
        if progress >= 1.0 {
            TrainUpdateResult::Arriving
        } else {
            TrainUpdateResult::InTransit(progress)
        }
    }

    /// Take off every passenger bound for `station`
    pub fn alight_at(&mut self, station: StationId) -> Vec<SimPassenger> {
        let (alighting, staying): (Vec<_>, Vec<_>) = self
            .passengers
            .drain(..)
            .partition(|p| p.destination == station);
        self.passengers = staying;
        alighting
    }

    /// Drop every boarded passenger whose trip touches `station`.
    /// Returns how many were removed.
    pub fn purge_referencing(&mut self, station: StationId) -> usize {
        let before = self.passengers.len();
        self.passengers.retain(|p| !p.references(station));
        before - self.passengers.len()
    }

    /// Re-seat the train after its line lost stations.
    ///
    /// `kept[i]` says whether old index `i` survived; `new_len` is the
    /// contracted length (at least 2). A train whose station vanished moves
    /// on to the next surviving one. A train left on a terminus and facing
    /// off the end is turned around.
    pub fn remap_after_contraction(&mut self, kept: &[bool], new_len: usize) {
        if new_len == 0 {
            return;
        }
        let shifted = kept
            .iter()
            .take(self.current_station_index)
            .filter(|k| **k)
            .count();
        self.current_station_index = shifted.min(new_len - 1);

        let last = new_len - 1;
        match self.direction {
            Direction::Forward if self.current_station_index >= last => {
                self.direction = Direction::Backward;
            }
            Direction::Backward if self.current_station_index == 0 => {
                self.direction = Direction::Forward;
            }
            _ => {}
        }
    }
}
