//! Lines: ordered, non-looping station sequences that trains shuttle along

use super::types::{LineId, StationId};

/// A line in the simulation
#[derive(Debug, Clone)]
pub struct SimLine {
    pub id: LineId,
    pub name: String,
    pub color: String,
    /// Route from one terminus to the other
    pub stations: Vec<StationId>,
}

impl SimLine {
    pub fn new(id: LineId, name: String, color: String) -> Self {
        Self {
            id,
            name,
            color,
            stations: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// A train needs at least one segment to run on
    pub fn is_operable(&self) -> bool {
        self.stations.len() >= 2
    }

    pub fn contains(&self, station: StationId) -> bool {
        self.stations.contains(&station)
    }

    /// First position of `station` in the route
    pub fn index_of(&self, station: StationId) -> Option<usize> {
        self.stations.iter().position(|s| *s == station)
    }

    pub fn station_at(&self, index: isize) -> Option<StationId> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.stations.get(i))
            .copied()
    }

    pub fn tail(&self) -> Option<StationId> {
        self.stations.last().copied()
    }

    pub fn last_index(&self) -> usize {
        self.stations.len().saturating_sub(1)
    }

    /// Remove every occurrence of `station`, collapsing any repeat this
    /// leaves next to itself so no segment has zero length.
    /// Returns the kept-flag for each old index so callers can remap positions.
    pub fn remove_station(&mut self, station: StationId) -> Vec<bool> {
        let mut kept = Vec::with_capacity(self.stations.len());
        let mut remaining: Vec<StationId> = Vec::with_capacity(self.stations.len());
        for s in &self.stations {
            let keep = *s != station && remaining.last() != Some(s);
            kept.push(keep);
            if keep {
                remaining.push(*s);
            }
        }
        self.stations = remaining;
        kept
    }
}
