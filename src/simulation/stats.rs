//! Service statistics for the transit network
//!
//! Tracks how many passengers were delivered, how long they waited, and the
//! counters needed to audit passenger conservation.

use std::collections::BTreeMap;

use super::types::LineId;

#[derive(Debug, Clone, Default)]
pub struct ServiceStats {
    /// Passengers that alighted at their destination
    pub passengers_served: usize,

    /// Sum over served passengers of (alight time - spawn time), in ms
    pub total_wait_time: f64,

    /// Served passengers broken down by the line that delivered them
    pub served_by_line: BTreeMap<LineId, usize>,

    /// Passengers ever created by the spawner
    pub passengers_spawned: usize,

    /// Passengers destroyed because a station they referenced was deleted
    pub passengers_purged: usize,
}

impl ServiceStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a delivery on `line` after `wait` ms
    pub fn record_served(&mut self, line: LineId, wait: f64) {
        self.passengers_served += 1;
        self.total_wait_time += wait;
        *self.served_by_line.entry(line).or_insert(0) += 1;
    }

    pub fn record_spawned(&mut self, count: usize) {
        self.passengers_spawned += count;
    }

    pub fn record_purged(&mut self, count: usize) {
        self.passengers_purged += count;
    }

    pub fn served_on(&self, line: LineId) -> usize {
        self.served_by_line.get(&line).copied().unwrap_or(0)
    }

    /// Mean wait per served passenger; zero before anyone is served
    pub fn average_wait_time(&self) -> f64 {
        if self.passengers_served == 0 {
            0.0
        } else {
            self.total_wait_time / self.passengers_served as f64
        }
    }

    /// Get a summary string for display
    pub fn summary(&self) -> String {
        format!(
            "Served: {} | Avg wait: {:.1}ms | Spawned: {} | Purged: {}",
            self.passengers_served,
            self.average_wait_time(),
            self.passengers_spawned,
            self.passengers_purged
        )
    }
}
