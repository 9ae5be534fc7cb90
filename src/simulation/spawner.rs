//! Passenger demand generation
//!
//! Stations near the geographic centre of the network and stations served by
//! more lines attract more passengers. Spawn decisions are made against a
//! read-only view of the world and applied by the caller.

use log::trace;
use ordered_float::OrderedFloat;
use rand::Rng;
use std::collections::BTreeMap;

use super::line::SimLine;
use super::modifier::EventModifier;
use super::station::{station_capacity, SimStation};
use super::types::{LineId, Position, StationId};

/// A passenger the spawner decided to create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnRequest {
    pub origin: StationId,
    pub destination: StationId,
}

#[derive(Debug, Clone, Copy)]
pub struct PassengerSpawner {
    /// Base probability per station per tick
    pub base_rate: f32,
    pub base_capacity: usize,
}

impl PassengerSpawner {
    pub fn new(base_rate: f32, base_capacity: usize) -> Self {
        Self {
            base_rate,
            base_capacity,
        }
    }

    /// Spawn probability for one station this tick
    pub fn spawn_probability(
        &self,
        distance: f32,
        max_distance: f32,
        lines_through: usize,
        event_multiplier: f32,
    ) -> f32 {
        // 1.5 at the centroid down to 0.5 at the farthest station
        let centralization = 1.5 - distance / max_distance;
        let connectivity = 1.0 + 0.5 * lines_through as f32;
        self.base_rate * centralization * connectivity * event_multiplier
    }

    /// Decide which stations produce a passenger this tick
    pub fn plan<R: Rng + ?Sized>(
        &self,
        stations: &BTreeMap<StationId, SimStation>,
        lines: &BTreeMap<LineId, SimLine>,
        modifier: &EventModifier,
        rng: &mut R,
    ) -> Vec<SpawnRequest> {
        if stations.len() < 2 {
            return Vec::new();
        }

        let Some(center) = Position::centroid(stations.values().map(|s| &s.position)) else {
            return Vec::new();
        };

        let max_distance = stations
            .values()
            .map(|s| OrderedFloat(s.position.distance(&center)))
            .max()
            .map(|d| d.0)
            .unwrap_or(0.0)
            .max(1.0);

        let station_ids: Vec<StationId> = stations.keys().copied().collect();
        let mut requests = Vec::new();

        for (index, station) in stations.values().enumerate() {
            let lines_through = lines.values().filter(|l| l.contains(station.id)).count();
            if station.waiting() >= station_capacity(lines_through, self.base_capacity) {
                continue;
            }

            let distance = station.position.distance(&center);
            let probability = self.spawn_probability(
                distance,
                max_distance,
                lines_through,
                modifier.surge_multiplier(station.id),
            );

            if rng.random::<f32>() < probability {
                // Uniform over the other stations: draw from n-1 slots and skip the origin
                let mut pick = rng.random_range(0..station_ids.len() - 1);
                if pick >= index {
                    pick += 1;
                }
                let destination = station_ids[pick];
                trace!("Spawn at {:?} bound for {:?}", station.id, destination);
                requests.push(SpawnRequest {
                    origin: station.id,
                    destination,
                });
            }
        }

        requests
    }
}
