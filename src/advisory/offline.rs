//! Content generator that needs no network access
//!
//! Builds event proposals as JSON, the same shape a remote generator replies
//! with, and decodes them through `GameEvent::from_json`. Now and then it
//! names a target that does not exist so the repair path gets exercised.

use anyhow::Result;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde_json::json;
use std::sync::Mutex;

use super::ContentGenerator;
use crate::simulation::{EffectKind, GameEvent, NetworkSnapshot, StationId};

const SURGE_TITLES: [(&str, &str); 3] = [
    ("Stadium Crowd", "A match just ended and fans are heading home."),
    ("Street Festival", "Food stalls are drawing people from across town."),
    ("Concert Night", "Doors open soon and everyone wants to be early."),
];

const SPEED_TITLES: [(&str, &str); 3] = [
    ("Signal Fault", "Trains are running at caution through a faulty block."),
    ("New Timetable", "Tighter dwell times are speeding things up."),
    ("Leaves on the Line", "Low adhesion is slowing every train down."),
];

const CLOSURE_TITLES: [(&str, &str); 2] = [
    ("Flooded Concourse", "A burst pipe has closed the ticket hall."),
    ("Security Alert", "Staff are clearing the platforms as a precaution."),
];

const STATION_NAMES: [&str; 16] = [
    "Harbour Gate",
    "Market Street",
    "Old Mill",
    "Riverside",
    "Cathedral",
    "Ironworks",
    "Parkside",
    "Union Square",
    "Foundry Lane",
    "Glasshouse",
    "Lantern Row",
    "Canal Basin",
    "Observatory",
    "Tannery",
    "Weavers Cross",
    "North Quay",
];

pub struct OfflineContentGenerator {
    rng: Mutex<StdRng>,
    /// Chance that a proposal targets an id nobody has
    stale_target_chance: f64,
}

impl OfflineContentGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            stale_target_chance: 0.1,
        }
    }

    pub fn with_stale_target_chance(mut self, chance: f64) -> Self {
        self.stale_target_chance = chance.clamp(0.0, 1.0);
        self
    }

    fn propose(&self, snapshot: &NetworkSnapshot) -> Result<Option<String>> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| anyhow::anyhow!("Offline generator RNG poisoned"))?;

        let (Some(station), Some(line)) = (
            snapshot.stations.choose(&mut *rng),
            snapshot.lines.choose(&mut *rng),
        ) else {
            return Ok(None);
        };

        let stale = rng.random_bool(self.stale_target_chance);
        let station_id = if stale {
            json!(usize::MAX)
        } else {
            json!(station.id)
        };
        let line_id = if stale { json!(usize::MAX) } else { json!(line.id) };
        let duration = rng.random_range(300..=1000);

        let payload = match rng.random_range(0..3) {
            0 => {
                let (title, description) = SURGE_TITLES
                    .choose(&mut *rng)
                    .copied()
                    .unwrap_or(SURGE_TITLES[0]);
                json!({
                    "title": title,
                    "description": description,
                    "durationTicks": duration,
                    "effect": {
                        "kind": EffectKind::PassengerSurge,
                        "targetStationId": station_id,
                        "multiplier": rng.random_range(2.0..=5.0f32),
                    }
                })
            }
            1 => {
                let (title, description) = SPEED_TITLES
                    .choose(&mut *rng)
                    .copied()
                    .unwrap_or(SPEED_TITLES[0]);
                json!({
                    "title": title,
                    "description": description,
                    "durationTicks": duration,
                    "effect": {
                        "kind": EffectKind::SpeedChange,
                        "targetLineId": line_id,
                        "multiplier": rng.random_range(0.5..=1.5f32),
                    }
                })
            }
            _ => {
                let (title, description) = CLOSURE_TITLES
                    .choose(&mut *rng)
                    .copied()
                    .unwrap_or(CLOSURE_TITLES[0]);
                json!({
                    "title": title,
                    "description": description,
                    "durationTicks": duration,
                    "effect": {
                        "kind": EffectKind::StationClosure,
                        "targetStationId": station_id,
                    }
                })
            }
        };

        Ok(Some(payload.to_string()))
    }
}

#[async_trait]
impl ContentGenerator for OfflineContentGenerator {
    async fn request_event(&self, snapshot: &NetworkSnapshot) -> Result<Option<GameEvent>> {
        match self.propose(snapshot)? {
            Some(payload) => GameEvent::from_json(&payload).map(Some),
            None => Ok(None),
        }
    }

    async fn request_station_name(
        &self,
        station: StationId,
        snapshot: &NetworkSnapshot,
    ) -> Result<Option<String>> {
        if snapshot.station(station).is_none() {
            return Ok(None);
        }
        let taken: Vec<&str> = snapshot.stations.iter().map(|s| s.name.as_str()).collect();
        let free: Vec<&str> = STATION_NAMES
            .iter()
            .copied()
            .filter(|n| !taken.contains(n))
            .collect();

        let mut rng = self
            .rng
            .lock()
            .map_err(|_| anyhow::anyhow!("Offline generator RNG poisoned"))?;
        Ok(free.choose(&mut *rng).map(|n| n.to_string()))
    }
}

