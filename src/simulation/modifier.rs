//! Transient network-wide effects
//!
//! At most one modifier is active at a time. Surges raise the spawn rate at a
//! station, speed changes scale train progress on a line, and closures are
//! tracked but have no mechanical effect.

use anyhow::{Context, Result};
use log::{debug, info};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::types::{LineId, StationId};

/// Kind of effect an event applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectKind {
    PassengerSurge,
    SpeedChange,
    StationClosure,
}

/// Target and strength of an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEffect {
    pub kind: EffectKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_station_id: Option<StationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_line_id: Option<LineId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f32>,
}

/// A proposed event as delivered by a content generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEvent {
    pub title: String,
    pub description: String,
    /// How long the effect lasts, in simulation milliseconds
    pub duration_ticks: f64,
    pub effect: EventEffect,
}

impl GameEvent {
    pub fn from_json(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).context("Malformed event payload")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to encode event payload")
    }

    /// Usable multiplier, if the payload carries one
    pub fn multiplier(&self) -> Option<f32> {
        self.effect
            .multiplier
            .filter(|m| m.is_finite() && *m > 0.0)
    }

    /// Swap unknown target ids for random existing ones of the same kind.
    ///
    /// Only ids that are present are touched; a present id with nothing to
    /// substitute is cleared.
    pub fn repair_targets<R: Rng + ?Sized>(
        &mut self,
        stations: &[StationId],
        lines: &[LineId],
        rng: &mut R,
    ) {
        if let Some(station) = self.effect.target_station_id {
            if !stations.contains(&station) {
                let replacement = stations.choose(rng).copied();
                debug!(
                    "Event '{}' targets unknown station {:?}; substituting {:?}",
                    self.title, station, replacement
                );
                self.effect.target_station_id = replacement;
            }
        }
        if let Some(line) = self.effect.target_line_id {
            if !lines.contains(&line) {
                let replacement = lines.choose(rng).copied();
                debug!(
                    "Event '{}' targets unknown line {:?}; substituting {:?}",
                    self.title, line, replacement
                );
                self.effect.target_line_id = replacement;
            }
        }
    }
}

/// An installed event and the simulation time it has left
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveModifier {
    pub event: GameEvent,
    pub remaining: f64,
}

/// Holder for the single active modifier slot
#[derive(Debug, Clone, Default)]
pub struct EventModifier {
    active: Option<ActiveModifier>,
}

impl EventModifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ActiveModifier> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Install `event` if the slot is free. Returns false when occupied.
    pub fn install(&mut self, event: GameEvent) -> bool {
        if self.active.is_some() {
            return false;
        }
        info!(
            "Event started: {} ({:?}, {:.0}ms)",
            event.title, event.effect.kind, event.duration_ticks
        );
        if event.effect.kind == EffectKind::StationClosure {
            debug!("Station closures have no effect on spawning or boarding");
        }
        self.active = Some(ActiveModifier {
            remaining: event.duration_ticks,
            event,
        });
        true
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    /// Count down by `delta` and clear once nothing remains.
    /// Returns the event that just expired, if any.
    pub fn decay(&mut self, delta: f64) -> Option<GameEvent> {
        let active = self.active.as_mut()?;
        active.remaining -= delta;
        if active.remaining <= 0.0 {
            let expired = self.active.take().map(|a| a.event);
            if let Some(event) = &expired {
                info!("Event ended: {}", event.title);
            }
            expired
        } else {
            None
        }
    }

    /// Spawn multiplier for `station` (1 unless a surge targets it)
    pub fn surge_multiplier(&self, station: StationId) -> f32 {
        match &self.active {
            Some(active)
                if active.event.effect.kind == EffectKind::PassengerSurge
                    && active.event.effect.target_station_id == Some(station) =>
            {
                active.event.multiplier().unwrap_or(1.0)
            }
            _ => 1.0,
        }
    }

    /// Speed multiplier for trains on `line` (1 unless a speed change targets it)
    pub fn speed_multiplier(&self, line: LineId) -> f32 {
        match &self.active {
            Some(active)
                if active.event.effect.kind == EffectKind::SpeedChange
                    && active.event.effect.target_line_id == Some(line) =>
            {
                active.event.multiplier().unwrap_or(1.0)
            }
            _ => 1.0,
        }
    }
}
