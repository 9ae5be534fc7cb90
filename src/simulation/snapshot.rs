//! Read-only summaries of the network handed to advisory collaborators

use serde::{Deserialize, Serialize};

use super::modifier::GameEvent;
use super::types::{LineId, Position, StationId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSummary {
    pub id: StationId,
    pub name: String,
    pub position: Position,
    pub waiting: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSummary {
    pub id: LineId,
    pub name: String,
    pub color: String,
    pub stations: Vec<StationId>,
}

/// State of the network between two ticks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub time: f64,
    pub running: bool,
    pub stations: Vec<StationSummary>,
    pub lines: Vec<LineSummary>,
    pub active_event: Option<GameEvent>,
}

impl NetworkSnapshot {
    pub fn station(&self, id: StationId) -> Option<&StationSummary> {
        self.stations.iter().find(|s| s.id == id)
    }

    pub fn station_ids(&self) -> Vec<StationId> {
        self.stations.iter().map(|s| s.id).collect()
    }

    pub fn line_ids(&self) -> Vec<LineId> {
        self.lines.iter().map(|l| l.id).collect()
    }

    pub fn modifier_active(&self) -> bool {
        self.active_event.is_some()
    }
}
