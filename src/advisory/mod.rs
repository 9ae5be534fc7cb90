//! Advisory content: flavor events and station names from an external generator
//!
//! Generators are slow and unreliable, so they never touch the world
//! directly. Requests run as tokio tasks, and whatever they produce is queued
//! as a [`PendingUpdate`] for the driver to apply between ticks. Failures and
//! timeouts count as "no suggestion".

mod offline;

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::simulation::{GameEvent, NetworkSnapshot, StationId};

pub use offline::OfflineContentGenerator;

/// Source of event proposals and station names
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Propose an event for the current network, or `None` for nothing
    async fn request_event(&self, snapshot: &NetworkSnapshot) -> Result<Option<GameEvent>>;

    /// Suggest a name for `station`
    async fn request_station_name(
        &self,
        station: StationId,
        snapshot: &NetworkSnapshot,
    ) -> Result<Option<String>>;
}

/// Advisory result waiting for the next tick boundary
#[derive(Debug, Clone, PartialEq)]
pub enum PendingUpdate {
    InstallEvent(GameEvent),
    RenameStation { station: StationId, name: String },
}

/// Run an advisory request, folding errors and timeouts into `None`
async fn advisory_call<T, F>(what: &str, timeout: Duration, request: F) -> Option<T>
where
    F: Future<Output = Result<Option<T>>>,
{
    match tokio::time::timeout(timeout, request).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            warn!("{} request failed: {:#}", what, e);
            None
        }
        Err(_) => {
            warn!("{} request timed out after {:?}", what, timeout);
            None
        }
    }
}

/// Background task that periodically asks for an event.
///
/// Polls only while the latest snapshot says the simulation is running and
/// no modifier is active. Each request is awaited before the next poll, so
/// at most one is ever outstanding. Dropping the poller cancels it.
pub struct EventPoller {
    handle: JoinHandle<()>,
}

impl EventPoller {
    /// Start polling. Must be called from within a tokio runtime.
    pub fn spawn(
        generator: Arc<dyn ContentGenerator>,
        snapshots: watch::Receiver<NetworkSnapshot>,
        updates: mpsc::UnboundedSender<PendingUpdate>,
        period: Duration,
        timeout: Duration,
    ) -> Self {
        let handle = tokio::spawn(poll_events(generator, snapshots, updates, period, timeout));
        Self { handle }
    }

    /// Stop polling; an in-flight request is abandoned
    pub fn cancel(self) {
        drop(self);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for EventPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn poll_events(
    generator: Arc<dyn ContentGenerator>,
    snapshots: watch::Receiver<NetworkSnapshot>,
    updates: mpsc::UnboundedSender<PendingUpdate>,
    period: Duration,
    timeout: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately; the first poll waits a full period
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let snapshot = snapshots.borrow().clone();
        if !snapshot.running || snapshot.modifier_active() {
            continue;
        }

        let proposal = advisory_call("Event", timeout, generator.request_event(&snapshot)).await;
        if let Some(event) = proposal {
            debug!("Queueing event '{}'", event.title);
            if updates.send(PendingUpdate::InstallEvent(event)).is_err() {
                debug!("Update channel closed; event poller stopping");
                break;
            }
        }
    }
}

/// Ask for a station name in the background.
///
/// A suggestion is queued as a rename; nothing is queued on failure.
pub fn request_station_name(
    generator: Arc<dyn ContentGenerator>,
    station: StationId,
    snapshot: NetworkSnapshot,
    updates: mpsc::UnboundedSender<PendingUpdate>,
    timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let request = generator.request_station_name(station, &snapshot);
        if let Some(name) = advisory_call("Station name", timeout, request).await {
            let _ = updates.send(PendingUpdate::RenameStation { station, name });
        }
    })
}
