//! Frame-driven runner for a `SimWorld`
//!
//! The driver turns frame timestamps into tick deltas, owns run/pause state,
//! and is the only place advisory results reach the world: they queue up on a
//! channel and are applied between ticks.

use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::advisory::{self, ContentGenerator, EventPoller, PendingUpdate};
use crate::simulation::{NetworkSnapshot, SimWorld, StationId};

/// Generator plus the cadence the driver polls it at while running
struct AdvisorySource {
    generator: Arc<dyn ContentGenerator>,
    period: Duration,
    timeout: Duration,
}

pub struct SimulationDriver {
    world: SimWorld,
    running: bool,
    /// Timestamp of the previous frame while running
    last_frame_ms: Option<f64>,
    ticks: u64,
    updates_tx: mpsc::UnboundedSender<PendingUpdate>,
    updates_rx: mpsc::UnboundedReceiver<PendingUpdate>,
    snapshots: watch::Sender<NetworkSnapshot>,
    advisory: Option<AdvisorySource>,
    poller: Option<EventPoller>,
    name_requests: Vec<JoinHandle<()>>,
}

impl SimulationDriver {
    pub fn new(world: SimWorld) -> Self {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let (snapshots, _) = watch::channel(world.snapshot(false));
        Self {
            world,
            running: false,
            last_frame_ms: None,
            ticks: 0,
            updates_tx,
            updates_rx,
            snapshots,
            advisory: None,
            poller: None,
            name_requests: Vec::new(),
        }
    }

    pub fn world(&self) -> &SimWorld {
        &self.world
    }

    /// Mutable access for commands issued between frames
    pub fn world_mut(&mut self) -> &mut SimWorld {
        &mut self.world
    }

    pub fn into_world(self) -> SimWorld {
        self.world
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Ticks executed since the driver was created
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Sender advisory tasks use to queue results
    pub fn update_sender(&self) -> mpsc::UnboundedSender<PendingUpdate> {
        self.updates_tx.clone()
    }

    /// Receiver of the snapshot published after every frame
    pub fn subscribe(&self) -> watch::Receiver<NetworkSnapshot> {
        self.snapshots.subscribe()
    }

    /// Use `generator` for events and station names.
    ///
    /// Events are polled every `period` while running; the poller is torn
    /// down on pause and rebuilt on start. Must be called from within a
    /// tokio runtime if the driver is already running.
    pub fn attach_generator(
        &mut self,
        generator: Arc<dyn ContentGenerator>,
        period: Duration,
        timeout: Duration,
    ) {
        self.poller = None;
        self.advisory = Some(AdvisorySource {
            generator,
            period,
            timeout,
        });
        if self.running {
            self.spawn_poller();
        }
    }

    pub fn has_poller(&self) -> bool {
        self.poller.is_some()
    }

    /// Ask the attached generator to name `station`.
    ///
    /// Returns false when no generator is attached or the driver is paused.
    /// Outstanding requests are abandoned when the driver pauses.
    pub fn request_station_name(&mut self, station: StationId) -> bool {
        let Some(source) = &self.advisory else {
            return false;
        };
        if !self.running {
            return false;
        }
        self.name_requests.retain(|handle| !handle.is_finished());
        self.name_requests.push(advisory::request_station_name(
            source.generator.clone(),
            station,
            self.world.snapshot(self.running),
            self.updates_tx.clone(),
            source.timeout,
        ));
        true
    }

    /// Name requests that have not finished yet
    pub fn pending_name_requests(&self) -> usize {
        self.name_requests
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    fn spawn_poller(&mut self) {
        if let Some(source) = &self.advisory {
            self.poller = Some(EventPoller::spawn(
                source.generator.clone(),
                self.snapshots.subscribe(),
                self.updates_tx.clone(),
                source.period,
                source.timeout,
            ));
        }
    }

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.last_frame_ms = None;
        info!("Simulation started at {:.0}ms", self.world.time());
        self.publish();
        self.spawn_poller();
    }

    /// Stop ticking. The next start begins with a fresh frame clock.
    /// Outstanding advisory requests are abandoned and queued results are
    /// discarded; the event poller comes back on the next start.
    pub fn pause(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.last_frame_ms = None;
        if let Some(poller) = self.poller.take() {
            poller.cancel();
        }
        for handle in self.name_requests.drain(..) {
            handle.abort();
        }
        let discarded = self.discard_pending_updates();
        if discarded > 0 {
            debug!("Discarded {} queued advisory result(s)", discarded);
        }
        info!("Simulation paused at {:.0}ms", self.world.time());
        self.publish();
    }

    /// Process one frame at wall-clock `now_ms`.
    ///
    /// The first frame after starting only records its timestamp. Returns
    /// whether a tick ran.
    pub fn frame(&mut self, now_ms: f64) -> bool {
        if !self.running {
            return false;
        }
        self.apply_pending_updates();

        let ticked = match self.last_frame_ms {
            Some(previous) => {
                self.world.tick((now_ms - previous).max(0.0));
                self.ticks += 1;
                true
            }
            None => false,
        };
        self.last_frame_ms = Some(now_ms);
        self.publish();
        ticked
    }

    /// Apply queued advisory results.
    ///
    /// Events are only installed while running and while no modifier is
    /// active; otherwise they are dropped. Renames of deleted stations are
    /// dropped.
    pub fn apply_pending_updates(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.updates_rx.try_recv() {
            match update {
                PendingUpdate::InstallEvent(event) => {
                    if !self.running {
                        debug!("Dropping event '{}' while paused", event.title);
                    } else if self.world.install_event(event) {
                        applied += 1;
                    }
                }
                PendingUpdate::RenameStation { station, name } => {
                    match self.world.rename_station(station, &name) {
                        Ok(()) => applied += 1,
                        Err(e) => debug!("Dropping rename of {:?}: {:#}", station, e),
                    }
                }
            }
        }
        applied
    }

    /// Drop everything queued without applying it
    pub fn discard_pending_updates(&mut self) -> usize {
        let mut discarded = 0;
        while self.updates_rx.try_recv().is_ok() {
            discarded += 1;
        }
        discarded
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.world.snapshot(self.running));
    }
}
