//! Main simulation world that ties everything together
//!
//! `SimWorld` owns every station, line, train and passenger and is the only
//! place they are mutated. Commands keep the network referentially intact:
//! lines and trains refer to stations by id, and deleting a station cascades
//! through every collection before the command returns.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;

use super::config::SimConfig;
use super::line::SimLine;
use super::modifier::{EventModifier, GameEvent};
use super::passenger::SimPassenger;
use super::scheduler::{TrainArrival, TrainScheduler};
use super::snapshot::{LineSummary, NetworkSnapshot, StationSummary};
use super::spawner::PassengerSpawner;
use super::station::{station_capacity, SimStation};
use super::stats::ServiceStats;
use super::train::SimTrain;
use super::types::{
    line_color, Direction, LineId, PassengerId, Position, SimId, StationId, TrainId, TILE_SIZE,
};

/// Per-line performance figures
#[derive(Debug, Clone, PartialEq)]
pub struct LineReport {
    pub id: LineId,
    pub name: String,
    pub color: String,
    pub stations: usize,
    pub trains: usize,
    pub served: usize,
}

/// The main simulation world
pub struct SimWorld {
    stations: BTreeMap<StationId, SimStation>,
    lines: BTreeMap<LineId, SimLine>,
    trains: BTreeMap<TrainId, SimTrain>,

    /// The single transient effect slot
    modifier: EventModifier,

    stats: ServiceStats,

    config: SimConfig,

    /// Next ID to assign
    next_id: usize,

    /// Simulation time in milliseconds
    time: f64,

    /// Optional seeded RNG for reproducible simulations
    rng: Option<StdRng>,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWorld {
    fn new_internal(rng: Option<StdRng>, config: SimConfig) -> Self {
        Self {
            stations: BTreeMap::new(),
            lines: BTreeMap::new(),
            trains: BTreeMap::new(),
            modifier: EventModifier::new(),
            stats: ServiceStats::new(),
            config,
            next_id: 0,
            time: 0.0,
            rng,
        }
    }

    pub fn new() -> Self {
        Self::new_internal(None, SimConfig::default())
    }

    /// Create a new SimWorld with a seeded RNG for reproducible simulations
    pub fn new_with_seed(seed: u64) -> Self {
        Self::new_internal(Some(StdRng::seed_from_u64(seed)), SimConfig::default())
    }

    pub fn with_config(config: SimConfig, seed: Option<u64>) -> Self {
        Self::new_internal(seed.map(StdRng::seed_from_u64), config)
    }

    fn next_sim_id(&mut self) -> SimId {
        let id = SimId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Drop every entity, counter and effect. Configuration and RNG are kept.
    pub fn reset(&mut self) {
        self.stations.clear();
        self.lines.clear();
        self.trains.clear();
        self.modifier.clear();
        self.stats = ServiceStats::new();
        self.time = 0.0;
        info!("World reset");
    }

    // ----- commands -----

    /// Add a station at `position`, named after the station count
    pub fn add_station(&mut self, position: Position) -> StationId {
        let id = StationId(self.next_sim_id());
        let name = format!("Station {}", self.stations.len() + 1);
        self.stations.insert(id, SimStation::new(id, name, position));
        id
    }

    /// Add a station at a map click, snapped to the tile grid
    pub fn add_station_snapped(&mut self, position: Position) -> StationId {
        self.add_station(position.snapped(TILE_SIZE))
    }

    /// Add an empty line
    pub fn add_line(&mut self, name: impl Into<String>, color: impl Into<String>) -> LineId {
        let id = LineId(self.next_sim_id());
        self.lines.insert(id, SimLine::new(id, name.into(), color.into()));
        id
    }

    /// Add an empty line with the next palette color and a default name
    pub fn add_default_line(&mut self) -> LineId {
        let index = self.lines.len();
        self.add_line(format!("Line {}", index + 1), line_color(index))
    }

    /// Append `station` to the end of `line`.
    ///
    /// Returns `Ok(false)` without changing anything when `station` is
    /// already the line's tail.
    pub fn extend_line(&mut self, line_id: LineId, station_id: StationId) -> Result<bool> {
        if !self.stations.contains_key(&station_id) {
            anyhow::bail!("Station {:?} not found", station_id);
        }
        let line = self.lines.get_mut(&line_id).context("Line not found")?;
        if line.tail() == Some(station_id) {
            debug!("Station {:?} is already the tail of {:?}", station_id, line_id);
            return Ok(false);
        }
        line.stations.push(station_id);
        Ok(true)
    }

    /// Put a new train on `line` at its first station, heading forward
    pub fn add_train(&mut self, line_id: LineId) -> Result<TrainId> {
        let line = self.lines.get(&line_id).context("Line not found")?;
        if !line.is_operable() {
            anyhow::bail!(
                "Line {:?} needs at least 2 stations before it can run trains",
                line_id
            );
        }
        let id = TrainId(self.next_sim_id());
        self.trains.insert(id, SimTrain::new(id, line_id));
        Ok(id)
    }

    /// Place a passenger in `origin`'s queue, stamped with the current time
    pub fn add_passenger(&mut self, origin: StationId, destination: StationId) -> Result<PassengerId> {
        if origin == destination {
            anyhow::bail!("Passenger origin and destination must differ");
        }
        if !self.stations.contains_key(&destination) {
            anyhow::bail!("Destination station {:?} not found", destination);
        }
        let id = PassengerId(self.next_sim_id());
        let passenger = SimPassenger::new(id, origin, destination, self.time);
        self.stations
            .get_mut(&origin)
            .context("Origin station not found")?
            .passengers
            .push(passenger);
        self.stats.record_spawned(1);
        Ok(id)
    }

    pub fn rename_station(&mut self, station_id: StationId, name: &str) -> Result<()> {
        let station = self
            .stations
            .get_mut(&station_id)
            .context("Station not found")?;
        let name = name.trim();
        if name.is_empty() {
            debug!("Ignoring empty name for {:?}", station_id);
            return Ok(());
        }
        station.name = name.to_string();
        Ok(())
    }

    /// Remove a train; its passengers are removed with it
    pub fn remove_train(&mut self, train_id: TrainId) -> Result<()> {
        let train = self.trains.remove(&train_id).context("Train not found")?;
        self.stats.record_purged(train.passengers.len());
        Ok(())
    }

    /// Remove a line and every train running on it
    pub fn remove_line(&mut self, line_id: LineId) -> Result<()> {
        self.lines.remove(&line_id).context("Line not found")?;
        self.remove_trains_on(&[line_id]);
        Ok(())
    }

    /// Remove a station and everything that depends on it.
    ///
    /// The station disappears from every line; lines left with fewer than 2
    /// stations are dropped together with their trains. Trains on surviving
    /// lines are re-seated on the shortened route, and every passenger whose
    /// origin or destination was this station is removed.
    pub fn remove_station(&mut self, station_id: StationId) -> Result<()> {
        let station = self
            .stations
            .remove(&station_id)
            .context("Station not found")?;
        let mut purged = station.passengers.len();

        let mut dropped_lines = Vec::new();
        let mut contracted: Vec<(LineId, Vec<bool>, usize)> = Vec::new();
        for line in self.lines.values_mut() {
            if !line.contains(station_id) {
                continue;
            }
            let kept = line.remove_station(station_id);
            if line.is_operable() {
                contracted.push((line.id, kept, line.len()));
            } else {
                dropped_lines.push(line.id);
            }
        }

        for line_id in &dropped_lines {
            self.lines.remove(line_id);
            info!("Line {:?} dropped after losing {:?}", line_id, station_id);
        }
        self.remove_trains_on(&dropped_lines);

        for (line_id, kept, new_len) in &contracted {
            for train in self.trains.values_mut().filter(|t| t.line == *line_id) {
                train.remap_after_contraction(kept, *new_len);
            }
        }

        for station in self.stations.values_mut() {
            purged += station.purge_referencing(station_id);
        }
        for train in self.trains.values_mut() {
            purged += train.purge_referencing(station_id);
        }
        self.stats.record_purged(purged);

        debug!(
            "Removed {:?}: {} line(s) dropped, {} passenger(s) purged",
            station_id,
            dropped_lines.len(),
            purged
        );
        Ok(())
    }

    fn remove_trains_on(&mut self, lines: &[LineId]) {
        if lines.is_empty() {
            return;
        }
        let doomed: Vec<TrainId> = self
            .trains
            .values()
            .filter(|t| lines.contains(&t.line))
            .map(|t| t.id)
            .collect();
        for train_id in doomed {
            if let Some(train) = self.trains.remove(&train_id) {
                self.stats.record_purged(train.passengers.len());
            }
        }
    }

    /// Accept an event proposal into the modifier slot.
    ///
    /// Unknown target ids are swapped for random live ones first. Returns
    /// `false` if a modifier is already active.
    pub fn install_event(&mut self, mut event: GameEvent) -> bool {
        if self.modifier.is_active() {
            debug!("Event '{}' rejected: a modifier is already active", event.title);
            return false;
        }
        let station_ids: Vec<StationId> = self.stations.keys().copied().collect();
        let line_ids: Vec<LineId> = self.lines.keys().copied().collect();
        match &mut self.rng {
            Some(rng) => event.repair_targets(&station_ids, &line_ids, rng),
            None => event.repair_targets(&station_ids, &line_ids, &mut rand::rng()),
        }
        self.modifier.install(event)
    }

    pub fn clear_event(&mut self) {
        self.modifier.clear();
    }

    // ----- tick -----

    /// Spawn new passengers at stations
    fn spawn_passengers(&mut self) -> usize {
        let spawner = PassengerSpawner::new(
            self.config.passenger_spawn_rate,
            self.config.base_station_capacity,
        );
        let requests = match &mut self.rng {
            Some(rng) => spawner.plan(&self.stations, &self.lines, &self.modifier, rng),
            None => spawner.plan(&self.stations, &self.lines, &self.modifier, &mut rand::rng()),
        };

        let count = requests.len();
        for request in requests {
            let id = PassengerId(self.next_sim_id());
            let passenger = SimPassenger::new(id, request.origin, request.destination, self.time);
            match self.stations.get_mut(&request.origin) {
                Some(station) => station.passengers.push(passenger),
                None => warn!("Spawn origin {:?} vanished", request.origin),
            }
        }
        self.stats.record_spawned(count);
        count
    }

    /// Update all trains
    fn update_trains(&mut self) -> Vec<TrainArrival> {
        let scheduler = TrainScheduler::new(self.config.train_speed, self.config.train_capacity);
        scheduler.update_trains(
            &mut self.trains,
            &mut self.stations,
            &self.lines,
            &self.modifier,
            &mut self.stats,
            self.time,
        )
    }

    /// Main simulation tick
    pub fn tick(&mut self, delta_ms: f64) {
        self.time += delta_ms;

        // Spawn demand
        self.spawn_passengers();

        // Move trains and resolve arrivals
        self.update_trains();

        // Age the active event
        self.modifier.decay(delta_ms);
    }

    // ----- queries -----

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn stats(&self) -> &ServiceStats {
        &self.stats
    }

    pub fn modifier(&self) -> &EventModifier {
        &self.modifier
    }

    pub fn stations(&self) -> impl Iterator<Item = &SimStation> {
        self.stations.values()
    }

    pub fn lines(&self) -> impl Iterator<Item = &SimLine> {
        self.lines.values()
    }

    pub fn trains(&self) -> impl Iterator<Item = &SimTrain> {
        self.trains.values()
    }

    pub fn station(&self, id: StationId) -> Option<&SimStation> {
        self.stations.get(&id)
    }

    pub fn line(&self, id: LineId) -> Option<&SimLine> {
        self.lines.get(&id)
    }

    pub fn train(&self, id: TrainId) -> Option<&SimTrain> {
        self.trains.get(&id)
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn train_count(&self) -> usize {
        self.trains.len()
    }

    /// Passengers in the system: waiting at stations plus riding trains
    pub fn total_passengers_waiting(&self) -> usize {
        let at_stations: usize = self.stations.values().map(|s| s.passengers.len()).sum();
        let on_trains: usize = self.trains.values().map(|t| t.passengers.len()).sum();
        at_stations + on_trains
    }

    pub fn passengers_served(&self) -> usize {
        self.stats.passengers_served
    }

    pub fn average_wait_time(&self) -> f64 {
        self.stats.average_wait_time()
    }

    /// Number of lines calling at `station`
    pub fn lines_through(&self, station: StationId) -> usize {
        self.lines.values().filter(|l| l.contains(station)).count()
    }

    /// How many passengers `station` may hold before spawning stops there
    pub fn station_capacity(&self, station: StationId) -> Option<usize> {
        self.stations.get(&station)?;
        Some(station_capacity(
            self.lines_through(station),
            self.config.base_station_capacity,
        ))
    }

    /// Station the train is heading towards
    pub fn train_next_station(&self, train_id: TrainId) -> Option<&SimStation> {
        let train = self.trains.get(&train_id)?;
        let line = self.lines.get(&train.line)?;
        let id = line.station_at(train.next_station_index())?;
        self.stations.get(&id)
    }

    /// Terminus in the train's direction of travel
    pub fn train_final_station(&self, train_id: TrainId) -> Option<&SimStation> {
        let train = self.trains.get(&train_id)?;
        let line = self.lines.get(&train.line)?;
        let id = match train.direction {
            Direction::Forward => line.tail()?,
            Direction::Backward => *line.stations.first()?,
        };
        self.stations.get(&id)
    }

    /// Interpolated map position of a train
    pub fn train_position(&self, train_id: TrainId) -> Option<Position> {
        let train = self.trains.get(&train_id)?;
        let line = self.lines.get(&train.line)?;
        let from = line
            .station_at(train.current_station_index as isize)
            .and_then(|id| self.stations.get(&id))?;
        match line
            .station_at(train.next_station_index())
            .and_then(|id| self.stations.get(&id))
        {
            Some(to) => Some(from.position.lerp(&to.position, train.progress)),
            None => Some(from.position),
        }
    }

    /// Per-line train counts and deliveries, busiest first
    pub fn line_report(&self) -> Vec<LineReport> {
        let mut reports: Vec<LineReport> = self
            .lines
            .values()
            .map(|line| LineReport {
                id: line.id,
                name: line.name.clone(),
                color: line.color.clone(),
                stations: line.len(),
                trains: self.trains.values().filter(|t| t.line == line.id).count(),
                served: self.stats.served_on(line.id),
            })
            .collect();
        reports.sort_by(|a, b| b.served.cmp(&a.served));
        reports
    }

    /// Summary of the network for advisory collaborators
    pub fn snapshot(&self, running: bool) -> NetworkSnapshot {
        NetworkSnapshot {
            time: self.time,
            running,
            stations: self
                .stations
                .values()
                .map(|s| StationSummary {
                    id: s.id,
                    name: s.name.clone(),
                    position: s.position,
                    waiting: s.passengers.len(),
                })
                .collect(),
            lines: self
                .lines
                .values()
                .map(|l| LineSummary {
                    id: l.id,
                    name: l.name.clone(),
                    color: l.color.clone(),
                    stations: l.stations.clone(),
                })
                .collect(),
            active_event: self.modifier.active().map(|a| a.event.clone()),
        }
    }

    /// Verify referential integrity and train bounds
    pub fn check_invariants(&self) -> Result<()> {
        for line in self.lines.values() {
            for station in &line.stations {
                if !self.stations.contains_key(station) {
                    anyhow::bail!("Line {:?} references missing {:?}", line.id, station);
                }
            }
        }

        for train in self.trains.values() {
            let line = self
                .lines
                .get(&train.line)
                .with_context(|| format!("Train {:?} references missing {:?}", train.id, train.line))?;
            if !line.is_operable() {
                anyhow::bail!("Train {:?} runs on {:?} with fewer than 2 stations", train.id, line.id);
            }
            if train.current_station_index >= line.len() {
                anyhow::bail!(
                    "Train {:?} index {} out of range for {:?}",
                    train.id,
                    train.current_station_index,
                    line.id
                );
            }
            if train.passengers.len() > self.config.train_capacity {
                anyhow::bail!("Train {:?} is over capacity", train.id);
            }
        }

        let manifests = self.trains.values().flat_map(|t| t.passengers.iter());
        let queues = self.stations.values().flat_map(|s| s.passengers.iter());
        for passenger in queues.chain(manifests) {
            if !self.stations.contains_key(&passenger.origin)
                || !self.stations.contains_key(&passenger.destination)
            {
                anyhow::bail!("Passenger {:?} references a missing station", passenger.id);
            }
        }

        Ok(())
    }

    // ----- demo network -----

    /// Create the demo network with a seeded RNG for reproducible simulations
    pub fn create_demo_world_with_seed(seed: u64) -> Result<Self> {
        Self::build_demo_world(SimWorld::new_with_seed(seed))
    }

    /// Lay out the demo network on an existing world
    pub fn build_demo_world(mut world: SimWorld) -> Result<Self> {
        let spacing = TILE_SIZE * 2.0;

        // East-west line through the middle row
        let west: Vec<StationId> = (0..5)
            .map(|col| world.add_station_snapped(Position::new(col as f32 * spacing, 2.0 * spacing)))
            .collect();

        // North-south line sharing the centre station
        let north = world.add_station_snapped(Position::new(2.0 * spacing, 0.0));
        let upper = world.add_station_snapped(Position::new(2.0 * spacing, spacing));
        let lower = world.add_station_snapped(Position::new(2.0 * spacing, 3.0 * spacing));
        let south = world.add_station_snapped(Position::new(2.0 * spacing, 4.0 * spacing));

        let crosstown = world.add_default_line();
        for station in &west {
            world
                .extend_line(crosstown, *station)
                .context("Failed to lay out demo crosstown line")?;
        }

        let trunk = world.add_default_line();
        for station in [north, upper, west[2], lower, south] {
            world
                .extend_line(trunk, station)
                .context("Failed to lay out demo trunk line")?;
        }

        world.add_train(crosstown)?;
        world.add_train(crosstown)?;
        world.add_train(trunk)?;

        Ok(world)
    }

    // ----- console output -----

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        println!("=== Transit Simulation Summary ===");
        println!("Time: {:.0}ms", self.time);
        println!(
            "Stations: {}, Lines: {}, Trains: {}",
            self.stations.len(),
            self.lines.len(),
            self.trains.len()
        );
        println!("Passengers in system: {}", self.total_passengers_waiting());
        println!("{}", self.stats.summary());
        println!();

        println!("--- Lines ---");
        for report in self.line_report() {
            println!(
                "  {} ({}): stations={}, trains={}, served={}",
                report.name, report.color, report.stations, report.trains, report.served
            );
        }

        println!("--- Stations ---");
        for station in self.stations.values() {
            println!(
                "  {}: waiting={}/{}",
                station.name,
                station.passengers.len(),
                self.station_capacity(station.id).unwrap_or(0)
            );
        }

        if !self.trains.is_empty() {
            println!("--- Trains ---");
            for train in self.trains.values() {
                let next = self
                    .train_next_station(train.id)
                    .map(|s| s.name.as_str())
                    .unwrap_or("-");
                println!(
                    "  Train {:?}: index={}, progress={:.2}, direction={:?}, next={}, load={}/{}",
                    train.id.0 .0,
                    train.current_station_index,
                    train.progress,
                    train.direction,
                    next,
                    train.passengers.len(),
                    self.config.train_capacity
                );
            }
        }

        if let Some(active) = self.modifier.active() {
            println!("--- Event ---");
            println!(
                "  {}: {} ({:.0}ms left)",
                active.event.title, active.event.description, active.remaining
            );
        }
    }

    /// Draw a visual map of the network in the terminal
    pub fn draw_map(&self) {
        if self.stations.is_empty() {
            println!("\n=== Network Map ===\n(no stations)\n");
            return;
        }

        // Find bounds of the network
        let mut min_x = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_y = f32::NEG_INFINITY;

        for station in self.stations.values() {
            min_x = min_x.min(station.position.x);
            max_x = max_x.max(station.position.x);
            min_y = min_y.min(station.position.y);
            max_y = max_y.max(station.position.y);
        }

        // Characters per world unit
        let scale = 0.1;
        let pad = 2.0 / scale;
        min_x -= pad;
        max_x += pad;
        min_y -= pad;
        max_y += pad;

        let width = (((max_x - min_x) * scale) as usize).max(1);
        let height = (((max_y - min_y) * scale) as usize).max(1);
        let mut grid = vec![vec![' '; width]; height];

        let to_grid = |p: &Position| -> (usize, usize) {
            let col = ((p.x - min_x) * scale) as usize;
            let row = ((p.y - min_y) * scale) as usize;
            (row.min(height - 1), col.min(width - 1))
        };

        // Draw line segments
        for line in self.lines.values() {
            for pair in line.stations.windows(2) {
                let (Some(a), Some(b)) = (self.stations.get(&pair[0]), self.stations.get(&pair[1]))
                else {
                    continue;
                };
                let (start_row, start_col) = to_grid(&a.position);
                let (end_row, end_col) = to_grid(&b.position);

                // Simple line drawing (Bresenham-like)
                let dx = (end_col as i32 - start_col as i32).abs();
                let dy = (end_row as i32 - start_row as i32).abs();
                let sx = if start_col < end_col { 1 } else { -1 };
                let sy = if start_row < end_row { 1 } else { -1 };

                let mut err = dx - dy;
                let mut x = start_col as i32;
                let mut y = start_row as i32;

                loop {
                    if x >= 0 && x < width as i32 && y >= 0 && y < height as i32 {
                        let cell = &mut grid[y as usize][x as usize];
                        if *cell == ' ' {
                            *cell = '.';
                        }
                    }

                    if x == end_col as i32 && y == end_row as i32 {
                        break;
                    }

                    let e2 = 2 * err;
                    if e2 > -dy {
                        err -= dy;
                        x += sx;
                    }
                    if e2 < dx {
                        err += dx;
                        y += sy;
                    }
                }
            }
        }

        // Draw stations; interchanges stand out
        for station in self.stations.values() {
            let (row, col) = to_grid(&station.position);
            grid[row][col] = if self.lines_through(station.id) >= 2 {
                '#'
            } else {
                'O'
            };
        }

        // Draw trains
        for train in self.trains.values() {
            if let Some(position) = self.train_position(train.id) {
                let (row, col) = to_grid(&position);
                if grid[row][col] == ' ' || grid[row][col] == '.' {
                    grid[row][col] = 'T';
                }
            }
        }

        println!("\n=== Network Map ===");
        println!("Legend: O=Station, #=Interchange, T=Train, .=Track");
        println!();
        for row in &grid {
            let line: String = row.iter().collect();
            println!("{}", line);
        }
        println!();
    }
}
