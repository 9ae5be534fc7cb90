//! Train movement and arrival handling
//!
//! Trains shuttle back and forth along their line. On reaching a station
//! they drop off passengers bound there, turn around at a terminus, and pick
//! up passengers headed the way the train is now going, all in one tick.

use log::{debug, warn};
use std::collections::BTreeMap;

use super::line::SimLine;
use super::modifier::EventModifier;
use super::station::SimStation;
use super::stats::ServiceStats;
use super::train::{SimTrain, TrainUpdateResult};
use super::types::{Direction, LineId, StationId, TrainId};

/// What happened when a train reached a station
#[derive(Debug, Clone, PartialEq)]
pub struct TrainArrival {
    pub train: TrainId,
    pub station: StationId,
    pub station_index: usize,
    pub direction: Direction,
    pub alighted: usize,
    pub boarded: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct TrainScheduler {
    pub train_speed: f32,
    pub train_capacity: usize,
}

impl TrainScheduler {
    pub fn new(train_speed: f32, train_capacity: usize) -> Self {
        Self {
            train_speed,
            train_capacity,
        }
    }

    /// Advance every train by one tick
    pub fn update_trains(
        &self,
        trains: &mut BTreeMap<TrainId, SimTrain>,
        stations: &mut BTreeMap<StationId, SimStation>,
        lines: &BTreeMap<LineId, SimLine>,
        modifier: &EventModifier,
        stats: &mut ServiceStats,
        now: f64,
    ) -> Vec<TrainArrival> {
        let mut arrivals = Vec::new();

        for train in trains.values_mut() {
            let line = match lines.get(&train.line) {
                Some(line) if line.is_operable() => line,
                Some(_) => {
                    warn!("Train {:?} runs on a line with fewer than 2 stations; skipping", train.id);
                    continue;
                }
                None => {
                    warn!("Train {:?} references missing line {:?}; skipping", train.id, train.line);
                    continue;
                }
            };

            let step = self.train_speed * modifier.speed_multiplier(line.id);
            match train.advance(step) {
                TrainUpdateResult::InTransit(progress) => train.progress = progress,
                TrainUpdateResult::Arriving => {
                    if let Some(arrival) = self.arrive(train, line, stations, stats, now) {
                        debug!(
                            "Train {:?} arrived at {:?}: {} off, {} on",
                            arrival.train, arrival.station, arrival.alighted, arrival.boarded
                        );
                        arrivals.push(arrival);
                    }
                }
            }
        }

        arrivals
    }

    /// Resolve a train reaching its next station.
    /// Leaves the train untouched if that station cannot be found.
    fn arrive(
        &self,
        train: &mut SimTrain,
        line: &SimLine,
        stations: &mut BTreeMap<StationId, SimStation>,
        stats: &mut ServiceStats,
        now: f64,
    ) -> Option<TrainArrival> {
        let next_index = train.next_station_index();
        let station = match line
            .station_at(next_index)
            .and_then(|id| stations.get_mut(&id))
        {
            Some(station) => station,
            None => {
                warn!(
                    "Train {:?} cannot resolve station index {} on line {:?}; holding",
                    train.id, next_index, line.id
                );
                return None;
            }
        };
        let next_index = next_index as usize;

        let alighting = train.alight_at(station.id);
        for passenger in &alighting {
            stats.record_served(line.id, passenger.wait_time(now));
        }

        let direction = match train.direction {
            Direction::Forward if next_index >= line.last_index() => Direction::Backward,
            Direction::Backward if next_index == 0 => Direction::Forward,
            unchanged => unchanged,
        };

        let mut boarded = 0;
        let mut staying = Vec::with_capacity(station.passengers.len());
        for passenger in station.passengers.drain(..) {
            let heading_our_way = match line.index_of(passenger.destination) {
                Some(dest) => match direction {
                    Direction::Forward => dest > next_index,
                    Direction::Backward => dest < next_index,
                },
                None => false,
            };
            if heading_our_way && train.passengers.len() < self.train_capacity {
                train.passengers.push(passenger);
                boarded += 1;
            } else {
                staying.push(passenger);
            }
        }
        station.passengers = staying;

        train.current_station_index = next_index;
        train.progress = 0.0;
        train.direction = direction;

        Some(TrainArrival {
            train: train.id,
            station: station.id,
            station_index: next_index,
            direction,
            alighted: alighting.len(),
            boarded,
        })
    }
}
