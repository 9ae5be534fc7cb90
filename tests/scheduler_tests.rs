//! Train movement, reversal, boarding and alighting tests

use std::collections::BTreeMap;

use transit_sim::simulation::{
    Direction, EffectKind, EventEffect, EventModifier, GameEvent, LineId, Position, ServiceStats,
    SimConfig, SimId, SimLine, SimPassenger, SimStation, SimTrain, SimWorld, StationId,
    TrainId, TrainScheduler, PassengerId,
};

fn quiet_config() -> SimConfig {
    SimConfig {
        passenger_spawn_rate: 0.0,
        train_speed: 0.25,
        ..SimConfig::default()
    }
}

fn two_station_world() -> (SimWorld, StationId, StationId, LineId, TrainId) {
    let mut world = SimWorld::with_config(quiet_config(), Some(3));
    let s1 = world.add_station(Position::new(0.0, 0.0));
    let s2 = world.add_station(Position::new(100.0, 0.0));
    let line = world.add_line("Red", "#FF6347");
    world.extend_line(line, s1).unwrap();
    world.extend_line(line, s2).unwrap();
    let train = world.add_train(line).unwrap();
    (world, s1, s2, line, train)
}

fn speed_event(line: LineId, multiplier: f32) -> GameEvent {
    GameEvent {
        title: "Signal Fault".to_string(),
        description: "Trains are running at caution".to_string(),
        duration_ticks: 100_000.0,
        effect: EventEffect {
            kind: EffectKind::SpeedChange,
            target_station_id: None,
            target_line_id: Some(line),
            multiplier: Some(multiplier),
        },
    }
}

/// A train crossing progress 1.0 lands on the terminus and turns around
#[test]
fn test_train_reaches_terminus_and_reverses() {
    let (mut world, _, _, _, train) = two_station_world();

    for _ in 0..3 {
        world.tick(10.0);
    }
    let t = world.train(train).unwrap();
    assert_eq!(t.current_station_index, 0);
    assert_eq!(t.progress, 0.75);

    world.tick(10.0);
    let t = world.train(train).unwrap();
    assert_eq!(t.current_station_index, 1);
    assert_eq!(t.progress, 0.0);
    assert_eq!(t.direction, Direction::Backward);

    // And flips forward again on reaching index 0
    for _ in 0..4 {
        world.tick(10.0);
    }
    let t = world.train(train).unwrap();
    assert_eq!(t.current_station_index, 0);
    assert_eq!(t.direction, Direction::Forward);
}

#[test]
fn test_train_passes_through_middle_stations() {
    let mut world = SimWorld::with_config(quiet_config(), Some(3));
    let stations: Vec<StationId> = (0..4)
        .map(|i| world.add_station(Position::new(i as f32 * 100.0, 0.0)))
        .collect();
    let line = world.add_line("Blue", "#4682B4");
    for s in &stations {
        world.extend_line(line, *s).unwrap();
    }
    let train = world.add_train(line).unwrap();

    let mut visited = Vec::new();
    for _ in 0..6 * 4 {
        world.tick(10.0);
        let t = world.train(train).unwrap();
        if t.progress == 0.0 {
            visited.push((t.current_station_index, t.direction));
        }
        assert!(t.current_station_index < 4);
    }

    assert_eq!(
        visited,
        vec![
            (1, Direction::Forward),
            (2, Direction::Forward),
            (3, Direction::Backward),
            (2, Direction::Backward),
            (1, Direction::Backward),
            (0, Direction::Forward),
        ]
    );
}

/// A passenger waiting from t=0 rides one trip and is served at its destination
#[test]
fn test_passenger_served_with_exact_wait() {
    let (mut world, s1, s2, _, train) = two_station_world();
    world.add_passenger(s1, s2).unwrap();

    // The train leaves s1 without stopping; it collects the passenger on its return
    for _ in 0..8 {
        world.tick(10.0);
    }
    assert_eq!(world.train(train).unwrap().passengers.len(), 1);
    assert!(world.station(s1).unwrap().passengers.is_empty());
    assert_eq!(world.passengers_served(), 0);

    for _ in 0..4 {
        world.tick(10.0);
    }
    assert_eq!(world.passengers_served(), 1);
    assert!(world.train(train).unwrap().passengers.is_empty());
    assert_eq!(world.average_wait_time(), 120.0);
    assert_eq!(world.total_passengers_waiting(), 0);
}

#[test]
fn test_boarding_only_in_direction_of_travel() {
    let mut world = SimWorld::with_config(quiet_config(), Some(3));
    let a = world.add_station(Position::new(0.0, 0.0));
    let b = world.add_station(Position::new(100.0, 0.0));
    let c = world.add_station(Position::new(200.0, 0.0));
    let elsewhere = world.add_station(Position::new(0.0, 300.0));
    let line = world.add_line("Green", "#32CD32");
    for s in [a, b, c] {
        world.extend_line(line, s).unwrap();
    }
    let train = world.add_train(line).unwrap();

    world.add_passenger(b, c).unwrap();
    world.add_passenger(b, a).unwrap();
    world.add_passenger(b, elsewhere).unwrap();

    for _ in 0..4 {
        world.tick(10.0);
    }

    let t = world.train(train).unwrap();
    assert_eq!(t.current_station_index, 1);
    assert_eq!(t.direction, Direction::Forward);
    assert_eq!(t.passengers.len(), 1);
    assert_eq!(t.passengers[0].destination, c);

    let left: Vec<StationId> = world
        .station(b)
        .unwrap()
        .passengers
        .iter()
        .map(|p| p.destination)
        .collect();
    assert_eq!(left, vec![a, elsewhere]);
}

#[test]
fn test_boarding_respects_capacity_in_queue_order() {
    let config = SimConfig {
        train_capacity: 2,
        ..quiet_config()
    };
    let mut world = SimWorld::with_config(config, Some(3));
    let s1 = world.add_station(Position::new(0.0, 0.0));
    let s2 = world.add_station(Position::new(100.0, 0.0));
    let line = world.add_line("Gold", "#FFD700");
    world.extend_line(line, s2).unwrap();
    world.extend_line(line, s1).unwrap();
    let train = world.add_train(line).unwrap();

    let ids: Vec<_> = (0..5).map(|_| world.add_passenger(s1, s2).unwrap()).collect();

    for _ in 0..4 {
        world.tick(10.0);
        world.check_invariants().unwrap();
    }

    let t = world.train(train).unwrap();
    let boarded: Vec<_> = t.passengers.iter().map(|p| p.id).collect();
    assert_eq!(boarded, ids[..2].to_vec());
    assert_eq!(world.station(s1).unwrap().passengers.len(), 3);
}

/// Alighting frees seats before boarding at the same stop
#[test]
fn test_alighting_frees_capacity_for_boarding() {
    let config = SimConfig {
        train_capacity: 1,
        ..quiet_config()
    };
    let mut world = SimWorld::with_config(config, Some(3));
    let a = world.add_station(Position::new(0.0, 0.0));
    let b = world.add_station(Position::new(100.0, 0.0));
    let c = world.add_station(Position::new(200.0, 0.0));
    let line = world.add_line("Pink", "#FF69B4");
    for s in [a, b, c] {
        world.extend_line(line, s).unwrap();
    }
    let train = world.add_train(line).unwrap();

    // Fill the only seat at b first
    world.add_passenger(b, c).unwrap();
    for _ in 0..4 {
        world.tick(10.0);
    }
    assert_eq!(world.train(train).unwrap().passengers.len(), 1);

    world.add_passenger(c, b).unwrap();
    for _ in 0..4 {
        world.tick(10.0);
    }

    // At c: the rider got off, and the waiting passenger took the seat
    let t = world.train(train).unwrap();
    assert_eq!(world.passengers_served(), 1);
    assert_eq!(t.passengers.len(), 1);
    assert_eq!(t.passengers[0].destination, b);
}

/// A speed change at 0.5 halves progress on the targeted line only
#[test]
fn test_speed_change_halves_progress() {
    let mut world = SimWorld::with_config(quiet_config(), Some(3));
    let s1 = world.add_station(Position::new(0.0, 0.0));
    let s2 = world.add_station(Position::new(100.0, 0.0));
    let slow = world.add_line("Slow", "#6A5ACD");
    let normal = world.add_line("Normal", "#00CED1");
    for line in [slow, normal] {
        world.extend_line(line, s1).unwrap();
        world.extend_line(line, s2).unwrap();
    }
    let slow_train = world.add_train(slow).unwrap();
    let normal_train = world.add_train(normal).unwrap();

    assert!(world.install_event(speed_event(slow, 0.5)));
    world.tick(10.0);

    assert_eq!(world.train(slow_train).unwrap().progress, 0.125);
    assert_eq!(world.train(normal_train).unwrap().progress, 0.25);
}

#[test]
fn test_scheduler_skips_train_with_missing_line() {
    let scheduler = TrainScheduler::new(0.5, 10);
    let mut trains = BTreeMap::new();
    let train_id = TrainId(SimId(1));
    let mut train = SimTrain::new(train_id, LineId(SimId(99)));
    train.progress = 0.75;
    trains.insert(train_id, train);

    let mut stations = BTreeMap::new();
    let lines = BTreeMap::new();
    let mut stats = ServiceStats::new();
    let arrivals = scheduler.update_trains(
        &mut trains,
        &mut stations,
        &lines,
        &EventModifier::new(),
        &mut stats,
        0.0,
    );

    assert!(arrivals.is_empty());
    assert_eq!(trains[&train_id].progress, 0.75);
}

/// An unresolvable next station leaves the train exactly as it was
#[test]
fn test_scheduler_holds_train_on_unresolvable_station() {
    let scheduler = TrainScheduler::new(0.5, 10);
    let s1 = StationId(SimId(1));
    let s2 = StationId(SimId(2));
    let line_id = LineId(SimId(3));
    let train_id = TrainId(SimId(4));

    let mut stations = BTreeMap::new();
    stations.insert(s1, SimStation::new(s1, "One".into(), Position::new(0.0, 0.0)));
    // s2 is referenced by the line but missing from the station map

    let mut line = SimLine::new(line_id, "Broken".into(), "#000000".into());
    line.stations = vec![s1, s2];
    let mut lines = BTreeMap::new();
    lines.insert(line_id, line);

    let mut train = SimTrain::new(train_id, line_id);
    train.progress = 0.75;
    train.passengers.push(SimPassenger::new(PassengerId(SimId(5)), s1, s2, 0.0));
    let mut trains = BTreeMap::new();
    trains.insert(train_id, train);

    let mut stats = ServiceStats::new();
    let arrivals = scheduler.update_trains(
        &mut trains,
        &mut stations,
        &lines,
        &EventModifier::new(),
        &mut stats,
        100.0,
    );

    assert!(arrivals.is_empty());
    let t = &trains[&train_id];
    assert_eq!(t.progress, 0.75);
    assert_eq!(t.current_station_index, 0);
    assert_eq!(t.direction, Direction::Forward);
    assert_eq!(t.passengers.len(), 1);
    assert_eq!(stats.passengers_served, 0);
}

#[test]
fn test_scheduler_reports_arrivals() {
    let scheduler = TrainScheduler::new(1.0, 10);
    let s1 = StationId(SimId(1));
    let s2 = StationId(SimId(2));
    let line_id = LineId(SimId(3));
    let train_id = TrainId(SimId(4));

    let mut stations = BTreeMap::new();
    stations.insert(s1, SimStation::new(s1, "One".into(), Position::new(0.0, 0.0)));
    let mut two = SimStation::new(s2, "Two".into(), Position::new(10.0, 0.0));
    two.passengers.push(SimPassenger::new(PassengerId(SimId(6)), s2, s1, 0.0));
    stations.insert(s2, two);

    let mut line = SimLine::new(line_id, "Line".into(), "#FFFFFF".into());
    line.stations = vec![s1, s2];
    let mut lines = BTreeMap::new();
    lines.insert(line_id, line);

    let mut train = SimTrain::new(train_id, line_id);
    train.passengers.push(SimPassenger::new(PassengerId(SimId(5)), s1, s2, 40.0));
    let mut trains = BTreeMap::new();
    trains.insert(train_id, train);

    let mut stats = ServiceStats::new();
    let arrivals = scheduler.update_trains(
        &mut trains,
        &mut stations,
        &lines,
        &EventModifier::new(),
        &mut stats,
        100.0,
    );

    assert_eq!(arrivals.len(), 1);
    let arrival = &arrivals[0];
    assert_eq!(arrival.station, s2);
    assert_eq!(arrival.station_index, 1);
    assert_eq!(arrival.direction, Direction::Backward);
    assert_eq!(arrival.alighted, 1);
    assert_eq!(arrival.boarded, 1);
    assert_eq!(stats.passengers_served, 1);
    assert_eq!(stats.total_wait_time, 60.0);
    assert_eq!(stats.served_on(line_id), 1);
}
