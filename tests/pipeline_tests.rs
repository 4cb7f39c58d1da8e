//! Tests for the simulator, observers and driver comparison

use std::{cell::RefCell, rc::Rc};

use smartcab::{
    app::AgentConfig,
    pipeline::{
        JsonlObserver, MetricsObserver, RandomDriver, SimulationConfig, Simulator,
        TripObservation, WaypointDriver, compare_drivers,
    },
    ports::Driver,
    q_learning::{LearningAgent, NextStateTiming},
    world::{GridWorld, WorldConfig},
};
use tempfile::tempdir;

fn world(seed: u64) -> GridWorld {
    GridWorld::new(WorldConfig::default().with_seed(seed)).unwrap()
}

#[test]
fn outcome_counts_add_up() {
    let mut agent = LearningAgent::new(AgentConfig::default().with_seed(1)).unwrap();
    let mut simulator = Simulator::new(SimulationConfig::default().with_trials(20));
    let result = simulator.run(&mut world(1), &mut agent).unwrap();

    assert_eq!(result.trials, 20);
    assert_eq!(
        result.successes + result.deadline_misses + result.tick_limit_hits,
        20
    );
    assert_eq!(result.trip_rewards.len(), 20);
    assert!((0.0..=1.0).contains(&result.success_rate));
    assert_eq!(simulator.trips().len(), 20);

    // the agent closes its last trip when the run finishes
    assert_eq!(agent.trip_log().trip_rewards().len(), 20);
    assert!(!agent.trip_log().in_trip());
    for (logged, summary) in agent.trip_log().trip_rewards().iter().zip(simulator.trips()) {
        assert!((logged - summary.total_reward).abs() < 1e-9);
    }
}

#[test]
fn identical_seeds_reproduce_results() {
    let run = || {
        let config = AgentConfig::default()
            .with_seed(7)
            .with_timing(NextStateTiming::Deferred);
        let mut agent = LearningAgent::new(config).unwrap();
        let mut simulator = Simulator::new(SimulationConfig::default().with_trials(15));
        simulator.run(&mut world(7), &mut agent).unwrap()
    };
    let first = run();
    let second = run();
    assert_eq!(first.trip_rewards, second.trip_rewards);
    assert_eq!(first.successes, second.successes);
}

#[test]
fn waypoint_baseline_arrives_without_traffic() {
    let config = WorldConfig::default()
        .with_seed(3)
        .with_dummies(0)
        .with_enforce_deadline(false);
    let mut grid = GridWorld::new(config).unwrap();
    let mut driver = WaypointDriver::new("waypoint");
    let mut simulator = Simulator::new(SimulationConfig::default().with_trials(10));
    let result = simulator.run(&mut grid, &mut driver).unwrap();
    assert_eq!(result.successes, 10);
}

#[test]
fn observers_see_every_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trips.jsonl");
    let metrics = Rc::new(RefCell::new(MetricsObserver::new()));

    let mut driver = RandomDriver::with_seed("random", 4);
    let mut simulator = Simulator::new(SimulationConfig::default().with_trials(5))
        .with_observer(Box::new(Rc::clone(&metrics)))
        .with_observer(Box::new(JsonlObserver::new(&path).unwrap()));
    let result = simulator.run(&mut world(4), &mut driver).unwrap();

    let summary = metrics.borrow().summary();
    assert_eq!(summary.total_trips, 5);
    assert_eq!(summary.arrivals, result.successes);

    let contents = std::fs::read_to_string(&path).unwrap();
    let trips: Vec<TripObservation> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(trips.len(), 5);
    for (trip, summary) in trips.iter().zip(simulator.trips()) {
        assert_eq!(trip.steps.len() as u64, summary.ticks);
        assert_eq!(trip.outcome, summary.outcome);
    }
}

#[test]
fn comparison_runs_every_driver_and_exports_csv() {
    let drivers: Vec<Box<dyn Driver>> = vec![
        Box::new(LearningAgent::new(AgentConfig::default().with_seed(2)).unwrap()),
        Box::new(RandomDriver::with_seed("random", 2)),
        Box::new(WaypointDriver::new("waypoint")),
    ];
    let comparison = compare_drivers(
        drivers,
        WorldConfig::default().with_seed(9),
        SimulationConfig::default().with_trials(8),
    )
    .unwrap();

    let names: Vec<_> = comparison.results.iter().map(|r| r.driver.as_str()).collect();
    assert_eq!(names, ["Q-canonical-td", "random", "waypoint"]);
    assert!(comparison.best().is_some());

    let dir = tempdir().unwrap();
    let path = dir.path().join("comparison.csv");
    comparison.export_csv(&path).unwrap();
    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "driver");
    assert_eq!(reader.records().count(), 3);
}

#[test]
fn zero_trials_rejected() {
    let mut driver = RandomDriver::with_seed("random", 1);
    let mut simulator = Simulator::new(SimulationConfig::default().with_trials(0));
    assert!(simulator.run(&mut world(1), &mut driver).is_err());
}
