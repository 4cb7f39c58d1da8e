//! Comparison framework for evaluating multiple drivers
//!
//! Every driver is run through its own world built from the same
//! [`WorldConfig`], so with a fixed world seed all of them face the same
//! sequence of trips. Two baselines are provided:
//! - [`RandomDriver`] picks uniformly among all actions
//! - [`WaypointDriver`] follows the route planner whenever the move is legal

use std::path::Path;

use rand::{SeedableRng, rngs::StdRng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    pipeline::simulator::{SimulationConfig, SimulationResult, Simulator},
    ports::{Driver, Environment, TickReport},
    types::{Action, Position, State},
    world::{GridWorld, WorldConfig, is_legal},
};

/// Bookkeeping shared by the baselines, which never learn.
#[derive(Debug, Default)]
struct BaselineTrip {
    trip: u64,
    tick: u64,
}

impl BaselineTrip {
    fn reset(&mut self) {
        self.trip += 1;
        self.tick = 0;
    }

    fn report(&mut self, env: &mut dyn Environment, action: Action) -> TickReport {
        let waypoint = env.next_waypoint();
        let percept = env.sense();
        let deadline = env.deadline();
        let reward = env.act(action);
        let report = TickReport {
            trip: self.trip,
            tick: self.tick,
            state: State::new(
                percept.light,
                waypoint,
                percept.oncoming,
                percept.left,
                percept.right,
            ),
            action,
            value: 0.0,
            reward,
            deadline,
            updated: None,
        };
        self.tick += 1;
        report
    }
}

/// Random baseline
pub struct RandomDriver {
    name: String,
    rng: StdRng,
    trip: BaselineTrip,
}

impl RandomDriver {
    /// Create a new random driver
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rng: StdRng::from_rng(&mut rand::rng()),
            trip: BaselineTrip::default(),
        }
    }

    /// Create a new random driver with a deterministic seed
    pub fn with_seed(name: impl Into<String>, seed: u64) -> Self {
        Self {
            name: name.into(),
            rng: StdRng::seed_from_u64(seed),
            trip: BaselineTrip::default(),
        }
    }
}

impl Driver for RandomDriver {
    fn reset(&mut self, _destination: Option<Position>) -> Result<()> {
        self.trip.reset();
        Ok(())
    }

    fn update(&mut self, env: &mut dyn Environment) -> Result<TickReport> {
        let action = *Action::ALL.choose(&mut self.rng).unwrap_or(&Action::None);
        Ok(self.trip.report(env, action))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Planner-following baseline
///
/// Takes the waypoint when traffic rules allow it and waits otherwise.
pub struct WaypointDriver {
    name: String,
    trip: BaselineTrip,
}

impl WaypointDriver {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            trip: BaselineTrip::default(),
        }
    }
}

impl Driver for WaypointDriver {
    fn reset(&mut self, _destination: Option<Position>) -> Result<()> {
        self.trip.reset();
        Ok(())
    }

    fn update(&mut self, env: &mut dyn Environment) -> Result<TickReport> {
        let waypoint = env.next_waypoint();
        let action = if is_legal(waypoint, &env.sense()) {
            waypoint
        } else {
            Action::None
        };
        Ok(self.trip.report(env, action))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Results of a comparison, one per driver in input order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub results: Vec<SimulationResult>,
}

/// Row of the CSV export
#[derive(Debug, Serialize)]
struct ComparisonRow<'a> {
    driver: &'a str,
    trials: usize,
    successes: usize,
    success_rate: f64,
    deadline_misses: usize,
    mean_reward: f64,
    reward_std_dev: f64,
    mean_ticks: f64,
}

impl ComparisonResult {
    /// Driver with the highest success rate, ties broken by mean reward
    pub fn best(&self) -> Option<&SimulationResult> {
        self.results.iter().max_by(|a, b| {
            a.success_rate
                .total_cmp(&b.success_rate)
                .then(a.mean_reward.total_cmp(&b.mean_reward))
        })
    }

    /// Write one CSV row per driver
    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for result in &self.results {
            writer.serialize(ComparisonRow {
                driver: &result.driver,
                trials: result.trials,
                successes: result.successes,
                success_rate: result.success_rate,
                deadline_misses: result.deadline_misses,
                mean_reward: result.mean_reward,
                reward_std_dev: result.reward_std_dev,
                mean_ticks: result.mean_ticks,
            })?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Run every driver against a fresh world built from `world`
pub fn compare_drivers(
    drivers: Vec<Box<dyn Driver>>,
    world: WorldConfig,
    sim: SimulationConfig,
) -> Result<ComparisonResult> {
    world.validate()?;
    sim.validate()?;

    let mut results = Vec::with_capacity(drivers.len());
    for mut driver in drivers {
        log::info!("comparing {} over {} trials", driver.name(), sim.trials);
        let mut grid = GridWorld::new(world)?;
        let mut simulator = Simulator::new(sim);
        results.push(simulator.run(&mut grid, driver.as_mut())?);
    }
    Ok(ComparisonResult { results })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Light, Percept};

    struct RedLight {
        acted: Vec<Action>,
    }

    impl Environment for RedLight {
        fn sense(&self) -> Percept {
            Percept::new(Light::Red)
        }

        fn deadline(&self) -> i64 {
            5
        }

        fn next_waypoint(&self) -> Action {
            Action::Forward
        }

        fn act(&mut self, action: Action) -> f64 {
            self.acted.push(action);
            0.0
        }
    }

    #[test]
    fn waypoint_driver_waits_at_red() {
        let mut env = RedLight { acted: Vec::new() };
        let mut driver = WaypointDriver::new("waypoint");
        driver.reset(None).unwrap();
        let report = driver.update(&mut env).unwrap();
        assert_eq!(report.action, Action::None);
        assert_eq!(report.trip, 1);
        assert_eq!(report.state.waypoint, Action::Forward);
        assert_eq!(env.acted, vec![Action::None]);
    }

    #[test]
    fn seeded_random_driver_repeats_itself() {
        let actions = |seed| {
            let mut env = RedLight { acted: Vec::new() };
            let mut driver = RandomDriver::with_seed("random", seed);
            driver.reset(None).unwrap();
            for _ in 0..20 {
                driver.update(&mut env).unwrap();
            }
            env.acted
        };
        assert_eq!(actions(3), actions(3));
    }

    #[test]
    fn best_prefers_success_then_reward() {
        let mut a = SimulationResult::new("a", &[]);
        a.success_rate = 0.5;
        a.mean_reward = 1.0;
        let mut b = a.clone();
        b.driver = "b".into();
        b.mean_reward = 3.0;
        let mut c = a.clone();
        c.driver = "c".into();
        c.success_rate = 0.2;
        c.mean_reward = 9.0;

        let comparison = ComparisonResult {
            results: vec![a, b, c],
        };
        assert_eq!(comparison.best().map(|r| r.driver.as_str()), Some("b"));
    }
}
