//! Trial loop driving one driver through a sequence of trips

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::{
    Error, Result,
    ports::{Driver, Environment, Observer, TripOutcome, TripSummary},
    world::GridWorld,
};

/// Simulation configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of trips to run
    pub trials: usize,

    /// Hard cap on ticks per trip, for worlds without an enforced deadline
    pub max_ticks_per_trip: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trials: 100,
            max_ticks_per_trip: 1_000,
        }
    }
}

impl SimulationConfig {
    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.trials == 0 {
            return Err(Error::config("at least one trial is required"));
        }
        if self.max_ticks_per_trip == 0 {
            return Err(Error::config("max ticks per trip must be positive"));
        }
        Ok(())
    }
}

/// Result of a simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Name of the driver
    pub driver: String,

    /// Trips run
    pub trials: usize,

    /// Trips that reached the destination in time
    pub successes: usize,

    /// Trips that ran out of deadline
    pub deadline_misses: usize,

    /// Trips cut off by the tick limit
    pub tick_limit_hits: usize,

    /// Fraction of successful trips
    pub success_rate: f64,

    /// Sum of all rewards
    pub total_reward: f64,

    /// Mean reward per trip
    pub mean_reward: f64,

    /// Standard deviation of reward per trip
    pub reward_std_dev: f64,

    /// Mean ticks per trip
    pub mean_ticks: f64,

    /// Total reward of each trip, in order
    pub trip_rewards: Vec<f64>,
}

impl SimulationResult {
    /// Summarise a run from its trip summaries
    pub fn new(driver: impl Into<String>, trips: &[TripSummary]) -> Self {
        let count = |outcome: TripOutcome| trips.iter().filter(|t| t.outcome == outcome).count();
        let trip_rewards: Vec<f64> = trips.iter().map(|t| t.total_reward).collect();
        let successes = count(TripOutcome::Arrived);

        let (mean_reward, reward_std_dev) = match trip_rewards.len() {
            0 => (0.0, 0.0),
            1 => (trip_rewards[0], 0.0),
            _ => (trip_rewards.iter().mean(), trip_rewards.iter().std_dev()),
        };
        let mean_ticks = if trips.is_empty() {
            0.0
        } else {
            trips.iter().map(|t| t.ticks as f64).sum::<f64>() / trips.len() as f64
        };

        Self {
            driver: driver.into(),
            trials: trips.len(),
            successes,
            deadline_misses: count(TripOutcome::DeadlineExpired),
            tick_limit_hits: count(TripOutcome::TickLimit),
            success_rate: if trips.is_empty() {
                0.0
            } else {
                successes as f64 / trips.len() as f64
            },
            total_reward: trip_rewards.iter().sum(),
            mean_reward,
            reward_std_dev,
            mean_ticks,
            trip_rewards,
        }
    }

    /// Save result to JSON file
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load result from JSON file
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let result = serde_json::from_reader(file)?;
        Ok(result)
    }
}

/// Success rate over the last `window` trips
pub fn recent_success_rate(trips: &[TripSummary], window: usize) -> f64 {
    let tail = &trips[trips.len().saturating_sub(window)..];
    if tail.is_empty() {
        0.0
    } else {
        tail.iter().filter(|t| t.outcome.is_success()).count() as f64 / tail.len() as f64
    }
}

/// Runs trips of a [`GridWorld`] with a single primary driver
pub struct Simulator {
    config: SimulationConfig,
    observers: Vec<Box<dyn Observer>>,
    trips: Vec<TripSummary>,
}

impl Simulator {
    /// Create a new simulator
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
            trips: Vec::new(),
        }
    }

    /// Add an observer to the simulator
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Per-trip summaries of the last run
    pub fn trips(&self) -> &[TripSummary] {
        &self.trips
    }

    /// Run `config.trials` trips with `driver` steering the primary car
    pub fn run(&mut self, world: &mut GridWorld, driver: &mut dyn Driver) -> Result<SimulationResult> {
        self.config.validate()?;
        self.trips.clear();

        for observer in &mut self.observers {
            observer.on_training_start(self.config.trials)?;
        }

        for trip in 0..self.config.trials {
            let summary = self.run_trip(trip, world, driver)?;
            for observer in &mut self.observers {
                observer.on_trip_end(&summary)?;
            }
            log::info!(
                "{}: trip {} {:?} after {} ticks, reward {:.2}",
                driver.name(),
                trip + 1,
                summary.outcome,
                summary.ticks,
                summary.total_reward
            );
            self.trips.push(summary);
        }

        driver.finish()?;
        for observer in &mut self.observers {
            observer.on_training_end()?;
        }

        Ok(SimulationResult::new(driver.name(), &self.trips))
    }

    fn run_trip(
        &mut self,
        trip: usize,
        world: &mut GridWorld,
        driver: &mut dyn Driver,
    ) -> Result<TripSummary> {
        let destination = world.reset();
        driver.reset(Some(destination))?;
        for observer in &mut self.observers {
            observer.on_trip_start(trip, destination)?;
        }

        let mut ticks = 0;
        let mut total_reward = 0.0;
        let outcome = loop {
            world.advance();
            let report = driver.update(world)?;
            total_reward += report.reward;
            for observer in &mut self.observers {
                observer.on_tick(trip, &report)?;
            }
            world.end_tick();
            ticks += 1;

            if let Some(outcome) = world.outcome() {
                break outcome;
            }
            if ticks >= self.config.max_ticks_per_trip {
                log::warn!(
                    "{}: trip {} stopped after {ticks} ticks without reaching {destination}",
                    driver.name(),
                    trip + 1
                );
                break TripOutcome::TickLimit;
            }
        };

        Ok(TripSummary {
            trip,
            outcome,
            ticks,
            total_reward,
            deadline_left: world.deadline(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(trip: usize, outcome: TripOutcome, reward: f64) -> TripSummary {
        TripSummary {
            trip,
            outcome,
            ticks: 10,
            total_reward: reward,
            deadline_left: 0,
        }
    }

    #[test]
    fn result_counts_outcomes() {
        let trips = vec![
            summary(0, TripOutcome::Arrived, 12.0),
            summary(1, TripOutcome::DeadlineExpired, -3.0),
            summary(2, TripOutcome::Arrived, 15.0),
            summary(3, TripOutcome::TickLimit, 0.0),
        ];
        let result = SimulationResult::new("test", &trips);
        assert_eq!(result.trials, 4);
        assert_eq!(result.successes, 2);
        assert_eq!(result.deadline_misses, 1);
        assert_eq!(result.tick_limit_hits, 1);
        assert_eq!(result.success_rate, 0.5);
        assert_eq!(result.total_reward, 24.0);
        assert_eq!(result.mean_reward, 6.0);
        assert!(result.reward_std_dev > 0.0);
        assert_eq!(result.mean_ticks, 10.0);
        assert_eq!(recent_success_rate(&trips, 2), 0.5);
        assert_eq!(recent_success_rate(&trips, 1), 0.0);
        assert_eq!(recent_success_rate(&[], 5), 0.0);
    }

    #[test]
    fn empty_result_is_all_zero() {
        let result = SimulationResult::new("none", &[]);
        assert_eq!(result.success_rate, 0.0);
        assert_eq!(result.mean_reward, 0.0);
        assert_eq!(result.reward_std_dev, 0.0);
    }

    #[test]
    fn zero_trials_rejected() {
        assert!(SimulationConfig::default().with_trials(0).validate().is_err());
    }
}
