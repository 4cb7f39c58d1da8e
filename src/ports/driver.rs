//! Driver port - abstraction for anything that can steer the primary car
//!
//! Both the learning agent and the baselines used for comparison implement
//! this trait, so the simulator can run them interchangeably.

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    ports::Environment,
    types::{Action, Position, State},
};

/// What happened during a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Trip the tick belongs to (1-based)
    pub trip: u64,
    /// Tick index within the trip (0-based)
    pub tick: u64,
    /// State the decision was made in
    pub state: State,
    /// Action taken
    pub action: Action,
    /// Value the policy reported for the action
    pub value: f64,
    /// Reward returned by the environment
    pub reward: f64,
    /// Deadline reading before acting
    pub deadline: i64,
    /// New value written to the table this tick, if any
    pub updated: Option<f64>,
}

/// Driver trait - unified interface for everything the simulator can tick
///
/// # Lifecycle
///
/// 1. `reset(destination)` at the start of every trip
/// 2. `update(env)` once per tick until the trip ends
/// 3. `finish()` once after the last trip
///
/// # Examples
///
/// ```no_run
/// use smartcab::{
///     ports::{Driver, Environment},
///     Result,
/// };
///
/// fn drive_one_tick(driver: &mut dyn Driver, env: &mut dyn Environment) -> Result<f64> {
///     Ok(driver.update(env)?.reward)
/// }
/// ```
pub trait Driver {
    /// Start a new trip towards `destination`.
    ///
    /// Called by the simulator between trips, never by the driver itself.
    fn reset(&mut self, destination: Option<Position>) -> Result<()>;

    /// Run one tick: sense, decide, act and learn.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver's state key falls outside its value
    /// table, or if no trip has been started.
    fn update(&mut self, env: &mut dyn Environment) -> Result<TickReport>;

    /// Get the driver's name.
    ///
    /// Used for identification in comparisons and logging.
    fn name(&self) -> &str;

    /// Close out the final trip after the last tick.
    ///
    /// # Default Implementation
    ///
    /// Does nothing, suitable for drivers without trip bookkeeping.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }

    /// Enable downcasting to concrete types.
    fn as_any(&self) -> &dyn std::any::Any;
}
