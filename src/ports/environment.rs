//! Environment port - what a driving agent can ask of the world

use crate::types::{Action, Percept};

/// The world as seen from the primary car.
///
/// Implementations own traffic rules, rewards, routing and the deadline
/// countdown; the agent only senses, asks for directions and acts.
pub trait Environment {
    /// Light color and surrounding traffic at the car's intersection.
    fn sense(&self) -> Percept;

    /// Ticks left before the trip is failed.
    fn deadline(&self) -> i64;

    /// Direction the route planner suggests next.
    ///
    /// Returns `Action::None` once the destination has been reached.
    fn next_waypoint(&self) -> Action;

    /// Execute `action` (legal or not) and return the reward it earned.
    ///
    /// Legal moves relocate the car as a side effect.
    fn act(&mut self, action: Action) -> f64;
}
