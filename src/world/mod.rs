//! Reference grid world implementing the [`Environment`](crate::ports::Environment) port
//!
//! A small toroidal city: traffic lights at every intersection, a handful of
//! randomly wandering cars, and one primary car that a driver steers towards
//! a destination under a deadline.

pub mod grid;
pub mod planner;
pub mod traffic;

pub use grid::{
    ARRIVAL_BONUS, Car, DETOUR_PENALTY, GridWorld, ILLEGAL_PENALTY, WAYPOINT_REWARD, WorldConfig,
};
pub use planner::RoutePlanner;
pub use traffic::{Heading, TrafficLight, is_legal};
