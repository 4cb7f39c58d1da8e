//! Smartcab: a tabular Q-learning driver for a small grid-world city
//!
//! This crate provides:
//! - State encoding of traffic percepts and route-planner waypoints
//! - Q-value table, explore/exploit policy and three value update rules
//! - A learning agent with per-trip bookkeeping
//! - A reference grid world with traffic lights and wandering cars
//! - A simulation pipeline with composable observers and baseline drivers

pub mod app;
pub mod cli;
pub mod error;
pub mod pipeline;
pub mod ports;
pub mod q_learning;
pub mod types;
pub mod world;

pub use error::{Error, Result};
pub use types::{Action, Light, Percept, Position, State};
