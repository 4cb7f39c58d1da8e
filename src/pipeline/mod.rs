//! Simulation pipeline abstractions
//!
//! This module provides composable pipelines for:
//! - Running a driver through a sequence of trips
//! - Comparing multiple drivers on identically seeded worlds
//! - Recording observations during a run

pub mod comparison;
pub mod observers;
pub mod simulator;

pub use comparison::{ComparisonResult, RandomDriver, WaypointDriver, compare_drivers};
pub use observers::{
    JsonlObserver, MetricsObserver, MetricsSummary, MilestoneObserver, ProgressObserver,
    StepObservation, TripObservation,
};
pub use simulator::{SimulationConfig, SimulationResult, Simulator, recent_success_rate};

pub use crate::ports::{Driver, Observer};
