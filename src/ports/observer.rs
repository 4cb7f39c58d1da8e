//! Observer port - abstraction for simulation observation and data collection
//!
//! Observers get a callback for every trip and tick the simulator runs,
//! so progress bars, metrics and trace export can be composed without the
//! trial loop knowing about any of them.

use std::{cell::RefCell, rc::Rc};

use serde::{Deserialize, Serialize};

use crate::{Result, ports::TickReport, types::Position};

/// How a trip ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripOutcome {
    /// Reached the destination in time
    Arrived,
    /// Deadline ran out first
    DeadlineExpired,
    /// Stopped by the simulator's hard tick limit
    TickLimit,
}

impl TripOutcome {
    pub fn is_success(self) -> bool {
        self == TripOutcome::Arrived
    }
}

/// Totals for one finished trip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TripSummary {
    pub trip: usize,
    pub outcome: TripOutcome,
    pub ticks: u64,
    pub total_reward: f64,
    /// Deadline left when the trip ended
    pub deadline_left: i64,
}

/// Observer trait for monitoring simulation runs
///
/// # Event Sequence
///
/// 1. `on_training_start(total_trips)` - Once at the beginning
/// 2. For each trip:
///    - `on_trip_start(trip, destination)`
///    - `on_tick(trip, report)` - For each tick in the trip
///    - `on_trip_end(summary)`
/// 3. `on_training_end()` - Once at the end
///
/// # Examples
///
/// ```no_run
/// use smartcab::ports::{Observer, TripSummary};
///
/// struct ArrivalCounter {
///     arrivals: usize,
/// }
///
/// impl Observer for ArrivalCounter {
///     fn on_trip_end(&mut self, summary: &TripSummary) -> smartcab::Result<()> {
///         if summary.outcome.is_success() {
///             self.arrivals += 1;
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Observer {
    /// Called when the run starts.
    fn on_training_start(&mut self, _total_trips: usize) -> Result<()> {
        Ok(())
    }

    /// Called when a trip starts, after the world has been reset.
    fn on_trip_start(&mut self, _trip: usize, _destination: Position) -> Result<()> {
        Ok(())
    }

    /// Called after each tick of the primary driver.
    fn on_tick(&mut self, _trip: usize, _report: &TickReport) -> Result<()> {
        Ok(())
    }

    /// Called when a trip ends.
    fn on_trip_end(&mut self, _summary: &TripSummary) -> Result<()> {
        Ok(())
    }

    /// Called when the run completes.
    ///
    /// Use this to finalize outputs, close files, or display summaries.
    fn on_training_end(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Shared observer, so the caller can read it back after the run.
impl<O: Observer + ?Sized> Observer for Rc<RefCell<O>> {
    fn on_training_start(&mut self, total_trips: usize) -> Result<()> {
        self.borrow_mut().on_training_start(total_trips)
    }

    fn on_trip_start(&mut self, trip: usize, destination: Position) -> Result<()> {
        self.borrow_mut().on_trip_start(trip, destination)
    }

    fn on_tick(&mut self, trip: usize, report: &TickReport) -> Result<()> {
        self.borrow_mut().on_tick(trip, report)
    }

    fn on_trip_end(&mut self, summary: &TripSummary) -> Result<()> {
        self.borrow_mut().on_trip_end(summary)
    }

    fn on_training_end(&mut self) -> Result<()> {
        self.borrow_mut().on_training_end()
    }
}
