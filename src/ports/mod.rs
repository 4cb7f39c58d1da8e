//! Ports (trait boundaries) between the learning agent and its surroundings.
//!
//! The agent only ever talks to the world through [`Environment`]; the
//! simulator only ever talks to agents through [`Driver`] and reports what
//! happened through [`Observer`]s.

pub mod driver;
pub mod environment;
pub mod observer;

pub use driver::{Driver, TickReport};
pub use environment::Environment;
pub use observer::{Observer, TripOutcome, TripSummary};
