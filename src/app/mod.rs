//! Application layer: configuration for building agents.
//!
//! # Usage
//!
//! ```
//! use smartcab::app::AgentConfig;
//! use smartcab::q_learning::{LearningAgent, NextStateTiming, StateFields, UpdateRule};
//!
//! let config = AgentConfig::new(UpdateRule::canonical_td())
//!     .with_state_fields(StateFields::Full)
//!     .with_timing(NextStateTiming::Deferred)
//!     .with_seed(42);
//! let agent = LearningAgent::new(config)?;
//! # Ok::<(), smartcab::Error>(())
//! ```

pub mod config;

pub use config::{AgentConfig, DEFAULT_Q_INIT};
