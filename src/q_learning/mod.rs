//! Tabular Q-learning for the smartcab driver
//!
//! This module holds the learning core: how percepts become state keys, how
//! values are stored, how actions are picked, and how values are updated.
//!
//! ## Components
//!
//! - [`StateEncoder`]: percepts + waypoint → [`State`](crate::types::State)
//! - [`QTable`]: preallocated `(state, action) → value` table
//! - [`explore_exploit`]: random action with probability `1 / (trip + 0.9)`,
//!   otherwise the best-valued one
//! - [`UpdateRule`]: the three value update rules
//! - [`TripLog`]: per-trip reward and missed-deadline record
//! - [`LearningAgent`]: ties everything together behind the
//!   [`Driver`](crate::ports::Driver) port
//!
//! ## Update rules
//!
//! | Rule | Looks ahead | Step size | Status |
//! |------|-------------|-----------|--------|
//! | Discounted backup | no | none | historical |
//! | Online TD | sampled next action | α = 0.98 | historical |
//! | Canonical TD(0) | greedy next action | α = 0.8 | reference |
//!
//! ## Usage Example
//!
//! ```no_run
//! use smartcab::app::AgentConfig;
//! use smartcab::q_learning::{LearningAgent, UpdateRule};
//!
//! let agent = LearningAgent::new(AgentConfig::new(UpdateRule::canonical_td()).with_seed(1))?;
//! assert_eq!(agent.q_table().len(), 512);
//! # Ok::<(), smartcab::Error>(())
//! ```

pub mod agent;
pub mod bookkeeping;
pub mod encoder;
pub mod policy;
pub mod q_table;
pub mod update;

// Public re-exports
pub use agent::LearningAgent;
pub use bookkeeping::TripLog;
pub use encoder::{StateEncoder, StateFields};
pub use policy::{EXPLORATION_OFFSET, explore_exploit, exploration_probability};
pub use q_table::QTable;
pub use update::{Bootstrap, NextStateTiming, RuleKind, UpdateRule};
