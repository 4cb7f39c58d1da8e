//! Configuration types for agent creation.

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    q_learning::{NextStateTiming, StateFields, UpdateRule},
};

/// Optimistic initial Q-value.
///
/// Above the largest discounted return the grid world can pay out under the
/// stock discount factors, so untried actions look better than tried ones.
pub const DEFAULT_Q_INIT: f64 = 25.0;

/// Configuration for creating a learning agent.
///
/// # Examples
///
/// ```
/// use smartcab::app::AgentConfig;
/// use smartcab::q_learning::{StateFields, UpdateRule};
///
/// let config = AgentConfig::new(UpdateRule::online_td())
///     .with_state_fields(StateFields::LightWaypoint)
///     .with_q_init(3.14159265)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Value update rule and its parameters
    pub rule: UpdateRule,
    /// Percept fields included in the state key
    pub fields: StateFields,
    /// When the successor state is sensed for bootstrapping
    pub timing: NextStateTiming,
    /// Initial value for every state-action pair
    pub q_init: f64,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl AgentConfig {
    /// Create a configuration for the given update rule.
    ///
    /// Uses default values for other parameters:
    /// - State fields: `StateFields::Full`
    /// - Timing: `NextStateTiming::Resensed`
    /// - Initial value: [`DEFAULT_Q_INIT`]
    /// - Seed: None (non-deterministic)
    pub fn new(rule: UpdateRule) -> Self {
        Self {
            rule,
            fields: StateFields::default(),
            timing: NextStateTiming::default(),
            q_init: DEFAULT_Q_INIT,
            seed: None,
        }
    }

    pub fn with_state_fields(mut self, fields: StateFields) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_timing(mut self, timing: NextStateTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_q_init(mut self, q_init: f64) -> Self {
        self.q_init = q_init;
        self
    }

    /// Set the random seed for deterministic behavior.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check rule parameters and the initial value.
    pub fn validate(&self) -> Result<()> {
        self.rule.validate()?;
        if !self.q_init.is_finite() || self.q_init <= 0.0 {
            return Err(Error::config(format!(
                "initial Q-value must be positive and finite, got {}",
                self.q_init
            )));
        }
        Ok(())
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new(UpdateRule::default())
    }
}
