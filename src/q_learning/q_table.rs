//! Q-table implementation for temporal difference learning

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    types::{Action, State},
};

/// Q-table mapping (state, action) pairs to Q-values
///
/// Every key the encoder can produce is allocated up front with the
/// optimistic initial value; lookups outside that key space are errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QTable {
    /// Q-values: state -> one value per action, indexed by `Action::index`
    q_values: HashMap<State, [f64; Action::COUNT]>,
    /// Initial Q-value for every state-action pair
    q_init: f64,
}

impl QTable {
    /// Create a Q-table covering `key_space`
    pub fn new(key_space: impl IntoIterator<Item = State>, q_init: f64) -> Result<Self> {
        if !q_init.is_finite() || q_init <= 0.0 {
            return Err(Error::config(format!(
                "initial Q-value must be positive and finite, got {q_init}"
            )));
        }
        let q_values = key_space
            .into_iter()
            .map(|state| (state, [q_init; Action::COUNT]))
            .collect();
        Ok(Self { q_values, q_init })
    }

    fn row(&self, state: &State) -> Result<&[f64; Action::COUNT]> {
        self.q_values
            .get(state)
            .ok_or(Error::UnknownState { state: *state })
    }

    /// Get Q-value for a state-action pair
    pub fn get(&self, state: &State, action: Action) -> Result<f64> {
        Ok(self.row(state)?[action.index()])
    }

    /// Overwrite the Q-value for a state-action pair
    pub fn set(&mut self, state: &State, action: Action, value: f64) -> Result<()> {
        let row = self
            .q_values
            .get_mut(state)
            .ok_or(Error::UnknownState { state: *state })?;
        row[action.index()] = value;
        Ok(())
    }

    /// All action values for a state, in action order
    pub fn values(&self, state: &State) -> Result<[f64; Action::COUNT]> {
        self.row(state).copied()
    }

    /// Highest-valued action and its value
    ///
    /// Ties go to the action that comes first in `Action::ALL`.
    pub fn best(&self, state: &State) -> Result<(Action, f64)> {
        let row = self.row(state)?;
        let mut best = (Action::ALL[0], row[0]);
        for action in &Action::ALL[1..] {
            let value = row[action.index()];
            if value > best.1 {
                best = (*action, value);
            }
        }
        Ok(best)
    }

    /// Maximum Q-value over all actions in a state
    pub fn max_value(&self, state: &State) -> Result<f64> {
        self.best(state).map(|(_, value)| value)
    }

    pub fn contains(&self, state: &State) -> bool {
        self.q_values.contains_key(state)
    }

    pub fn q_init(&self) -> f64 {
        self.q_init
    }

    /// Number of states in the table
    pub fn len(&self) -> usize {
        self.q_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q_values.is_empty()
    }

    /// Number of state-action entries that moved away from the initial value
    pub fn visited(&self) -> usize {
        self.q_values
            .values()
            .flat_map(|row| row.iter())
            .filter(|&&value| value != self.q_init)
            .count()
    }

    /// Number of states with at least one entry away from the initial value
    pub fn visited_states(&self) -> usize {
        self.q_values
            .values()
            .filter(|row| row.iter().any(|&value| value != self.q_init))
            .count()
    }
}
