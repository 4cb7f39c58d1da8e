//! Value update rules
//!
//! Three rules are kept side by side so their behaviour can be compared:
//!
//! | Rule | Formula | γ | α |
//! |------|---------|---|---|
//! | `DiscountedBackup` | `r + γ·Q(s,a)` | 0.5 | - |
//! | `OnlineTd` | `Q + α(r + γ·Q(s',a') - Q)`, `a'` from the policy | 0.55 | 0.98 |
//! | `CanonicalTd` | `(1-α)Q + α(r + γ·max Q(s',·))` | 0.5 | 0.8 |
//!
//! `CanonicalTd` is the reference rule. The other two are historical
//! baselines: the backup has no step size and never looks ahead, and the
//! online rule bootstraps off a sampled rather than greedy successor action.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    q_learning::q_table::QTable,
    types::{Action, State},
};

/// Label for each rule, used on the command line and in reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKind {
    DiscountedBackup,
    OnlineTd,
    #[default]
    CanonicalTd,
}

impl RuleKind {
    pub const ALL: [RuleKind; 3] = [
        RuleKind::DiscountedBackup,
        RuleKind::OnlineTd,
        RuleKind::CanonicalTd,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::DiscountedBackup => "discounted-backup",
            RuleKind::OnlineTd => "online-td",
            RuleKind::CanonicalTd => "canonical-td",
        }
    }

    /// Rule with this label and its stock parameters.
    pub fn default_rule(self) -> UpdateRule {
        match self {
            RuleKind::DiscountedBackup => UpdateRule::discounted_backup(),
            RuleKind::OnlineTd => UpdateRule::online_td(),
            RuleKind::CanonicalTd => UpdateRule::canonical_td(),
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discounted-backup" | "backup" | "a" => Ok(RuleKind::DiscountedBackup),
            "online-td" | "online" | "b" => Ok(RuleKind::OnlineTd),
            "canonical-td" | "canonical" | "td0" | "c" => Ok(RuleKind::CanonicalTd),
            _ => Err(Error::ParseToken {
                kind: "update rule".to_string(),
                input: s.to_string(),
                expected: "discounted-backup, online-td, canonical-td".to_string(),
            }),
        }
    }
}

/// Where the bootstrap value for the successor state comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bootstrap {
    /// The rule does not look at the next state.
    Ignored,
    /// Value of an action drawn by the explore/exploit policy.
    ChosenAction,
    /// Maximum value over the next state's actions.
    BestAction,
}

/// When the successor state used for bootstrapping is observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NextStateTiming {
    /// Sense again right after acting, within the same tick.
    ///
    /// The world has not advanced yet (lights and other cars are unchanged),
    /// so this is only an approximation of the true successor.
    #[default]
    Resensed,
    /// Hold the update until the next tick has been sensed.
    Deferred,
}

impl NextStateTiming {
    pub fn as_str(self) -> &'static str {
        match self {
            NextStateTiming::Resensed => "resensed",
            NextStateTiming::Deferred => "deferred",
        }
    }
}

impl fmt::Display for NextStateTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NextStateTiming {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "resensed" | "immediate" => Ok(NextStateTiming::Resensed),
            "deferred" | "delayed" => Ok(NextStateTiming::Deferred),
            _ => Err(Error::ParseToken {
                kind: "next-state timing".to_string(),
                input: s.to_string(),
                expected: "resensed, deferred".to_string(),
            }),
        }
    }
}

/// A value update rule with its own discount factor and learning rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum UpdateRule {
    /// `Q(s,a) ← r + γ·Q(s,a)`
    DiscountedBackup { discount_factor: f64 },
    /// `Q(s,a) ← Q(s,a) + α[r + γ·Q(s',a') - Q(s,a)]`
    OnlineTd {
        discount_factor: f64,
        learning_rate: f64,
    },
    /// `Q(s,a) ← (1-α)·Q(s,a) + α[r + γ·max_a' Q(s',a')]`
    CanonicalTd {
        discount_factor: f64,
        learning_rate: f64,
    },
}

impl Default for UpdateRule {
    fn default() -> Self {
        Self::canonical_td()
    }
}

fn check_unit_interval(name: &str, value: f64) -> Result<()> {
    if (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::config(format!("{name} must be in [0, 1), got {value}")))
    }
}

impl UpdateRule {
    pub fn discounted_backup() -> Self {
        UpdateRule::DiscountedBackup {
            discount_factor: 0.5,
        }
    }

    pub fn online_td() -> Self {
        UpdateRule::OnlineTd {
            discount_factor: 0.55,
            learning_rate: 0.98,
        }
    }

    pub fn canonical_td() -> Self {
        UpdateRule::CanonicalTd {
            discount_factor: 0.5,
            learning_rate: 0.8,
        }
    }

    /// Build a rule of the given kind with custom parameters.
    ///
    /// `learning_rate` is ignored by `DiscountedBackup`.
    pub fn with_params(kind: RuleKind, discount_factor: f64, learning_rate: f64) -> Result<Self> {
        let rule = match kind {
            RuleKind::DiscountedBackup => UpdateRule::DiscountedBackup { discount_factor },
            RuleKind::OnlineTd => UpdateRule::OnlineTd {
                discount_factor,
                learning_rate,
            },
            RuleKind::CanonicalTd => UpdateRule::CanonicalTd {
                discount_factor,
                learning_rate,
            },
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Reject discount factors or learning rates outside `[0, 1)`.
    pub fn validate(&self) -> Result<()> {
        check_unit_interval("discount factor", self.discount_factor())?;
        if let Some(rate) = self.learning_rate() {
            check_unit_interval("learning rate", rate)?;
        }
        Ok(())
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            UpdateRule::DiscountedBackup { .. } => RuleKind::DiscountedBackup,
            UpdateRule::OnlineTd { .. } => RuleKind::OnlineTd,
            UpdateRule::CanonicalTd { .. } => RuleKind::CanonicalTd,
        }
    }

    pub fn discount_factor(&self) -> f64 {
        match *self {
            UpdateRule::DiscountedBackup { discount_factor }
            | UpdateRule::OnlineTd {
                discount_factor, ..
            }
            | UpdateRule::CanonicalTd {
                discount_factor, ..
            } => discount_factor,
        }
    }

    pub fn learning_rate(&self) -> Option<f64> {
        match *self {
            UpdateRule::DiscountedBackup { .. } => None,
            UpdateRule::OnlineTd { learning_rate, .. }
            | UpdateRule::CanonicalTd { learning_rate, .. } => Some(learning_rate),
        }
    }

    pub fn bootstrap(&self) -> Bootstrap {
        match self {
            UpdateRule::DiscountedBackup { .. } => Bootstrap::Ignored,
            UpdateRule::OnlineTd { .. } => Bootstrap::ChosenAction,
            UpdateRule::CanonicalTd { .. } => Bootstrap::BestAction,
        }
    }

    pub fn is_canonical(&self) -> bool {
        matches!(self, UpdateRule::CanonicalTd { .. })
    }

    /// New estimate from the old one, the reward and the bootstrap value.
    pub fn new_value(&self, old_value: f64, reward: f64, next_value: f64) -> f64 {
        match *self {
            UpdateRule::DiscountedBackup { discount_factor } => reward + discount_factor * old_value,
            UpdateRule::OnlineTd {
                discount_factor,
                learning_rate,
            } => {
                let target = reward + discount_factor * next_value;
                old_value + learning_rate * (target - old_value)
            }
            UpdateRule::CanonicalTd {
                discount_factor,
                learning_rate,
            } => {
                let target = reward + discount_factor * next_value;
                (1.0 - learning_rate) * old_value + learning_rate * target
            }
        }
    }

    /// Update exactly one entry, `(state, action)`, and return its new value.
    pub fn apply(
        &self,
        table: &mut QTable,
        state: &State,
        action: Action,
        reward: f64,
        next_value: f64,
    ) -> Result<f64> {
        let old_value = table.get(state, action)?;
        let new_value = self.new_value(old_value, reward, next_value);
        table.set(state, action, new_value)?;
        log::debug!(
            "{} update {state}/{action}: {old_value:.4} -> {new_value:.4} (reward {reward}, next {next_value:.4})",
            self.kind()
        );
        Ok(new_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{q_learning::encoder::StateEncoder, types::Light};

    fn table() -> QTable {
        QTable::new(StateEncoder::default().key_space(), 2.0).unwrap()
    }

    #[test]
    fn stock_parameters() {
        assert_eq!(UpdateRule::discounted_backup().discount_factor(), 0.5);
        assert_eq!(UpdateRule::discounted_backup().learning_rate(), None);
        assert_eq!(UpdateRule::online_td().discount_factor(), 0.55);
        assert_eq!(UpdateRule::online_td().learning_rate(), Some(0.98));
        assert_eq!(UpdateRule::canonical_td().discount_factor(), 0.5);
        assert_eq!(UpdateRule::canonical_td().learning_rate(), Some(0.8));
        assert!(UpdateRule::default().is_canonical());
        for kind in RuleKind::ALL {
            assert!(kind.default_rule().validate().is_ok());
            assert_eq!(kind.default_rule().kind(), kind);
        }
    }

    #[test]
    fn rejects_parameters_outside_unit_interval() {
        assert!(UpdateRule::with_params(RuleKind::CanonicalTd, 1.0, 0.5).is_err());
        assert!(UpdateRule::with_params(RuleKind::CanonicalTd, 0.5, 1.0).is_err());
        assert!(UpdateRule::with_params(RuleKind::OnlineTd, -0.1, 0.5).is_err());
        assert!(UpdateRule::with_params(RuleKind::OnlineTd, 0.5, f64::NAN).is_err());
        assert!(UpdateRule::with_params(RuleKind::DiscountedBackup, 0.0, 7.0).is_ok());
        assert!(UpdateRule::with_params(RuleKind::CanonicalTd, 0.0, 0.0).is_ok());
    }

    #[test]
    fn discounted_backup_formula() {
        let rule = UpdateRule::discounted_backup();
        assert_eq!(rule.new_value(5.5, 1.0, 100.0), 1.0 + 0.5 * 5.5);
    }

    #[test]
    fn online_td_formula() {
        let rule = UpdateRule::online_td();
        let target = 2.0 + 0.55 * 4.0;
        let expected = 1.0 + 0.98 * (target - 1.0);
        assert!((rule.new_value(1.0, 2.0, 4.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn canonical_td_formula() {
        let rule = UpdateRule::canonical_td();
        let expected = 0.2 * 5.5 + 0.8 * (1.0 + 0.5 * 5.5);
        assert!((rule.new_value(5.5, 1.0, 5.5) - expected).abs() < 1e-12);
    }

    #[test]
    fn fixed_point_leaves_value_unchanged() {
        // Q = r + γQ  =>  Q = r / (1 - γ)
        let rule = UpdateRule::canonical_td();
        assert!((rule.new_value(4.0, 2.0, 4.0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn apply_touches_only_one_entry() {
        let mut table = table();
        let state = State::clear(Light::Green, Action::Forward);
        let other = State::clear(Light::Red, Action::Forward);
        let new_value = UpdateRule::canonical_td()
            .apply(&mut table, &state, Action::Left, -1.0, 2.0)
            .unwrap();
        assert_ne!(new_value, 2.0);
        assert_eq!(table.get(&state, Action::Left).unwrap(), new_value);
        assert_eq!(table.visited(), 1);
        assert_eq!(table.values(&other).unwrap(), [2.0; Action::COUNT]);
    }

    #[test]
    fn rule_tokens_round_trip() {
        for kind in RuleKind::ALL {
            assert_eq!(kind.as_str().parse::<RuleKind>().unwrap(), kind);
        }
        assert_eq!("deferred".parse::<NextStateTiming>().unwrap(), NextStateTiming::Deferred);
        assert!("sometimes".parse::<NextStateTiming>().is_err());
    }
}
