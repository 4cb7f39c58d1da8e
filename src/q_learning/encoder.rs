//! State encoding from percepts and the planner's waypoint

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    types::{Action, Light, Percept, State},
};

/// Which percept fields make it into the state key.
///
/// Fields left out are pinned to `Action::None`, so the key space only
/// contains states the encoder can actually produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StateFields {
    /// `(light, waypoint)`
    LightWaypoint,
    /// `(light, waypoint, oncoming)`
    WithOncoming,
    /// `(light, waypoint, oncoming, left, right)`
    #[default]
    Full,
}

impl StateFields {
    pub fn as_str(self) -> &'static str {
        match self {
            StateFields::LightWaypoint => "light-waypoint",
            StateFields::WithOncoming => "with-oncoming",
            StateFields::Full => "full",
        }
    }

    fn tracks_oncoming(self) -> bool {
        !matches!(self, StateFields::LightWaypoint)
    }

    fn tracks_sides(self) -> bool {
        matches!(self, StateFields::Full)
    }
}

impl fmt::Display for StateFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StateFields {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light-waypoint" | "compact" => Ok(StateFields::LightWaypoint),
            "with-oncoming" | "oncoming" => Ok(StateFields::WithOncoming),
            "full" => Ok(StateFields::Full),
            _ => Err(Error::ParseToken {
                kind: "state field set".to_string(),
                input: s.to_string(),
                expected: "light-waypoint, with-oncoming, full".to_string(),
            }),
        }
    }
}

/// Maps a percept bundle plus the intended waypoint to a [`State`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateEncoder {
    fields: StateFields,
}

impl StateEncoder {
    pub fn new(fields: StateFields) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> StateFields {
        self.fields
    }

    pub fn encode(&self, percept: &Percept, waypoint: Action) -> State {
        let oncoming = if self.fields.tracks_oncoming() {
            percept.oncoming
        } else {
            Action::None
        };
        let (left, right) = if self.fields.tracks_sides() {
            (percept.left, percept.right)
        } else {
            (Action::None, Action::None)
        };
        State::new(percept.light, waypoint, oncoming, left, right)
    }

    /// Every state this encoder can produce, in a fixed order.
    pub fn key_space(&self) -> Vec<State> {
        let unused = [Action::None];
        let oncoming: &[Action] = if self.fields.tracks_oncoming() {
            &Action::ALL
        } else {
            &unused
        };
        let sides: &[Action] = if self.fields.tracks_sides() {
            &Action::ALL
        } else {
            &unused
        };

        let mut keys = Vec::with_capacity(self.key_count());
        for &light in &Light::ALL {
            for &waypoint in &Action::ALL {
                for &on in oncoming {
                    for &left in sides {
                        for &right in sides {
                            keys.push(State::new(light, waypoint, on, left, right));
                        }
                    }
                }
            }
        }
        keys
    }

    pub fn key_count(&self) -> usize {
        let base = Light::ALL.len() * Action::COUNT;
        match self.fields {
            StateFields::LightWaypoint => base,
            StateFields::WithOncoming => base * Action::COUNT,
            StateFields::Full => base * Action::COUNT.pow(3),
        }
    }
}
