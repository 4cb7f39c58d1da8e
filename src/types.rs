//! Core domain types shared by the agent and the world.
//!
//! Everything here is a small `Copy` value: percepts and states are
//! recomputed every tick and only ever used as lookup keys.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Traffic-light color as seen by a car at an intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Light {
    Red,
    Green,
}

impl Light {
    pub const ALL: [Light; 2] = [Light::Red, Light::Green];

    pub fn as_str(self) -> &'static str {
        match self {
            Light::Red => "red",
            Light::Green => "green",
        }
    }
}

impl fmt::Display for Light {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Light {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Ok(Light::Red),
            "green" => Ok(Light::Green),
            _ => Err(Error::ParseToken {
                kind: "light".to_string(),
                input: s.to_string(),
                expected: "red, green".to_string(),
            }),
        }
    }
}

/// A driving action, a waypoint direction, or the intent of another car.
///
/// Declaration order is significant: it is the fixed total order used to
/// break ties between equally valued actions (`None < Forward < Left < Right`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Stay put for this tick.
    #[default]
    None,
    Forward,
    Left,
    Right,
}

impl Action {
    pub const COUNT: usize = 4;
    pub const ALL: [Action; Action::COUNT] =
        [Action::None, Action::Forward, Action::Left, Action::Right];

    /// Position of the action in the tie-break order.
    pub fn index(self) -> usize {
        match self {
            Action::None => 0,
            Action::Forward => 1,
            Action::Left => 2,
            Action::Right => 3,
        }
    }

    pub fn is_none(self) -> bool {
        self == Action::None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::None => "none",
            Action::Forward => "forward",
            Action::Left => "left",
            Action::Right => "right",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(Action::None),
            "forward" => Ok(Action::Forward),
            "left" => Ok(Action::Left),
            "right" => Ok(Action::Right),
            _ => Err(Error::ParseToken {
                kind: "action".to_string(),
                input: s.to_string(),
                expected: "none, forward, left, right".to_string(),
            }),
        }
    }
}

/// What the environment reports to a car at its current intersection.
///
/// Traffic fields carry the intended action of the car approaching from that
/// side, or `Action::None` when there is no such car.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Percept {
    pub light: Light,
    pub oncoming: Action,
    pub left: Action,
    pub right: Action,
}

impl Percept {
    /// Percept with the given light and no surrounding traffic.
    pub fn new(light: Light) -> Self {
        Self {
            light,
            oncoming: Action::None,
            left: Action::None,
            right: Action::None,
        }
    }

    pub fn with_oncoming(mut self, oncoming: Action) -> Self {
        self.oncoming = oncoming;
        self
    }

    pub fn with_left(mut self, left: Action) -> Self {
        self.left = left;
        self
    }

    pub fn with_right(mut self, right: Action) -> Self {
        self.right = right;
        self
    }
}

/// Discrete state key: light, intended waypoint, and traffic on each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct State {
    pub light: Light,
    pub waypoint: Action,
    pub oncoming: Action,
    pub left: Action,
    pub right: Action,
}

impl State {
    pub fn new(light: Light, waypoint: Action, oncoming: Action, left: Action, right: Action) -> Self {
        Self {
            light,
            waypoint,
            oncoming,
            left,
            right,
        }
    }

    /// State with no traffic on any side.
    pub fn clear(light: Light, waypoint: Action) -> Self {
        Self::new(light, waypoint, Action::None, Action::None, Action::None)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {}, {})",
            self.light, self.waypoint, self.oncoming, self.left, self.right
        )
    }
}

/// Intersection coordinates in the grid world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance, ignoring wrap-around.
    pub fn distance(self, other: Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_order_matches_declaration() {
        let mut sorted = Action::ALL;
        sorted.sort();
        assert_eq!(sorted, Action::ALL);
        for (i, action) in Action::ALL.iter().enumerate() {
            assert_eq!(action.index(), i);
        }
    }

    #[test]
    fn tokens_parse_case_insensitively() {
        assert_eq!("Forward".parse::<Action>().unwrap(), Action::Forward);
        assert_eq!("none".parse::<Action>().unwrap(), Action::None);
        assert_eq!("GREEN".parse::<Light>().unwrap(), Light::Green);
        assert!("up".parse::<Action>().is_err());
        assert!("amber".parse::<Light>().is_err());
    }

    #[test]
    fn state_display_lists_all_fields() {
        let state = State::clear(Light::Green, Action::Forward);
        assert_eq!(state.to_string(), "(green, forward, none, none, none)");
    }

    #[test]
    fn distance_is_manhattan() {
        assert_eq!(Position::new(1, 1).distance(Position::new(4, 3)), 5);
    }
}
