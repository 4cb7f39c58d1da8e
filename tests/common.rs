//! Common test utilities for the smartcab test suite.

use smartcab::{Action, Light, Percept, ports::Environment};

/// Environment whose percepts never change.
///
/// Every action is legal; `act` pays `reward` and burns one deadline tick.
pub struct FixedEnv {
    pub percept: Percept,
    pub waypoint: Action,
    pub deadline: i64,
    pub reward: f64,
    pub actions: Vec<Action>,
}

impl FixedEnv {
    pub fn green_forward(reward: f64) -> Self {
        Self {
            percept: Percept::new(Light::Green),
            waypoint: Action::Forward,
            deadline: 20,
            reward,
            actions: Vec::new(),
        }
    }
}

impl Environment for FixedEnv {
    fn sense(&self) -> Percept {
        self.percept
    }

    fn deadline(&self) -> i64 {
        self.deadline
    }

    fn next_waypoint(&self) -> Action {
        self.waypoint
    }

    fn act(&mut self, action: Action) -> f64 {
        self.actions.push(action);
        self.deadline -= 1;
        self.reward
    }
}
