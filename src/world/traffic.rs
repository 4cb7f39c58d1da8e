//! Headings, traffic lights and right-of-way rules

use serde::{Deserialize, Serialize};

use crate::types::{Action, Light, Percept};

/// Unit direction of travel. `y` grows downward, so north is `(0, -1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Heading {
    pub dx: i32,
    pub dy: i32,
}

impl Heading {
    pub const NORTH: Heading = Heading { dx: 0, dy: -1 };
    pub const SOUTH: Heading = Heading { dx: 0, dy: 1 };
    pub const EAST: Heading = Heading { dx: 1, dy: 0 };
    pub const WEST: Heading = Heading { dx: -1, dy: 0 };
    pub const ALL: [Heading; 4] = [Heading::NORTH, Heading::EAST, Heading::SOUTH, Heading::WEST];

    pub fn left(self) -> Heading {
        Heading {
            dx: self.dy,
            dy: -self.dx,
        }
    }

    pub fn right(self) -> Heading {
        Heading {
            dx: -self.dy,
            dy: self.dx,
        }
    }

    pub fn reverse(self) -> Heading {
        Heading {
            dx: -self.dx,
            dy: -self.dy,
        }
    }

    pub fn is_vertical(self) -> bool {
        self.dx == 0
    }

    /// Heading after taking `action`; `None` keeps the current one.
    pub fn turn(self, action: Action) -> Heading {
        match action {
            Action::Left => self.left(),
            Action::Right => self.right(),
            Action::Forward | Action::None => self,
        }
    }
}

/// Two-phase light at an intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficLight {
    /// `true` while north-south traffic has green
    pub north_south_open: bool,
    /// Ticks between phase changes
    pub period: u64,
    last_flip: u64,
}

impl TrafficLight {
    pub fn new(north_south_open: bool, period: u64) -> Self {
        Self {
            north_south_open,
            period: period.max(1),
            last_flip: 0,
        }
    }

    /// Flip the phase once `period` ticks have passed since the last flip.
    pub fn update(&mut self, t: u64) {
        if t.saturating_sub(self.last_flip) >= self.period {
            self.north_south_open = !self.north_south_open;
            self.last_flip = t;
        }
    }

    pub fn reset(&mut self) {
        self.last_flip = 0;
    }

    /// Color shown to a car travelling with `heading`.
    pub fn light_for(&self, heading: Heading) -> Light {
        if self.north_south_open == heading.is_vertical() {
            Light::Green
        } else {
            Light::Red
        }
    }
}

/// Whether `action` is allowed given what the car senses.
///
/// - forward: green light
/// - left: green light and oncoming traffic either absent or also turning left
/// - right: green light, or the car on the left is not going straight
/// - none: always
pub fn is_legal(action: Action, percept: &Percept) -> bool {
    let green = percept.light == Light::Green;
    match action {
        Action::None => true,
        Action::Forward => green,
        Action::Left => {
            green && matches!(percept.oncoming, Action::None | Action::Left)
        }
        Action::Right => green || percept.left != Action::Forward,
    }
}
