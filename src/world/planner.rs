//! Route planner that points the car towards its destination

use crate::{
    types::{Action, Position},
    world::traffic::Heading,
};

/// Greedy planner: close the east-west gap first, then north-south.
///
/// Wrap-around is ignored, and a destination behind the car is reached by
/// turning right.
#[derive(Debug, Clone, Default)]
pub struct RoutePlanner {
    destination: Option<Position>,
}

impl RoutePlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route_to(&mut self, destination: Position) {
        self.destination = Some(destination);
    }

    pub fn destination(&self) -> Option<Position> {
        self.destination
    }

    pub fn next_waypoint(&self, location: Position, heading: Heading) -> Action {
        let Some(destination) = self.destination else {
            return Action::None;
        };
        let dx = destination.x - location.x;
        let dy = destination.y - location.y;

        if dx != 0 {
            if dx * heading.dx > 0 {
                Action::Forward
            } else if dx * heading.dx < 0 {
                Action::Right
            } else if dx * heading.dy > 0 {
                Action::Left
            } else {
                Action::Right
            }
        } else if dy != 0 {
            if dy * heading.dy > 0 {
                Action::Forward
            } else if dy * heading.dy < 0 {
                Action::Right
            } else if dy * heading.dx > 0 {
                Action::Right
            } else {
                Action::Left
            }
        } else {
            Action::None
        }
    }
}
