//! Grid-world traffic simulation with one primary car and dummy traffic

use std::collections::HashMap;

use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    ports::{Environment, TripOutcome},
    types::{Action, Light, Percept, Position},
    world::{
        planner::RoutePlanner,
        traffic::{Heading, TrafficLight, is_legal},
    },
};

/// Reward for an illegal move (the car stays put).
pub const ILLEGAL_PENALTY: f64 = -1.0;
/// Reward for a legal move along the planned route.
pub const WAYPOINT_REWARD: f64 = 2.0;
/// Reward for a legal move away from the planned route.
pub const DETOUR_PENALTY: f64 = -0.5;
/// Bonus for reaching the destination.
pub const ARRIVAL_BONUS: f64 = 10.0;

/// World configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Number of intersections east-west
    pub width: i32,
    /// Number of intersections north-south
    pub height: i32,
    /// Number of randomly wandering cars
    pub dummies: usize,
    /// End trips when the deadline runs out
    pub enforce_deadline: bool,
    /// Deadline ticks granted per unit of start-destination distance
    pub deadline_factor: i64,
    /// Minimum start-destination distance
    pub min_distance: i32,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 8,
            height: 6,
            dummies: 3,
            enforce_deadline: true,
            deadline_factor: 5,
            min_distance: 4,
            seed: None,
        }
    }
}

impl WorldConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_dummies(mut self, dummies: usize) -> Self {
        self.dummies = dummies;
        self
    }

    pub fn with_enforce_deadline(mut self, enforce: bool) -> Self {
        self.enforce_deadline = enforce;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.width < 2 || self.height < 2 {
            return Err(Error::config(format!(
                "grid must be at least 2x2, got {}x{}",
                self.width, self.height
            )));
        }
        if self.min_distance < 1 || self.min_distance > (self.width - 1) + (self.height - 1) {
            return Err(Error::config(format!(
                "minimum trip distance {} does not fit a {}x{} grid",
                self.min_distance, self.width, self.height
            )));
        }
        if self.deadline_factor < 1 {
            return Err(Error::config(format!(
                "deadline factor must be at least 1, got {}",
                self.deadline_factor
            )));
        }
        Ok(())
    }
}

/// A car at an intersection with the action it intends to take next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    pub location: Position,
    pub heading: Heading,
    pub intent: Action,
}

/// The smartcab world.
///
/// Per tick, the simulator calls [`GridWorld::advance`] (lights and dummy
/// traffic), lets the primary driver act through the [`Environment`] port,
/// then calls [`GridWorld::end_tick`] (clock and deadline).
#[derive(Debug, Clone)]
pub struct GridWorld {
    config: WorldConfig,
    lights: HashMap<Position, TrafficLight>,
    primary: Car,
    dummies: Vec<Car>,
    planner: RoutePlanner,
    deadline: i64,
    t: u64,
    outcome: Option<TripOutcome>,
    rng: StdRng,
}

impl GridWorld {
    pub fn new(config: WorldConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        let mut lights = HashMap::new();
        for x in 1..=config.width {
            for y in 1..=config.height {
                let light = TrafficLight::new(rng.random(), rng.random_range(3..=5));
                lights.insert(Position::new(x, y), light);
            }
        }

        let mut world = Self {
            config,
            lights,
            primary: Car {
                location: Position::new(1, 1),
                heading: Heading::EAST,
                intent: Action::None,
            },
            dummies: Vec::with_capacity(config.dummies),
            planner: RoutePlanner::new(),
            deadline: 0,
            t: 0,
            outcome: None,
            rng,
        };
        for _ in 0..config.dummies {
            let car = world.random_car();
            world.dummies.push(car);
        }
        Ok(world)
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    fn random_position(&mut self) -> Position {
        Position::new(
            self.rng.random_range(1..=self.config.width),
            self.rng.random_range(1..=self.config.height),
        )
    }

    fn random_heading(&mut self) -> Heading {
        *Heading::ALL.choose(&mut self.rng).unwrap_or(&Heading::EAST)
    }

    fn random_car(&mut self) -> Car {
        Car {
            location: self.random_position(),
            heading: self.random_heading(),
            intent: Action::None,
        }
    }

    /// Start a new trip and return the destination.
    pub fn reset(&mut self) -> Position {
        let (start, destination) = loop {
            let start = self.random_position();
            let destination = self.random_position();
            if start.distance(destination) >= self.config.min_distance {
                break (start, destination);
            }
        };
        let heading = self.random_heading();
        self.place_primary(
            start,
            heading,
            destination,
            i64::from(start.distance(destination)) * self.config.deadline_factor,
        );
        for i in 0..self.dummies.len() {
            let car = self.random_car();
            self.dummies[i] = car;
        }
        for light in self.lights.values_mut() {
            light.reset();
        }
        self.t = 0;
        log::debug!("world: trip from {start} to {destination}, deadline {}", self.deadline);
        destination
    }

    /// Put the primary car somewhere specific with a fresh trip.
    pub fn place_primary(
        &mut self,
        location: Position,
        heading: Heading,
        destination: Position,
        deadline: i64,
    ) {
        self.primary = Car {
            location,
            heading,
            intent: Action::None,
        };
        self.planner.route_to(destination);
        self.primary.intent = self.next_waypoint();
        self.deadline = deadline;
        self.outcome = None;
    }

    /// Replace the dummy traffic.
    pub fn set_dummies(&mut self, dummies: Vec<Car>) {
        self.dummies = dummies;
    }

    /// Force the phase of the light at `position`.
    pub fn set_light(&mut self, position: Position, north_south_open: bool) {
        if let Some(light) = self.lights.get_mut(&position) {
            light.north_south_open = north_south_open;
        }
    }

    /// Advance lights and dummy traffic by one tick.
    pub fn advance(&mut self) {
        let t = self.t;
        for light in self.lights.values_mut() {
            light.update(t);
        }
        for i in 0..self.dummies.len() {
            let intent = *Action::ALL[1..]
                .choose(&mut self.rng)
                .unwrap_or(&Action::Forward);
            self.dummies[i].intent = intent;
            let percept = self.sense_for(&self.dummies[i], Some(i));
            if is_legal(intent, &percept) {
                let moved = self.moved(self.dummies[i], intent);
                self.dummies[i] = moved;
            }
        }
        self.primary.intent = self.next_waypoint();
    }

    /// Advance the clock and count down the deadline.
    pub fn end_tick(&mut self) {
        self.t += 1;
        if self.outcome.is_none() && self.config.enforce_deadline && self.deadline <= 0 {
            self.outcome = Some(TripOutcome::DeadlineExpired);
            log::debug!("world: deadline reached at t={}", self.t);
        }
        self.deadline -= 1;
    }

    pub fn is_done(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn outcome(&self) -> Option<TripOutcome> {
        self.outcome
    }

    pub fn time(&self) -> u64 {
        self.t
    }

    pub fn primary(&self) -> &Car {
        &self.primary
    }

    pub fn dummies(&self) -> &[Car] {
        &self.dummies
    }

    pub fn destination(&self) -> Option<Position> {
        self.planner.destination()
    }

    fn wrap(&self, location: Position) -> Position {
        Position::new(
            (location.x - 1).rem_euclid(self.config.width) + 1,
            (location.y - 1).rem_euclid(self.config.height) + 1,
        )
    }

    fn moved(&self, car: Car, action: Action) -> Car {
        if action.is_none() {
            return car;
        }
        let heading = car.heading.turn(action);
        Car {
            location: self.wrap(Position::new(
                car.location.x + heading.dx,
                car.location.y + heading.dy,
            )),
            heading,
            intent: car.intent,
        }
    }

    /// What `car` sees; `skip` is its own index among the dummies.
    fn sense_for(&self, car: &Car, skip: Option<usize>) -> Percept {
        let light = self
            .lights
            .get(&car.location)
            .map(|light| light.light_for(car.heading))
            .unwrap_or(Light::Red);
        let mut percept = Percept::new(light);

        let others = self
            .dummies
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != skip)
            .map(|(_, other)| other)
            .chain(skip.map(|_| &self.primary));
        for other in others {
            if other.location != car.location {
                continue;
            }
            if other.heading == car.heading.reverse() {
                percept.oncoming = other.intent;
            } else if other.heading == car.heading.right() {
                percept.left = other.intent;
            } else if other.heading == car.heading.left() {
                percept.right = other.intent;
            }
        }
        percept
    }
}

impl Environment for GridWorld {
    fn sense(&self) -> Percept {
        self.sense_for(&self.primary, None)
    }

    fn deadline(&self) -> i64 {
        self.deadline
    }

    fn next_waypoint(&self) -> Action {
        self.planner
            .next_waypoint(self.primary.location, self.primary.heading)
    }

    fn act(&mut self, action: Action) -> f64 {
        if self.outcome.is_some() {
            return 0.0;
        }
        let percept = self.sense();
        let waypoint = self.next_waypoint();

        if !is_legal(action, &percept) {
            return ILLEGAL_PENALTY;
        }
        if action.is_none() {
            return 0.0;
        }

        self.primary = self.moved(self.primary, action);
        let mut reward = if action == waypoint {
            WAYPOINT_REWARD
        } else {
            DETOUR_PENALTY
        };

        if Some(self.primary.location) == self.planner.destination() {
            if !self.config.enforce_deadline || self.deadline >= 0 {
                reward += ARRIVAL_BONUS;
            }
            self.outcome = Some(TripOutcome::Arrived);
            log::debug!("world: arrived at t={}", self.t);
        }
        self.primary.intent = self.next_waypoint();
        reward
    }
}
