//! Per-trip reward and deadline bookkeeping

use serde::{Deserialize, Serialize};

/// Reward log and missed-deadline record across trips.
///
/// Purely observational; nothing here feeds back into action selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripLog {
    trip_number: u64,
    in_trip: bool,
    running_reward: f64,
    trip_rewards: Vec<f64>,
    missed_deadlines: Vec<u64>,
}

impl TripLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the running trip, if any, and start the next one.
    ///
    /// The first trip is trip 1.
    pub fn begin_trip(&mut self) {
        self.finish();
        self.trip_number += 1;
        self.in_trip = true;
    }

    /// Close the running trip without starting another one.
    pub fn finish(&mut self) {
        if self.in_trip {
            self.trip_rewards.push(self.running_reward);
            self.in_trip = false;
        }
        self.running_reward = 0.0;
    }

    pub fn record_reward(&mut self, reward: f64) {
        self.running_reward += reward;
    }

    /// Note a deadline reading; below 1 means this tick runs out the clock.
    ///
    /// Every such tick is recorded, so a trip driven past its deadline
    /// appears once per late tick.
    pub fn observe_deadline(&mut self, deadline: i64) {
        if deadline < 1 {
            self.missed_deadlines.push(self.trip_number);
        }
    }

    pub fn trip_number(&self) -> u64 {
        self.trip_number
    }

    pub fn in_trip(&self) -> bool {
        self.in_trip
    }

    /// Reward accumulated so far in the running trip.
    pub fn running_reward(&self) -> f64 {
        self.running_reward
    }

    /// Total reward of each completed trip, oldest first.
    pub fn trip_rewards(&self) -> &[f64] {
        &self.trip_rewards
    }

    /// Trip numbers in which the deadline ran out.
    pub fn missed_deadlines(&self) -> &[u64] {
        &self.missed_deadlines
    }
}
