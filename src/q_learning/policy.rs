//! Explore/exploit action selection with a trip-based decay

use rand::{Rng, seq::IndexedRandom};

use crate::{
    error::Result,
    q_learning::q_table::QTable,
    types::{Action, State},
};

/// Offset in the exploration denominator, `1 / (trip + 0.9)`.
pub const EXPLORATION_OFFSET: f64 = 0.9;

/// Probability of taking a random action on the given trip.
///
/// Not clamped: trip 0 gives roughly 1.11, which simply means "always
/// explore" since the draw is compared with `<`.
pub fn exploration_probability(trip_number: u64) -> f64 {
    1.0 / (trip_number as f64 + EXPLORATION_OFFSET)
}

/// Pick an action for `state`, returning it with its stored value.
///
/// Exploring picks uniformly from every action, legal or not, and still
/// reports the table's value for it. Exploiting defers to [`QTable::best`].
pub fn explore_exploit<R: Rng>(
    table: &QTable,
    state: &State,
    trip_number: u64,
    rng: &mut R,
) -> Result<(Action, f64)> {
    let sample: f64 = rng.random();
    if sample < exploration_probability(trip_number) {
        let action = *Action::ALL.choose(rng).unwrap_or(&Action::None);
        Ok((action, table.get(state, action)?))
    } else {
        table.best(state)
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{q_learning::encoder::StateEncoder, types::Light};

    fn table() -> QTable {
        QTable::new(StateEncoder::default().key_space(), 3.14159265).unwrap()
    }

    #[test]
    fn probability_decays_with_trips() {
        assert!(exploration_probability(0) > 1.0);
        assert!((exploration_probability(1) - 1.0 / 1.9).abs() < 1e-12);
        assert!(exploration_probability(10) < exploration_probability(9));
        let far = exploration_probability(1_000_000_000);
        assert!(far > 0.0 && far < 1e-8);
    }

    #[test]
    fn trip_zero_always_explores_within_action_set() {
        let table = table();
        let state = State::clear(Light::Green, Action::Forward);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let (action, value) = explore_exploit(&table, &state, 0, &mut rng).unwrap();
            assert!(Action::ALL.contains(&action));
            assert!(value > 0.0);
        }
    }

    #[test]
    fn exploration_reaches_every_action() {
        let table = table();
        let state = State::clear(Light::Red, Action::Left);
        let mut rng = StdRng::seed_from_u64(17);
        let mut seen = [false; Action::COUNT];
        for _ in 0..500 {
            let (action, _) = explore_exploit(&table, &state, 0, &mut rng).unwrap();
            seen[action.index()] = true;
        }
        assert!(seen.iter().all(|&hit| hit));
    }

    #[test]
    fn late_trips_exploit() {
        let mut table = table();
        let state = State::clear(Light::Green, Action::Forward);
        table.set(&state, Action::Right, 10.123).unwrap();
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..1000 {
            let choice = explore_exploit(&table, &state, 1_000_000_000, &mut rng).unwrap();
            assert_eq!(choice, table.best(&state).unwrap());
            assert_eq!(choice, (Action::Right, 10.123));
        }
    }

    #[test]
    fn seeded_choices_are_reproducible() {
        let table = table();
        let state = State::clear(Light::Red, Action::Forward);
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..50)
                .map(|trip| explore_exploit(&table, &state, trip, &mut rng).unwrap().0)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(5), run(5));
    }
}
