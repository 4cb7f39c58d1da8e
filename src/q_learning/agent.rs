//! The learning driver
//!
//! Each tick runs sense → encode → choose → act → update → bookkeeping.
//! The agent is passive: the simulator calls [`LearningAgent::update`] once
//! per tick and [`LearningAgent::reset`] between trips.

use rand::{SeedableRng, rngs::StdRng};

use crate::{
    app::AgentConfig,
    error::{Error, Result},
    ports::{Driver, Environment, TickReport},
    q_learning::{
        bookkeeping::TripLog,
        encoder::StateEncoder,
        policy::explore_exploit,
        q_table::QTable,
        update::{Bootstrap, NextStateTiming, UpdateRule},
    },
    types::{Action, Position, State},
};

fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// An update waiting for the next tick's state.
#[derive(Debug, Clone, Copy)]
struct PendingUpdate {
    state: State,
    action: Action,
    reward: f64,
}

/// Tabular Q-learning driver
#[derive(Debug, Clone)]
pub struct LearningAgent {
    name: String,
    config: AgentConfig,
    encoder: StateEncoder,
    q_table: QTable,
    trip_log: TripLog,
    tick: u64,
    pending: Option<PendingUpdate>,
    rng: StdRng,
}

impl LearningAgent {
    /// Build an agent, allocating the full value table up front.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfiguration` for a discount factor or
    /// learning rate outside `[0, 1)` or a non-positive initial value.
    pub fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;
        let encoder = StateEncoder::new(config.fields);
        let q_table = QTable::new(encoder.key_space(), config.q_init)?;
        Ok(Self {
            name: format!("Q-{}", config.rule.kind()),
            config,
            encoder,
            q_table,
            trip_log: TripLog::new(),
            tick: 0,
            pending: None,
            rng: build_rng(config.seed),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replace the random source, e.g. with a seeded generator in tests.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn rule(&self) -> &UpdateRule {
        &self.config.rule
    }

    pub fn encoder(&self) -> &StateEncoder {
        &self.encoder
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn q_table_mut(&mut self) -> &mut QTable {
        &mut self.q_table
    }

    pub fn trip_log(&self) -> &TripLog {
        &self.trip_log
    }

    pub fn trip_number(&self) -> u64 {
        self.trip_log.trip_number()
    }

    /// Whether an update is waiting for the next tick (deferred timing only).
    pub fn has_pending_update(&self) -> bool {
        self.pending.is_some()
    }

    /// Encode what the car currently senses.
    pub fn sense_state(&self, env: &dyn Environment) -> State {
        let waypoint = env.next_waypoint();
        let percept = env.sense();
        self.encoder.encode(&percept, waypoint)
    }

    /// Explore/exploit for `state` on the current trip.
    pub fn choose_action_and_q_value(&mut self, state: &State) -> Result<(Action, f64)> {
        explore_exploit(
            &self.q_table,
            state,
            self.trip_log.trip_number(),
            &mut self.rng,
        )
    }

    /// Apply the configured rule to `(state, action)` right away.
    ///
    /// The successor state is obtained by sensing `env` again, so the world
    /// must not have been advanced in between. Returns the new value.
    pub fn update_q_value(
        &mut self,
        env: &dyn Environment,
        state: &State,
        action: Action,
        reward: f64,
    ) -> Result<f64> {
        let next_value = match self.config.rule.bootstrap() {
            Bootstrap::Ignored => 0.0,
            _ => {
                let next_state = self.sense_state(env);
                self.bootstrap_value(&next_state)?
            }
        };
        self.config
            .rule
            .apply(&mut self.q_table, state, action, reward, next_value)
    }

    fn bootstrap_value(&mut self, next_state: &State) -> Result<f64> {
        match self.config.rule.bootstrap() {
            Bootstrap::Ignored => Ok(0.0),
            Bootstrap::ChosenAction => Ok(self.choose_action_and_q_value(next_state)?.1),
            Bootstrap::BestAction => self.q_table.max_value(next_state),
        }
    }

    /// Settle a deferred update, bootstrapping off `next_value`.
    fn settle_pending(&mut self, next_value: f64) -> Result<Option<f64>> {
        match self.pending.take() {
            Some(pending) => self
                .config
                .rule
                .apply(
                    &mut self.q_table,
                    &pending.state,
                    pending.action,
                    pending.reward,
                    next_value,
                )
                .map(Some),
            None => Ok(None),
        }
    }

    /// Start a new trip.
    ///
    /// A deferred update left over from the previous trip is settled with a
    /// terminal bootstrap of zero.
    pub fn reset(&mut self, destination: Option<Position>) -> Result<()> {
        self.settle_pending(0.0)?;
        self.trip_log.begin_trip();
        self.tick = 0;
        match destination {
            Some(destination) => log::info!(
                "{}: trip {} to {destination} (explore p={:.3})",
                self.name,
                self.trip_log.trip_number(),
                crate::q_learning::exploration_probability(self.trip_log.trip_number())
            ),
            None => log::info!("{}: trip {}", self.name, self.trip_log.trip_number()),
        }
        Ok(())
    }

    /// Run one tick against `env`.
    pub fn update(&mut self, env: &mut dyn Environment) -> Result<TickReport> {
        if !self.trip_log.in_trip() {
            return Err(Error::NoTripInProgress);
        }

        let deadline = env.deadline();
        let state = self.sense_state(&*env);
        let (action, value) = self.choose_action_and_q_value(&state)?;

        // The previous tick's successor is this tick's state.
        let mut updated = if self.pending.is_some() {
            let next_value = match self.config.rule.bootstrap() {
                Bootstrap::ChosenAction => value,
                _ => self.q_table.max_value(&state)?,
            };
            self.settle_pending(next_value)?
        } else {
            None
        };

        let reward = env.act(action);
        self.trip_log.record_reward(reward);
        self.trip_log.observe_deadline(deadline);

        match (self.config.rule.bootstrap(), self.config.timing) {
            (Bootstrap::Ignored, _) | (_, NextStateTiming::Resensed) => {
                updated = Some(self.update_q_value(&*env, &state, action, reward)?);
            }
            (_, NextStateTiming::Deferred) => {
                self.pending = Some(PendingUpdate {
                    state,
                    action,
                    reward,
                });
            }
        }

        let report = TickReport {
            trip: self.trip_log.trip_number(),
            tick: self.tick,
            state,
            action,
            value,
            reward,
            deadline,
            updated,
        };
        log::debug!(
            "{}: trip {} tick {} deadline {deadline} state {state} action {action} (q={value:.3}) reward {reward}",
            self.name,
            report.trip,
            report.tick
        );
        self.tick += 1;
        Ok(report)
    }

    /// Settle any pending update and close the trip log.
    pub fn finish(&mut self) -> Result<()> {
        self.settle_pending(0.0)?;
        self.trip_log.finish();
        Ok(())
    }
}

impl Driver for LearningAgent {
    fn reset(&mut self, destination: Option<Position>) -> Result<()> {
        LearningAgent::reset(self, destination)
    }

    fn update(&mut self, env: &mut dyn Environment) -> Result<TickReport> {
        LearningAgent::update(self, env)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn finish(&mut self) -> Result<()> {
        LearningAgent::finish(self)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        q_learning::{RuleKind, StateFields},
        types::{Light, Percept},
    };

    /// Fixed percepts; `act` pays a fixed reward per action and counts calls.
    struct StaticEnv {
        percept: Percept,
        waypoint: Action,
        deadline: i64,
        acts: usize,
    }

    impl StaticEnv {
        fn green_forward() -> Self {
            Self {
                percept: Percept::new(Light::Green),
                waypoint: Action::Forward,
                deadline: 10,
                acts: 0,
            }
        }
    }

    impl Environment for StaticEnv {
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
            self.acts += 1;
            self.deadline -= 1;
            match action {
                Action::Forward => 2.0,
                Action::None => 0.0,
                _ => -0.5,
            }
        }
    }

    fn agent(rule: UpdateRule, timing: NextStateTiming) -> LearningAgent {
        LearningAgent::new(
            AgentConfig::new(rule)
                .with_timing(timing)
                .with_q_init(3.0)
                .with_seed(11),
        )
        .unwrap()
    }

    #[test]
    fn update_requires_a_trip() {
        let mut agent = agent(UpdateRule::canonical_td(), NextStateTiming::Resensed);
        let mut env = StaticEnv::green_forward();
        assert!(matches!(
            agent.update(&mut env),
            Err(Error::NoTripInProgress)
        ));
        assert_eq!(env.acts, 0);
    }

    #[test]
    fn resensed_tick_updates_acted_entry() {
        let mut agent = agent(UpdateRule::canonical_td(), NextStateTiming::Resensed);
        let mut env = StaticEnv::green_forward();
        agent.reset(None).unwrap();
        let report = agent.update(&mut env).unwrap();

        assert_eq!(report.trip, 1);
        assert_eq!(report.tick, 0);
        assert_eq!(report.deadline, 10);
        assert_eq!(report.state, State::clear(Light::Green, Action::Forward));
        let stored = agent.q_table().get(&report.state, report.action).unwrap();
        assert_eq!(report.updated, Some(stored));
        assert_eq!(agent.q_table().visited(), 1);
        assert_eq!(agent.trip_log().running_reward(), report.reward);
    }

    #[test]
    fn deferred_update_waits_for_next_tick() {
        let mut agent = agent(UpdateRule::canonical_td(), NextStateTiming::Deferred);
        let mut env = StaticEnv::green_forward();
        agent.reset(None).unwrap();

        let first = agent.update(&mut env).unwrap();
        assert_eq!(first.updated, None);
        assert!(agent.has_pending_update());
        assert_eq!(agent.q_table().visited(), 0);

        let before_second = agent.q_table().max_value(&first.state).unwrap();
        let second = agent.update(&mut env).unwrap();
        let expected = UpdateRule::canonical_td().new_value(3.0, first.reward, before_second);
        assert_eq!(second.updated, Some(expected));
        assert_eq!(
            agent.q_table().get(&first.state, first.action).unwrap(),
            expected
        );
        assert!(agent.has_pending_update());
    }

    #[test]
    fn reset_flushes_deferred_update_as_terminal() {
        let mut agent = agent(UpdateRule::canonical_td(), NextStateTiming::Deferred);
        let mut env = StaticEnv::green_forward();
        agent.reset(None).unwrap();
        let report = agent.update(&mut env).unwrap();

        agent.reset(None).unwrap();
        assert!(!agent.has_pending_update());
        let expected = UpdateRule::canonical_td().new_value(3.0, report.reward, 0.0);
        assert_eq!(
            agent.q_table().get(&report.state, report.action).unwrap(),
            expected
        );
        assert_eq!(agent.trip_log().trip_rewards(), &[report.reward]);
    }

    #[test]
    fn discounted_backup_never_defers() {
        let mut agent = agent(UpdateRule::discounted_backup(), NextStateTiming::Deferred);
        let mut env = StaticEnv::green_forward();
        agent.reset(None).unwrap();
        let report = agent.update(&mut env).unwrap();
        assert!(!agent.has_pending_update());
        assert_eq!(report.updated, Some(report.reward + 0.5 * 3.0));
    }

    #[test]
    fn online_td_single_update_per_tick() {
        let mut agent = agent(UpdateRule::online_td(), NextStateTiming::Resensed);
        let mut env = StaticEnv::green_forward();
        agent.reset(None).unwrap();
        agent.update(&mut env).unwrap();
        assert_eq!(agent.q_table().visited(), 1);
    }

    #[test]
    fn deadline_misses_are_logged() {
        let mut agent = agent(UpdateRule::canonical_td(), NextStateTiming::Resensed);
        let mut env = StaticEnv::green_forward();
        env.deadline = 1;
        agent.reset(None).unwrap();
        agent.update(&mut env).unwrap();
        assert!(agent.trip_log().missed_deadlines().is_empty());
        agent.update(&mut env).unwrap();
        assert_eq!(agent.trip_log().missed_deadlines(), &[1]);
    }

    #[test]
    fn compact_state_fields_shrink_table() {
        let agent = LearningAgent::new(
            AgentConfig::default().with_state_fields(StateFields::LightWaypoint),
        )
        .unwrap();
        assert_eq!(agent.q_table().len(), 8);
        assert_eq!(agent.name(), format!("Q-{}", RuleKind::CanonicalTd));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = AgentConfig::new(UpdateRule::OnlineTd {
            discount_factor: 0.5,
            learning_rate: 1.5,
        });
        assert!(matches!(
            LearningAgent::new(config),
            Err(Error::InvalidConfiguration { .. })
        ));
    }
}
