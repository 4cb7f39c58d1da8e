//! Train command - Train a learning agent in the grid world

use std::{
    cell::RefCell,
    fs::File,
    path::{Path, PathBuf},
    rc::Rc,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use serde_json::to_writer_pretty;

use crate::{
    app::{AgentConfig, DEFAULT_Q_INIT},
    cli::output::{format_number, print_kv, print_result, print_section},
    pipeline::{
        JsonlObserver, MetricsObserver, MetricsSummary, MilestoneObserver, ProgressObserver,
        SimulationConfig, SimulationResult, Simulator, recent_success_rate,
    },
    q_learning::{LearningAgent, NextStateTiming, RuleKind, StateFields, UpdateRule},
    types::Action,
    world::{GridWorld, WorldConfig},
};

/// Value update rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RuleArg {
    /// r + γ·Q(s,a), ignores the next state
    DiscountedBackup,
    /// Online TD towards the next state's chosen action
    OnlineTd,
    /// Textbook Q-learning towards the next state's best action
    CanonicalTd,
}

impl From<RuleArg> for RuleKind {
    fn from(arg: RuleArg) -> Self {
        match arg {
            RuleArg::DiscountedBackup => RuleKind::DiscountedBackup,
            RuleArg::OnlineTd => RuleKind::OnlineTd,
            RuleArg::CanonicalTd => RuleKind::CanonicalTd,
        }
    }
}

/// Percept fields kept in the state key
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FieldsArg {
    LightWaypoint,
    WithOncoming,
    Full,
}

impl From<FieldsArg> for StateFields {
    fn from(arg: FieldsArg) -> Self {
        match arg {
            FieldsArg::LightWaypoint => StateFields::LightWaypoint,
            FieldsArg::WithOncoming => StateFields::WithOncoming,
            FieldsArg::Full => StateFields::Full,
        }
    }
}

/// When the successor state is sensed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TimingArg {
    /// Re-sense right after acting, within the same tick
    Resensed,
    /// Use the next tick's state
    Deferred,
}

impl From<TimingArg> for NextStateTiming {
    fn from(arg: TimingArg) -> Self {
        match arg {
            TimingArg::Resensed => NextStateTiming::Resensed,
            TimingArg::Deferred => NextStateTiming::Deferred,
        }
    }
}

#[derive(Debug, Serialize)]
struct TrainingSummaryFile<'a> {
    result: &'a SimulationResult,
    metrics: MetricsSummary,
    agent: AgentConfig,
    world: WorldConfig,
    visited_states: usize,
    state_count: usize,
    updated_entries: usize,
    missed_deadlines: &'a [u64],
}

fn sanitize_summary_path(raw: &Path) -> PathBuf {
    let mut normalized = raw.to_path_buf();
    let raw_str = raw.as_os_str().to_string_lossy();

    // Treat trailing separators or missing filename as a directory target.
    if raw_str.ends_with(std::path::MAIN_SEPARATOR) || normalized.file_name().is_none() {
        normalized.push("training_summary.json");
        return normalized;
    }

    match normalized.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => normalized,
        _ => {
            let mut name = normalized.into_os_string();
            name.push(".json");
            PathBuf::from(name)
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Train a learning agent", allow_negative_numbers = true)]
pub struct TrainArgs {
    /// Number of trips
    #[arg(long, short = 'n', default_value_t = 100)]
    pub trials: usize,

    /// Value update rule
    #[arg(long, value_enum, default_value_t = RuleArg::CanonicalTd)]
    pub rule: RuleArg,

    /// Override the rule's discount factor (0 ≤ γ < 1)
    #[arg(long)]
    pub discount_factor: Option<f64>,

    /// Override the rule's learning rate (0 ≤ α < 1)
    #[arg(long)]
    pub learning_rate: Option<f64>,

    /// Percept fields kept in the state key
    #[arg(long, value_enum, default_value_t = FieldsArg::Full)]
    pub state_fields: FieldsArg,

    /// When the successor state is sensed for bootstrapping
    #[arg(long, value_enum, default_value_t = TimingArg::Resensed)]
    pub timing: TimingArg,

    /// Initial value of every state-action pair
    #[arg(long, default_value_t = DEFAULT_Q_INIT)]
    pub q_init: f64,

    /// Random seed for the agent
    #[arg(long)]
    pub seed: Option<u64>,

    /// Random seed for the world
    #[arg(long)]
    pub world_seed: Option<u64>,

    /// Number of wandering cars
    #[arg(long, default_value_t = 3)]
    pub dummies: usize,

    /// Let trips run past their deadline
    #[arg(long)]
    pub no_deadline: bool,

    /// Hard cap on ticks per trip
    #[arg(long, default_value_t = 1_000)]
    pub max_ticks: u64,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Optional file for JSONL observations, one trip per line
    #[arg(long)]
    pub jsonl: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Window for the recent success rate
    #[arg(long, default_value_t = 10)]
    pub window: usize,
}

impl TrainArgs {
    fn update_rule(&self) -> Result<UpdateRule> {
        let kind = RuleKind::from(self.rule);
        let stock = kind.default_rule();
        if self.discount_factor.is_none() && self.learning_rate.is_none() {
            return Ok(stock);
        }
        let rule = UpdateRule::with_params(
            kind,
            self.discount_factor.unwrap_or(stock.discount_factor()),
            self.learning_rate
                .or(stock.learning_rate())
                .unwrap_or_default(),
        )?;
        Ok(rule)
    }

    fn agent_config(&self) -> Result<AgentConfig> {
        let mut config = AgentConfig::new(self.update_rule()?)
            .with_state_fields(self.state_fields.into())
            .with_timing(self.timing.into())
            .with_q_init(self.q_init);
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        Ok(config)
    }

    fn world_config(&self) -> WorldConfig {
        let config = WorldConfig::default()
            .with_dummies(self.dummies)
            .with_enforce_deadline(!self.no_deadline);
        match self.world_seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let agent_config = args.agent_config().context("invalid agent configuration")?;
    let world_config = args.world_config();
    let sim_config = SimulationConfig {
        trials: args.trials,
        max_ticks_per_trip: args.max_ticks,
    };

    let mut agent = LearningAgent::new(agent_config).context("failed to build agent")?;
    let mut world = GridWorld::new(world_config).context("invalid world configuration")?;

    println!(
        "Training {} ({}, {} states, timing {}) for {} trips",
        agent.name(),
        agent_config.fields,
        agent.q_table().len(),
        agent_config.timing,
        args.trials
    );

    let metrics = Rc::new(RefCell::new(MetricsObserver::new()));
    let milestones = Rc::new(RefCell::new(MilestoneObserver::new()));
    let mut simulator = Simulator::new(sim_config)
        .with_observer(Box::new(Rc::clone(&metrics)))
        .with_observer(Box::new(Rc::clone(&milestones)));

    if !args.no_progress {
        simulator = simulator.with_observer(Box::new(ProgressObserver::new()));
    }

    if let Some(path) = &args.jsonl {
        let observer = JsonlObserver::new(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        simulator = simulator.with_observer(Box::new(observer));
    }

    let result = simulator.run(&mut world, &mut agent)?;

    print_section("Training Complete");
    print_result(&result);
    print_kv(
        &format!("Last {} trips", args.window),
        &format!(
            "{:.1}% arrived",
            recent_success_rate(simulator.trips(), args.window) * 100.0
        ),
    );
    print_kv(
        "States visited",
        &format!(
            "{} of {}",
            format_number(agent.q_table().visited_states()),
            format_number(agent.q_table().len())
        ),
    );
    print_kv(
        "Entries updated",
        &format!(
            "{} of {}",
            format_number(agent.q_table().visited()),
            format_number(agent.q_table().len() * Action::COUNT)
        ),
    );
    let metrics = metrics.borrow().summary();
    print_kv("Penalised ticks", &format_number(metrics.penalised_ticks));
    milestones.borrow().display_summary();

    if let Some(raw) = &args.summary {
        let path = sanitize_summary_path(raw);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let summary = TrainingSummaryFile {
            result: &result,
            metrics,
            agent: agent_config,
            world: world_config,
            visited_states: agent.q_table().visited_states(),
            state_count: agent.q_table().len(),
            updated_entries: agent.q_table().visited(),
            missed_deadlines: agent.trip_log().missed_deadlines(),
        };
        let file = File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        to_writer_pretty(file, &summary)?;
        println!("\nSummary written to: {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_path_gets_json_extension() {
        assert_eq!(
            sanitize_summary_path(Path::new("out/run")),
            PathBuf::from("out/run.json")
        );
        assert_eq!(
            sanitize_summary_path(Path::new("out/run.JSON")),
            PathBuf::from("out/run.JSON")
        );
        assert_eq!(
            sanitize_summary_path(Path::new("out/run.v2")),
            PathBuf::from("out/run.v2.json")
        );
    }

    #[test]
    fn summary_path_directory_target() {
        let dir = format!("out{}", std::path::MAIN_SEPARATOR);
        assert_eq!(
            sanitize_summary_path(Path::new(&dir)),
            Path::new("out").join("training_summary.json")
        );
    }

    #[test]
    fn overrides_keep_unset_parameters() {
        let args = TrainArgs::parse_from(["train", "--rule", "online-td", "--discount-factor", "0.3"]);
        let rule = args.update_rule().unwrap();
        assert_eq!(rule.kind(), RuleKind::OnlineTd);
        assert_eq!(rule.discount_factor(), 0.3);
        assert_eq!(rule.learning_rate(), Some(0.98));
    }

    #[test]
    fn out_of_range_discount_rejected() {
        let args = TrainArgs::parse_from(["train", "--discount-factor", "1.0"]);
        assert!(args.update_rule().is_err());
    }
}
