//! Compare command - Run every update rule and the baselines side-by-side

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    app::{AgentConfig, DEFAULT_Q_INIT},
    cli::output::{print_kv, print_result, print_section, print_subsection},
    pipeline::{Driver, RandomDriver, SimulationConfig, WaypointDriver, compare_drivers},
    q_learning::{LearningAgent, RuleKind},
    world::WorldConfig,
};

#[derive(Parser, Debug)]
#[command(about = "Compare update rules against baseline drivers")]
pub struct CompareArgs {
    /// Number of trips per driver
    #[arg(long, short = 'n', default_value_t = 100)]
    pub trials: usize,

    /// Export comparison results to CSV
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Random seed; the world gets this seed, driver `i` gets `seed + i`
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Initial value of every state-action pair
    #[arg(long, default_value_t = DEFAULT_Q_INIT)]
    pub q_init: f64,

    /// Number of wandering cars
    #[arg(long, default_value_t = 3)]
    pub dummies: usize,

    /// Leave out the planner-following baseline
    #[arg(long)]
    pub no_waypoint_baseline: bool,
}

fn create_drivers(args: &CompareArgs) -> Result<Vec<Box<dyn Driver>>> {
    let mut drivers: Vec<Box<dyn Driver>> = Vec::new();
    for (i, kind) in RuleKind::ALL.into_iter().enumerate() {
        let config = AgentConfig::new(kind.default_rule())
            .with_q_init(args.q_init)
            .with_seed(args.seed.wrapping_add(i as u64));
        let agent = LearningAgent::new(config)
            .with_context(|| format!("failed to build {kind} agent"))?;
        drivers.push(Box::new(agent));
    }

    let next_seed = args.seed.wrapping_add(RuleKind::ALL.len() as u64);
    drivers.push(Box::new(RandomDriver::with_seed("Random", next_seed)));
    if !args.no_waypoint_baseline {
        drivers.push(Box::new(WaypointDriver::new("Waypoint")));
    }
    Ok(drivers)
}

pub fn execute(args: CompareArgs) -> Result<()> {
    let drivers = create_drivers(&args)?;

    println!("Comparing {} drivers:", drivers.len());
    for (i, driver) in drivers.iter().enumerate() {
        println!("  {}: {}", i + 1, driver.name());
    }
    println!("\nTrips per driver: {}", args.trials);

    let world = WorldConfig::default()
        .with_dummies(args.dummies)
        .with_seed(args.seed);
    let sim = SimulationConfig::default().with_trials(args.trials);
    let comparison = compare_drivers(drivers, world, sim)?;

    print_section("Comparison Results");
    for result in &comparison.results {
        print_subsection(&result.driver);
        print_result(result);
    }

    if let Some(best) = comparison.best() {
        println!();
        print_kv(
            "Best driver",
            &format!("{} ({:.1}% arrived)", best.driver, best.success_rate * 100.0),
        );
    }

    if let Some(output_path) = &args.output {
        comparison
            .export_csv(output_path)
            .with_context(|| format!("failed to write {}", output_path.display()))?;
        println!("\nResults exported to: {}", output_path.display());
    }

    Ok(())
}
