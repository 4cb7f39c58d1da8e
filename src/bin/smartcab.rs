//! Smartcab CLI - train and compare tabular Q-learning drivers
//!
//! This CLI provides a unified interface for:
//! - Training a learning agent with a chosen update rule
//! - Comparing all update rules against baseline drivers

use anyhow::Result;
use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "smartcab")]
#[command(version, about = "Q-learning smartcab simulator", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a learning agent in the grid world
    Train(Box<smartcab::cli::commands::train::TrainArgs>),

    /// Compare every update rule against baseline drivers
    Compare(smartcab::cli::commands::compare::CompareArgs),
}

fn setup_logging(verbosity: u8) -> Result<(), fern::InitError> {
    let log_level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                Utc::now().format("[%Y-%m-%d %H:%M:%S.%6f]"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log_level)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Train(args) => smartcab::cli::commands::train::execute(*args),
        Commands::Compare(args) => smartcab::cli::commands::compare::execute(args),
    }
}
