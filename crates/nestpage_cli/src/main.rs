//! nestpage - replay nested pager scenarios
//!
//! Commands:
//! - `run <scenario.json>` replays a gesture scenario and prints a JSON report
//! - `check-config <pager.toml>` validates a pager configuration file

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use nestpage_cli::{run_loaded_scenario, Scenario};
use nestpage_pager::PagerConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Nested pager scenario runner
#[derive(Parser, Debug)]
#[command(name = "nestpage")]
#[command(about = "Replay nested pager gesture scenarios", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a scenario file
    Run {
        /// Scenario JSON file
        scenario: PathBuf,

        /// Pager config (TOML), replaces the scenario's own
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Validate a pager config file and print it with defaults filled in
    CheckConfig {
        /// Config TOML file
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            scenario,
            config,
            report,
        } => cmd_run(scenario, config, report),
        Commands::CheckConfig { path } => cmd_check_config(path),
    }
}

fn cmd_run(scenario: PathBuf, config: Option<PathBuf>, report: Option<PathBuf>) -> Result<()> {
    let loaded = Scenario::from_path(&scenario)?;
    let config = match config {
        Some(path) => Some(
            PagerConfig::load(&path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
        ),
        None => None,
    };

    tracing::info!(
        "Running {} ({} steps)",
        scenario.display(),
        loaded.steps.len()
    );
    let outcome = run_loaded_scenario(&loaded, config.as_ref());

    match report {
        Some(path) => {
            outcome.report().write_to_path(&path)?;
            tracing::info!("Report written to {}", path.display());
        }
        None => outcome.report().write_to_writer(&mut std::io::stdout().lock())?,
    }

    if outcome.is_failed() {
        let report = outcome.report();
        bail!(
            "scenario failed at step {}: {}",
            report.failed_step_index.unwrap_or_default(),
            report.message.as_deref().unwrap_or("unknown failure")
        );
    }
    Ok(())
}

fn cmd_check_config(path: PathBuf) -> Result<()> {
    let config = PagerConfig::load(&path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    if config.sticky_offset < 0.0 {
        tracing::warn!("sticky_offset {} will be clamped to 0", config.sticky_offset);
    }
    print!("{}", config.to_toml()?);
    Ok(())
}
