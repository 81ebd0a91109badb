#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Horde Survival session.

mod config;
mod simulation;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::{config::SessionConfig, simulation::Session};

/// Runs a scripted Horde Survival session without a renderer.
#[derive(Debug, Parser)]
#[command(name = "horde-survival", version)]
#[command(about = "Runs a scripted Horde Survival session without a renderer")]
struct Args {
    /// TOML file describing the arena, enemy catalog and tuning.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for spawn placement and combat rolls.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Session length in simulated seconds.
    #[arg(long, default_value_t = 300)]
    seconds: u64,
    /// Simulation step in milliseconds.
    #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: u64,
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
    /// Print the session summary as JSON.
    #[arg(long)]
    json: bool,
}

/// Entry point for the Horde Survival command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config = match &args.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("loading session settings from {}", path.display()))?,
        None => SessionConfig::default(),
    };
    let mut session = Session::new(config, args.seed).context("starting session")?;
    if !args.json {
        println!("{}", session.banner());
    }

    let summary = session.run(
        Duration::from_secs(args.seconds),
        Duration::from_millis(args.tick_ms),
    );
    if args.json {
        let text = serde_json::to_string_pretty(&summary).context("serializing summary")?;
        println!("{text}");
    } else {
        println!("{summary}");
    }
    Ok(())
}

/// Logs go to stderr so `--json` output stays machine readable.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
