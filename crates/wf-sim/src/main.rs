//! WheelForge Session Driver
//!
//! Usage:
//!   wf-sim run --session table.yaml --spins 20 --seed 7
//!   wf-sim balance --session table.yaml
//!   wf-sim selftest --weights 1,2,3,4 --samples 100000

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use wf_core::{RandomStream, WheelSide};
use wf_outcome::{BalanceReport, DistributionCheck};
use wf_spin::{SessionConfig, SessionStats, SpinEngine, SpinRequest, SpinResult};

#[derive(Parser)]
#[command(name = "wf-sim", about = "WheelForge session driver")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play spins through a session file
    Run {
        /// Session file (.yaml/.yml or .json)
        #[arg(short, long)]
        session: PathBuf,
        /// Number of spins
        #[arg(short = 'n', long, default_value_t = 10)]
        spins: usize,
        /// Stream seed; time-based when omitted
        #[arg(long)]
        seed: Option<u32>,
        /// Initial angular velocity for every wheel (rad/s)
        #[arg(short, long, default_value_t = 20.0)]
        velocity: f64,
        /// Players taking turns, comma separated
        #[arg(short, long, value_delimiter = ',', default_value = "player")]
        players: Vec<String>,
        /// Print every spin result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Probability vs. drawn wedge size for every wheel
    Balance {
        /// Session file (.yaml/.yml or .json)
        #[arg(short, long)]
        session: PathBuf,
    },
    /// Sample a weight vector and compare with the exact probabilities
    Selftest {
        /// Weights, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        weights: Vec<f64>,
        #[arg(long, default_value_t = 100_000)]
        samples: usize,
        #[arg(long, default_value_t = 12345)]
        seed: u32,
        /// Largest accepted |observed - expected|
        #[arg(long, default_value_t = 0.01)]
        tolerance: f64,
    },
}

/// End-of-run summary
#[derive(Serialize)]
struct RunSummary<'a> {
    session: &'a str,
    seed: u32,
    stats: &'a SessionStats,
    scores: Vec<(&'a str, i64)>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            session,
            spins,
            seed,
            velocity,
            players,
            json,
        } => run_session(&session, spins, seed, velocity, &players, json),
        Commands::Balance { session } => balance(&session),
        Commands::Selftest {
            weights,
            samples,
            seed,
            tolerance,
        } => selftest(&weights, samples, seed, tolerance),
    }
}

fn load_session(path: &Path) -> Result<SessionConfig> {
    SessionConfig::load(path).with_context(|| format!("Failed to load session {}", path.display()))
}

fn run_session(
    path: &Path,
    spins: usize,
    seed: Option<u32>,
    velocity: f64,
    players: &[String],
    json: bool,
) -> Result<()> {
    if players.is_empty() {
        bail!("At least one player is required");
    }

    let config = load_session(path)?;
    let rng = seed.map_or_else(RandomStream::from_time, RandomStream::new);
    let seed = rng.seed();
    let mut engine = SpinEngine::new(config, rng).context("Invalid session")?;

    log::info!(
        "Session '{}': {} spins, seed {}, {} players",
        engine.config().name,
        spins,
        seed,
        players.len()
    );

    for (turn, player) in players.iter().cycle().take(spins).enumerate() {
        let result = engine
            .spin(&SpinRequest::uniform(player, velocity))
            .with_context(|| format!("Spin {} failed", turn + 1))?;
        if json {
            println!("{}", serde_json::to_string(&result)?);
        } else {
            print_spin(&result);
        }
    }

    let mut scores: Vec<(&str, i64)> = engine
        .scores()
        .iter()
        .map(|(id, score)| (id.as_str(), *score))
        .collect();
    scores.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let summary = RunSummary {
        session: &engine.config().name,
        seed,
        stats: engine.stats(),
        scores,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if engine.stats().unsettled_spins > 0 {
        println!(
            "⚠️  {} spins hit the step ceiling before settling",
            engine.stats().unsettled_spins
        );
    }
    Ok(())
}

fn print_spin(result: &SpinResult) {
    let wedge = |side| {
        result
            .selection(side)
            .map_or("-", |s| s.label.as_str())
    };
    println!(
        "{} {:<10} {:>8} | {:>8} | {:<8} {:+5} → {:<6} ({} steps)",
        result.spin_id,
        result.player_id,
        wedge(WheelSide::Outer),
        wedge(WheelSide::Inner),
        result.verdict.outcome,
        result.verdict.score_delta,
        result.score_after,
        result.physics.steps
    );
    for message in &result.verdict.messages {
        println!("    {message}");
    }
}

fn balance(path: &Path) -> Result<()> {
    let config = load_session(path)?;
    let engine = SpinEngine::new(config, RandomStream::default()).context("Invalid session")?;
    let reports: Vec<BalanceReport> = engine.balance_report()?;

    println!("{}", serde_json::to_string_pretty(&reports)?);
    for report in &reports {
        for entry in report.imbalanced() {
            println!(
                "⚠️  {}/{}: probability {:.3} vs drawn {:.3} ({:?})",
                report.wheel_id, entry.wedge_id, entry.probability, entry.visual_share, entry.rating
            );
        }
    }
    Ok(())
}

fn selftest(weights: &[f64], samples: usize, seed: u32, tolerance: f64) -> Result<()> {
    let report = DistributionCheck::new(weights, samples, seed)
        .execute()
        .context("Self-test could not run")?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.is_within(tolerance) {
        let worst = report.worst_index().unwrap_or(0);
        bail!(
            "Distribution off by {:.4} at index {} (tolerance {})",
            report.max_deviation,
            worst,
            tolerance
        );
    }
    println!("✅ {} samples within {}", samples, tolerance);
    Ok(())
}
