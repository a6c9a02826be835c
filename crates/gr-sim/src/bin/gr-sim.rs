//! Grocery Run simulator CLI
//!
//! Usage:
//!   gr-sim --spins 1000000 --seed 42
//!   gr-sim --config tuned.yaml --json
//!   gr-sim --replay 1234 --seed 42

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use gr_cascade::{CascadeEngine, EngineConfig};
use gr_sim::{SimulationConfig, Simulator, replay};

#[derive(Parser)]
#[command(name = "gr-sim", about = "Batch spin simulator for the Grocery Run cascade engine")]
struct Cli {
    /// Number of spins
    #[arg(short, long, default_value_t = 100_000)]
    spins: u64,

    /// Master seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Stake per spin in points (RTP denominator)
    #[arg(long, default_value_t = 100)]
    stake: u64,

    /// Worker threads (0 = one per CPU)
    #[arg(short, long, default_value_t = 0)]
    threads: usize,

    /// Engine config (.json, .yaml or .yml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Print one spin of the batch instead of simulating
    #[arg(long)]
    replay: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let engine_config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    let engine = CascadeEngine::new(engine_config).context("invalid engine config")?;

    if let Some(index) = cli.replay {
        let result = replay(&engine, cli.seed, index)
            .with_context(|| format!("spin {index} of seed {} failed", cli.seed))?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let sim_config = SimulationConfig {
        spins: cli.spins,
        seed: cli.seed,
        stake_points: cli.stake,
        threads: cli.threads,
    };
    let report = Simulator::new(sim_config)?.run(&engine)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Spins:             {}", report.spins);
        println!("Seed:              {}", report.seed);
        println!("RTP:               {:.2}%", report.rtp * 100.0);
        println!("Hit rate:          {:.2}%", report.hit_rate * 100.0);
        println!("Avg cascades:      {:.3}", report.avg_cascades);
        println!("Max cascades:      {}", report.max_cascades);
        println!("Bonus rate:        {:.4}%", report.bonus_rate * 100.0);
        println!("Grand win rate:    {:.5}%", report.grand_win_rate * 100.0);
        println!("Big win rate:      {:.4}%", report.big_win_rate * 100.0);
        println!("Max win:           {}", report.max_win);
        println!("Depth cap hits:    {}", report.depth_cap_failures);
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<EngineConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    let config = if is_yaml {
        EngineConfig::from_yaml(&text)
    } else {
        EngineConfig::from_json(&text)
    };
    config.with_context(|| format!("failed to load {}", path.display()))
}
