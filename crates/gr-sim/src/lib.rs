//! # gr-sim — Batch spin simulator
//!
//! Plays millions of seeded spins against a [`CascadeEngine`] and reports the
//! numbers used to tune its tables: return-to-player, hit rate, cascade depth,
//! bonus and grand-win frequency.
//!
//! Spin `i` always uses the generator seeded with [`spin_seed`]`(seed, i)`,
//! so a report depends only on the engine config, the seed and the spin
//! count. Thread count changes speed, never results.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gr_cascade::{CascadeEngine, EngineError, EngineResult, SpinResult};

/// Spins handed to one worker at a time
const CHUNK_SIZE: u64 = 4_096;

/// Simulator errors
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid simulation config: {0}")]
    InvalidConfig(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

/// Batch parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of spins to play
    pub spins: u64,
    /// Master seed
    pub seed: u64,
    /// Notional stake per spin, in points
    pub stake_points: u64,
    /// Worker threads (0 = one per CPU)
    pub threads: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            spins: 100_000,
            seed: 42,
            stake_points: 100,
            threads: 0,
        }
    }
}

impl SimulationConfig {
    pub fn with_spins(mut self, spins: u64) -> Self {
        self.spins = spins;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_stake(mut self, stake_points: u64) -> Self {
        self.stake_points = stake_points;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    fn validate(&self) -> Result<(), SimError> {
        if self.spins == 0 {
            return Err(SimError::InvalidConfig("spins must be at least 1".into()));
        }
        if self.stake_points == 0 {
            return Err(SimError::InvalidConfig("stake must be at least 1 point".into()));
        }
        Ok(())
    }
}

/// Aggregate numbers of a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub spins: u64,
    pub seed: u64,
    pub total_points: u64,
    /// Share of spins that paid anything
    pub hit_rate: f64,
    pub avg_cascades: f64,
    pub max_cascades: usize,
    /// Share of spins that triggered the bonus round
    pub bonus_rate: f64,
    pub grand_win_rate: f64,
    pub big_win_rate: f64,
    pub max_win: u64,
    /// Points returned per point staked
    pub rtp: f64,
    /// Spins aborted by the cascade safety cap
    pub depth_cap_failures: u64,
}

/// Running counters, merged across workers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Tally {
    spins: u64,
    wins: u64,
    total_points: u64,
    cascades: u64,
    max_cascades: usize,
    bonus: u64,
    grand: u64,
    big: u64,
    max_win: u64,
    failures: u64,
}

impl Tally {
    fn add(&mut self, outcome: &EngineResult<SpinResult>) {
        self.spins += 1;
        match outcome {
            Ok(result) => {
                let cascades = result.cascade_count();
                self.wins += u64::from(result.is_win());
                self.total_points += result.total_payout;
                self.cascades += cascades as u64;
                self.max_cascades = self.max_cascades.max(cascades);
                self.bonus += u64::from(result.bonus_triggered);
                self.grand += u64::from(result.grand_win);
                self.big += u64::from(result.big_win);
                self.max_win = self.max_win.max(result.total_payout);
            }
            Err(EngineError::CascadeDepthExceeded(_)) => self.failures += 1,
            Err(e) => {
                log::warn!("Spin failed: {e}");
                self.failures += 1;
            }
        }
    }

    fn merge(self, other: Self) -> Self {
        Self {
            spins: self.spins + other.spins,
            wins: self.wins + other.wins,
            total_points: self.total_points + other.total_points,
            cascades: self.cascades + other.cascades,
            max_cascades: self.max_cascades.max(other.max_cascades),
            bonus: self.bonus + other.bonus,
            grand: self.grand + other.grand,
            big: self.big + other.big,
            max_win: self.max_win.max(other.max_win),
            failures: self.failures + other.failures,
        }
    }

    fn report(&self, config: &SimulationConfig) -> SimulationReport {
        let ratio = |n: u64| {
            if self.spins > 0 {
                n as f64 / self.spins as f64
            } else {
                0.0
            }
        };
        let settled = self.spins - self.failures;
        let avg_cascades = if settled > 0 {
            self.cascades as f64 / settled as f64
        } else {
            0.0
        };
        let staked = self.spins as f64 * config.stake_points as f64;

        SimulationReport {
            spins: self.spins,
            seed: config.seed,
            total_points: self.total_points,
            hit_rate: ratio(self.wins),
            avg_cascades,
            max_cascades: self.max_cascades,
            bonus_rate: ratio(self.bonus),
            grand_win_rate: ratio(self.grand),
            big_win_rate: ratio(self.big),
            max_win: self.max_win,
            rtp: if staked > 0.0 {
                self.total_points as f64 / staked
            } else {
                0.0
            },
            depth_cap_failures: self.failures,
        }
    }
}

/// Seed of spin `index` in a batch seeded with `seed` (SplitMix64 mix)
pub fn spin_seed(seed: u64, index: u64) -> u64 {
    let mut z = seed ^ index.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Replay a single spin of a batch
pub fn replay(engine: &CascadeEngine, seed: u64, index: u64) -> EngineResult<SpinResult> {
    let mut rng = ChaCha8Rng::seed_from_u64(spin_seed(seed, index));
    engine.spin(&mut rng)
}

/// Batch simulator
#[derive(Debug, Clone)]
pub struct Simulator {
    config: SimulationConfig,
}

impl Simulator {
    pub fn new(config: SimulationConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Play the whole batch
    pub fn run(&self, engine: &CascadeEngine) -> Result<SimulationReport, SimError> {
        let config = &self.config;
        let threads = if config.threads == 0 {
            num_cpus::get()
        } else {
            config.threads
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| SimError::ThreadPool(e.to_string()))?;

        log::info!(
            "Simulating {} spins (seed {}) on {} threads",
            config.spins,
            config.seed,
            threads
        );

        let chunks = config.spins.div_ceil(CHUNK_SIZE);
        let tally = pool.install(|| {
            (0..chunks)
                .into_par_iter()
                .map(|chunk| {
                    let start = chunk * CHUNK_SIZE;
                    let end = (start + CHUNK_SIZE).min(config.spins);
                    let mut tally = Tally::default();
                    for index in start..end {
                        tally.add(&replay(engine, config.seed, index));
                    }
                    log::debug!("Chunk {chunk} done ({} spins)", end - start);
                    tally
                })
                .reduce(Tally::default, Tally::merge)
        });

        let report = tally.report(config);
        if report.depth_cap_failures > 0 {
            log::warn!(
                "{} spins hit the cascade depth cap",
                report.depth_cap_failures
            );
        }
        log::info!(
            "RTP {:.2}%, hit rate {:.2}%, bonus 1 in {:.0}",
            report.rtp * 100.0,
            report.hit_rate * 100.0,
            if report.bonus_rate > 0.0 {
                1.0 / report.bonus_rate
            } else {
                f64::INFINITY
            }
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> CascadeEngine {
        CascadeEngine::grocery_run().unwrap()
    }

    #[test]
    fn test_zero_spins_rejected() {
        let config = SimulationConfig::default().with_spins(0);
        assert!(matches!(Simulator::new(config), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_spin_seeds_differ() {
        assert_ne!(spin_seed(42, 0), spin_seed(42, 1));
        assert_ne!(spin_seed(1, 0), spin_seed(2, 0));
        assert_eq!(spin_seed(7, 9), spin_seed(7, 9));
    }

    #[test]
    fn test_thread_count_does_not_change_report() {
        let engine = engine();
        let base = SimulationConfig::default().with_spins(2_000).with_seed(9);

        let single = Simulator::new(base.clone().with_threads(1))
            .unwrap()
            .run(&engine)
            .unwrap();
        let multi = Simulator::new(base.with_threads(4))
            .unwrap()
            .run(&engine)
            .unwrap();

        assert_eq!(single, multi);
        assert_eq!(single.spins, 2_000);
        assert_eq!(single.depth_cap_failures, 0);
    }

    #[test]
    fn test_report_consistency() {
        let engine = engine();
        let config = SimulationConfig::default().with_spins(1_000).with_stake(50);
        let report = Simulator::new(config).unwrap().run(&engine).unwrap();

        assert!((0.0..=1.0).contains(&report.hit_rate));
        assert!(report.max_win <= report.total_points);
        approx::assert_relative_eq!(report.rtp, report.total_points as f64 / 50_000.0);
        assert!(report.max_cascades <= engine.config().max_cascade_depth);
        assert_eq!(report.depth_cap_failures, 0);
    }

    #[test]
    fn test_replay_matches_batch_spin() {
        let engine = engine();
        let a = replay(&engine, 42, 17).unwrap();
        let b = replay(&engine, 42, 17).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_tally_merge() {
        let a = Tally {
            spins: 2,
            wins: 1,
            total_points: 30,
            max_win: 30,
            ..Tally::default()
        };
        let b = Tally {
            spins: 3,
            wins: 2,
            total_points: 90,
            max_win: 60,
            failures: 1,
            ..Tally::default()
        };
        let merged = a.merge(b);
        assert_eq!(merged.spins, 5);
        assert_eq!(merged.total_points, 120);
        assert_eq!(merged.max_win, 60);
        assert_eq!(merged.failures, 1);
    }
}
