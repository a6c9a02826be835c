//! Play session: eligibility, limits, spin and recording in one call

use std::collections::HashSet;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::CascadeEngine;
use crate::error::EngineError;
use crate::limits::{Allowance, LimitError, SpinLimiter};
use crate::rng::RandomSource;
use crate::spin::SpinResult;
use crate::stats::{PlayerStats, RecordError, SpinRecorder};

/// Session errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Player not eligible: {0}")]
    NotEligible(String),

    #[error("Limit error: {0}")]
    Limit(#[from] LimitError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Record error: {0}")]
    Record(#[from] RecordError),
}

/// Decides whether a player may play at all
pub trait Eligibility: Send + Sync {
    fn check(&self, user: &str) -> Result<(), SessionError>;
}

/// Eligibility backed by a set of approved players
#[derive(Debug, Default)]
pub struct AllowList {
    users: RwLock<HashSet<String>>,
}

impl AllowList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(&self, user: impl Into<String>) {
        self.users.write().insert(user.into());
    }

    pub fn revoke(&self, user: &str) -> bool {
        self.users.write().remove(user)
    }

    pub fn contains(&self, user: &str) -> bool {
        self.users.read().contains(user)
    }
}

impl<S: Into<String>> FromIterator<S> for AllowList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            users: RwLock::new(iter.into_iter().map(Into::into).collect()),
        }
    }
}

impl Eligibility for AllowList {
    fn check(&self, user: &str) -> Result<(), SessionError> {
        if self.contains(user) {
            Ok(())
        } else {
            Err(SessionError::NotEligible(user.to_string()))
        }
    }
}

/// Everything one played spin produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayOutcome {
    pub result: SpinResult,
    /// Points banked after the daily cap, base and free spins together
    pub awarded_points: u64,
    /// The daily cap cut the win
    pub capped: bool,
    pub allowance: Allowance,
    pub stats: PlayerStats,
    /// This spin raised the player's airdrop flag
    pub airdrop_triggered: bool,
}

/// Plays spins for players against an engine and its collaborators
pub struct PlaySession<'a, E, L, R>
where
    E: Eligibility,
    L: SpinLimiter,
    R: SpinRecorder,
{
    engine: &'a CascadeEngine,
    eligibility: E,
    limiter: L,
    recorder: R,
}

impl<'a, E, L, R> PlaySession<'a, E, L, R>
where
    E: Eligibility,
    L: SpinLimiter,
    R: SpinRecorder,
{
    pub fn new(engine: &'a CascadeEngine, eligibility: E, limiter: L, recorder: R) -> Self {
        Self {
            engine,
            eligibility,
            limiter,
            recorder,
        }
    }

    pub fn limiter(&self) -> &L {
        &self.limiter
    }

    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    /// Play one spin for `user` on `day`
    ///
    /// Eligibility and the spin allowance are checked before the engine runs;
    /// a spin the engine fails to play is handed back to the limiter. The base
    /// spin and every bonus spin are recorded separately, bonus spins as
    /// [`SpinType::Free`](crate::spin::SpinType::Free) without touching the
    /// spin allowance. Recorded wins are the amounts banked after the daily
    /// points cap.
    pub fn play<G: RandomSource + ?Sized>(
        &self,
        user: &str,
        day: u64,
        rng: &mut G,
    ) -> Result<PlayOutcome, SessionError> {
        self.eligibility.check(user)?;
        self.limiter.acquire(user, day)?;

        let result = match self.engine.spin(rng) {
            Ok(result) => result,
            Err(e) => {
                self.limiter.release(user, day);
                log::warn!("Spin for {user} failed, allowance returned: {e}");
                return Err(e.into());
            }
        };

        let mut awarded_points = 0;
        let mut stats = PlayerStats::default();
        let mut airdrop_triggered = false;
        for record in result.records() {
            let awarded = self.limiter.settle(user, day, record.win_amount);
            awarded_points += awarded;
            let recorded = self.recorder.record(user, &record.with_win_amount(awarded))?;
            airdrop_triggered |= recorded.airdrop_triggered;
            stats = recorded.stats;
        }
        let capped = awarded_points < result.total_payout;

        if airdrop_triggered {
            log::info!("Airdrop flagged for {user}");
        }

        Ok(PlayOutcome {
            allowance: self.limiter.remaining(user, day),
            result,
            awarded_points,
            capped,
            stats,
            airdrop_triggered,
        })
    }
}
