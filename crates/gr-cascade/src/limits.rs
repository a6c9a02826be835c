//! Daily spin and points allowance
//!
//! Days are plain UTC day indices supplied by the caller, so the limiter
//! never reads a clock and replays are exact.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SECONDS_PER_DAY: u64 = 86_400;

/// UTC day index of a unix timestamp
pub fn day_index(unix_secs: u64) -> u64 {
    unix_secs / SECONDS_PER_DAY
}

/// Limit errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LimitError {
    #[error("Daily spin limit reached ({used}/{limit})")]
    SpinsExhausted { used: u32, limit: u32 },

    #[error("Invalid user id")]
    InvalidUser,
}

/// Per-player daily allowance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyAllowance {
    pub spins_per_day: u32,
    /// Points a player can bank per day
    pub points_cap: u64,
}

impl Default for DailyAllowance {
    fn default() -> Self {
        Self {
            spins_per_day: 10,
            points_cap: 5_000,
        }
    }
}

/// What is left of a player's day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allowance {
    pub day: u64,
    pub spins_used: u32,
    pub spins_remaining: u32,
    pub points_won: u64,
    pub points_remaining: u64,
}

/// Gatekeeper for spins and banked points
pub trait SpinLimiter: Send + Sync {
    /// Take one spin from the player's allowance for `day`
    fn acquire(&self, user: &str, day: u64) -> Result<Allowance, LimitError>;

    /// Give back a spin taken by `acquire` that never played
    fn release(&self, user: &str, day: u64);

    /// Bank `points` for `day`, returning what fits under the cap
    fn settle(&self, user: &str, day: u64, points: u64) -> u64;

    /// Current allowance without consuming anything
    fn remaining(&self, user: &str, day: u64) -> Allowance;
}

#[derive(Debug, Clone, Copy, Default)]
struct DayUsage {
    day: u64,
    spins_used: u32,
    points_won: u64,
}

impl DayUsage {
    /// Start over when the day has moved on
    fn roll(&mut self, day: u64) {
        if day != self.day {
            *self = DayUsage {
                day,
                ..DayUsage::default()
            };
        }
    }
}

/// In-process daily limiter
#[derive(Debug, Default)]
pub struct DailyLimiter {
    allowance: DailyAllowance,
    usage: Mutex<HashMap<String, DayUsage>>,
}

impl DailyLimiter {
    pub fn new(allowance: DailyAllowance) -> Self {
        Self {
            allowance,
            usage: Mutex::new(HashMap::new()),
        }
    }

    pub fn allowance(&self) -> DailyAllowance {
        self.allowance
    }

    fn snapshot(&self, usage: &DayUsage) -> Allowance {
        Allowance {
            day: usage.day,
            spins_used: usage.spins_used,
            spins_remaining: self.allowance.spins_per_day.saturating_sub(usage.spins_used),
            points_won: usage.points_won,
            points_remaining: self.allowance.points_cap.saturating_sub(usage.points_won),
        }
    }
}

impl SpinLimiter for DailyLimiter {
    fn acquire(&self, user: &str, day: u64) -> Result<Allowance, LimitError> {
        if user.is_empty() {
            return Err(LimitError::InvalidUser);
        }
        let mut usage = self.usage.lock();
        let entry = usage.entry(user.to_string()).or_insert(DayUsage {
            day,
            ..DayUsage::default()
        });
        entry.roll(day);

        if entry.spins_used >= self.allowance.spins_per_day {
            return Err(LimitError::SpinsExhausted {
                used: entry.spins_used,
                limit: self.allowance.spins_per_day,
            });
        }
        entry.spins_used += 1;
        Ok(self.snapshot(entry))
    }

    fn release(&self, user: &str, day: u64) {
        let mut usage = self.usage.lock();
        if let Some(entry) = usage.get_mut(user) {
            if entry.day == day {
                entry.spins_used = entry.spins_used.saturating_sub(1);
            }
        }
    }

    fn settle(&self, user: &str, day: u64, points: u64) -> u64 {
        let mut usage = self.usage.lock();
        let entry = usage.entry(user.to_string()).or_insert(DayUsage {
            day,
            ..DayUsage::default()
        });
        entry.roll(day);

        let awarded = points.min(self.allowance.points_cap.saturating_sub(entry.points_won));
        entry.points_won += awarded;
        if awarded < points {
            log::debug!("Daily cap reached for {user}: {points} won, {awarded} banked");
        }
        awarded
    }

    fn remaining(&self, user: &str, day: u64) -> Allowance {
        let usage = self.usage.lock();
        let mut current = usage.get(user).copied().unwrap_or(DayUsage {
            day,
            ..DayUsage::default()
        });
        current.roll(day);
        self.snapshot(&current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_index() {
        assert_eq!(day_index(0), 0);
        assert_eq!(day_index(86_399), 0);
        assert_eq!(day_index(86_400), 1);
        // 2024-01-01T00:00:00Z
        assert_eq!(day_index(1_704_067_200), 19_723);
    }

    #[test]
    fn test_spin_limit() {
        let limiter = DailyLimiter::new(DailyAllowance {
            spins_per_day: 2,
            points_cap: 100,
        });
        assert_eq!(limiter.acquire("a", 5).unwrap().spins_remaining, 1);
        assert_eq!(limiter.acquire("a", 5).unwrap().spins_remaining, 0);
        assert_eq!(
            limiter.acquire("a", 5),
            Err(LimitError::SpinsExhausted { used: 2, limit: 2 })
        );
        // Other players are independent
        assert!(limiter.acquire("b", 5).is_ok());
    }

    #[test]
    fn test_release_returns_spin() {
        let limiter = DailyLimiter::new(DailyAllowance {
            spins_per_day: 1,
            points_cap: 100,
        });
        limiter.acquire("a", 3).unwrap();
        limiter.release("a", 3);
        assert_eq!(limiter.remaining("a", 3).spins_remaining, 1);
        assert!(limiter.acquire("a", 3).is_ok());

        // A stale day or unknown player is left alone
        limiter.release("a", 2);
        limiter.release("nobody", 3);
        assert_eq!(limiter.remaining("a", 3).spins_used, 1);
        assert_eq!(limiter.remaining("nobody", 3).spins_used, 0);
    }

    #[test]
    fn test_points_cap() {
        let limiter = DailyLimiter::default();
        assert_eq!(limiter.settle("a", 1, 4_000), 4_000);
        assert_eq!(limiter.settle("a", 1, 4_000), 1_000);
        assert_eq!(limiter.settle("a", 1, 50), 0);
        assert_eq!(limiter.remaining("a", 1).points_remaining, 0);
    }

    #[test]
    fn test_new_day_resets() {
        let limiter = DailyLimiter::new(DailyAllowance {
            spins_per_day: 1,
            points_cap: 10,
        });
        limiter.acquire("a", 7).unwrap();
        limiter.settle("a", 7, 10);
        assert!(limiter.acquire("a", 7).is_err());

        let next = limiter.remaining("a", 8);
        assert_eq!(next.spins_remaining, 1);
        assert_eq!(next.points_remaining, 10);
        assert!(limiter.acquire("a", 8).is_ok());
        assert_eq!(limiter.settle("a", 8, 25), 10);
    }
}
