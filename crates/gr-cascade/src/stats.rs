//! Player statistics and the recording collaborator

use std::collections::{HashMap, VecDeque};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spin::SpinRecord;

/// Recording errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid user id")]
    InvalidUser,
}

/// Running statistics of one player
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub total_spins: u64,
    pub total_wins: u64,
    pub total_points: u64,
    pub biggest_win: u64,
    /// Bonus rounds triggered
    pub bonus_rounds: u64,
    pub grand_wins: u64,
    /// Set by the first grand win, cleared when the airdrop is paid out
    pub pending_airdrop: bool,
    /// Consecutive winning spins
    pub current_streak: u64,
    pub best_streak: u64,
    /// Highest combo multiplier ever reached
    pub highest_combo: f64,
}

impl PlayerStats {
    /// Fold one spin into the statistics
    ///
    /// Returns true when this spin raised a new airdrop flag.
    pub fn apply(&mut self, record: &SpinRecord) -> bool {
        let win = record.is_win();

        self.total_spins += 1;
        if win {
            self.total_wins += 1;
            self.current_streak += 1;
        } else {
            self.current_streak = 0;
        }
        self.best_streak = self.best_streak.max(self.current_streak);
        self.total_points += record.win_amount;
        self.biggest_win = self.biggest_win.max(record.win_amount);
        self.highest_combo = self.highest_combo.max(record.max_combo);

        if record.triggered_bonus {
            self.bonus_rounds += 1;
        }

        let airdrop = record.is_grand_win && !self.pending_airdrop;
        if record.is_grand_win {
            self.grand_wins += 1;
            self.pending_airdrop = true;
        }
        airdrop
    }

    /// Win rate in percent
    pub fn win_rate(&self) -> f64 {
        if self.total_spins > 0 {
            (self.total_wins as f64 / self.total_spins as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Result of recording one spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub stats: PlayerStats,
    /// This spin raised the airdrop flag
    pub airdrop_triggered: bool,
}

/// Persistence collaborator for spin results
///
/// Implementations must be usable from several threads at once.
pub trait SpinRecorder: Send + Sync {
    /// Record a spin, creating the player on first play
    fn record(&self, user: &str, record: &SpinRecord) -> Result<RecordOutcome, RecordError>;

    /// Current statistics of a player
    fn stats(&self, user: &str) -> Option<PlayerStats>;
}

/// Records kept per player by default
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// In-process recorder
///
/// Keeps full statistics but only the latest `history_limit` records of
/// each player.
#[derive(Debug)]
pub struct MemoryRecorder {
    players: RwLock<HashMap<String, PlayerStats>>,
    history: RwLock<HashMap<String, VecDeque<SpinRecord>>>,
    history_limit: usize,
}

impl Default for MemoryRecorder {
    fn default() -> Self {
        Self {
            players: RwLock::new(HashMap::new()),
            history: RwLock::new(HashMap::new()),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: records kept per player (0 disables history)
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Latest spins of a player, oldest first
    pub fn history(&self, user: &str) -> Vec<SpinRecord> {
        self.history
            .read()
            .get(user)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Clear a player's airdrop flag once paid
    pub fn clear_airdrop(&self, user: &str) -> bool {
        match self.players.write().get_mut(user) {
            Some(stats) if stats.pending_airdrop => {
                stats.pending_airdrop = false;
                true
            }
            _ => false,
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.read().len()
    }
}

impl SpinRecorder for MemoryRecorder {
    fn record(&self, user: &str, record: &SpinRecord) -> Result<RecordOutcome, RecordError> {
        if user.is_empty() {
            return Err(RecordError::InvalidUser);
        }

        let outcome = {
            let mut players = self.players.write();
            let stats = players.entry(user.to_string()).or_default();
            let airdrop_triggered = stats.apply(record);
            RecordOutcome {
                stats: stats.clone(),
                airdrop_triggered,
            }
        };
        if self.history_limit > 0 {
            let mut history = self.history.write();
            let entries = history.entry(user.to_string()).or_default();
            if entries.len() >= self.history_limit {
                entries.pop_front();
            }
            entries.push_back(record.clone());
        }

        log::trace!("Recorded spin for {user}: {} points", record.win_amount);
        Ok(outcome)
    }

    fn stats(&self, user: &str) -> Option<PlayerStats> {
        self.players.read().get(user).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spin::SpinType;

    fn record(win: u64) -> SpinRecord {
        SpinRecord {
            win_amount: win,
            cascade_count: usize::from(win > 0),
            triggered_bonus: false,
            is_grand_win: false,
            spin_type: SpinType::Base,
            max_combo: 1.0,
        }
    }

    #[test]
    fn test_streaks() {
        let mut stats = PlayerStats::default();
        for win in [10, 20, 0, 5, 5, 5] {
            stats.apply(&record(win));
        }
        assert_eq!(stats.total_spins, 6);
        assert_eq!(stats.total_wins, 5);
        assert_eq!(stats.current_streak, 3);
        assert_eq!(stats.best_streak, 3);
        assert_eq!(stats.biggest_win, 20);
        assert_eq!(stats.total_points, 45);
    }

    #[test]
    fn test_loss_resets_streak() {
        let mut stats = PlayerStats::default();
        stats.apply(&record(10));
        stats.apply(&record(10));
        stats.apply(&record(0));
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.best_streak, 2);
    }

    #[test]
    fn test_airdrop_raised_once() {
        let recorder = MemoryRecorder::new();
        let mut grand = record(10_000);
        grand.is_grand_win = true;

        let first = recorder.record("alice", &grand).unwrap();
        assert!(first.airdrop_triggered);
        assert!(first.stats.pending_airdrop);

        let second = recorder.record("alice", &grand).unwrap();
        assert!(!second.airdrop_triggered);
        assert_eq!(second.stats.grand_wins, 2);

        assert!(recorder.clear_airdrop("alice"));
        assert!(!recorder.stats("alice").unwrap().pending_airdrop);
    }

    #[test]
    fn test_upsert_on_first_play() {
        let recorder = MemoryRecorder::new();
        assert!(recorder.stats("bob").is_none());
        recorder.record("bob", &record(0)).unwrap();
        assert_eq!(recorder.stats("bob").unwrap().total_spins, 1);
        assert_eq!(recorder.player_count(), 1);
        assert_eq!(recorder.history("bob").len(), 1);
        assert_eq!(recorder.record("", &record(0)), Err(RecordError::InvalidUser));
    }

    #[test]
    fn test_history_keeps_latest_records() {
        let recorder = MemoryRecorder::new().with_history_limit(3);
        for win in 1..=5 {
            recorder.record("carol", &record(win)).unwrap();
        }
        let wins: Vec<u64> = recorder.history("carol").iter().map(|r| r.win_amount).collect();
        assert_eq!(wins, vec![3, 4, 5]);
        // Statistics still cover every spin
        assert_eq!(recorder.stats("carol").unwrap().total_spins, 5);

        let silent = MemoryRecorder::new().with_history_limit(0);
        silent.record("carol", &record(1)).unwrap();
        assert!(silent.history("carol").is_empty());
        assert_eq!(MemoryRecorder::new().history_limit(), DEFAULT_HISTORY_LIMIT);
    }
}
