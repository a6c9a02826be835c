//! Spin results and the record handed to persistence

use serde::{Deserialize, Serialize};

use crate::bonus::BonusRoundResult;
use crate::cascade::CascadeStep;
use crate::grid::Grid;

/// How a spin was paid for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinType {
    /// Counted against the daily allowance
    #[default]
    Base,
    /// Bonus-round spin, granted outside the allowance
    Free,
}

/// Complete outcome of one spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinResult {
    /// Grid as first drawn
    pub initial_grid: Grid,
    /// Base-game cascade steps, in order
    pub steps: Vec<CascadeStep>,
    /// Settled base-game grid
    pub final_grid: Grid,
    /// Sum of base-game step payouts
    pub base_payout: u64,
    /// Bonus round, when one was triggered
    pub bonus: Option<BonusRoundResult>,
    /// Grand-win points (0 when not hit)
    pub jackpot_award: u64,
    /// Base payout + bonus payout + jackpot award
    pub total_payout: u64,
    pub bonus_triggered: bool,
    pub grand_win: bool,
    /// Any cluster reached the big-win size
    pub big_win: bool,
}

impl SpinResult {
    /// Number of base-game cascade steps
    pub fn cascade_count(&self) -> usize {
        self.steps.len()
    }

    pub fn is_win(&self) -> bool {
        self.total_payout > 0
    }

    /// Highest combo multiplier reached in the base game (1.0 without steps)
    pub fn max_combo_multiplier(&self) -> f64 {
        self.steps
            .iter()
            .map(|s| s.multiplier)
            .fold(1.0, f64::max)
    }

    pub fn bonus_payout(&self) -> u64 {
        self.bonus.as_ref().map_or(0, |b| b.total_payout)
    }

    /// Record for the persistence collaborator
    pub fn record(&self, spin_type: SpinType) -> SpinRecord {
        SpinRecord {
            win_amount: self.total_payout,
            cascade_count: self.cascade_count(),
            triggered_bonus: self.bonus_triggered,
            is_grand_win: self.grand_win,
            spin_type,
            max_combo: self.max_combo_multiplier(),
        }
    }

    /// One record per played spin: the base spin, then each bonus spin
    ///
    /// The base record carries the base payout and the jackpot award; the
    /// win amounts add up to `total_payout`.
    pub fn records(&self) -> Vec<SpinRecord> {
        let mut records = vec![SpinRecord {
            win_amount: self.base_payout + self.jackpot_award,
            ..self.record(SpinType::Base)
        }];
        if let Some(bonus) = &self.bonus {
            records.extend(bonus.spins.iter().map(|spin| SpinRecord {
                win_amount: spin.payout,
                cascade_count: spin.steps.len(),
                triggered_bonus: spin.retriggered,
                is_grand_win: false,
                spin_type: SpinType::Free,
                max_combo: spin.steps.iter().map(|s| s.multiplier).fold(1.0, f64::max),
            }));
        }
        records
    }
}

/// Plain data record of a spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinRecord {
    pub win_amount: u64,
    pub cascade_count: usize,
    pub triggered_bonus: bool,
    pub is_grand_win: bool,
    pub spin_type: SpinType,
    /// Highest combo multiplier of the spin
    pub max_combo: f64,
}

impl SpinRecord {
    pub fn is_win(&self) -> bool {
        self.win_amount > 0
    }

    /// Copy with the win replaced (e.g. after a daily cap)
    pub fn with_win_amount(mut self, win_amount: u64) -> Self {
        self.win_amount = win_amount;
        self
    }
}
