//! Sticky-wild bonus round
//!
//! A bonus round is entered when a base spin clusters enough bonus symbols.
//! Each bonus spin pre-places every sticky wild, draws the remaining cells
//! from the bonus weights and resolves like a base spin. Wilds that take part
//! in a match stick for the rest of the round and raise the round multiplier.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::cascade::CascadeStep;
use crate::grid::{Grid, Position};

/// When a base spin triggers the round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BonusTrigger {
    /// Trigger symbol (None = the table's bonus symbol)
    pub symbol_id: Option<u32>,
    /// Smallest qualifying cluster
    pub min_cluster: usize,
}

impl Default for BonusTrigger {
    fn default() -> Self {
        Self {
            symbol_id: None,
            min_cluster: 3,
        }
    }
}

/// Sticky-wild accumulation rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StickyWildRule {
    /// Round multiplier with no sticky wilds
    pub base_multiplier: f64,
    /// Added to the round multiplier per sticky wild
    pub multiplier_per_wild: f64,
    /// Sticky wild cap; further matched wilds are removed as usual
    pub max_sticky_wilds: usize,
}

impl Default for StickyWildRule {
    fn default() -> Self {
        Self {
            base_multiplier: 1.0,
            multiplier_per_wild: 1.0,
            max_sticky_wilds: 8,
        }
    }
}

impl StickyWildRule {
    /// Round multiplier for a given sticky count
    pub fn multiplier_for(&self, sticky: usize) -> f64 {
        self.base_multiplier + self.multiplier_per_wild * sticky as f64
    }
}

/// Bonus round configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BonusConfig {
    /// Spins awarded, indexed by `cluster size - min_cluster` (last repeats)
    pub spins_by_cluster: Vec<u32>,
    /// Spins added when the round retriggers itself
    pub retrigger_spins: u32,
    /// Cap on spins awarded over the whole round
    pub max_spins: u32,
    pub sticky: StickyWildRule,
}

impl Default for BonusConfig {
    fn default() -> Self {
        Self {
            spins_by_cluster: vec![10, 15, 20],
            retrigger_spins: 5,
            max_spins: 100,
            sticky: StickyWildRule::default(),
        }
    }
}

impl BonusConfig {
    /// Spins awarded for a trigger cluster of `size`
    pub fn spins_for(&self, size: usize, min_cluster: usize) -> u32 {
        let Some(last) = self.spins_by_cluster.len().checked_sub(1) else {
            return 0;
        };
        let idx = size.saturating_sub(min_cluster).min(last);
        self.spins_by_cluster[idx].min(self.max_spins)
    }
}

/// One resolved bonus spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusSpin {
    /// 0-based spin index within the round
    pub index: u32,
    pub initial_grid: Grid,
    pub steps: Vec<CascadeStep>,
    pub final_grid: Grid,
    pub payout: u64,
    /// Round multiplier once the spin settled
    pub multiplier: f64,
    pub retriggered: bool,
}

/// Live bonus round state
#[derive(Debug, Clone, PartialEq)]
pub struct BonusRoundState {
    /// Spins left to play
    pub remaining_spins: u32,
    /// Spins awarded so far (initial plus retriggers)
    pub spins_awarded: u32,
    /// Sticky wild cells
    pub sticky: BTreeSet<Position>,
    /// Running round multiplier
    pub multiplier: f64,
    pub spins_played: u32,
    pub retriggers: u32,
    pub total_payout: u64,
    spins: Vec<BonusSpin>,
}

impl BonusRoundState {
    /// Open a round worth `spins` spins
    pub fn new(spins: u32, rule: &StickyWildRule) -> Self {
        Self {
            remaining_spins: spins,
            spins_awarded: spins,
            sticky: BTreeSet::new(),
            multiplier: rule.multiplier_for(0),
            spins_played: 0,
            retriggers: 0,
            total_payout: 0,
            spins: Vec::new(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.remaining_spins == 0
    }

    /// Consume one spin, returning its index
    pub fn begin_spin(&mut self) -> Option<u32> {
        if self.remaining_spins == 0 {
            return None;
        }
        self.remaining_spins -= 1;
        Some(self.spins_played)
    }

    /// Try to stick a wild; returns false once the cap is reached
    pub fn stick(&mut self, pos: Position, rule: &StickyWildRule) -> bool {
        if self.sticky.contains(&pos) {
            return true;
        }
        if self.sticky.len() >= rule.max_sticky_wilds {
            return false;
        }
        self.sticky.insert(pos);
        self.multiplier = rule.multiplier_for(self.sticky.len());
        true
    }

    /// Add retrigger spins, capped by `max_spins` over the round
    ///
    /// Returns the number of spins actually added.
    pub fn retrigger(&mut self, config: &BonusConfig) -> u32 {
        let room = config.max_spins.saturating_sub(self.spins_awarded);
        let added = config.retrigger_spins.min(room);
        self.remaining_spins += added;
        self.spins_awarded += added;
        self.retriggers += 1;
        added
    }

    /// Record a settled spin
    pub fn finish_spin(&mut self, spin: BonusSpin) {
        self.total_payout += spin.payout;
        self.spins_played += 1;
        self.spins.push(spin);
    }

    /// Close the round
    pub fn into_result(self) -> BonusRoundResult {
        BonusRoundResult {
            spins_awarded: self.spins_awarded,
            spins_played: self.spins_played,
            retriggers: self.retriggers,
            sticky_wilds: self.sticky.into_iter().collect(),
            final_multiplier: self.multiplier,
            spins: self.spins,
            total_payout: self.total_payout,
        }
    }
}

/// Outcome of a finished bonus round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusRoundResult {
    pub spins_awarded: u32,
    pub spins_played: u32,
    pub retriggers: u32,
    /// Sticky wild cells when the round ended
    pub sticky_wilds: Vec<Position>,
    pub final_multiplier: f64,
    pub spins: Vec<BonusSpin>,
    pub total_payout: u64,
}

impl BonusRoundResult {
    /// Total cascade steps across all bonus spins
    pub fn cascade_count(&self) -> usize {
        self.spins.iter().map(|s| s.steps.len()).sum()
    }
}
