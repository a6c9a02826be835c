//! Match scoring and step payouts

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cluster::{Cluster, Match, MatchSymbol};
use crate::symbols::SymbolTable;

/// Cluster paytable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayTable {
    /// Size bonus indexed by `size - min_match`, last entry repeats
    pub size_bonus: Vec<f64>,
    /// Base value of a wild-only cluster
    pub wild_sweep_points: u32,
    /// Scale for same-family matches in one step
    pub character_set_multiplier: f64,
    /// Cluster size that flags a big win
    pub big_win_cluster: usize,
}

impl Default for PayTable {
    fn default() -> Self {
        Self {
            size_bonus: vec![1.0, 2.5, 5.0],
            wild_sweep_points: 100,
            character_set_multiplier: 1.5,
            big_win_cluster: 5,
        }
    }
}

impl PayTable {
    /// Builder: set the size bonus table
    pub fn with_size_bonus(mut self, size_bonus: Vec<f64>) -> Self {
        self.size_bonus = size_bonus;
        self
    }

    /// Builder: set the character-set multiplier (1.0 disables the rule)
    pub fn with_character_set_multiplier(mut self, multiplier: f64) -> Self {
        self.character_set_multiplier = multiplier;
        self
    }

    /// Bonus factor for a cluster of `size` cells
    pub fn size_bonus(&self, size: usize, min_match: usize) -> f64 {
        if self.size_bonus.is_empty() {
            return 1.0;
        }
        let idx = size.saturating_sub(min_match).min(self.size_bonus.len() - 1);
        self.size_bonus[idx]
    }

    /// Cluster-size factor: `size × size_bonus`
    ///
    /// With the default table a 3-cluster is worth 3× its base value,
    /// a 4-cluster 10× and a 5-cluster 25×.
    pub fn size_factor(&self, size: usize, min_match: usize) -> f64 {
        size as f64 * self.size_bonus(size, min_match)
    }

    /// Points of one cluster before step multipliers
    pub fn cluster_points(&self, cluster: &Cluster, table: &SymbolTable, min_match: usize) -> u64 {
        let base = match cluster.symbol {
            MatchSymbol::Symbol(id) if table.is_bonus(id) => 0,
            MatchSymbol::Symbol(id) => table.get(id).map_or(0, |s| s.base_points),
            MatchSymbol::WildSweep => self.wild_sweep_points,
        };
        (base as f64 * self.size_factor(cluster.size(), min_match)).floor() as u64
    }

    /// Score all clusters of one step
    ///
    /// Applies the character-set rule: two or more different paying symbols
    /// of the same character family in one step are each scaled by
    /// `character_set_multiplier`.
    pub fn score(&self, clusters: Vec<Cluster>, table: &SymbolTable, min_match: usize) -> Vec<Match> {
        let mut families: HashMap<_, Vec<u32>> = HashMap::new();
        for cluster in &clusters {
            if let Some(symbol) = cluster.symbol_id().and_then(|id| table.get(id)) {
                if symbol.is_wild() || symbol.is_bonus() {
                    continue;
                }
                let ids = families.entry(symbol.character).or_default();
                if !ids.contains(&symbol.id) {
                    ids.push(symbol.id);
                }
            }
        }

        clusters
            .into_iter()
            .map(|cluster| {
                let mut points = self.cluster_points(&cluster, table, min_match);
                let character_set = cluster
                    .symbol_id()
                    .and_then(|id| table.get(id))
                    .and_then(|s| families.get(&s.character))
                    .is_some_and(|ids| ids.len() >= 2)
                    && points > 0;
                if character_set {
                    points = (points as f64 * self.character_set_multiplier).floor() as u64;
                }
                Match {
                    symbol: cluster.symbol,
                    positions: cluster.positions,
                    points,
                    character_set,
                }
            })
            .collect()
    }

    /// `floor(sum × combo × round)`
    pub fn step_payout(&self, matches: &[Match], combo_multiplier: f64, round_multiplier: f64) -> u64 {
        let sum: u64 = matches.iter().map(|m| m.points).sum();
        (sum as f64 * combo_multiplier * round_multiplier).floor() as u64
    }

    /// Check if any match reaches the big-win size
    pub fn is_big_win(&self, matches: &[Match]) -> bool {
        matches.iter().any(|m| m.size() >= self.big_win_cluster)
    }
}
