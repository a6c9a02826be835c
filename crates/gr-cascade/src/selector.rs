//! Weighted symbol selector

use crate::error::ConfigError;
use crate::rng::RandomSource;

/// Draws symbol IDs with probability `weight / total_weight`
///
/// Entries are walked in their configured order. Zero-weight entries are
/// dropped at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedSelector {
    entries: Vec<(u32, u32)>,
    total_weight: u64,
}

impl WeightedSelector {
    pub fn new(entries: &[(u32, u32)]) -> Result<Self, ConfigError> {
        let entries: Vec<(u32, u32)> = entries.iter().copied().filter(|&(_, w)| w > 0).collect();
        if entries.is_empty() {
            return Err(ConfigError::EmptySelector);
        }
        let total_weight = entries.iter().map(|&(_, w)| w as u64).sum();
        Ok(Self {
            entries,
            total_weight,
        })
    }

    /// Draw one symbol ID
    pub fn draw<R: RandomSource + ?Sized>(&self, rng: &mut R) -> u32 {
        self.pick(rng.next_unit())
    }

    /// Map a unit value in `[0, 1)` onto the weight space
    ///
    /// The last entry absorbs any positive remainder left by rounding.
    pub fn pick(&self, unit: f64) -> u32 {
        let mut roll = unit * self.total_weight as f64;
        for &(id, weight) in &self.entries {
            roll -= weight as f64;
            if roll <= 0.0 {
                return id;
            }
        }
        self.entries[self.entries.len() - 1].0
    }

    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// Exact draw probability of a symbol (0.0 if absent)
    pub fn probability(&self, id: u32) -> f64 {
        self.entries
            .iter()
            .find(|&&(e, _)| e == id)
            .map(|&(_, w)| w as f64 / self.total_weight as f64)
            .unwrap_or(0.0)
    }

    /// Drawable IDs in walk order
    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.iter().map(|&(id, _)| id)
    }
}
