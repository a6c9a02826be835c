//! Engine configuration
//!
//! Every tunable number of the game lives here. A config is validated once
//! when the engine is built; spins only ever see a valid one.

use serde::{Deserialize, Serialize};

use crate::bonus::{BonusConfig, BonusTrigger};
use crate::error::ConfigError;
use crate::paytable::PayTable;
use crate::symbols::SymbolTable;

/// Default safety cap on cascade steps per spin
pub const DEFAULT_MAX_CASCADE_DEPTH: usize = 20;

/// When a spin counts as a grand win
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JackpotCondition {
    /// A jackpot-symbol cluster of at least `min_size`
    Cluster { min_size: usize },
    /// At least `min_count` jackpot symbols anywhere on one grid
    Count { min_count: usize },
}

/// Grand-win rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JackpotRule {
    pub condition: JackpotCondition,
    /// Points added once per spin when the condition is met
    pub award_points: u64,
}

impl Default for JackpotRule {
    fn default() -> Self {
        Self {
            condition: JackpotCondition::Cluster { min_size: 4 },
            award_points: 10_000,
        }
    }
}

/// Full engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub symbols: SymbolTable,
    /// Grid edge length
    pub grid_size: usize,
    /// Smallest cluster that matches
    pub min_match: usize,
    /// Combo multiplier per cascade step index
    pub combo_multipliers: Vec<f64>,
    /// Safety cap on cascade steps per spin
    pub max_cascade_depth: usize,
    pub paytable: PayTable,
    pub bonus_trigger: BonusTrigger,
    pub bonus: BonusConfig,
    pub jackpot: JackpotRule,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut combo_multipliers = vec![1.0, 2.0, 3.0, 5.0, 8.0];
        combo_multipliers.resize(DEFAULT_MAX_CASCADE_DEPTH, 12.0);

        Self {
            symbols: SymbolTable::grocery_run(),
            grid_size: 5,
            min_match: 3,
            combo_multipliers,
            max_cascade_depth: DEFAULT_MAX_CASCADE_DEPTH,
            paytable: PayTable::default(),
            bonus_trigger: BonusTrigger::default(),
            bonus: BonusConfig::default(),
            jackpot: JackpotRule::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a YAML config
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yml::from_str(yaml).map_err(|e| ConfigError::Yaml(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Json(e.to_string()))
    }

    /// Builder: replace the symbol table
    pub fn with_symbols(mut self, symbols: SymbolTable) -> Self {
        self.symbols = symbols;
        self
    }

    /// Builder: replace the combo multiplier table
    pub fn with_combo_multipliers(mut self, multipliers: Vec<f64>) -> Self {
        self.combo_multipliers = multipliers;
        self
    }

    /// Builder: set the cascade safety cap
    pub fn with_max_cascade_depth(mut self, depth: usize) -> Self {
        self.max_cascade_depth = depth;
        self
    }

    pub fn with_paytable(mut self, paytable: PayTable) -> Self {
        self.paytable = paytable;
        self
    }

    pub fn with_bonus(mut self, bonus: BonusConfig) -> Self {
        self.bonus = bonus;
        self
    }

    pub fn with_jackpot(mut self, jackpot: JackpotRule) -> Self {
        self.jackpot = jackpot;
        self
    }

    /// Combo multiplier for a 0-based step index
    pub fn combo_multiplier(&self, step: usize) -> f64 {
        match self.combo_multipliers.get(step) {
            Some(&m) => m,
            None => self.combo_multipliers.last().copied().unwrap_or(1.0),
        }
    }

    /// Symbol that triggers the bonus round, if any
    pub fn bonus_symbol(&self) -> Option<u32> {
        self.bonus_trigger.symbol_id.or(self.symbols.bonus_id())
    }

    /// Validate the whole configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size < 2 || self.grid_size > 16 {
            return Err(ConfigError::InvalidGridSize(self.grid_size));
        }
        if self.min_match < 3 || self.min_match > self.grid_size * self.grid_size {
            return Err(ConfigError::InvalidMinMatch(self.min_match));
        }

        if self.max_cascade_depth == 0 {
            return Err(ConfigError::InvalidValue(
                "max_cascade_depth must be at least 1".into(),
            ));
        }
        if self.combo_multipliers.len() < self.max_cascade_depth {
            return Err(ConfigError::MultiplierTableTooShort {
                len: self.combo_multipliers.len(),
                depth: self.max_cascade_depth,
            });
        }
        if let Some(bad) = self.combo_multipliers.iter().position(|m| !m.is_finite() || *m <= 0.0) {
            return Err(ConfigError::InvalidValue(format!(
                "combo multiplier {bad} must be positive"
            )));
        }
        if let Some(i) = self.combo_multipliers.windows(2).position(|w| w[1] < w[0]) {
            return Err(ConfigError::MultiplierNotMonotonic(i + 1));
        }

        if self.paytable.size_bonus.iter().any(|b| !b.is_finite() || *b < 0.0) {
            return Err(ConfigError::InvalidValue(
                "size bonus entries must be non-negative".into(),
            ));
        }
        if !self.paytable.character_set_multiplier.is_finite()
            || self.paytable.character_set_multiplier < 1.0
        {
            return Err(ConfigError::InvalidValue(
                "character_set_multiplier must be at least 1.0".into(),
            ));
        }

        if let Some(id) = self.bonus_trigger.symbol_id {
            if !self.symbols.contains(id) {
                return Err(ConfigError::UnknownSymbol(id));
            }
        }
        if self.bonus_trigger.min_cluster < self.min_match {
            return Err(ConfigError::InvalidValue(format!(
                "bonus trigger cluster {} is below min_match {}",
                self.bonus_trigger.min_cluster, self.min_match
            )));
        }
        if self.bonus.spins_by_cluster.is_empty() || self.bonus.max_spins == 0 {
            return Err(ConfigError::InvalidValue(
                "bonus round must award at least one spin".into(),
            ));
        }
        let sticky = &self.bonus.sticky;
        if !sticky.base_multiplier.is_finite()
            || !sticky.multiplier_per_wild.is_finite()
            || sticky.base_multiplier <= 0.0
            || sticky.multiplier_per_wild < 0.0
        {
            return Err(ConfigError::InvalidValue(
                "sticky wild multipliers must be positive".into(),
            ));
        }
        // Bonus spins draw from the bonus weights; at least one symbol must be drawable
        if self.symbols.bonus_weights().iter().all(|&(_, w)| w == 0) {
            return Err(ConfigError::EmptySelector);
        }

        match self.jackpot.condition {
            JackpotCondition::Cluster { min_size: 0 } | JackpotCondition::Count { min_count: 0 } => {
                Err(ConfigError::InvalidValue("jackpot condition must be at least 1".into()))
            }
            _ => Ok(()),
        }
    }
}
