//! Cascade engine: spin entry point

use crate::bonus::{BonusRoundResult, BonusRoundState, BonusSpin};
use crate::cascade::{CascadeResolver, validate_grid};
use crate::config::EngineConfig;
use crate::error::{ConfigError, EngineResult};
use crate::grid::Grid;
use crate::rng::RandomSource;
use crate::selector::WeightedSelector;
use crate::spin::SpinResult;

/// Cascade slot engine
///
/// Holds a validated configuration and its prebuilt selectors. Spinning only
/// borrows the engine, so one engine can serve any number of threads; all
/// randomness comes from the source passed to each call.
#[derive(Debug, Clone)]
pub struct CascadeEngine {
    config: EngineConfig,
    /// Base-game draws
    base_selector: WeightedSelector,
    /// Bonus-round draws
    bonus_selector: WeightedSelector,
}

/// Bonus round outcome plus the flags it raised
struct BonusOutcome {
    result: BonusRoundResult,
    jackpot_hit: bool,
    big_win: bool,
}

impl CascadeEngine {
    /// Validate `config` and build the engine
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let base_selector = WeightedSelector::new(&config.symbols.base_weights())?;
        let bonus_selector = WeightedSelector::new(&config.symbols.bonus_weights())?;

        log::debug!(
            "Cascade engine ready: {} symbols, {}x{} grid, depth cap {}",
            config.symbols.len(),
            config.grid_size,
            config.grid_size,
            config.max_cascade_depth
        );

        Ok(Self {
            config,
            base_selector,
            bonus_selector,
        })
    }

    /// Engine with the production configuration
    pub fn grocery_run() -> Result<Self, ConfigError> {
        Self::new(EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn base_selector(&self) -> &WeightedSelector {
        &self.base_selector
    }

    pub fn bonus_selector(&self) -> &WeightedSelector {
        &self.bonus_selector
    }

    /// Draw a fresh grid and play one spin
    pub fn spin<R: RandomSource + ?Sized>(&self, rng: &mut R) -> EngineResult<SpinResult> {
        let grid = Grid::generate(self.config.grid_size, &self.base_selector, rng);
        self.play(grid, rng)
    }

    /// Play one spin from a supplied initial grid
    ///
    /// Refills and any bonus round still draw from `rng`. Used for replays
    /// and hand-built scenarios.
    pub fn spin_from_grid<R: RandomSource + ?Sized>(
        &self,
        grid: Grid,
        rng: &mut R,
    ) -> EngineResult<SpinResult> {
        validate_grid(&grid, &self.config)?;
        self.play(grid, rng)
    }

    fn play<R: RandomSource + ?Sized>(&self, grid: Grid, rng: &mut R) -> EngineResult<SpinResult> {
        let config = &self.config;
        let initial_grid = grid.clone();

        let base = CascadeResolver::new(config, &self.base_selector).resolve(grid, None, rng)?;

        let trigger_size = base
            .bonus_cluster
            .filter(|&size| size >= config.bonus_trigger.min_cluster);

        let bonus = match trigger_size {
            Some(size) => {
                let spins = config.bonus.spins_for(size, config.bonus_trigger.min_cluster);
                log::debug!("Bonus triggered by a {size}-cluster: {spins} spins");
                Some(self.play_bonus(spins, rng)?)
            }
            None => None,
        };

        let grand_win = base.jackpot_hit || bonus.as_ref().is_some_and(|b| b.jackpot_hit);
        let big_win = base.big_win || bonus.as_ref().is_some_and(|b| b.big_win);
        let jackpot_award = if grand_win {
            config.jackpot.award_points
        } else {
            0
        };
        let bonus = bonus.map(|b| b.result);
        let bonus_payout = bonus.as_ref().map_or(0, |b| b.total_payout);
        let total_payout = base.payout + bonus_payout + jackpot_award;

        if grand_win {
            log::info!("Grand win: +{jackpot_award} points");
        }

        Ok(SpinResult {
            initial_grid,
            steps: base.steps,
            final_grid: base.final_grid,
            base_payout: base.payout,
            bonus_triggered: bonus.is_some(),
            bonus,
            jackpot_award,
            total_payout,
            grand_win,
            big_win,
        })
    }

    fn play_bonus<R: RandomSource + ?Sized>(
        &self,
        spins: u32,
        rng: &mut R,
    ) -> EngineResult<BonusOutcome> {
        let config = &self.config;
        let mut round = BonusRoundState::new(spins, &config.bonus.sticky);
        let mut jackpot_hit = false;
        let mut big_win = false;

        while let Some(index) = round.begin_spin() {
            let initial_grid = match config.symbols.wild_id() {
                Some(wild) => Grid::generate_with_sticky(
                    config.grid_size,
                    &self.bonus_selector,
                    &round.sticky,
                    wild,
                    rng,
                ),
                None => Grid::generate(config.grid_size, &self.bonus_selector, rng),
            };

            let res = CascadeResolver::new(config, &self.bonus_selector).resolve(
                initial_grid.clone(),
                Some(&mut round),
                rng,
            )?;

            jackpot_hit |= res.jackpot_hit;
            big_win |= res.big_win;

            let retriggered = res
                .bonus_cluster
                .is_some_and(|size| size >= config.bonus_trigger.min_cluster);
            if retriggered {
                let added = round.retrigger(&config.bonus);
                log::debug!("Bonus retrigger on spin {index}: +{added} spins");
            }

            let multiplier = round.multiplier;
            round.finish_spin(BonusSpin {
                index,
                initial_grid,
                steps: res.steps,
                final_grid: res.final_grid,
                payout: res.payout,
                multiplier,
                retriggered,
            });
        }

        let result = round.into_result();
        log::debug!(
            "Bonus round over: {} spins, {} sticky wilds, {} points",
            result.spins_played,
            result.sticky_wilds.len(),
            result.total_payout
        );

        Ok(BonusOutcome {
            result,
            jackpot_hit,
            big_win,
        })
    }
}

/// Build an engine from `config` and play one spin
///
/// Validates the configuration on every call; hold a [`CascadeEngine`] to
/// spin repeatedly.
pub fn spin<R: RandomSource + ?Sized>(config: &EngineConfig, rng: &mut R) -> EngineResult<SpinResult> {
    CascadeEngine::new(config.clone())?.spin(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded_rng;

    #[test]
    fn test_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CascadeEngine>();
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig::default().with_combo_multipliers(vec![1.0]);
        assert!(CascadeEngine::new(config).is_err());
    }

    #[test]
    fn test_spin_accounting() {
        let engine = CascadeEngine::grocery_run().unwrap();
        let mut rng = seeded_rng(11);
        for _ in 0..200 {
            let result = engine.spin(&mut rng).unwrap();
            let steps: u64 = result.steps.iter().map(|s| s.payout).sum();
            assert_eq!(result.base_payout, steps);
            assert_eq!(
                result.total_payout,
                result.base_payout + result.bonus_payout() + result.jackpot_award
            );
            assert_eq!(result.bonus_triggered, result.bonus.is_some());
            assert_eq!(result.grand_win, result.jackpot_award > 0);
            for (i, step) in result.steps.iter().enumerate() {
                assert_eq!(step.index, i);
            }
        }
    }

    #[test]
    fn test_free_function_matches_engine() {
        let config = EngineConfig::default();
        let engine = CascadeEngine::new(config.clone()).unwrap();
        let a = spin(&config, &mut seeded_rng(5)).unwrap();
        let b = engine.spin(&mut seeded_rng(5)).unwrap();
        assert_eq!(a, b);
    }
}
