//! Cascade resolver
//!
//! Drives one grid from its first evaluation to a settled state:
//!
//! ```text
//! Idle → Resolving ─┬─ matches ──→ Cascading ─→ (remove, gravity, refill) ─→ Resolving
//!                   └─ no match ─→ Settled
//! ```
//!
//! Every pass with at least one match becomes a [`CascadeStep`]. A grid that
//! still holds matches after `max_cascade_depth` steps aborts the spin.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::bonus::BonusRoundState;
use crate::cluster::{FixedCells, Match, find_matches};
use crate::config::{EngineConfig, JackpotCondition};
use crate::error::{EngineError, EngineResult};
use crate::grid::{Grid, Position, Refill};
use crate::rng::RandomSource;
use crate::selector::WeightedSelector;

// ═══════════════════════════════════════════════════════════════════════════════
// TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Resolver state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverState {
    #[default]
    Idle,
    /// Looking for matches on the current grid
    Resolving,
    /// Removing matches and refilling
    Cascading,
    /// No matches left
    Settled,
}

/// One evaluation pass that found matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeStep {
    /// 0-based step index within the spin
    pub index: usize,
    /// Grid the matches were found on
    pub grid: Grid,
    pub matches: Vec<Match>,
    /// Combo multiplier applied to this step
    pub multiplier: f64,
    /// Round multiplier applied to this step (1.0 outside the bonus round)
    pub round_multiplier: f64,
    /// `floor(sum of match points × multiplier × round_multiplier)`
    pub payout: u64,
    /// Cells drawn during the collapse that followed
    pub refills: Vec<Refill>,
    /// Wilds that became sticky during this step
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stuck: Vec<Position>,
}

impl CascadeStep {
    /// Cells cleared by this step
    pub fn removed_count(&self) -> usize {
        self.refills.len()
    }
}

/// Everything a settled resolve produced
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub steps: Vec<CascadeStep>,
    pub final_grid: Grid,
    /// Sum of step payouts
    pub payout: u64,
    /// Largest bonus-symbol cluster seen, if any
    pub bonus_cluster: Option<usize>,
    pub jackpot_hit: bool,
    pub big_win: bool,
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESOLVER
// ═══════════════════════════════════════════════════════════════════════════════

/// Resolves one grid through its chain of cascades
pub struct CascadeResolver<'a> {
    config: &'a EngineConfig,
    /// Selector used for refills
    selector: &'a WeightedSelector,
    state: ResolverState,
}

impl<'a> CascadeResolver<'a> {
    pub fn new(config: &'a EngineConfig, selector: &'a WeightedSelector) -> Self {
        Self {
            config,
            selector,
            state: ResolverState::Idle,
        }
    }

    pub fn state(&self) -> ResolverState {
        self.state
    }

    /// Resolve `grid` until no match remains
    ///
    /// With a bonus round, sticky wilds are fixed cells: they never fall or
    /// get removed, and matched wilds join them up to the sticky cap. Sticky
    /// wilds substitute only in the first pass; later passes treat them as
    /// walls.
    pub fn resolve<R: RandomSource + ?Sized>(
        &mut self,
        grid: Grid,
        mut bonus: Option<&mut BonusRoundState>,
        rng: &mut R,
    ) -> EngineResult<Resolution> {
        let config = self.config;
        let table = &config.symbols;
        let bonus_symbol = config.bonus_symbol();
        let jackpot_symbol = table.jackpot_id();

        let mut grid = grid;
        let mut steps: Vec<CascadeStep> = Vec::new();
        let mut payout = 0u64;
        let mut bonus_cluster: Option<usize> = None;
        let mut jackpot_hit = false;
        let mut big_win = false;

        loop {
            self.state = ResolverState::Resolving;

            let fixed = bonus.as_ref().map(|b| b.sticky.clone()).unwrap_or_default();
            let fixed_cells = if steps.is_empty() {
                FixedCells::Matching(&fixed)
            } else {
                FixedCells::Blocking(&fixed)
            };
            let matches = find_matches(&grid, table, &config.paytable, config.min_match, fixed_cells);

            if let (Some(id), JackpotCondition::Count { min_count }) =
                (jackpot_symbol, config.jackpot.condition)
            {
                jackpot_hit |= grid.count(id) >= min_count;
            }

            if matches.is_empty() {
                break;
            }
            if steps.len() >= config.max_cascade_depth {
                self.state = ResolverState::Idle;
                log::warn!(
                    "Cascade still matching after {} steps, aborting spin",
                    config.max_cascade_depth
                );
                return Err(EngineError::CascadeDepthExceeded(config.max_cascade_depth));
            }

            self.state = ResolverState::Cascading;
            let index = steps.len();

            for m in &matches {
                let Some(id) = m.symbol_id() else { continue };
                if Some(id) == bonus_symbol {
                    bonus_cluster = bonus_cluster.max(Some(m.size()));
                }
                if let (Some(jackpot), JackpotCondition::Cluster { min_size }) =
                    (jackpot_symbol, config.jackpot.condition)
                {
                    jackpot_hit |= id == jackpot && m.size() >= min_size;
                }
            }
            big_win |= config.paytable.is_big_win(&matches);

            // Matched wilds stick first; everything else in a match is removed
            let mut removed = BTreeSet::new();
            let mut stuck = Vec::new();
            for m in &matches {
                for &pos in &m.positions {
                    if fixed.contains(&pos) {
                        continue;
                    }
                    let is_wild = grid.get(pos).is_some_and(|id| table.is_wild(id));
                    if is_wild {
                        if let Some(round) = bonus.as_deref_mut() {
                            if round.stick(pos, &config.bonus.sticky) {
                                stuck.push(pos);
                                continue;
                            }
                        }
                    }
                    removed.insert(pos);
                }
            }

            let multiplier = config.combo_multiplier(index);
            let round_multiplier = bonus.as_ref().map_or(1.0, |b| b.multiplier);
            let step_payout = config
                .paytable
                .step_payout(&matches, multiplier, round_multiplier);
            payout += step_payout;

            let fixed = bonus.as_ref().map(|b| b.sticky.clone()).unwrap_or_default();
            let (next, refills) = grid.collapse(&removed, &fixed, self.selector, rng)?;

            log::trace!(
                "step {index}: {} matches, {} removed, x{multiplier} x{round_multiplier} = {step_payout}",
                matches.len(),
                removed.len()
            );

            steps.push(CascadeStep {
                index,
                grid,
                matches,
                multiplier,
                round_multiplier,
                payout: step_payout,
                refills,
                stuck,
            });
            grid = next;
        }

        self.state = ResolverState::Settled;
        log::debug!("Settled after {} steps, payout {payout}", steps.len());

        Ok(Resolution {
            steps,
            final_grid: grid,
            payout,
            bonus_cluster,
            jackpot_hit,
            big_win,
        })
    }
}

/// Check that every cell holds a known symbol
pub fn validate_grid(grid: &Grid, config: &EngineConfig) -> EngineResult<()> {
    if grid.size() != config.grid_size {
        return Err(EngineError::GridSizeMismatch {
            expected: config.grid_size,
            actual: grid.size(),
        });
    }
    for pos in grid.positions() {
        if let Some(id) = grid.get(pos) {
            if !config.symbols.contains(id) {
                return Err(EngineError::UnknownSymbol { id, position: pos });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonus::StickyWildRule;
    use crate::cluster::MatchSymbol;
    use crate::rng::ScriptedSource;
    use crate::symbols::{Character, Rarity, Symbol, SymbolTable};

    const A: u32 = 0;
    const B: u32 = 1;
    const C: u32 = 2;
    const D: u32 = 3;
    const E: u32 = 4;
    const F: u32 = 5;
    const W: u32 = 6;

    fn config() -> EngineConfig {
        let characters = [
            Character::Coolcat,
            Character::Shiba,
            Character::Tabby,
            Character::Trump,
            Character::Pepefrog,
            Character::Pepe,
        ];
        let mut symbols: Vec<Symbol> = characters
            .iter()
            .enumerate()
            .map(|(i, &c)| Symbol::regular(i as u32, format!("s{i}"), c, Rarity::Common, 10, 10))
            .collect();
        symbols.push(Symbol::wild(W, "wild", Character::Pepe, 1));
        EngineConfig::default().with_symbols(SymbolTable::new(symbols).unwrap())
    }

    fn no_match_rows() -> Vec<Vec<u32>> {
        vec![
            vec![A, B, C, D, E],
            vec![C, D, E, A, B],
            vec![E, A, B, C, D],
            vec![B, C, D, E, A],
            vec![D, E, A, B, C],
        ]
    }

    #[test]
    fn test_settles_without_matches() {
        let config = config();
        let selector = WeightedSelector::new(&[(F, 1)]).unwrap();
        let mut resolver = CascadeResolver::new(&config, &selector);
        assert_eq!(resolver.state(), ResolverState::Idle);

        let grid = Grid::from_rows(&no_match_rows()).unwrap();
        let mut rng = ScriptedSource::constant(0.5);
        let res = resolver.resolve(grid.clone(), None, &mut rng).unwrap();

        assert_eq!(resolver.state(), ResolverState::Settled);
        assert!(res.steps.is_empty());
        assert_eq!(res.payout, 0);
        assert_eq!(res.final_grid, grid);
        assert_eq!(rng.consumed(), 0);
    }

    #[test]
    fn test_single_step_removes_and_refills() {
        let config = config();
        // Refills draw F, D, F: none of them lines up with its neighbours
        let selector = WeightedSelector::new(&[(D, 1), (F, 1)]).unwrap();
        let mut rows = no_match_rows();
        rows[0] = vec![A, A, A, D, E];
        rows[1][1] = B;
        let grid = Grid::from_rows(&rows).unwrap();

        let mut resolver = CascadeResolver::new(&config, &selector);
        let mut rng = ScriptedSource::new(vec![0.9, 0.1, 0.9]);
        let res = resolver.resolve(grid, None, &mut rng).unwrap();

        assert_eq!(res.steps.len(), 1);
        let step = &res.steps[0];
        assert_eq!(step.matches.len(), 1);
        assert_eq!(step.matches[0].symbol, MatchSymbol::Symbol(A));
        assert_eq!(step.payout, 30);
        assert_eq!(step.removed_count(), 3);
        // The three refills land on the vacated top row
        assert_eq!(res.final_grid.rows()[0][..3], [F, D, F]);
        assert_eq!(res.payout, 30);
    }

    #[test]
    fn test_depth_cap_is_an_error() {
        // One drawable symbol: every refill rebuilds the same cluster
        let config = config()
            .with_max_cascade_depth(4)
            .with_combo_multipliers(vec![1.0, 2.0, 3.0, 5.0]);
        let selector = WeightedSelector::new(&[(A, 1)]).unwrap();
        let grid = Grid::from_cells(5, vec![A; 25]).unwrap();

        let mut resolver = CascadeResolver::new(&config, &selector);
        let mut rng = ScriptedSource::constant(0.5);
        let err = resolver.resolve(grid, None, &mut rng).unwrap_err();
        assert_eq!(err, EngineError::CascadeDepthExceeded(4));
    }

    #[test]
    fn test_bonus_mode_sticks_wilds() {
        let config = config();
        // Refills D then C keep the sticky wild out of any new cluster
        let selector = WeightedSelector::new(&[(C, 1), (D, 1)]).unwrap();
        let mut rows = no_match_rows();
        // A W A on the top row: the wild joins the A cluster and sticks
        rows[0] = vec![A, W, A, D, E];
        rows[1][1] = B;
        let grid = Grid::from_rows(&rows).unwrap();

        let rule = StickyWildRule::default();
        let mut round = BonusRoundState::new(5, &rule);
        let mut resolver = CascadeResolver::new(&config, &selector);
        let mut rng = ScriptedSource::new(vec![0.9, 0.1]);
        let res = resolver.resolve(grid, Some(&mut round), &mut rng).unwrap();

        assert!(round.sticky.contains(&Position::new(0, 1)));
        assert_eq!(res.steps[0].stuck, vec![Position::new(0, 1)]);
        // Base 1.0 + 1.0 per sticky wild, applied to the step that stuck it
        approx::assert_relative_eq!(res.steps[0].round_multiplier, 2.0);
        assert_eq!(res.steps.len(), 1);
        assert_eq!(res.payout, 60);
        // The wild stays put; only the two A cells were cleared
        assert_eq!(res.steps[0].removed_count(), 2);
        assert_eq!(res.final_grid.get(Position::new(0, 1)), Some(W));
    }

    #[test]
    fn test_sticky_wilds_only_substitute_in_first_pass() {
        let config = config();
        let selector = WeightedSelector::new(&[(F, 1)]).unwrap();
        let mut rows = no_match_rows();
        rows[4] = vec![W, W, A, B, C];
        let grid = Grid::from_rows(&rows).unwrap();

        let rule = StickyWildRule::default();
        let mut round = BonusRoundState::new(5, &rule);
        assert!(round.stick(Position::new(4, 0), &rule));
        assert!(round.stick(Position::new(4, 1), &rule));

        let mut resolver = CascadeResolver::new(&config, &selector);
        let mut rng = ScriptedSource::constant(0.5);
        let res = resolver.resolve(grid, Some(&mut round), &mut rng).unwrap();

        // W W A pays at x3; the D that drops next to the wilds does not rematch
        assert_eq!(res.steps.len(), 1);
        assert_eq!(res.payout, 90);
        assert_eq!(res.final_grid.rows()[4][..3], [W, W, D]);
        assert_eq!(resolver.state(), ResolverState::Settled);
    }

    #[test]
    fn test_validate_grid() {
        let config = config();
        let grid = Grid::from_rows(&no_match_rows()).unwrap();
        assert!(validate_grid(&grid, &config).is_ok());

        let bad = grid.with_cell(Position::new(2, 2), 99);
        assert_eq!(
            validate_grid(&bad, &config),
            Err(EngineError::UnknownSymbol {
                id: 99,
                position: Position::new(2, 2)
            })
        );

        let small = Grid::from_rows(&[[A, B], [B, A]]).unwrap();
        assert!(matches!(
            validate_grid(&small, &config),
            Err(EngineError::GridSizeMismatch { .. })
        ));
    }
}
