//! Cluster detection (4-connected flood fill)

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::grid::{Grid, Position};
use crate::paytable::PayTable;
use crate::symbols::SymbolTable;

/// What a cluster matched on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSymbol {
    /// Anchored by a symbol, wilds substituting
    Symbol(u32),
    /// Wilds only
    WildSweep,
}

/// A connected group of cells sharing an effective symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub symbol: MatchSymbol,
    /// Member positions, row-major order
    pub positions: Vec<Position>,
}

impl Cluster {
    pub fn size(&self) -> usize {
        self.positions.len()
    }

    pub fn symbol_id(&self) -> Option<u32> {
        match self.symbol {
            MatchSymbol::Symbol(id) => Some(id),
            MatchSymbol::WildSweep => None,
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.positions.binary_search(&pos).is_ok()
    }
}

/// A scored cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub symbol: MatchSymbol,
    pub positions: Vec<Position>,
    /// Points before combo and round multipliers
    pub points: u64,
    /// Scaled by the character-set rule
    #[serde(default)]
    pub character_set: bool,
}

impl Match {
    pub fn size(&self) -> usize {
        self.positions.len()
    }

    pub fn symbol_id(&self) -> Option<u32> {
        match self.symbol {
            MatchSymbol::Symbol(id) => Some(id),
            MatchSymbol::WildSweep => None,
        }
    }
}

/// How fixed (sticky) cells take part in a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedCells<'a> {
    /// Fixed cells match like any other cell; a component made only of them
    /// is ignored
    Matching(&'a BTreeSet<Position>),
    /// Fixed cells never join a cluster
    Blocking(&'a BTreeSet<Position>),
}

static NO_FIXED_CELLS: BTreeSet<Position> = BTreeSet::new();

impl<'a> FixedCells<'a> {
    /// No fixed cells (base game)
    pub fn none() -> FixedCells<'static> {
        FixedCells::Matching(&NO_FIXED_CELLS)
    }

    pub fn cells(&self) -> &'a BTreeSet<Position> {
        match *self {
            FixedCells::Matching(cells) | FixedCells::Blocking(cells) => cells,
        }
    }
}

/// Find every cluster of at least `min_match` cells
///
/// Targets are processed in ascending symbol ID and a cell joins at most one
/// cluster per pass. Wilds join any target except the bonus symbol. A
/// component must contain at least one target cell; leftover wild
/// components form wild sweeps. See [`FixedCells`] for sticky cells.
///
/// Returned clusters are ordered by their smallest member position.
pub fn find_clusters(
    grid: &Grid,
    table: &SymbolTable,
    min_match: usize,
    fixed: FixedCells<'_>,
) -> Vec<Cluster> {
    let cells = grid.cells();
    let mut consumed = vec![false; cells.len()];
    let mut clusters = Vec::new();

    if let FixedCells::Blocking(blocked) = fixed {
        for &pos in blocked {
            if grid.get(pos).is_some() {
                consumed[grid.index_of(pos)] = true;
            }
        }
    }
    let removable = |component: &[Position]| !component.iter().all(|p| fixed.cells().contains(p));

    let wild_id = table.wild_id();
    let is_wild = |id: u32| wild_id == Some(id);

    for target in table.cluster_targets() {
        if !cells.contains(&target) {
            continue;
        }
        let accepts_wild = !table.is_bonus(target);
        let mut visited = vec![false; cells.len()];

        for seed in grid.positions() {
            let idx = grid.index_of(seed);
            if consumed[idx] || visited[idx] || cells[idx] != target {
                continue;
            }
            let component = flood(grid, seed, &consumed, &mut visited, |id| {
                id == target || (accepts_wild && is_wild(id))
            });
            if component.len() >= min_match && removable(&component) {
                for p in &component {
                    consumed[grid.index_of(*p)] = true;
                }
                clusters.push(Cluster {
                    symbol: MatchSymbol::Symbol(target),
                    positions: component,
                });
            }
        }
    }

    if let Some(wild) = wild_id {
        let mut visited = vec![false; cells.len()];
        for seed in grid.positions() {
            let idx = grid.index_of(seed);
            if consumed[idx] || visited[idx] || cells[idx] != wild {
                continue;
            }
            let component = flood(grid, seed, &consumed, &mut visited, |id| id == wild);
            if component.len() >= min_match && removable(&component) {
                for p in &component {
                    consumed[grid.index_of(*p)] = true;
                }
                clusters.push(Cluster {
                    symbol: MatchSymbol::WildSweep,
                    positions: component,
                });
            }
        }
    }

    clusters.sort_by_key(|c| c.positions[0]);
    clusters
}

/// Find and score clusters in one pass
pub fn find_matches(
    grid: &Grid,
    table: &SymbolTable,
    paytable: &PayTable,
    min_match: usize,
    fixed: FixedCells<'_>,
) -> Vec<Match> {
    let clusters = find_clusters(grid, table, min_match, fixed);
    paytable.score(clusters, table, min_match)
}

fn flood(
    grid: &Grid,
    seed: Position,
    consumed: &[bool],
    visited: &mut [bool],
    accepts: impl Fn(u32) -> bool,
) -> Vec<Position> {
    let cells = grid.cells();
    let mut stack = vec![seed];
    let mut component = Vec::new();
    visited[grid.index_of(seed)] = true;

    while let Some(pos) = stack.pop() {
        component.push(pos);
        for next in pos.neighbours(grid.size()) {
            let idx = grid.index_of(next);
            if !visited[idx] && !consumed[idx] && accepts(cells[idx]) {
                visited[idx] = true;
                stack.push(next);
            }
        }
    }

    component.sort_unstable();
    component
}
