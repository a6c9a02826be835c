//! Square symbol grid, generation and gravity

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::rng::RandomSource;
use crate::selector::WeightedSelector;

/// Grid cell address (row 0 is the top)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// 4-directional neighbours inside a `size`×`size` grid
    pub fn neighbours(self, size: usize) -> impl Iterator<Item = Position> {
        let Position { row, col } = self;
        [
            (row.checked_sub(1), Some(col)),
            (Some(row + 1).filter(|&r| r < size), Some(col)),
            (Some(row), col.checked_sub(1)),
            (Some(row), Some(col + 1).filter(|&c| c < size)),
        ]
        .into_iter()
        .filter_map(|(r, c)| Some(Position::new(r?, c?)))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A symbol drawn into a vacated cell during a collapse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refill {
    pub position: Position,
    pub symbol_id: u32,
}

/// Square grid of symbol IDs, stored row-major
///
/// A grid is a value: every cascade step produces a new one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    size: usize,
    cells: Vec<u32>,
}

impl Grid {
    /// Build from row-major cells
    pub fn from_cells(size: usize, cells: Vec<u32>) -> Option<Self> {
        (size > 0 && cells.len() == size * size).then_some(Self { size, cells })
    }

    /// Build from rows (top row first)
    pub fn from_rows<R: AsRef<[u32]>>(rows: &[R]) -> Option<Self> {
        let size = rows.len();
        if rows.iter().any(|r| r.as_ref().len() != size) {
            return None;
        }
        let cells = rows.iter().flat_map(|r| r.as_ref().iter().copied()).collect();
        Self::from_cells(size, cells)
    }

    /// Fill every cell with an independent weighted draw
    pub fn generate<R: RandomSource + ?Sized>(
        size: usize,
        selector: &WeightedSelector,
        rng: &mut R,
    ) -> Self {
        let cells = (0..size * size).map(|_| selector.draw(rng)).collect();
        Self { size, cells }
    }

    /// Pre-place `wild_id` on the sticky cells, draw the rest
    pub fn generate_with_sticky<R: RandomSource + ?Sized>(
        size: usize,
        selector: &WeightedSelector,
        sticky: &BTreeSet<Position>,
        wild_id: u32,
        rng: &mut R,
    ) -> Self {
        let mut cells = Vec::with_capacity(size * size);
        for row in 0..size {
            for col in 0..size {
                if sticky.contains(&Position::new(row, col)) {
                    cells.push(wild_id);
                } else {
                    cells.push(selector.draw(rng));
                }
            }
        }
        Self { size, cells }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    pub fn index_of(&self, pos: Position) -> usize {
        pos.row * self.size + pos.col
    }

    pub fn get(&self, pos: Position) -> Option<u32> {
        (pos.row < self.size && pos.col < self.size).then(|| self.cells[self.index_of(pos)])
    }

    /// Copy with one cell replaced
    pub fn with_cell(&self, pos: Position, symbol_id: u32) -> Self {
        let mut next = self.clone();
        let idx = next.index_of(pos);
        next.cells[idx] = symbol_id;
        next
    }

    /// All positions, row-major
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.size).flat_map(move |row| (0..self.size).map(move |col| Position::new(row, col)))
    }

    /// Column top to bottom
    pub fn column(&self, col: usize) -> Vec<u32> {
        (0..self.size)
            .map(|row| self.cells[row * self.size + col])
            .collect()
    }

    /// 2D view for presentation (top row first)
    pub fn rows(&self) -> Vec<Vec<u32>> {
        self.cells.chunks(self.size).map(<[u32]>::to_vec).collect()
    }

    /// Count cells holding `symbol_id`
    pub fn count(&self, symbol_id: u32) -> usize {
        self.cells.iter().filter(|&&id| id == symbol_id).count()
    }

    /// Remove cells, apply gravity and refill from the top
    ///
    /// Per column, cells that are neither removed nor fixed keep their
    /// relative order and drop onto the lowest free slots. Fixed cells
    /// never move and are skipped over. Slots left at the top are refilled
    /// with fresh draws, top-most slot drawn last.
    pub fn collapse<R: RandomSource + ?Sized>(
        &self,
        removed: &BTreeSet<Position>,
        fixed: &BTreeSet<Position>,
        selector: &WeightedSelector,
        rng: &mut R,
    ) -> EngineResult<(Grid, Vec<Refill>)> {
        let size = self.size;
        let mut next: Vec<Option<u32>> = self.cells.iter().map(|&id| Some(id)).collect();
        let mut refills = Vec::new();

        for col in 0..size {
            // Free slots: every cell of the column that gravity may write to
            let slots: Vec<usize> = (0..size)
                .filter(|&row| !fixed.contains(&Position::new(row, col)))
                .collect();
            let survivors: Vec<u32> = slots
                .iter()
                .filter(|&&row| !removed.contains(&Position::new(row, col)))
                .map(|&row| self.cells[row * size + col])
                .collect();

            for &row in &slots {
                next[row * size + col] = None;
            }

            let empty = slots.len() - survivors.len();
            for (&row, &id) in slots[empty..].iter().zip(&survivors) {
                next[row * size + col] = Some(id);
            }
            for &row in slots[..empty].iter().rev() {
                let symbol_id = selector.draw(rng);
                next[row * size + col] = Some(symbol_id);
                refills.push(Refill {
                    position: Position::new(row, col),
                    symbol_id,
                });
            }
        }

        let mut cells = Vec::with_capacity(next.len());
        for (idx, cell) in next.into_iter().enumerate() {
            match cell {
                Some(id) => cells.push(id),
                None => {
                    return Err(EngineError::EmptyCell(Position::new(idx / size, idx % size)));
                }
            }
        }
        refills.sort_by_key(|r| r.position);

        Ok((Grid { size, cells }, refills))
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.size) {
            let line: Vec<String> = row.iter().map(|id| format!("{id:>3}")).collect();
            writeln!(f, "{}", line.join(""))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{ScriptedSource, seeded_rng};

    fn positions(list: &[(usize, usize)]) -> BTreeSet<Position> {
        list.iter().map(|&(r, c)| Position::new(r, c)).collect()
    }

    #[test]
    fn test_generate_fills_every_cell() {
        let selector = WeightedSelector::new(&[(4, 1), (9, 2), (11, 3)]).unwrap();
        let mut rng = seeded_rng(99);
        let grid = Grid::generate(5, &selector, &mut rng);
        assert_eq!(grid.cells().len(), 25);
        assert!(grid.cells().iter().all(|id| [4, 9, 11].contains(id)));
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        assert!(Grid::from_rows(&[vec![1, 2], vec![3]]).is_none());
        let grid = Grid::from_rows(&[[1, 2], [3, 4]]).unwrap();
        assert_eq!(grid.get(Position::new(1, 0)), Some(3));
        assert_eq!(grid.get(Position::new(2, 0)), None);
        assert_eq!(grid.rows(), vec![vec![1, 2], vec![3, 4]]);
    }

    #[test]
    fn test_neighbours_stay_inside() {
        let corner: Vec<Position> = Position::new(0, 0).neighbours(5).collect();
        assert_eq!(corner.len(), 2);
        let centre: Vec<Position> = Position::new(2, 2).neighbours(5).collect();
        assert_eq!(centre.len(), 4);
        let edge: Vec<Position> = Position::new(4, 2).neighbours(5).collect();
        assert_eq!(edge.len(), 3);
    }

    #[test]
    fn test_gravity_compacts_column() {
        // Column 0 top to bottom: A B X C X, with A=1 B=2 C=3 X removed
        let mut rows = vec![vec![0u32; 5]; 5];
        for (row, id) in [1, 2, 9, 3, 9].into_iter().enumerate() {
            rows[row][0] = id;
        }
        let grid = Grid::from_rows(&rows).unwrap();
        let removed = positions(&[(2, 0), (4, 0)]);
        let selector = WeightedSelector::new(&[(7, 1)]).unwrap();
        let mut rng = ScriptedSource::constant(0.5);

        let (next, refills) = grid
            .collapse(&removed, &BTreeSet::new(), &selector, &mut rng)
            .unwrap();

        assert_eq!(next.column(0), vec![7, 7, 1, 2, 3]);
        assert_eq!(
            refills.iter().map(|r| r.position).collect::<Vec<_>>(),
            vec![Position::new(0, 0), Position::new(1, 0)]
        );
        // Untouched columns are unchanged
        assert_eq!(next.column(1), grid.column(1));
        // The source grid is a value and stays as it was
        assert_eq!(grid.column(0), vec![1, 2, 9, 3, 9]);
    }

    #[test]
    fn test_gravity_skips_fixed_cells() {
        // Column top to bottom: A W(fixed) X B X
        let mut rows = vec![vec![0u32; 5]; 5];
        for (row, id) in [1, 5, 9, 2, 9].into_iter().enumerate() {
            rows[row][3] = id;
        }
        let grid = Grid::from_rows(&rows).unwrap();
        let removed = positions(&[(2, 3), (4, 3)]);
        let fixed = positions(&[(1, 3)]);
        let selector = WeightedSelector::new(&[(8, 1)]).unwrap();
        let mut rng = ScriptedSource::constant(0.1);

        let (next, refills) = grid.collapse(&removed, &fixed, &selector, &mut rng).unwrap();

        // Free slots are rows 0, 2, 3, 4; survivors A, B land on rows 3, 4
        assert_eq!(next.column(3), vec![8, 5, 8, 1, 2]);
        assert_eq!(refills.len(), 2);
    }
}
