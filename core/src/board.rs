use core::ops::Index;
use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::*;

/// Grid of cells with a fixed size and the mine layout baked into the cells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    size: Coord2,
    cells: Array2<Cell>,
    mine_count: CellCount,
}

impl Board {
    /// Empty board: no mines, nothing revealed or flagged.
    pub fn new(size: Coord2) -> Result<Self> {
        if size.0 == 0 || size.1 == 0 {
            return Err(GameError::InvalidDimensions);
        }

        Ok(Self {
            size,
            cells: Array2::default(size.to_nd_index()),
            mine_count: 0,
        })
    }

    /// Board with mines at exactly `mine_coords`, duplicates collapsed.
    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        let mut board = Self::new(size)?;

        for &coords in mine_coords {
            let coords = board.validate_coords(coords)?;
            board.cell_mut(coords).set_mine(true);
        }

        board.mine_count = board.count_mines();
        board.recompute_neighbor_counts();
        Ok(board)
    }

    pub fn size(&self) -> Coord2 {
        self.size
    }

    pub fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if coords.0 < self.size.0 && coords.1 < self.size.1 {
            Ok(coords)
        } else {
            Err(GameError::OutOfBounds)
        }
    }

    pub fn cell(&self, coords: Coord2) -> Result<Cell> {
        let coords = self.validate_coords(coords)?;
        Ok(self[coords])
    }

    /// The in-bounds neighbours of `coords`, which is expected to be on the board.
    pub fn neighbors(&self, coords: Coord2) -> NeighborIter {
        self.cells.iter_neighbors(coords)
    }

    /// Cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Coord2, Cell)> + '_ {
        self.cells
            .indexed_iter()
            .map(|((row, col), &cell)| ((row as Coord, col as Coord), cell))
    }

    pub fn adjacent_mine_count(&self, coords: Coord2) -> u8 {
        self.neighbors(coords)
            .filter(|&pos| self[pos].is_mine())
            .count() as u8
    }

    /// Replaces the mine layout with `count` mines chosen uniformly among every
    /// cell except `excluding`.
    pub fn place_mines<R: Rng + ?Sized>(
        &mut self,
        count: CellCount,
        excluding: Coord2,
        rng: &mut R,
    ) -> Result<()> {
        let excluding = self.validate_coords(excluding)?;
        let total_cells = self.total_cells();
        if count >= total_cells {
            return Err(GameError::InvalidMineCount);
        }

        for cell in self.cells.iter_mut() {
            cell.set_mine(false);
        }

        let skipped = self.linear_index(excluding);
        let candidates = usize::from(total_cells) - 1;
        for index in rand::seq::index::sample(rng, candidates, usize::from(count)) {
            let index = if index >= skipped { index + 1 } else { index };
            let coords = self.coords_of(index);
            self.cell_mut(coords).set_mine(true);
        }

        self.mine_count = count;
        self.recompute_neighbor_counts();
        log::debug!("placed {} mines, keeping {:?} clear", count, excluding);
        Ok(())
    }

    /// Moves the mine at `from` to the first mine-free cell in row-major order,
    /// returning where it went.
    pub fn relocate_mine(&mut self, from: Coord2) -> Option<Coord2> {
        if !self.validate_coords(from).is_ok_and(|from| self[from].is_mine()) {
            return None;
        }

        let Some(to) = self
            .iter()
            .map(|(coords, _)| coords)
            .find(|&coords| coords != from && !self[coords].is_mine())
        else {
            log::warn!("no free cell to move the mine at {:?} to", from);
            return None;
        };

        self.cell_mut(from).set_mine(false);
        self.cell_mut(to).set_mine(true);
        self.recompute_neighbor_counts();
        log::debug!("relocated mine from {:?} to {:?}", from, to);
        Some(to)
    }

    /// Re-derives every cell's neighbour count from the current mine layout.
    pub fn recompute_neighbor_counts(&mut self) {
        let (rows, cols) = self.size;
        for row in 0..rows {
            for col in 0..cols {
                let coords = (row, col);
                let count = if self[coords].is_mine() {
                    0
                } else {
                    self.adjacent_mine_count(coords)
                };
                self.cell_mut(coords).set_neighbor_mine_count(count);
            }
        }
    }

    pub(crate) fn cell_mut(&mut self, coords: Coord2) -> &mut Cell {
        &mut self.cells[coords.to_nd_index()]
    }

    pub(crate) fn reveal_mines(&mut self) {
        for cell in self.cells.iter_mut().filter(|cell| cell.is_mine()) {
            cell.reveal();
        }
    }

    pub(crate) fn views(&self) -> Array2<CellView> {
        self.cells.map(|cell| cell.view())
    }

    fn count_mines(&self) -> CellCount {
        self.cells.iter().filter(|cell| cell.is_mine()).count() as CellCount
    }

    fn linear_index(&self, (row, col): Coord2) -> usize {
        usize::from(row) * usize::from(self.size.1) + usize::from(col)
    }

    fn coords_of(&self, index: usize) -> Coord2 {
        let cols = usize::from(self.size.1);
        ((index / cols) as Coord, (index % cols) as Coord)
    }
}

impl Index<Coord2> for Board {
    type Output = Cell;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.cells[coords.to_nd_index()]
    }
}
