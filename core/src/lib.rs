#![no_std]

extern crate alloc;

use serde::{Deserialize, Serialize};

pub use board::*;
pub use cell::*;
pub use engine::*;
pub use error::*;
pub use types::*;

mod board;
mod cell;
mod engine;
mod error;
mod types;

/// Mine density, in mines per thousand cells, used when a caller only knows the board size.
pub const DEFAULT_MINE_DENSITY: u16 = 90;

/// Validated board size and mine count for one game.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: Coord2,
    pub mines: CellCount,
}

impl GameConfig {
    pub(crate) const fn new_unchecked(size: Coord2, mines: CellCount) -> Self {
        Self { size, mines }
    }

    /// Requires a non-empty board with at least one mine and one safe cell.
    pub fn new(size: Coord2, mines: CellCount) -> Result<Self> {
        if size.0 == 0 || size.1 == 0 {
            return Err(GameError::InvalidDimensions);
        }
        if mines == 0 || mines >= mult(size.0, size.1) {
            return Err(GameError::InvalidMineCount);
        }
        Ok(Self::new_unchecked(size, mines))
    }

    /// Sizes the mine count from a density in mines per thousand cells, rounding
    /// half up and keeping at least one mine and one safe cell.
    pub fn with_density(size: Coord2, per_mille: u16) -> Result<Self> {
        if size.0 == 0 || size.1 == 0 {
            return Err(GameError::InvalidDimensions);
        }

        let total = u32::from(mult(size.0, size.1));
        let mines = (total * u32::from(per_mille) + 500) / 1000;
        let mines = mines.clamp(1, total.saturating_sub(1).max(1));
        Self::new(size, mines as CellCount)
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    pub const fn safe_cells(&self) -> CellCount {
        self.total_cells().saturating_sub(self.mines)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MarkOutcome {
    NoChange,
    Changed,
}

impl MarkOutcome {
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Changed => true,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    HitMine,
    Won,
}

impl RevealOutcome {
    pub const fn has_update(self) -> bool {
        use RevealOutcome::*;
        match self {
            NoChange => false,
            Revealed => true,
            HitMine => true,
            Won => true,
        }
    }
}
