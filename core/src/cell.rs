use serde::{Deserialize, Serialize};

/// Full state of one board cell, including the hidden mine bit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    is_mine: bool,
    is_revealed: bool,
    is_flagged: bool,
    neighbor_mine_count: u8,
}

impl Cell {
    pub const fn is_mine(self) -> bool {
        self.is_mine
    }

    pub const fn is_revealed(self) -> bool {
        self.is_revealed
    }

    pub const fn is_flagged(self) -> bool {
        self.is_flagged
    }

    /// Mines among the neighbouring cells, kept at 0 for mines themselves.
    pub const fn neighbor_mine_count(self) -> u8 {
        self.neighbor_mine_count
    }

    /// What a player is allowed to see of this cell.
    pub const fn view(self) -> CellView {
        match (self.is_revealed, self.is_mine, self.is_flagged) {
            (true, true, _) => CellView::Mine,
            (true, false, _) => CellView::Revealed(self.neighbor_mine_count),
            (false, _, true) => CellView::Flagged,
            (false, _, false) => CellView::Hidden,
        }
    }

    pub(crate) fn set_mine(&mut self, is_mine: bool) {
        self.is_mine = is_mine;
    }

    pub(crate) fn set_neighbor_mine_count(&mut self, count: u8) {
        self.neighbor_mine_count = count;
    }

    pub(crate) fn reveal(&mut self) {
        self.is_revealed = true;
    }

    /// Flips the flag and returns the new value.
    pub(crate) fn toggle_flag(&mut self) -> bool {
        self.is_flagged = !self.is_flagged;
        self.is_flagged
    }
}

/// Player-visible state of a cell, as handed out in snapshots.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellView {
    #[default]
    Hidden,
    Flagged,
    Revealed(u8),
    Mine,
}

impl CellView {
    pub const fn is_unrevealed(self) -> bool {
        matches!(self, Self::Hidden | Self::Flagged)
    }
}
