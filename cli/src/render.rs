use minefield_core::{CellView, Outcome, Snapshot};
use std::io::{self, Write};

pub fn glyph(cell: CellView) -> char {
    match cell {
        CellView::Hidden => '.',
        CellView::Flagged => 'F',
        CellView::Mine => '*',
        CellView::Revealed(0) => ' ',
        CellView::Revealed(count) => char::from_digit(count.into(), 10).unwrap_or('?'),
    }
}

fn status_text(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::InProgress => "",
        Outcome::Won => "  YOU WIN",
        Outcome::Lost => "  GAME OVER",
    }
}

/// Writes the mine counter, the outcome and the board, one glyph per cell.
pub fn write_status(out: &mut impl Write, status: &Snapshot) -> io::Result<()> {
    let (rows, cols) = status.size;

    writeln!(
        out,
        "Mines: {}{}",
        status.mines_remaining,
        status_text(status.outcome)
    )?;

    write!(out, "   ")?;
    for col in 0..cols {
        write!(out, " {}", col % 10)?;
    }
    writeln!(out)?;

    for row in 0..rows {
        write!(out, "{:>2} ", row)?;
        for col in 0..cols {
            let cell = status.cell((row, col)).unwrap_or_default();
            write!(out, " {}", glyph(cell))?;
        }
        writeln!(out)?;
    }
    Ok(())
}
