use alloc::collections::VecDeque;
use ndarray::Array2;
use rand::{Rng, SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};

use crate::*;

/// Result classification of a session.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    #[default]
    InProgress,
    Won,
    Lost,
}

impl Outcome {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Valid transitions:
/// - NotStarted -> InProgress
/// - NotStarted -> Won
/// - InProgress -> Won
/// - InProgress -> Lost
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    NotStarted,
    InProgress,
    Won,
    Lost,
}

impl EngineState {
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::NotStarted)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Immutable picture of a session for presenters to render from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub size: Coord2,
    pub cells: Array2<CellView>,
    pub mines_remaining: isize,
    pub outcome: Outcome,
}

impl Snapshot {
    pub fn cell(&self, coords: Coord2) -> Option<CellView> {
        self.cells.get(coords.to_nd_index()).copied()
    }
}

/// One game from first reveal to win or loss.
///
/// `mines_remaining` is flag bookkeeping only: it starts at the mine count and
/// moves by one per flag set or cleared, so it goes negative when the player
/// over-flags.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    config: GameConfig,
    board: Board,
    mines_remaining: isize,
    revealed_count: CellCount,
    is_first_move: bool,
    mines_placed: bool,
    outcome: Outcome,
}

impl GameSession {
    /// Session whose mines get placed on the first reveal.
    pub fn new(config: GameConfig) -> Result<Self> {
        let config = GameConfig::new(config.size, config.mines)?;
        let board = Board::new(config.size)?;
        Ok(Self::from_parts(config, board, false))
    }

    /// Session over an already laid out board. A first reveal on a mine moves
    /// that mine away instead of losing.
    ///
    /// Boards that already carry revealed or flagged cells resume where they
    /// left off: counters and outcome are read back from the cells.
    pub fn with_board(board: Board) -> Result<Self> {
        let config = GameConfig::new(board.size(), board.mine_count())?;
        let mut session = Self::from_parts(config, board, true);
        session.resume_from_board();
        Ok(session)
    }

    fn from_parts(config: GameConfig, board: Board, mines_placed: bool) -> Self {
        Self {
            config,
            board,
            mines_remaining: config.mines as isize,
            revealed_count: 0,
            is_first_move: true,
            mines_placed,
            outcome: Outcome::InProgress,
        }
    }

    fn resume_from_board(&mut self) {
        let mut revealed_safe: CellCount = 0;
        let mut flagged: isize = 0;
        let mut mine_revealed = false;

        for (_, cell) in self.board.iter() {
            if cell.is_flagged() {
                flagged += 1;
            }
            match (cell.is_revealed(), cell.is_mine()) {
                (true, true) => mine_revealed = true,
                (true, false) => revealed_safe += 1,
                _ => {}
            }
        }

        self.revealed_count = revealed_safe;
        self.mines_remaining = self.config.mines as isize - flagged;
        self.is_first_move = revealed_safe == 0 && !mine_revealed;
        self.outcome = if mine_revealed {
            Outcome::Lost
        } else if revealed_safe == self.board.safe_cell_count() {
            Outcome::Won
        } else {
            Outcome::InProgress
        };

        if !self.is_first_move {
            log::debug!(
                "Resumed board with {revealed_safe} revealed cells, outcome {:?}",
                self.outcome
            );
        }
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn state(&self) -> EngineState {
        match self.outcome {
            Outcome::InProgress if self.is_first_move => EngineState::NotStarted,
            Outcome::InProgress => EngineState::InProgress,
            Outcome::Won => EngineState::Won,
            Outcome::Lost => EngineState::Lost,
        }
    }

    pub fn is_first_move(&self) -> bool {
        self.is_first_move
    }

    pub fn mines_placed(&self) -> bool {
        self.mines_placed
    }

    pub fn mines_remaining(&self) -> isize {
        self.mines_remaining
    }

    pub fn status(&self) -> Snapshot {
        Snapshot {
            size: self.board.size(),
            cells: self.board.views(),
            mines_remaining: self.mines_remaining,
            outcome: self.outcome,
        }
    }

    pub fn reveal<R: Rng + ?Sized>(
        &mut self,
        coords: Coord2,
        rng: &mut R,
    ) -> Result<RevealOutcome> {
        let coords = self.board.validate_coords(coords)?;
        let cell = self.board[coords];

        if self.outcome.is_finished() || cell.is_revealed() || cell.is_flagged() {
            return Ok(RevealOutcome::NoChange);
        }

        if self.is_first_move {
            self.secure_first_move(coords, rng)?;
            self.is_first_move = false;
        }

        if self.board[coords].is_mine() {
            log::debug!("hit mine at {:?}", coords);
            self.board.reveal_mines();
            self.outcome = Outcome::Lost;
            return Ok(RevealOutcome::HitMine);
        }

        self.flood_reveal(coords);

        if self.revealed_count == self.board.safe_cell_count() {
            log::debug!("all safe cells revealed");
            self.outcome = Outcome::Won;
            Ok(RevealOutcome::Won)
        } else {
            Ok(RevealOutcome::Revealed)
        }
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        let coords = self.board.validate_coords(coords)?;

        if self.outcome.is_finished() || self.board[coords].is_revealed() {
            return Ok(MarkOutcome::NoChange);
        }

        if self.board.cell_mut(coords).toggle_flag() {
            self.mines_remaining -= 1;
        } else {
            self.mines_remaining += 1;
        }
        Ok(MarkOutcome::Changed)
    }

    /// Makes sure `coords` holds no mine, either by placing the layout around it
    /// or by moving the one mine sitting on it.
    fn secure_first_move<R: Rng + ?Sized>(
        &mut self,
        coords: Coord2,
        rng: &mut R,
    ) -> Result<()> {
        if !self.mines_placed {
            self.board.place_mines(self.config.mines, coords, rng)?;
            self.mines_placed = true;
        } else if self.board[coords].is_mine() {
            self.board.relocate_mine(coords);
        }
        Ok(())
    }

    fn flood_reveal(&mut self, start: Coord2) {
        let mut to_visit = VecDeque::from([start]);

        while let Some(coords) = to_visit.pop_front() {
            let cell = self.board[coords];
            if cell.is_revealed() || cell.is_flagged() || cell.is_mine() {
                continue;
            }

            self.board.cell_mut(coords).reveal();
            self.revealed_count += 1;
            log::trace!(
                "revealed {:?}, mine count: {}",
                coords,
                cell.neighbor_mine_count()
            );

            if cell.neighbor_mine_count() == 0 {
                to_visit.extend(self.board.neighbors(coords).filter(|&pos| {
                    let neighbor = self.board[pos];
                    !neighbor.is_revealed() && !neighbor.is_flagged()
                }));
            }
        }
    }
}

/// Drives sessions for a single caller, replacing the session on every new game.
///
/// All mutation goes through `&mut self`, so sharing an engine between threads
/// needs an exclusive lock around it.
#[derive(Clone, Debug)]
pub struct GameEngine {
    session: GameSession,
    rng: SmallRng,
}

impl GameEngine {
    pub fn new(size: Coord2, mines: CellCount, seed: u64) -> Result<Self> {
        let session = GameSession::new(GameConfig::new(size, mines)?)?;
        Ok(Self::with_session(session, seed))
    }

    pub fn with_session(session: GameSession, seed: u64) -> Self {
        log::debug!("seed: {}", seed);
        Self {
            session,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Starts over with a fresh session. On error the current session is kept.
    pub fn new_game(&mut self, size: Coord2, mines: CellCount) -> Result<()> {
        let session = GameSession::new(GameConfig::new(size, mines)?)?;
        log::debug!("new game: {:?} with {} mines", size, mines);
        self.session = session;
        Ok(())
    }

    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        self.session.reveal(coords, &mut self.rng)
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        self.session.toggle_flag(coords)
    }

    pub fn status(&self) -> Snapshot {
        self.session.status()
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn board(&self) -> &Board {
        self.session.board()
    }

    pub fn config(&self) -> GameConfig {
        self.session.config()
    }

    pub fn size(&self) -> Coord2 {
        self.session.config().size
    }

    pub fn state(&self) -> EngineState {
        self.session.state()
    }

    pub fn outcome(&self) -> Outcome {
        self.session.outcome()
    }

    pub fn is_finished(&self) -> bool {
        self.session.outcome().is_finished()
    }

    pub fn mines_remaining(&self) -> isize {
        self.session.mines_remaining()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with_mines(size: Coord2, mines: &[Coord2]) -> GameEngine {
        let board = Board::from_mine_coords(size, mines).unwrap();
        GameEngine::with_session(GameSession::with_board(board).unwrap(), 0)
    }

    fn mine_total(engine: &GameEngine) -> usize {
        engine.board().iter().filter(|(_, cell)| cell.is_mine()).count()
    }

    #[test]
    fn new_game_defers_mine_placement() {
        let engine = GameEngine::new((8, 8), 10, 1).unwrap();

        assert!(engine.state().is_ready());
        assert_eq!(engine.outcome(), Outcome::InProgress);
        assert_eq!(engine.mines_remaining(), 10);
        assert!(!engine.session().mines_placed());
        assert_eq!(mine_total(&engine), 0);
    }

    #[test]
    fn first_reveal_places_mines_around_it() {
        let mut engine = GameEngine::new((8, 8), 10, 1).unwrap();

        let outcome = engine.reveal((4, 4)).unwrap();

        assert_ne!(outcome, RevealOutcome::HitMine);
        assert!(engine.session().mines_placed());
        assert!(!engine.session().is_first_move());
        assert_eq!(mine_total(&engine), 10);
        assert!(engine.board()[(4, 4)].is_revealed());
        assert!(!engine.board()[(4, 4)].is_mine());
    }

    #[test]
    fn first_reveal_on_mine_relocates_it() {
        let mut engine = engine_with_mines((3, 3), &[(0, 0), (1, 1)]);

        let outcome = engine.reveal((1, 1)).unwrap();

        assert_eq!(outcome, RevealOutcome::Revealed);
        assert_eq!(engine.state(), EngineState::InProgress);
        assert!(!engine.board()[(1, 1)].is_mine());
        assert!(engine.board()[(0, 1)].is_mine());
        assert_eq!(engine.board()[(1, 1)].neighbor_mine_count(), 2);
        assert_eq!(engine.status().cell((1, 1)), Some(CellView::Revealed(2)));
        assert_eq!(mine_total(&engine), 2);
    }

    #[test]
    fn later_reveal_on_mine_loses_and_shows_every_mine() {
        let mut engine = engine_with_mines((3, 3), &[(0, 0), (2, 2)]);
        engine.toggle_flag((2, 2)).unwrap();

        assert_eq!(engine.reveal((0, 1)).unwrap(), RevealOutcome::Revealed);
        assert_eq!(engine.reveal((0, 0)).unwrap(), RevealOutcome::HitMine);

        assert_eq!(engine.state(), EngineState::Lost);
        let status = engine.status();
        assert_eq!(status.outcome, Outcome::Lost);
        assert_eq!(status.cell((0, 0)), Some(CellView::Mine));
        assert_eq!(status.cell((2, 2)), Some(CellView::Mine));
        assert_eq!(status.cell((1, 1)), Some(CellView::Hidden));
    }

    #[test]
    fn flood_reveal_opens_zero_region_and_its_border() {
        let mut engine = engine_with_mines((4, 4), &[(3, 3)]);

        let outcome = engine.reveal((0, 0)).unwrap();

        assert_eq!(outcome, RevealOutcome::Won);
        let status = engine.status();
        assert_eq!(status.cell((0, 0)), Some(CellView::Revealed(0)));
        assert_eq!(status.cell((2, 2)), Some(CellView::Revealed(1)));
        assert_eq!(status.cell((3, 3)), Some(CellView::Hidden));
    }

    #[test]
    fn flood_reveal_stops_at_numbered_cells() {
        // column 2 is a wall of mines
        let mut engine = engine_with_mines((3, 5), &[(0, 2), (1, 2), (2, 2)]);

        assert_eq!(engine.reveal((1, 0)).unwrap(), RevealOutcome::Revealed);

        let status = engine.status();
        for row in 0..3 {
            assert!(!status.cell((row, 0)).unwrap().is_unrevealed());
            assert!(!status.cell((row, 1)).unwrap().is_unrevealed());
            assert!(status.cell((row, 3)).unwrap().is_unrevealed());
            assert!(status.cell((row, 4)).unwrap().is_unrevealed());
        }
    }

    #[test]
    fn flood_reveal_skips_flagged_cells() {
        let mut engine = engine_with_mines((4, 4), &[(3, 3)]);
        engine.toggle_flag((0, 3)).unwrap();

        assert_eq!(engine.reveal((0, 0)).unwrap(), RevealOutcome::Revealed);

        assert!(!engine.board()[(0, 3)].is_revealed());
        assert!(engine.board()[(0, 3)].is_flagged());
        assert!(engine.board()[(1, 3)].is_revealed());

        engine.toggle_flag((0, 3)).unwrap();
        assert_eq!(engine.reveal((0, 3)).unwrap(), RevealOutcome::Won);
    }

    #[test]
    fn flag_toggles_adjust_mines_remaining() {
        let mut engine = GameEngine::new((5, 5), 4, 3).unwrap();

        assert_eq!(engine.toggle_flag((0, 0)).unwrap(), MarkOutcome::Changed);
        assert_eq!(engine.mines_remaining(), 3);
        assert_eq!(engine.status().cell((0, 0)), Some(CellView::Flagged));

        assert_eq!(engine.toggle_flag((0, 0)).unwrap(), MarkOutcome::Changed);
        assert_eq!(engine.mines_remaining(), 4);
        assert_eq!(engine.status().cell((0, 0)), Some(CellView::Hidden));
    }

    #[test]
    fn mines_remaining_goes_negative_when_overflagged() {
        let mut engine = GameEngine::new((3, 3), 1, 3).unwrap();

        engine.toggle_flag((0, 0)).unwrap();
        engine.toggle_flag((0, 1)).unwrap();

        assert_eq!(engine.mines_remaining(), -1);
    }

    #[test]
    fn flagged_and_revealed_cells_ignore_reveal() {
        let mut engine = engine_with_mines((3, 3), &[(2, 2)]);
        engine.toggle_flag((0, 0)).unwrap();

        assert_eq!(engine.reveal((0, 0)).unwrap(), RevealOutcome::NoChange);
        assert!(engine.session().is_first_move());

        assert_eq!(engine.reveal((1, 1)).unwrap(), RevealOutcome::Revealed);
        let before = engine.session().clone();
        assert_eq!(engine.reveal((1, 1)).unwrap(), RevealOutcome::NoChange);
        assert_eq!(engine.toggle_flag((1, 1)).unwrap(), MarkOutcome::NoChange);
        assert_eq!(engine.session(), &before);
    }

    #[test]
    fn finished_session_ignores_moves() {
        let mut engine = engine_with_mines((2, 2), &[(0, 0)]);
        engine.reveal((1, 1)).unwrap();
        engine.reveal((0, 0)).unwrap();
        assert!(engine.is_finished());

        let before = engine.session().clone();
        assert_eq!(engine.reveal((0, 1)).unwrap(), RevealOutcome::NoChange);
        assert_eq!(engine.toggle_flag((1, 0)).unwrap(), MarkOutcome::NoChange);
        assert_eq!(engine.session(), &before);
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        let mut engine = GameEngine::new((4, 6), 3, 0).unwrap();

        assert_eq!(engine.reveal((4, 0)), Err(GameError::OutOfBounds));
        assert_eq!(engine.toggle_flag((0, 6)), Err(GameError::OutOfBounds));
        assert_eq!(engine.state(), EngineState::NotStarted);
    }

    #[test]
    fn winning_reveal_finishes_in_the_same_call() {
        let mut engine = engine_with_mines((1, 3), &[(0, 1)]);

        assert_eq!(engine.reveal((0, 2)).unwrap(), RevealOutcome::Revealed);
        assert_eq!(engine.state(), EngineState::InProgress);
        assert_eq!(engine.reveal((0, 0)).unwrap(), RevealOutcome::Won);
        assert_eq!(engine.state(), EngineState::Won);
    }

    #[test]
    fn new_game_replaces_session_wholesale() {
        let mut engine = GameEngine::new((4, 4), 2, 9).unwrap();
        engine.toggle_flag((0, 0)).unwrap();
        engine.reveal((3, 3)).unwrap();

        engine.new_game((6, 7), 5).unwrap();

        assert_eq!(engine.size(), (6, 7));
        assert_eq!(engine.state(), EngineState::NotStarted);
        assert_eq!(engine.mines_remaining(), 5);
        assert!(engine.board().iter().all(|(_, cell)| cell == Cell::default()));
    }

    #[test]
    fn rejected_new_game_keeps_current_session() {
        let mut engine = GameEngine::new((5, 5), 3, 9).unwrap();
        engine.toggle_flag((2, 2)).unwrap();
        let before = engine.session().clone();

        assert_eq!(engine.new_game((5, 5), 25), Err(GameError::InvalidMineCount));
        assert_eq!(engine.new_game((0, 5), 1), Err(GameError::InvalidDimensions));
        assert_eq!(engine.session(), &before);
        assert!(engine.new_game((5, 5), 24).is_ok());
    }

    #[test]
    fn with_board_rejects_unplayable_layouts() {
        let empty = Board::new((3, 3)).unwrap();
        assert_eq!(GameSession::with_board(empty), Err(GameError::InvalidMineCount));

        let full = Board::from_mine_coords((1, 2), &[(0, 0), (0, 1)]).unwrap();
        assert_eq!(GameSession::with_board(full), Err(GameError::InvalidMineCount));
    }

    #[test]
    fn with_board_resumes_revealed_cells() {
        let mut board = Board::from_mine_coords((1, 3), &[(0, 2)]).unwrap();
        board.cell_mut((0, 0)).reveal();
        let json = serde_json::to_string(&board).unwrap();
        let board: Board = serde_json::from_str(&json).unwrap();

        let mut session = GameSession::with_board(board).unwrap();
        assert!(!session.is_first_move());
        assert_eq!(session.state(), EngineState::InProgress);

        let mut rng = SmallRng::seed_from_u64(0);
        assert_eq!(session.reveal((0, 1), &mut rng), Ok(RevealOutcome::Won));
        assert_eq!(session.outcome(), Outcome::Won);
    }

    #[test]
    fn with_board_resumes_flags_and_finished_games() {
        let mut board = Board::from_mine_coords((2, 2), &[(0, 0), (1, 1)]).unwrap();
        board.cell_mut((0, 0)).toggle_flag();
        let session = GameSession::with_board(board.clone()).unwrap();
        assert_eq!(session.mines_remaining(), 1);
        assert!(session.is_first_move());

        board.cell_mut((0, 1)).reveal();
        board.cell_mut((1, 0)).reveal();
        let won = GameSession::with_board(board.clone()).unwrap();
        assert_eq!(won.outcome(), Outcome::Won);

        board.cell_mut((1, 1)).reveal();
        let lost = GameSession::with_board(board).unwrap();
        assert_eq!(lost.outcome(), Outcome::Lost);
        assert_eq!(lost.state(), EngineState::Lost);
    }

    #[test]
    fn same_seed_replays_the_same_layout() {
        let mut first = GameEngine::new((9, 9), 10, 42).unwrap();
        let mut second = GameEngine::new((9, 9), 10, 42).unwrap();

        first.reveal((0, 0)).unwrap();
        second.reveal((0, 0)).unwrap();

        assert_eq!(first.board(), second.board());
    }

    #[test]
    fn engine_can_sit_behind_a_lock() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GameEngine>();
    }

    #[test]
    fn snapshot_serializes() {
        let mut engine = engine_with_mines((2, 3), &[(0, 0)]);
        engine.reveal((1, 2)).unwrap();

        let json = serde_json::to_string(&engine.status()).unwrap();
        let decoded: Snapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, engine.status());
        assert!(json.contains("\"InProgress\""));
    }
}
