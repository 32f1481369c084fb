use minefield_core::{CellCount, Coord2, DEFAULT_MINE_DENSITY, GameConfig, GameEngine, GameError};
use std::str::FromStr;
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  r <row> <col>              reveal a cell
  f <row> <col>              flag or unflag a cell
  n [<rows> <cols> [<mines>]] start a new game
  h                          show this help
  q                          quit";

/// One player intent read from a line of input.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Command {
    Reveal(Coord2),
    Flag(Coord2),
    NewGame {
        size: Option<Coord2>,
        mines: Option<CellCount>,
    },
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown command `{0}`, type `h` for help")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("Invalid number `{0}`")]
    InvalidNumber(String),
}

fn parse_number<T: FromStr>(text: &str) -> Result<T, CommandError> {
    text.parse()
        .map_err(|_| CommandError::InvalidNumber(text.to_string()))
}

fn parse_coords(row: &str, col: &str) -> Result<Coord2, CommandError> {
    Ok((parse_number(row)?, parse_number(col)?))
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        use Command::*;

        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(CommandError::Empty);
        };
        let args: Vec<&str> = words.collect();

        match (verb, args.as_slice()) {
            ("r" | "reveal", [row, col]) => Ok(Reveal(parse_coords(row, col)?)),
            ("r" | "reveal", _) => Err(CommandError::Usage("r <row> <col>")),
            ("f" | "flag", [row, col]) => Ok(Flag(parse_coords(row, col)?)),
            ("f" | "flag", _) => Err(CommandError::Usage("f <row> <col>")),
            ("n" | "new", []) => Ok(NewGame {
                size: None,
                mines: None,
            }),
            ("n" | "new", [rows, cols]) => Ok(NewGame {
                size: Some(parse_coords(rows, cols)?),
                mines: None,
            }),
            ("n" | "new", [rows, cols, mines]) => Ok(NewGame {
                size: Some(parse_coords(rows, cols)?),
                mines: Some(parse_number(mines)?),
            }),
            ("n" | "new", _) => Err(CommandError::Usage("n [<rows> <cols> [<mines>]]")),
            ("h" | "help", _) => Ok(Help),
            ("q" | "quit", _) => Ok(Quit),
            (other, _) => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

impl Command {
    /// Forwards the intent to the engine, returning whether the board needs redrawing.
    pub fn apply(self, engine: &mut GameEngine) -> Result<bool, GameError> {
        match self {
            Command::Reveal(coords) => {
                log::debug!("reveal cell: {:?}", coords);
                Ok(engine.reveal(coords)?.has_update())
            }
            Command::Flag(coords) => {
                log::debug!("mark cell: {:?}", coords);
                Ok(engine.toggle_flag(coords)?.has_update())
            }
            Command::NewGame { size, mines } => {
                let config = new_game_config(engine.config(), size, mines)?;
                engine.new_game(config.size, config.mines)?;
                Ok(true)
            }
            Command::Help | Command::Quit => Ok(false),
        }
    }
}

/// Keeps the current settings when nothing is given, and sizes the mines by
/// density when only a board size is.
pub fn new_game_config(
    current: GameConfig,
    size: Option<Coord2>,
    mines: Option<CellCount>,
) -> Result<GameConfig, GameError> {
    match (size, mines) {
        (None, _) => Ok(current),
        (Some(size), Some(mines)) => GameConfig::new(size, mines),
        (Some(size), None) => GameConfig::with_density(size, DEFAULT_MINE_DENSITY),
    }
}
