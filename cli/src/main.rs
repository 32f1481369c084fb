use clap::Parser;
use minefield_core::{CellCount, Coord, DEFAULT_MINE_DENSITY, GameConfig, GameEngine};
use std::io::{self, BufRead, Write};

use command::{Command, CommandError, HELP};

mod command;
mod render;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Number of board rows
    #[arg(short, long, default_value_t = 11)]
    rows: Coord,

    /// Number of board columns
    #[arg(short, long, default_value_t = 18)]
    cols: Coord,

    /// Number of mines, sized from the board area when omitted
    #[arg(short, long)]
    mines: Option<CellCount>,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,
}

impl Args {
    fn game_config(&self) -> minefield_core::Result<GameConfig> {
        let size = (self.rows, self.cols);
        match self.mines {
            Some(mines) => GameConfig::new(size, mines),
            None => GameConfig::with_density(size, DEFAULT_MINE_DENSITY),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.verbose.tracing_level_filter())
        .with_writer(io::stderr)
        .init();

    let seed = args.seed.unwrap_or_else(rand::random);
    let config = args.game_config()?;
    let mut engine = GameEngine::new(config.size, config.mines, seed)?;
    log::debug!("App started");

    let mut out = io::stdout().lock();
    writeln!(out, "{HELP}")?;
    render::write_status(&mut out, &engine.status())?;
    prompt(&mut out)?;

    for line in io::stdin().lock().lines() {
        match line?.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(Command::Help) => writeln!(out, "{HELP}")?,
            Ok(command) => match command.apply(&mut engine) {
                Ok(true) => render::write_status(&mut out, &engine.status())?,
                Ok(false) => {}
                Err(err) => writeln!(out, "{err}")?,
            },
            Err(CommandError::Empty) => {}
            Err(err) => writeln!(out, "{err}")?,
        }
        prompt(&mut out)?;
    }

    Ok(())
}

fn prompt(out: &mut impl Write) -> io::Result<()> {
    write!(out, "> ")?;
    out.flush()
}
