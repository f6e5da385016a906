use std::io;

use clap::{Parser, Subcommand};
use dropfour::Engine;
use tracing_subscriber::EnvFilter;

/// Connect Four engine driven by Monte Carlo Tree Search. Reads commands from
/// the standard input unless a subcommand is given.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Seed for the random number generator, picked by the OS if omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// Thinking time per move in milliseconds.
    #[arg(long)]
    movetime: Option<u64>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Searches a fixed set of positions and reports the speed.
    Bench,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so that they do not interfere with the protocol.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Some(Command::Bench) = cli.command {
        return dropfour::bench(&mut io::stdout().lock());
    }

    dropfour::print_engine_info();

    let mut engine = cli.seed.map_or_else(Engine::new, Engine::with_seed);
    if let Some(movetime) = cli.movetime {
        engine.set_movetime(movetime);
    }
    engine.command_loop(&mut io::stdin().lock(), &mut io::stdout().lock())
}
