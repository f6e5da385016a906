//! The engine puts all pieces together: it owns the game being played, the
//! random number generator used by the search and the search parameters. It
//! also implements a small line-based text protocol (modeled on the
//! [Universal Chess Interface]) for communicating with a client.
//!
//! [`Engine::command_loop`] is the "main loop" of the engine which reads
//! commands from the input stream and writes responses to the output stream.
//!
//! [Universal Chess Interface]: https://www.chessprogramming.org/UCI

use std::io::{BufRead, Write};

use anyhow::{bail, Context};
use itertools::Itertools;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::connect_four::position::Position;
use crate::connect_four::Column;
use crate::engine::protocol::{Command, EngineOption, Limits, OptionValue};
use crate::environment::Environment;
use crate::search::{self, first_player_score, Limiter, SearchConfig, Tree};

mod bench;
mod protocol;

pub use bench::bench;

/// Thinking time per move unless specified otherwise.
const DEFAULT_MOVETIME: u64 = 100;

/// A game session: the position, the random number generator and the search
/// settings. Every search started by the engine goes through this object.
pub struct Engine {
    position: Position,
    rng: SmallRng,
    config: SearchConfig,
    /// Thinking time per move in milliseconds.
    movetime: u64,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Creates an engine with an empty board and a generator seeded from the
    /// operating system.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(SmallRng::from_entropy())
    }

    /// Creates an engine whose searches are reproducible given the same
    /// sequence of commands (and iteration-limited searches).
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }

    fn with_rng(rng: SmallRng) -> Self {
        Self {
            position: Position::starting(),
            rng,
            config: SearchConfig::default(),
            movetime: DEFAULT_MOVETIME,
        }
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> &Position {
        &self.position
    }

    /// Replaces the current position.
    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// Search parameters.
    #[must_use]
    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Thinking time per move in milliseconds.
    #[must_use]
    pub const fn movetime(&self) -> u64 {
        self.movetime
    }

    /// Changes the thinking time per move.
    pub fn set_movetime(&mut self, millis: u64) {
        self.movetime = millis;
    }

    /// Starts a new game.
    pub fn new_game(&mut self) {
        self.position.reset();
    }

    /// Plays a move for the side to move.
    ///
    /// # Errors
    ///
    /// Fails if the game is over or the column is full.
    pub fn play(&mut self, column: Column) -> anyhow::Result<()> {
        if self.position.is_done() {
            bail!("the game is over");
        }
        if !self.position.legal_columns().contains(&column) {
            bail!("column {column} is full");
        }
        self.position.advance(column);
        Ok(())
    }

    /// Builds the search tree for the current position.
    pub fn search(&mut self, limiter: &Limiter) -> Tree<Position> {
        search::search(&self.position, &self.config, limiter, &mut self.rng)
    }

    /// Picks a move for the side to move using the default thinking time.
    ///
    /// # Errors
    ///
    /// Fails if there are no legal moves.
    pub fn think(&mut self) -> anyhow::Result<Column> {
        let limiter = Limiter::movetime(self.movetime);
        self.search(&limiter)
            .best_action()
            .context("no legal moves in the current position")
    }

    /// Estimated winning probability of each column for the side to move,
    /// `None` for full columns.
    pub fn scores(&mut self) -> Vec<Option<f64>> {
        let limiter = Limiter::movetime(self.movetime);
        self.search(&limiter).scores()
    }

    /// Lets the engine play against itself from the current position until the
    /// game ends. `movetimes` are the thinking times of the first and the
    /// second player. Every position is written to the output. Returns the
    /// final score from the first player's perspective.
    ///
    /// # Errors
    ///
    /// Propagates output errors.
    pub fn selfplay(&mut self, movetimes: [u64; 2], output: &mut impl Write) -> anyhow::Result<f64> {
        write!(output, "{}", self.position)?;
        loop {
            if let Some(score) = first_player_score(&self.position) {
                info!(score, stones = self.position.stones(), "selfplay finished");
                return Ok(score);
            }
            let movetime = movetimes[usize::from(!self.position.is_first_player())];
            let column = self
                .search(&Limiter::movetime(movetime))
                .best_action()
                .context("no legal moves in an unfinished game")?;
            self.play(column)?;
            writeln!(output, "move {column}")?;
            write!(output, "{}", self.position)?;
        }
    }

    /// Continuously reads the input stream and executes commands until "quit"
    /// is sent or the input ends.
    ///
    /// Malformed or unsupported commands are reported with an `info string`
    /// line and skipped.
    ///
    /// # Errors
    ///
    /// Fails if reading the input or writing the output fails.
    pub fn command_loop(
        &mut self,
        input: &mut impl BufRead,
        output: &mut impl Write,
    ) -> anyhow::Result<()> {
        let mut line = String::new();
        loop {
            line.clear();
            if input.read_line(&mut line)? == 0 {
                // EOF reached.
                break;
            }
            debug!(command = line.trim(), "received");
            match Command::parse(&line) {
                Command::Uci => Self::handle_uci(output)?,
                Command::IsReady => writeln!(output, "readyok")?,
                Command::SetOption { option, value } => self.handle_setoption(option, value, output)?,
                Command::SetPosition { moves } => match Position::from_moves(&moves) {
                    Ok(position) => self.position = position,
                    Err(e) => writeln!(output, "info string Invalid position: {e:#}")?,
                },
                Command::Play { column } => {
                    if let Err(e) = self.play(column) {
                        writeln!(output, "info string Illegal move: {e}")?;
                    }
                },
                Command::NewGame => self.new_game(),
                Command::Go(limits) => self.handle_go(limits, output)?,
                Command::Scores(limits) => self.handle_scores(limits, output)?,
                Command::SelfPlay { movetime } => {
                    let movetime = movetime.unwrap_or(self.movetime);
                    let score = self.selfplay([movetime; 2], output)?;
                    writeln!(output, "result {score}")?;
                },
                Command::Display => write!(output, "{}", self.position)?,
                Command::Quit => break,
                Command::Unknown(command) => {
                    writeln!(output, "info string Unsupported command: {command}")?;
                },
            }
            output.flush()?;
        }
        Ok(())
    }

    /// Responds to the `uci` handshake by identifying the engine and listing
    /// the options.
    fn handle_uci(output: &mut impl Write) -> anyhow::Result<()> {
        writeln!(
            output,
            "id name {} {}",
            env!("CARGO_PKG_NAME"),
            crate::engine_version()
        )?;
        writeln!(output, "id author {}", env!("CARGO_PKG_AUTHORS"))?;
        writeln!(
            output,
            "option name MoveTime type spin default {DEFAULT_MOVETIME} min 0 max 3600000"
        )?;
        writeln!(
            output,
            "option name Exploration type string default {}",
            SearchConfig::default().exploration
        )?;
        writeln!(
            output,
            "option name ExpansionThreshold type spin default {} min 1 max 1000000",
            SearchConfig::default().expansion_threshold
        )?;
        writeln!(output, "option name Seed type spin default 0")?;
        writeln!(output, "uciok")?;
        Ok(())
    }

    fn handle_setoption(
        &mut self,
        option: EngineOption,
        value: OptionValue,
        output: &mut impl Write,
    ) -> anyhow::Result<()> {
        match (option, value) {
            (EngineOption::MoveTime, OptionValue::Integer(millis)) => self.movetime = millis,
            (EngineOption::Exploration, OptionValue::Float(exploration)) => {
                self.config.exploration = exploration;
            },
            (EngineOption::ExpansionThreshold, OptionValue::Integer(threshold)) => {
                match u32::try_from(threshold) {
                    Ok(threshold) if threshold > 0 => self.config.expansion_threshold = threshold,
                    _ => writeln!(
                        output,
                        "info string ExpansionThreshold should be within [1; {}], got {threshold}",
                        u32::MAX
                    )?,
                }
            },
            (EngineOption::Seed, OptionValue::Integer(seed)) => {
                self.rng = SmallRng::seed_from_u64(seed);
            },
            (option, value) => {
                writeln!(output, "info string Unexpected value {value:?} for {option:?}")?;
            },
        }
        Ok(())
    }

    fn limiter(&self, limits: Limits) -> Limiter {
        match limits {
            Limits {
                movetime: None,
                iterations: Some(iterations),
            } => Limiter::iterations(iterations),
            Limits {
                movetime,
                iterations,
            } => {
                let limiter = Limiter::movetime(movetime.unwrap_or(self.movetime));
                match iterations {
                    Some(iterations) => limiter.with_iterations(iterations),
                    None => limiter,
                }
            },
        }
    }

    fn report(tree: &Tree<Position>, limiter: &Limiter, output: &mut impl Write) -> anyhow::Result<()> {
        writeln!(
            output,
            "info iterations {} nodes {} time {}",
            tree.iterations(),
            tree.len(),
            limiter.elapsed().as_millis()
        )?;
        Ok(())
    }

    fn handle_go(&mut self, limits: Limits, output: &mut impl Write) -> anyhow::Result<()> {
        let limiter = self.limiter(limits);
        let tree = self.search(&limiter);
        Self::report(&tree, &limiter, output)?;
        match tree.best_action() {
            Some(column) => writeln!(output, "bestmove {column}")?,
            None => writeln!(output, "info string No legal moves")?,
        }
        Ok(())
    }

    fn handle_scores(&mut self, limits: Limits, output: &mut impl Write) -> anyhow::Result<()> {
        let limiter = self.limiter(limits);
        let tree = self.search(&limiter);
        Self::report(&tree, &limiter, output)?;
        writeln!(
            output,
            "scores {}",
            tree.scores()
                .iter()
                .map(|score| score.map_or_else(|| "-".to_string(), |score| format!("{score:.3}")))
                .join(" ")
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::environment::WinningStatus;

    fn run(engine: &mut Engine, commands: &str) -> String {
        let mut output = Vec::new();
        engine
            .command_loop(&mut Cursor::new(commands), &mut output)
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn handshake() {
        let output = run(&mut Engine::with_seed(0), "uci\nisready\n");
        assert!(output.starts_with("id name dropfour"));
        assert!(output.contains("option name MoveTime"));
        assert!(output.ends_with("uciok\nreadyok\n"));
    }

    #[test]
    fn play_moves() {
        let mut engine = Engine::with_seed(0);
        let output = run(&mut engine, "play 3\nplay 3\nd\n");
        assert_eq!(
            output,
            "turn: x\n\
             .......\n\
             .......\n\
             .......\n\
             .......\n\
             ...o...\n\
             ...x...\n"
        );
        assert_eq!(engine.position().stones(), 2);
    }

    #[test]
    fn illegal_moves_are_rejected() {
        let mut engine = Engine::with_seed(0);
        let output = run(&mut engine, "position moves 000000\nplay 0\n");
        assert_eq!(output, "info string Illegal move: column 0 is full\n");
        assert_eq!(engine.position().winning_status(), WinningStatus::Ongoing);

        engine.set_position(Position::from_moves("0606060").unwrap());
        assert!(engine.play(Column::try_from(1u8).unwrap()).is_err());
    }

    #[test]
    fn invalid_position() {
        let mut engine = Engine::with_seed(0);
        let output = run(&mut engine, "position moves 08\n");
        assert!(output.starts_with("info string Invalid position"));
        assert_eq!(engine.position(), &Position::starting());
    }

    #[test]
    fn options() {
        let mut engine = Engine::with_seed(0);
        let output = run(
            &mut engine,
            "setoption name MoveTime value 7\n\
             setoption name Exploration value 2.5\n\
             setoption name ExpansionThreshold value 3\n\
             setoption name ExpansionThreshold value 0\n",
        );
        assert_eq!(engine.movetime(), 7);
        assert!((engine.config().exploration - 2.5).abs() < f64::EPSILON);
        assert_eq!(engine.config().expansion_threshold, 3);
        assert!(output.starts_with("info string ExpansionThreshold should be within"));
    }

    #[test]
    fn go_finds_winning_move() {
        let mut engine = Engine::with_seed(0);
        let output = run(&mut engine, "position moves 060606\ngo iterations 2000\n");
        assert!(output.starts_with("info iterations 2000 nodes "));
        assert!(output.ends_with("bestmove 0\n"));
    }

    #[test]
    fn go_without_time() {
        let mut engine = Engine::with_seed(0);
        let output = run(&mut engine, "go movetime 0\n");
        assert!(output.starts_with("info iterations 0 nodes 8 "));
        assert!(output.ends_with("bestmove 0\n"));
    }

    #[test]
    fn go_in_finished_game() {
        let mut engine = Engine::with_seed(0);
        let output = run(
            &mut engine,
            "position moves 436014551150160155104632660465204242223333\ngo iterations 5\n",
        );
        assert!(output.ends_with("info string No legal moves\n"));
        assert!(engine.think().is_err());
    }

    #[test]
    fn scores_output() {
        let mut engine = Engine::with_seed(0);
        let output = run(&mut engine, "position moves 000000\nscores iterations 100\n");
        let scores = output.lines().last().unwrap();
        let fields: Vec<&str> = scores.split_whitespace().collect();
        assert_eq!(fields.len(), 8);
        assert_eq!(fields[0], "scores");
        assert_eq!(fields[1], "-");
        for field in &fields[2..] {
            let score: f64 = field.parse().unwrap();
            assert!((0.0..=1.0).contains(&score));
        }
    }

    #[test]
    fn selfplay_finishes() {
        let mut engine = Engine::with_seed(0);
        let output = run(&mut engine, "selfplay movetime 1\n");
        assert!(engine.position().is_done());
        let result = output.lines().last().unwrap();
        assert!(["result 1", "result 0", "result 0.5"].contains(&result));
    }

    #[test]
    fn unknown_command() {
        let output = run(&mut Engine::with_seed(0), "jump\nquit\nd\n");
        assert_eq!(output, "info string Unsupported command: jump\n");
    }
}
