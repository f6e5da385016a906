//! Provides the Connect Four [`Position`]: stones of both players, the side to
//! move and the outcome of the game.
//!
//! The board is stored relative to the side to move: `us` always holds the
//! stones of the player who is about to move and `them` holds the opponent's
//! stones. Making a move drops a stone into `us` and then swaps the two boards.

use std::fmt;
use std::mem;

use anyhow::{bail, Context};
use arrayvec::ArrayVec;

use crate::connect_four::bitboard::Bitboard;
use crate::connect_four::{Column, CELLS, HEIGHT, WIDTH};
use crate::environment::{Environment, Player, WinningStatus};

/// Length of a winning line.
const CONNECT: usize = 4;

/// Pairs of opposite directions `(row, column)` the flood fill follows when
/// looking for a line. Vertical lines are handled separately.
const LINES: [[(isize, isize); 2]; 3] = [
    // Horizontal.
    [(0, 1), (0, -1)],
    // Rising diagonal.
    [(1, 1), (-1, -1)],
    // Falling diagonal.
    [(-1, 1), (1, -1)],
];

/// Legal moves in a position, ordered from left to right.
pub type Columns = ArrayVec<Column, WIDTH>;

/// State of a Connect Four game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    us: Bitboard,
    them: Bitboard,
    side_to_move: Player,
    status: WinningStatus,
}

impl Default for Position {
    fn default() -> Self {
        Self::starting()
    }
}

impl Position {
    /// Creates an empty board with the first player to move.
    ///
    /// ```
    /// use dropfour::connect_four::position::Position;
    /// use dropfour::environment::Environment;
    ///
    /// let position = Position::starting();
    /// assert_eq!(position.legal_actions().len(), 7);
    /// assert!(position.is_first_player());
    /// ```
    #[must_use]
    pub const fn starting() -> Self {
        Self {
            us: Bitboard::empty(),
            them: Bitboard::empty(),
            side_to_move: Player::First,
            status: WinningStatus::Ongoing,
        }
    }

    /// Clears the board and gives the move back to the first player.
    pub fn reset(&mut self) {
        *self = Self::starting();
    }

    /// Replays a sequence of columns from the starting position. Whitespace
    /// between the columns is ignored, so both `"3344"` and `"3 3 4 4"` are
    /// accepted.
    ///
    /// # Errors
    ///
    /// Fails if a column is not a digit within the board, if it is already full
    /// or if the game ends before the sequence does.
    pub fn from_moves(input: &str) -> anyhow::Result<Self> {
        let mut position = Self::starting();
        for (ply, symbol) in input.chars().filter(|c| !c.is_whitespace()).enumerate() {
            let column = Column::try_from(symbol).with_context(|| format!("ply {ply}"))?;
            if position.is_done() {
                bail!("ply {ply}: column {column} is played after the game has ended");
            }
            if !position.legal_columns().contains(&column) {
                bail!("ply {ply}: column {column} is full");
            }
            position.advance(column);
        }
        Ok(position)
    }

    /// Player whose turn it is.
    #[must_use]
    pub const fn side_to_move(&self) -> Player {
        self.side_to_move
    }

    /// Returns the owner of the stone at given cell, if any. Rows are counted
    /// from the bottom.
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> Option<Player> {
        if self.us.is_set(row, column) {
            Some(self.side_to_move)
        } else if self.them.is_set(row, column) {
            Some(!self.side_to_move)
        } else {
            None
        }
    }

    fn occupancy(&self) -> Bitboard {
        self.us | self.them
    }

    /// Number of stones on the board.
    #[must_use]
    pub fn stones(&self) -> u32 {
        self.occupancy().count_ones()
    }

    /// Columns that still have room for a stone.
    #[must_use]
    pub fn legal_columns(&self) -> Columns {
        let occupancy = self.occupancy();
        Column::iter()
            .filter(|column| !occupancy.is_set(HEIGHT - 1, column.get()))
            .collect()
    }

    /// Puts a stone on top of the column for the side to move and returns the
    /// row it landed on, or `None` if the column is full.
    fn drop_stone(&mut self, column: Column) -> Option<usize> {
        let occupancy = self.occupancy();
        let row = (0..HEIGHT).find(|&row| !occupancy.is_set(row, column.get()))?;
        self.us.set(row, column.get());
        Some(row)
    }
}

/// Moves one step from `(row, column)`, returns `None` when leaving the board.
fn step(row: usize, column: usize, (dy, dx): (isize, isize)) -> Option<(usize, usize)> {
    let row = row.checked_add_signed(dy).filter(|&row| row < HEIGHT)?;
    let column = column.checked_add_signed(dx).filter(|&column| column < WIDTH)?;
    Some((row, column))
}

/// Flood fill from the origin that only follows given pair of directions.
/// Returns `true` as soon as [`CONNECT`] cells have been reached.
fn fill_line(stones: Bitboard, origin: (usize, usize), directions: &[(isize, isize); 2]) -> bool {
    let mut visited = Bitboard::empty();
    let mut frontier = ArrayVec::<(usize, usize), CELLS>::new();
    frontier.push(origin);
    let mut count = 0;
    while let Some((row, column)) = frontier.pop() {
        count += 1;
        if count >= CONNECT {
            return true;
        }
        visited.set(row, column);
        for &direction in directions {
            if let Some((y, x)) = step(row, column, direction) {
                if stones.is_set(y, x) && !visited.is_set(y, x) {
                    frontier.push((y, x));
                }
            }
        }
    }
    false
}

/// Checks whether the stone that was just placed at `(row, column)` completes a
/// line of four.
///
/// The placed stone is always the topmost one in its column, so a vertical
/// line can only extend downwards from it.
fn connects_four(stones: Bitboard, row: usize, column: usize) -> bool {
    if LINES
        .iter()
        .any(|directions| fill_line(stones, (row, column), directions))
    {
        return true;
    }
    (0..CONNECT).all(|depth| row >= depth && stones.is_set(row - depth, column))
}

impl Environment for Position {
    type Action = Column;
    type Actions = Columns;

    const ACTION_SPACE: usize = WIDTH;

    fn legal_actions(&self) -> Columns {
        self.legal_columns()
    }

    /// Drops a stone into the column.
    ///
    /// Dropping into a full column places nothing and ends the game in a draw,
    /// the move is not passed to the other player in that case.
    fn advance(&mut self, column: Column) {
        let Some(row) = self.drop_stone(column) else {
            self.status = WinningStatus::Draw;
            return;
        };
        if connects_four(self.us, row, column.get()) {
            self.status = WinningStatus::Lose;
        }
        mem::swap(&mut self.us, &mut self.them);
        self.side_to_move = !self.side_to_move;
        if self.status == WinningStatus::Ongoing && self.legal_columns().is_empty() {
            self.status = WinningStatus::Draw;
        }
    }

    fn winning_status(&self) -> WinningStatus {
        self.status
    }

    fn is_first_player(&self) -> bool {
        self.side_to_move == Player::First
    }
}

impl TryFrom<&str> for Position {
    type Error = anyhow::Error;

    fn try_from(input: &str) -> anyhow::Result<Self> {
        Self::from_moves(input)
    }
}

impl fmt::Display for Position {
    /// Dumps the outcome (or the side to move) followed by the board from the
    /// top row to the bottom one.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            WinningStatus::Win => writeln!(f, "WIN: {}", self.side_to_move)?,
            WinningStatus::Lose => writeln!(f, "WIN: {}", !self.side_to_move)?,
            WinningStatus::Draw => writeln!(f, "DRAW")?,
            WinningStatus::Ongoing => writeln!(f, "turn: {}", self.side_to_move)?,
        }
        for row in (0..HEIGHT).rev() {
            for column in 0..WIDTH {
                match self.cell(row, column) {
                    Some(player) => write!(f, "{player}")?,
                    None => write!(f, ".")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn column(index: u8) -> Column {
        Column::try_from(index).unwrap()
    }

    fn play(moves: &[u8]) -> Position {
        let mut position = Position::starting();
        for &index in moves {
            assert!(!position.is_done(), "{position}");
            position.advance(column(index));
        }
        position
    }

    #[test]
    fn starting_position() {
        let position = Position::starting();
        assert_eq!(position.legal_actions().len(), WIDTH);
        assert_eq!(position.winning_status(), WinningStatus::Ongoing);
        assert!(!position.is_done());
        assert!(position.is_first_player());
        assert_eq!(position.stones(), 0);
    }

    #[test]
    fn stones_fall_down() {
        let position = play(&[3, 3, 3]);
        assert_eq!(position.cell(0, 3), Some(Player::First));
        assert_eq!(position.cell(1, 3), Some(Player::Second));
        assert_eq!(position.cell(2, 3), Some(Player::First));
        assert_eq!(position.cell(3, 3), None);
        assert_eq!(position.side_to_move(), Player::Second);
        assert!(!position.is_first_player());
    }

    #[test]
    fn vertical_win() {
        let position = play(&[0, 6, 0, 6, 0, 6, 0]);
        assert!(position.is_done());
        assert_eq!(position.winning_status(), WinningStatus::Lose);
        // The loser is the one to move.
        assert_eq!(position.side_to_move(), Player::Second);
    }

    #[test]
    fn interrupted_vertical_line() {
        let position = play(&[0, 0, 0, 6, 0, 6, 0]);
        assert!(!position.is_done());
    }

    #[test]
    fn horizontal_win() {
        let position = play(&[0, 0, 1, 1, 2, 2, 3]);
        assert_eq!(position.winning_status(), WinningStatus::Lose);
    }

    #[test]
    fn horizontal_win_in_the_middle() {
        // The last stone fills the gap between two and one stones.
        let position = play(&[0, 0, 1, 1, 3, 3, 2]);
        assert_eq!(position.winning_status(), WinningStatus::Lose);
    }

    #[test]
    fn rising_diagonal_win() {
        let position = play(&[0, 1, 1, 2, 2, 3, 2, 3, 3, 6, 3]);
        assert_eq!(position.winning_status(), WinningStatus::Lose);
        assert_eq!(position.side_to_move(), Player::Second);
    }

    #[test]
    fn falling_diagonal_win() {
        let position = play(&[6, 5, 5, 4, 4, 3, 4, 3, 3, 0, 3]);
        assert_eq!(position.winning_status(), WinningStatus::Lose);
    }

    #[test]
    fn three_in_a_row_is_not_a_win() {
        let position = play(&[0, 0, 1, 1, 2, 2]);
        assert!(!position.is_done());
        assert!(!connects_four(position.us, 0, 2));
    }

    #[test]
    fn draw_by_exhaustion() {
        let position = Position::from_moves("436014551150160155104632660465204242223333").unwrap();
        assert_eq!(position.winning_status(), WinningStatus::Draw);
        assert!(position.is_done());
        assert!(position.legal_actions().is_empty());
        assert_eq!(position.stones(), 42);
        assert!(position.is_first_player());
    }

    #[test]
    fn full_column_is_a_draw() {
        let mut position = play(&[0, 0, 0, 0, 0, 0]);
        assert!(!position.legal_actions().contains(&column(0)));
        let stones = position.stones();
        position.advance(column(0));
        assert_eq!(position.winning_status(), WinningStatus::Draw);
        assert_eq!(position.stones(), stones);
        // Nothing was played, so the turn stays the same.
        assert!(position.is_first_player());
    }

    #[test]
    fn legal_actions_shrink_when_column_fills() {
        let mut position = play(&[2, 2, 2, 2, 2]);
        assert_eq!(position.legal_actions().len(), WIDTH);
        position.advance(column(2));
        assert_eq!(
            position
                .legal_actions()
                .iter()
                .copied()
                .map(Column::get)
                .collect::<Vec<_>>(),
            vec![0, 1, 3, 4, 5, 6]
        );
    }

    #[test]
    fn clone_is_independent() {
        let original = play(&[3, 4]);
        let snapshot = original.to_string();
        let mut clone = original.clone();
        clone.advance(column(3));
        assert_eq!(original.to_string(), snapshot);
        assert_ne!(clone.to_string(), snapshot);
    }

    #[test]
    fn reset() {
        let mut position = play(&[0, 6, 0, 6, 0, 6, 0]);
        position.reset();
        assert_eq!(position, Position::starting());
    }

    #[test]
    fn display() {
        assert_eq!(
            play(&[3, 3, 4]).to_string(),
            "turn: o\n\
             .......\n\
             .......\n\
             .......\n\
             .......\n\
             ...o...\n\
             ...xx..\n"
        );
        assert_eq!(
            play(&[0, 6, 0, 6, 0, 6, 0]).to_string(),
            "WIN: x\n\
             .......\n\
             .......\n\
             x......\n\
             x.....o\n\
             x.....o\n\
             x.....o\n"
        );
        assert!(Position::from_moves("436014551150160155104632660465204242223333")
            .unwrap()
            .to_string()
            .starts_with("DRAW\n"));
    }

    #[test]
    fn win_is_never_produced_by_moves() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..200 {
            let mut position = Position::starting();
            while !position.is_done() {
                let actions = position.legal_actions();
                position.advance(actions[rng.gen_range(0..actions.len())]);
                assert_ne!(position.winning_status(), WinningStatus::Win);
            }
        }
    }

    #[test]
    fn parse_moves() {
        assert_eq!(Position::from_moves("").unwrap(), Position::starting());
        assert_eq!(
            Position::from_moves("3 3 4").unwrap(),
            Position::try_from("334").unwrap()
        );
        assert!(Position::from_moves("7").is_err());
        assert!(Position::from_moves("3x").is_err());
        assert!(Position::from_moves("0000000").is_err());
        // The first player has already won.
        assert!(Position::from_moves("06060601").is_err());
    }
}
