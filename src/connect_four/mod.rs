//! Implementation of the Connect Four rules: the board, moves and the
//! detection of four stones in a row.

pub mod bitboard;
pub mod position;

use std::fmt;

use anyhow::{bail, Context};

use crate::environment::Action;

/// Number of rows on the board.
pub const HEIGHT: usize = 6;
/// Number of columns on the board.
pub const WIDTH: usize = 7;
/// Total number of cells, also the maximum number of plies in a game.
pub const CELLS: usize = HEIGHT * WIDTH;

/// A move in Connect Four: the column the stone is dropped into. Columns are
/// numbered from left to right starting at 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Column(u8);

impl Column {
    /// Iterates over all columns from left to right.
    pub fn iter() -> impl Iterator<Item = Self> {
        (0..WIDTH as u8).map(Self)
    }

    /// Returns the column number.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0 as usize
    }
}

impl Action for Column {
    fn index(self) -> usize {
        self.get()
    }
}

impl TryFrom<u8> for Column {
    type Error = anyhow::Error;

    fn try_from(column: u8) -> anyhow::Result<Self> {
        if usize::from(column) >= WIDTH {
            bail!("column should be within [0; {WIDTH}), got {column}");
        }
        Ok(Self(column))
    }
}

impl TryFrom<char> for Column {
    type Error = anyhow::Error;

    fn try_from(column: char) -> anyhow::Result<Self> {
        match column.to_digit(10) {
            #[allow(clippy::cast_possible_truncation)]
            Some(digit) => Self::try_from(digit as u8),
            None => bail!("column should be a digit, got '{column}'"),
        }
    }
}

impl TryFrom<&str> for Column {
    type Error = anyhow::Error;

    fn try_from(input: &str) -> anyhow::Result<Self> {
        let column: u8 = input
            .trim()
            .parse()
            .with_context(|| format!("parsing column '{input}'"))?;
        Self::try_from(column)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
