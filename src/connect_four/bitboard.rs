//! [`Bitboard`] is one player's half of the board: a set of cells packed into
//! a single [u64]. Connect Four only needs 42 bits, so the whole grid fits and
//! the occupancy of both players is a single OR away.
//!
//! Cells are laid out row-major starting from the bottom left corner: the
//! least significant bit is row 0 column 0, bit `WIDTH` is row 1 column 0.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use itertools::Itertools;

use crate::connect_four::{CELLS, HEIGHT, WIDTH};

/// Set of occupied cells.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct Bitboard {
    bits: u64,
}

impl Bitboard {
    const MASK: u64 = (1 << CELLS) - 1;

    /// Constructs a bitboard with no cells set.
    #[must_use]
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Constructs Bitboard from pre-calculated bits. Bits outside of the board
    /// are dropped.
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self {
            bits: bits & Self::MASK,
        }
    }

    /// Returns raw bits.
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.bits
    }

    #[must_use]
    const fn bit(row: usize, column: usize) -> u64 {
        debug_assert!(row < HEIGHT && column < WIDTH);
        1 << (row * WIDTH + column)
    }

    /// Returns true if the cell is in the set.
    #[must_use]
    pub const fn is_set(self, row: usize, column: usize) -> bool {
        self.bits & Self::bit(row, column) != 0
    }

    pub(super) fn set(&mut self, row: usize, column: usize) {
        self.bits |= Self::bit(row, column);
    }

    /// Number of cells in the set.
    #[must_use]
    pub const fn count_ones(self) -> u32 {
        self.bits.count_ones()
    }

    /// Returns true if no cells are set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            (0..HEIGHT)
                .rev()
                .map(|row| (0..WIDTH)
                    .map(|column| if self.is_set(row, column) { '1' } else { '.' })
                    .join(" "))
                .join("\n")
        )
    }
}

impl BitOr for Bitboard {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::from_bits(self.bits | rhs.bits)
    }
}

impl BitAnd for Bitboard {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::from_bits(self.bits & rhs.bits)
    }
}

impl Not for Bitboard {
    type Output = Self;

    /// Returns the complement within the board.
    fn not(self) -> Self::Output {
        Self::from_bits(!self.bits)
    }
}
