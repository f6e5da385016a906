//! Interface for two-player, perfect-information, zero-sum games that the
//! [`crate::search`] can look ahead in. The search never needs to know the
//! rules of a particular game: everything it relies on is exposed by the
//! [`Environment`] trait.

use std::fmt;
use std::ops::{Deref, Not};

use anyhow::bail;

/// Players alternate moves, the first player makes the very first move of the
/// game.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Player {
    First,
    Second,
}

impl Not for Player {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }
}

impl TryFrom<char> for Player {
    type Error = anyhow::Error;

    fn try_from(stone: char) -> anyhow::Result<Self> {
        match stone {
            'x' => Ok(Self::First),
            'o' => Ok(Self::Second),
            _ => bail!("stone should be 'x' or 'o', got '{stone}'"),
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match &self {
                Self::First => 'x',
                Self::Second => 'o',
            }
        )
    }
}

/// Outcome of the game, always relative to the player who moves next.
///
/// Applying a move never produces [`WinningStatus::Win`]: a move that completes
/// a line leaves the *next* player in a lost position, hence
/// [`WinningStatus::Lose`]. `Win` exists as the mirror of `Lose` for
/// interpreting terminal values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WinningStatus {
    /// The game is still in progress.
    #[default]
    Ongoing,
    /// The player to move has won.
    Win,
    /// The player to move has lost.
    Lose,
    /// Nobody won.
    Draw,
}

/// Moves are identified by their index in a fixed-size action space, e.g. a
/// column for Connect Four. This allows reporting per-action statistics in a
/// layout that does not depend on which actions are currently legal.
pub trait Action: Copy + Eq + fmt::Debug {
    /// Position of the action in `0..Environment::ACTION_SPACE`.
    fn index(self) -> usize;
}

/// State of a game that can be searched.
///
/// The state is perspective-relative: after each move the player to move
/// changes and [`Environment::winning_status`] is reinterpreted from the
/// viewpoint of the new player to move.
pub trait Environment: Clone + fmt::Display {
    /// A single move.
    type Action: Action;
    /// Ordered collection of legal actions.
    type Actions: Deref<Target = [Self::Action]>;

    /// Total number of distinct actions, legal or not.
    const ACTION_SPACE: usize;

    /// Returns currently playable actions. The order is deterministic for a
    /// given state.
    fn legal_actions(&self) -> Self::Actions;

    /// Applies the action in-place and passes the turn to the other player.
    fn advance(&mut self, action: Self::Action);

    /// Current outcome relative to the player to move.
    fn winning_status(&self) -> WinningStatus;

    /// Returns `true` if the first player holds the move.
    fn is_first_player(&self) -> bool;

    /// Returns `true` once the game has finished.
    fn is_done(&self) -> bool {
        self.winning_status() != WinningStatus::Ongoing
    }
}
