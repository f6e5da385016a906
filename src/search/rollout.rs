//! Random playouts used to estimate the value of a leaf.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::environment::{Environment, WinningStatus};

/// Value of a finished game for the player to move: 1 for a win, 0 for a loss
/// and 0.5 for a draw. Returns `None` while the game is in progress.
#[must_use]
pub const fn terminal_value(status: WinningStatus) -> Option<f64> {
    match status {
        WinningStatus::Win => Some(1.0),
        WinningStatus::Lose => Some(0.0),
        WinningStatus::Draw => Some(0.5),
        WinningStatus::Ongoing => None,
    }
}

/// Value of a finished game from the first player's point of view.
#[must_use]
pub fn first_player_score<E: Environment>(state: &E) -> Option<f64> {
    let value = terminal_value(state.winning_status())?;
    Some(if state.is_first_player() {
        value
    } else {
        1.0 - value
    })
}

/// Picks one of the legal actions uniformly at random.
pub fn random_action<E: Environment>(state: &E, rng: &mut impl Rng) -> Option<E::Action> {
    state.legal_actions().choose(rng).copied()
}

/// Plays random moves until the game ends and returns the outcome for the
/// player who was to move in the given state.
pub fn playout<E: Environment>(mut state: E, rng: &mut impl Rng) -> f64 {
    // The perspective changes with every move.
    let mut flipped = false;
    loop {
        if let Some(value) = terminal_value(state.winning_status()) {
            return if flipped { 1.0 - value } else { value };
        }
        let Some(action) = random_action(&state, rng) else {
            // No moves left in an unfinished game.
            return 0.5;
        };
        state.advance(action);
        flipped = !flipped;
    }
}
