//! Implements [Monte Carlo Tree Search] (MCTS) over any [`Environment`].
//!
//! Each iteration of the search goes through four steps:
//!
//! 1. Selection: starting at the root, descend into the most promising child
//!    according to UCB1 until a leaf or a finished game is reached.
//! 2. Simulation: play random moves from the leaf until the game ends.
//! 3. Backpropagation: add the outcome to every node on the path, flipping it
//!    at each level because the players alternate.
//! 4. Expansion: once a leaf has been visited often enough, create its
//!    children.
//!
//! The search runs until the [`Limiter`] says stop. It is only consulted
//! between iterations: an iteration that has already started always finishes.
//!
//! [Monte Carlo Tree Search]: https://en.wikipedia.org/wiki/Monte_Carlo_tree_search

use std::time::{Duration, Instant};

use rand::Rng;
use tracing::debug;

use crate::environment::Environment;

mod rollout;
mod tree;

pub use rollout::{first_player_score, playout, random_action, terminal_value};
pub use tree::Tree;

/// Parameters of the search algorithm.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchConfig {
    /// Exploration constant $C$ of UCB1.
    pub exploration: f64,
    /// Number of rollouts a leaf accumulates before its children are created.
    pub expansion_threshold: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            exploration: 1.0,
            expansion_threshold: 10,
        }
    }
}

/// Decides when the search should stop: after the time threshold has elapsed
/// since construction and/or after a fixed number of iterations.
#[derive(Clone, Debug)]
pub struct Limiter {
    timer: Instant,
    time: Option<Duration>,
    iterations: Option<u32>,
}

impl Limiter {
    /// Starts the clock: the search stops once `millis` milliseconds have
    /// passed.
    #[must_use]
    pub fn movetime(millis: u64) -> Self {
        Self {
            timer: Instant::now(),
            time: Some(Duration::from_millis(millis)),
            iterations: None,
        }
    }

    /// Limits the search to a fixed number of iterations regardless of the
    /// time spent. Useful for reproducible searches.
    #[must_use]
    pub fn iterations(iterations: u32) -> Self {
        Self {
            timer: Instant::now(),
            time: None,
            iterations: Some(iterations),
        }
    }

    /// Additionally caps the number of iterations.
    #[must_use]
    pub const fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = Some(iterations);
        self
    }

    /// Returns `true` if the time threshold has elapsed since the limiter was
    /// created.
    #[must_use]
    pub fn is_time_over(&self) -> bool {
        self.time.is_some_and(|time| self.timer.elapsed() >= time)
    }

    /// Time passed since the limiter was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.timer.elapsed()
    }

    fn should_stop(&self, iterations: u32) -> bool {
        self.is_time_over() || self.iterations.is_some_and(|limit| iterations >= limit)
    }
}

/// Builds the search tree for `state`: expands the root and then runs
/// iterations until the limiter stops the search.
///
/// The state is copied into the root and never mutated there.
pub fn search<E: Environment>(
    state: &E,
    config: &SearchConfig,
    limiter: &Limiter,
    rng: &mut impl Rng,
) -> Tree<E> {
    let mut tree = Tree::new(state.clone(), config.clone());
    tree.expand_root();

    let mut iterations = 0;
    while !limiter.should_stop(iterations) {
        let _ = tree.evaluate(rng);
        iterations += 1;
    }

    debug!(
        iterations,
        nodes = tree.len(),
        elapsed_ms = limiter.elapsed().as_millis(),
        "search finished"
    );

    tree
}

/// Searches the state and returns the most visited action, or `None` if there
/// are no legal actions.
pub fn mcts_action<E: Environment>(
    state: &E,
    config: &SearchConfig,
    limiter: &Limiter,
    rng: &mut impl Rng,
) -> Option<E::Action> {
    search(state, config, limiter, rng).best_action()
}

/// Searches the state and returns the estimated probability of winning for
/// each action, indexed by [`crate::environment::Action::index`]. Actions that
/// are illegal (or were never visited) have no estimate.
pub fn mcts_scores<E: Environment>(
    state: &E,
    config: &SearchConfig,
    limiter: &Limiter,
    rng: &mut impl Rng,
) -> Vec<Option<f64>> {
    search(state, config, limiter, rng).scores()
}
