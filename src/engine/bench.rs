//! Runs a fixed amount of search on a small set of positions to provide an
//! estimate of the engine's performance. The searches are seeded and limited
//! by the number of iterations, so the node count is the same on every run and
//! can be used to spot functional changes.

use std::io::Write;
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::connect_four::position::Position;
use crate::search::{search, Limiter, SearchConfig};

/// Positions (as move sequences) and the number of iterations to search each
/// of them for.
const POSITIONS: [(&str, u32); 4] = [
    ("", 20_000),
    ("3344", 20_000),
    ("060606", 10_000),
    ("3332224", 20_000),
];

/// Searches every benchmark position and prints total number of nodes and the
/// number of nodes searched per second.
///
/// # Errors
///
/// Fails if writing to the output fails.
pub fn bench(output: &mut impl Write) -> anyhow::Result<()> {
    let mut total_nodes = 0;
    let timer = Instant::now();
    let config = SearchConfig::default();
    let mut rng = SmallRng::seed_from_u64(0);

    for (moves, iterations) in POSITIONS {
        let position = Position::from_moves(moves)?;
        let tree = search(&position, &config, &Limiter::iterations(iterations), &mut rng);
        total_nodes += tree.len();
    }

    let elapsed = timer.elapsed();

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let nps = (total_nodes as f64 / elapsed.as_secs_f64()) as u64;
    writeln!(output, "{total_nodes} nodes {nps} nps")?;
    Ok(())
}
