use std::collections::VecDeque;

use log::debug;
use rand::{seq::SliceRandom, Rng};

use crate::grid::{overlaps, Grid, Position};

/// Random draws before falling back to scanning the board for free cells.
const MAX_SAMPLES: usize = 64;

/// Picks a uniformly random in-bounds cell that no segment of `body` occupies.
///
/// Returns `None` when every cell is taken.
pub fn place_consumable<R: Rng>(
    grid: Grid,
    body: &VecDeque<Position>,
    rng: &mut R,
) -> Option<Position> {
    if grid.cell_count() == 0 {
        return None;
    }

    for _ in 0..MAX_SAMPLES {
        let pos = Position::new(
            rng.gen_range(0..grid.width) as i32,
            rng.gen_range(0..grid.height) as i32,
        );

        if !overlaps(pos, body) {
            return Some(pos);
        }
    }

    // Crowded board, pick among what is left.
    let free: Vec<Position> = grid.cells().filter(|pos| !overlaps(*pos, body)).collect();
    debug!("Sampling gave up, {} free cells left", free.len());

    free.choose(rng).copied()
}
