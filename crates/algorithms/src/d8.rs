//! D8 flow direction
//!
//! Each cell drains to the lowest of its eight neighbours. Neighbours are
//! scanned in code order and a candidate that ties the current best
//! replaces it with probability one half, so plateaus do not always drain
//! the same way. The caller supplies the random generator; runs with the
//! same seed produce the same map.

use crate::direction::{NEIGHBOUR_OFFSETS, NO_DIRECTION};
use demflow_core::{Error, Grid, Result};
use rand::Rng;

/// Compute the D8 flow-direction map for an elevation grid.
///
/// Every output cell holds a direction code in `0..8`, or `-1` when the
/// search finds no neighbour to drain to.
pub fn flow_direction<R: Rng>(dem: &Grid<f64>, rng: &mut R) -> Result<Grid<i32>> {
    if dem.is_empty() {
        return Err(Error::EmptyGrid);
    }

    let mut directions = Grid::new(dem.width(), dem.height());
    for y in 0..dem.height() {
        for x in 0..dem.width() {
            directions.set(x, y, steepest_neighbour(dem, x, y, rng));
        }
    }
    Ok(directions)
}

fn steepest_neighbour<R: Rng>(dem: &Grid<f64>, x: usize, y: usize, rng: &mut R) -> i32 {
    let width = dem.width() as isize;
    let height = dem.height() as isize;

    let mut lowest = dem.get(x, y);
    let mut best = NO_DIRECTION;

    for (code, &(dx, dy)) in NEIGHBOUR_OFFSETS.iter().enumerate() {
        let nx = x as isize + dx;
        let ny = y as isize + dy;
        if nx < 0 || ny < 0 || nx >= width || ny >= height {
            continue;
        }

        let neighbour = dem.get(nx as usize, ny as usize);
        if neighbour < lowest {
            lowest = neighbour;
            best = code as i32;
        } else if neighbour == lowest && rng.gen_bool(0.5) {
            best = code as i32;
        }
    }

    best
}
