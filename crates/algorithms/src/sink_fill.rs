//! Depression filling by iterative relaxation
//!
//! A sink is an interior cell with no strictly lower neighbour. Each pass
//! raises every sink to one unit above its lowest positive neighbour and
//! the passes repeat until a full sweep changes nothing. Values only ever
//! rise, so the loop terminates, but a neighbourhood of zero or negative
//! elevations can survive as a flat lake.

use crate::direction::NEIGHBOUR_OFFSETS;
use demflow_core::Grid;
use tracing::debug;

/// Fill interior depressions so flow can exit the grid.
///
/// Applying the fill twice yields the same grid as applying it once.
pub fn fill_sinks(dem: &Grid<f64>) -> Grid<f64> {
    let mut filled = dem.clone();
    let (width, height) = (dem.width(), dem.height());
    if width < 3 || height < 3 {
        return filled;
    }

    let mut passes = 0usize;
    let mut modified = true;
    while modified {
        modified = false;
        passes += 1;

        for y in 1..height - 1 {
            for x in 1..width - 1 {
                if !is_sink(&filled, x, y) {
                    continue;
                }

                let mut lowest_positive = f64::INFINITY;
                let mut found = false;
                for &(dx, dy) in &NEIGHBOUR_OFFSETS {
                    let nx = (x as isize + dx) as usize;
                    let ny = (y as isize + dy) as usize;
                    let neighbour = filled.get(nx, ny);
                    if neighbour > 0.0 {
                        lowest_positive = lowest_positive.min(neighbour);
                        found = true;
                    }
                }

                if found && filled.get(x, y) < lowest_positive {
                    filled.set(x, y, lowest_positive + 1.0);
                    modified = true;
                }
            }
        }
    }
    debug!(passes, "sink filling converged");

    filled
}

/// An interior cell is a sink when no neighbour lies strictly below it.
fn is_sink(dem: &Grid<f64>, x: usize, y: usize) -> bool {
    let current = dem.get(x, y);
    for &(dx, dy) in &NEIGHBOUR_OFFSETS {
        let nx = (x as isize + dx) as usize;
        let ny = (y as isize + dy) as usize;
        if dem.get(nx, ny) < current {
            return false;
        }
    }
    true
}
