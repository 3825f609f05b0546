//! Sobel gradient and aspect derivation
//!
//! Convolves the elevation grid with the fixed 3×3 Sobel kernels:
//!
//! ```text
//! Sx = [-1 0 1]      Sy = [-1 -2 -1]
//!      [-2 0 2]           [ 0  0  0]
//!      [-1 0 1]           [ 1  2  1]
//! ```
//!
//! Samples outside the grid are reflected about the first and last valid
//! row or column, without repeating the edge sample itself.

use demflow_core::{Error, Grid, Result};
use std::str::FromStr;

const SOBEL_X: [[f64; 3]; 3] = [
    [-1.0, 0.0, 1.0],
    [-2.0, 0.0, 2.0],
    [-1.0, 0.0, 1.0],
];

const SOBEL_Y: [[f64; 3]; 3] = [
    [-1.0, -2.0, -1.0],
    [0.0, 0.0, 0.0],
    [1.0, 2.0, 1.0],
];

/// Gradient magnitude below which a cell counts as flat.
const FLAT_THRESHOLD: f64 = 0.01;

/// Aspect value marking a flat cell.
pub const FLAT_ASPECT: f64 = -1.0;

/// Which part of the Sobel response to report as slope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlopeComponent {
    /// Magnitude of the horizontal response
    Gx,
    /// Magnitude of the vertical response
    Gy,
    /// Euclidean magnitude of both responses
    Combined,
}

impl FromStr for SlopeComponent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gx" => Ok(SlopeComponent::Gx),
            "gy" => Ok(SlopeComponent::Gy),
            "combined" => Ok(SlopeComponent::Combined),
            other => Err(Error::UnknownOption {
                kind: "slope component",
                value: other.to_string(),
            }),
        }
    }
}

/// Compute a slope (gradient magnitude) map from the elevation grid.
pub fn slope(dem: &Grid<f64>, component: SlopeComponent) -> Result<Grid<f64>> {
    if dem.is_empty() {
        return Err(Error::EmptyGrid);
    }

    let mut output = Grid::new(dem.width(), dem.height());
    for y in 0..dem.height() {
        for x in 0..dem.width() {
            let (gx, gy) = kernel_response(dem, x, y);
            let value = match component {
                SlopeComponent::Gx => gx.abs(),
                SlopeComponent::Gy => gy.abs(),
                SlopeComponent::Combined => (gx * gx + gy * gy).sqrt(),
            };
            output.set(x, y, value);
        }
    }
    Ok(output)
}

/// Compute an aspect (azimuth) map from the elevation grid.
///
/// Cells whose gradient magnitude falls below the flat threshold are
/// tagged with [`FLAT_ASPECT`]; everything else is the gradient angle in
/// degrees, normalised into `[0°, 360°)`.
pub fn aspect(dem: &Grid<f64>) -> Result<Grid<f64>> {
    if dem.is_empty() {
        return Err(Error::EmptyGrid);
    }

    let mut output = Grid::new(dem.width(), dem.height());
    for y in 0..dem.height() {
        for x in 0..dem.width() {
            let (gx, gy) = kernel_response(dem, x, y);
            let magnitude = (gx * gx + gy * gy).sqrt();
            if magnitude < FLAT_THRESHOLD {
                output.set(x, y, FLAT_ASPECT);
                continue;
            }

            let mut degrees = gy.atan2(gx).to_degrees();
            if degrees < 0.0 {
                degrees += 360.0;
            }
            output.set(x, y, degrees % 360.0);
        }
    }
    Ok(output)
}

/// Accumulate both Sobel responses over the 3×3 window around `(x, y)`.
fn kernel_response(dem: &Grid<f64>, x: usize, y: usize) -> (f64, f64) {
    let width = dem.width() as isize;
    let height = dem.height() as isize;
    let mut gx = 0.0;
    let mut gy = 0.0;

    for dy in -1..=1_isize {
        for dx in -1..=1_isize {
            let mut nx = x as isize + dx;
            let mut ny = y as isize + dy;

            // Mirror about the last valid index, without repeating it.
            if nx < 0 {
                nx = -nx;
            }
            if ny < 0 {
                ny = -ny;
            }
            if nx >= width {
                nx = 2 * width - nx - 2;
            }
            if ny >= height {
                ny = 2 * height - ny - 2;
            }

            let value = dem.get(nx as usize, ny as usize);
            gx += SOBEL_X[(dy + 1) as usize][(dx + 1) as usize] * value;
            gy += SOBEL_Y[(dy + 1) as usize][(dx + 1) as usize] * value;
        }
    }

    (gx, gy)
}
