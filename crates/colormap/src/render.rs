//! Grid-to-image rendering

use crate::bmp::BmpImage;
use crate::palette::{ColourScheme, Palette};
use demflow_core::{Error, Grid, GridElement, Result};
use std::path::Path;

/// Render a grid to a 24-bit BMP at `path`.
///
/// Values are min/max normalised into `[0, 1]` and mapped through the
/// palette; continuous schemes interpolate between palette entries,
/// discrete schemes pick a bucket. A constant grid renders entirely in
/// the palette's first colour.
pub fn export_grid<T, P>(
    grid: &Grid<T>,
    path: P,
    palette: &Palette,
    scheme: ColourScheme,
) -> Result<()>
where
    T: GridElement,
    P: AsRef<Path>,
{
    if grid.is_empty() {
        return Err(Error::EmptyGrid);
    }

    let (min, max) = value_range(grid);
    let range = if max > min { max - min } else { 1.0 };

    let mut image = BmpImage::new(grid.width(), grid.height());
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let t = (grid.get(x, y).to_f64() - min) / range;
            let colour = if scheme.is_discrete() {
                palette.discrete(t)
            } else {
                palette.continuous(t)
            };
            image.set_pixel(x, y, colour);
        }
    }

    image.write(path)
}

fn value_range<T: GridElement>(grid: &Grid<T>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for value in grid.values() {
        let value = value.to_f64();
        if value < min {
            min = value;
        }
        if value > max {
            max = value;
        }
    }
    (min, max)
}
