//! # Demflow Colormap
//!
//! Colour mapping and BMP synthesis for demflow grids.
//!
//! Palettes are loaded from `<data-root>/colourmaps/<shortcode>.txt`,
//! one `B G R` triple per line. A grid is rendered by min/max
//! normalising its values and mapping each one through the palette,
//! either with piecewise-linear interpolation or by discrete bucket,
//! then written out as a 24-bit uncompressed BMP.

mod bmp;
mod palette;
mod render;

pub use bmp::BmpImage;
pub use palette::{ColourScheme, Palette, Rgb};
pub use render::export_grid;
