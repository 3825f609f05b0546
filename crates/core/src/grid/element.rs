//! Element trait for grid cell values

use bytemuck::Pod;
use num_traits::{NumCast, Zero};
use std::fmt::{Debug, Display};
use std::str::FromStr;

/// Trait for types that can be stored in a grid cell.
///
/// Covers what the analysis and I/O layers need from a cell type:
/// ordering for min/max scans, casts through `f64` for scaling and image
/// normalisation, `FromStr`/`Display` for the text formats and [`Pod`]
/// for the raw binary format.
pub trait GridElement:
    Copy + Debug + Display + FromStr + PartialOrd + NumCast + Zero + Pod + Send + Sync + 'static
{
    /// Convert to `f64`, the working type of the analysis pipeline.
    fn to_f64(self) -> f64 {
        NumCast::from(self).unwrap_or(0.0)
    }

    /// Convert back from `f64`, falling back to zero when the cast fails
    /// (for example a NaN cast into an integer type).
    fn from_f64(value: f64) -> Self {
        NumCast::from(value).unwrap_or_else(Self::zero)
    }
}

impl GridElement for i32 {}
impl GridElement for i64 {}
impl GridElement for f32 {}
impl GridElement for f64 {}
