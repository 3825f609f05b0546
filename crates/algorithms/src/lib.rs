//! # Demflow Algorithms
//!
//! Flow-structure analysis over a Digital Elevation Model:
//!
//! - **Sink filling**: iterative relaxation that raises interior
//!   depressions so flow can exit
//! - **Sobel analysis**: gradient magnitude and aspect maps from 3×3
//!   convolution with mirrored edges
//! - **D8 flow direction**: steepest-descent single-neighbour codes
//! - **Flow accumulation**: upslope contributing area under the D8, D∞
//!   and MDF models
//! - **Watershed analysis**: top-K pour-point selection and upstream
//!   catchment tracing
//!
//! The engine is single-threaded and fully synchronous; every call runs
//! to completion on the caller's thread.

pub mod accumulation;
pub mod d8;
pub mod direction;
pub mod sink_fill;
pub mod sobel;
pub mod watershed;

pub use accumulation::{FlowAccumulator, FlowMethod};
pub use d8::flow_direction;
pub use direction::{bracketing_neighbours, NEIGHBOUR_OFFSETS, NO_DIRECTION};
pub use sink_fill::fill_sinks;
pub use sobel::{aspect, slope, SlopeComponent, FLAT_ASPECT};
pub use watershed::{PourPointMethod, WatershedAnalyser};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::accumulation::{FlowAccumulator, FlowMethod};
    pub use crate::d8::flow_direction;
    pub use crate::sink_fill::fill_sinks;
    pub use crate::sobel::{aspect, slope, SlopeComponent};
    pub use crate::watershed::{PourPointMethod, WatershedAnalyser};
    pub use demflow_core::prelude::*;
}
