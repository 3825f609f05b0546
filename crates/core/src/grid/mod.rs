//! Grid containers

mod dense;
mod element;
mod vector;

pub use dense::Grid;
pub use element::GridElement;
pub use vector::VectorGrid;
