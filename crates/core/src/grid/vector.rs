//! Vector-per-cell grid variant

use crate::grid::GridElement;
use ndarray::Array2;
use tracing::warn;

/// A grid storing a short vector of components per cell.
///
/// Shares the coordinate convention and lenient bounds behaviour of
/// [`Grid`](crate::Grid); only the text format is supported for I/O.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorGrid<T: GridElement> {
    data: Array2<Vec<T>>,
}

impl<T: GridElement> VectorGrid<T> {
    /// Create a grid of the given size with empty vectors in every cell.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: Array2::from_elem((height, width), Vec::new()),
        }
    }

    /// Create a grid from row-major cell data.
    pub fn from_vec(data: Vec<Vec<T>>, width: usize, height: usize) -> crate::Result<Self> {
        if data.len() != width * height {
            return Err(crate::Error::InvalidDimensions { width, height });
        }
        let data = Array2::from_shape_vec((height, width), data)
            .map_err(|_| crate::Error::InvalidDimensions { width, height })?;
        Ok(Self { data })
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// Whether the grid has no cells
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the components at `(x, y)`; empty for out-of-bounds reads.
    pub fn get(&self, x: usize, y: usize) -> &[T] {
        match self.data.get((y, x)) {
            Some(cell) => cell.as_slice(),
            None => {
                warn!(
                    x,
                    y,
                    width = self.width(),
                    height = self.height(),
                    "vector grid read out of bounds"
                );
                &[]
            }
        }
    }

    /// Set the components at `(x, y)`; out-of-bounds writes are dropped.
    pub fn set(&mut self, x: usize, y: usize, value: Vec<T>) {
        match self.data.get_mut((y, x)) {
            Some(cell) => *cell = value,
            None => {
                warn!(
                    x,
                    y,
                    width = self.width(),
                    height = self.height(),
                    "vector grid write out of bounds"
                );
            }
        }
    }
}

impl<T: GridElement> Default for VectorGrid<T> {
    fn default() -> Self {
        Self::new(0, 0)
    }
}
