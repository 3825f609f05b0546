//! Dense 2-D grid type

use crate::grid::GridElement;
use ndarray::Array2;
use tracing::warn;

/// A dense rectangular grid of numeric cells.
///
/// Coordinates are `(x, y)` with `x` in `[0, width)` and `y` in
/// `[0, height)`; the cell at `(x, y)` is stored at row `y`, column `x`.
/// Access outside the grid is non-fatal: reads return the element's zero
/// value, writes are dropped, and a diagnostic is emitted either way.
///
/// # Example
///
/// ```
/// use demflow_core::Grid;
///
/// let mut grid: Grid<f64> = Grid::new(10, 5);
/// grid.set(3, 2, 42.0);
/// assert_eq!(grid.get(3, 2), 42.0);
/// assert_eq!(grid.get(99, 99), 0.0); // out of bounds reads the default
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T: GridElement> {
    /// Cell data in row-major order (row `y`, column `x`)
    data: Array2<T>,
}

impl<T: GridElement> Grid<T> {
    /// Create a grid of the given size filled with the element's zero value.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: Array2::zeros((height, width)),
        }
    }

    /// Create a grid filled with a specific value.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            data: Array2::from_elem((height, width), value),
        }
    }

    /// Create a grid from row-major cell data.
    pub fn from_vec(data: Vec<T>, width: usize, height: usize) -> crate::Result<Self> {
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

    /// Get the value at `(x, y)`.
    ///
    /// Out-of-bounds reads emit a diagnostic and return `T::zero()`.
    pub fn get(&self, x: usize, y: usize) -> T {
        match self.data.get((y, x)) {
            Some(&value) => value,
            None => {
                warn!(
                    x,
                    y,
                    width = self.width(),
                    height = self.height(),
                    "grid read out of bounds"
                );
                T::zero()
            }
        }
    }

    /// Set the value at `(x, y)`.
    ///
    /// Out-of-bounds writes emit a diagnostic and are dropped.
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        match self.data.get_mut((y, x)) {
            Some(cell) => *cell = value,
            None => {
                warn!(
                    x,
                    y,
                    width = self.width(),
                    height = self.height(),
                    "grid write out of bounds"
                );
            }
        }
    }

    /// Iterate over all cell values in row-major order.
    pub fn values(&self) -> impl Iterator<Item = T> + '_ {
        self.data.iter().copied()
    }
}

impl<T: GridElement> Default for Grid<T> {
    /// An empty grid, invalid for analysis until loaded or resized.
    fn default() -> Self {
        Self::new(0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_creation() {
        let grid: Grid<f64> = Grid::new(20, 10);
        assert_eq!(grid.width(), 20);
        assert_eq!(grid.height(), 10);
        assert!(!grid.is_empty());
    }

    #[test]
    fn default_grid_is_empty() {
        let grid: Grid<i32> = Grid::default();
        assert_eq!(grid.width(), 0);
        assert_eq!(grid.height(), 0);
        assert!(grid.is_empty());
    }

    #[test]
    fn get_and_set() {
        let mut grid: Grid<f64> = Grid::new(4, 3);
        grid.set(2, 1, 7.5);
        assert_eq!(grid.get(2, 1), 7.5);
        assert_eq!(grid.get(0, 0), 0.0);
    }

    #[test]
    fn out_of_bounds_is_lenient() {
        let mut grid: Grid<i32> = Grid::new(2, 2);
        grid.set(5, 5, 9); // dropped
        assert_eq!(grid.get(5, 5), 0);
        assert_eq!(grid.get(0, 0), 0);
    }

    #[test]
    fn from_vec_rejects_bad_length() {
        assert!(Grid::<i32>::from_vec(vec![1, 2, 3], 2, 2).is_err());
    }

    #[test]
    fn from_vec_row_major() {
        let grid = Grid::from_vec(vec![1, 2, 3, 4, 5, 6], 3, 2).unwrap();
        assert_eq!(grid.get(0, 0), 1);
        assert_eq!(grid.get(2, 0), 3);
        assert_eq!(grid.get(0, 1), 4);
        assert_eq!(grid.get(2, 1), 6);
    }
}
