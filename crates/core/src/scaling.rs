//! Value scaling transforms
//!
//! Flow-accumulation maps span several orders of magnitude, so they are
//! compressed with `log(1 + v)` before image export. The filtering
//! variant additionally zeroes every cell below a percentile rank of the
//! transformed values, which isolates the major channels.

use crate::grid::{Grid, GridElement};
use std::cmp::Ordering;

/// Scaling transform selector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalingMode {
    /// `log(1 + v)` on positive cells; non-positive cells become zero.
    Log,
    /// As [`ScalingMode::Log`], but transformed values below the given
    /// percentile rank (clamped to `[0, 1]`) are zeroed as well.
    LogFilter { percentile: f64 },
}

impl<T: GridElement> Grid<T> {
    /// Apply a scaling transform to every cell in place.
    pub fn apply_scaling(&mut self, mode: ScalingMode) {
        match mode {
            ScalingMode::Log => self.apply_log(),
            ScalingMode::LogFilter { percentile } => self.apply_log_filter(percentile),
        }
    }

    fn apply_log(&mut self) {
        for y in 0..self.height() {
            for x in 0..self.width() {
                let value = self.get(x, y).to_f64();
                let scaled = if value > 0.0 { value.ln_1p() } else { 0.0 };
                self.set(x, y, T::from_f64(scaled));
            }
        }
    }

    fn apply_log_filter(&mut self, percentile: f64) {
        let percentile = percentile.clamp(0.0, 1.0);

        let mut transformed: Vec<f64> = self
            .values()
            .map(GridElement::to_f64)
            .filter(|&v| v > 0.0)
            .map(f64::ln_1p)
            .collect();
        if transformed.is_empty() {
            return;
        }

        // Rank lookup via linear-time selection rather than a full sort.
        let rank = ((percentile * transformed.len() as f64) as usize).min(transformed.len() - 1);
        transformed
            .select_nth_unstable_by(rank, |a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        let threshold = transformed[rank];

        for y in 0..self.height() {
            for x in 0..self.width() {
                let value = self.get(x, y).to_f64();
                let scaled = if value > 0.0 {
                    let log_value = value.ln_1p();
                    if log_value >= threshold {
                        log_value
                    } else {
                        0.0
                    }
                } else {
                    0.0
                };
                self.set(x, y, T::from_f64(scaled));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_scaling_transforms_positive_cells() {
        let mut grid: Grid<f64> = Grid::new(2, 1);
        grid.set(0, 0, 9.0);
        grid.set(1, 0, -4.0);

        grid.apply_scaling(ScalingMode::Log);
        assert!((grid.get(0, 0) - 10.0_f64.ln()).abs() < 1e-12);
        assert_eq!(grid.get(1, 0), 0.0);
    }

    #[test]
    fn log_filter_zeroes_below_threshold() {
        let mut grid: Grid<f64> = Grid::new(4, 1);
        for (x, v) in [1.0, 10.0, 100.0, 1000.0].into_iter().enumerate() {
            grid.set(x, 0, v);
        }

        grid.apply_scaling(ScalingMode::LogFilter { percentile: 0.5 });

        // The two smallest transformed values fall below the median rank.
        assert_eq!(grid.get(0, 0), 0.0);
        assert_eq!(grid.get(1, 0), 0.0);
        assert!((grid.get(2, 0) - 101.0_f64.ln()).abs() < 1e-12);
        assert!((grid.get(3, 0) - 1001.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn log_filter_clamps_percentile() {
        let mut grid: Grid<f64> = Grid::new(2, 1);
        grid.set(0, 0, 5.0);
        grid.set(1, 0, 50.0);

        // Out-of-range percentile clamps to 1.0, keeping only the maximum.
        grid.apply_scaling(ScalingMode::LogFilter { percentile: 2.0 });
        assert_eq!(grid.get(0, 0), 0.0);
        assert!(grid.get(1, 0) > 0.0);
    }

    #[test]
    fn log_filter_on_all_zero_grid_is_noop() {
        let mut grid: Grid<f64> = Grid::new(3, 3);
        grid.apply_scaling(ScalingMode::LogFilter { percentile: 0.5 });
        assert!(grid.values().all(|v| v == 0.0));
    }
}
