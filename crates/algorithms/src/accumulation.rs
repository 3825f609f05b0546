//! Flow accumulation under the D8, D∞ and MDF models
//!
//! Cells are visited in descending elevation order so every contributor
//! is processed before anything downstream of it. Each cell adds its own
//! unit of water at visit time and then forwards its running total:
//!
//! - **D8** sends the whole total along the cell's direction code
//! - **D∞** splits it between the two neighbours bracketing the cell's
//!   aspect, re-normalised after discarding blocked destinations
//! - **MDF** spreads it across every downhill neighbour in proportion to
//!   the gradient at the destination

use crate::direction::{bracketing_neighbours, NEIGHBOUR_OFFSETS};
use demflow_core::{Error, Grid, Result};
use std::cmp::Ordering;
use std::str::FromStr;

/// Flow model selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowMethod {
    D8,
    Dinf,
    Mdf,
}

impl FromStr for FlowMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "d8" => Ok(FlowMethod::D8),
            "dinf" => Ok(FlowMethod::Dinf),
            "mdf" => Ok(FlowMethod::Mdf),
            other => Err(Error::UnknownOption {
                kind: "flow method",
                value: other.to_string(),
            }),
        }
    }
}

/// Accumulates upslope contributing area over an elevation grid.
///
/// The collaborator maps each model needs are attached with the `with_*`
/// builders; [`accumulate`](FlowAccumulator::accumulate) reports a
/// missing one as [`Error::MissingInput`].
pub struct FlowAccumulator<'a> {
    elevation: &'a Grid<f64>,
    d8: Option<&'a Grid<i32>>,
    aspect: Option<&'a Grid<f64>>,
    gradient: Option<&'a Grid<f64>>,
}

impl<'a> FlowAccumulator<'a> {
    pub fn new(elevation: &'a Grid<f64>) -> Self {
        Self {
            elevation,
            d8: None,
            aspect: None,
            gradient: None,
        }
    }

    /// Attach a D8 direction map (required by [`FlowMethod::D8`]).
    pub fn with_d8(mut self, map: &'a Grid<i32>) -> Self {
        self.d8 = Some(map);
        self
    }

    /// Attach an aspect map (required by [`FlowMethod::Dinf`]).
    pub fn with_aspect(mut self, map: &'a Grid<f64>) -> Self {
        self.aspect = Some(map);
        self
    }

    /// Attach a gradient map (required by [`FlowMethod::Dinf`] and
    /// [`FlowMethod::Mdf`]).
    pub fn with_gradient(mut self, map: &'a Grid<f64>) -> Self {
        self.gradient = Some(map);
        self
    }

    /// Accumulate flow under the chosen model.
    pub fn accumulate(&self, method: FlowMethod) -> Result<Grid<f64>> {
        if self.elevation.is_empty() {
            return Err(Error::EmptyGrid);
        }

        match method {
            FlowMethod::D8 => {
                let d8 = self.d8.ok_or(Error::MissingInput("d8 direction map"))?;
                Ok(self.accumulate_d8(d8))
            }
            FlowMethod::Dinf => {
                let aspect = self.aspect.ok_or(Error::MissingInput("aspect map"))?;
                if self.gradient.is_none() {
                    return Err(Error::MissingInput("gradient map"));
                }
                Ok(self.accumulate_dinf(aspect))
            }
            FlowMethod::Mdf => {
                let gradient = self.gradient.ok_or(Error::MissingInput("gradient map"))?;
                Ok(self.accumulate_mdf(gradient))
            }
        }
    }

    /// Enumerate all cells sorted by elevation, highest first. The order
    /// among equal elevations is unspecified.
    fn cells_by_descending_elevation(&self) -> Vec<(f64, usize, usize)> {
        let mut cells = Vec::with_capacity(self.elevation.width() * self.elevation.height());
        for y in 0..self.elevation.height() {
            for x in 0..self.elevation.width() {
                cells.push((self.elevation.get(x, y), x, y));
            }
        }
        cells.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        cells
    }

    fn in_bounds(&self, x: isize, y: isize) -> bool {
        x >= 0
            && y >= 0
            && x < self.elevation.width() as isize
            && y < self.elevation.height() as isize
    }

    fn accumulate_d8(&self, directions: &Grid<i32>) -> Grid<f64> {
        let mut flow = Grid::new(self.elevation.width(), self.elevation.height());

        for &(_, x, y) in &self.cells_by_descending_elevation() {
            flow.set(x, y, flow.get(x, y) + 1.0);

            let code = directions.get(x, y);
            if !(0..8).contains(&code) {
                continue;
            }
            let (dx, dy) = NEIGHBOUR_OFFSETS[code as usize];
            let nx = x as isize + dx;
            let ny = y as isize + dy;
            if !self.in_bounds(nx, ny) {
                continue;
            }

            let (nx, ny) = (nx as usize, ny as usize);
            flow.set(nx, ny, flow.get(nx, ny) + flow.get(x, y));
        }

        flow
    }

    fn accumulate_dinf(&self, aspect: &Grid<f64>) -> Grid<f64> {
        // Outflow lands on a scratch grid rather than any caller map, so
        // the split never observes a partially updated destination.
        let mut flow = Grid::new(self.elevation.width(), self.elevation.height());

        for &(elevation, x, y) in &self.cells_by_descending_elevation() {
            flow.set(x, y, flow.get(x, y) + 1.0);

            let theta = aspect.get(x, y);
            if theta.is_nan() || theta < 0.0 {
                continue;
            }

            let (dir1, dir2, mut w1, mut w2) = bracketing_neighbours(theta);
            let (nx1, ny1) = (x as isize + dir1.0, y as isize + dir1.1);
            let (nx2, ny2) = (x as isize + dir2.0, y as isize + dir2.1);

            // A destination only counts when it is inside the grid and
            // strictly downhill from here.
            if !self.receives_flow(nx1, ny1, elevation) {
                w1 = 0.0;
            }
            if !self.receives_flow(nx2, ny2, elevation) {
                w2 = 0.0;
            }

            let total = w1 + w2;
            if total <= 0.0 {
                continue;
            }
            w1 /= total;
            w2 /= total;

            let outflow = flow.get(x, y);
            if w1 > 0.0 {
                let (nx, ny) = (nx1 as usize, ny1 as usize);
                flow.set(nx, ny, flow.get(nx, ny) + outflow * w1);
            }
            if w2 > 0.0 {
                let (nx, ny) = (nx2 as usize, ny2 as usize);
                flow.set(nx, ny, flow.get(nx, ny) + outflow * w2);
            }
        }

        flow
    }

    fn receives_flow(&self, x: isize, y: isize, from_elevation: f64) -> bool {
        self.in_bounds(x, y) && self.elevation.get(x as usize, y as usize) < from_elevation
    }

    fn accumulate_mdf(&self, gradient: &Grid<f64>) -> Grid<f64> {
        let mut flow = Grid::new(self.elevation.width(), self.elevation.height());

        for &(elevation, x, y) in &self.cells_by_descending_elevation() {
            flow.set(x, y, flow.get(x, y) + 1.0);

            // Gather the downhill neighbours and the total gradient
            // across them.
            let mut downhill = [false; 8];
            let mut weights = [0.0_f64; 8];
            let mut total = 0.0;
            let mut any = false;

            for (code, &(dx, dy)) in NEIGHBOUR_OFFSETS.iter().enumerate() {
                let nx = x as isize + dx;
                let ny = y as isize + dy;
                if !self.in_bounds(nx, ny) {
                    continue;
                }
                let (nx, ny) = (nx as usize, ny as usize);
                if self.elevation.get(nx, ny) >= elevation {
                    continue;
                }
                downhill[code] = true;
                any = true;
                weights[code] = gradient.get(nx, ny);
                total += weights[code];
            }

            if !any || total == 0.0 {
                continue;
            }

            let outflow = flow.get(x, y);
            for (code, &(dx, dy)) in NEIGHBOUR_OFFSETS.iter().enumerate() {
                if !downhill[code] {
                    continue;
                }
                let nx = (x as isize + dx) as usize;
                let ny = (y as isize + dy) as usize;
                flow.set(nx, ny, flow.get(nx, ny) + outflow * weights[code] / total);
            }
        }

        flow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::d8::flow_direction;
    use crate::sobel::{aspect, slope, SlopeComponent};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn east_ramp(width: usize) -> Grid<f64> {
        let mut dem = Grid::new(width, 1);
        for x in 0..width {
            dem.set(x, 0, (width - x) as f64);
        }
        dem
    }

    #[test]
    fn d8_ramp_accumulates_toward_the_outlet() {
        let dem = east_ramp(5);
        let directions = flow_direction(&dem, &mut StdRng::seed_from_u64(1)).unwrap();
        let flow = FlowAccumulator::new(&dem)
            .with_d8(&directions)
            .accumulate(FlowMethod::D8)
            .unwrap();

        for x in 0..5 {
            assert_eq!(flow.get(x, 0), (x + 1) as f64);
        }
    }

    #[test]
    fn d8_every_cell_carries_at_least_itself() {
        let mut dem = Grid::new(6, 6);
        for y in 0..6 {
            for x in 0..6 {
                dem.set(x, y, ((x * 13 + y * 7) % 23) as f64 + 1.0);
            }
        }
        let directions = flow_direction(&dem, &mut StdRng::seed_from_u64(2)).unwrap();
        let flow = FlowAccumulator::new(&dem)
            .with_d8(&directions)
            .accumulate(FlowMethod::D8)
            .unwrap();

        for y in 0..6 {
            for x in 0..6 {
                assert!(flow.get(x, y) >= 1.0);
            }
        }
    }

    #[test]
    fn d8_flow_is_non_decreasing_along_paths() {
        let mut dem = Grid::new(6, 6);
        for y in 0..6 {
            for x in 0..6 {
                dem.set(x, y, ((x * 13 + y * 7) % 23) as f64 + 1.0);
            }
        }
        let directions = flow_direction(&dem, &mut StdRng::seed_from_u64(3)).unwrap();
        let flow = FlowAccumulator::new(&dem)
            .with_d8(&directions)
            .accumulate(FlowMethod::D8)
            .unwrap();

        for y in 0..6 {
            for x in 0..6 {
                let code = directions.get(x, y);
                if !(0..8).contains(&code) {
                    continue;
                }
                let (dx, dy) = NEIGHBOUR_OFFSETS[code as usize];
                let nx = x as isize + dx;
                let ny = y as isize + dy;
                if nx < 0 || ny < 0 || nx >= 6 || ny >= 6 {
                    continue;
                }
                assert!(flow.get(nx as usize, ny as usize) >= flow.get(x, y));
            }
        }
    }

    #[test]
    fn single_cell_grid_accumulates_itself() {
        let dem = Grid::filled(1, 1, 4.0);
        let directions = flow_direction(&dem, &mut StdRng::seed_from_u64(4)).unwrap();
        let flow = FlowAccumulator::new(&dem)
            .with_d8(&directions)
            .accumulate(FlowMethod::D8)
            .unwrap();
        assert_eq!(flow.get(0, 0), 1.0);
    }

    #[test]
    fn dinf_cardinal_aspect_sends_everything_one_way() {
        // Aspect 90° lands exactly on the east cardinal, so the whole
        // total moves east along the ramp.
        let dem = east_ramp(4);
        let aspect_map = Grid::filled(4, 1, 90.0);
        let gradient_map = Grid::filled(4, 1, 1.0);

        let flow = FlowAccumulator::new(&dem)
            .with_aspect(&aspect_map)
            .with_gradient(&gradient_map)
            .accumulate(FlowMethod::Dinf)
            .unwrap();

        for x in 0..4 {
            assert_eq!(flow.get(x, 0), (x + 1) as f64);
        }
    }

    #[test]
    fn dinf_renormalises_after_dropping_blocked_destination() {
        // Aspect 67.5° splits evenly between east and north-east, but on
        // a single-row grid the north-east destination is outside, so
        // the surviving weight is scaled back up to one.
        let dem = east_ramp(4);
        let aspect_map = Grid::filled(4, 1, 67.5);
        let gradient_map = Grid::filled(4, 1, 1.0);

        let flow = FlowAccumulator::new(&dem)
            .with_aspect(&aspect_map)
            .with_gradient(&gradient_map)
            .accumulate(FlowMethod::Dinf)
            .unwrap();

        for x in 0..4 {
            assert_eq!(flow.get(x, 0), (x + 1) as f64);
        }
    }

    #[test]
    fn dinf_drops_outflow_pointing_uphill() {
        // Aspect 270° points west, straight uphill on an east ramp, so
        // the elevation check blocks both destinations.
        let dem = east_ramp(4);
        let aspect_map = Grid::filled(4, 1, 270.0);
        let gradient_map = Grid::filled(4, 1, 1.0);

        let flow = FlowAccumulator::new(&dem)
            .with_aspect(&aspect_map)
            .with_gradient(&gradient_map)
            .accumulate(FlowMethod::Dinf)
            .unwrap();

        for x in 0..4 {
            assert_eq!(flow.get(x, 0), 1.0);
        }
    }

    #[test]
    fn dinf_skips_flat_cells() {
        let dem = Grid::filled(3, 3, 2.0);
        let aspect_map = aspect(&dem).unwrap(); // all flat sentinels
        let gradient_map = slope(&dem, SlopeComponent::Combined).unwrap();
        let flow = FlowAccumulator::new(&dem)
            .with_aspect(&aspect_map)
            .with_gradient(&gradient_map)
            .accumulate(FlowMethod::Dinf)
            .unwrap();

        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(flow.get(x, y), 1.0);
            }
        }
    }

    #[test]
    fn mdf_ramp_accumulates_until_the_gradient_dies() {
        let dem = east_ramp(5);
        let gradient_map = slope(&dem, SlopeComponent::Combined).unwrap();
        let flow = FlowAccumulator::new(&dem)
            .with_gradient(&gradient_map)
            .accumulate(FlowMethod::Mdf)
            .unwrap();

        // One downhill neighbour per cell, so the ramp drains east, but
        // the mirrored Sobel response vanishes on the last column and
        // the flat-neighbourhood rule stops the final hop there.
        for x in 0..4 {
            assert_eq!(flow.get(x, 0), (x + 1) as f64);
        }
        assert_eq!(flow.get(4, 0), 1.0);
    }

    #[test]
    fn mdf_splits_in_proportion_to_destination_gradient() {
        // Two pits flank a ring of high ground; the pit gradients are
        // rigged 3:1 so cells seeing both must split 3:1.
        let mut dem = Grid::filled(3, 3, 9.0);
        dem.set(0, 1, 2.0);
        dem.set(2, 1, 2.0);

        let mut gradient_map = Grid::filled(3, 3, 1.0);
        gradient_map.set(0, 1, 3.0);
        gradient_map.set(2, 1, 1.0);

        let flow = FlowAccumulator::new(&dem)
            .with_gradient(&gradient_map)
            .accumulate(FlowMethod::Mdf)
            .unwrap();

        // Left pit: itself, both west corners whole, and 3/4 of the
        // three cells that see both pits. Right pit mirrors with 1/4.
        assert!((flow.get(0, 1) - 5.25).abs() < 1e-12);
        assert!((flow.get(2, 1) - 2.75).abs() < 1e-12);
    }

    #[test]
    fn missing_collaborators_are_reported() {
        let dem = Grid::filled(2, 2, 1.0);
        let accumulator = FlowAccumulator::new(&dem);

        assert!(matches!(
            accumulator.accumulate(FlowMethod::D8),
            Err(Error::MissingInput(_))
        ));
        assert!(matches!(
            accumulator.accumulate(FlowMethod::Dinf),
            Err(Error::MissingInput(_))
        ));
        assert!(matches!(
            accumulator.accumulate(FlowMethod::Mdf),
            Err(Error::MissingInput(_))
        ));
    }

    #[test]
    fn dinf_requires_gradient_as_well() {
        let dem = Grid::filled(2, 2, 1.0);
        let aspect_map = Grid::filled(2, 2, 90.0);
        let result = FlowAccumulator::new(&dem)
            .with_aspect(&aspect_map)
            .accumulate(FlowMethod::Dinf);
        assert!(matches!(result, Err(Error::MissingInput("gradient map"))));
    }

    #[test]
    fn empty_grid_is_rejected() {
        let dem: Grid<f64> = Grid::default();
        let directions: Grid<i32> = Grid::default();
        let result = FlowAccumulator::new(&dem)
            .with_d8(&directions)
            .accumulate(FlowMethod::D8);
        assert!(matches!(result, Err(Error::EmptyGrid)));
    }

    #[test]
    fn parse_method_names() {
        assert_eq!("d8".parse::<FlowMethod>().unwrap(), FlowMethod::D8);
        assert_eq!("dinf".parse::<FlowMethod>().unwrap(), FlowMethod::Dinf);
        assert_eq!("mdf".parse::<FlowMethod>().unwrap(), FlowMethod::Mdf);
        assert!("d4".parse::<FlowMethod>().is_err());
    }
}
