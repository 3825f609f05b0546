//! Pour-point selection and upstream catchment tracing
//!
//! Pour points are the cells where water leaves the grid; the top K by
//! accumulated flow are kept in a bounded min-heap, so a full sort of
//! the grid is never needed. Catchments are traced upstream from a pour
//! point with an explicit work stack, admitting each neighbour that
//! flows into the cell under the chosen model.

use crate::accumulation::FlowMethod;
use crate::direction::{bracketing_neighbours, NEIGHBOUR_OFFSETS};
use demflow_core::{Error, Grid, Result};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::str::FromStr;
use tracing::{debug, warn};

/// Candidate rule used for pour-point selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PourPointMethod {
    /// Cells whose D8 direction is undefined or steps off the grid.
    D8,
    /// Cells with at least one strictly higher in-grid neighbour.
    Mdf,
}

impl FromStr for PourPointMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "d8" => Ok(PourPointMethod::D8),
            "mdf" => Ok(PourPointMethod::Mdf),
            other => Err(Error::UnknownOption {
                kind: "pour point method",
                value: other.to_string(),
            }),
        }
    }
}

/// Selects outlets and traces their catchments over an elevation grid.
///
/// As with the accumulator, collaborator maps are attached with the
/// `with_*` builders and a missing prerequisite surfaces as
/// [`Error::MissingInput`].
pub struct WatershedAnalyser<'a> {
    elevation: &'a Grid<f64>,
    d8: Option<&'a Grid<i32>>,
    flow: Option<&'a Grid<f64>>,
    aspect: Option<&'a Grid<f64>>,
}

impl<'a> WatershedAnalyser<'a> {
    pub fn new(elevation: &'a Grid<f64>) -> Self {
        Self {
            elevation,
            d8: None,
            flow: None,
            aspect: None,
        }
    }

    /// Attach a D8 direction map.
    pub fn with_d8(mut self, map: &'a Grid<i32>) -> Self {
        self.d8 = Some(map);
        self
    }

    /// Attach a flow-accumulation map.
    pub fn with_flow(mut self, map: &'a Grid<f64>) -> Self {
        self.flow = Some(map);
        self
    }

    /// Attach an aspect map.
    pub fn with_aspect(mut self, map: &'a Grid<f64>) -> Self {
        self.aspect = Some(map);
        self
    }

    /// Select up to `count` pour points, keeping the candidates with the
    /// largest accumulated flow.
    ///
    /// The result comes back in heap-extraction order, ascending by
    /// flow; reverse it for a largest-first listing.
    pub fn pour_points(
        &self,
        count: usize,
        method: PourPointMethod,
    ) -> Result<Vec<(usize, usize)>> {
        if self.elevation.is_empty() {
            return Err(Error::EmptyGrid);
        }
        let flow = self
            .flow
            .ok_or(Error::MissingInput("flow accumulation map"))?;
        let d8 = match method {
            PourPointMethod::D8 => Some(self.d8.ok_or(Error::MissingInput("d8 direction map"))?),
            PourPointMethod::Mdf => None,
        };

        struct Candidate {
            x: usize,
            y: usize,
            flow: f64,
        }
        impl PartialEq for Candidate {
            fn eq(&self, other: &Self) -> bool {
                self.cmp(other) == Ordering::Equal
            }
        }
        impl Eq for Candidate {}
        impl PartialOrd for Candidate {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }
        impl Ord for Candidate {
            fn cmp(&self, other: &Self) -> Ordering {
                self.flow.total_cmp(&other.flow)
            }
        }

        let mut heap: BinaryHeap<Reverse<Candidate>> = BinaryHeap::new();
        for y in 0..self.elevation.height() {
            for x in 0..self.elevation.width() {
                let is_candidate = match method {
                    PourPointMethod::D8 => {
                        d8.is_some_and(|map| self.escapes_grid(map, x, y))
                    }
                    PourPointMethod::Mdf => self.has_higher_neighbour(x, y),
                };
                if !is_candidate {
                    continue;
                }

                heap.push(Reverse(Candidate {
                    x,
                    y,
                    flow: flow.get(x, y),
                }));
                if heap.len() > count {
                    heap.pop();
                }
            }
        }

        let mut points = Vec::with_capacity(heap.len());
        while let Some(Reverse(candidate)) = heap.pop() {
            points.push((candidate.x, candidate.y));
        }
        debug!(count = points.len(), ?method, "selected pour points");
        Ok(points)
    }

    /// A cell escapes when it has no direction code or its step leaves
    /// the grid.
    fn escapes_grid(&self, d8: &Grid<i32>, x: usize, y: usize) -> bool {
        let code = d8.get(x, y);
        if !(0..8).contains(&code) {
            return true;
        }
        let (dx, dy) = NEIGHBOUR_OFFSETS[code as usize];
        !self.in_bounds(x as isize + dx, y as isize + dy)
    }

    fn has_higher_neighbour(&self, x: usize, y: usize) -> bool {
        let current = self.elevation.get(x, y);
        NEIGHBOUR_OFFSETS.iter().any(|&(dx, dy)| {
            let nx = x as isize + dx;
            let ny = y as isize + dy;
            self.in_bounds(nx, ny) && self.elevation.get(nx as usize, ny as usize) > current
        })
    }

    fn in_bounds(&self, x: isize, y: isize) -> bool {
        x >= 0
            && y >= 0
            && x < self.elevation.width() as isize
            && y < self.elevation.height() as isize
    }

    /// Trace the catchment draining through `point` under the chosen
    /// model.
    ///
    /// The result matches the elevation grid in size and holds each
    /// member cell's accumulated flow, zero everywhere else.
    pub fn watershed(&self, point: (usize, usize), method: FlowMethod) -> Result<Grid<f64>> {
        if self.elevation.is_empty() {
            return Err(Error::EmptyGrid);
        }
        let flow = self
            .flow
            .ok_or(Error::MissingInput("flow accumulation map"))?;

        match method {
            FlowMethod::D8 => {
                let d8 = self.d8.ok_or(Error::MissingInput("d8 direction map"))?;
                let seed = flow.get(point.0, point.1);
                Ok(self.trace(point, flow, seed, |x, y, nx, ny| {
                    let code = d8.get(nx, ny);
                    if !(0..8).contains(&code) {
                        return false;
                    }
                    let (dx, dy) = NEIGHBOUR_OFFSETS[code as usize];
                    nx as isize + dx == x as isize && ny as isize + dy == y as isize
                }))
            }
            FlowMethod::Dinf => {
                let aspect = self.aspect.ok_or(Error::MissingInput("aspect map"))?;
                // The pour point seeds with a single unit here, not its
                // accumulated flow.
                Ok(self.trace(point, flow, 1.0, |x, y, nx, ny| {
                    // A flat or undefined aspect sheds no flow, so the
                    // neighbour cannot drain into anything.
                    let theta = aspect.get(nx, ny);
                    if theta.is_nan() || theta < 0.0 {
                        return false;
                    }
                    let (dir1, dir2, _, _) = bracketing_neighbours(theta);
                    (nx as isize + dir1.0 == x as isize && ny as isize + dir1.1 == y as isize)
                        || (nx as isize + dir2.0 == x as isize
                            && ny as isize + dir2.1 == y as isize)
                }))
            }
            FlowMethod::Mdf => {
                let seed = flow.get(point.0, point.1);
                Ok(self.trace(point, flow, seed, |x, y, nx, ny| {
                    self.elevation.get(nx, ny) > self.elevation.get(x, y)
                }))
            }
        }
    }

    /// Upstream search from the pour point. `flows_into(x, y, nx, ny)`
    /// answers whether the neighbour at `(nx, ny)` drains into `(x, y)`.
    fn trace<F>(
        &self,
        point: (usize, usize),
        flow: &Grid<f64>,
        seed: f64,
        flows_into: F,
    ) -> Grid<f64>
    where
        F: Fn(usize, usize, usize, usize) -> bool,
    {
        let width = self.elevation.width();
        let height = self.elevation.height();
        let mut catchment = Grid::new(width, height);

        let (px, py) = point;
        if px >= width || py >= height {
            warn!(x = px, y = py, "pour point outside the grid");
            return catchment;
        }

        catchment.set(px, py, seed);
        let mut stack = vec![(px, py)];
        while let Some((x, y)) = stack.pop() {
            for &(dx, dy) in &NEIGHBOUR_OFFSETS {
                let nx = x as isize + dx;
                let ny = y as isize + dy;
                if !self.in_bounds(nx, ny) {
                    continue;
                }
                let (nx, ny) = (nx as usize, ny as usize);
                if catchment.get(nx, ny) != 0.0 {
                    continue;
                }
                if !flows_into(x, y, nx, ny) {
                    continue;
                }
                catchment.set(nx, ny, flow.get(nx, ny));
                stack.push((nx, ny));
            }
        }

        catchment
    }
}
