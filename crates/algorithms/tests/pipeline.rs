//! End-to-end pipeline tests: fill, derive, accumulate, delineate.

use demflow_algorithms::prelude::*;
use demflow_algorithms::{bracketing_neighbours, NEIGHBOUR_OFFSETS};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn grid_from_rows(rows: &[&[f64]]) -> Grid<f64> {
    let height = rows.len();
    let width = rows[0].len();
    let mut grid = Grid::new(width, height);
    for (y, row) in rows.iter().enumerate() {
        for (x, &value) in row.iter().enumerate() {
            grid.set(x, y, value);
        }
    }
    grid
}

#[test]
fn every_derived_map_matches_the_dem_dimensions() {
    let mut dem = Grid::new(7, 5);
    for y in 0..5 {
        for x in 0..7 {
            dem.set(x, y, ((x * 3 + y * 11) % 17) as f64 + 1.0);
        }
    }
    let dem = fill_sinks(&dem);

    let directions = flow_direction(&dem, &mut StdRng::seed_from_u64(5)).unwrap();
    let gradient = slope(&dem, SlopeComponent::Combined).unwrap();
    let azimuths = aspect(&dem).unwrap();
    let flow = FlowAccumulator::new(&dem)
        .with_d8(&directions)
        .accumulate(FlowMethod::D8)
        .unwrap();

    for map_dims in [
        (directions.width(), directions.height()),
        (gradient.width(), gradient.height()),
        (azimuths.width(), azimuths.height()),
        (flow.width(), flow.height()),
    ] {
        assert_eq!(map_dims, (dem.width(), dem.height()));
    }
}

#[test]
fn ramp_drains_east_and_accumulates_linearly() {
    // Columns descend eastward on a single row, so flow runs straight
    // down the ramp: 1, 2, 3 and a terminal cell with no direction.
    let dem = grid_from_rows(&[&[3.0, 2.0, 1.0]]);

    let directions = flow_direction(&dem, &mut StdRng::seed_from_u64(1)).unwrap();
    assert_eq!(directions.get(0, 0), 0);
    assert_eq!(directions.get(1, 0), 0);
    assert_eq!(directions.get(2, 0), -1);

    let flow = FlowAccumulator::new(&dem)
        .with_d8(&directions)
        .accumulate(FlowMethod::D8)
        .unwrap();
    assert_eq!(flow.get(0, 0), 1.0);
    assert_eq!(flow.get(1, 0), 2.0);
    assert_eq!(flow.get(2, 0), 3.0);
}

#[test]
fn south_east_tilt_aspect_is_exactly_south_west() {
    let dem = grid_from_rows(&[
        &[7.0, 6.0, 5.0],
        &[6.0, 5.0, 4.0],
        &[5.0, 4.0, 3.0],
    ]);

    let azimuths = aspect(&dem).unwrap();
    assert!((azimuths.get(1, 1) - 225.0).abs() < 1e-9);

    // 225° sits exactly on the south-west cardinal, so the bracket
    // degenerates to a single direction with full weight.
    let (dir1, dir2, w1, w2) = bracketing_neighbours(azimuths.get(1, 1));
    assert_eq!(dir1, (-1, 1));
    assert_eq!(dir2, (-1, 1));
    assert_eq!(w1, 1.0);
    assert_eq!(w2, 0.0);
}

#[test]
fn sink_filling_is_idempotent_on_a_pit() {
    let dem = grid_from_rows(&[
        &[9.0, 9.0, 9.0],
        &[9.0, 1.0, 9.0],
        &[9.0, 9.0, 9.0],
    ]);

    let once = fill_sinks(&dem);
    assert_eq!(once.get(1, 1), 10.0);

    let twice = fill_sinks(&once);
    assert_eq!(once, twice);
}

#[test]
fn one_by_one_grid_boundary_behaviour() {
    let dem = Grid::filled(1, 1, 5.0);

    let directions = flow_direction(&dem, &mut StdRng::seed_from_u64(2)).unwrap();
    assert_eq!(directions.get(0, 0), -1);

    let flow = FlowAccumulator::new(&dem)
        .with_d8(&directions)
        .accumulate(FlowMethod::D8)
        .unwrap();
    assert_eq!(flow.get(0, 0), 1.0);

    let gradient = slope(&dem, SlopeComponent::Combined).unwrap();
    assert_eq!(gradient.get(0, 0), 0.0);
}

#[test]
fn monotone_ramp_accumulates_its_width_at_the_low_end() {
    let width = 8;
    let mut dem = Grid::new(width, 1);
    for x in 0..width {
        dem.set(x, 0, (width - x) as f64);
    }

    let directions = flow_direction(&dem, &mut StdRng::seed_from_u64(3)).unwrap();
    let flow = FlowAccumulator::new(&dem)
        .with_d8(&directions)
        .accumulate(FlowMethod::D8)
        .unwrap();
    assert_eq!(flow.get(width - 1, 0), width as f64);
}

#[test]
fn accumulation_is_at_least_one_everywhere_under_every_model() {
    let mut dem = Grid::new(6, 6);
    for y in 0..6 {
        for x in 0..6 {
            dem.set(x, y, ((x * 5 + y * 9) % 13) as f64 + 2.0);
        }
    }
    let dem = fill_sinks(&dem);

    let directions = flow_direction(&dem, &mut StdRng::seed_from_u64(4)).unwrap();
    let gradient = slope(&dem, SlopeComponent::Combined).unwrap();
    let azimuths = aspect(&dem).unwrap();

    let accumulator = FlowAccumulator::new(&dem)
        .with_d8(&directions)
        .with_aspect(&azimuths)
        .with_gradient(&gradient);

    for method in [FlowMethod::D8, FlowMethod::Dinf, FlowMethod::Mdf] {
        let flow = accumulator.accumulate(method).unwrap();
        for y in 0..6 {
            for x in 0..6 {
                assert!(
                    flow.get(x, y) >= 1.0,
                    "{method:?} accumulation below self-contribution at ({x}, {y})"
                );
            }
        }
    }
}

#[test]
fn west_draining_channel_watershed_is_its_row() {
    // Rows rise eastward, so every cell drains west and row channels
    // stay independent; the catchment of the west edge cell in the
    // middle row is exactly that row.
    let mut dem = Grid::new(5, 3);
    for y in 0..3 {
        for x in 0..5 {
            dem.set(x, y, (x + 1) as f64);
        }
    }
    let mut directions = Grid::new(5, 3);
    for y in 0..3 {
        for x in 0..5 {
            directions.set(x, y, 4); // west
        }
    }

    let flow = FlowAccumulator::new(&dem)
        .with_d8(&directions)
        .accumulate(FlowMethod::D8)
        .unwrap();
    let analyser = WatershedAnalyser::new(&dem)
        .with_d8(&directions)
        .with_flow(&flow);

    let catchment = analyser.watershed((0, 1), FlowMethod::D8).unwrap();
    for x in 0..5 {
        assert_eq!(catchment.get(x, 1), flow.get(x, 1));
        assert_eq!(catchment.get(x, 0), 0.0);
        assert_eq!(catchment.get(x, 2), 0.0);
    }
}

#[test]
fn watershed_members_reach_the_pour_point() {
    // Funnel everything toward a single outlet and verify containment:
    // each member's D8 step stays inside the catchment.
    let mut dem = Grid::new(5, 5);
    for y in 0..5 {
        for x in 0..5 {
            let dx = (x as isize - 2).unsigned_abs() as f64;
            let dy = (y as isize - 2).unsigned_abs() as f64;
            dem.set(x, y, dx + dy + 1.0);
        }
    }

    let directions = flow_direction(&dem, &mut StdRng::seed_from_u64(6)).unwrap();
    let flow = FlowAccumulator::new(&dem)
        .with_d8(&directions)
        .accumulate(FlowMethod::D8)
        .unwrap();
    let analyser = WatershedAnalyser::new(&dem)
        .with_d8(&directions)
        .with_flow(&flow);

    let catchment = analyser.watershed((2, 2), FlowMethod::D8).unwrap();
    assert!(catchment.get(2, 2) != 0.0);

    for y in 0..5 {
        for x in 0..5 {
            if catchment.get(x, y) == 0.0 || (x, y) == (2, 2) {
                continue;
            }
            let code = directions.get(x, y);
            assert!((0..8).contains(&code));
            let (dx, dy) = NEIGHBOUR_OFFSETS[code as usize];
            let nx = (x as isize + dx) as usize;
            let ny = (y as isize + dy) as usize;
            assert!(
                catchment.get(nx, ny) != 0.0,
                "member ({x}, {y}) steps outside the catchment"
            );
        }
    }
}

#[test]
fn top_k_pour_points_have_the_largest_flows() {
    let mut dem = Grid::new(6, 1);
    for x in 0..6 {
        dem.set(x, 0, (6 - x) as f64);
    }
    let directions = flow_direction(&dem, &mut StdRng::seed_from_u64(8)).unwrap();
    let flow = FlowAccumulator::new(&dem)
        .with_d8(&directions)
        .accumulate(FlowMethod::D8)
        .unwrap();
    let analyser = WatershedAnalyser::new(&dem)
        .with_d8(&directions)
        .with_flow(&flow);

    // Only the terminal cell qualifies, so K = 1 returns it.
    let points = analyser.pour_points(1, PourPointMethod::D8).unwrap();
    assert_eq!(points, vec![(5, 0)]);
}
