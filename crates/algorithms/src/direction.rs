//! Neighbour geometry shared by the flow models
//!
//! Direction codes run clockwise from east, with `y` growing southward:
//!
//! ```text
//!   5  6  7
//!   4  .  0
//!   3  2  1
//! ```
//!
//! `-1` marks a cell with no defined outflow (a pit, or a plateau where
//! the tie-break found nothing).

/// Neighbour offsets `(dx, dy)` indexed by direction code.
pub const NEIGHBOUR_OFFSETS: [(isize, isize); 8] = [
    (1, 0),   // 0: E
    (1, 1),   // 1: SE
    (0, 1),   // 2: S
    (-1, 1),  // 3: SW
    (-1, 0),  // 4: W
    (-1, -1), // 5: NW
    (0, -1),  // 6: N
    (1, -1),  // 7: NE
];

/// Sentinel direction code for "no defined outflow".
pub const NO_DIRECTION: i32 = -1;

/// Cardinal azimuths and their neighbour offsets for the aspect bracket
/// lookup. Azimuth 0° points north and increases clockwise.
const CARDINALS: [(f64, (isize, isize)); 8] = [
    (0.0, (0, -1)),    // N
    (45.0, (1, -1)),   // NE
    (90.0, (1, 0)),    // E
    (135.0, (1, 1)),   // SE
    (180.0, (0, 1)),   // S
    (225.0, (-1, 1)),  // SW
    (270.0, (-1, 0)),  // W
    (315.0, (-1, -1)), // NW
];

/// Split an azimuth between the two cardinal neighbours bracketing it.
///
/// Returns the two neighbour offsets and their interpolation weights,
/// which always sum to one. An azimuth that lands exactly on a cardinal
/// carries its full weight on that cardinal. The input is normalised
/// into `[0°, 360°)` first, so negative and oversized angles are safe.
///
/// Shared by D∞ accumulation (which uses the weights) and D∞ watershed
/// tracing (which uses only the two offsets).
pub fn bracketing_neighbours(aspect: f64) -> ((isize, isize), (isize, isize), f64, f64) {
    let mut angle = aspect % 360.0;
    if angle < 0.0 {
        angle += 360.0;
    }

    // Above the last cardinal the bracket wraps around to north.
    if angle >= 315.0 {
        let towards_north = (angle - 315.0) / 45.0;
        return (
            CARDINALS[0].1,
            CARDINALS[7].1,
            towards_north,
            1.0 - towards_north,
        );
    }

    for i in 1..CARDINALS.len() {
        let (cardinal, offset) = CARDINALS[i];
        if (angle - cardinal).abs() < 1e-6 {
            return (offset, offset, 1.0, 0.0);
        }
        if angle < cardinal {
            let towards_upper = (angle - CARDINALS[i - 1].0) / 45.0;
            return (offset, CARDINALS[i - 1].1, 1.0 - towards_upper, towards_upper);
        }
    }

    // Unreachable: every angle below 315° is caught by the scan.
    (CARDINALS[0].1, CARDINALS[7].1, 1.0, 0.0)
}
