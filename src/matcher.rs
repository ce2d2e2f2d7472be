//! Nearest-waypoint matching in the projected plane.
//!
//! This is "closest known stop", not map matching against track geometry:
//! accuracy is bounded by waypoint spacing.

use crate::corridor::{Corridor, Waypoint};
use crate::report::Position;

fn squared_distance(a: Position, b: Position) -> f64 {
    let d = a - b;
    d.x * d.x + d.y * d.y
}

/// Returns the waypoint closest to `position`.
///
/// Scans the whole table; on equal distance the earlier waypoint wins. The
/// corridor guarantees a non-empty table, so this never fails. A non-finite
/// position compares false against every distance and resolves to the first
/// waypoint.
pub fn nearest_waypoint(corridor: &Corridor, position: Position) -> &Waypoint {
    let waypoints = corridor.waypoints();
    let mut best = &waypoints[0];
    let mut best_distance = squared_distance(position, best.position);

    for waypoint in &waypoints[1..] {
        let distance = squared_distance(position, waypoint.position);
        if distance < best_distance {
            best = waypoint;
            best_distance = distance;
        }
    }

    best
}
