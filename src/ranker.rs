//! Turns per-vehicle snapshots into ranked approach lists.
//!
//! For each snapshot: match the nearest waypoint, classify the direction,
//! look up the baseline in that direction's table, drop vehicles that are
//! outside the corridor or already past the reference, then add lateness
//! (never earliness) to the baseline. Each direction is stably sorted by ETA
//! and capped.

use serde::Serialize;
use tracing::{debug, info};

use crate::corridor::Corridor;
use crate::dedupe::{Snapshots, dedupe};
use crate::direction::{Direction, DirectionClassifier};
use crate::matcher::nearest_waypoint;
use crate::report::RawReport;

/// Number of vehicles listed per direction unless the caller asks otherwise.
pub const DEFAULT_LIMIT: usize = 3;

const MS_PER_MINUTE: f64 = 60_000.0;
const UNKNOWN_STATE: &str = "unknown";

/// One vehicle approaching the reference station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectedEstimate {
    pub vehicle_number: String,
    pub nearest_waypoint: String,
    pub eta_minutes: i64,
    pub delay_minutes: i64,
    pub movement_state: String,
    pub direction: Direction,
}

/// Both directions' capped, ETA-sorted lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApproachBoard {
    pub inbound: Vec<DirectedEstimate>,
    pub outbound: Vec<DirectedEstimate>,
}

/// Result of one window. An empty feed is reported as [`Approaches::NoData`]
/// so callers can tell "feed empty" apart from "nothing approaching".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Approaches {
    NoData,
    Board(ApproachBoard),
}

/// Converts a millisecond delay into whole minutes, rounding half to even.
/// Absent delay counts as on time.
pub fn delay_minutes(delay_ms: Option<i64>) -> i64 {
    match delay_ms {
        Some(ms) if ms != 0 => (ms as f64 / MS_PER_MINUTE).round_ties_even() as i64,
        _ => 0,
    }
}

/// Estimates a single snapshot, or `None` if it is outside the corridor or
/// already past the reference station in its direction of travel.
pub fn estimate_vehicle(
    report: &RawReport,
    corridor: &Corridor,
    classifier: &DirectionClassifier,
) -> Option<DirectedEstimate> {
    let waypoint = &nearest_waypoint(corridor, report.position).name;
    let direction = classifier.classify(&report.route_identifier);

    let baseline = corridor.baseline_minutes(direction, waypoint)?;
    if !corridor.is_approaching(direction, waypoint) {
        return None;
    }

    let delay = delay_minutes(report.delay_ms);
    Some(DirectedEstimate {
        vehicle_number: report.label_or_number.clone(),
        nearest_waypoint: waypoint.clone(),
        eta_minutes: i64::from(baseline) + delay.max(0),
        delay_minutes: delay,
        movement_state: report
            .movement_state
            .clone()
            .unwrap_or_else(|| UNKNOWN_STATE.to_string()),
        direction,
    })
}

/// Ranks deduplicated snapshots into an [`ApproachBoard`].
pub fn rank(
    snapshots: &Snapshots,
    corridor: &Corridor,
    classifier: &DirectionClassifier,
    limit: usize,
) -> ApproachBoard {
    let mut board = ApproachBoard::default();

    for report in snapshots.iter() {
        match estimate_vehicle(report, corridor, classifier) {
            Some(estimate) => match estimate.direction {
                Direction::Inbound => board.inbound.push(estimate),
                Direction::Outbound => board.outbound.push(estimate),
            },
            None => debug!(
                vehicle_id = %report.vehicle_id,
                "Vehicle outside approach corridor, skipped"
            ),
        }
    }

    for list in [&mut board.inbound, &mut board.outbound] {
        list.sort_by_key(|e| e.eta_minutes);
        list.truncate(limit);
    }

    board
}

/// Runs the whole reduction for one collection window.
pub fn estimate(
    reports: Vec<RawReport>,
    corridor: &Corridor,
    classifier: &DirectionClassifier,
    limit: usize,
) -> Approaches {
    if reports.is_empty() {
        info!("Feed window was empty");
        return Approaches::NoData;
    }

    let report_count = reports.len();
    let snapshots = dedupe(reports);
    let board = rank(&snapshots, corridor, classifier, limit);

    info!(
        reports = report_count,
        vehicles = snapshots.len(),
        inbound = board.inbound.len(),
        outbound = board.outbound.len(),
        "Window reduced"
    );

    Approaches::Board(board)
}
