//! Typed vehicle position reports as decoded from the realtime feed.

/// A point in the feed's projected plane (EPSG:3857 metres).
pub type Position = geo::Coord<f64>;

/// One telemetry observation for a single vehicle.
///
/// Required fields are plain values; everything the feed may leave out is an
/// `Option` and is defaulted at the point of use.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReport {
    pub vehicle_id: String,
    /// Feed time of the observation. Absent timestamps compare as `0`.
    pub timestamp: Option<i64>,
    pub position: Position,
    /// Hyphen-delimited terminus codes, e.g. `8000261-8000262-8004168`.
    pub route_identifier: String,
    /// Delay in milliseconds; negative when running early.
    pub delay_ms: Option<i64>,
    pub label_or_number: String,
    pub movement_state: Option<String>,
}

impl RawReport {
    /// The timestamp used for last-write-wins comparisons.
    pub fn effective_timestamp(&self) -> i64 {
        self.timestamp.unwrap_or(0)
    }
}

#[cfg(test)]
pub(crate) fn sample_report(vehicle_id: &str, timestamp: i64, x: f64, y: f64) -> RawReport {
    RawReport {
        vehicle_id: vehicle_id.to_string(),
        timestamp: Some(timestamp),
        position: geo::coord! { x: x, y: y },
        route_identifier: "8004168-8000262-8002792".to_string(),
        delay_ms: None,
        label_or_number: vehicle_id.to_string(),
        movement_state: Some("DRIVING".to_string()),
    }
}
