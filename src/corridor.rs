//! Waypoint table and per-direction ETA model for the monitored line.
//!
//! A [`Corridor`] owns the ordered list of named waypoints along the line and
//! two independent baseline tables (minutes to the reference station), one
//! per [`Direction`]. A waypoint missing from a direction's table is outside
//! that direction's approach corridor.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::direction::Direction;
use crate::report::Position;

/// A named fixed reference point (station) on the line.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub name: String,
    pub position: Position,
}

impl Waypoint {
    pub fn new(name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            name: name.into(),
            position: geo::coord! { x: x, y: y },
        }
    }
}

/// Station lists deciding whether a vehicle has already passed the
/// reference station in its direction of travel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApproachWindow {
    /// Waypoints never counted as approaching for inbound travel.
    pub inbound_excluded: Vec<String>,
    /// Outbound vehicles at a waypoint shared with the inbound table (other
    /// than the reference) only count while their baseline is at most this.
    pub outbound_shared_limit: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CorridorError {
    #[error("waypoint table is empty")]
    Empty,
    #[error("duplicate waypoint name '{0}'")]
    DuplicateWaypoint(String),
    #[error("{table} references unknown waypoint '{name}'")]
    UnknownWaypoint { table: &'static str, name: String },
    #[error("reference station '{0}' is not a waypoint")]
    UnknownReference(String),
}

#[derive(Debug, Clone)]
pub struct Corridor {
    reference: String,
    waypoints: Vec<Waypoint>,
    inbound_minutes: HashMap<String, u32>,
    outbound_minutes: HashMap<String, u32>,
    window: ApproachWindow,
}

impl Corridor {
    /// Builds a validated corridor.
    ///
    /// # Errors
    ///
    /// Fails when the table is empty, names repeat, or any table or window
    /// entry names something that is not a waypoint.
    pub fn new(
        reference: impl Into<String>,
        waypoints: Vec<Waypoint>,
        inbound_minutes: HashMap<String, u32>,
        outbound_minutes: HashMap<String, u32>,
        window: ApproachWindow,
    ) -> Result<Self, CorridorError> {
        let reference = reference.into();

        if waypoints.is_empty() {
            return Err(CorridorError::Empty);
        }

        let mut names = HashSet::new();
        for waypoint in &waypoints {
            if !names.insert(waypoint.name.as_str()) {
                return Err(CorridorError::DuplicateWaypoint(waypoint.name.clone()));
            }
        }

        if !names.contains(reference.as_str()) {
            return Err(CorridorError::UnknownReference(reference));
        }

        let referenced = inbound_minutes
            .keys()
            .map(|n| ("inbound table", n))
            .chain(outbound_minutes.keys().map(|n| ("outbound table", n)))
            .chain(
                window
                    .inbound_excluded
                    .iter()
                    .map(|n| ("inbound exclusions", n)),
            );
        for (table, name) in referenced {
            if !names.contains(name.as_str()) {
                return Err(CorridorError::UnknownWaypoint {
                    table,
                    name: name.clone(),
                });
            }
        }

        Ok(Self {
            reference,
            waypoints,
            inbound_minutes,
            outbound_minutes,
            window,
        })
    }

    /// Waypoints in table order. Never empty.
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    fn table(&self, direction: Direction) -> &HashMap<String, u32> {
        match direction {
            Direction::Inbound => &self.inbound_minutes,
            Direction::Outbound => &self.outbound_minutes,
        }
    }

    /// Baseline minutes from `waypoint` to the reference station, or `None`
    /// when the waypoint is not part of the direction's corridor.
    pub fn baseline_minutes(&self, direction: Direction, waypoint: &str) -> Option<u32> {
        self.table(direction).get(waypoint).copied()
    }

    /// Whether a vehicle at `waypoint` still counts as approaching.
    ///
    /// The two directions share part of the waypoint geometry, so a vehicle
    /// that has just passed the reference and continues towards the other
    /// terminus would otherwise look like it is approaching again.
    pub fn is_approaching(&self, direction: Direction, waypoint: &str) -> bool {
        match direction {
            Direction::Inbound => !self
                .window
                .inbound_excluded
                .iter()
                .any(|name| name == waypoint),
            Direction::Outbound => {
                let shared = self.inbound_minutes.contains_key(waypoint)
                    && waypoint != self.reference;
                if !shared {
                    return true;
                }
                self.outbound_minutes
                    .get(waypoint)
                    .is_some_and(|&minutes| minutes <= self.window.outbound_shared_limit)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes(entries: &[(&str, u32)]) -> HashMap<String, u32> {
        entries
            .iter()
            .map(|(name, m)| (name.to_string(), *m))
            .collect()
    }

    fn small_corridor() -> Corridor {
        Corridor::new(
            "Mid",
            vec![
                Waypoint::new("Far", 0.0, 100.0),
                Waypoint::new("Near", 0.0, 50.0),
                Waypoint::new("Mid", 0.0, 0.0),
                Waypoint::new("Past", 0.0, -50.0),
            ],
            minutes(&[("Far", 12), ("Near", 5), ("Mid", 0), ("Past", 3)]),
            minutes(&[("Past", 3), ("Mid", 0), ("Near", 5), ("Far", 12)]),
            ApproachWindow {
                inbound_excluded: vec!["Past".to_string()],
                outbound_shared_limit: 6,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_baseline_lookup_per_direction() {
        let corridor = small_corridor();
        assert_eq!(corridor.baseline_minutes(Direction::Inbound, "Far"), Some(12));
        assert_eq!(corridor.baseline_minutes(Direction::Outbound, "Past"), Some(3));
        assert_eq!(corridor.baseline_minutes(Direction::Inbound, "Nowhere"), None);
    }

    #[test]
    fn test_inbound_exclusion_list() {
        let corridor = small_corridor();
        assert!(!corridor.is_approaching(Direction::Inbound, "Past"));
        assert!(corridor.is_approaching(Direction::Inbound, "Near"));
        assert!(corridor.is_approaching(Direction::Inbound, "Mid"));
    }

    #[test]
    fn test_outbound_shared_limit() {
        let corridor = small_corridor();
        // Shared with the inbound table and beyond the limit.
        assert!(!corridor.is_approaching(Direction::Outbound, "Far"));
        // Shared but within the limit.
        assert!(corridor.is_approaching(Direction::Outbound, "Near"));
        // The reference itself always counts.
        assert!(corridor.is_approaching(Direction::Outbound, "Mid"));
    }

    #[test]
    fn test_rejects_empty_table() {
        let result = Corridor::new(
            "Mid",
            vec![],
            HashMap::new(),
            HashMap::new(),
            ApproachWindow::default(),
        );
        assert_eq!(result.unwrap_err(), CorridorError::Empty);
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let result = Corridor::new(
            "A",
            vec![Waypoint::new("A", 0.0, 0.0), Waypoint::new("A", 1.0, 1.0)],
            HashMap::new(),
            HashMap::new(),
            ApproachWindow::default(),
        );
        assert_eq!(
            result.unwrap_err(),
            CorridorError::DuplicateWaypoint("A".to_string())
        );
    }

    #[test]
    fn test_rejects_unknown_table_entry() {
        let result = Corridor::new(
            "A",
            vec![Waypoint::new("A", 0.0, 0.0)],
            minutes(&[("B", 3)]),
            HashMap::new(),
            ApproachWindow::default(),
        );
        assert!(matches!(
            result.unwrap_err(),
            CorridorError::UnknownWaypoint { table: "inbound table", .. }
        ));
    }

    #[test]
    fn test_rejects_unknown_reference() {
        let result = Corridor::new(
            "Z",
            vec![Waypoint::new("A", 0.0, 0.0)],
            HashMap::new(),
            HashMap::new(),
            ApproachWindow::default(),
        );
        assert_eq!(
            result.unwrap_err(),
            CorridorError::UnknownReference("Z".to_string())
        );
    }
}
