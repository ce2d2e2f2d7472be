//! Direction of travel inferred from the feed's route identifier.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Classifies route identifiers by their third hyphen-delimited field.
///
/// The identifier is opaque feed metadata (`origin-...-terminus`). Only an
/// exact match of field index 2 against the outbound terminus code yields
/// [`Direction::Outbound`]; identifiers with fewer than three fields and all
/// other codes default to [`Direction::Inbound`]. That default is a policy,
/// not error recovery.
#[derive(Debug, Clone)]
pub struct DirectionClassifier {
    outbound_terminus: String,
}

impl DirectionClassifier {
    pub fn new(outbound_terminus: impl Into<String>) -> Self {
        Self {
            outbound_terminus: outbound_terminus.into(),
        }
    }

    pub fn classify(&self, route_identifier: &str) -> Direction {
        match route_identifier.split('-').nth(2) {
            Some(code) if code == self.outbound_terminus => Direction::Outbound,
            _ => Direction::Inbound,
        }
    }
}
