//! JSON decoder for realtime trajectory messages.
//!
//! Every frame on the feed is an envelope `{"source": ..., "content": ...}`.
//! Only `trajectory` envelopes for the monitored line become [`RawReport`]s;
//! everything else is ignored.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::report::{Position, RawReport};

const TRAJECTORY_SOURCE: &str = "trajectory";

/// Why a single message could not become a report. Callers drop the
/// message and carry on with the rest of the window.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("trajectory has no train_id")]
    MissingVehicleId,
    #[error("trajectory has no coordinates")]
    MissingPosition,
    #[error("trajectory coordinates are not a finite [x, y] pair")]
    InvalidPosition,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    content: Value,
}

/// Identifiers arrive as strings or bare numbers depending on the field.
fn label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First vertex of the trajectory. Accepts a line string (`[[x, y], ...]`)
/// or a bare point (`[x, y]`).
fn first_position(coordinates: &Value) -> Result<Position, ReportError> {
    let items = match coordinates {
        Value::Array(items) if !items.is_empty() => items,
        _ => return Err(ReportError::MissingPosition),
    };

    let pair = match &items[0] {
        Value::Array(pair) => pair.as_slice(),
        Value::Number(_) => items.as_slice(),
        _ => return Err(ReportError::InvalidPosition),
    };

    match pair {
        [x, y, ..] => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Ok(geo::coord! { x: x, y: y }),
            _ => Err(ReportError::InvalidPosition),
        },
        _ => Err(ReportError::InvalidPosition),
    }
}

/// Decodes one feed message.
///
/// Returns `Ok(None)` for messages that are not trajectories of `line_name`.
///
/// # Errors
///
/// Returns a [`ReportError`] when the message is not JSON, or is a
/// trajectory of the line without a vehicle id or usable position.
pub fn parse_message(text: &str, line_name: &str) -> Result<Option<RawReport>, ReportError> {
    let envelope: Envelope = serde_json::from_str(text)?;
    if envelope.source.as_deref() != Some(TRAJECTORY_SOURCE) {
        return Ok(None);
    }

    // Optional fields are read leniently: a field of the wrong type counts
    // as absent instead of failing the whole message.
    let content = &envelope.content;
    let props = content.get("properties").unwrap_or(&Value::Null);

    let on_line = props.pointer("/line/name").and_then(Value::as_str) == Some(line_name);
    if !on_line {
        return Ok(None);
    }

    let vehicle_id = props
        .get("train_id")
        .and_then(label)
        .ok_or(ReportError::MissingVehicleId)?;

    let position = match content.pointer("/geometry/coordinates") {
        Some(coordinates) => first_position(coordinates)?,
        None => return Err(ReportError::MissingPosition),
    };

    let label_or_number = props
        .get("train_number")
        .and_then(label)
        .unwrap_or_else(|| vehicle_id.clone());

    Ok(Some(RawReport {
        vehicle_id,
        timestamp: props
            .get("timestamp")
            .and_then(Value::as_f64)
            .map(|t| t as i64),
        position,
        route_identifier: props
            .get("route_identifier")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        delay_ms: props
            .get("delay")
            .and_then(Value::as_f64)
            .map(|d| d.round() as i64),
        label_or_number,
        movement_state: props
            .get("state")
            .and_then(Value::as_str)
            .map(str::to_owned),
    }))
}
