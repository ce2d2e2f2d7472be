//! JSON rendering of a window's result.
//!
//! A board renders as `{"generated_at": ..., "inbound": [...], "outbound": [...]}`;
//! an empty feed renders as `{"error": "no data"}`.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::ranker::{ApproachBoard, Approaches};

#[derive(Serialize)]
struct Stamped<'a> {
    generated_at: DateTime<Utc>,
    #[serde(flatten)]
    board: &'a ApproachBoard,
}

/// Serializes `approaches` to a JSON value, stamped with `now`.
pub fn to_json(approaches: &Approaches, now: DateTime<Utc>) -> Result<serde_json::Value> {
    let value = match approaches {
        Approaches::NoData => json!({ "error": "no data" }),
        Approaches::Board(board) => serde_json::to_value(Stamped {
            generated_at: now,
            board,
        })?,
    };
    Ok(value)
}

/// Renders `approaches` as compact or indented JSON.
pub fn render(approaches: &Approaches, pretty: bool) -> Result<String> {
    let value = to_json(approaches, Utc::now())?;
    debug!("{:#?}", approaches);
    let text = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(text)
}
