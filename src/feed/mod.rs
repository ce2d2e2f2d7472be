//! Feed bridge: gathers one bounded collection window of reports.
//!
//! A [`FeedSource`] yields raw text messages; [`collect`] drains it until the
//! window deadline or the end of the stream, decodes each message, and always
//! closes the source before handing back a finite batch. [`collect_live`]
//! wraps this around a [`GeopsSocket`] under one hard session deadline.

mod client;
mod geops;
mod replay;

pub use client::FeedSource;
pub use geops::GeopsSocket;
pub use replay::ReplaySource;

use std::time::Duration;

use anyhow::Result;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::parser::parse_message;
use crate::report::RawReport;

/// The decoded reports of one window and what was thrown away.
#[derive(Debug, Default)]
pub struct CollectedBatch {
    pub reports: Vec<RawReport>,
    /// Messages received, whether or not they became reports.
    pub messages: usize,
    /// Messages that looked like reports for the line but could not be decoded.
    pub dropped: usize,
}

impl CollectedBatch {
    fn push_message(&mut self, text: &str, line_name: &str) {
        self.messages += 1;
        match parse_message(text, line_name) {
            Ok(Some(report)) => self.reports.push(report),
            Ok(None) => {}
            Err(e) => {
                self.dropped += 1;
                debug!(error = %e, "Dropping malformed feed message");
            }
        }
    }
}

async fn drain<S: FeedSource + ?Sized>(
    source: &mut S,
    deadline: Instant,
    line_name: &str,
    batch: &mut CollectedBatch,
) -> Result<()> {
    loop {
        match timeout_at(deadline, source.next_message()).await {
            Err(_) => {
                debug!("Collection window elapsed");
                return Ok(());
            }
            Ok(Ok(Some(text))) => batch.push_message(&text, line_name),
            Ok(Ok(None)) => {
                debug!("Feed ended before the window elapsed");
                return Ok(());
            }
            Ok(Err(e)) => return Err(e),
        }
    }
}

/// Collects reports for `line_name` from `source` for at most `window`.
///
/// A transport error mid-window ends collection early; the reports gathered
/// up to that point are still returned. The source is closed in every case.
#[tracing::instrument(skip(source), fields(window_secs = window.as_secs_f64()))]
pub async fn collect<S: FeedSource + ?Sized>(
    source: &mut S,
    window: Duration,
    line_name: &str,
) -> CollectedBatch {
    collect_until(source, Instant::now() + window, line_name).await
}

/// Same as [`collect`], but the window ends at a fixed `deadline`.
pub async fn collect_until<S: FeedSource + ?Sized>(
    source: &mut S,
    deadline: Instant,
    line_name: &str,
) -> CollectedBatch {
    let mut batch = CollectedBatch::default();

    if let Err(e) = drain(source, deadline, line_name, &mut batch).await {
        warn!(error = %e, "Feed failed mid-window, keeping partial batch");
    }

    if let Err(e) = source.close().await {
        warn!(error = %e, "Failed to close feed");
    }

    info!(
        messages = batch.messages,
        reports = batch.reports.len(),
        dropped = batch.dropped,
        "Collection window finished"
    );

    batch
}

/// Opens the live feed and collects one window.
///
/// Only the connect is cut off by `config.hard_timeout`; the window itself
/// is shortened to end at the same session deadline, so a slow handshake
/// costs collection time but never the reports already received. An
/// unreachable feed yields an empty batch, which downstream reports as no
/// data.
#[tracing::instrument(skip(config), fields(url = %config.url, window_secs = config.window.as_secs_f64()))]
pub async fn collect_live(config: &FeedConfig, line_name: &str) -> CollectedBatch {
    let session_deadline = Instant::now() + config.hard_timeout;

    let mut socket = match timeout_at(session_deadline, GeopsSocket::connect(config)).await {
        Ok(Ok(socket)) => socket,
        Ok(Err(e)) => {
            warn!(error = %e, "Feed unavailable");
            return CollectedBatch::default();
        }
        Err(_) => {
            warn!(
                timeout_secs = config.hard_timeout.as_secs_f64(),
                "Feed connect timed out"
            );
            return CollectedBatch::default();
        }
    };

    let deadline = (Instant::now() + config.window).min(session_deadline);
    collect_until(&mut socket, deadline, line_name).await
}
