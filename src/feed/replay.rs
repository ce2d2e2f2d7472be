use std::collections::VecDeque;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::client::FeedSource;

/// Replays recorded feed messages, one JSON message per line.
pub struct ReplaySource {
    lines: VecDeque<String>,
}

impl ReplaySource {
    pub fn from_text(text: &str) -> Self {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { lines }
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read replay file '{path}'"))?;
        Ok(Self::from_text(&text))
    }
}

#[async_trait]
impl FeedSource for ReplaySource {
    async fn next_message(&mut self) -> Result<Option<String>> {
        Ok(self.lines.pop_front())
    }

    async fn close(&mut self) -> Result<()> {
        self.lines.clear();
        Ok(())
    }
}
