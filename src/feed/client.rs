use anyhow::Result;
use async_trait::async_trait;

/// A live or recorded stream of raw feed messages.
#[async_trait]
pub trait FeedSource: Send {
    /// Next text message, or `None` once the source is exhausted.
    async fn next_message(&mut self) -> Result<Option<String>>;

    /// Releases the underlying connection. Called exactly once per window.
    async fn close(&mut self) -> Result<()>;
}
