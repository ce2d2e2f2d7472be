use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info};

use super::client::FeedSource;
use crate::config::FeedConfig;

/// A subscription to the geOps realtime WebSocket.
pub struct GeopsSocket {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    closed: bool,
}

impl GeopsSocket {
    /// Opens the socket and sends the subscription commands.
    #[tracing::instrument(skip(config), fields(url = %config.url))]
    pub async fn connect(config: &FeedConfig) -> Result<Self> {
        let mut request = config
            .endpoint()
            .into_client_request()
            .context("invalid feed endpoint")?;
        request.headers_mut().insert(
            "Origin",
            HeaderValue::from_str(&config.origin).context("invalid Origin header")?,
        );

        let (mut stream, response) = connect_async(request)
            .await
            .context("failed to open feed WebSocket")?;
        info!(status = %response.status(), "Feed connected");

        for command in &config.commands {
            debug!(command = %command, "Sending feed command");
            stream
                .send(Message::text(command.clone()))
                .await
                .with_context(|| format!("failed to send '{command}'"))?;
        }

        Ok(Self {
            stream,
            closed: false,
        })
    }
}

#[async_trait]
impl FeedSource for GeopsSocket {
    async fn next_message(&mut self) -> Result<Option<String>> {
        if self.closed {
            return Ok(None);
        }

        while let Some(frame) = self.stream.next().await {
            match frame.context("feed read failed")? {
                Message::Text(text) => return Ok(Some(text.as_str().to_owned())),
                Message::Close(reason) => {
                    debug!(?reason, "Feed closed by server");
                    self.closed = true;
                    return Ok(None);
                }
                // Pings are answered by the protocol layer.
                _ => continue,
            }
        }

        self.closed = true;
        Ok(None)
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stream
            .close(None)
            .await
            .context("failed to close feed WebSocket")
    }
}
