use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::app::DispatchError;

/// A bidirectional text channel to the queue server.
#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, text: String) -> Result<(), DispatchError>;

    /// Next text frame, or `None` once the peer has closed.
    async fn recv(&mut self) -> Result<Option<String>, DispatchError>;

    async fn close(&mut self);
}

pub struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsTransport {
    pub async fn connect(url: &Url) -> Result<Self, DispatchError> {
        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| DispatchError::ConnectFailure(format!("{}: {}", url, e)))?;

        Ok(Self { stream })
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&mut self, text: String) -> Result<(), DispatchError> {
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|e| DispatchError::Protocol(format!("send failed: {}", e)))
    }

    async fn recv(&mut self) -> Result<Option<String>, DispatchError> {
        while let Some(message) = self.stream.next().await {
            match message {
                Ok(Message::Text(text)) => return Ok(Some(text)),
                Ok(Message::Close(_)) => return Ok(None),
                // WebSocket-level pings are answered by tungstenite itself.
                Ok(_) => continue,
                Err(e) => return Err(DispatchError::Protocol(format!("receive failed: {}", e))),
            }
        }
        Ok(None)
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!("Error closing socket: {}", e);
        }
    }
}
