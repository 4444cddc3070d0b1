use std::time::Duration;

use serde_json::{json, Value};

use crate::app::DispatchError;
use crate::config::{CytubeConfig, CytubeCredentials};
use crate::dispatch::socketio::Packet;
use crate::dispatch::transport::Transport;
use crate::dispatch::DispatchReport;

/// CyTube's `queueFail` message for a duplicate; the item is queued already.
pub const ALREADY_ON_PLAYLIST: &str = "This item is already on the playlist";

/// A logged-in conversation with one CyTube channel.
pub struct QueueSession<T: Transport> {
    transport: T,
    timeout: Duration,
}

impl<T: Transport> QueueSession<T> {
    pub fn new(transport: T, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Join the channel, log in, then queue every id in order. A refused
    /// item is recorded and the next one is tried.
    pub async fn run(
        &mut self,
        credentials: &CytubeCredentials,
        ids: &[String],
        settings: &CytubeConfig,
    ) -> Result<DispatchReport, DispatchError> {
        self.handshake(credentials).await?;

        let mut report = DispatchReport::default();
        for id in ids {
            match self.queue(id, settings).await {
                Ok(()) => {
                    tracing::info!(content_id = %id, "Queued");
                    report.queued.push(id.clone());
                }
                Err(DispatchError::Rejected { id, reason }) => {
                    tracing::warn!(content_id = %id, "Server refused item: {}", reason);
                    report.rejected.push((id, reason));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }

    pub async fn handshake(&mut self, credentials: &CytubeCredentials) -> Result<(), DispatchError> {
        self.wait_for("engine.io open", |p| {
            matches!(p, Packet::Open(_)).then_some(Ok(()))
        })
        .await?;

        self.emit(Packet::Connect(None)).await?;
        self.wait_for("namespace connect", |p| match p {
            Packet::Connect(_) => Some(Ok(())),
            Packet::ConnectError(data) => Some(Err(DispatchError::ConnectFailure(format!(
                "namespace refused: {}",
                data
            )))),
            _ => None,
        })
        .await?;

        self.emit(Packet::event(
            "joinChannel",
            json!({ "name": credentials.channel }),
        ))
        .await?;
        self.wait_for("channelOpts", |p| {
            matches!(p, Packet::Event { ref name, .. } if name == "channelOpts").then_some(Ok(()))
        })
        .await?;
        tracing::debug!(channel = %credentials.channel, "Joined channel");

        self.emit(Packet::event(
            "login",
            json!({ "name": credentials.username, "pw": credentials.password }),
        ))
        .await?;
        self.wait_for("login", |p| match p {
            Packet::Event { name, data } if name == "login" => Some(login_outcome(&data)),
            _ => None,
        })
        .await?;
        tracing::debug!(username = %credentials.username, "Logged in");

        Ok(())
    }

    pub async fn queue(&mut self, id: &str, settings: &CytubeConfig) -> Result<(), DispatchError> {
        self.emit(Packet::event(
            "queue",
            json!({
                "id": id,
                "type": settings.media_type,
                "pos": settings.position,
                "temp": settings.temporary,
            }),
        ))
        .await?;

        let id = id.to_string();
        self.wait_for("queue response", move |p| match p {
            Packet::Event { name, data } => queue_outcome(&id, &name, &data),
            _ => None,
        })
        .await
    }

    /// Leave the namespace and close the socket. Errors are ignored; there
    /// is nothing left to deliver.
    pub async fn close(mut self) {
        if let Err(e) = self.emit(Packet::Disconnect).await {
            tracing::debug!("Disconnect not sent: {}", e);
        }
        self.transport.close().await;
    }

    async fn emit(&mut self, packet: Packet) -> Result<(), DispatchError> {
        self.transport.send(packet.encode()).await
    }

    /// Next packet that needs attention, answering heartbeats on the way.
    async fn next_packet(&mut self) -> Result<Packet, DispatchError> {
        loop {
            let text = self.transport.recv().await?.ok_or_else(|| {
                DispatchError::ConnectFailure("server closed the connection".into())
            })?;

            match Packet::decode(&text) {
                Ok(Packet::Ping) => self.emit(Packet::Pong).await?,
                Ok(Packet::Pong) | Ok(Packet::Noop) => {}
                Ok(Packet::Close) | Ok(Packet::Disconnect) => {
                    return Err(DispatchError::ConnectFailure(
                        "server ended the session".into(),
                    ))
                }
                Ok(packet) => return Ok(packet),
                Err(e) => tracing::debug!("Skipping packet {:?}: {}", text, e),
            }
        }
    }

    /// Read packets until `accept` returns an outcome, bounded by the
    /// session timeout.
    async fn wait_for<R, F>(&mut self, what: &'static str, mut accept: F) -> Result<R, DispatchError>
    where
        F: FnMut(Packet) -> Option<Result<R, DispatchError>> + Send,
        R: Send,
    {
        let timeout = self.timeout;
        let wait = async {
            loop {
                let packet = self.next_packet().await?;
                if let Some(outcome) = accept(packet) {
                    return outcome;
                }
            }
        };

        tokio::time::timeout(timeout, wait)
            .await
            .map_err(|_| DispatchError::Timeout(what))?
    }
}

fn login_outcome(data: &Value) -> Result<(), DispatchError> {
    if data.get("success").and_then(Value::as_bool) == Some(true) {
        return Ok(());
    }

    let reason = data
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("login rejected");
    Err(DispatchError::AuthFailure(reason.to_string()))
}

/// Map a server event to the outcome of queueing `id`, or `None` when the
/// event concerns something else.
fn queue_outcome(id: &str, name: &str, data: &Value) -> Option<Result<(), DispatchError>> {
    match name {
        "queue" => {
            // Broadcast for every addition; skip other people's items.
            let queued = data.pointer("/item/media/id").and_then(Value::as_str);
            match queued {
                Some(other) if other != id => None,
                _ => Some(Ok(())),
            }
        }
        "queueWarn" => {
            let msg = data.get("msg").and_then(Value::as_str).unwrap_or_default();
            tracing::warn!(content_id = %id, "Queued with warning: {}", msg);
            Some(Ok(()))
        }
        "queueFail" => {
            if let Some(other) = data.get("id").and_then(Value::as_str) {
                if other != id {
                    return None;
                }
            }

            let msg = data
                .get("msg")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            if msg == ALREADY_ON_PLAYLIST {
                tracing::info!(content_id = %id, "Already on the playlist");
                return Some(Ok(()));
            }
            Some(Err(DispatchError::Rejected {
                id: id.to_string(),
                reason: msg.to_string(),
            }))
        }
        _ => None,
    }
}
