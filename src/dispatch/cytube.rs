use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::app::DispatchError;
use crate::config::{CytubeConfig, CytubeCredentials};
use crate::dispatch::session::QueueSession;
use crate::dispatch::transport::WsTransport;
use crate::dispatch::{DispatchReport, Dispatcher};

/// `GET /socketconfig/<channel>.json` response.
#[derive(Debug, Deserialize)]
pub struct SocketConfig {
    pub servers: Vec<SocketServer>,
}

#[derive(Debug, Deserialize)]
pub struct SocketServer {
    pub url: String,
    #[serde(default)]
    pub secure: bool,
}

impl SocketConfig {
    pub fn secure_server(&self) -> Option<&str> {
        self.servers
            .iter()
            .find(|s| s.secure)
            .map(|s| s.url.as_str())
    }
}

/// Queues content on a CyTube channel over Socket.IO.
pub struct CytubeDispatcher {
    client: Client,
    settings: CytubeConfig,
    credentials: Option<CytubeCredentials>,
}

impl CytubeDispatcher {
    /// Credentials are read from the environment on first use, so a pass
    /// with nothing to queue never needs them.
    pub fn from_env(settings: CytubeConfig) -> reqwest::Result<Self> {
        Self::build(settings, None)
    }

    pub fn with_credentials(
        settings: CytubeConfig,
        credentials: CytubeCredentials,
    ) -> reqwest::Result<Self> {
        Self::build(settings, Some(credentials))
    }

    fn build(
        settings: CytubeConfig,
        credentials: Option<CytubeCredentials>,
    ) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.response_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            settings,
            credentials,
        })
    }

    fn credentials(&self) -> Result<CytubeCredentials, DispatchError> {
        match self.credentials {
            Some(ref credentials) => Ok(credentials.clone()),
            None => Ok(CytubeCredentials::from_env()?),
        }
    }

    async fn discover(&self, credentials: &CytubeCredentials) -> Result<Url, DispatchError> {
        let config_url = socket_config_url(&credentials.base_url, &credentials.channel)?;
        tracing::debug!(url = %config_url, "Looking up socket server");

        let config: SocketConfig = self
            .client
            .get(config_url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| DispatchError::ConnectFailure(format!("{}: {}", config_url, e)))?
            .json()
            .await
            .map_err(|e| DispatchError::ConnectFailure(format!("bad socket config: {}", e)))?;

        let server = config.secure_server().ok_or_else(|| {
            DispatchError::ConnectFailure("no secure socket server advertised".into())
        })?;

        websocket_url(server)
    }
}

#[async_trait]
impl Dispatcher for CytubeDispatcher {
    async fn dispatch(&self, ids: &[String]) -> Result<DispatchReport, DispatchError> {
        if ids.is_empty() {
            return Ok(DispatchReport::default());
        }

        let credentials = self.credentials()?;
        let socket_url = self.discover(&credentials).await?;
        tracing::info!(server = %socket_url, channel = %credentials.channel, "Connecting");

        let transport = WsTransport::connect(&socket_url).await?;
        let mut session = QueueSession::new(
            transport,
            Duration::from_secs(self.settings.response_timeout_secs),
        );

        let result = session.run(&credentials, ids, &self.settings).await;
        session.close().await;
        result
    }
}

pub fn socket_config_url(base: &Url, channel: &str) -> Result<Url, DispatchError> {
    base.join(&format!("socketconfig/{}.json", channel))
        .map_err(|e| DispatchError::ConnectFailure(format!("bad channel URL: {}", e)))
}

/// Engine.IO v4 WebSocket endpoint for a server advertised as `http(s)://host:port`.
pub fn websocket_url(server: &str) -> Result<Url, DispatchError> {
    let mut url = Url::parse(server)
        .map_err(|e| DispatchError::ConnectFailure(format!("bad server URL {}: {}", server, e)))?;

    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => {
            return Err(DispatchError::ConnectFailure(format!(
                "unsupported server scheme {}",
                other
            )))
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| DispatchError::ConnectFailure(format!("cannot use {} for {}", scheme, server)))?;
    url.set_path("/socket.io/");
    url.set_query(Some("EIO=4&transport=websocket"));

    Ok(url)
}
