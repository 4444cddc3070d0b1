use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::app::FetchError;
use crate::config::FeedsConfig;
use crate::domain::FeedEntry;
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;

pub struct HttpFetcher {
    client: Client,
    feeds: FeedsConfig,
    normalizer: Normalizer,
}

impl HttpFetcher {
    pub fn new(config: &FeedsConfig) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .user_agent(concat!("cytube-feeder/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            feeds: config.clone(),
            normalizer: Normalizer::from_config(config),
        })
    }

    fn network_error(feed_id: &str, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                feed_id: feed_id.to_string(),
            }
        } else {
            FetchError::NetworkFailure {
                feed_id: feed_id.to_string(),
                source: e,
            }
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, feed_id: &str) -> Result<Vec<FeedEntry>, FetchError> {
        let url = self.feeds.feed_url(feed_id);
        tracing::debug!(feed_id, %url, "Fetching feed");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Self::network_error(feed_id, e))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| Self::network_error(feed_id, e))?;

        self.normalizer.normalize(feed_id, &body)
    }
}
