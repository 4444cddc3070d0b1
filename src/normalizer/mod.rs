use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::FetchError;
use crate::config::FeedsConfig;
use crate::domain::FeedEntry;

/// Turns a raw feed document into entries, in document order.
#[derive(Debug, Clone)]
pub struct Normalizer {
    exclude_marker: String,
    content_id_prefix: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::from_config(&FeedsConfig::default())
    }
}

impl Normalizer {
    pub fn new(exclude_marker: impl Into<String>, content_id_prefix: impl Into<String>) -> Self {
        Self {
            exclude_marker: exclude_marker.into(),
            content_id_prefix: content_id_prefix.into(),
        }
    }

    pub fn from_config(config: &FeedsConfig) -> Self {
        Self::new(&config.exclude_marker, &config.content_id_prefix)
    }

    pub fn normalize(&self, feed_id: &str, body: &[u8]) -> Result<Vec<FeedEntry>, FetchError> {
        let parse_failure = |reason: String| FetchError::ParseFailure {
            feed_id: feed_id.to_string(),
            reason,
        };

        let feed = parser::parse(body).map_err(|e| parse_failure(e.to_string()))?;

        feed.entries
            .into_iter()
            .map(|entry| {
                let published = entry
                    .published
                    .or(entry.updated)
                    .ok_or_else(|| parse_failure(format!("entry {} has no timestamp", entry.id)))?;

                let content_id = entry
                    .id
                    .strip_prefix(self.content_id_prefix.as_str())
                    .unwrap_or(&entry.id)
                    .to_string();
                if content_id.is_empty() {
                    return Err(parse_failure("entry without an id".to_string()));
                }

                let title = entry
                    .title
                    .map(|t| decode_html_entities(&t.content).to_string())
                    .unwrap_or_default();

                Ok(FeedEntry::new(title, published, content_id).classify(&self.exclude_marker))
            })
            .collect()
    }
}
