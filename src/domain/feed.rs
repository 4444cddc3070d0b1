use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A feed named in the channel list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub id: String,
    pub name: String,
}

impl FeedSource {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// The last-seen boundary persisted for one feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatermarkRecord {
    pub feed_id: String,
    pub name: String,
    pub last_seen: DateTime<Utc>,
}

impl WatermarkRecord {
    pub fn source(&self) -> FeedSource {
        FeedSource::new(self.feed_id.clone(), self.name.clone())
    }

    /// Whether `published` lies strictly after the watermark.
    pub fn is_newer(&self, published: DateTime<Utc>) -> bool {
        published > self.last_seen
    }
}
