use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub title: String,
    pub published: DateTime<Utc>,
    pub content_id: String,
    /// Set when the title carries the exclusion marker.
    pub excluded: bool,
}

impl FeedEntry {
    pub fn new(
        title: impl Into<String>,
        published: DateTime<Utc>,
        content_id: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            published,
            content_id: content_id.into(),
            excluded: false,
        }
    }

    /// Flag the entry if its title contains `marker`, ignoring case.
    pub fn classify(mut self, marker: &str) -> Self {
        self.excluded = title_has_marker(&self.title, marker);
        self
    }
}

pub fn title_has_marker(title: &str, marker: &str) -> bool {
    if marker.is_empty() {
        return false;
    }
    title.to_lowercase().contains(&marker.to_lowercase())
}
