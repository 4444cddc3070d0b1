use chrono::{DateTime, Utc};

/// One newly discovered entry, tagged with the feed it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContent {
    pub feed_id: String,
    pub content_id: String,
    pub published: DateTime<Utc>,
}

/// New content across every feed of a pass, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewContentBatch {
    items: Vec<NewContent>,
}

impl NewContentBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one feed's contribution, which must already be oldest first.
    pub fn extend(&mut self, items: impl IntoIterator<Item = NewContent>) {
        self.items.extend(items);
    }

    /// Order by publish time across feeds. Stable, so a feed's own order
    /// survives timestamp ties.
    pub fn sort_chronologically(&mut self) {
        self.items.sort_by_key(|c| c.published);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[NewContent] {
        &self.items
    }

    pub fn content_ids(&self) -> Vec<String> {
        self.items.iter().map(|c| c.content_id.clone()).collect()
    }
}
