pub mod sqlite;

use chrono::{DateTime, Utc};

use crate::app::StoreError;
use crate::domain::WatermarkRecord;

pub use sqlite::SqliteStore;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Durable last-seen timestamps, one row per feed.
pub trait WatermarkStore {
    fn get(&self, feed_id: &str) -> StoreResult<Option<WatermarkRecord>>;

    /// Insert the first watermark for a feed.
    ///
    /// Fails with [`StoreError::AlreadyExists`] if the feed already has one.
    fn seed(&self, feed_id: &str, name: &str, last_seen: DateTime<Utc>) -> StoreResult<()>;

    /// Move an existing watermark.
    ///
    /// Fails with [`StoreError::NotFound`] if the feed was never seeded.
    fn advance(&self, feed_id: &str, last_seen: DateTime<Utc>) -> StoreResult<()>;

    /// Every readable record. A row whose timestamp cannot be parsed is
    /// logged and left out so the other feeds still sync.
    fn all(&self) -> StoreResult<Vec<WatermarkRecord>>;
}
