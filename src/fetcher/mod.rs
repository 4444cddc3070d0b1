pub mod http_fetcher;
pub mod parallel;

use async_trait::async_trait;

use crate::app::FetchError;
use crate::domain::FeedEntry;

pub use http_fetcher::HttpFetcher;
pub use parallel::ParallelFetcher;

#[async_trait]
pub trait Fetcher {
    /// Fetch and parse one feed. Entries come back newest first.
    async fn fetch(&self, feed_id: &str) -> Result<Vec<FeedEntry>, FetchError>;
}
