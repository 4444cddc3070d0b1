use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::app::FetchError;
use crate::domain::{FeedEntry, FeedSource};
use crate::fetcher::Fetcher;

pub const DEFAULT_WORKERS: usize = 1;

pub type FetchOutcome = (FeedSource, Result<Vec<FeedEntry>, FetchError>);

/// Fetches many feeds with at most `workers` requests in flight.
pub struct ParallelFetcher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    semaphore: Arc<Semaphore>,
}

impl ParallelFetcher {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self::with_workers(fetcher, DEFAULT_WORKERS)
    }

    pub fn with_workers(fetcher: Arc<dyn Fetcher + Send + Sync>, workers: usize) -> Self {
        Self {
            fetcher,
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Results are returned in the order of `sources`, whatever order the
    /// requests finish in.
    pub async fn fetch_all(&self, sources: Vec<FeedSource>) -> Vec<FetchOutcome> {
        let tasks = sources.into_iter().map(|source| {
            let fetcher = self.fetcher.clone();
            let semaphore = self.semaphore.clone();

            async move {
                let _permit = semaphore.acquire().await;
                let result = fetcher.fetch(&source.id).await;
                (source, result)
            }
        });

        join_all(tasks).await
    }
}
