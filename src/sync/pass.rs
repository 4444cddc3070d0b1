use tracing::{debug, error, info};

use crate::app::Result;
use crate::dispatch::Dispatcher;
use crate::domain::FeedSource;
use crate::fetcher::ParallelFetcher;
use crate::store::WatermarkStore;
use crate::sync::engine::SyncEngine;
use crate::sync::seeder::{SeedReport, Seeder};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Delivery {
    /// Dispatch the batch, then advance watermarks.
    #[default]
    Live,
    /// Report the batch only. Nothing is dispatched or advanced.
    DryRun,
}

#[derive(Debug, Default)]
pub struct PassReport {
    pub seed: SeedReport,
    pub feeds_checked: usize,
    pub feeds_failed: usize,
    /// Content ids in dispatch order.
    pub batch: Vec<String>,
    pub delivered: bool,
    /// Ids the server refused, with its reason.
    pub rejected: Vec<(String, String)>,
    pub advanced: usize,
    pub advance_failures: usize,
}

/// One seed, sync and dispatch cycle over every feed.
pub struct Pass<'a, S: ?Sized, D: ?Sized> {
    store: &'a S,
    fetcher: &'a ParallelFetcher,
    dispatcher: &'a D,
}

impl<'a, S, D> Pass<'a, S, D>
where
    S: WatermarkStore + ?Sized,
    D: Dispatcher + ?Sized,
{
    pub fn new(store: &'a S, fetcher: &'a ParallelFetcher, dispatcher: &'a D) -> Self {
        Self {
            store,
            fetcher,
            dispatcher,
        }
    }

    /// Watermarks only move once the batch has been delivered. Items the
    /// server refuses do not hold the others back. A failed dispatch leaves
    /// every watermark untouched, so the same content is found again next run.
    pub async fn run(&self, sources: &[FeedSource], delivery: Delivery) -> Result<PassReport> {
        let seed = Seeder::new(self.fetcher)
            .seed_missing(self.store, sources)
            .await;

        let pass = SyncEngine::new(self.fetcher).collect(self.store).await?;
        for item in pass.batch.items() {
            debug!(feed_id = %item.feed_id, content_id = %item.content_id, "New content");
        }
        let batch = pass.batch.content_ids();
        info!(count = pass.batch.len(), "Content to add: {:?}", batch);

        let mut report = PassReport {
            seed,
            feeds_checked: pass.feeds_checked,
            feeds_failed: pass.feeds_failed,
            batch,
            ..PassReport::default()
        };

        if delivery == Delivery::DryRun {
            return Ok(report);
        }

        let delivered = match self.dispatcher.dispatch(&report.batch).await {
            Ok(delivered) => delivered,
            Err(e) => {
                error!(
                    pending = pass.advances.len(),
                    "Dispatch failed, watermarks left unchanged: {}", e
                );
                return Err(e.into());
            }
        };
        report.delivered = true;
        report.rejected = delivered.rejected;

        let commit = pass.commit(self.store);
        report.advanced = commit.advanced;
        report.advance_failures = commit.failed.len();

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tokio_test::{assert_err, assert_ok};

    use crate::app::{DispatchError, FeederError};
    use crate::dispatch::DispatchReport;
    use crate::store::SqliteStore;
    use crate::sync::engine::tests::{at, short, video, CountingStore, FakeFetcher};

    #[derive(Default)]
    struct RecordingDispatcher {
        batches: Mutex<Vec<Vec<String>>>,
        fail: bool,
        refuse: Option<&'static str>,
    }

    #[async_trait]
    impl Dispatcher for RecordingDispatcher {
        async fn dispatch(&self, ids: &[String]) -> std::result::Result<DispatchReport, DispatchError> {
            self.batches.lock().unwrap().push(ids.to_vec());
            if self.fail && !ids.is_empty() {
                return Err(DispatchError::ConnectFailure("refused".into()));
            }

            let mut report = DispatchReport::default();
            for id in ids {
                if self.refuse == Some(id.as_str()) {
                    report.rejected.push((id.clone(), "Video not found".into()));
                } else {
                    report.queued.push(id.clone());
                }
            }
            Ok(report)
        }
    }

    fn sources() -> Vec<FeedSource> {
        vec![FeedSource::new("a", "Alpha"), FeedSource::new("b", "Beta")]
    }

    #[tokio::test]
    async fn test_first_run_seeds_and_queues_nothing() {
        let store = SqliteStore::in_memory().unwrap();
        let fetcher = FakeFetcher::default()
            .with_page("a", vec![video("a3", 3), video("a2", 2)])
            .with_page("b", vec![short("b9", 9), video("b1", 1)]);
        let pool = ParallelFetcher::new(Arc::new(fetcher));
        let dispatcher = RecordingDispatcher::default();

        let report = Pass::new(&store, &pool, &dispatcher)
            .run(&sources(), Delivery::Live)
            .await
            .unwrap();

        assert_eq!(report.seed.seeded, 2);
        assert!(report.batch.is_empty());
        assert_eq!(report.advanced, 0);
        assert_eq!(store.get("b").unwrap().unwrap().last_seen, at(9));
    }

    #[tokio::test]
    async fn test_second_run_dispatches_then_advances() {
        let store = CountingStore::new();
        store.seed("a", "Alpha", at(2)).unwrap();
        store.seed("b", "Beta", at(1)).unwrap();
        let fetcher = FakeFetcher::default()
            .with_page("a", vec![video("a4", 4), video("a2", 2)])
            .with_page("b", vec![video("b3", 3), short("b2", 2), video("b1", 1)]);
        let pool = ParallelFetcher::new(Arc::new(fetcher));
        let dispatcher = RecordingDispatcher::default();

        let report = Pass::new(&store, &pool, &dispatcher)
            .run(&sources(), Delivery::Live)
            .await
            .unwrap();

        assert_eq!(report.batch, vec!["b3", "a4"]);
        assert!(report.delivered);
        assert_eq!(report.advanced, 2);
        assert_eq!(dispatcher.batches.lock().unwrap().clone(), vec![vec!["b3", "a4"]]);
        assert_eq!(store.get("a").unwrap().unwrap().last_seen, at(4));
        assert_eq!(store.advance_count("a"), 1);
        assert_eq!(store.advance_count("b"), 1);
    }

    #[tokio::test]
    async fn test_failed_dispatch_keeps_watermarks_for_retry() {
        let store = CountingStore::new();
        store.seed("a", "Alpha", at(1)).unwrap();
        let fetcher = FakeFetcher::default().with_page("a", vec![video("a2", 2)]);
        let pool = ParallelFetcher::new(Arc::new(fetcher));

        let failing = RecordingDispatcher {
            fail: true,
            ..RecordingDispatcher::default()
        };
        let err = assert_err!(
            Pass::new(&store, &pool, &failing)
                .run(&sources()[..1], Delivery::Live)
                .await
        );
        assert!(matches!(err, FeederError::Dispatch(DispatchError::ConnectFailure(_))));
        assert_eq!(store.advance_count("a"), 0);

        let working = RecordingDispatcher::default();
        let report = assert_ok!(
            Pass::new(&store, &pool, &working)
                .run(&sources()[..1], Delivery::Live)
                .await
        );
        assert_eq!(report.batch, vec!["a2"]);
        assert_eq!(store.get("a").unwrap().unwrap().last_seen, at(2));
    }

    #[tokio::test]
    async fn test_refused_item_does_not_block_other_feeds() {
        let store = CountingStore::new();
        store.seed("a", "Alpha", at(1)).unwrap();
        store.seed("b", "Beta", at(1)).unwrap();
        let fetcher = FakeFetcher::default()
            .with_page("a", vec![video("a3", 3), video("a2", 2)])
            .with_page("b", vec![video("b4", 4)]);
        let pool = ParallelFetcher::new(Arc::new(fetcher));
        let dispatcher = RecordingDispatcher {
            refuse: Some("a2"),
            ..RecordingDispatcher::default()
        };

        let report = assert_ok!(
            Pass::new(&store, &pool, &dispatcher)
                .run(&sources(), Delivery::Live)
                .await
        );

        assert_eq!(report.batch, vec!["a2", "a3", "b4"]);
        assert_eq!(report.rejected, vec![("a2".to_string(), "Video not found".to_string())]);
        assert_eq!(report.advanced, 2);
        assert_eq!(store.get("a").unwrap().unwrap().last_seen, at(3));
        assert_eq!(store.get("b").unwrap().unwrap().last_seen, at(4));

        let rerun = Pass::new(&store, &pool, &dispatcher)
            .run(&sources(), Delivery::Live)
            .await
            .unwrap();
        assert!(rerun.batch.is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_neither_dispatches_nor_advances() {
        let store = CountingStore::new();
        store.seed("a", "Alpha", at(1)).unwrap();
        let fetcher = FakeFetcher::default().with_page("a", vec![video("a2", 2)]);
        let pool = ParallelFetcher::new(Arc::new(fetcher));
        let dispatcher = RecordingDispatcher::default();

        let report = Pass::new(&store, &pool, &dispatcher)
            .run(&sources()[..1], Delivery::DryRun)
            .await
            .unwrap();

        assert_eq!(report.batch, vec!["a2"]);
        assert!(!report.delivered);
        assert!(dispatcher.batches.lock().unwrap().is_empty());
        assert_eq!(store.advance_count("a"), 0);
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let store = CountingStore::new();
        store.seed("a", "Alpha", at(1)).unwrap();
        let fetcher = FakeFetcher::default().with_page("a", vec![video("a3", 3), video("a2", 2)]);
        let pool = ParallelFetcher::new(Arc::new(fetcher));
        let dispatcher = RecordingDispatcher::default();
        let pass = Pass::new(&store, &pool, &dispatcher);

        let first = pass.run(&sources()[..1], Delivery::Live).await.unwrap();
        let second = pass.run(&sources()[..1], Delivery::Live).await.unwrap();

        assert_eq!(first.batch, vec!["a2", "a3"]);
        assert!(second.batch.is_empty());
        assert_eq!(store.advance_count("a"), 1);
    }
}
