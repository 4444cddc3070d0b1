use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::app::StoreError;
use crate::domain::{NewContent, NewContentBatch, WatermarkRecord};
use crate::fetcher::ParallelFetcher;
use crate::store::{StoreResult, WatermarkStore};
use crate::sync::scan::scan;

/// A watermark move that waits for the batch to be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAdvance {
    pub feed_id: String,
    pub name: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub new_items: usize,
}

/// Everything one pass found. Nothing has been written yet.
#[derive(Debug, Default)]
pub struct SyncPass {
    pub batch: NewContentBatch,
    pub advances: Vec<PendingAdvance>,
    pub feeds_checked: usize,
    pub feeds_failed: usize,
}

#[derive(Debug, Default)]
pub struct CommitReport {
    pub advanced: usize,
    pub failed: Vec<(String, StoreError)>,
}

impl SyncPass {
    /// Apply every pending advance once. Consumes the pass so it cannot be
    /// committed twice. A failed advance is logged and does not stop the rest.
    pub fn commit<S: WatermarkStore + ?Sized>(self, store: &S) -> CommitReport {
        let mut report = CommitReport::default();

        for advance in self.advances {
            match store.advance(&advance.feed_id, advance.to) {
                Ok(()) => {
                    info!(
                        feed_id = %advance.feed_id,
                        name = %advance.name,
                        from = %advance.from.to_rfc3339(),
                        to = %advance.to.to_rfc3339(),
                        "Advanced watermark"
                    );
                    report.advanced += 1;
                }
                Err(e) => {
                    error!(feed_id = %advance.feed_id, "Failed to advance watermark: {}", e);
                    report.failed.push((advance.feed_id, e));
                }
            }
        }

        report
    }
}

pub struct SyncEngine<'a> {
    fetcher: &'a ParallelFetcher,
}

impl<'a> SyncEngine<'a> {
    pub fn new(fetcher: &'a ParallelFetcher) -> Self {
        Self { fetcher }
    }

    /// Check every feed that has a watermark and gather what is new.
    ///
    /// Only a failure to list the watermarks aborts; a feed that can't be
    /// fetched or parsed just contributes nothing.
    pub async fn collect<S: WatermarkStore + ?Sized>(&self, store: &S) -> StoreResult<SyncPass> {
        let records = store.all()?;
        let sources: Vec<_> = records.iter().map(WatermarkRecord::source).collect();

        // Fetches may overlap; everything below runs after all of them settle.
        let results = self.fetcher.fetch_all(sources).await;

        let mut pass = SyncPass {
            feeds_checked: records.len(),
            ..SyncPass::default()
        };

        for (record, (_, result)) in records.iter().zip(results) {
            info!(feed_id = %record.feed_id, name = %record.name, "Checking for new content");

            let entries = match result {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(feed_id = %record.feed_id, "Skipping feed this pass: {}", e);
                    pass.feeds_failed += 1;
                    continue;
                }
            };

            let outcome = scan(&entries, record);
            let Some(to) = outcome.new_watermark else {
                info!(name = %record.name, "No new content");
                continue;
            };

            info!(
                name = %record.name,
                count = outcome.new_entries.len(),
                skipped = outcome.skipped,
                "Found new content"
            );

            pass.advances.push(PendingAdvance {
                feed_id: record.feed_id.clone(),
                name: record.name.clone(),
                from: record.last_seen,
                to,
                new_items: outcome.new_entries.len(),
            });
            pass.batch
                .extend(outcome.new_entries.into_iter().map(|entry| NewContent {
                    feed_id: record.feed_id.clone(),
                    content_id: entry.content_id,
                    published: entry.published,
                }));
        }

        pass.batch.sort_chronologically();
        Ok(pass)
    }
}
