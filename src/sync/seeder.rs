use tracing::{error, info, warn};

use crate::app::StoreError;
use crate::domain::FeedSource;
use crate::fetcher::ParallelFetcher;
use crate::store::WatermarkStore;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub seeded: usize,
    pub already_present: usize,
    /// Fetch failed, feed was empty, or the insert failed. Retried next run.
    pub failed: usize,
}

/// Gives feeds without a watermark one, at their newest entry, so a
/// channel's back catalogue is never queued.
pub struct Seeder<'a> {
    fetcher: &'a ParallelFetcher,
}

impl<'a> Seeder<'a> {
    pub fn new(fetcher: &'a ParallelFetcher) -> Self {
        Self { fetcher }
    }

    pub async fn seed_missing<S: WatermarkStore + ?Sized>(
        &self,
        store: &S,
        sources: &[FeedSource],
    ) -> SeedReport {
        let mut report = SeedReport::default();
        let mut missing = Vec::new();

        for source in sources {
            match store.get(&source.id) {
                Ok(Some(_)) => report.already_present += 1,
                Ok(None) => missing.push(source.clone()),
                Err(e) => {
                    error!(feed_id = %source.id, "Could not read watermark: {}", e);
                    report.failed += 1;
                }
            }
        }

        if missing.is_empty() {
            return report;
        }
        info!(count = missing.len(), "Seeding new feeds");

        for (source, result) in self.fetcher.fetch_all(missing).await {
            let entries = match result {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(feed_id = %source.id, name = %source.name, "Could not seed: {}", e);
                    report.failed += 1;
                    continue;
                }
            };

            // Newest entry regardless of category.
            let Some(newest) = entries.first() else {
                warn!(feed_id = %source.id, name = %source.name, "Feed has no entries, not seeding yet");
                report.failed += 1;
                continue;
            };

            match store.seed(&source.id, &source.name, newest.published) {
                Ok(()) => {
                    info!(
                        feed_id = %source.id,
                        name = %source.name,
                        last_seen = %newest.published.to_rfc3339(),
                        "Seeded watermark"
                    );
                    report.seeded += 1;
                }
                Err(StoreError::AlreadyExists(_)) => {
                    info!(name = %source.name, "Already in DB, skipping");
                    report.already_present += 1;
                }
                Err(e) => {
                    error!(feed_id = %source.id, "Failed to seed watermark: {}", e);
                    report.failed += 1;
                }
            }
        }

        report
    }
}
