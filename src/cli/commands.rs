use std::path::Path;

use crate::app::{AppContext, Result};
use crate::dispatch::{CytubeDispatcher, Dispatcher};
use crate::domain::FeedSource;
use crate::seedlist;
use crate::store::WatermarkStore;
use crate::sync::{Delivery, Pass, PassReport, SeedReport, Seeder};

fn load_channels(path: &Path) -> Result<Vec<FeedSource>> {
    let sources = seedlist::load(path)?;
    if sources.is_empty() {
        println!("No channels in {}", path.display());
    }
    Ok(sources)
}

/// One full pass: seed new channels, queue anything new, advance watermarks.
pub async fn run_pass(ctx: &AppContext, dry_run: bool) -> Result<()> {
    let dispatcher = CytubeDispatcher::from_env(ctx.config.cytube.clone())?;
    let delivery = if dry_run {
        Delivery::DryRun
    } else {
        Delivery::Live
    };

    let report = run_with(ctx, &dispatcher, delivery).await?;
    print_pass(&report, dry_run);
    Ok(())
}

async fn run_with<D: Dispatcher + ?Sized>(
    ctx: &AppContext,
    dispatcher: &D,
    delivery: Delivery,
) -> Result<PassReport> {
    let sources = load_channels(&ctx.config.channel_list_path())?;

    Pass::new(ctx.store.as_ref(), &ctx.parallel_fetcher, dispatcher)
        .run(&sources, delivery)
        .await
}

fn print_pass(report: &PassReport, dry_run: bool) {
    print_seed(&report.seed);

    if report.batch.is_empty() {
        println!("Nothing new in {} channels", report.feeds_checked);
    } else if dry_run {
        println!("Would queue {} videos:", report.batch.len());
        for id in &report.batch {
            println!("  {}", id);
        }
    } else {
        println!(
            "Queued {} videos",
            report.batch.len() - report.rejected.len()
        );
        for (id, reason) in &report.rejected {
            eprintln!("  refused {}: {}", id, reason);
        }
    }

    if report.feeds_failed > 0 {
        eprintln!("{} channels could not be checked", report.feeds_failed);
    }
    if report.advance_failures > 0 {
        eprintln!(
            "{} watermarks could not be saved; those videos may be queued again",
            report.advance_failures
        );
    }
}

fn print_seed(report: &SeedReport) {
    if report.seeded > 0 {
        println!("Seeded {} new channels", report.seeded);
    }
    if report.failed > 0 {
        eprintln!("{} channels could not be seeded, will retry", report.failed);
    }
}

/// Record watermarks for channels that have none, without queueing anything.
pub async fn seed(ctx: &AppContext) -> Result<()> {
    let sources = load_channels(&ctx.config.channel_list_path())?;

    let report = Seeder::new(&ctx.parallel_fetcher)
        .seed_missing(ctx.store.as_ref(), &sources)
        .await;

    print_seed(&report);
    println!(
        "Seed complete: {} seeded, {} already present, {} failed",
        report.seeded, report.already_present, report.failed
    );
    Ok(())
}

pub fn list_watermarks(ctx: &AppContext) -> Result<()> {
    let records = ctx.store.all()?;

    if records.is_empty() {
        println!("No channels");
        return Ok(());
    }

    for record in records {
        println!(
            "{}  {}\n  {}",
            record.last_seen.format("%Y-%m-%d %H:%M:%S"),
            record.name,
            record.feed_id
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::app::DispatchError;
    use crate::dispatch::DispatchReport;
    use crate::config::Config;
    use crate::fetcher::ParallelFetcher;
    use crate::sync::engine::tests::{at, video, FakeFetcher};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    #[async_trait]
    impl Dispatcher for Recorder {
        async fn dispatch(&self, ids: &[String]) -> std::result::Result<DispatchReport, DispatchError> {
            self.0.lock().unwrap().extend(ids.iter().cloned());
            Ok(DispatchReport {
                queued: ids.to_vec(),
                rejected: Vec::new(),
            })
        }
    }

    fn context(dir: &tempfile::TempDir, fetcher: FakeFetcher) -> AppContext {
        let list = dir.path().join("channel-ids.txt");
        std::fs::write(&list, "# Alpha\na\n\n# Beta\nb\n").unwrap();

        let mut config = Config::default();
        config.storage.channel_list = Some(list);
        let mut ctx = AppContext::in_memory(config).unwrap();
        ctx.parallel_fetcher = ParallelFetcher::new(Arc::new(fetcher));
        ctx
    }

    #[tokio::test]
    async fn test_run_reads_channel_list() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::default()
            .with_page("a", vec![video("a2", 2)])
            .with_page("b", vec![video("b1", 1)]);
        let ctx = context(&dir, fetcher);
        ctx.store.seed("a", "Alpha", at(1)).unwrap();
        let recorder = Recorder::default();

        let report = run_with(&ctx, &recorder, Delivery::Live).await.unwrap();

        assert_eq!(report.seed.seeded, 1);
        assert_eq!(report.seed.already_present, 1);
        assert_eq!(recorder.0.lock().unwrap().clone(), vec!["a2"]);
        assert_eq!(ctx.store.get("b").unwrap().unwrap().name, "Beta");
    }

    #[tokio::test]
    async fn test_missing_channel_list_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir, FakeFetcher::default());
        ctx.config.storage.channel_list = Some(dir.path().join("nope.txt"));

        let result = run_with(&ctx, &Recorder::default(), Delivery::Live).await;
        assert!(result.is_err());
    }
}
