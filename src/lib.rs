//! # cytube-feeder
//!
//! Watches a list of YouTube channels and queues their new uploads into a
//! CyTube channel. Each run is a single pass.
//!
//! ## Architecture
//!
//! ```text
//! Channel list → Seeder ─┐
//!                        ├→ Store (watermarks)
//! Fetcher → Normalizer → SyncEngine → Dispatcher → commit
//! ```
//!
//! A channel's watermark is the publish time of the newest video already
//! handled. Only videos strictly newer than it are queued, oldest first,
//! and the watermark moves once the queue has accepted them.
//!
//! ## Quick Start
//!
//! ```bash
//! # Record where each listed channel is today
//! cytube-feeder seed
//!
//! # See what would be queued
//! cytube-feeder run --dry-run
//!
//! # Queue it (default command)
//! cytube-feeder
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together config,
/// store and fetcher.
pub mod app;

/// Command-line interface using clap.
///
/// - `run [--dry-run]` - One seed, sync and queue pass (default)
/// - `seed` - Only record watermarks for new channels
/// - `list` - Show stored watermarks
pub mod cli;

/// Configuration from `~/.config/cytube-feeder/config.toml` and the
/// CyTube credentials from the environment.
pub mod config;

/// Queue delivery over the CyTube Socket.IO interface.
pub mod dispatch;

/// Core domain models.
///
/// - [`FeedSource`](domain::FeedSource): A channel from the channel list
/// - [`WatermarkRecord`](domain::WatermarkRecord): Persisted last-seen time
/// - [`FeedEntry`](domain::FeedEntry): One parsed upload
/// - [`NewContentBatch`](domain::NewContentBatch): What a pass will queue
pub mod domain;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for feed fetching
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
/// - [`ParallelFetcher`](fetcher::ParallelFetcher): Bounded concurrent fetching
pub mod fetcher;

/// Atom parsing into [`FeedEntry`](domain::FeedEntry) values.
pub mod normalizer;

pub mod seedlist;

/// SQLite persistence of watermarks.
///
/// - [`WatermarkStore`](store::WatermarkStore): Storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;

/// Seeding, scanning and the per-run pass.
pub mod sync;
