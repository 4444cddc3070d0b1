//! Incremental sync: bootstrap watermarks, find new content, and move
//! watermarks once that content is delivered.

pub mod engine;
pub mod pass;
pub mod scan;
pub mod seeder;

pub use engine::{CommitReport, PendingAdvance, SyncEngine, SyncPass};
pub use pass::{Delivery, Pass, PassReport};
pub use scan::{scan, ScanOutcome, Step};
pub use seeder::{SeedReport, Seeder};
