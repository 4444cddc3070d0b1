pub mod batch;
pub mod entry;
pub mod feed;

pub use batch::{NewContent, NewContentBatch};
pub use entry::FeedEntry;
pub use feed::{FeedSource, WatermarkRecord};
