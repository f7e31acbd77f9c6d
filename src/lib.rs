//! Feed content discovery and extraction.
//!
//! Given a live or recorded document, decide when its feed has loaded enough
//! real posts, then pull structured [`PostRecord`]s out of it.

pub mod config;
pub mod document;
pub mod dump;
pub mod error;
pub mod parser;
pub mod poller;
pub mod record;

pub use config::Settings;
pub use document::{DocumentSource, HtmlSnapshot, ReplayDocument, Snapshot};
pub use error::{DocumentError, FeedError, Result};
pub use parser::classify::ItemKind;
pub use parser::extract::ExtractedPost;
pub use parser::{extract_posts, ItemTally};
pub use poller::ReadinessPoller;
pub use record::{FeedScan, PostRecord, ReadinessResult};

/// Wait for the feed in `doc` to converge, then extract its posts.
pub async fn scan_feed<D: DocumentSource>(doc: &mut D, settings: &Settings) -> Result<FeedScan> {
    ReadinessPoller::new(settings.clone()).run(doc).await
}
