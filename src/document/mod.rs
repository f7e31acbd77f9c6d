//! Document query adapter.
//!
//! Extraction never talks to a renderer directly. A [`DocumentSource`] hands
//! out immutable [`Snapshot`]s of the live page, and every heuristic reads
//! through the snapshot's query/attribute/text operations. Node handles borrow
//! from the snapshot that produced them, so a handle can't be carried into the
//! next poll tick.

pub mod html;
pub mod replay;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::DocumentError;

pub use html::HtmlSnapshot;
pub use replay::ReplayDocument;

/// Read-only view of the document at one point in time.
pub trait Snapshot {
    type Node<'a>: Copy + PartialEq
    where
        Self: 'a;

    /// All nodes in the document matching `selector`, in document order.
    fn query(&self, selector: &str) -> Result<Vec<Self::Node<'_>>, DocumentError>;

    /// Descendants of `scope` matching `selector`, in document order. `scope`
    /// itself is never included.
    fn query_in<'a>(
        &'a self,
        scope: Self::Node<'a>,
        selector: &str,
    ) -> Result<Vec<Self::Node<'a>>, DocumentError>;

    fn attribute<'a>(
        &'a self,
        node: Self::Node<'a>,
        name: &str,
    ) -> Result<Option<String>, DocumentError>;

    /// Rendered text of `node` and its descendants, whitespace-normalized.
    fn text<'a>(&'a self, node: Self::Node<'a>) -> Result<String, DocumentError>;
}

/// Live document that can be snapshotted, scrolled and waited on.
#[async_trait]
pub trait DocumentSource: Send {
    type Snapshot: Snapshot;

    async fn snapshot(&mut self) -> Result<Self::Snapshot, DocumentError>;

    async fn scroll_by(&mut self, px: u32) -> Result<(), DocumentError>;

    async fn sleep(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
