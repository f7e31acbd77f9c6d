pub mod author;
pub mod body;
pub mod ids;

use serde::Serialize;
use tracing::debug;

use crate::document::Snapshot;
use crate::record::PostRecord;

use author::AuthorProvenance;
use body::BodyProvenance;
use ids::IdProvenance;

/// Which strategy produced each field of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provenance {
    pub author: AuthorProvenance,
    pub body: BodyProvenance,
    pub id: IdProvenance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedPost {
    pub record: PostRecord,
    pub provenance: Provenance,
}

/// Run every field extractor over one genuine item. Content inside a nested
/// item (anything under `node` matching `item_selector`) is not read.
pub fn extract_post<'a, S: Snapshot>(
    snap: &'a S,
    node: S::Node<'a>,
    item_selector: &str,
) -> ExtractedPost {
    let item = ItemScope::new(snap, node, item_selector);
    let (author, author_prov) = author::extract(&item);
    let (body_text, body_prov) = body::extract(&item);
    let (ids, id_prov) = ids::extract(&item);

    ExtractedPost {
        record: PostRecord {
            canonical_id: ids.canonical_id,
            author_name: author.name,
            author_profile_url: author.profile_url,
            author_photo_url: author.photo_url,
            body_text,
            permalink_candidates: ids.permalink_candidates,
        },
        provenance: Provenance {
            author: author_prov,
            body: body_prov,
            id: id_prov,
        },
    }
}

/// One feed item as seen by the field extractors. Nested items (reply
/// threads, embedded comments) belong to someone else, so their subtrees are
/// cut out of every query made through [`ItemScope::own`].
pub(crate) struct ItemScope<'a, S: Snapshot + 'a> {
    pub(crate) snap: &'a S,
    pub(crate) node: S::Node<'a>,
    nested: Vec<S::Node<'a>>,
}

impl<'a, S: Snapshot + 'a> ItemScope<'a, S> {
    pub(crate) fn new(snap: &'a S, node: S::Node<'a>, item_selector: &str) -> Self {
        let nested = descendants(snap, node, item_selector);
        Self { snap, node, nested }
    }

    /// Descendants of the item matching `selector`, minus nested items and
    /// everything inside them.
    pub(crate) fn own(&self, selector: &str) -> Vec<S::Node<'a>> {
        let hits = descendants(self.snap, self.node, selector);
        if self.nested.is_empty() {
            return hits;
        }
        let foreign: Vec<S::Node<'a>> = self
            .nested
            .iter()
            .flat_map(|&inner| std::iter::once(inner).chain(descendants(self.snap, inner, selector)))
            .collect();
        hits.into_iter().filter(|hit| !foreign.contains(hit)).collect()
    }
}

/// Evaluate strategies in order and stop at the first one that yields a value.
pub(crate) fn first_hit<K: Copy, T>(ladder: &[(K, &dyn Fn() -> Option<T>)]) -> Option<(K, T)> {
    ladder
        .iter()
        .find_map(|(key, strategy)| strategy().map(|hit| (*key, hit)))
}

// Field extractors never fail: an adapter error on a node read degrades to
// a missing value.

pub(crate) fn descendants<'a, S: Snapshot>(
    snap: &'a S,
    node: S::Node<'a>,
    selector: &str,
) -> Vec<S::Node<'a>> {
    snap.query_in(node, selector).unwrap_or_else(|e| {
        debug!(selector, error = %e, "query failed, treating as no match");
        Vec::new()
    })
}

pub(crate) fn attr<'a, S: Snapshot>(snap: &'a S, node: S::Node<'a>, name: &str) -> Option<String> {
    snap.attribute(node, name).unwrap_or_else(|e| {
        debug!(name, error = %e, "attribute read failed");
        None
    })
}

pub(crate) fn text<'a, S: Snapshot>(snap: &'a S, node: S::Node<'a>) -> Option<String> {
    snap.text(node)
        .map_err(|e| debug!(error = %e, "text read failed"))
        .ok()
}
