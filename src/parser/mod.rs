pub mod classify;
pub mod extract;

use serde::Serialize;
use tracing::warn;

use crate::config::Settings;
use crate::document::Snapshot;
use crate::error::DocumentError;
use classify::ItemKind;
use extract::ExtractedPost;

/// Per-snapshot classification counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ItemTally {
    pub genuine: usize,
    pub placeholder: usize,
    pub comment: usize,
    /// Candidates whose classification failed on an adapter error.
    pub skipped: usize,
}

impl ItemTally {
    fn record(&mut self, kind: Option<ItemKind>) {
        match kind {
            Some(ItemKind::Genuine) => self.genuine += 1,
            Some(ItemKind::Placeholder) => self.placeholder += 1,
            Some(ItemKind::Comment) => self.comment += 1,
            None => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.genuine + self.placeholder + self.comment + self.skipped
    }
}

/// Candidate item with its classification; `None` when it was skipped.
#[derive(Debug, Clone, Copy)]
pub struct SurveyItem<N> {
    pub node: N,
    pub kind: Option<ItemKind>,
}

#[derive(Debug, Clone)]
pub struct Survey<N> {
    pub items: Vec<SurveyItem<N>>,
    pub tally: ItemTally,
}

impl<N: Copy> Survey<N> {
    pub fn genuine(&self) -> impl Iterator<Item = N> + '_ {
        self.items
            .iter()
            .filter(|item| item.kind == Some(ItemKind::Genuine))
            .map(|item| item.node)
    }
}

/// Classify every candidate item in the snapshot. Only the top-level query
/// can fail; a node that errors during classification is counted as skipped.
pub fn survey<'a, S: Snapshot>(
    snap: &'a S,
    settings: &Settings,
) -> Result<Survey<S::Node<'a>>, DocumentError> {
    let nodes = snap.query(&settings.feed.item_selector)?;
    let mut tally = ItemTally::default();
    let mut items = Vec::with_capacity(nodes.len());

    for (idx, node) in nodes.into_iter().enumerate() {
        let kind = match classify::classify(snap, node, &settings.classifier) {
            Ok(kind) => Some(kind),
            Err(e) => {
                warn!(item = idx, error = %e, "skipping unreadable feed item");
                None
            }
        };
        tally.record(kind);
        items.push(SurveyItem { node, kind });
    }

    Ok(Survey { items, tally })
}

/// Extract records from the genuine items of an already-classified snapshot.
pub fn extract_surveyed<'a, S: Snapshot>(
    snap: &'a S,
    survey: &Survey<S::Node<'a>>,
    settings: &Settings,
) -> Vec<ExtractedPost> {
    survey
        .genuine()
        .map(|node| extract::extract_post(snap, node, &settings.feed.item_selector))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub tally: ItemTally,
    pub posts: Vec<ExtractedPost>,
}

/// One full extraction pass over a snapshot: classify, then extract every
/// genuine item in document order.
pub fn extract_posts<S: Snapshot>(snap: &S, settings: &Settings) -> Result<Extraction, DocumentError> {
    let survey = survey(snap, settings)?;
    let posts = extract_surveyed(snap, &survey, settings);
    Ok(Extraction {
        tally: survey.tally,
        posts,
    })
}
