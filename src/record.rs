use serde::Serialize;

use crate::parser::extract::ExtractedPost;
use crate::parser::ItemTally;

/// One extracted feed post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub canonical_id: Option<String>,
    pub author_name: Option<String>,
    pub author_profile_url: Option<String>,
    pub author_photo_url: Option<String>,
    pub body_text: String,
    pub permalink_candidates: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessResult {
    pub converged: bool,
    pub genuine_count: usize,
    pub attempts: u32,
}

/// Everything one readiness cycle produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedScan {
    pub readiness: ReadinessResult,
    /// Classification counts for the snapshot the posts came from.
    pub tally: ItemTally,
    pub posts: Vec<ExtractedPost>,
}

impl FeedScan {
    pub fn records(&self) -> Vec<PostRecord> {
        self.posts.iter().map(|p| p.record.clone()).collect()
    }

    pub fn into_records(self) -> Vec<PostRecord> {
        self.posts.into_iter().map(|p| p.record).collect()
    }
}
