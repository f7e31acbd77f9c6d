use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{attr, ItemScope};
use crate::document::Snapshot;

/// Permalink targets longer than this are cut before matching.
pub const MAX_PERMALINK_CHARS: usize = 300;

const METADATA_ATTR: &str = "data-ft";
/// Metadata keys, strongest first.
const METADATA_KEYS: &[&str] = &["mf_story_key", "top_level_post_id"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdPattern {
    Posts,
    Permalink,
    StoryFbid,
    Pfbid,
}

/// Id patterns in precedence order. Reordering this table is all it takes to
/// change which encoding wins.
static ID_PATTERNS: LazyLock<Vec<(IdPattern, Regex)>> = LazyLock::new(|| {
    [
        (IdPattern::Posts, r"/posts/(\d+)"),
        (IdPattern::Permalink, r"/permalink/(\d+)"),
        (IdPattern::StoryFbid, r"story_fbid=(\d+)"),
        (IdPattern::Pfbid, r"(pfbid[0-9A-Za-z]+)"),
    ]
    .into_iter()
    .map(|(kind, pattern)| (kind, Regex::new(pattern).expect("valid regex")))
    .collect()
});

static PFBID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"pfbid[0-9A-Za-z]+").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "from", rename_all = "snake_case")]
pub enum IdSource {
    Metadata { key: &'static str },
    Pattern { pattern: IdPattern },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierFields {
    pub permalink_candidates: Vec<String>,
    pub canonical_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdProvenance {
    pub canonical_id: Option<IdSource>,
    /// Metadata attribute present but not valid JSON.
    pub metadata_malformed: bool,
}

pub(crate) fn extract<'a, S: Snapshot>(item: &ItemScope<'a, S>) -> (IdentifierFields, IdProvenance) {
    let (snap, node) = (item.snap, item.node);
    let mut prov = IdProvenance::default();

    let mut candidates: Vec<String> = Vec::new();
    for anchor in item.own("a[href]") {
        let Some(href) = attr(snap, anchor, "href") else {
            continue;
        };
        if !is_permalink(&href) {
            continue;
        }
        let bounded: String = href.chars().take(MAX_PERMALINK_CHARS).collect();
        if !candidates.contains(&bounded) {
            candidates.push(bounded);
        }
    }

    let from_metadata = match attr(snap, node, METADATA_ATTR) {
        Some(raw) => match metadata_id(&raw) {
            Ok(found) => found,
            Err(e) => {
                debug!(error = %e, "ignoring malformed item metadata");
                prov.metadata_malformed = true;
                None
            }
        },
        None => None,
    };

    let canonical_id = if let Some((key, id)) = from_metadata {
        prov.canonical_id = Some(IdSource::Metadata { key });
        Some(id)
    } else if let Some((pattern, id)) = id_from_permalinks(&candidates) {
        prov.canonical_id = Some(IdSource::Pattern { pattern });
        Some(id)
    } else {
        None
    };

    (
        IdentifierFields {
            permalink_candidates: candidates,
            canonical_id,
        },
        prov,
    )
}

/// Permalink-shaped targets: `/posts/`, `/permalink/`, `story_fbid=`, `pfbid…`.
pub fn is_permalink(href: &str) -> bool {
    href.contains("/posts/")
        || href.contains("/permalink/")
        || href.contains("story_fbid=")
        || PFBID_RE.is_match(href)
}

/// Pattern precedence is the outer loop, so a `/posts/` id anywhere beats a
/// `/permalink/` id on an earlier anchor.
pub fn id_from_permalinks(candidates: &[String]) -> Option<(IdPattern, String)> {
    ID_PATTERNS.iter().find_map(|(kind, re)| {
        candidates
            .iter()
            .find_map(|c| re.captures(c).map(|caps| (*kind, caps[1].to_string())))
    })
}

fn metadata_id(raw: &str) -> serde_json::Result<Option<(&'static str, String)>> {
    let value: Value = serde_json::from_str(raw)?;
    Ok(METADATA_KEYS.iter().find_map(|key| {
        let id = match value.get(*key)? {
            Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        Some((*key, id))
    }))
}
