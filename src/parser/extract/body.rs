use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::{descendants, text, ItemScope};
use crate::document::Snapshot;

const BLOCK_SELECTOR: &str = r#"div[dir="auto"], span[dir="auto"]"#;
const MIN_BODY_CHARS: usize = 20;

/// Interactive affordances that are never post content.
static CHROME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:like|comment|share|reply|\d[\d.,]*[km]?\s+(?:likes?|comments?|shares?))$")
        .expect("valid regex")
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BodyProvenance {
    /// Encounter index of the winning block among all leaf blocks.
    pub block_index: Option<usize>,
    pub blocks_seen: usize,
    pub chrome_rejected: usize,
}

/// Longest leaf text block over 20 characters that isn't UI chrome. Ties go
/// to the block encountered first. Empty when nothing qualifies.
pub(crate) fn extract<'a, S: Snapshot>(item: &ItemScope<'a, S>) -> (String, BodyProvenance) {
    let snap = item.snap;
    let mut prov = BodyProvenance::default();
    let mut best: Option<String> = None;

    let leaves = item
        .own(BLOCK_SELECTOR)
        .into_iter()
        .filter(|block| descendants(snap, *block, BLOCK_SELECTOR).is_empty());

    for (idx, block) in leaves.enumerate() {
        prov.blocks_seen += 1;
        let Some(raw) = text(snap, block) else {
            continue;
        };
        let candidate = raw.trim();
        if is_chrome(candidate) {
            prov.chrome_rejected += 1;
            continue;
        }
        let len = candidate.chars().count();
        if len <= MIN_BODY_CHARS {
            continue;
        }
        if best
            .as_ref()
            .map_or(true, |current| len > current.chars().count())
        {
            prov.block_index = Some(idx);
            best = Some(candidate.to_string());
        }
    }

    (best.unwrap_or_default(), prov)
}

pub fn is_chrome(s: &str) -> bool {
    CHROME_RE.is_match(s.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::HtmlSnapshot;

    const ITEM: &str = r#"[role="article"]"#;

    fn body_of(html: &str) -> (String, BodyProvenance) {
        let snap = HtmlSnapshot::parse(html);
        let node = snap.query(ITEM).unwrap()[0];
        extract(&ItemScope::new(&snap, node, ITEM))
    }

    #[test]
    fn picks_longest_qualifying_block() {
        let html = r#"<div role="article">
            <span dir="auto">Jane Doe</span>
            <div dir="auto">Anyone know a good plumber near the library?</div>
            <div dir="auto">Short but over twenty chars</div>
            <span dir="auto">Like</span><span dir="auto">Comment</span></div>"#;
        let (body, prov) = body_of(html);
        assert_eq!(body, "Anyone know a good plumber near the library?");
        assert_eq!(prov.block_index, Some(1));
        assert_eq!(prov.blocks_seen, 5);
        assert_eq!(prov.chrome_rejected, 2);
    }

    #[test]
    fn tie_goes_to_first_block() {
        let html = r#"<div role="article">
            <div dir="auto">aaaaaaaaaaaaaaaaaaaaaaaaa</div>
            <div dir="auto">bbbbbbbbbbbbbbbbbbbbbbbbb</div></div>"#;
        assert_eq!(body_of(html).0, "aaaaaaaaaaaaaaaaaaaaaaaaa");
    }

    #[test]
    fn container_blocks_are_not_leaves() {
        let html = r#"<div role="article"><div dir="auto">
            <div dir="auto">First paragraph of the post body here.</div>
            <div dir="auto">Second one, which is quite a bit longer than the first.</div>
            </div></div>"#;
        assert_eq!(
            body_of(html).0,
            "Second one, which is quite a bit longer than the first."
        );
    }

    #[test]
    fn longer_nested_reply_is_not_the_body() {
        let html = r#"<div role="article">
            <div dir="auto">Street party moved to Sunday.</div>
            <div role="article" aria-label="Comment by Sam Lee">
              <div dir="auto">That works for us, we will bring the folding tables and chili.</div>
            </div></div>"#;
        let (body, prov) = body_of(html);
        assert_eq!(body, "Street party moved to Sunday.");
        assert_eq!(prov.blocks_seen, 1);
    }

    #[test]
    fn twenty_chars_is_not_enough() {
        let html = r#"<div role="article"><div dir="auto">exactly twenty chars</div></div>"#;
        let (body, prov) = body_of(html);
        assert_eq!(body, "");
        assert_eq!(prov.block_index, None);
    }

    #[test]
    fn chrome_vocabulary() {
        for s in ["Like", "comment", "SHARE", "Reply", "12 likes", "1 comment", "3.4K shares", "1,024 Comments"] {
            assert!(is_chrome(s), "{s}");
        }
        for s in ["Liked it", "Share the love with everyone", "likes", "Comments are closed"] {
            assert!(!is_chrome(s), "{s}");
        }
    }

    #[test]
    fn never_returns_bare_chrome() {
        let html = r#"<div role="article">
            <div dir="auto">Like</div><div dir="auto">Comment</div>
            <div dir="auto">Share</div><div dir="auto">Reply</div></div>"#;
        let (body, _) = body_of(html);
        assert!(!["like", "comment", "share", "reply"].contains(&body.to_lowercase().as_str()));
        assert!(body.is_empty());
    }
}
