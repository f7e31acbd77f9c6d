use serde::Serialize;

use super::extract::author::is_profile_url;
use super::extract::ids::is_permalink;
use crate::config::ClassifierSettings;
use crate::document::Snapshot;
use crate::error::DocumentError;

const LOADING_MARKER_SELECTOR: &str = r#"[data-visualcompletion="loading-state"]"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Placeholder,
    Comment,
    Genuine,
}

/// Classify one candidate feed item. First matching rule wins:
/// loading signal → placeholder, comment label → comment, enough rendered
/// text → genuine, anything else → placeholder.
pub fn classify<'a, S: Snapshot>(
    snap: &'a S,
    node: S::Node<'a>,
    opts: &ClassifierSettings,
) -> Result<ItemKind, DocumentError> {
    if is_loading(snap, node)? {
        return Ok(ItemKind::Placeholder);
    }

    if let Some(label) = snap.attribute(node, "aria-label")? {
        if label.to_lowercase().contains("comment") {
            return Ok(ItemKind::Comment);
        }
    }

    let text = snap.text(node)?;
    if text.chars().count() > opts.min_genuine_chars {
        return Ok(ItemKind::Genuine);
    }

    if opts.promote_linked_short_items && has_post_links(snap, node)? {
        return Ok(ItemKind::Genuine);
    }

    Ok(ItemKind::Placeholder)
}

fn is_loading<'a, S: Snapshot>(snap: &'a S, node: S::Node<'a>) -> Result<bool, DocumentError> {
    if snap.attribute(node, "data-visualcompletion")?.as_deref() == Some("loading-state") {
        return Ok(true);
    }
    if let Some(label) = snap.attribute(node, "aria-label")? {
        if is_loading_label(&label) {
            return Ok(true);
        }
    }
    if !snap.query_in(node, LOADING_MARKER_SELECTOR)?.is_empty() {
        return Ok(true);
    }
    for labelled in snap.query_in(node, "[aria-label]")? {
        if let Some(label) = snap.attribute(labelled, "aria-label")? {
            if is_loading_label(&label) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn is_loading_label(label: &str) -> bool {
    let label = label.trim().to_lowercase();
    label == "loading..." || label == "loading…"
}

/// Short posts (photo with a two-word caption) still link to both a
/// permalink and an author profile.
fn has_post_links<'a, S: Snapshot>(snap: &'a S, node: S::Node<'a>) -> Result<bool, DocumentError> {
    let mut permalink = false;
    let mut profile = false;
    for anchor in snap.query_in(node, "a[href]")? {
        let Some(href) = snap.attribute(anchor, "href")? else {
            continue;
        };
        permalink |= is_permalink(&href);
        profile |= is_profile_url(&href);
        if permalink && profile {
            return Ok(true);
        }
    }
    Ok(false)
}
