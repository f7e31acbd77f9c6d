use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::{attr, descendants, first_hit, text, ItemScope};
use crate::document::Snapshot;

static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:Post|Story) by (.+?)(?: on| at| \d|,|$)").expect("valid regex")
});
static USER_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/user/\d+").expect("valid regex"));
static PROFILE_PHP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?profile\.php)\?(?:[^#]*&)?id=(\d+)").expect("valid regex")
});
static HANDLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://(?:[\w-]+\.)*facebook\.com)?/([A-Za-z0-9][\w.-]*)/?(?:[?#].*)?$")
        .expect("valid regex")
});

const HEADING_LINK_SELECTOR: &str = "h1 a[href], h2 a[href], h3 a[href], h4 a[href]";
const EMPHASIS_SELECTOR: &str = "strong, b";
const IMAGE_SELECTOR: &str = "img[src], image";

/// Top-level paths that look like handles but aren't people.
const RESERVED_HANDLES: &[&str] = &[
    "bookmarks", "events", "friends", "gaming", "groups", "hashtag", "help", "home",
    "login", "marketplace", "media", "memories", "messages", "notifications", "pages",
    "photo", "photos", "policies", "privacy", "reel", "reels", "saved", "search",
    "settings", "share", "stories", "videos", "watch",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorStrategy {
    AccessibleLabel,
    HeadingLink,
    AnchorLabel,
    EmphasizedLink,
}

impl AuthorStrategy {
    pub fn rank(self) -> u8 {
        match self {
            Self::AccessibleLabel => 1,
            Self::HeadingLink => 2,
            Self::AnchorLabel => 3,
            Self::EmphasizedLink => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileUrlSource {
    /// The anchor the winning name strategy read from.
    NameAnchor,
    /// First profile-shaped anchor in the item.
    FirstProfileAnchor,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorFields {
    pub name: Option<String>,
    pub profile_url: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthorProvenance {
    pub name: Option<AuthorStrategy>,
    pub profile_url: Option<ProfileUrlSource>,
    /// Bold-link candidate, kept even when a stronger strategy won.
    pub emphasized_candidate: Option<String>,
}

#[derive(Debug, Clone)]
struct NameHit {
    name: String,
    href: Option<String>,
}

pub(crate) fn extract<'a, S: Snapshot>(item: &ItemScope<'a, S>) -> (AuthorFields, AuthorProvenance) {
    let (snap, node) = (item.snap, item.node);
    let profile_anchors: Vec<(S::Node<'a>, String)> = item
        .own("a[href]")
        .into_iter()
        .filter_map(|a| attr(snap, a, "href").map(|href| (a, href)))
        .filter(|(_, href)| is_profile_url(href))
        .collect();

    let by_label = || from_accessible_label(snap, node);
    let by_heading = || from_heading_links(item);
    let by_anchor_label = || from_anchor_labels(snap, &profile_anchors);
    let ladder: [(AuthorStrategy, &dyn Fn() -> Option<NameHit>); 3] = [
        (AuthorStrategy::AccessibleLabel, &by_label),
        (AuthorStrategy::HeadingLink, &by_heading),
        (AuthorStrategy::AnchorLabel, &by_anchor_label),
    ];

    let emphasized = from_emphasized_link(item);
    let winner = first_hit(&ladder)
        .or_else(|| emphasized.clone().map(|hit| (AuthorStrategy::EmphasizedLink, hit)));

    let mut fields = AuthorFields::default();
    let mut prov = AuthorProvenance {
        emphasized_candidate: emphasized.map(|hit| hit.name),
        ..Default::default()
    };

    let winning_href = match winner {
        Some((strategy, hit)) => {
            fields.name = Some(hit.name);
            prov.name = Some(strategy);
            hit.href.filter(|href| is_profile_url(href))
        }
        None => None,
    };

    if let Some(href) = winning_href {
        fields.profile_url = Some(normalize_profile_url(&href));
        prov.profile_url = Some(ProfileUrlSource::NameAnchor);
    } else if let Some((_, href)) = profile_anchors.first() {
        fields.profile_url = Some(normalize_profile_url(href));
        prov.profile_url = Some(ProfileUrlSource::FirstProfileAnchor);
    }

    fields.photo_url = profile_anchors
        .iter()
        .find_map(|(anchor, _)| first_image(snap, *anchor));

    (fields, prov)
}

fn from_accessible_label<'a, S: Snapshot>(snap: &'a S, node: S::Node<'a>) -> Option<NameHit> {
    let label = attr(snap, node, "aria-label")?;
    let caps = LABEL_RE.captures(label.trim())?;
    Some(NameHit {
        name: valid_name(&caps[1])?,
        href: None,
    })
}

fn from_heading_links<'a, S: Snapshot>(item: &ItemScope<'a, S>) -> Option<NameHit> {
    let snap = item.snap;
    item.own(HEADING_LINK_SELECTOR)
        .into_iter()
        .find_map(|anchor| {
            let href = attr(snap, anchor, "href").filter(|h| is_profile_url(h))?;
            let name = valid_name(&text(snap, anchor)?)?;
            Some(NameHit {
                name,
                href: Some(href),
            })
        })
}

fn from_anchor_labels<'a, S: Snapshot>(
    snap: &'a S,
    anchors: &[(S::Node<'a>, String)],
) -> Option<NameHit> {
    anchors.iter().find_map(|(anchor, href)| {
        let name = valid_name(&attr(snap, *anchor, "aria-label")?)?;
        Some(NameHit {
            name,
            href: Some(href.clone()),
        })
    })
}

fn from_emphasized_link<'a, S: Snapshot>(item: &ItemScope<'a, S>) -> Option<NameHit> {
    let snap = item.snap;
    item.own(EMPHASIS_SELECTOR)
        .into_iter()
        .find_map(|strong| {
            let link = descendants(snap, strong, "a[href]").into_iter().next()?;
            let name = valid_name(&text(snap, strong)?)?;
            Some(NameHit {
                name,
                href: attr(snap, link, "href"),
            })
        })
}

fn first_image<'a, S: Snapshot>(snap: &'a S, anchor: S::Node<'a>) -> Option<String> {
    descendants(snap, anchor, IMAGE_SELECTOR)
        .into_iter()
        .find_map(|img| {
            attr(snap, img, "src")
                .or_else(|| attr(snap, img, "href"))
                .or_else(|| attr(snap, img, "xlink:href"))
                .filter(|src| !src.trim().is_empty())
        })
}

/// Names must be 2..=99 characters after trimming.
fn valid_name(raw: &str) -> Option<String> {
    let name = raw.trim();
    let len = name.chars().count();
    (len > 1 && len < 100).then(|| name.to_string())
}

/// `/user/<id>`, `profile.php?id=<id>`, or a bare `facebook.com/<handle>`.
pub fn is_profile_url(href: &str) -> bool {
    if USER_PATH_RE.is_match(href) || PROFILE_PHP_RE.is_match(href) {
        return true;
    }
    HANDLE_RE.captures(href).is_some_and(|caps| {
        let handle = caps[1].to_lowercase();
        !handle.ends_with(".php") && !RESERVED_HANDLES.contains(&handle.as_str())
    })
}

/// Drop tracking query/fragment; `profile.php` keeps only its `id`.
pub fn normalize_profile_url(href: &str) -> String {
    if let Some(caps) = PROFILE_PHP_RE.captures(href) {
        return format!("{}?id={}", &caps[1], &caps[2]);
    }
    href.split(['?', '#']).next().unwrap_or(href).to_string()
}
