use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub feed: FeedSettings,
    pub classifier: ClassifierSettings,
    pub poller: PollerSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    /// Selector for candidate feed items.
    pub item_selector: String,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            item_selector: r#"[role="article"]"#.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    /// Rendered text must be strictly longer than this to count as genuine.
    pub min_genuine_chars: usize,
    /// Treat short items as genuine when they carry both a permalink and a
    /// profile link.
    pub promote_linked_short_items: bool,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            min_genuine_chars: 100,
            promote_linked_short_items: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerSettings {
    pub genuine_threshold: usize,
    pub max_attempts: u32,
    pub scroll_px: u32,
    pub interval_ms: u64,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            genuine_threshold: 3,
            max_attempts: 30,
            scroll_px: 800,
            interval_ms: 1500,
        }
    }
}

impl PollerSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Settings {
    /// Defaults, then an optional config file, then `FEED__*` env overrides
    /// (e.g. `FEED__POLLER__MAX_ATTEMPTS=10`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix("FEED")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
