use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{DocumentSource, HtmlSnapshot};
use crate::error::DocumentError;

/// Replays a recorded page as an ordered list of serialized DOM frames.
///
/// Every scroll advances to the next frame and sticks on the last one, which
/// mimics a feed that loads one wave of content per scroll. Sleeping is
/// instant.
#[derive(Debug, Clone)]
pub struct ReplayDocument {
    frames: Vec<String>,
    cursor: usize,
    scrolls: u32,
    scrolled_px: u64,
}

impl ReplayDocument {
    pub fn from_frames(frames: Vec<String>) -> Result<Self, DocumentError> {
        if frames.is_empty() {
            return Err(DocumentError::Unavailable("no frames to replay".into()));
        }
        Ok(Self {
            frames,
            cursor: 0,
            scrolls: 0,
            scrolled_px: 0,
        })
    }

    /// Load every `*.html` file in `dir`, ordered by file name.
    pub fn from_dir(dir: &Path) -> Result<Self, DocumentError> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "html"))
            .collect();
        paths.sort();

        let frames = paths
            .iter()
            .map(std::fs::read_to_string)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(dir = %dir.display(), frames = frames.len(), "loaded replay frames");
        Self::from_frames(frames)
    }

    pub fn scrolls(&self) -> u32 {
        self.scrolls
    }

    pub fn scrolled_px(&self) -> u64 {
        self.scrolled_px
    }

    pub fn frame_index(&self) -> usize {
        self.cursor
    }
}

#[async_trait]
impl DocumentSource for ReplayDocument {
    type Snapshot = HtmlSnapshot;

    async fn snapshot(&mut self) -> Result<HtmlSnapshot, DocumentError> {
        Ok(HtmlSnapshot::parse(&self.frames[self.cursor]))
    }

    async fn scroll_by(&mut self, px: u32) -> Result<(), DocumentError> {
        self.scrolls += 1;
        self.scrolled_px += u64::from(px);
        self.cursor = (self.cursor + 1).min(self.frames.len() - 1);
        Ok(())
    }

    async fn sleep(&mut self, _duration: Duration) {}
}
