use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::record::FeedScan;

/// On-disk diagnostic artifact for one scan.
#[derive(Debug, Serialize)]
pub struct ScanDump<'a> {
    pub label: &'a str,
    pub captured_at: DateTime<Utc>,
    #[serde(flatten)]
    pub scan: &'a FeedScan,
}

/// Write `scan` as pretty JSON to `<dir>/<label>-<timestamp>.json`, creating
/// `dir` if needed. Returns the written path.
pub fn write_scan_dump(dir: &Path, label: &str, scan: &FeedScan) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let captured_at = Utc::now();
    let path = dir.join(format!(
        "{}-{}.json",
        sanitize(label),
        captured_at.format("%Y%m%dT%H%M%S%.3fZ")
    ));

    let dump = ScanDump {
        label,
        captured_at,
        scan,
    };
    std::fs::write(&path, serde_json::to_vec_pretty(&dump)?)?;
    info!(path = %path.display(), posts = scan.posts.len(), "wrote scan dump");
    Ok(path)
}

fn sanitize(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "scan".to_string()
    } else {
        cleaned
    }
}
