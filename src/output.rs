//! Result types returned by the conversion entry points.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A persisted page image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFile {
    /// 1-based page number; dense and strictly increasing across a run.
    pub ordinal: usize,
    /// File name inside `pages/`, e.g. `page001.jpg`.
    pub file_name: String,
    /// Pixel width of the rendered page.
    pub width: u32,
    /// Pixel height of the rendered page.
    pub height: u32,
    /// Encoded size on disk.
    pub bytes: u64,
}

impl PageFile {
    /// Path relative to the flipbook root, always `/`-separated.
    pub fn relative_path(&self) -> String {
        format!("{}/{}", crate::pipeline::package::PAGES_DIR, self.file_name)
    }
}

/// One file of the packaged flipbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// `/`-separated path relative to the flipbook root.
    pub path: String,
    pub size: u64,
}

/// Timing and size statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    pub page_count: usize,
    /// Sum of every file in the flipbook (uncompressed).
    pub total_bytes: u64,
    /// Size of the `.zip`, when an archive was produced.
    pub archive_bytes: Option<u64>,
    pub render_duration_ms: u64,
    pub package_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Point size of one PDF page (1 pt = 1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width_pts: f32,
    pub height_pts: f32,
}

/// Document information read without rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub page_count: usize,
    pub page_sizes: Vec<PageSize>,
}

/// Everything a successful conversion produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Final directory or archive path; `None` for in-memory output.
    pub location: Option<PathBuf>,
    /// Title written into the viewer.
    pub title: String,
    /// One entry per page, in ordinal order.
    pub pages: Vec<PageFile>,
    /// Every file of the flipbook, in archive order.
    pub files: Vec<ManifestEntry>,
    pub stats: ConversionStats,
    /// The `.zip` bytes for [`crate::OutputTarget::Memory`].
    #[serde(skip)]
    pub archive: Option<Vec<u8>>,
}
