//! # pdf-flipbook
//!
//! Convert PDF documents into self-contained, offline HTML flipbooks.
//!
//! Each page is rasterised with pdfium, saved as a zero-padded image
//! (`pages/page001.jpg`, …) and wrapped in a small page-turn viewer. The
//! result opens straight from disk: every reference is relative and nothing
//! is fetched from the network.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     path or bytes, `%PDF` header check
//!  ├─ 2. Render    rasterise pages via pdfium (points × DPI / 72)
//!  ├─ 3. Sequence  encode JPEG/PNG and write pages/pageNNN.* on a worker pool
//!  ├─ 4. Viewer    fill index.html + flipbook.css + flipbook.js for N pages
//!  └─ 5. Package   verify, then publish a directory or a .zip
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_flipbook::{convert, ConversionConfig, OutputTarget};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder().dpi(150).build()?;
//!     let output = convert(
//!         "document.pdf",
//!         OutputTarget::Archive("document.zip".into()),
//!         &config,
//!     )
//!     .await?;
//!     eprintln!(
//!         "{} pages, {} bytes",
//!         output.stats.page_count,
//!         output.stats.archive_bytes.unwrap_or_default()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Output Layout
//!
//! ```text
//! index.html
//! assets/css/flipbook.css
//! assets/js/flipbook.js
//! pages/page001.jpg … pageNNN.jpg
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2flipbook` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf-flipbook = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod viewer;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionConfig, ConversionConfigBuilder, OutputTarget, PaddingPolicy, PageFormat, Theme,
};
pub use convert::{convert, convert_sync, convert_with, inspect, inspect_with};
pub use error::{ErrorKind, FlipbookError};
pub use output::{
    ConversionOutput, ConversionStats, DocumentMetadata, ManifestEntry, PageFile, PageSize,
};
pub use pipeline::input::PdfSource;
pub use pipeline::render::{PdfiumRasterizer, RasterDocument, Rasterizer, RenderedPage};
pub use pipeline::sequence::PageNaming;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use viewer::{ViewerBundle, ViewerOptions, ViewerTemplater};
