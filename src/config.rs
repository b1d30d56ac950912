//! Configuration types for PDF-to-flipbook conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The builder validates eagerly: a bad
//! DPI or quality is rejected with [`FlipbookError::InvalidOption`] before a
//! single page is rendered or a single file is written.

use crate::error::FlipbookError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Highest accepted rendering DPI. A letter page at 1200 DPI is already
/// 10 200 × 13 200 px, roughly 540 MB as RGBA.
pub const MAX_DPI: u32 = 1200;

/// Default rendering DPI, matching print resolution.
pub const DEFAULT_DPI: u32 = 300;

/// Largest page worker pool accepted by the builder.
pub const MAX_CONCURRENCY: usize = 64;

/// Configuration for a PDF-to-flipbook conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf_flipbook::{ConversionConfig, PageFormat};
///
/// let config = ConversionConfig::builder()
///     .dpi(150)
///     .image_format(PageFormat::Png)
///     .concurrency(4)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 150);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Rendering DPI. Range: 1–1200. Default: 300.
    ///
    /// Pixel dimensions are `points × dpi / 72`, rounded to the nearest pixel,
    /// computed per page so mixed page sizes keep their proportions.
    pub dpi: u32,

    /// Image format for persisted pages. Default: JPEG.
    pub image_format: PageFormat,

    /// JPEG quality (1–100). Ignored for PNG. Default: 95.
    pub jpeg_quality: u8,

    /// Size of the worker pool that encodes and writes pages. Default: 1.
    ///
    /// Rendering itself stays sequential (pdfium is single-threaded); the
    /// encode step is where the CPU time goes. Pages are collected and
    /// sorted by ordinal, so the output does not depend on this value.
    pub concurrency: usize,

    /// What to do when the page count outgrows the filename padding.
    pub padding: PaddingPolicy,

    /// Viewer title. If None, the PDF's metadata title is used, then
    /// "PDF Flipbook".
    pub title: Option<String>,

    /// Viewer colour theme. Default: [`Theme::Classic`].
    pub theme: Theme,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Replace an existing destination instead of failing. Default: false.
    pub overwrite: bool,

    /// Receives per-stage progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            image_format: PageFormat::default(),
            jpeg_quality: 95,
            concurrency: 1,
            padding: PaddingPolicy::default(),
            title: None,
            theme: Theme::default(),
            password: None,
            overwrite: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("dpi", &self.dpi)
            .field("image_format", &self.image_format)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("concurrency", &self.concurrency)
            .field("padding", &self.padding)
            .field("title", &self.title)
            .field("theme", &self.theme)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("overwrite", &self.overwrite)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Check every constraint. Called by the builder and again by the
    /// pipeline, since the fields are public.
    pub fn validate(&self) -> Result<(), FlipbookError> {
        if self.dpi < 1 || self.dpi > MAX_DPI {
            return Err(FlipbookError::InvalidOption(format!(
                "DPI must be 1–{MAX_DPI}, got {}",
                self.dpi
            )));
        }
        if self.jpeg_quality < 1 || self.jpeg_quality > 100 {
            return Err(FlipbookError::InvalidOption(format!(
                "JPEG quality must be 1–100, got {}",
                self.jpeg_quality
            )));
        }
        if self.concurrency == 0 || self.concurrency > MAX_CONCURRENCY {
            return Err(FlipbookError::InvalidOption(format!(
                "Concurrency must be 1–{MAX_CONCURRENCY}, got {}",
                self.concurrency
            )));
        }
        if let Some(ref title) = self.title {
            if title.trim().is_empty() {
                return Err(FlipbookError::InvalidOption("Title must not be blank".into()));
            }
        }
        Ok(())
    }
}

/// Builder for [`ConversionConfig`].
///
/// Unlike a clamping builder, out-of-range values are kept as given so that
/// [`build`](Self::build) can reject them instead of silently changing them.
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn image_format(mut self, format: PageFormat) -> Self {
        self.config.image_format = format;
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn padding(mut self, policy: PaddingPolicy) -> Self {
        self.config.padding = policy;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.config.theme = theme;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn overwrite(mut self, v: bool) -> Self {
        self.config.overwrite = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, FlipbookError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Encoding used for page images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    /// Lossy, small; the source is already a raster sample. (default)
    #[default]
    Jpeg,
    /// Lossless, larger; useful for line art and diagrams.
    Png,
}

impl PageFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            PageFormat::Jpeg => "jpg",
            PageFormat::Png => "png",
        }
    }
}

/// Behaviour when the page count needs more digits than the default padding.
///
/// | Policy | 1000 pages, width 3 |
/// |--------|---------------------|
/// | `AutoWiden` | every page named `page0001` … `page1000` |
/// | `Reject` | [`FlipbookError::InvalidOption`] before rendering |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaddingPolicy {
    /// Widen the padding for the whole run. (default)
    #[default]
    AutoWiden,
    /// Fail fast with `InvalidOption`.
    Reject,
}

/// Viewer colour theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Purple gradient backdrop with a white page frame. (default)
    #[default]
    Classic,
    /// Charcoal backdrop with a dark page frame.
    Dark,
}

impl Theme {
    /// Name used as the `theme-*` body class.
    pub fn name(self) -> &'static str {
        match self {
            Theme::Classic => "classic",
            Theme::Dark => "dark",
        }
    }
}

/// Where the packaged flipbook goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// A directory tree holding `index.html`, `assets/` and `pages/`.
    Directory(PathBuf),
    /// A single `.zip` archive of that tree.
    Archive(PathBuf),
    /// The `.zip` bytes, returned in [`crate::ConversionOutput::archive`].
    Memory,
}

impl OutputTarget {
    /// The filesystem destination, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            OutputTarget::Directory(p) | OutputTarget::Archive(p) => Some(p),
            OutputTarget::Memory => None,
        }
    }
}
