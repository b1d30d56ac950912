//! PDF rasterisation: open a document and render its pages to bitmaps.
//!
//! Rendering sits behind two small traits. [`Rasterizer`] opens a document,
//! [`RasterDocument`] answers page-count questions and renders one page at a
//! time. The pipeline walks a document through [`RenderedPages`], a lazy,
//! single-pass iterator, so at most one batch of bitmaps is alive at once.
//! [`PdfiumRasterizer`] is the production backend; tests plug in synthetic
//! ones.
//!
//! ## Why points × DPI / 72?
//!
//! PDF page boxes are measured in points (1/72 inch). Each page is sized on
//! its own, so a landscape insert inside a portrait document keeps its
//! shape instead of being squeezed into the first page's dimensions.

use crate::error::FlipbookError;
use crate::output::{DocumentMetadata, PageSize};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info};

/// Points per inch in PDF user space.
pub const POINTS_PER_INCH: f64 = 72.0;

/// One rasterised page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// 1-based position in the source document.
    pub ordinal: usize,
    pub image: DynamicImage,
}

impl RenderedPage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Opens PDF bytes for rendering.
pub trait Rasterizer {
    /// Parse `pdf` into a renderable document.
    ///
    /// Fails with [`FlipbookError::SourceUnreadable`] (or a password error)
    /// when the bytes are not a well-formed PDF.
    fn open<'a>(&'a self, pdf: &'a [u8]) -> Result<Box<dyn RasterDocument + 'a>, FlipbookError>;
}

/// An opened document.
pub trait RasterDocument {
    fn page_count(&self) -> usize;

    /// Point size of the page at 0-based `index`.
    fn page_size(&self, index: usize) -> Result<PageSize, FlipbookError>;

    /// Render the page at 0-based `index` at `dpi`.
    fn render_page(&self, index: usize, dpi: u32) -> Result<RenderedPage, FlipbookError>;

    fn title(&self) -> Option<String> {
        None
    }

    fn author(&self) -> Option<String> {
        None
    }
}

/// Pixel dimensions for a page of `size` at `dpi`, rounded to the nearest
/// pixel and never below 1.
pub fn scaled_dimensions(size: PageSize, dpi: u32) -> (u32, u32) {
    let scale = f64::from(dpi) / POINTS_PER_INCH;
    let px = |pts: f32| (f64::from(pts) * scale).round().max(1.0) as u32;
    (px(size.width_pts), px(size.height_pts))
}

/// Lazy, ordered walk over every page of a document.
///
/// Yields pages in document order with dense 1-based ordinals. Restarting
/// means creating a new iterator, which renders again.
pub struct RenderedPages<'d> {
    document: &'d dyn RasterDocument,
    dpi: u32,
    next_index: usize,
    total: usize,
}

impl<'d> RenderedPages<'d> {
    pub fn new(document: &'d dyn RasterDocument, dpi: u32) -> Self {
        Self {
            document,
            dpi,
            next_index: 0,
            total: document.page_count(),
        }
    }
}

impl Iterator for RenderedPages<'_> {
    type Item = Result<RenderedPage, FlipbookError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_index >= self.total {
            return None;
        }
        let index = self.next_index;
        self.next_index += 1;

        let result = self.document.render_page(index, self.dpi).and_then(|page| {
            if page.ordinal == index + 1 {
                Ok(page)
            } else {
                Err(FlipbookError::PackagingInconsistency {
                    expected: index + 1,
                    found: page.ordinal,
                    detail: "renderer returned an out-of-order page".into(),
                })
            }
        });
        if let Ok(ref page) = result {
            debug!(
                "Rendered page {} → {}x{} px",
                page.ordinal,
                page.width(),
                page.height()
            );
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.total - self.next_index;
        (left, Some(left))
    }
}

/// Read metadata from an opened document without rendering.
pub fn describe(document: &dyn RasterDocument) -> Result<DocumentMetadata, FlipbookError> {
    let page_count = document.page_count();
    let page_sizes = (0..page_count)
        .map(|i| document.page_size(i))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DocumentMetadata {
        title: document.title(),
        author: document.author(),
        page_count,
        page_sizes,
    })
}

// ── pdfium backend ───────────────────────────────────────────────────────

/// Rasteriser backed by the pdfium C++ library.
///
/// pdfium keeps thread-local state and is not reentrant; create one per
/// request on the thread that renders (the pipeline does this inside
/// `spawn_blocking`).
pub struct PdfiumRasterizer {
    pdfium: Pdfium,
    password: Option<String>,
}

impl PdfiumRasterizer {
    /// Bind to a pdfium library.
    ///
    /// Lookup order: `PDFIUM_LIB_PATH`, the current directory, then the
    /// system library path.
    pub fn bind(password: Option<String>) -> Result<Self, FlipbookError> {
        let bindings = match std::env::var("PDFIUM_LIB_PATH") {
            Ok(p) if !p.is_empty() => Pdfium::bind_to_library(PathBuf::from(p)),
            _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| FlipbookError::PdfiumBindingFailed(format!("{e:?}")))?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
            password,
        })
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn open<'a>(&'a self, pdf: &'a [u8]) -> Result<Box<dyn RasterDocument + 'a>, FlipbookError> {
        let password = self.password.as_deref();
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(pdf, password)
            .map_err(|e| {
                let err_str = format!("{:?}", e);
                if err_str.contains("Password") || err_str.contains("password") {
                    if password.is_some() {
                        FlipbookError::WrongPassword
                    } else {
                        FlipbookError::PasswordRequired
                    }
                } else {
                    FlipbookError::SourceUnreadable { detail: err_str }
                }
            })?;

        info!("PDF loaded: {} pages", document.pages().len());
        Ok(Box::new(PdfiumDocument { document }))
    }
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl<'a> PdfiumDocument<'a> {
    fn page(&self, index: usize) -> Result<PdfPage<'a>, FlipbookError> {
        self.document
            .pages()
            .get(index as u16)
            .map_err(|e| FlipbookError::PageRender {
                page: index + 1,
                detail: format!("{:?}", e),
            })
    }

    fn metadata_value(&self, tag: PdfDocumentMetadataTagType) -> Option<String> {
        self.document.metadata().get(tag).and_then(|t| {
            let v = t.value().trim().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    }
}

impl RasterDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_size(&self, index: usize) -> Result<PageSize, FlipbookError> {
        let page = self.page(index)?;
        Ok(PageSize {
            width_pts: page.width().value,
            height_pts: page.height().value,
        })
    }

    fn render_page(&self, index: usize, dpi: u32) -> Result<RenderedPage, FlipbookError> {
        let page = self.page(index)?;
        let (width, height) = scaled_dimensions(
            PageSize {
                width_pts: page.width().value,
                height_pts: page.height().value,
            },
            dpi,
        );

        let render_config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_target_height(height as i32);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| FlipbookError::PageRender {
                page: index + 1,
                detail: format!("{:?}", e),
            })?;

        Ok(RenderedPage {
            ordinal: index + 1,
            image: bitmap.as_image(),
        })
    }

    fn title(&self) -> Option<String> {
        self.metadata_value(PdfDocumentMetadataTagType::Title)
    }

    fn author(&self) -> Option<String> {
        self.metadata_value(PdfDocumentMetadataTagType::Author)
    }
}
