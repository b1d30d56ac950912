//! Conversion entry points.
//!
//! Every entry point runs the same blocking pipeline:
//!
//! 1. validate options and the destination (no work yet)
//! 2. load the source and check the `%PDF` header
//! 3. open the document; zero pages is an error
//! 4. render pages one by one, encode + write them on the worker pool
//! 5. fill the viewer templates for the page count
//! 6. verify the staged tree and publish it
//!
//! The first failure aborts the run and the staging tree is dropped, so the
//! caller either gets a complete flipbook or an error with nothing left on
//! disk. Nothing is retried here.

use crate::config::{ConversionConfig, OutputTarget};
use crate::error::FlipbookError;
use crate::output::{ConversionOutput, ConversionStats, DocumentMetadata};
use crate::pipeline::input::PdfSource;
use crate::pipeline::package::{self, Staging};
use crate::pipeline::render::{self, PdfiumRasterizer, Rasterizer, RenderedPages};
use crate::pipeline::sequence::{PageNaming, PageSequencer};
use crate::viewer::{ViewerOptions, ViewerTemplater, DEFAULT_TITLE};
use std::time::Instant;
use tracing::{debug, info};

/// Convert a PDF into a flipbook.
///
/// This is the primary entry point for the library. The pipeline is
/// CPU-bound and pdfium is not async-safe, so the work runs on tokio's
/// blocking pool.
///
/// # Arguments
/// * `source`: a path or the PDF bytes
/// * `output`: directory, `.zip` archive, or in-memory archive
/// * `config`: conversion options
///
/// # Errors
/// Any failure is fatal; see [`FlipbookError::kind`] for the categories.
pub async fn convert(
    source: impl Into<PdfSource>,
    output: OutputTarget,
    config: &ConversionConfig,
) -> Result<ConversionOutput, FlipbookError> {
    let source = source.into();
    let config = config.clone();
    tokio::task::spawn_blocking(move || convert_sync(source, &output, &config))
        .await
        .map_err(|e| FlipbookError::Internal(format!("Conversion task failed: {e}")))?
}

/// Blocking version of [`convert`], rendering with pdfium.
///
/// Options, destination and the PDF header are checked before pdfium is
/// bound, so those errors do not need the library to be installed.
pub fn convert_sync(
    source: impl Into<PdfSource>,
    output: &OutputTarget,
    config: &ConversionConfig,
) -> Result<ConversionOutput, FlipbookError> {
    let start = Instant::now();
    let pdf = prepare(source.into(), output, config)?;
    let rasterizer = PdfiumRasterizer::bind(config.password.clone())?;
    run(&rasterizer, &pdf, output, config, start)
}

/// Convert with a caller-supplied rendering backend.
pub fn convert_with<R: Rasterizer + ?Sized>(
    rasterizer: &R,
    source: impl Into<PdfSource>,
    output: &OutputTarget,
    config: &ConversionConfig,
) -> Result<ConversionOutput, FlipbookError> {
    let start = Instant::now();
    let pdf = prepare(source.into(), output, config)?;
    run(rasterizer, &pdf, output, config, start)
}

/// Read document metadata without rendering.
///
/// Encrypted documents need [`inspect_with`] and a
/// [`PdfiumRasterizer`] bound with the password.
pub async fn inspect(source: impl Into<PdfSource>) -> Result<DocumentMetadata, FlipbookError> {
    let source = source.into();
    tokio::task::spawn_blocking(move || {
        let pdf = source.load()?;
        let rasterizer = PdfiumRasterizer::bind(None)?;
        describe_bytes(&rasterizer, &pdf)
    })
    .await
    .map_err(|e| FlipbookError::Internal(format!("Inspect task failed: {e}")))?
}

/// Read document metadata with a caller-supplied rendering backend.
pub fn inspect_with<R: Rasterizer + ?Sized>(
    rasterizer: &R,
    source: impl Into<PdfSource>,
) -> Result<DocumentMetadata, FlipbookError> {
    let pdf = source.into().load()?;
    describe_bytes(rasterizer, &pdf)
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn describe_bytes<R: Rasterizer + ?Sized>(
    rasterizer: &R,
    pdf: &[u8],
) -> Result<DocumentMetadata, FlipbookError> {
    let document = rasterizer.open(pdf)?;
    render::describe(document.as_ref())
}

/// Everything that can fail without touching the renderer or the disk.
fn prepare(
    source: PdfSource,
    output: &OutputTarget,
    config: &ConversionConfig,
) -> Result<Vec<u8>, FlipbookError> {
    config.validate()?;
    package::preflight(output, config.overwrite)?;
    source.load()
}

fn run<R: Rasterizer + ?Sized>(
    rasterizer: &R,
    pdf: &[u8],
    output: &OutputTarget,
    config: &ConversionConfig,
    start: Instant,
) -> Result<ConversionOutput, FlipbookError> {
    // ── Step 1: Open ─────────────────────────────────────────────────────
    let document = rasterizer.open(pdf)?;
    let total_pages = document.page_count();
    if total_pages == 0 {
        return Err(FlipbookError::EmptyDocument);
    }
    info!("PDF has {} pages", total_pages);

    // ── Step 2: Settle naming and viewer before any page is rendered ────
    let naming = PageNaming::for_page_count(total_pages, config.image_format, config.padding)?;
    let templater = ViewerTemplater::new()?;
    let title = resolve_title(config.title.as_deref(), document.title());
    debug!("Naming {:?}, title {:?}", naming, title);

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total_pages);
    }

    // ── Step 3: Render, encode and persist pages ─────────────────────────
    let staging = Staging::create(output)?;
    let render_start = Instant::now();
    let sequencer = PageSequencer::new(
        staging.pages_dir(),
        naming.clone(),
        config.image_format,
        config.jpeg_quality,
        total_pages,
    )
    .with_progress(config.progress_callback.clone());
    let pages = sequencer.run(
        RenderedPages::new(document.as_ref(), config.dpi),
        config.concurrency,
    )?;
    if pages.len() != total_pages {
        return Err(FlipbookError::PackagingInconsistency {
            expected: total_pages,
            found: pages.len(),
            detail: "renderer stopped early".into(),
        });
    }
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!(
        "Rendered {} pages at {} DPI in {}ms",
        pages.len(),
        config.dpi,
        render_duration_ms
    );

    // ── Step 4: Viewer + package ─────────────────────────────────────────
    if let Some(ref cb) = config.progress_callback {
        cb.on_packaging_start(total_pages);
    }
    let package_start = Instant::now();
    let bundle = templater.render(
        total_pages,
        &naming,
        &ViewerOptions {
            title: title.clone(),
            theme: config.theme,
        },
    )?;
    staging.write_viewer(&bundle)?;
    let files = staging.verify(total_pages, &naming)?;
    let published = staging.publish(output, &files, config.overwrite)?;
    let package_duration_ms = package_start.elapsed().as_millis() as u64;

    // ── Step 5: Summary ──────────────────────────────────────────────────
    let total_bytes = files.iter().map(|f| f.size).sum();
    let stats = ConversionStats {
        page_count: total_pages,
        total_bytes,
        archive_bytes: published.archive_bytes,
        render_duration_ms,
        package_duration_ms,
        total_duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Conversion complete: {} pages, {} bytes, {}ms total",
        total_pages, total_bytes, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(total_pages, total_bytes);
    }

    Ok(ConversionOutput {
        location: published.location,
        title,
        pages,
        files,
        stats,
        archive: published.archive,
    })
}

/// Caller's title, then the document's, then the default.
fn resolve_title(configured: Option<&str>, from_document: Option<String>) -> String {
    configured
        .map(|t| t.trim().to_string())
        .or(from_document)
        .unwrap_or_else(|| DEFAULT_TITLE.to_string())
}
