//! Page sequencing: name, encode and persist rendered pages.
//!
//! Filenames are `PREFIX + zero-padded ordinal + "." + extension`, so a
//! plain lexicographic sort of `pages/` is also the reading order. The
//! padding width is fixed for a run; see [`PaddingPolicy`] for what happens
//! when a document has more pages than the default width can count.
//!
//! Encoding runs on a fixed-size rayon pool, one batch of `concurrency`
//! pages at a time. Each batch is collected in input order, so filenames and
//! the returned [`PageFile`] list follow ordinals, never completion time.

use crate::config::{PageFormat, PaddingPolicy};
use crate::error::FlipbookError;
use crate::output::PageFile;
use crate::pipeline::encode;
use crate::pipeline::render::RenderedPage;
use crate::progress::ProgressCallback;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Filename prefix for every page image.
pub const PAGE_PREFIX: &str = "page";

/// Zero-pad width used unless the document needs more digits.
pub const DEFAULT_PAD_WIDTH: usize = 3;

/// The deterministic naming convention shared by the sequencer, the viewer
/// templates and the packager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageNaming {
    pub prefix: String,
    pub pad_width: usize,
    pub extension: String,
}

impl PageNaming {
    /// Pick the naming for a document of `page_count` pages.
    ///
    /// Fails with `InvalidOption` under [`PaddingPolicy::Reject`] when the
    /// count does not fit in [`DEFAULT_PAD_WIDTH`] digits.
    pub fn for_page_count(
        page_count: usize,
        format: PageFormat,
        policy: PaddingPolicy,
    ) -> Result<Self, FlipbookError> {
        let needed = digits(page_count);
        let pad_width = if needed <= DEFAULT_PAD_WIDTH {
            DEFAULT_PAD_WIDTH
        } else {
            match policy {
                PaddingPolicy::AutoWiden => {
                    info!(
                        "{} pages exceed {}-digit padding; widening to {}",
                        page_count, DEFAULT_PAD_WIDTH, needed
                    );
                    needed
                }
                PaddingPolicy::Reject => {
                    return Err(FlipbookError::InvalidOption(format!(
                        "{page_count} pages do not fit {DEFAULT_PAD_WIDTH}-digit page numbers \
                         (max {}); use the auto-widen padding policy",
                        max_for_width(DEFAULT_PAD_WIDTH)
                    )))
                }
            }
        };
        Ok(Self {
            prefix: PAGE_PREFIX.to_string(),
            pad_width,
            extension: format.extension().to_string(),
        })
    }

    /// `page001.jpg` for ordinal 1 with the default width.
    pub fn file_name(&self, ordinal: usize) -> String {
        format!(
            "{}{:0width$}.{}",
            self.prefix,
            ordinal,
            self.extension,
            width = self.pad_width
        )
    }
}

fn digits(n: usize) -> usize {
    n.max(1).to_string().len()
}

fn max_for_width(width: usize) -> usize {
    10usize.saturating_pow(width as u32) - 1
}

/// Encodes pages and writes them under a `pages/` directory.
pub struct PageSequencer {
    pages_dir: PathBuf,
    naming: PageNaming,
    format: PageFormat,
    jpeg_quality: u8,
    total_pages: usize,
    progress: Option<ProgressCallback>,
}

impl PageSequencer {
    pub fn new(
        pages_dir: impl Into<PathBuf>,
        naming: PageNaming,
        format: PageFormat,
        jpeg_quality: u8,
        total_pages: usize,
    ) -> Self {
        Self {
            pages_dir: pages_dir.into(),
            naming,
            format,
            jpeg_quality,
            total_pages,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Option<ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    pub fn pages_dir(&self) -> &Path {
        &self.pages_dir
    }

    /// Encode and write one page.
    pub fn persist(&self, page: &RenderedPage) -> Result<PageFile, FlipbookError> {
        let bytes = encode::encode_page(&page.image, self.format, self.jpeg_quality).map_err(
            |source| FlipbookError::PageEncode {
                page: page.ordinal,
                source,
            },
        )?;

        let file_name = self.naming.file_name(page.ordinal);
        let path = self.pages_dir.join(&file_name);
        std::fs::write(&path, &bytes).map_err(|e| FlipbookError::io(&path, e))?;
        debug!("Wrote {} ({} bytes)", file_name, bytes.len());

        if let Some(ref cb) = self.progress {
            cb.on_page_complete(page.ordinal, self.total_pages, bytes.len() as u64);
        }

        Ok(PageFile {
            ordinal: page.ordinal,
            file_name,
            width: page.width(),
            height: page.height(),
            bytes: bytes.len() as u64,
        })
    }

    /// Drain `pages`, persisting each one, with up to `concurrency` pages in
    /// flight. Stops at the first error.
    pub fn run<I>(&self, pages: I, concurrency: usize) -> Result<Vec<PageFile>, FlipbookError>
    where
        I: IntoIterator<Item = Result<RenderedPage, FlipbookError>>,
    {
        let concurrency = concurrency.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(concurrency)
            .thread_name(|i| format!("flipbook-page-{i}"))
            .build()
            .map_err(|e| FlipbookError::Internal(format!("Failed to start page workers: {e}")))?;

        let mut files = Vec::with_capacity(self.total_pages);
        let mut batch = Vec::with_capacity(concurrency);

        for page in pages {
            batch.push(page?);
            if batch.len() == concurrency {
                self.flush(&pool, &mut batch, &mut files)?;
            }
        }
        self.flush(&pool, &mut batch, &mut files)?;

        Ok(files)
    }

    fn flush(
        &self,
        pool: &rayon::ThreadPool,
        batch: &mut Vec<RenderedPage>,
        files: &mut Vec<PageFile>,
    ) -> Result<(), FlipbookError> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut written: Vec<PageFile> = pool.install(|| {
            batch
                .par_iter()
                .map(|page| self.persist(page))
                .collect::<Result<Vec<_>, _>>()
        })?;
        batch.clear();

        written.sort_by_key(|f| f.ordinal);
        for file in written {
            let expected = files.len() + 1;
            if file.ordinal != expected {
                return Err(FlipbookError::PackagingInconsistency {
                    expected,
                    found: file.ordinal,
                    detail: format!("page ordinals are not dense at {}", file.file_name),
                });
            }
            files.push(file);
        }
        Ok(())
    }
}
