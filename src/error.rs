//! Error types for the pdf-flipbook library.
//!
//! Every failure is fatal to the conversion: a flipbook with a missing page
//! is corrupt output, so there is no per-page error channel. [`FlipbookError`]
//! carries the structured detail, and [`FlipbookError::kind`] folds it onto a
//! small taxonomy that boundary layers (CLI, web form) can map to messages.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf-flipbook library.
#[derive(Debug, Error)]
pub enum FlipbookError {
    // ── Option errors ─────────────────────────────────────────────────────
    /// An option was rejected before any work started.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The bytes were read, but they do not start with a PDF header.
    #[error("Input is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF could not be opened: {detail}")]
    SourceUnreadable { detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired,

    /// A password was provided but it is wrong.
    #[error("Wrong password for encrypted PDF")]
    WrongPassword,

    /// The PDF parsed but has no pages to show.
    #[error("PDF contains no pages; refusing to build an empty flipbook")]
    EmptyDocument,

    // ── Page errors ───────────────────────────────────────────────────────
    /// The renderer failed on a specific page (1-based ordinal).
    #[error("Rasterisation failed for page {page}: {detail}")]
    PageRender { page: usize, detail: String },

    /// The rendered bitmap could not be encoded to the page image format.
    #[error("Failed to encode page {page}: {source}")]
    PageEncode {
        page: usize,
        #[source]
        source: image::ImageError,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create, write or move an output file.
    #[error("Failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Internal errors ───────────────────────────────────────────────────
    /// Stage outputs disagree about the page set. Always a defect.
    #[error("Packaging inconsistency: expected {expected} page files, found {found} ({detail})")]
    PackagingInconsistency {
        expected: usize,
        found: usize,
        detail: String,
    },

    /// An embedded viewer template failed to compile or render.
    #[error("Viewer template error: {0}")]
    Template(String),

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Place libpdfium next to the working directory, install it system-wide,\n\
or set PDFIUM_LIB_PATH=/path/to/libpdfium.\n\
Pre-built libraries: https://github.com/bblanchon/pdfium-binaries/releases\n"
    )]
    PdfiumBindingFailed(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse error categories for boundary layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad option, rejected before any rendering.
    InvalidOption,
    /// The input is missing, not a PDF, locked or empty.
    SourceUnreadable,
    /// A single page failed to rasterise or encode.
    PageRender,
    /// Persisting a page, asset or archive failed.
    Io,
    /// Stages disagreed on the page set.
    PackagingInconsistency,
    /// Rendering engine or template unavailable.
    Internal,
}

impl FlipbookError {
    /// Shorthand used by every stage that touches the filesystem.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FlipbookError::Io {
            path: path.into(),
            source,
        }
    }

    /// The taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FlipbookError::InvalidOption(_) => ErrorKind::InvalidOption,
            FlipbookError::FileNotFound { .. }
            | FlipbookError::PermissionDenied { .. }
            | FlipbookError::NotAPdf { .. }
            | FlipbookError::SourceUnreadable { .. }
            | FlipbookError::PasswordRequired
            | FlipbookError::WrongPassword
            | FlipbookError::EmptyDocument => ErrorKind::SourceUnreadable,
            FlipbookError::PageRender { .. } | FlipbookError::PageEncode { .. } => {
                ErrorKind::PageRender
            }
            FlipbookError::Io { .. } => ErrorKind::Io,
            FlipbookError::PackagingInconsistency { .. } => ErrorKind::PackagingInconsistency,
            FlipbookError::Template(_)
            | FlipbookError::PdfiumBindingFailed(_)
            | FlipbookError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// A short message safe to show end users: no paths, no engine detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            FlipbookError::PasswordRequired | FlipbookError::WrongPassword => {
                "The PDF is password protected. Provide the correct password."
            }
            FlipbookError::EmptyDocument => "The PDF has no pages.",
            FlipbookError::FileNotFound { .. } => "The PDF file could not be found.",
            _ => match self.kind() {
                ErrorKind::InvalidOption => "One of the conversion options is invalid.",
                ErrorKind::SourceUnreadable => "The file is not a readable PDF or is corrupted.",
                ErrorKind::PageRender => {
                    "A page of the PDF could not be rendered. Try a lower DPI."
                }
                ErrorKind::Io => "The flipbook could not be written to disk.",
                ErrorKind::PackagingInconsistency | ErrorKind::Internal => {
                    "Internal error while building the flipbook."
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_render_display() {
        let e = FlipbookError::PageRender {
            page: 3,
            detail: "bad stream".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("page 3"), "got: {msg}");
        assert!(msg.contains("bad stream"));
    }

    #[test]
    fn packaging_inconsistency_display() {
        let e = FlipbookError::PackagingInconsistency {
            expected: 3,
            found: 2,
            detail: "missing page003.jpg".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("expected 3"), "got: {msg}");
        assert!(msg.contains("found 2"));
    }

    #[test]
    fn input_errors_share_source_kind() {
        let errors = [
            FlipbookError::NotAPdf {
                magic: b"GIF8".to_vec(),
            },
            FlipbookError::EmptyDocument,
            FlipbookError::PasswordRequired,
            FlipbookError::FileNotFound {
                path: PathBuf::from("/nope.pdf"),
            },
        ];
        for e in errors {
            assert_eq!(e.kind(), ErrorKind::SourceUnreadable, "{e}");
        }
    }

    #[test]
    fn user_message_does_not_leak_paths() {
        let e = FlipbookError::io(
            "/srv/secret/tmp/.flipbook-abc/pages/page001.jpg",
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        );
        assert_eq!(e.kind(), ErrorKind::Io);
        assert!(!e.user_message().contains("/srv"));
        assert!(e.to_string().contains("/srv"));
    }

    #[test]
    fn defects_map_to_internal_messages() {
        let e = FlipbookError::PackagingInconsistency {
            expected: 1,
            found: 0,
            detail: String::new(),
        };
        assert_eq!(e.user_message(), "Internal error while building the flipbook.");
        assert_eq!(FlipbookError::Template("x".into()).kind(), ErrorKind::Internal);
    }
}
