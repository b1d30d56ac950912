//! Input resolution: turn a path or an in-memory buffer into PDF bytes.
//!
//! The magic bytes (`%PDF`) are checked here, before the renderer is ever
//! bound, so garbage input fails with a typed error and leaves no trace on
//! disk. The whole document is read into memory; pdfium needs random access
//! anyway and the buffer is dropped with the request.

use crate::error::FlipbookError;
use std::path::{Path, PathBuf};
use tracing::debug;

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Where the PDF comes from.
#[derive(Debug, Clone)]
pub enum PdfSource {
    /// A local file.
    Path(PathBuf),
    /// Bytes already in memory (upload body, database blob, …).
    Bytes(Vec<u8>),
}

impl From<PathBuf> for PdfSource {
    fn from(p: PathBuf) -> Self {
        PdfSource::Path(p)
    }
}

impl From<&Path> for PdfSource {
    fn from(p: &Path) -> Self {
        PdfSource::Path(p.to_path_buf())
    }
}

impl From<&str> for PdfSource {
    fn from(p: &str) -> Self {
        PdfSource::Path(PathBuf::from(p))
    }
}

impl From<Vec<u8>> for PdfSource {
    fn from(bytes: Vec<u8>) -> Self {
        PdfSource::Bytes(bytes)
    }
}

impl PdfSource {
    /// Read the source and verify the PDF header.
    pub fn load(&self) -> Result<Vec<u8>, FlipbookError> {
        let bytes = match self {
            PdfSource::Path(path) => read_local(path)?,
            PdfSource::Bytes(bytes) => bytes.clone(),
        };
        check_magic(&bytes)?;
        Ok(bytes)
    }
}

/// Read a local file, mapping the common failures to typed errors.
fn read_local(path: &Path) -> Result<Vec<u8>, FlipbookError> {
    match std::fs::read(path) {
        Ok(bytes) => {
            debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
            Ok(bytes)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FlipbookError::FileNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(FlipbookError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(e) => Err(FlipbookError::SourceUnreadable {
            detail: e.to_string(),
        }),
    }
}

/// Reject anything that does not begin with `%PDF`.
pub fn check_magic(bytes: &[u8]) -> Result<(), FlipbookError> {
    if bytes.len() < PDF_MAGIC.len() || &bytes[..PDF_MAGIC.len()] != PDF_MAGIC {
        return Err(FlipbookError::NotAPdf {
            magic: bytes.iter().take(PDF_MAGIC.len()).copied().collect(),
        });
    }
    Ok(())
}
