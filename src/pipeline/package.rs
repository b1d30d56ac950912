//! Packaging: lay out the flipbook tree and publish it atomically.
//!
//! Every run works inside a private staging directory created next to the
//! destination (so the final move is a same-filesystem rename). Pages and
//! viewer assets are written there, the tree is verified against the page
//! count the viewer was built for, and only then is it published:
//!
//! | Target | Publish step |
//! |--------|--------------|
//! | `Directory` | rename the staging tree onto the destination |
//! | `Archive` | write a `.zip` into a sibling temp file, then persist it |
//! | `Memory` | write the `.zip` into a buffer |
//!
//! Dropping a [`Staging`] before publishing removes everything it wrote,
//! including parent directories it had to create, so a failed run never
//! leaves anything where the caller looks. An existing destination replaced
//! under `overwrite` is moved aside first and only deleted once the new
//! output is in place.
//!
//! Archives are reproducible: entries come in manifest order, deflated, with
//! fixed permissions and the 1980-01-01 DOS epoch as their timestamp.

use crate::config::OutputTarget;
use crate::error::FlipbookError;
use crate::output::ManifestEntry;
use crate::pipeline::sequence::PageNaming;
use crate::viewer::{ViewerBundle, VIEWER_FILES};
use std::fs;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Directory holding the page images, relative to the flipbook root.
pub const PAGES_DIR: &str = "pages";

/// Name prefix of staging directories and temp archives.
pub const STAGING_PREFIX: &str = ".flipbook-";

const FILE_MODE: u32 = 0o644;

/// Where the published flipbook ended up.
#[derive(Debug, Default)]
pub struct Published {
    pub location: Option<PathBuf>,
    pub archive_bytes: Option<u64>,
    pub archive: Option<Vec<u8>>,
}

/// Refuse to start when the destination is taken and `overwrite` is off.
///
/// Runs before any rendering so a doomed conversion does no work. A
/// dangling symlink counts as taken, matching what publishing sees.
pub fn preflight(target: &OutputTarget, overwrite: bool) -> Result<(), FlipbookError> {
    if let Some(dest) = target.path() {
        if dest.as_os_str().is_empty() {
            return Err(FlipbookError::InvalidOption(
                "output path must not be empty".into(),
            ));
        }
        if occupied(dest) && !overwrite {
            return Err(already_exists(dest));
        }
    }
    Ok(())
}

/// A private, self-cleaning workspace holding one flipbook tree.
pub struct Staging {
    // Dropped before `created`, so the parents are empty when it runs.
    dir: TempDir,
    created: CreatedDirs,
}

impl Staging {
    /// Create the staging tree for `target`, including `pages/` and the
    /// asset directories.
    pub fn create(target: &OutputTarget) -> Result<Self, FlipbookError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_PREFIX);
        let (dir, created) = match target.path() {
            Some(dest) => {
                let parent = parent_of(dest);
                let created = CreatedDirs::create(&parent)?;
                let dir = builder
                    .tempdir_in(&parent)
                    .map_err(|e| FlipbookError::io(&parent, e))?;
                (dir, created)
            }
            None => {
                let dir = builder
                    .tempdir()
                    .map_err(|e| FlipbookError::io(std::env::temp_dir(), e))?;
                (dir, CreatedDirs::default())
            }
        };

        let staging = Self { dir, created };
        for sub in [PAGES_DIR, "assets/css", "assets/js"] {
            let path = staging.root().join(sub);
            fs::create_dir_all(&path).map_err(|e| FlipbookError::io(&path, e))?;
        }
        debug!("Staging flipbook in {}", staging.root().display());
        Ok(staging)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn pages_dir(&self) -> PathBuf {
        self.root().join(PAGES_DIR)
    }

    /// Write `index.html` and the two assets.
    pub fn write_viewer(&self, bundle: &ViewerBundle) -> Result<(), FlipbookError> {
        for (rel, body) in bundle.files() {
            let path = self.root().join(rel);
            fs::write(&path, body).map_err(|e| FlipbookError::io(&path, e))?;
        }
        Ok(())
    }

    /// Check the tree holds exactly `expected` page files named by `naming`
    /// and return the manifest in archive order.
    pub fn verify(
        &self,
        expected: usize,
        naming: &PageNaming,
    ) -> Result<Vec<ManifestEntry>, FlipbookError> {
        let pages_dir = self.pages_dir();
        let found = fs::read_dir(&pages_dir)
            .map_err(|e| FlipbookError::io(&pages_dir, e))?
            .count();

        let mut manifest = Vec::with_capacity(expected + 3);
        for rel in VIEWER_FILES {
            manifest.push(self.entry(rel)?);
        }

        let mut missing = Vec::new();
        for ordinal in 1..=expected {
            let rel = format!("{PAGES_DIR}/{}", naming.file_name(ordinal));
            if self.root().join(&rel).is_file() {
                manifest.push(self.entry(&rel)?);
            } else {
                missing.push(naming.file_name(ordinal));
            }
        }

        if found != expected || !missing.is_empty() {
            let detail = if missing.is_empty() {
                format!("{} unexpected file(s) in {PAGES_DIR}/", found.saturating_sub(expected))
            } else {
                format!("missing {}", missing.join(", "))
            };
            return Err(FlipbookError::PackagingInconsistency {
                expected,
                found,
                detail,
            });
        }
        Ok(manifest)
    }

    fn entry(&self, rel: &str) -> Result<ManifestEntry, FlipbookError> {
        let path = self.root().join(rel);
        let meta = fs::metadata(&path).map_err(|e| FlipbookError::io(&path, e))?;
        Ok(ManifestEntry {
            path: rel.to_string(),
            size: meta.len(),
        })
    }

    /// Publish the verified tree to `target`.
    pub fn publish(
        mut self,
        target: &OutputTarget,
        manifest: &[ManifestEntry],
        overwrite: bool,
    ) -> Result<Published, FlipbookError> {
        let published = match target {
            OutputTarget::Directory(dest) => {
                make_public(self.root(), 0o755)?;
                let root = self.root().to_path_buf();
                replace_destination(dest, overwrite, || {
                    fs::rename(&root, dest).map_err(|e| FlipbookError::io(dest, e))
                })?;
                info!("Flipbook directory written to {}", dest.display());
                Published {
                    location: Some(dest.clone()),
                    ..Published::default()
                }
            }
            OutputTarget::Archive(dest) => {
                let parent = parent_of(dest);
                let tmp = tempfile::Builder::new()
                    .prefix(STAGING_PREFIX)
                    .suffix(".zip.part")
                    .tempfile_in(&parent)
                    .map_err(|e| FlipbookError::io(&parent, e))?;

                let writer = write_archive(self.root(), manifest, BufWriter::new(tmp.as_file()))?;
                writer
                    .into_inner()
                    .map_err(|e| FlipbookError::io(tmp.path(), e.into_error()))?
                    .sync_all()
                    .map_err(|e| FlipbookError::io(tmp.path(), e))?;
                make_public(tmp.path(), FILE_MODE)?;

                replace_destination(dest, overwrite, || {
                    tmp.persist(dest)
                        .map(drop)
                        .map_err(|e| FlipbookError::io(dest, e.error))
                })?;
                let size = fs::metadata(dest)
                    .map_err(|e| FlipbookError::io(dest, e))?
                    .len();
                info!("Flipbook archive written to {} ({} bytes)", dest.display(), size);
                Published {
                    location: Some(dest.clone()),
                    archive_bytes: Some(size),
                    archive: None,
                }
            }
            OutputTarget::Memory => {
                let bytes = write_archive(self.root(), manifest, Cursor::new(Vec::new()))?
                    .into_inner();
                debug!("Flipbook archive built in memory ({} bytes)", bytes.len());
                Published {
                    location: None,
                    archive_bytes: Some(bytes.len() as u64),
                    archive: Some(bytes),
                }
            }
        };
        self.created.keep();
        Ok(published)
    }
}

/// Serialize the files of `manifest` under `root` as a deflated zip into
/// `writer`, returning the writer once the central directory is written.
pub fn write_archive<W: Write + Seek>(
    root: &Path,
    manifest: &[ManifestEntry],
    writer: W,
) -> Result<W, FlipbookError> {
    let zip_err = |e: zip::result::ZipError| FlipbookError::io(root, std::io::Error::other(e));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(FILE_MODE);
    let mut zip = ZipWriter::new(writer);

    for entry in manifest {
        let path = root.join(&entry.path);
        let data = fs::read(&path).map_err(|e| FlipbookError::io(&path, e))?;
        zip.start_file(entry.path.as_str(), options).map_err(zip_err)?;
        zip.write_all(&data).map_err(|e| FlipbookError::io(&path, e))?;
    }

    zip.finish().map_err(zip_err)
}

/// Parent directories a run had to create, deepest first. Removed again on
/// drop unless the run published.
#[derive(Debug, Default)]
struct CreatedDirs {
    paths: Vec<PathBuf>,
    keep: bool,
}

impl CreatedDirs {
    fn create(dir: &Path) -> Result<Self, FlipbookError> {
        let mut paths = Vec::new();
        let mut cursor = Some(dir);
        while let Some(d) = cursor {
            if d.as_os_str().is_empty() || occupied(d) {
                break;
            }
            paths.push(d.to_path_buf());
            cursor = d.parent();
        }
        let created = Self { paths, keep: false };
        fs::create_dir_all(dir).map_err(|e| FlipbookError::io(dir, e))?;
        Ok(created)
    }

    fn keep(&mut self) {
        self.keep = true;
    }
}

impl Drop for CreatedDirs {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        for dir in &self.paths {
            if fs::remove_dir(dir).is_err() {
                break;
            }
        }
    }
}

fn parent_of(dest: &Path) -> PathBuf {
    match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Anything at `path`, dangling symlinks included.
fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn already_exists(dest: &Path) -> FlipbookError {
    FlipbookError::InvalidOption(format!(
        "output '{}' already exists (pass overwrite to replace it)",
        dest.display()
    ))
}

/// Run `install` to put the new output at `dest`.
///
/// An existing `dest` is moved into a sibling holding directory first and
/// deleted only after `install` succeeds; if `install` fails it is moved back.
fn replace_destination<F>(dest: &Path, overwrite: bool, install: F) -> Result<(), FlipbookError>
where
    F: FnOnce() -> Result<(), FlipbookError>,
{
    if !occupied(dest) {
        return install();
    }
    if !overwrite {
        return Err(already_exists(dest));
    }

    warn!("Replacing existing output {}", dest.display());
    let parent = parent_of(dest);
    let holding = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(&parent)
        .map_err(|e| FlipbookError::io(&parent, e))?;
    let previous = holding.path().join("previous");
    fs::rename(dest, &previous).map_err(|e| FlipbookError::io(dest, e))?;

    match install() {
        Ok(()) => {
            debug!("Removing previous output from {}", previous.display());
            Ok(())
        }
        Err(err) => {
            if let Err(restore) = fs::rename(&previous, dest) {
                warn!(
                    "Could not restore previous output to {}: {}; it is kept at {}",
                    dest.display(),
                    restore,
                    previous.display()
                );
                // Keep the holding directory on disk.
                std::mem::forget(holding);
            }
            Err(err)
        }
    }
}

/// Staging directories and temp files are created owner-only; published
/// output gets ordinary permissions.
#[cfg(unix)]
fn make_public(path: &Path, mode: u32) -> Result<(), FlipbookError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| FlipbookError::io(path, e))
}

#[cfg(not(unix))]
fn make_public(_path: &Path, _mode: u32) -> Result<(), FlipbookError> {
    Ok(())
}
