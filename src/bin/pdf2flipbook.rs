//! CLI binary for pdf-flipbook.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_flipbook::{
    convert, inspect_with, ConversionConfig, ConversionOutput, ConversionProgressCallback,
    DocumentMetadata, FlipbookError, OutputTarget, PaddingPolicy, PageFormat, PdfSource,
    PdfiumRasterizer, ProgressCallback, Theme,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar that counts written pages, then a
/// spinner while the viewer is packaged.
struct CliProgressCallback {
    bar: ProgressBar,
    bytes: AtomicU64,
}

impl CliProgressCallback {
    /// Start as a spinner; `on_conversion_start` sets the length.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            bytes: AtomicU64::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Rendering");
        self.bar.reset_eta();
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Rendering {total_pages} pages…"))
        ));
    }

    fn on_page_complete(&self, _ordinal: usize, _total_pages: usize, bytes: u64) {
        let written = self.bytes.fetch_add(bytes, Ordering::Relaxed) + bytes;
        self.bar.set_message(human_bytes(written));
        self.bar.inc(1);
    }

    fn on_packaging_start(&self, _total_pages: usize) {
        self.bar.set_prefix("Packaging");
        self.bar.set_message("writing viewer…");
    }

    fn on_conversion_complete(&self, total_pages: usize, total_bytes: u64) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} pages packaged  {}",
            green("✔"),
            bold(&total_pages.to_string()),
            dim(&human_bytes(total_bytes)),
        );
    }
}

fn human_bytes(n: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = n as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{n} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Directory flipbook (open flipbook_output/index.html in a browser)
  pdf2flipbook document.pdf

  # Single archive, lower resolution
  pdf2flipbook document.pdf -o book --format archive --dpi 150

  # PNG pages, four encoder threads, dark viewer
  pdf2flipbook --image-format png -j 4 --theme dark slides.pdf -o slides

  # Inspect PDF metadata without rendering
  pdf2flipbook --inspect-only document.pdf

  # JSON summary for scripts
  pdf2flipbook --json document.pdf -o out --overwrite > summary.json

OUTPUT LAYOUT:
  index.html
  assets/css/flipbook.css
  assets/js/flipbook.js
  pages/page001.jpg … pageNNN.jpg

ENVIRONMENT VARIABLES:
  FLIPBOOK_*          Every flag has one, e.g. FLIPBOOK_DPI=150
  PDFIUM_LIB_PATH     Path to libpdfium; otherwise ./ then system paths
  RUST_LOG            Log filter, overrides --verbose / --quiet
"#;

/// Convert PDF files into offline HTML flipbooks.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2flipbook",
    version,
    about = "Convert PDF files into self-contained HTML flipbooks",
    long_about = "Rasterise every page of a PDF and wrap the images in an offline page-flip \
viewer. The result is a directory (or a .zip of it) that opens straight from disk.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Output directory, or archive path without the .zip suffix.
    #[arg(short, long, env = "FLIPBOOK_OUTPUT", default_value = "flipbook_output")]
    output: PathBuf,

    /// Output form: directory or archive (.zip).
    #[arg(long, env = "FLIPBOOK_FORMAT", value_enum, default_value = "directory")]
    format: OutputFormatArg,

    /// Rendering DPI (1–1200).
    #[arg(long, env = "FLIPBOOK_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(1..=1200))]
    dpi: u32,

    /// Page image format.
    #[arg(long, env = "FLIPBOOK_IMAGE_FORMAT", value_enum, default_value = "jpeg")]
    image_format: ImageFormatArg,

    /// JPEG quality (1–100).
    #[arg(long, env = "FLIPBOOK_QUALITY", default_value_t = 95,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Threads encoding and writing pages.
    #[arg(short = 'j', long, env = "FLIPBOOK_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Viewer title. Defaults to the PDF title, then "PDF Flipbook".
    #[arg(long, env = "FLIPBOOK_TITLE")]
    title: Option<String>,

    /// Viewer colour theme.
    #[arg(long, env = "FLIPBOOK_THEME", value_enum, default_value = "classic")]
    theme: ThemeArg,

    /// Over 999 pages: widen page numbers (auto) or refuse (strict).
    #[arg(long, env = "FLIPBOOK_PADDING", value_enum, default_value = "auto")]
    padding: PaddingArg,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "FLIPBOOK_PASSWORD")]
    password: Option<String>,

    /// Replace an existing output.
    #[arg(long, env = "FLIPBOOK_OVERWRITE")]
    overwrite: bool,

    /// Print the conversion summary as JSON on stdout.
    #[arg(long, env = "FLIPBOOK_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "FLIPBOOK_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs and full error chains.
    #[arg(short, long, env = "FLIPBOOK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "FLIPBOOK_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OutputFormatArg {
    Directory,
    Archive,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ImageFormatArg {
    Jpeg,
    Png,
}

impl From<ImageFormatArg> for PageFormat {
    fn from(v: ImageFormatArg) -> Self {
        match v {
            ImageFormatArg::Jpeg => PageFormat::Jpeg,
            ImageFormatArg::Png => PageFormat::Png,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ThemeArg {
    Classic,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(v: ThemeArg) -> Self {
        match v {
            ThemeArg::Classic => Theme::Classic,
            ThemeArg::Dark => Theme::Dark,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PaddingArg {
    Auto,
    Strict,
}

impl From<PaddingArg> for PaddingPolicy {
    fn from(v: PaddingArg) -> Self {
        match v {
            PaddingArg::Auto => PaddingPolicy::AutoWiden,
            PaddingArg::Strict => PaddingPolicy::Reject,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar carries the feedback; keep library INFO logs out of
    // its way unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let verbose = cli.verbose;
    if let Err(err) = run(cli, show_progress).await {
        report_error(&err, verbose);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, show_progress: bool) -> Result<()> {
    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect_input(cli.input.clone(), cli.password.clone())
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input.display());
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            println!("Pages:        {}", meta.page_count);
            if let Some(first) = meta.page_sizes.first() {
                println!(
                    "First page:   {:.1} × {:.1} pt",
                    first.width_pts, first.height_pts
                );
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;
    let target = output_target(&cli);

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert(cli.input.as_path(), target, &config)
        .await
        .context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&output);
    }
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .dpi(cli.dpi)
        .image_format(cli.image_format.into())
        .jpeg_quality(cli.quality)
        .concurrency(cli.concurrency)
        .padding(cli.padding.into())
        .theme(cli.theme.into())
        .overwrite(cli.overwrite);

    if let Some(ref title) = cli.title {
        builder = builder.title(title.clone());
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Read metadata on the blocking pool, unlocking with `--password` if given.
///
/// The file is loaded and its header checked before pdfium is bound.
async fn inspect_input(
    input: PathBuf,
    password: Option<String>,
) -> Result<DocumentMetadata, FlipbookError> {
    tokio::task::spawn_blocking(move || {
        let pdf = PdfSource::from(input).load()?;
        let rasterizer = PdfiumRasterizer::bind(password)?;
        inspect_with(&rasterizer, pdf)
    })
    .await
    .map_err(|e| FlipbookError::Internal(format!("Inspect task failed: {e}")))?
}

/// `--format archive` appends `.zip` unless the path already ends in it.
fn output_target(cli: &Cli) -> OutputTarget {
    match cli.format {
        OutputFormatArg::Directory => OutputTarget::Directory(cli.output.clone()),
        OutputFormatArg::Archive => {
            let has_suffix = cli
                .output
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
            let path = if has_suffix {
                cli.output.clone()
            } else {
                let mut name = cli.output.clone().into_os_string();
                name.push(".zip");
                PathBuf::from(name)
            };
            OutputTarget::Archive(path)
        }
    }
}

fn print_summary(output: &ConversionOutput) {
    let stats = &output.stats;
    let location = output
        .location
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    eprintln!(
        "{}  {} pages  {}ms  →  {}",
        green("✔"),
        stats.page_count,
        stats.total_duration_ms,
        bold(&location),
    );
    eprintln!(
        "   {}  render {}ms  /  package {}ms{}",
        dim(&human_bytes(stats.total_bytes)),
        stats.render_duration_ms,
        stats.package_duration_ms,
        stats
            .archive_bytes
            .map(|b| format!("  /  archive {}", human_bytes(b)))
            .unwrap_or_default(),
    );
}

/// Short, path-free message by default; the whole chain with `--verbose`.
fn report_error(err: &anyhow::Error, verbose: bool) {
    match err.downcast_ref::<FlipbookError>() {
        Some(e) if !verbose => {
            eprintln!("{} {}", red("✘"), e.user_message());
            eprintln!("  {}", dim("run with --verbose for details"));
        }
        _ => {
            eprintln!("{} {}", red("✘"), bold(&err.to_string()));
            for cause in err.chain().skip(1) {
                eprintln!("  {} {}", dim("caused by:"), cause);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pdf2flipbook").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn archive_format_appends_zip_suffix() {
        let cli = parse(&["doc.pdf", "-o", "out/book", "--format", "archive"]);
        assert_eq!(
            output_target(&cli),
            OutputTarget::Archive(PathBuf::from("out/book.zip"))
        );

        let cli = parse(&["doc.pdf", "-o", "book.ZIP", "--format", "archive"]);
        assert_eq!(
            output_target(&cli),
            OutputTarget::Archive(PathBuf::from("book.ZIP"))
        );

        let cli = parse(&["doc.pdf", "-o", "book.zip"]);
        assert_eq!(
            output_target(&cli),
            OutputTarget::Directory(PathBuf::from("book.zip"))
        );
    }

    #[test]
    fn inspect_only_keeps_the_password() {
        let cli = parse(&["doc.pdf", "--inspect-only", "--password", "s3cret"]);
        assert!(cli.inspect_only);
        assert_eq!(cli.password.as_deref(), Some("s3cret"));
    }

    #[tokio::test]
    async fn inspect_checks_the_source_before_binding_pdfium() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.pdf");
        let err = inspect_input(missing, Some("s3cret".into())).await.unwrap_err();
        assert!(matches!(err, FlipbookError::FileNotFound { .. }), "{err}");

        let garbage = tmp.path().join("garbage.pdf");
        std::fs::write(&garbage, b"GIF89a").unwrap();
        let err = inspect_input(garbage, None).await.unwrap_err();
        assert!(matches!(err, FlipbookError::NotAPdf { .. }), "{err}");
    }
}
