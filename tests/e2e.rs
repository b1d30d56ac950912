//! End-to-end tests against the real pdfium renderer.
//!
//! The PDFs are generated in-test, so no fixtures are needed, but libpdfium
//! must be loadable (`PDFIUM_LIB_PATH`, the crate root, or a system path).
//! The tests are gated behind `E2E_ENABLED` so they do not run in CI unless
//! explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test e2e -- --nocapture

use pdf_flipbook::{
    convert, convert_sync, inspect, ConversionConfig, ErrorKind, OutputTarget, PageFormat,
};
use std::fs;

/// Skip this test unless E2E_ENABLED is set.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    }};
}

/// A minimal, valid PDF with one blank page per `(width, height)` in points.
fn blank_pdf(pages: &[(u32, u32)], title: &str) -> Vec<u8> {
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 3 + i).collect();
    let info_id = 3 + pages.len();

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            page_ids
                .iter()
                .map(|id| format!("{id} 0 R"))
                .collect::<Vec<_>>()
                .join(" "),
            pages.len()
        ),
    ];
    for (w, h) in pages {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {w} {h}] /Resources << >> >>"
        ));
    }
    objects.push(format!("<< /Title ({title}) >>"));

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_at = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for off in offsets {
        out.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R /Info {info_id} 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    out
}

const LETTER: (u32, u32) = (612, 792);
const LANDSCAPE: (u32, u32) = (792, 612);

#[test]
fn test_generated_pdf_has_valid_header() {
    let pdf = blank_pdf(&[LETTER], "Header");
    assert!(pdf.starts_with(b"%PDF-1.4"));
    assert!(pdf.ends_with(b"%%EOF\n"));
}

#[tokio::test]
async fn test_inspect_generated_pdf() {
    e2e_skip_unless_ready!();
    let pdf = blank_pdf(&[LETTER, LANDSCAPE], "Inspect Me");

    let meta = inspect(pdf).await.expect("inspect() should succeed");
    assert_eq!(meta.page_count, 2);
    assert_eq!(meta.title.as_deref(), Some("Inspect Me"));
    assert_eq!(meta.page_sizes[1].width_pts, 792.0);
    println!("Metadata: {:?}", meta);
}

#[test]
fn test_three_pages_to_directory() {
    e2e_skip_unless_ready!();
    let tmp = tempfile::tempdir().unwrap();
    let dest = tmp.path().join("book");
    let pdf = blank_pdf(&[LETTER, LANDSCAPE, LETTER], "Three Pages");
    let config = ConversionConfig::builder().dpi(72).build().unwrap();

    let output = convert_sync(pdf, &OutputTarget::Directory(dest.clone()), &config)
        .expect("conversion should succeed");

    assert_eq!(output.stats.page_count, 3);
    assert_eq!(output.title, "Three Pages");
    for (page, (w, h)) in output.pages.iter().zip([LETTER, LANDSCAPE, LETTER]) {
        assert_eq!((page.width, page.height), (w, h), "page {}", page.ordinal);
        let img = image::open(dest.join(page.relative_path())).expect("readable page image");
        assert_eq!((img.width(), img.height()), (w, h));
    }
    assert!(dest.join("index.html").is_file());
    println!("Stats: {:?}", output.stats);
}

#[test]
fn test_doubling_dpi_doubles_pixels() {
    e2e_skip_unless_ready!();
    let pdf = blank_pdf(&[LETTER, (300, 150)], "Scale");
    let pages = |dpi: u32| {
        let config = ConversionConfig::builder()
            .dpi(dpi)
            .image_format(PageFormat::Png)
            .build()
            .unwrap();
        convert_sync(pdf.clone(), &OutputTarget::Memory, &config)
            .expect("conversion should succeed")
            .pages
    };
    let low = pages(50);
    let high = pages(100);
    for (a, b) in low.iter().zip(&high) {
        assert!((i64::from(b.width) - 2 * i64::from(a.width)).abs() <= 1);
        assert!((i64::from(b.height) - 2 * i64::from(a.height)).abs() <= 1);
    }
}

#[test]
fn test_archive_is_reproducible() {
    e2e_skip_unless_ready!();
    let tmp = tempfile::tempdir().unwrap();
    let pdf = blank_pdf(&[LETTER, LETTER], "Twice");
    let config = ConversionConfig::builder().dpi(36).build().unwrap();

    let a = tmp.path().join("a.zip");
    let b = tmp.path().join("b.zip");
    convert_sync(pdf.clone(), &OutputTarget::Archive(a.clone()), &config).unwrap();
    convert_sync(pdf, &OutputTarget::Archive(b.clone()), &config).unwrap();
    assert_eq!(fs::read(a).unwrap(), fs::read(b).unwrap());
}

#[tokio::test]
async fn test_corrupt_pdf_is_source_unreadable() {
    e2e_skip_unless_ready!();
    let tmp = tempfile::tempdir().unwrap();
    let garbage = b"%PDF-1.4\nthis is not really a pdf\n".to_vec();

    let err = convert(
        garbage,
        OutputTarget::Directory(tmp.path().join("book")),
        &ConversionConfig::default(),
    )
    .await
    .expect_err("corrupt PDF must fail");
    assert_eq!(err.kind(), ErrorKind::SourceUnreadable, "{err}");
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
}
