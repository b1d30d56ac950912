//! Progress-callback trait for conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline renders pages and packages the flipbook.
//!
//! # Example
//!
//! ```rust
//! use pdf_flipbook::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, ordinal: usize, total_pages: usize, bytes: u64) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} written ({} bytes)", ordinal, total_pages, bytes);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the conversion pipeline as it works through a document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
///
/// # Thread safety
///
/// With `concurrency > 1`, `on_page_complete` is called from pool threads
/// and pages within one batch may report out of order. Protect shared state
/// with `Mutex` or atomics.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once the page count is known, before any page is rendered.
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called after a page image has been encoded and written.
    ///
    /// # Arguments
    /// * `ordinal`    : 1-based page number
    /// * `total_pages`: pages in the document
    /// * `bytes`      : size of the written image file
    fn on_page_complete(&self, ordinal: usize, total_pages: usize, bytes: u64) {
        let _ = (ordinal, total_pages, bytes);
    }

    /// Called when every page is on disk and the viewer is being assembled.
    fn on_packaging_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called once after the flipbook has been published.
    ///
    /// # Arguments
    /// * `total_pages`: pages in the flipbook
    /// * `total_bytes`: sum of all files in the flipbook
    fn on_conversion_complete(&self, total_pages: usize, total_bytes: u64) {
        let _ = (total_pages, total_bytes);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        started_total: AtomicUsize,
        pages: AtomicUsize,
        bytes: AtomicU64,
        packaging: AtomicUsize,
        finished_bytes: AtomicU64,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_conversion_start(&self, total_pages: usize) {
            self.started_total.store(total_pages, Ordering::SeqCst);
        }

        fn on_page_complete(&self, _ordinal: usize, _total_pages: usize, bytes: u64) {
            self.pages.fetch_add(1, Ordering::SeqCst);
            self.bytes.fetch_add(bytes, Ordering::SeqCst);
        }

        fn on_packaging_start(&self, total_pages: usize) {
            self.packaging.store(total_pages, Ordering::SeqCst);
        }

        fn on_conversion_complete(&self, _total_pages: usize, total_bytes: u64) {
            self.finished_bytes.store(total_bytes, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(5);
        cb.on_page_complete(1, 5, 42);
        cb.on_packaging_start(5);
        cb.on_conversion_complete(5, 1024);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_conversion_start(2);
        tracker.on_page_complete(1, 2, 100);
        tracker.on_page_complete(2, 2, 200);
        tracker.on_packaging_start(2);
        tracker.on_conversion_complete(2, 900);

        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.pages.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.bytes.load(Ordering::SeqCst), 300);
        assert_eq!(tracker.packaging.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.finished_bytes.load(Ordering::SeqCst), 900);
    }

    #[test]
    fn arc_dyn_callback_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn ConversionProgressCallback>();
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_conversion_start(10);
    }
}
