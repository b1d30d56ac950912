//! Pipeline stages for PDF-to-flipbook conversion.
//!
//! Each submodule implements exactly one transformation step, so each can
//! be tested on its own and the rendering backend can be swapped without
//! touching the rest.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ sequence ──▶ package
//! (path/bytes) (pdfium)  (jpeg/png)  (name+write)  (dir / zip)
//! ```
//!
//! 1. [`input`]: read the source and check the `%PDF` header
//! 2. [`render`]: lazily rasterise pages in document order; pdfium is
//!    not thread-safe, so this stays on one thread
//! 3. [`encode`]: turn each bitmap into JPEG or PNG bytes
//! 4. [`sequence`]: name pages by ordinal and write them on a worker pool
//! 5. [`package`]: add the viewer, verify the tree, publish atomically

pub mod encode;
pub mod input;
pub mod package;
pub mod render;
pub mod sequence;
