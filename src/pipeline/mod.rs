//! Pipeline stages for document conversion.
//!
//! Each submodule implements exactly one transformation step; the
//! orchestrator in [`crate::convert`] sequences them.
//!
//! ## Data Flow
//!
//! ```text
//! normalize ──▶ render ──▶ raster ──▶ encode ──▶ archive
//! (md/html)     (HTML→PDF)  (pdfium)   (png/jpeg)  (zip, ≥ 2 pages)
//! ```
//!
//! 1. [`normalize`]: Markdown or HTML source → complete HTML document
//! 2. [`render`]   : HTML + stylesheets → PDF bytes via an external program
//! 3. [`raster`]   : PDF → one image per page; runs in `spawn_blocking`
//!    because pdfium is a synchronous C library
//! 4. [`encode`]   : page image → PNG, or JPEG composited onto white
//! 5. [`archive`]  : encoded pages → deflate zip with `page_NNN.ext` entries
//!
//! [`render`] and [`raster`] expose traits ([`render::PdfRenderer`],
//! [`raster::Rasterizer`]) so the orchestrator can run against stubs.

pub mod archive;
pub mod encode;
pub mod normalize;
pub mod raster;
pub mod render;
