//! # docpress
//!
//! Convert Markdown and HTML documents into styled PDFs, page images, or
//! zipped sets of page images.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown / HTML
//!  │
//!  ├─ 1. Normalize  wrap into a complete UTF-8 HTML document (comrak for Markdown)
//!  ├─ 2. Render     HTML + stylesheet → PDF (external typesetter, WeasyPrint by default)
//!  ├─ 3. Rasterize  PDF → page images via pdfium (image output only)
//!  ├─ 4. Encode     PNG, or JPEG composited onto white
//!  └─ 5. Package    one page → single image; two or more → zip archive
//! ```
//!
//! Image requests are answered with a single image for one-page documents and
//! with a zip archive (`page_001.png`, `page_002.png`, …) otherwise. Check
//! [`OutputArtifact::kind`] or [`OutputArtifact::media_type`] before serving.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docpress::{ConversionConfig, ConversionRequest, Converter, ImageFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = Converter::new(ConversionConfig::default());
//!
//!     let pdf = converter
//!         .convert(ConversionRequest::markdown("# Title\n\nHello"))
//!         .await?;
//!     println!("{} → {}", pdf.file_name, pdf.path.display());
//!
//!     let pages = converter
//!         .convert(ConversionRequest::from_path("report.md")?.to_image(ImageFormat::Png))
//!         .await?;
//!     println!("{} ({})", pages.file_name, pages.media_type());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docpress` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! docpress = { version = "0.1", default-features = false }
//! ```
//!
//! ## Runtime requirements
//!
//! PDF rendering shells out to `weasyprint` (or any program configured on
//! [`CommandRenderer`]). Image output needs the pdfium shared library; see
//! [`PdfiumRasterizer`] for the search order.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod request;
pub mod temp;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, ImageFormat, OutputKind, SourceFormat};
pub use convert::{convert, convert_sync, move_artifact, Converter};
pub use error::{DocPressError, ErrorKind, RasterError, RenderError};
pub use output::{download_name, ArtifactKind, OutputArtifact};
pub use pipeline::normalize::NormalizedDocument;
pub use pipeline::raster::{PageImage, PdfiumRasterizer, RasterOptions, Rasterizer};
pub use pipeline::render::{CommandRenderer, PdfRenderer};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, PipelineState, ProgressCallback};
pub use request::ConversionRequest;
pub use temp::TempResources;
