//! PDF rasterisation: intermediate PDF → one `DynamicImage` per page via pdfium.
//!
//! Pages come back in document order with 1-based indices. The orchestrator
//! calls [`Rasterizer::rasterize`] from `spawn_blocking`, since pdfium is a
//! synchronous C library and page rendering is CPU-bound.
//!
//! ## Resolution
//!
//! Pages are scaled by `dpi / 72` (PDF user space is 72 units per inch), so
//! the default 150 DPI turns a US-letter page into 1275 × 1650 px. When a
//! target width is supplied it takes precedence and the height follows the
//! page's aspect ratio.

use crate::error::RasterError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// PDF user-space units per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// One rasterised page.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 1-based page number.
    pub index: usize,
    pub image: DynamicImage,
}

/// How pages should be rasterised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterOptions {
    pub dpi: u32,
    /// Target pixel width; overrides `dpi` when set.
    pub target_width: Option<u32>,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            dpi: 150,
            target_width: None,
        }
    }
}

/// Something that can turn a PDF file into page images.
pub trait Rasterizer: Send + Sync {
    /// Rasterise every page of `pdf`, in order.
    fn rasterize(&self, pdf: &Path, options: &RasterOptions) -> Result<Vec<PageImage>, RasterError>;
}

/// pdfium-backed rasteriser.
///
/// The library is looked up in `library_path` (when set), then next to the
/// executable, then in `/usr/lib` and `/usr/local/lib`, and finally through
/// the system loader.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRasterizer {
    library_path: Option<PathBuf>,
}

impl PdfiumRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory containing the pdfium shared library.
    pub fn with_library_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.library_path = Some(dir.into());
        self
    }

    fn bind(&self) -> Result<Pdfium, RasterError> {
        if let Some(ref dir) = self.library_path {
            if let Ok(bindings) =
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            {
                debug!("Bound pdfium from {}", dir.display());
                return Ok(Pdfium::new(bindings));
            }
        }

        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("/usr/lib"))
            })
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                    "/usr/local/lib",
                ))
            })
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| RasterError::Unavailable(format!("{e:?}")))?;

        Ok(Pdfium::new(bindings))
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn rasterize(&self, pdf: &Path, options: &RasterOptions) -> Result<Vec<PageImage>, RasterError> {
        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_file(pdf, None)
            .map_err(|e| RasterError::Load(format!("{e:?}")))?;

        let pages = document.pages();
        let total = pages.len() as usize;
        info!("PDF loaded for rasterisation: {} pages", total);
        if total == 0 {
            return Err(RasterError::NoPages);
        }

        let render_config = render_config(options);
        let mut results = Vec::with_capacity(total);

        for (i, page) in pages.iter().enumerate() {
            let index = i + 1;
            let bitmap = page
                .render_with_config(&render_config)
                .map_err(|e| RasterError::Page {
                    page: index,
                    detail: format!("{e:?}"),
                })?;

            let image = bitmap.as_image();
            debug!(
                "Rasterised page {} → {}x{} px",
                index,
                image.width(),
                image.height()
            );
            results.push(PageImage { index, image });
        }

        Ok(results)
    }
}

fn render_config(options: &RasterOptions) -> PdfRenderConfig {
    match options.target_width {
        Some(width) => PdfRenderConfig::new().set_target_width(width as i32),
        None => PdfRenderConfig::new().scale_page_by_factor(scale_factor(options.dpi)),
    }
}

/// Pixels per PDF point at `dpi`.
fn scale_factor(dpi: u32) -> f32 {
    dpi as f32 / POINTS_PER_INCH
}
