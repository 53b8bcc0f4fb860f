//! Configuration types for document conversion.
//!
//! Process-wide knobs live in [`ConversionConfig`], built via its
//! [`ConversionConfigBuilder`]. Per-request choices (source format, output
//! kind, image format, custom stylesheet) live on
//! [`crate::request::ConversionRequest`] instead, so one config can be shared
//! by every concurrent request.

use crate::error::DocPressError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Configuration shared by every conversion a [`crate::Converter`] runs.
///
/// # Example
/// ```rust
/// use docpress::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .dpi(200)
///     .default_stylesheet("style.css")
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 200);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Rasterisation resolution for image output. Range: 72–600. Default: 150.
    pub dpi: u32,

    /// House stylesheet applied when a request carries no custom stylesheet.
    ///
    /// Read-only and shared across concurrent conversions. A configured path
    /// that does not exist is ignored (rendering proceeds unstyled).
    pub default_stylesheet: Option<PathBuf>,

    /// Root directory for scratch files and finished artifacts.
    /// Default: the platform temp directory.
    pub temp_root: PathBuf,

    /// Zero-padding width of archive entry names (`page_001.png`). Range: 1–9. Default: 3.
    pub page_name_width: usize,

    /// JPEG quality for image output. Range: 1–100. Default: 95.
    pub jpeg_quality: u8,

    /// Forward a request's `target_width` hint to the rasteriser. Default: true.
    pub pass_target_width: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: 150,
            default_stylesheet: None,
            temp_root: std::env::temp_dir(),
            page_name_width: 3,
            jpeg_quality: 95,
            pass_target_width: true,
        }
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The default stylesheet, if one is configured *and* present on disk.
    pub fn usable_default_stylesheet(&self) -> Option<&Path> {
        match self.default_stylesheet.as_deref() {
            Some(path) if path.is_file() => Some(path),
            Some(path) => {
                tracing::warn!(
                    "Default stylesheet {} not found; rendering unstyled",
                    path.display()
                );
                None
            }
            None => None,
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn default_stylesheet(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.default_stylesheet = Some(path.into());
        self
    }

    pub fn temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.temp_root = root.into();
        self
    }

    pub fn page_name_width(mut self, width: usize) -> Self {
        self.config.page_name_width = width;
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality;
        self
    }

    pub fn pass_target_width(mut self, v: bool) -> Self {
        self.config.pass_target_width = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, DocPressError> {
        let c = &self.config;
        if !(72..=600).contains(&c.dpi) {
            return Err(DocPressError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if !(1..=9).contains(&c.page_name_width) {
            return Err(DocPressError::InvalidConfig(format!(
                "Page name width must be 1–9, got {}",
                c.page_name_width
            )));
        }
        if !(1..=100).contains(&c.jpeg_quality) {
            return Err(DocPressError::InvalidConfig(format!(
                "JPEG quality must be 1–100, got {}",
                c.jpeg_quality
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Markup language of the submitted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Markdown,
    Html,
}

impl SourceFormat {
    /// Infer the source format from a file extension (with or without the dot).
    pub fn from_extension(ext: &str) -> Result<Self, DocPressError> {
        let normalized = ext.trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "md" | "markdown" => Ok(SourceFormat::Markdown),
            "html" | "htm" => Ok(SourceFormat::Html),
            _ => Err(DocPressError::UnsupportedExtension {
                extension: if ext.is_empty() {
                    "(none)".to_string()
                } else {
                    format!(".{normalized}")
                },
            }),
        }
    }

    /// Infer the source format from a file name or path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DocPressError> {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        Self::from_extension(ext)
    }
}

/// What the caller wants back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Pdf,
    Image(ImageFormat),
}

/// Target format for rasterised pages.
///
/// `Jpeg` remembers whether the caller spelled it `jpg` or `jpeg` so the
/// download name keeps the caller's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg { short_ext: bool },
}

impl ImageFormat {
    /// JPEG with the `.jpg` extension.
    pub const JPG: ImageFormat = ImageFormat::Jpeg { short_ext: true };
    /// JPEG with the `.jpeg` extension.
    pub const JPEG: ImageFormat = ImageFormat::Jpeg { short_ext: false };

    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg { short_ext: true } => "jpg",
            ImageFormat::Jpeg { short_ext: false } => "jpeg",
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg { .. } => "image/jpeg",
        }
    }

    /// Whether the format can carry an alpha channel.
    pub fn supports_alpha(&self) -> bool {
        matches!(self, ImageFormat::Png)
    }
}

impl FromStr for ImageFormat {
    type Err = DocPressError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" => Ok(ImageFormat::JPG),
            "jpeg" => Ok(ImageFormat::JPEG),
            _ => Err(DocPressError::UnsupportedImageFormat {
                token: token.to_string(),
            }),
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
