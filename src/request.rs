//! Conversion requests and the input validation that precedes them.
//!
//! Everything that can make a submission invalid (unknown extension,
//! non-UTF-8 bytes, unknown image token) is checked while *building* a
//! [`ConversionRequest`]. A request that exists is therefore always valid, and
//! an invalid submission never reaches the pipeline or touches the temp area.

use crate::config::{ImageFormat, OutputKind, SourceFormat};
use crate::error::DocPressError;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::path::Path;
use tracing::debug;

/// One document to convert, plus the caller's output choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// Document source text.
    pub content: String,
    pub source_format: SourceFormat,
    pub output: OutputKind,
    /// Stylesheet text that replaces the configured default entirely.
    pub custom_stylesheet: Option<String>,
    /// Pixel-width hint for image output.
    pub target_width: Option<NonZeroU32>,
    /// Base name for the downloadable artifact (extension optional).
    pub file_name: Option<String>,
}

impl ConversionRequest {
    /// A request for `content` in `source_format`, rendered to PDF.
    pub fn new(content: impl Into<String>, source_format: SourceFormat) -> Self {
        Self {
            content: content.into(),
            source_format,
            output: OutputKind::Pdf,
            custom_stylesheet: None,
            target_width: None,
            file_name: None,
        }
    }

    /// Inline Markdown text.
    pub fn markdown(content: impl Into<String>) -> Self {
        Self::new(content, SourceFormat::Markdown)
    }

    /// Inline HTML text (fragment or full document).
    pub fn html(content: impl Into<String>) -> Self {
        Self::new(content, SourceFormat::Html)
    }

    /// Validate an uploaded file: extension picks the source format and the
    /// bytes must decode as UTF-8. The upload's stem becomes the download name.
    pub fn from_upload(file_name: &str, bytes: &[u8]) -> Result<Self, DocPressError> {
        let source_format = SourceFormat::from_path(file_name)?;
        let content = decode_utf8(bytes)?;
        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string);
        debug!(
            "Accepted upload '{}' as {:?} ({} bytes)",
            file_name,
            source_format,
            bytes.len()
        );
        Ok(Self {
            file_name: stem,
            ..Self::new(content, source_format)
        })
    }

    /// Read a document from local storage, inferring the format from its extension.
    ///
    /// The extension is checked before the file is read.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DocPressError> {
        let path = path.as_ref();
        SourceFormat::from_path(path)?;
        let bytes = std::fs::read(path).map_err(|e| DocPressError::InputReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        Self::from_upload(name, &bytes)
    }

    /// Ask for PDF output.
    pub fn to_pdf(mut self) -> Self {
        self.output = OutputKind::Pdf;
        self
    }

    /// Ask for image output in `format`.
    pub fn to_image(mut self, format: ImageFormat) -> Self {
        self.output = OutputKind::Image(format);
        self
    }

    /// Ask for image output from a caller-supplied token (`png`, `jpg`, `jpeg`).
    pub fn to_image_token(self, token: &str) -> Result<Self, DocPressError> {
        let format = token.parse::<ImageFormat>()?;
        Ok(self.to_image(format))
    }

    pub fn with_stylesheet(mut self, css: impl Into<String>) -> Self {
        self.custom_stylesheet = Some(css.into());
        self
    }

    /// Set the width hint; zero clears it.
    pub fn with_target_width(mut self, width: u32) -> Self {
        self.target_width = NonZeroU32::new(width);
        self
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// The requested image format, or `None` for PDF output.
    pub fn image_format(&self) -> Option<ImageFormat> {
        match self.output {
            OutputKind::Pdf => None,
            OutputKind::Image(format) => Some(format),
        }
    }
}

/// Decode submitted bytes as UTF-8, rejecting anything else.
pub fn decode_utf8(bytes: &[u8]) -> Result<String, DocPressError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| DocPressError::InvalidUtf8 {
        valid_up_to: e.utf8_error().valid_up_to(),
    })
}
