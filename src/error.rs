//! Error types for the docpress library.
//!
//! Three error types reflect where a conversion can go wrong:
//!
//! * [`DocPressError`]: **Fatal for the request**: returned as
//!   `Err(DocPressError)` from every `convert*` entry point. Each variant maps
//!   onto one [`ErrorKind`] so transport layers can pick a status code without
//!   matching on every variant.
//!
//! * [`RenderError`]: the HTML → PDF stage failed. Wrapped by
//!   [`DocPressError::Render`].
//!
//! * [`RasterError`]: the PDF → page images stage failed or produced no
//!   pages. Wrapped by [`DocPressError::Raster`].
//!
//! Stage errors stay distinct types so the failing stage survives all the way
//! to the caller instead of being flattened into a generic message.

use std::path::PathBuf;
use thiserror::Error;

/// Maximum number of bytes of collaborator diagnostics kept in an error.
const DETAIL_LIMIT: usize = 512;

/// Coarse classification of a [`DocPressError`].
///
/// `InvalidInput` is the caller's fault (4xx); every other kind is a
/// server-side failure (5xx).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    Render,
    Raster,
    Resource,
    Internal,
}

/// All fatal errors returned by the docpress library.
#[derive(Debug, Error)]
pub enum DocPressError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The source file extension is not one of `.md`, `.markdown`, `.html`, `.htm`.
    #[error("Unsupported file type '{extension}'. Supported: .md, .markdown, .html, .htm")]
    UnsupportedExtension { extension: String },

    /// The submitted content is not valid UTF-8 text.
    #[error("Input must be UTF-8 encoded text (invalid byte at offset {valid_up_to})")]
    InvalidUtf8 { valid_up_to: usize },

    /// The requested image format token is not recognised.
    #[error("Unsupported image format '{token}'. Supported: png, jpg, jpeg")]
    UnsupportedImageFormat { token: String },

    /// Could not read the source document from local storage.
    #[error("Failed to read input file '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Stage errors ──────────────────────────────────────────────────────
    /// The HTML → PDF stage failed.
    #[error("Failed to generate PDF: {0}")]
    Render(#[from] RenderError),

    /// The PDF → image stage failed.
    #[error("Failed to rasterise PDF: {0}")]
    Raster(#[from] RasterError),

    /// A rasterised page could not be encoded to the target image format.
    #[error("Failed to encode page {page}: {detail}")]
    EncodeFailed { page: usize, detail: String },

    /// The page archive could not be written.
    #[error("Failed to package {pages} pages: {detail}")]
    ArchiveFailed { pages: usize, detail: String },

    // ── Resource errors ───────────────────────────────────────────────────
    /// A scratch file or directory could not be created, written or removed.
    #[error("Temporary resource error ({detail}): {source}")]
    Resource {
        detail: String,
        #[source]
        source: std::io::Error,
    },

    /// Could not move the finished artifact to its destination.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (e.g. a blocking task panicked).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocPressError {
    /// Classify this error for status-code mapping.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DocPressError::UnsupportedExtension { .. }
            | DocPressError::InvalidUtf8 { .. }
            | DocPressError::UnsupportedImageFormat { .. }
            | DocPressError::InputReadFailed { .. } => ErrorKind::InvalidInput,
            DocPressError::Render(_) => ErrorKind::Render,
            DocPressError::Raster(_) => ErrorKind::Raster,
            DocPressError::Resource { .. } | DocPressError::OutputWriteFailed { .. } => {
                ErrorKind::Resource
            }
            DocPressError::EncodeFailed { .. }
            | DocPressError::ArchiveFailed { .. }
            | DocPressError::InvalidConfig(_)
            | DocPressError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// True when the caller should fix the request (4xx-class).
    pub fn is_client_error(&self) -> bool {
        self.kind() == ErrorKind::InvalidInput
    }

    pub(crate) fn resource(detail: impl Into<String>, source: std::io::Error) -> Self {
        DocPressError::Resource {
            detail: detail.into(),
            source,
        }
    }
}

/// Failure of the HTML → PDF renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The renderer program could not be started.
    #[error("could not start renderer '{program}': {detail}")]
    Spawn { program: String, detail: String },

    /// The renderer ran but reported a failure.
    #[error("renderer exited with {status}: {detail}")]
    Failed { status: String, detail: String },

    /// The renderer reported success but produced no PDF.
    #[error("renderer produced no PDF output")]
    EmptyOutput,

    /// Any other renderer-side fault.
    #[error("{0}")]
    Other(String),
}

/// Failure of the PDF → page-image rasteriser.
#[derive(Debug, Error)]
pub enum RasterError {
    /// The rasteriser backend (pdfium) could not be loaded.
    #[error("rasteriser unavailable: {0}")]
    Unavailable(String),

    /// The intermediate PDF could not be opened.
    #[error("could not open PDF: {0}")]
    Load(String),

    /// A single page failed to render.
    #[error("page {page} failed to render: {detail}")]
    Page { page: usize, detail: String },

    /// The PDF rasterised to zero pages.
    #[error("rasterisation produced no pages")]
    NoPages,
}

/// Trim collaborator diagnostics to a readable, bounded summary.
///
/// Cuts on a `char` boundary and collapses the text to its first
/// [`DETAIL_LIMIT`] bytes so raw stack traces never reach end users.
pub(crate) fn summarize(detail: &str) -> String {
    let trimmed = detail.trim();
    if trimmed.len() <= DETAIL_LIMIT {
        return trimmed.to_string();
    }
    let mut end = DETAIL_LIMIT;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\u{2026}", &trimmed[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_client_errors() {
        let e = DocPressError::UnsupportedExtension {
            extension: ".txt".into(),
        };
        assert!(e.is_client_error());
        assert!(e.to_string().contains(".txt"), "got: {e}");

        let e = DocPressError::UnsupportedImageFormat { token: "gif".into() };
        assert_eq!(e.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn stage_errors_keep_their_kind() {
        let e: DocPressError = RenderError::EmptyOutput.into();
        assert_eq!(e.kind(), ErrorKind::Render);
        assert!(!e.is_client_error());

        let e: DocPressError = RasterError::NoPages.into();
        assert_eq!(e.kind(), ErrorKind::Raster);
        assert!(e.to_string().contains("no pages"));
    }

    #[test]
    fn resource_error_display() {
        let e = DocPressError::resource(
            "create stylesheet",
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        );
        assert_eq!(e.kind(), ErrorKind::Resource);
        assert!(e.to_string().contains("disk full"));
    }

    #[test]
    fn summarize_bounds_long_detail() {
        let long = "é".repeat(1000);
        let s = summarize(&long);
        assert!(s.len() <= DETAIL_LIMIT + '\u{2026}'.len_utf8());
        assert!(s.ends_with('\u{2026}'));
        assert_eq!(summarize("  short  "), "short");
    }
}
