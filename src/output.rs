//! The deliverable produced by a successful conversion.

use crate::config::ImageFormat;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Shape of an [`OutputArtifact`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArtifactKind {
    /// The rendered PDF itself.
    Pdf,
    /// A single-page document rasterised to one image.
    Image { format: ImageFormat },
    /// A multi-page document: one image per page inside a zip archive.
    Archive { format: ImageFormat, pages: usize },
}

impl ArtifactKind {
    pub fn media_type(&self) -> &'static str {
        match self {
            ArtifactKind::Pdf => "application/pdf",
            ArtifactKind::Image { format } => format.media_type(),
            ArtifactKind::Archive { .. } => "application/zip",
        }
    }

    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Pdf => "pdf",
            ArtifactKind::Image { format } => format.extension(),
            ArtifactKind::Archive { .. } => "zip",
        }
    }
}

/// A finished conversion result on disk.
///
/// The pipeline hands the backing file over to the caller: once delivered,
/// call [`OutputArtifact::discard`] (or delete `path` yourself).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputArtifact {
    /// Location of the artifact bytes.
    pub path: PathBuf,
    pub kind: ArtifactKind,
    /// Suggested download name, e.g. `report.pdf` or `report.zip`.
    pub file_name: String,
    pub size_bytes: u64,
}

impl OutputArtifact {
    pub fn media_type(&self) -> &'static str {
        self.kind.media_type()
    }

    pub fn is_archive(&self) -> bool {
        matches!(self.kind, ArtifactKind::Archive { .. })
    }

    pub fn read(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }

    /// Delete the backing file.
    pub fn discard(self) -> std::io::Result<()> {
        std::fs::remove_file(&self.path)
    }
}

static RE_UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\/:*?"<>|\x00-\x1f]+"#).unwrap());

/// Extensions stripped from a caller-supplied base name before the artifact
/// extension is appended.
const KNOWN_EXTENSIONS: &[&str] = &[
    "pdf", "png", "jpg", "jpeg", "zip", "md", "markdown", "html", "htm",
];

/// Build a download name: `base` (default `document`) with `extension`.
///
/// A base that already ends in a known document/image extension has it
/// replaced, so `report.png` becomes `report.zip` for archive output.
/// Path separators and control characters are replaced with `_`.
pub fn download_name(base: Option<&str>, extension: &str) -> String {
    let raw = base.map(str::trim).filter(|b| !b.is_empty()).unwrap_or("document");
    let raw = Path::new(raw)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document");

    let stem = match raw.rsplit_once('.') {
        Some((stem, ext)) if KNOWN_EXTENSIONS.iter().any(|k| k.eq_ignore_ascii_case(ext)) => stem,
        _ => raw,
    };

    let cleaned = RE_UNSAFE_CHARS.replace_all(stem, "_");
    let cleaned = cleaned.trim_matches(|c| c == '_' || c == ' ' || c == '.');
    let stem = if cleaned.is_empty() { "document" } else { cleaned };
    format!("{stem}.{extension}")
}
