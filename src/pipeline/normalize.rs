//! Document normalisation: Markdown or HTML source → complete HTML document.
//!
//! The renderer always receives a full document with a root element, a
//! `<head>` declaring UTF-8 and a `<body>`. Markdown goes through comrak with
//! a fixed GitHub-flavoured profile first; HTML fragments are wrapped
//! verbatim. Input that already has an `<html>` root is passed through
//! untouched, so a document is never wrapped twice.

use crate::config::SourceFormat;
use comrak::{markdown_to_html, Options};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Case-insensitive `<html` followed by a tag boundary (space, `>` or `/`).
static RE_DOCUMENT_ROOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<html\b").unwrap());

/// A complete, self-contained HTML document ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDocument(String);

impl NormalizedDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Turn `content` into a complete HTML document.
pub fn normalize(content: &str, format: SourceFormat) -> NormalizedDocument {
    match format {
        SourceFormat::Markdown => NormalizedDocument(wrap_document(&render_markdown(content))),
        SourceFormat::Html if is_full_document(content) => NormalizedDocument(content.to_string()),
        SourceFormat::Html => NormalizedDocument(wrap_document(content)),
    }
}

/// True when `html` already contains a document root tag.
pub fn is_full_document(html: &str) -> bool {
    RE_DOCUMENT_ROOT.is_match(html)
}

/// Render Markdown to an HTML fragment.
///
/// Profile: fenced code, GFM tables, newline → `<br>`, heading anchors,
/// footnotes, strikethrough and task lists. Raw HTML inside Markdown is
/// escaped, never passed through, so the fragment cannot smuggle in a
/// second document root.
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    options.extension.header_ids = Some(String::new());
    options.render.hardbreaks = true;
    options.render.escape = true;
    markdown_to_html(markdown, &options)
}

/// Minimal document shell around a body fragment.
///
/// The fragment is inserted byte-for-byte.
pub fn wrap_document(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
<html lang=\"en\">\n\
<head>\n\
    <meta charset=\"UTF-8\">\n\
    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
    <title>Document</title>\n\
</head>\n\
<body>\n\
{body}\n\
</body>\n\
</html>\n"
    )
}
