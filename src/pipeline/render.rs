//! HTML → PDF rendering.
//!
//! The orchestrator only sees the [`PdfRenderer`] trait: one blocking call
//! that turns a normalised document plus an ordered list of stylesheet
//! files into PDF bytes. [`CommandRenderer`] is the production backend and
//! drives an external HTML/CSS typesetter (WeasyPrint by default) over
//! stdin/stdout.
//!
//! ## Stylesheets
//!
//! Typesetters in this space take stylesheets by reference (`-s file.css`),
//! not by value. A custom stylesheet is therefore staged to a scratch file by
//! the orchestrator before it calls [`PdfRenderer::render`].

use crate::error::{summarize, RenderError};
use crate::pipeline::normalize::NormalizedDocument;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Something that can typeset an HTML document into a PDF.
///
/// Implementations are called from a blocking thread and must be shareable
/// across concurrent conversions.
pub trait PdfRenderer: Send + Sync {
    /// Render `html` with `stylesheets` applied in order.
    fn render(
        &self,
        html: &NormalizedDocument,
        stylesheets: &[PathBuf],
    ) -> Result<Vec<u8>, RenderError>;
}

/// Pick the stylesheets for one render.
///
/// A custom stylesheet is the *only* one applied; the default is used only
/// when there is no custom one. With neither, rendering is unstyled.
pub fn select_stylesheets(custom: Option<&Path>, default: Option<&Path>) -> Vec<PathBuf> {
    match (custom, default) {
        (Some(custom), _) => vec![custom.to_path_buf()],
        (None, Some(default)) => vec![default.to_path_buf()],
        (None, None) => Vec::new(),
    }
}

/// Renders by piping HTML through an external program.
///
/// Invocation: `{program} {args…} [{stylesheet_flag} {css}]… [--base-url {dir}] - -`
/// (HTML on stdin, PDF on stdout).
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
    stylesheet_flag: String,
    base_url: Option<PathBuf>,
}

impl Default for CommandRenderer {
    fn default() -> Self {
        Self::new("weasyprint")
    }
}

impl CommandRenderer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stylesheet_flag: "-s".to_string(),
            base_url: None,
        }
    }

    /// Extra arguments placed before the stylesheet flags.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn stylesheet_flag(mut self, flag: impl Into<String>) -> Self {
        self.stylesheet_flag = flag.into();
        self
    }

    /// Directory relative URLs (images, links) in the document resolve against.
    pub fn base_url(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_url = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, stylesheets: &[PathBuf]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for css in stylesheets {
            cmd.arg(&self.stylesheet_flag).arg(css);
        }
        if let Some(ref base) = self.base_url {
            cmd.arg("--base-url").arg(base);
        }
        cmd.arg("-").arg("-");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl PdfRenderer for CommandRenderer {
    fn render(
        &self,
        html: &NormalizedDocument,
        stylesheets: &[PathBuf],
    ) -> Result<Vec<u8>, RenderError> {
        debug!(
            "Rendering {} bytes of HTML with {} ({} stylesheet(s))",
            html.as_str().len(),
            self.program,
            stylesheets.len()
        );

        let mut child = self
            .command(stylesheets)
            .spawn()
            .map_err(|e| RenderError::Spawn {
                program: self.program.clone(),
                detail: e.to_string(),
            })?;

        // Feed stdin from its own thread: a large document would otherwise
        // deadlock against a renderer that is already filling stdout.
        let stdin = child.stdin.take();
        let input = html.as_str().as_bytes().to_vec();
        let writer = std::thread::spawn(move || -> std::io::Result<()> {
            if let Some(mut stdin) = stdin {
                stdin.write_all(&input)?;
            }
            Ok(())
        });

        let output = child.wait_with_output().map_err(|e| RenderError::Other(e.to_string()))?;
        let fed = writer
            .join()
            .map_err(|_| RenderError::Other("stdin writer panicked".to_string()))?;

        if !output.status.success() {
            return Err(RenderError::Failed {
                status: output.status.to_string(),
                detail: summarize(&String::from_utf8_lossy(&output.stderr)),
            });
        }
        if let Err(e) = fed {
            return Err(RenderError::Other(format!("could not send HTML: {e}")));
        }
        if output.stdout.is_empty() {
            return Err(RenderError::EmptyOutput);
        }
        if !output.stdout.starts_with(b"%PDF") {
            return Err(RenderError::Other(
                "renderer output is not a PDF document".to_string(),
            ));
        }

        debug!("Renderer produced {} bytes of PDF", output.stdout.len());
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceFormat;
    use crate::pipeline::normalize::normalize;

    #[test]
    fn custom_stylesheet_replaces_default() {
        let custom = Path::new("/tmp/custom.css");
        let default = Path::new("/srv/style.css");
        assert_eq!(
            select_stylesheets(Some(custom), Some(default)),
            vec![custom.to_path_buf()]
        );
        assert_eq!(
            select_stylesheets(None, Some(default)),
            vec![default.to_path_buf()]
        );
        assert!(select_stylesheets(None, None).is_empty());
    }

    #[test]
    fn command_line_layout() {
        let renderer = CommandRenderer::new("weasyprint")
            .args(["--presentational-hints"])
            .base_url("/docs");
        let cmd = renderer.command(&[PathBuf::from("a.css"), PathBuf::from("b.css")]);
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            [
                "--presentational-hints",
                "-s",
                "a.css",
                "-s",
                "b.css",
                "--base-url",
                "/docs",
                "-",
                "-"
            ]
        );
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let renderer = CommandRenderer::new("docpress-no-such-renderer-binary");
        let doc = normalize("# x", SourceFormat::Markdown);
        let err = renderer.render(&doc, &[]).unwrap_err();
        assert!(matches!(err, RenderError::Spawn { .. }), "got {err:?}");
    }

    #[cfg(unix)]
    #[test]
    fn failing_program_reports_stderr() {
        let renderer = CommandRenderer::new("sh").args(["-c", "echo boom >&2; exit 3", "sh"]);
        let doc = normalize("<p>x</p>", SourceFormat::Html);
        match renderer.render(&doc, &[]).unwrap_err() {
            RenderError::Failed { detail, .. } => assert!(detail.contains("boom"), "{detail}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn non_pdf_output_is_rejected() {
        // `cat` echoes the HTML back; extra "-" args are read as stdin again.
        let renderer = CommandRenderer::new("cat");
        let doc = normalize("<p>x</p>", SourceFormat::Html);
        let err = renderer.render(&doc, &[]).unwrap_err();
        assert!(matches!(err, RenderError::Other(_)), "got {err:?}");
    }
}
