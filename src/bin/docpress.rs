//! CLI binary for docpress.
//!
//! A thin shim over the library crate: reads one Markdown/HTML file, maps
//! flags onto a `ConversionRequest` + `ConversionConfig`, and writes the
//! resulting artifact next to the input (or to `--output`).

use anyhow::{Context, Result};
use clap::Parser;
use docpress::{
    move_artifact, CommandRenderer, ConversionConfig, ConversionProgressCallback,
    ConversionRequest, Converter, OutputArtifact, PdfiumRasterizer, PipelineState,
    ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that follows the pipeline state and counts encoded pages.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("docpress");
        bar.set_message("Reading input…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_state(&self, state: PipelineState) {
        let msg = match state {
            PipelineState::Received => "Normalising document…".to_string(),
            PipelineState::Normalized => "Rendering PDF…".to_string(),
            PipelineState::Rendered => "PDF rendered".to_string(),
            PipelineState::Rasterized { pages } => format!("Encoding {pages} page(s)…"),
            state if state.is_terminal() => {
                self.bar.finish_and_clear();
                return;
            }
            other => other.to_string(),
        };
        self.bar.set_message(msg);
    }

    fn on_page_encoded(&self, page: usize, total: usize) {
        self.bar.set_message(format!("Encoded page {page}/{total}"));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Markdown to PDF (writes notes.pdf)
  docpress notes.md

  # HTML to PNG; a multi-page document produces page.zip instead
  docpress page.html --image png

  # Custom stylesheet replaces the default one entirely
  docpress report.md --css print.css -o out/report.pdf

  # House style used when no --css is given
  docpress report.md --default-css /etc/docpress/style.css

  # Machine-readable result
  docpress report.md --image jpg --json

OUTPUT SHAPE:
  PDF requests always produce one .pdf file. Image requests produce a single
  .png/.jpg/.jpeg for one-page documents and a .zip of page_001.<ext>,
  page_002.<ext>, … when the document spans two or more pages.

ENVIRONMENT VARIABLES:
  DOCPRESS_RENDERER     HTML→PDF program (default: weasyprint)
  DOCPRESS_DEFAULT_CSS  Default stylesheet
  DOCPRESS_DPI          Rasterisation DPI (default: 150)
  DOCPRESS_TEMP_DIR     Scratch directory (default: system temp dir)
  PDFIUM_LIB_PATH       Directory containing the pdfium shared library
  RUST_LOG              Log filter (overrides -v / -q)
"#;

/// Convert Markdown and HTML documents to PDF or page images.
#[derive(Parser, Debug)]
#[command(
    name = "docpress",
    version,
    about = "Convert Markdown and HTML documents to PDF or page images",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Source document (.md, .markdown, .html, .htm).
    input: PathBuf,

    /// Output path. Default: the input path with the artifact's extension.
    #[arg(short, long, env = "DOCPRESS_OUTPUT")]
    output: Option<PathBuf>,

    /// Stylesheet applied instead of the default one.
    #[arg(short = 'c', long = "css", env = "DOCPRESS_CSS")]
    css: Option<PathBuf>,

    /// Rasterise to images: png, jpg or jpeg.
    #[arg(long, value_name = "FORMAT")]
    image: Option<String>,

    /// Target pixel width for image output.
    #[arg(long)]
    width: Option<u32>,

    /// Rasterisation DPI (72–600).
    #[arg(long, env = "DOCPRESS_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Stylesheet used when --css is not given.
    #[arg(long, env = "DOCPRESS_DEFAULT_CSS")]
    default_css: Option<PathBuf>,

    /// HTML→PDF renderer program.
    #[arg(long, env = "DOCPRESS_RENDERER", default_value = "weasyprint")]
    renderer: String,

    /// Directory containing the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Scratch directory for intermediate files.
    #[arg(long, env = "DOCPRESS_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Print the artifact description as JSON on stdout.
    #[arg(long, env = "DOCPRESS_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "DOCPRESS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCPRESS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCPRESS_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.verbose;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build request ────────────────────────────────────────────────────
    let request = build_request(&cli).await?;

    // ── Build converter ──────────────────────────────────────────────────
    let converter = build_converter(&cli, show_progress)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let artifact = converter
        .convert(request)
        .await
        .with_context(|| format!("Failed to convert {}", cli.input.display()))?;

    let dest = output_path(cli.output.as_deref(), &cli.input, &artifact);
    let artifact = move_artifact(artifact, &dest)
        .await
        .context("Failed to write output")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&artifact).context("Failed to serialise output")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  {}  {}  →  {}",
            green("✔"),
            artifact.media_type(),
            dim(&format!("{} bytes", artifact.size_bytes)),
            bold(&dest.display().to_string()),
        );
    }

    Ok(())
}

/// Map input file + CLI flags to a `ConversionRequest`.
async fn build_request(cli: &Cli) -> Result<ConversionRequest> {
    let mut request = ConversionRequest::from_path(&cli.input)
        .with_context(|| format!("Cannot use {} as input", cli.input.display()))?;

    if let Some(ref token) = cli.image {
        request = request.to_image_token(token)?;
    }
    if let Some(width) = cli.width {
        request = request.with_target_width(width);
    }
    if let Some(ref path) = cli.css {
        let css = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read stylesheet from {:?}", path))?;
        request = request.with_stylesheet(css);
    }
    Ok(request)
}

/// Map CLI flags to a `Converter`.
fn build_converter(cli: &Cli, show_progress: bool) -> Result<Converter> {
    let mut builder = ConversionConfig::builder().dpi(cli.dpi);
    if let Some(ref css) = cli.default_css {
        builder = builder.default_stylesheet(css);
    }
    if let Some(ref dir) = cli.temp_dir {
        builder = builder.temp_root(dir);
    }
    let config = builder.build().context("Invalid configuration")?;

    let mut rasterizer = PdfiumRasterizer::new();
    if let Some(ref dir) = cli.pdfium_lib {
        rasterizer = rasterizer.with_library_path(dir);
    }

    let mut converter = Converter::new(config)
        .with_renderer(CommandRenderer::new(&cli.renderer))
        .with_rasterizer(rasterizer);
    if show_progress {
        let cb: ProgressCallback = CliProgressCallback::new();
        converter = converter.with_progress(cb);
    }
    Ok(converter)
}

/// Where the artifact is written.
///
/// Without `--output` this is `input` with the artifact's extension. An
/// explicit path is kept, except that archive output always ends in `.zip`.
fn output_path(requested: Option<&Path>, input: &Path, artifact: &OutputArtifact) -> PathBuf {
    let Some(path) = requested else {
        return input.with_extension(artifact.kind.extension());
    };
    let is_zip = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("zip"));
    if artifact.is_archive() && !is_zip {
        let swapped = path.with_extension("zip");
        warn!(
            "Document has several pages; writing archive to {} instead of {}",
            swapped.display(),
            path.display()
        );
        return swapped;
    }
    path.to_path_buf()
}
