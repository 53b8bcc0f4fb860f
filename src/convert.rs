//! Conversion orchestrator.
//!
//! [`Converter`] runs one request through the pipeline:
//!
//! ```text
//! Received ─▶ Normalized ─▶ Rendered ─┬─▶ PdfReady                      (PDF)
//!                                     └─▶ Rasterized ─┬─▶ SinglePageReady (1 page)
//!                                                     └─▶ Packaged        (≥ 2 pages)
//! ```
//!
//! Stages run strictly in order. The intermediate PDF is rendered once and
//! reused for rasterisation. The page-count branch is the contract callers
//! must plan for: asking for "an image" yields a zip archive as soon as the
//! document paginates.
//!
//! Every scratch resource is an RAII guard owned by the async frame of the
//! stage that created it, and is closed before that stage's error (if any)
//! propagates. Only the returned artifact's file outlives the call.

use crate::config::{ConversionConfig, ImageFormat, OutputKind};
use crate::error::{DocPressError, RasterError};
use crate::output::{download_name, ArtifactKind, OutputArtifact};
use crate::pipeline::archive::{pack_files, page_file_name};
use crate::pipeline::encode::encode_page;
use crate::pipeline::normalize::{normalize, NormalizedDocument};
use crate::pipeline::raster::{PageImage, PdfiumRasterizer, RasterOptions, Rasterizer};
use crate::pipeline::render::{select_stylesheets, CommandRenderer, PdfRenderer};
use crate::progress::{PipelineState, ProgressCallback};
use crate::request::ConversionRequest;
use crate::temp::TempResources;
use futures::stream::{self, StreamExt};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs conversions against one configuration and one pair of backends.
///
/// Cheap to clone; share one instance across concurrent requests.
#[derive(Clone)]
pub struct Converter {
    config: ConversionConfig,
    renderer: Arc<dyn PdfRenderer>,
    rasterizer: Arc<dyn Rasterizer>,
    progress: Option<ProgressCallback>,
}

impl Converter {
    /// A converter using [`CommandRenderer`] (WeasyPrint) and [`PdfiumRasterizer`].
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            config,
            renderer: Arc::new(CommandRenderer::default()),
            rasterizer: Arc::new(PdfiumRasterizer::new()),
            progress: None,
        }
    }

    pub fn with_renderer(mut self, renderer: impl PdfRenderer + 'static) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: impl Rasterizer + 'static) -> Self {
        self.rasterizer = Arc::new(rasterizer);
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Convert one request, allocating scratch space under `config.temp_root`.
    ///
    /// # Errors
    /// Returns `Err(DocPressError)` for any stage failure. No artifact is
    /// produced in that case and all scratch files are already gone.
    pub async fn convert(&self, request: ConversionRequest) -> Result<OutputArtifact, DocPressError> {
        let temps = TempResources::new(&self.config.temp_root);
        self.convert_with(request, &temps).await
    }

    /// Convert one request using a caller-supplied temp manager.
    ///
    /// Lets callers audit [`TempResources::outstanding`] after the run.
    pub async fn convert_with(
        &self,
        request: ConversionRequest,
        temps: &TempResources,
    ) -> Result<OutputArtifact, DocPressError> {
        let result = self.run(request, temps).await;
        if let Err(ref e) = result {
            warn!("Conversion failed: {}", e);
            self.emit(PipelineState::Failed { kind: e.kind() });
        }
        result
    }

    /// Convert and move the artifact to `dest`.
    ///
    /// Parent directories are created as needed. If the move fails the
    /// artifact is deleted; there is no partial output.
    pub async fn convert_to_file(
        &self,
        request: ConversionRequest,
        dest: impl AsRef<Path>,
    ) -> Result<OutputArtifact, DocPressError> {
        let artifact = self.convert(request).await?;
        move_artifact(artifact, dest).await
    }

    /// Convert independent requests concurrently.
    ///
    /// At most `concurrency` pipelines run at once. Results come back in
    /// request order.
    pub async fn convert_batch(
        &self,
        requests: impl IntoIterator<Item = ConversionRequest>,
        concurrency: usize,
    ) -> Vec<Result<OutputArtifact, DocPressError>> {
        stream::iter(requests.into_iter().map(|r| self.convert(r)))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    /// Synchronous wrapper around [`Converter::convert`].
    ///
    /// Creates a temporary tokio runtime internally; do not call from async code.
    pub fn convert_sync(&self, request: ConversionRequest) -> Result<OutputArtifact, DocPressError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| DocPressError::Internal(format!("Failed to create tokio runtime: {}", e)))?
            .block_on(self.convert(request))
    }

    // ── Stages ───────────────────────────────────────────────────────────

    async fn run(
        &self,
        request: ConversionRequest,
        temps: &TempResources,
    ) -> Result<OutputArtifact, DocPressError> {
        let started = Instant::now();
        self.emit(PipelineState::Received);
        info!(
            "Starting conversion: {:?} → {:?} ({} bytes)",
            request.source_format,
            request.output,
            request.content.len()
        );

        let html = normalize(&request.content, request.source_format);
        self.emit(PipelineState::Normalized);

        let pdf = self
            .render(html, request.custom_stylesheet.as_deref(), temps)
            .await?;
        self.emit(PipelineState::Rendered);

        let artifact = match request.output {
            OutputKind::Pdf => {
                let artifact = self.deliver(&pdf, ArtifactKind::Pdf, &request, temps)?;
                self.emit(PipelineState::PdfReady);
                artifact
            }
            OutputKind::Image(format) => self.rasterize(pdf, format, &request, temps).await?,
        };

        info!(
            "Conversion complete: {} ({} bytes) in {}ms",
            artifact.file_name,
            artifact.size_bytes,
            started.elapsed().as_millis()
        );
        Ok(artifact)
    }

    /// `Normalized → Rendered`.
    async fn render(
        &self,
        html: NormalizedDocument,
        custom_stylesheet: Option<&str>,
        temps: &TempResources,
    ) -> Result<Vec<u8>, DocPressError> {
        let staged = match custom_stylesheet {
            Some(css) => {
                let mut file = temps.file("custom_", ".css")?;
                file.write_contents(css.as_bytes())?;
                Some(file)
            }
            None => None,
        };

        let stylesheets = select_stylesheets(
            staged.as_ref().map(|f| f.path()),
            self.config.usable_default_stylesheet(),
        );
        let renderer = Arc::clone(&self.renderer);
        let result = run_blocking("Render", move || {
            renderer
                .render(&html, &stylesheets)
                .map_err(DocPressError::from)
        })
        .await;

        let cleanup = staged.map_or(Ok(()), |f| f.close());
        let pdf = first_error(result, cleanup)?;
        debug!("Rendered PDF: {} bytes", pdf.len());
        Ok(pdf)
    }

    /// `Rendered → Rasterized → SinglePageReady | Packaged`.
    async fn rasterize(
        &self,
        pdf: Vec<u8>,
        format: ImageFormat,
        request: &ConversionRequest,
        temps: &TempResources,
    ) -> Result<OutputArtifact, DocPressError> {
        let mut intermediate = temps.file("temp_", ".pdf")?;
        intermediate.write_contents(&pdf)?;
        drop(pdf);

        let options = RasterOptions {
            dpi: self.config.dpi,
            target_width: request
                .target_width
                .filter(|_| self.config.pass_target_width)
                .map(NonZeroU32::get),
        };
        let rasterizer = Arc::clone(&self.rasterizer);
        let pdf_path = intermediate.path().to_path_buf();
        let result = run_blocking("Rasterize", move || {
            rasterizer
                .rasterize(&pdf_path, &options)
                .map_err(DocPressError::from)
        })
        .await;

        let pages = first_error(result, intermediate.close())?;
        if pages.is_empty() {
            return Err(RasterError::NoPages.into());
        }
        info!("Rasterised {} page(s) at {} DPI", pages.len(), options.dpi);
        self.emit(PipelineState::Rasterized { pages: pages.len() });

        match <[PageImage; 1]>::try_from(pages) {
            Ok([page]) => self.single_page(page, format, request, temps).await,
            Err(pages) => self.package(pages, format, request, temps).await,
        }
    }

    async fn single_page(
        &self,
        page: PageImage,
        format: ImageFormat,
        request: &ConversionRequest,
        temps: &TempResources,
    ) -> Result<OutputArtifact, DocPressError> {
        let quality = self.config.jpeg_quality;
        let bytes = run_blocking("Encode", move || encode(&page, format, quality)).await?;
        let artifact = self.deliver(&bytes, ArtifactKind::Image { format }, request, temps)?;
        self.emit(PipelineState::SinglePageReady);
        Ok(artifact)
    }

    async fn package(
        &self,
        pages: Vec<PageImage>,
        format: ImageFormat,
        request: &ConversionRequest,
        temps: &TempResources,
    ) -> Result<OutputArtifact, DocPressError> {
        let total = pages.len();
        let staging = temps.dir("pages_")?;
        let quality = self.config.jpeg_quality;
        let width = self.config.page_name_width;

        let mut entries = Vec::with_capacity(total);
        for page in pages {
            let index = page.index;
            let name = page_file_name(index, width, format.extension());
            let path = staging.path().join(&name);
            entries.push((name, path.clone()));
            run_blocking("Encode", move || {
                let bytes = encode(&page, format, quality)?;
                std::fs::write(&path, bytes)
                    .map_err(|e| DocPressError::resource(format!("write {}", path.display()), e))
            })
            .await?;
            if let Some(ref cb) = self.progress {
                cb.on_page_encoded(index, total);
            }
        }

        let archive = temps.file("docpress_", ".zip")?;
        let packed = run_blocking("Archive", move || {
            pack_files(archive, entries).map_err(|e| DocPressError::ArchiveFailed {
                pages: total,
                detail: e.to_string(),
            })
        })
        .await;
        let (archive, entries) = first_error(packed, staging.close())?;
        debug!("Archive holds {} entries", entries);

        let path = archive.persist()?;
        let kind = ArtifactKind::Archive {
            format,
            pages: total,
        };
        let size_bytes = std::fs::metadata(&path)
            .map_err(|e| DocPressError::resource(format!("stat {}", path.display()), e))?
            .len();
        self.emit(PipelineState::Packaged { pages: total });
        Ok(artifact_at(path, kind, request, size_bytes))
    }

    /// Write `bytes` to a fresh artifact file and hand it over.
    fn deliver(
        &self,
        bytes: &[u8],
        kind: ArtifactKind,
        request: &ConversionRequest,
        temps: &TempResources,
    ) -> Result<OutputArtifact, DocPressError> {
        let mut file = temps.file("docpress_", &format!(".{}", kind.extension()))?;
        file.write_contents(bytes)?;
        let path = file.persist()?;
        Ok(artifact_at(path, kind, request, bytes.len() as u64))
    }

    fn emit(&self, state: PipelineState) {
        debug!("Pipeline state: {}", state);
        if let Some(ref cb) = self.progress {
            cb.on_state(state);
        }
    }
}

/// Convert one request with the default backends.
pub async fn convert(
    request: ConversionRequest,
    config: &ConversionConfig,
) -> Result<OutputArtifact, DocPressError> {
    Converter::new(config.clone()).convert(request).await
}

/// Synchronous wrapper around [`convert`].
pub fn convert_sync(
    request: ConversionRequest,
    config: &ConversionConfig,
) -> Result<OutputArtifact, DocPressError> {
    Converter::new(config.clone()).convert_sync(request)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Run a blocking stage on the blocking pool.
async fn run_blocking<T, F>(stage: &str, f: F) -> Result<T, DocPressError>
where
    F: FnOnce() -> Result<T, DocPressError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DocPressError::Internal(format!("{} task panicked: {}", stage, e)))?
}

fn encode(page: &PageImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>, DocPressError> {
    encode_page(page, format, quality).map_err(|e| DocPressError::EncodeFailed {
        page: page.index,
        detail: e.to_string(),
    })
}

/// Combine a stage result with the cleanup that followed it.
///
/// The stage error wins; a cleanup error is only reported when it is the
/// first failure.
fn first_error<T>(
    primary: Result<T, DocPressError>,
    cleanup: Result<(), DocPressError>,
) -> Result<T, DocPressError> {
    match (primary, cleanup) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(cleanup)) => {
            warn!("Cleanup failed after earlier error: {}", cleanup);
            Err(e)
        }
    }
}

fn artifact_at(
    path: PathBuf,
    kind: ArtifactKind,
    request: &ConversionRequest,
    size_bytes: u64,
) -> OutputArtifact {
    OutputArtifact {
        path,
        kind,
        file_name: download_name(request.file_name.as_deref(), kind.extension()),
        size_bytes,
    }
}

/// Move a finished artifact to `dest`, creating parent directories.
///
/// If the move fails the artifact is deleted and `OutputWriteFailed` is
/// returned; there is no partial output.
pub async fn move_artifact(
    artifact: OutputArtifact,
    dest: impl AsRef<Path>,
) -> Result<OutputArtifact, DocPressError> {
    let dest = dest.as_ref();
    match place_file(&artifact.path, dest).await {
        Ok(()) => {
            info!("Wrote {} ({} bytes)", dest.display(), artifact.size_bytes);
            Ok(OutputArtifact {
                path: dest.to_path_buf(),
                ..artifact
            })
        }
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(&artifact.path).await {
                warn!(
                    "Failed to remove undelivered artifact {}: {}",
                    artifact.path.display(),
                    cleanup
                );
            }
            Err(DocPressError::OutputWriteFailed {
                path: dest.to_path_buf(),
                source: e,
            })
        }
    }
}

/// Move `from` to `to`, falling back to copy + delete across filesystems.
async fn place_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(from, to).await?;
    tokio::fs::remove_file(from).await
}
