//! Pipeline integration tests driven by stub renderer/rasteriser backends.
//!
//! No external programs or pdfium are needed: the stubs record what the
//! orchestrator hands them and fabricate deterministic output, so these
//! tests exercise the state machine, the page-count branch, stylesheet
//! precedence and scratch-file hygiene on every exit path.

use docpress::{
    ArtifactKind, ConversionConfig, ConversionConfigBuilder, ConversionProgressCallback,
    ConversionRequest, Converter, DocPressError, ErrorKind, ImageFormat, NormalizedDocument,
    OutputArtifact, PageImage, PdfRenderer, PipelineState, RasterError, RasterOptions, Rasterizer,
    RenderError, TempResources,
};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Stub backends ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct RenderCall {
    html: String,
    stylesheet_paths: Vec<PathBuf>,
    stylesheet_contents: Vec<String>,
}

/// Renders every document to a fake PDF announcing `pages` pages.
#[derive(Clone)]
struct StubRenderer {
    pages: usize,
    fail: bool,
    calls: Arc<Mutex<Vec<RenderCall>>>,
}

impl StubRenderer {
    fn pages(pages: usize) -> Self {
        Self {
            pages,
            fail: false,
            calls: Arc::default(),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::pages(1)
        }
    }

    fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl PdfRenderer for StubRenderer {
    fn render(
        &self,
        html: &NormalizedDocument,
        stylesheets: &[PathBuf],
    ) -> Result<Vec<u8>, RenderError> {
        let stylesheet_contents = stylesheets
            .iter()
            .map(|p| std::fs::read_to_string(p).unwrap_or_default())
            .collect();
        self.calls.lock().unwrap().push(RenderCall {
            html: html.as_str().to_string(),
            stylesheet_paths: stylesheets.to_vec(),
            stylesheet_contents,
        });
        if self.fail {
            return Err(RenderError::Failed {
                status: "exit status: 1".into(),
                detail: "unsupported CSS construct".into(),
            });
        }
        Ok(format!("%PDF-stub pages={}", self.pages).into_bytes())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RasterMode {
    Pages,
    /// Zero-sized pages, which no encoder accepts.
    Blank,
    Empty,
    Fail,
}

/// Reads the stub PDF and produces one half-transparent image per page.
#[derive(Clone)]
struct StubRasterizer {
    mode: RasterMode,
    seen: Arc<Mutex<Vec<(PathBuf, Vec<u8>, RasterOptions)>>>,
}

impl StubRasterizer {
    fn new(mode: RasterMode) -> Self {
        Self {
            mode,
            seen: Arc::default(),
        }
    }

    fn seen(&self) -> Vec<(PathBuf, Vec<u8>, RasterOptions)> {
        self.seen.lock().unwrap().clone()
    }
}

impl Rasterizer for StubRasterizer {
    fn rasterize(&self, pdf: &Path, options: &RasterOptions) -> Result<Vec<PageImage>, RasterError> {
        let bytes = std::fs::read(pdf).map_err(|e| RasterError::Load(e.to_string()))?;
        self.seen
            .lock()
            .unwrap()
            .push((pdf.to_path_buf(), bytes.clone(), *options));

        match self.mode {
            RasterMode::Fail => return Err(RasterError::Load("corrupt xref table".into())),
            RasterMode::Empty => return Ok(Vec::new()),
            RasterMode::Pages | RasterMode::Blank => {}
        }

        let text = String::from_utf8_lossy(&bytes);
        let pages: usize = text
            .rsplit("pages=")
            .next()
            .and_then(|n| n.trim().parse().ok())
            .ok_or_else(|| RasterError::Load(format!("not a stub PDF: {text}")))?;

        if self.mode == RasterMode::Blank {
            return Ok((1..=pages)
                .map(|index| PageImage {
                    index,
                    image: DynamicImage::ImageRgba8(RgbaImage::new(0, 0)),
                })
                .collect());
        }

        Ok((1..=pages)
            .map(|index| {
                let mut img = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 0]));
                img.put_pixel(0, 0, Rgba([page_marker(index), 0, 0, 255]));
                PageImage {
                    index,
                    image: DynamicImage::ImageRgba8(img),
                }
            })
            .collect())
    }
}

/// Red channel of page `index`'s corner pixel.
fn page_marker(index: usize) -> u8 {
    (index as u8).wrapping_mul(40)
}

#[derive(Default)]
struct Recorder {
    states: Mutex<Vec<PipelineState>>,
    pages: Mutex<Vec<(usize, usize)>>,
}

impl ConversionProgressCallback for Recorder {
    fn on_state(&self, state: PipelineState) {
        self.states.lock().unwrap().push(state);
    }

    fn on_page_encoded(&self, page: usize, total: usize) {
        self.pages.lock().unwrap().push((page, total));
    }
}

// ── Test helpers ─────────────────────────────────────────────────────────────

struct Harness {
    _dir: TempDir,
    root: PathBuf,
    renderer: StubRenderer,
    rasterizer: StubRasterizer,
    converter: Converter,
    temps: TempResources,
}

impl Harness {
    fn new(renderer: StubRenderer, rasterizer: StubRasterizer) -> Self {
        Self::with_config(renderer, rasterizer, |b| b)
    }

    fn with_config(
        renderer: StubRenderer,
        rasterizer: StubRasterizer,
        configure: impl FnOnce(ConversionConfigBuilder) -> ConversionConfigBuilder,
    ) -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("scratch");
        let config = configure(ConversionConfig::builder().temp_root(&root))
            .build()
            .unwrap();
        let converter = Converter::new(config)
            .with_renderer(renderer.clone())
            .with_rasterizer(rasterizer.clone());
        Self {
            temps: TempResources::new(&root),
            _dir: dir,
            root,
            renderer,
            rasterizer,
            converter,
        }
    }

    async fn run(&self, request: ConversionRequest) -> Result<OutputArtifact, DocPressError> {
        self.converter.convert_with(request, &self.temps).await
    }

    /// Everything left under the scratch root.
    fn leftovers(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(&self.root) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Assert only `artifact` (if any) survives the run.
    fn assert_clean(&self, artifact: Option<&Path>) {
        let expected: Vec<PathBuf> = artifact.map(Path::to_path_buf).into_iter().collect();
        assert_eq!(self.leftovers(), expected, "scratch files leaked");
        assert!(self.temps.outstanding().is_empty());
    }
}

fn zip_entries(path: &Path) -> Vec<(String, Vec<u8>)> {
    let bytes = std::fs::read(path).unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index(i).unwrap();
            let mut body = Vec::new();
            entry.read_to_end(&mut body).unwrap();
            (entry.name().to_string(), body)
        })
        .collect()
}

// ── PDF flow ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn markdown_to_pdf() {
    let h = Harness::new(StubRenderer::pages(1), StubRasterizer::new(RasterMode::Pages));

    let artifact = h
        .run(ConversionRequest::markdown("# Title\n\nHello"))
        .await
        .unwrap();

    assert_eq!(artifact.kind, ArtifactKind::Pdf);
    assert_eq!(artifact.media_type(), "application/pdf");
    assert_eq!(artifact.file_name, "document.pdf");
    assert_eq!(artifact.read().unwrap(), b"%PDF-stub pages=1");
    assert_eq!(artifact.size_bytes, 17);

    let calls = h.renderer.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].html.contains("Title</h1>"));
    assert!(calls[0].html.contains("<p>Hello</p>"));
    assert!(calls[0].stylesheet_paths.is_empty());

    // PDF requests never rasterise.
    assert!(h.rasterizer.seen().is_empty());
    h.assert_clean(Some(&artifact.path));
}

#[tokio::test]
async fn full_html_reaches_renderer_unchanged() {
    let h = Harness::new(StubRenderer::pages(1), StubRasterizer::new(RasterMode::Pages));
    let doc = "<!DOCTYPE html><HTML><body><p>as is</p></body></HTML>";

    h.run(ConversionRequest::html(doc)).await.unwrap();

    assert_eq!(h.renderer.calls()[0].html, doc);
}

// ── Image flow: page-count branch ────────────────────────────────────────────

#[tokio::test]
async fn single_page_is_never_archived() {
    for (format, ext, media) in [
        (ImageFormat::Png, "png", "image/png"),
        (ImageFormat::JPG, "jpg", "image/jpeg"),
        (ImageFormat::JPEG, "jpeg", "image/jpeg"),
    ] {
        let h = Harness::new(StubRenderer::pages(1), StubRasterizer::new(RasterMode::Pages));

        let artifact = h
            .run(ConversionRequest::markdown("# One page").to_image(format))
            .await
            .unwrap();

        assert_eq!(artifact.kind, ArtifactKind::Image { format });
        assert!(!artifact.is_archive());
        assert_eq!(artifact.media_type(), media);
        assert_eq!(artifact.file_name, format!("document.{ext}"));

        let img = image::load_from_memory(&artifact.read().unwrap()).unwrap();
        assert_eq!(img.dimensions(), (16, 16));
        h.assert_clean(Some(&artifact.path));
    }
}

#[tokio::test]
async fn three_pages_become_an_archive() {
    let h = Harness::new(StubRenderer::pages(3), StubRasterizer::new(RasterMode::Pages));

    let artifact = h
        .run(ConversionRequest::html("<p>long</p>").to_image(ImageFormat::Png))
        .await
        .unwrap();

    assert_eq!(
        artifact.kind,
        ArtifactKind::Archive {
            format: ImageFormat::Png,
            pages: 3
        }
    );
    assert_eq!(artifact.media_type(), "application/zip");
    assert_eq!(artifact.file_name, "document.zip");

    let entries = zip_entries(&artifact.path);
    let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["page_001.png", "page_002.png", "page_003.png"]);

    // Entries are in page order: the corner pixel carries the page marker.
    for (i, (_, bytes)) in entries.iter().enumerate() {
        let img = image::load_from_memory(bytes).unwrap().to_rgba8();
        assert_eq!(img.get_pixel(0, 0)[0], page_marker(i + 1));
        // PNG keeps transparency.
        assert_eq!(img.get_pixel(12, 12)[3], 0);
    }
    h.assert_clean(Some(&artifact.path));
}

#[tokio::test]
async fn jpeg_pages_are_flattened_onto_white() {
    let h = Harness::new(StubRenderer::pages(2), StubRasterizer::new(RasterMode::Pages));

    let artifact = h
        .run(ConversionRequest::markdown("x").to_image(ImageFormat::JPG))
        .await
        .unwrap();

    let entries = zip_entries(&artifact.path);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].0, "page_001.jpg");
    for (_, bytes) in &entries {
        let img = image::load_from_memory(bytes).unwrap();
        assert!(!img.color().has_alpha());
        let px = img.to_rgb8().get_pixel(12, 12).0;
        assert!(px.iter().all(|&c| c > 240), "transparent area not white: {px:?}");
    }
}

#[tokio::test]
async fn page_name_width_is_configurable() {
    let h = Harness::with_config(
        StubRenderer::pages(2),
        StubRasterizer::new(RasterMode::Pages),
        |b| b.page_name_width(5),
    );

    let artifact = h
        .run(ConversionRequest::markdown("x").to_image(ImageFormat::Png))
        .await
        .unwrap();

    let names: Vec<String> = zip_entries(&artifact.path).into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, ["page_00001.png", "page_00002.png"]);
}

#[tokio::test]
async fn archive_keeps_page_order_beyond_name_width() {
    let h = Harness::with_config(
        StubRenderer::pages(11),
        StubRasterizer::new(RasterMode::Pages),
        |b| b.page_name_width(1),
    );

    let artifact = h
        .run(ConversionRequest::markdown("x").to_image(ImageFormat::Png))
        .await
        .unwrap();

    let entries = zip_entries(&artifact.path);
    let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
    let expected: Vec<String> = (1..=11).map(|i| format!("page_{i}.png")).collect();
    assert_eq!(names, expected);
    for (i, (_, bytes)) in entries.iter().enumerate() {
        let img = image::load_from_memory(bytes).unwrap().to_rgba8();
        assert_eq!(img.get_pixel(0, 0)[0], page_marker(i + 1));
    }
    h.assert_clean(Some(&artifact.path));
}

/// Records the scratch entries present each time a page is encoded.
struct ScratchWatcher {
    root: PathBuf,
    seen: Mutex<Vec<String>>,
}

impl ConversionProgressCallback for ScratchWatcher {
    fn on_page_encoded(&self, _page: usize, _total: usize) {
        let mut seen = self.seen.lock().unwrap();
        for entry in std::fs::read_dir(&self.root).unwrap() {
            seen.push(entry.unwrap().file_name().to_string_lossy().into_owned());
        }
    }
}

#[tokio::test]
async fn archive_file_is_created_after_encoding() {
    let h = Harness::new(StubRenderer::pages(3), StubRasterizer::new(RasterMode::Pages));
    let watcher = Arc::new(ScratchWatcher {
        root: h.root.clone(),
        seen: Mutex::default(),
    });
    let converter = h.converter.clone().with_progress(watcher.clone());

    let artifact = converter
        .convert_with(
            ConversionRequest::markdown("x").to_image(ImageFormat::Png),
            &h.temps,
        )
        .await
        .unwrap();

    let seen = watcher.seen.lock().unwrap().clone();
    assert!(seen.iter().any(|n| n.starts_with("pages_")));
    assert!(
        !seen.iter().any(|n| n.starts_with("docpress_")),
        "archive allocated during encoding: {seen:?}"
    );
    h.assert_clean(Some(&artifact.path));
}

#[tokio::test]
async fn intermediate_pdf_is_rendered_once_and_reused() {
    let h = Harness::new(StubRenderer::pages(2), StubRasterizer::new(RasterMode::Pages));

    h.run(ConversionRequest::markdown("x").to_image(ImageFormat::Png))
        .await
        .unwrap();

    assert_eq!(h.renderer.calls().len(), 1);
    let seen = h.rasterizer.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].1, b"%PDF-stub pages=2");
    assert!(!seen[0].0.exists(), "intermediate PDF not removed");
    assert_eq!(seen[0].2.dpi, 150);
}

#[tokio::test]
async fn width_hint_reaches_rasterizer_only_when_enabled() {
    let h = Harness::new(StubRenderer::pages(1), StubRasterizer::new(RasterMode::Pages));
    h.run(
        ConversionRequest::markdown("x")
            .to_image(ImageFormat::Png)
            .with_target_width(1200),
    )
    .await
    .unwrap();
    assert_eq!(h.rasterizer.seen()[0].2.target_width, Some(1200));

    let h = Harness::with_config(
        StubRenderer::pages(1),
        StubRasterizer::new(RasterMode::Pages),
        |b| b.pass_target_width(false).dpi(300),
    );
    h.run(
        ConversionRequest::markdown("x")
            .to_image(ImageFormat::Png)
            .with_target_width(1200),
    )
    .await
    .unwrap();
    let options = h.rasterizer.seen()[0].2;
    assert_eq!(options.target_width, None);
    assert_eq!(options.dpi, 300);
}

// ── Stylesheet precedence ────────────────────────────────────────────────────

#[tokio::test]
async fn custom_stylesheet_replaces_default() {
    let styles = TempDir::new().unwrap();
    let default_css = styles.path().join("style.css");
    std::fs::write(&default_css, "body { color: black }").unwrap();

    let h = Harness::with_config(
        StubRenderer::pages(1),
        StubRasterizer::new(RasterMode::Pages),
        |b| b.default_stylesheet(&default_css),
    );

    let with_custom = h
        .run(ConversionRequest::markdown("x").with_stylesheet("body { color: red }"))
        .await
        .unwrap();
    let only_default = h.run(ConversionRequest::markdown("x")).await.unwrap();

    let calls = h.renderer.calls();
    assert_eq!(calls[0].stylesheet_contents, ["body { color: red }"]);
    assert_eq!(calls[1].stylesheet_contents, ["body { color: black }"]);
    assert_eq!(calls[1].stylesheet_paths, [default_css.clone()]);

    // The staged copy is gone; the shared default is untouched.
    let staged = &calls[0].stylesheet_paths[0];
    assert!(staged.starts_with(&h.root));
    assert!(staged
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("custom_") && n.ends_with(".css")));
    assert!(!staged.exists());
    assert!(default_css.exists());

    let mut remaining = h.leftovers();
    remaining.sort();
    let mut expected = vec![with_custom.path, only_default.path];
    expected.sort();
    assert_eq!(remaining, expected);
}

#[tokio::test]
async fn missing_default_stylesheet_renders_unstyled() {
    let h = Harness::with_config(
        StubRenderer::pages(1),
        StubRasterizer::new(RasterMode::Pages),
        |b| b.default_stylesheet("/no/such/style.css"),
    );

    h.run(ConversionRequest::markdown("x")).await.unwrap();

    assert!(h.renderer.calls()[0].stylesheet_paths.is_empty());
}

// ── Failures and cleanup ─────────────────────────────────────────────────────

#[tokio::test]
async fn render_failure_leaves_nothing_behind() {
    let h = Harness::new(StubRenderer::failing(), StubRasterizer::new(RasterMode::Pages));

    let err = h
        .run(
            ConversionRequest::markdown("x")
                .with_stylesheet("p {}")
                .to_image(ImageFormat::Png),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Render);
    assert!(!err.is_client_error());
    assert!(err.to_string().contains("unsupported CSS construct"));
    assert!(h.rasterizer.seen().is_empty());
    h.assert_clean(None);
}

#[tokio::test]
async fn raster_failure_leaves_nothing_behind() {
    let h = Harness::new(StubRenderer::pages(2), StubRasterizer::new(RasterMode::Fail));

    let err = h
        .run(ConversionRequest::markdown("x").to_image(ImageFormat::Png))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Raster);
    h.assert_clean(None);
}

#[tokio::test]
async fn encode_failure_leaves_nothing_behind() {
    let h = Harness::new(StubRenderer::pages(3), StubRasterizer::new(RasterMode::Blank));

    let err = h
        .run(ConversionRequest::markdown("x").to_image(ImageFormat::JPG))
        .await
        .unwrap_err();

    assert!(
        matches!(err, DocPressError::EncodeFailed { page: 1, .. }),
        "got {err:?}"
    );
    h.assert_clean(None);
}

/// Deletes the staged page files once the last page is encoded, so the
/// archive stage finds nothing to read.
struct StagingRemover {
    root: PathBuf,
}

impl ConversionProgressCallback for StagingRemover {
    fn on_page_encoded(&self, page: usize, total: usize) {
        if page != total {
            return;
        }
        for entry in std::fs::read_dir(&self.root).unwrap() {
            let path = entry.unwrap().path();
            let staged = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("pages_"));
            if staged && path.is_dir() {
                for page in std::fs::read_dir(&path).unwrap() {
                    std::fs::remove_file(page.unwrap().path()).unwrap();
                }
            }
        }
    }
}

#[tokio::test]
async fn archive_failure_leaves_nothing_behind() {
    let h = Harness::new(StubRenderer::pages(3), StubRasterizer::new(RasterMode::Pages));
    let converter = h.converter.clone().with_progress(Arc::new(StagingRemover {
        root: h.root.clone(),
    }));

    let err = converter
        .convert_with(
            ConversionRequest::markdown("x").to_image(ImageFormat::Png),
            &h.temps,
        )
        .await
        .unwrap_err();

    assert!(
        matches!(err, DocPressError::ArchiveFailed { pages: 3, .. }),
        "got {err:?}"
    );
    h.assert_clean(None);
}

#[tokio::test]
async fn zero_pages_is_a_raster_error() {
    let h = Harness::new(StubRenderer::pages(0), StubRasterizer::new(RasterMode::Empty));

    let err = h
        .run(ConversionRequest::html("").to_image(ImageFormat::Png))
        .await
        .unwrap_err();

    assert!(matches!(err, DocPressError::Raster(RasterError::NoPages)), "got {err:?}");
    h.assert_clean(None);
}

#[tokio::test]
async fn invalid_upload_never_reaches_the_pipeline() {
    let h = Harness::new(StubRenderer::pages(1), StubRasterizer::new(RasterMode::Pages));

    let err = ConversionRequest::from_upload("notes.txt", b"hello").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = ConversionRequest::markdown("x").to_image_token("tiff").unwrap_err();
    assert!(err.is_client_error());

    assert!(h.renderer.calls().is_empty());
    h.assert_clean(None);
}

#[tokio::test]
async fn upload_name_drives_download_name() {
    let h = Harness::new(StubRenderer::pages(4), StubRasterizer::new(RasterMode::Pages));

    let request = ConversionRequest::from_upload("Quarterly Report.md", b"# Q3")
        .unwrap()
        .to_image_token("jpeg")
        .unwrap();
    let artifact = h.run(request).await.unwrap();

    assert_eq!(artifact.file_name, "Quarterly Report.zip");
    assert_eq!(zip_entries(&artifact.path)[3].0, "page_004.jpeg");
}

// ── Progress events ──────────────────────────────────────────────────────────

#[tokio::test]
async fn progress_follows_the_state_machine() {
    let recorder = Arc::new(Recorder::default());
    let h = Harness::new(StubRenderer::pages(3), StubRasterizer::new(RasterMode::Pages));
    let converter = h.converter.clone().with_progress(recorder.clone());

    converter
        .convert_with(ConversionRequest::markdown("x").to_image(ImageFormat::Png), &h.temps)
        .await
        .unwrap();

    assert_eq!(
        *recorder.states.lock().unwrap(),
        [
            PipelineState::Received,
            PipelineState::Normalized,
            PipelineState::Rendered,
            PipelineState::Rasterized { pages: 3 },
            PipelineState::Packaged { pages: 3 },
        ]
    );
    assert_eq!(*recorder.pages.lock().unwrap(), [(1, 3), (2, 3), (3, 3)]);
}

#[tokio::test]
async fn progress_reports_failure_kind() {
    let recorder = Arc::new(Recorder::default());
    let h = Harness::new(StubRenderer::failing(), StubRasterizer::new(RasterMode::Pages));
    let converter = h.converter.clone().with_progress(recorder.clone());

    converter
        .convert_with(ConversionRequest::markdown("x"), &h.temps)
        .await
        .unwrap_err();

    assert_eq!(
        *recorder.states.lock().unwrap(),
        [
            PipelineState::Received,
            PipelineState::Normalized,
            PipelineState::Failed {
                kind: ErrorKind::Render
            },
        ]
    );
}

// ── Batch ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn batch_keeps_request_order_and_isolates_runs() {
    let h = Harness::new(StubRenderer::pages(2), StubRasterizer::new(RasterMode::Pages));

    let requests = ["alpha", "beta", "gamma", "delta"]
        .into_iter()
        .map(|name| {
            ConversionRequest::markdown(format!("# {name}"))
                .with_file_name(name)
                .to_image(ImageFormat::Png)
        });
    let results = h.converter.convert_batch(requests, 3).await;

    let names: Vec<String> = results
        .iter()
        .map(|r| r.as_ref().unwrap().file_name.clone())
        .collect();
    assert_eq!(names, ["alpha.zip", "beta.zip", "gamma.zip", "delta.zip"]);

    let mut paths: Vec<&PathBuf> = results.iter().map(|r| &r.as_ref().unwrap().path).collect();
    paths.sort();
    paths.dedup();
    assert_eq!(paths.len(), 4);

    // Only the four archives remain in the shared scratch root.
    assert_eq!(h.leftovers().len(), 4);
}
