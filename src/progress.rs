//! Pipeline states and the progress-callback trait.
//!
//! Attach an [`Arc<dyn ConversionProgressCallback>`] with
//! [`crate::Converter::with_progress`] to observe each state transition of a
//! conversion as it happens.
//!
//! # Example
//!
//! ```rust
//! use docpress::{ConversionProgressCallback, PipelineState};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Recorder(Mutex<Vec<PipelineState>>);
//!
//! impl ConversionProgressCallback for Recorder {
//!     fn on_state(&self, state: PipelineState) {
//!         self.0.lock().unwrap().push(state);
//!     }
//! }
//!
//! let recorder = Arc::new(Recorder::default());
//! recorder.on_state(PipelineState::Received);
//! assert_eq!(recorder.0.lock().unwrap().len(), 1);
//! ```

use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Where a conversion currently is.
///
/// PDF requests go `Received → Normalized → Rendered → PdfReady`. Image
/// requests go `Received → Normalized → Rendered → Rasterized` and then end
/// in `SinglePageReady` (one page) or `Packaged` (two or more). Any stage can
/// end in `Failed`, which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PipelineState {
    Received,
    Normalized,
    Rendered,
    Rasterized { pages: usize },
    PdfReady,
    SinglePageReady,
    Packaged { pages: usize },
    Failed { kind: ErrorKind },
}

impl PipelineState {
    /// True for states that end a conversion.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::PdfReady
                | PipelineState::SinglePageReady
                | PipelineState::Packaged { .. }
                | PipelineState::Failed { .. }
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Received => f.write_str("received"),
            PipelineState::Normalized => f.write_str("normalized"),
            PipelineState::Rendered => f.write_str("rendered"),
            PipelineState::Rasterized { pages } => write!(f, "rasterized ({pages} pages)"),
            PipelineState::PdfReady => f.write_str("pdf ready"),
            PipelineState::SinglePageReady => f.write_str("image ready"),
            PipelineState::Packaged { pages } => write!(f, "packaged ({pages} pages)"),
            PipelineState::Failed { kind } => write!(f, "failed ({kind:?})"),
        }
    }
}

/// Called by the conversion pipeline as it advances.
///
/// Implementations must be `Send + Sync`: batch conversions run several
/// pipelines at once and share one callback. All methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called on every state transition, including the terminal one.
    fn on_state(&self, state: PipelineState) {
        let _ = state;
    }

    /// Called after each page of a multi-page image conversion is encoded.
    ///
    /// # Arguments
    /// * `page` : 1-indexed page number
    /// * `total`: pages in the document
    fn on_page_encoded(&self, page: usize, total: usize) {
        let _ = (page, total);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Shared handle stored on a [`crate::Converter`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
