//! Batch analysis orchestration

use crate::AnalysisError;
use crate::handles::{DisplayHandle, HandleRegistry};
use bytes::Bytes;
use coinscope_core::coin::CoinAnalysis;
use coinscope_core::provider::VisionAnalyzer;
use coinscope_history::{AnalyzedImage, HistoryStore};
use futures::future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Message attached to an image when the remote call itself failed
pub const ANALYSIS_FAILED_MESSAGE: &str =
    "Failed to analyze coin image. The AI may be experiencing issues.";

/// Message attached to an image when the model's answer was unparsable
pub const INVALID_FORMAT_MESSAGE: &str =
    "The AI returned an invalid response format. Please try again with a clearer image.";

/// One selected image and its analysis outcome.
///
/// `analyses` and `error` are never both populated. `Some(vec![])` means
/// the model found no coins, which is distinct from a failed request.
#[derive(Debug)]
pub struct ImageRecord {
    display: DisplayHandle,
    mime_type: String,

    /// Coin analyses, populated once the image analyzed successfully
    pub analyses: Option<Vec<CoinAnalysis>>,

    /// User-facing failure message, populated if it did not
    pub error: Option<String>,
}

impl ImageRecord {
    pub fn display(&self) -> &DisplayHandle {
        &self.display
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn into_display(self) -> DisplayHandle {
        self.display
    }
}

/// Per-batch lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// Nothing selected
    Idle,
    /// Images selected, analysis not yet triggered
    Pending,
    /// Analysis calls outstanding
    InFlight,
    /// Every call resolved; records carry analyses or errors
    Settled,
}

/// Coordinates a batch of images through selection, fan-out analysis,
/// merge, and history persistence.
pub struct Orchestrator {
    analyzer: Arc<dyn VisionAnalyzer>,
    history: Arc<dyn HistoryStore>,
    registry: HandleRegistry,
    records: Vec<ImageRecord>,
    state: BatchState,
}

impl Orchestrator {
    pub fn new(analyzer: Arc<dyn VisionAnalyzer>, history: Arc<dyn HistoryStore>) -> Self {
        Self {
            analyzer,
            history,
            registry: HandleRegistry::new(),
            records: Vec::new(),
            state: BatchState::Idle,
        }
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    /// Registry backing this batch's display handles
    pub fn registry(&self) -> &HandleRegistry {
        &self.registry
    }

    /// Replace the current selection. Handles for any previous selection
    /// are released before the new ones are acquired.
    pub fn select_images(&mut self, images: Vec<(Bytes, String)>) {
        self.release_all();

        self.records = images
            .into_iter()
            .map(|(bytes, mime_type)| ImageRecord {
                display: self.registry.acquire(bytes),
                mime_type,
                analyses: None,
                error: None,
            })
            .collect();

        self.state = if self.records.is_empty() {
            BatchState::Idle
        } else {
            BatchState::Pending
        };
        debug!("Selected {} image(s)", self.records.len());
    }

    /// Analyze every selected image.
    ///
    /// All images are submitted simultaneously, one analyzer call each,
    /// and the batch settles only once every call has resolved; a failed
    /// image never cancels the others. Outcomes are merged back in
    /// original selection order. On settle the batch is persisted to
    /// history best-effort: a persistence failure is logged and does not
    /// alter the settled result.
    pub async fn analyze(&mut self) -> Result<&[ImageRecord], AnalysisError> {
        if self.records.is_empty() {
            return Err(AnalysisError::NoImagesSelected);
        }

        self.state = BatchState::InFlight;
        info!("Analyzing batch of {} image(s)", self.records.len());

        let calls: Vec<_> = self
            .records
            .iter()
            .map(|record| {
                let analyzer = Arc::clone(&self.analyzer);
                let image = self.registry.resolve(record.display());
                let mime_type = record.mime_type().to_string();
                async move {
                    match image {
                        Some(bytes) => analyzer.analyze_image(&bytes, &mime_type).await,
                        None => Err(coinscope_core::Error::Internal(
                            "display handle released mid-flight".to_string(),
                        )),
                    }
                }
            })
            .collect();

        // Fan-in: suspends until every per-image call has resolved
        let outcomes = future::join_all(calls).await;

        for (record, outcome) in self.records.iter_mut().zip(outcomes) {
            match outcome {
                Ok(analyses) => {
                    record.analyses = Some(analyses);
                    record.error = None;
                }
                Err(err) => {
                    record.analyses = None;
                    record.error = Some(user_message(&err));
                }
            }
        }
        self.state = BatchState::Settled;

        let batch: Vec<AnalyzedImage> = self
            .records
            .iter()
            .map(|record| AnalyzedImage {
                image: self.registry.resolve(record.display()).unwrap_or_default(),
                mime_type: record.mime_type.clone(),
                analyses: record.analyses.clone(),
                error: record.error.clone(),
            })
            .collect();

        match self.history.save_session(&batch).await {
            Ok(id) => debug!("Saved analysis session {}", id),
            Err(err) => warn!("Failed to save analysis session to history: {}", err),
        }

        Ok(&self.records)
    }

    /// Drop the current selection, releasing its display handles.
    pub fn clear_selection(&mut self) {
        self.release_all();
        self.state = BatchState::Idle;
    }

    /// Reset the batch to start over. Equivalent to clearing the
    /// selection; settled results are discarded.
    pub fn reset(&mut self) {
        self.clear_selection();
    }

    fn release_all(&mut self) {
        for record in self.records.drain(..) {
            self.registry.release(record.into_display());
        }
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.release_all();
    }
}

/// Map a typed analyzer failure onto the message shown for that image.
fn user_message(err: &coinscope_core::Error) -> String {
    match err {
        coinscope_core::Error::InvalidResponseFormat(_) => INVALID_FORMAT_MESSAGE.to_string(),
        _ => ANALYSIS_FAILED_MESSAGE.to_string(),
    }
}
