//! Coinscope Analysis Orchestration
//!
//! Coordinates a batch of selected images through analysis:
//! - per-batch state machine (idle → pending → in-flight → settled)
//! - unbounded per-image fan-out with order-preserving merge
//! - best-effort history persistence on settle
//! - display-handle lifecycle (acquired at selection, released exactly once)

pub mod handles;
pub mod orchestrator;

use thiserror::Error;

/// Orchestration error types
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Analyze was requested with nothing selected; no remote call is made.
    #[error("Please select one or more images first.")]
    NoImagesSelected,
}

pub use handles::{DisplayHandle, HandleRegistry};
pub use orchestrator::{
    ANALYSIS_FAILED_MESSAGE, BatchState, INVALID_FORMAT_MESSAGE, ImageRecord, Orchestrator,
};
