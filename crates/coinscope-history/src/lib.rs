//! Coinscope History Store
//!
//! Persists bounded lists of past analysis sessions as a single JSON
//! document on disk:
//! - `HistoryStore` trait (list / save / clear)
//! - `JsonHistoryStore` file-backed implementation with atomic writes
//! - Data-URL encoding so saved sessions are self-contained

pub mod atomic;
pub mod data_url;
pub mod session;
pub mod store;

use thiserror::Error;

/// History store error types
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[error("Base64 decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HistoryError>;

pub use session::{AnalysisSession, AnalyzedImage, DisplayableResult, SavedResult};
pub use store::{HistoryStore, JsonHistoryStore, MAX_SESSIONS};
