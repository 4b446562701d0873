//! History store trait and file-backed implementation

use crate::session::{AnalysisSession, AnalyzedImage, SavedResult};
use crate::{Result, atomic};
use async_trait::async_trait;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Fixed retention cap. Oldest sessions beyond this are silently evicted;
/// recency is what the user comes back for.
pub const MAX_SESSIONS: usize = 50;

/// History store abstraction
///
/// Hides the storage medium behind a narrow list/save/clear interface so
/// the medium (file, embedded database, browser storage) is swappable.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// All persisted sessions, newest first.
    ///
    /// Missing, unreadable, or corrupt storage yields an empty list, never
    /// an error.
    async fn list_sessions(&self) -> Vec<AnalysisSession>;

    /// Persist a completed batch as a new session.
    ///
    /// Every image is converted to a durable [`SavedResult`] before
    /// anything is written; a partially saved session is not a
    /// representable state. The new session is prepended and the stored
    /// list truncated to [`MAX_SESSIONS`].
    ///
    /// Returns the new session id.
    ///
    /// # Errors
    /// - `HistoryError::Io` / `HistoryError::Serialization` for write
    ///   failures. Callers treat persistence as best-effort and log.
    async fn save_session(&self, batch: &[AnalyzedImage]) -> Result<String>;

    /// Delete all persisted sessions unconditionally.
    async fn clear_history(&self) -> Result<()>;
}

/// File-backed history store: the whole history is one JSON array,
/// newest session first, replaced atomically on every save.
pub struct JsonHistoryStore {
    path: PathBuf,
}

impl JsonHistoryStore {
    /// Store backed by an explicit file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the conventional location inside a data directory
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join("history.json"))
    }

    /// Read the stored array, treating every failure as "no history".
    async fn read_all(&self) -> Vec<AnalysisSession> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("Failed to read history file {:?}: {}", self.path, e);
                return Vec::new();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!("Corrupt history file {:?}, treating as empty: {}", self.path, e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl HistoryStore for JsonHistoryStore {
    async fn list_sessions(&self) -> Vec<AnalysisSession> {
        self.read_all().await
    }

    async fn save_session(&self, batch: &[AnalyzedImage]) -> Result<String> {
        // Convert the whole batch up front; only a fully converted session
        // is ever written.
        let results: Vec<SavedResult> = batch.iter().map(SavedResult::from_analyzed).collect();

        let now = Utc::now().timestamp_millis();
        let session = AnalysisSession {
            id: now.to_string(),
            date: now,
            results,
        };
        let id = session.id.clone();

        let mut sessions = self.read_all().await;
        sessions.insert(0, session);
        if sessions.len() > MAX_SESSIONS {
            debug!(
                "History at capacity, evicting {} oldest session(s)",
                sessions.len() - MAX_SESSIONS
            );
            sessions.truncate(MAX_SESSIONS);
        }

        let data = serde_json::to_vec(&sessions)?;
        atomic::write_atomic(&self.path, &data).await?;

        Ok(id)
    }

    async fn clear_history(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
