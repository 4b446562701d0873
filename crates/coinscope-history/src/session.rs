//! Persisted session types
//!
//! A session is one durable snapshot of a completed analysis batch. The
//! persisted shape is an external contract (camelCase keys, `analyses`
//! null on failure, `error` omitted on success) and must stay stable
//! across versions.

use crate::data_url;
use bytes::Bytes;
use coinscope_core::coin::CoinAnalysis;
use serde::{Deserialize, Serialize};

/// A completed per-image outcome handed to the store for persistence.
///
/// Exactly one of `analyses` / `error` is populated; `Some(vec![])` means
/// the model found no coins, which is a success.
#[derive(Debug, Clone)]
pub struct AnalyzedImage {
    /// Raw image bytes (shared, not copied)
    pub image: Bytes,

    /// MIME type of the image
    pub mime_type: String,

    /// Coin analyses, when the image analyzed successfully
    pub analyses: Option<Vec<CoinAnalysis>>,

    /// User-facing failure message, when it did not
    pub error: Option<String>,
}

/// One stored per-image result. The transient image handle is replaced by
/// a self-contained data URL so history survives reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedResult {
    /// Coin analyses, or null when the image failed to analyze
    pub analyses: Option<Vec<CoinAnalysis>>,

    /// Failure message, omitted on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Self-contained encoding of the image bytes
    pub image_data_url: String,
}

impl SavedResult {
    /// Convert an in-memory outcome into its durable form.
    pub fn from_analyzed(image: &AnalyzedImage) -> Self {
        Self {
            analyses: image.analyses.clone(),
            error: image.error.clone(),
            image_data_url: data_url::encode(&image.image, &image.mime_type),
        }
    }
}

/// One persisted analysis session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSession {
    /// Time-derived unique id (epoch millis, stringified)
    pub id: String,

    /// Creation timestamp, epoch millis
    pub date: i64,

    /// Per-image results, in original selection order
    pub results: Vec<SavedResult>,
}

/// A stored result re-exposed for display: the data URL doubles as the
/// image source.
#[derive(Debug, Clone)]
pub struct DisplayableResult {
    pub image_url: String,
    pub analyses: Option<Vec<CoinAnalysis>>,
    pub error: Option<String>,
}

impl AnalysisSession {
    /// Map stored results into displayable form.
    pub fn displayable_results(&self) -> Vec<DisplayableResult> {
        self.results
            .iter()
            .map(|r| DisplayableResult {
                image_url: r.image_data_url.clone(),
                analyses: r.analyses.clone(),
                error: r.error.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_image(analyses: Option<Vec<CoinAnalysis>>, error: Option<String>) -> AnalyzedImage {
        AnalyzedImage {
            image: Bytes::from_static(b"fake image bytes"),
            mime_type: "image/jpeg".to_string(),
            analyses,
            error,
        }
    }

    #[test]
    fn test_saved_result_embeds_image() {
        let saved = SavedResult::from_analyzed(&sample_image(Some(vec![]), None));
        assert!(saved.image_data_url.starts_with("data:image/jpeg;base64,"));

        let (bytes, mime_type) = data_url::decode(&saved.image_data_url).unwrap();
        assert_eq!(bytes, b"fake image bytes");
        assert_eq!(mime_type, "image/jpeg");
    }

    #[test]
    fn test_error_omitted_on_success() {
        let saved = SavedResult::from_analyzed(&sample_image(Some(vec![]), None));
        let value = serde_json::to_value(&saved).unwrap();

        // `analyses` serializes (as an array), `error` is absent entirely
        assert!(value["analyses"].is_array());
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_failed_result_serializes_null_analyses() {
        let saved = SavedResult::from_analyzed(&sample_image(
            None,
            Some("Failed to analyze coin image.".to_string()),
        ));
        let value = serde_json::to_value(&saved).unwrap();

        assert!(value["analyses"].is_null());
        assert_eq!(value["error"], "Failed to analyze coin image.");
    }

    #[test]
    fn test_session_serializes_camel_case() {
        let session = AnalysisSession {
            id: "1700000000000".to_string(),
            date: 1_700_000_000_000,
            results: vec![SavedResult::from_analyzed(&sample_image(Some(vec![]), None))],
        };

        let value = serde_json::to_value(&session).unwrap();
        assert!(value["results"][0].get("imageDataUrl").is_some());
    }

    #[test]
    fn test_displayable_results_use_data_url() {
        let session = AnalysisSession {
            id: "1".to_string(),
            date: 1,
            results: vec![SavedResult::from_analyzed(&sample_image(Some(vec![]), None))],
        };

        let displayable = session.displayable_results();
        assert_eq!(displayable.len(), 1);
        assert_eq!(displayable[0].image_url, session.results[0].image_data_url);
    }
}
