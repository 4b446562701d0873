//! Vision analyzer trait definition

use crate::{Result, coin::CoinAnalysis};

/// Abstraction over the hosted vision model that identifies coins.
///
/// The orchestrator consumes this as `Arc<dyn VisionAnalyzer>` so tests can
/// drive batches with scripted analyzers instead of a live connector.
#[async_trait::async_trait]
pub trait VisionAnalyzer: Send + Sync {
    /// Analyze one image and return every coin identified in it.
    ///
    /// An empty list means the model found no coins, which is a success,
    /// not a failure.
    ///
    /// # Errors
    /// - `Error::InvalidResponseFormat` if the model's output could not be
    ///   parsed as analysis JSON
    /// - `Error::Provider` / `Error::RateLimitExceeded` for remote failures
    async fn analyze_image(&self, image: &[u8], mime_type: &str) -> Result<Vec<CoinAnalysis>>;
}
