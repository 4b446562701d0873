//! Gemini vision connector

use crate::{
    EgressError, Result,
    client::{HttpClientConfig, create_client, with_retry},
    schema,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use coinscope_core::coin::CoinAnalysis;
use coinscope_core::provider::VisionAnalyzer;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

/// Low-randomness decoding to favor deterministic, consistent output.
const ANALYSIS_TEMPERATURE: f32 = 0.2;

/// Gemini connector configuration
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key for authentication
    pub api_key: String,

    /// Base URL for the Gemini API (default: https://generativelanguage.googleapis.com)
    pub base_url: String,

    /// Model identifier (default: gemini-2.5-flash)
    pub model: String,

    /// HTTP client configuration
    pub client_config: HttpClientConfig,
}

impl GeminiConfig {
    /// Create a new Gemini configuration
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
            client_config: HttpClientConfig::default(),
        }
    }

    /// Set the base URL (for custom endpoints)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the model identifier
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Gemini connector
pub struct GeminiConnector {
    config: GeminiConfig,
    client: Client,
}

// Request wire types (camelCase per the Gemini REST API)

#[derive(Debug, Clone, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Clone, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema")]
    response_schema: Value,
    temperature: f32,
}

// Response wire types

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiConnector {
    /// Create a new Gemini connector
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = create_client(&config.client_config)?;
        Ok(Self { config, client })
    }

    /// Analyze one image and return every coin identified in it.
    ///
    /// The image travels as an inline base64 payload next to the analysis
    /// instruction; the response schema constrains the model to an array of
    /// coin objects.
    #[instrument(skip(self, image), fields(image_bytes = image.len()))]
    pub async fn analyze(&self, image: &[u8], mime_type: &str) -> Result<Vec<CoinAnalysis>> {
        let request = build_request(image, mime_type);
        debug!("Sending analysis request to Gemini");

        let max_retries = self.config.client_config.max_retries;
        let document = with_retry(max_retries, || {
            let request = request.clone();
            async move {
                let response = self
                    .client
                    .post(format!(
                        "{}/v1beta/models/{}:generateContent",
                        self.config.base_url, self.config.model
                    ))
                    .header("x-goog-api-key", &self.config.api_key)
                    .header("Content-Type", "application/json")
                    .json(&request)
                    .send()
                    .await?;

                self.handle_response(response).await
            }
        })
        .await?;

        normalize_analyses(&document)
    }

    /// Unwrap the provider envelope down to the model's JSON document.
    async fn handle_response(&self, response: reqwest::Response) -> Result<String> {
        let status = response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());

            return Err(if status_code == 429 {
                EgressError::RateLimitExceeded {
                    retry_after_secs: None,
                }
            } else {
                EgressError::ProviderError {
                    status_code,
                    message: body,
                }
            });
        }

        let envelope = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| {
                EgressError::ParseError(format!("Failed to parse Gemini response: {}", e))
            })?;

        let text = envelope
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| {
                EgressError::ParseError("Gemini response contained no text part".to_string())
            })?;

        Ok(text.trim().to_string())
    }
}

#[async_trait::async_trait]
impl VisionAnalyzer for GeminiConnector {
    async fn analyze_image(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> coinscope_core::Result<Vec<CoinAnalysis>> {
        self.analyze(image, mime_type).await.map_err(Into::into)
    }
}

fn build_request(image: &[u8], mime_type: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![
                Part::Text {
                    text: schema::ANALYSIS_INSTRUCTION.to_string(),
                },
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: mime_type.to_string(),
                        data: BASE64.encode(image),
                    },
                },
            ],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: schema::response_schema(),
            temperature: ANALYSIS_TEMPERATURE,
        },
    }
}

/// Normalize the model's JSON document into coin analysis records.
///
/// Decision table:
/// - array → use as the result list
/// - single non-empty object → wrap in a one-element list (the model
///   occasionally omits the enclosing array despite the schema)
/// - empty object or non-object scalar → empty list
/// - unparsable text → `InvalidFormat`
fn normalize_analyses(document: &str) -> Result<Vec<CoinAnalysis>> {
    let value: Value = serde_json::from_str(document)
        .map_err(|e| EgressError::InvalidFormat(e.to_string()))?;

    match value {
        Value::Array(_) => serde_json::from_value(value)
            .map_err(|e| EgressError::InvalidFormat(e.to_string())),
        Value::Object(ref map) if !map.is_empty() => {
            let analysis: CoinAnalysis = serde_json::from_value(value)
                .map_err(|e| EgressError::InvalidFormat(e.to_string()))?;
            Ok(vec![analysis])
        }
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_coin_json() -> Value {
        json!({
            "coinType": "Washington Quarter",
            "year": 1932,
            "mintMark": "D",
            "condition": "Fine",
            "description": "Key date Washington quarter.",
            "confidenceScore": 0.85,
            "marketValues": [{
                "marketplace": "Heritage Auctions",
                "url": "https://coins.ha.com/search?q=1932-d+quarter",
                "value": "$150 - $300",
                "valueConfidence": 0.7
            }],
            "historicalValues": [
                {"date": "2024-01", "value": 180.0},
                {"date": "2024-02", "value": 185.0}
            ]
        })
    }

    /// Wrap a model document in the provider envelope.
    fn envelope(document: &Value) -> Value {
        json!({
            "candidates": [{
                "content": {
                    "parts": [{"text": document.to_string()}]
                }
            }]
        })
    }

    fn test_config(server: &MockServer) -> GeminiConfig {
        let mut config = GeminiConfig::new("test-key").with_base_url(server.uri());
        // Error-path tests should see exactly one request
        config.client_config.max_retries = 0;
        config
    }

    #[test]
    fn test_config_builder() {
        let config = GeminiConfig::new("test-key")
            .with_base_url("https://custom.api.com")
            .with_model("gemini-x");

        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.base_url, "https://custom.api.com");
        assert_eq!(config.model, "gemini-x");
    }

    #[test]
    fn test_connector_creation() {
        let connector = GeminiConnector::new(GeminiConfig::new("test-key"));
        assert!(connector.is_ok());
    }

    #[test]
    fn test_request_shape() {
        let request = build_request(b"img-bytes", "image/png");
        let value = serde_json::to_value(&request).unwrap();

        let parts = value["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert!(parts[0]["text"].as_str().unwrap().contains("coin"));
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(
            parts[1]["inlineData"]["data"],
            BASE64.encode(b"img-bytes")
        );

        let generation = &value["generationConfig"];
        assert_eq!(generation["responseMimeType"], "application/json");
        assert_eq!(generation["responseSchema"]["type"], "ARRAY");
        assert!((generation["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_array_of_n() {
        let document = json!([sample_coin_json(), sample_coin_json()]).to_string();
        let analyses = normalize_analyses(&document).unwrap();
        assert_eq!(analyses.len(), 2);
        assert_eq!(analyses[0].coin_type, "Washington Quarter");
    }

    #[test]
    fn test_normalize_single_object_wrapped() {
        let document = sample_coin_json().to_string();
        let analyses = normalize_analyses(&document).unwrap();
        assert_eq!(analyses.len(), 1);
        assert_eq!(analyses[0].year, 1932);
    }

    #[test]
    fn test_normalize_empty_object_is_empty_list() {
        let analyses = normalize_analyses("{}").unwrap();
        assert!(analyses.is_empty());
    }

    #[test]
    fn test_normalize_empty_array() {
        let analyses = normalize_analyses("[]").unwrap();
        assert!(analyses.is_empty());
    }

    #[test]
    fn test_normalize_scalar_is_empty_list() {
        assert!(normalize_analyses("null").unwrap().is_empty());
        assert!(normalize_analyses("\"no coins\"").unwrap().is_empty());
    }

    #[test]
    fn test_normalize_malformed_json_is_format_error() {
        let result = normalize_analyses("not json at all");
        assert!(matches!(result, Err(EgressError::InvalidFormat(_))));
    }

    #[test]
    fn test_normalize_object_missing_fields_is_format_error() {
        let result = normalize_analyses(r#"{"coinType": "Mystery Coin"}"#);
        assert!(matches!(result, Err(EgressError::InvalidFormat(_))));
    }

    #[tokio::test]
    async fn test_analyze_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "generationConfig": {"responseMimeType": "application/json"}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(envelope(&json!([sample_coin_json()]))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let connector = GeminiConnector::new(test_config(&server)).unwrap();
        let analyses = connector.analyze(b"fake-image", "image/jpeg").await.unwrap();

        assert_eq!(analyses.len(), 1);
        assert_eq!(analyses[0].mint_mark, "D");
        assert_eq!(analyses[0].historical_values.len(), 2);
    }

    #[tokio::test]
    async fn test_analyze_wraps_single_object_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(envelope(&sample_coin_json())),
            )
            .mount(&server)
            .await;

        let connector = GeminiConnector::new(test_config(&server)).unwrap();
        let analyses = connector.analyze(b"fake-image", "image/png").await.unwrap();
        assert_eq!(analyses.len(), 1);
    }

    #[tokio::test]
    async fn test_analyze_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let connector = GeminiConnector::new(test_config(&server)).unwrap();
        let result = connector.analyze(b"fake-image", "image/png").await;

        assert!(matches!(
            result,
            Err(EgressError::ProviderError { status_code: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_analyze_rate_limited() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let connector = GeminiConnector::new(test_config(&server)).unwrap();
        let result = connector.analyze(b"fake-image", "image/png").await;

        assert!(matches!(result, Err(EgressError::RateLimitExceeded { .. })));
    }

    #[tokio::test]
    async fn test_analyze_malformed_document_is_format_error() {
        let server = MockServer::start().await;

        let body = json!({
            "candidates": [{
                "content": {"parts": [{"text": "I am not JSON"}]}
            }]
        });
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let connector = GeminiConnector::new(test_config(&server)).unwrap();
        let result = connector.analyze(b"fake-image", "image/png").await;

        assert!(matches!(result, Err(EgressError::InvalidFormat(_))));
    }

    #[tokio::test]
    async fn test_analyze_empty_envelope_is_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let connector = GeminiConnector::new(test_config(&server)).unwrap();
        let result = connector.analyze(b"fake-image", "image/png").await;

        assert!(matches!(result, Err(EgressError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_analyze_retries_transient_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(envelope(&json!([]))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut config = GeminiConfig::new("test-key").with_base_url(server.uri());
        config.client_config.max_retries = 2;

        let connector = GeminiConnector::new(config).unwrap();
        let analyses = connector.analyze(b"fake-image", "image/png").await.unwrap();
        assert!(analyses.is_empty());
    }
}
