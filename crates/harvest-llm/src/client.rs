//! Streaming generation client.
//!
//! [`OllamaClient::generate`] is **total**: it always resolves to text.
//! Real model output when the request succeeds, the fixed
//! [`FALLBACK_TEXT`] when the model is missing (HTTP 404) or the
//! transport retry budget runs out. Callers never see an error from
//! generation — they have a meaningful degraded-mode response, unlike
//! persistence, whose failures stay fatal-by-default.

use std::pin::pin;
use std::time::Duration;

use async_trait::async_trait;
use harvest_core::{run_with_retry, RetryPolicy};
use harvest_settings::LlmSettings;
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use crate::error::LlmError;
use crate::ndjson::parse_ndjson_lines;
use crate::probe::{ensure_model_available, ModelAvailability};

/// Fixed placeholder returned when generation is unavailable.
pub const FALLBACK_TEXT: &str =
    "Harvest information is not available at this time. Please check back later.";

/// Seam for text generation. The service layer consumes this trait so
/// tests can substitute canned generators.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for `prompt`. Total — never fails.
    async fn generate(&self, prompt: &str) -> String;
}

/// One streamed generation chunk. Only `response` matters here; chunks
/// carry other bookkeeping fields we ignore.
#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Client for the local Ollama server.
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    generate_timeout: Duration,
    retry: RetryPolicy,
    availability: ModelAvailability,
}

impl OllamaClient {
    /// Construct the client and run the one-time availability probe.
    ///
    /// Never fails: an unreachable server or missing model only
    /// degrades later generation to [`FALLBACK_TEXT`].
    pub async fn connect(settings: &LlmSettings) -> Self {
        let http = reqwest::Client::new();
        let availability = ensure_model_available(&http, settings).await;
        info!(
            checked = availability.checked,
            present = availability.present,
            "inference client ready"
        );
        Self::with_client(settings, http, availability)
    }

    /// Construct with a shared HTTP client and a known availability
    /// result, skipping the probe.
    #[must_use]
    pub fn with_client(
        settings: &LlmSettings,
        http: reqwest::Client,
        availability: ModelAvailability,
    ) -> Self {
        Self {
            http,
            base_url: settings.base_url(),
            model: settings.model.clone(),
            generate_timeout: Duration::from_secs(settings.generate_timeout_secs),
            retry: settings.generate_retry.clone(),
            availability,
        }
    }

    /// Cached availability from the startup probe.
    #[must_use]
    pub fn availability(&self) -> ModelAvailability {
        self.availability
    }

    /// One generation attempt.
    ///
    /// `Ok(None)` means the server reported the model missing (404) —
    /// a short-circuit to the fallback, not a retryable failure.
    async fn try_generate(&self, prompt: &str) -> Result<Option<String>, LlmError> {
        let response = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .timeout(self.generate_timeout)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: true,
            })
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            warn!(model = %self.model, "model not found, returning default response");
            return Ok(None);
        }
        let response = response.error_for_status()?;

        // Concatenate fragments in arrival order. A chunk that fails to
        // parse is skipped; a transport error fails the whole attempt.
        let mut lines = pin!(parse_ndjson_lines(response.bytes_stream()));
        let mut full = String::new();
        while let Some(line) = lines.next().await {
            let line = line?;
            match serde_json::from_str::<GenerateChunk>(&line) {
                Ok(chunk) => {
                    if let Some(fragment) = chunk.response {
                        full.push_str(&fragment);
                    }
                }
                Err(err) => {
                    debug!(error = %err, "skipping malformed stream chunk");
                }
            }
        }
        Ok(Some(full.trim().to_string()))
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str) -> String {
        let result =
            run_with_retry(&self.retry, "llm.generate", || self.try_generate(prompt)).await;
        match result {
            Ok(Some(text)) => text,
            Ok(None) => FALLBACK_TEXT.to_string(),
            Err(err) => {
                warn!(error = %err, "generation failed after retries, returning fallback");
                FALLBACK_TEXT.to_string()
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, retry: RetryPolicy) -> OllamaClient {
        let addr = server.address();
        let settings = LlmSettings {
            host: addr.ip().to_string(),
            port: addr.port(),
            model: "llama3.2".into(),
            generate_timeout_secs: 5,
            probe_timeout_secs: 5,
            pull_timeout_secs: 5,
            probe_retry: RetryPolicy::new(1, 0),
            generate_retry: retry,
        };
        OllamaClient::with_client(
            &settings,
            reqwest::Client::new(),
            ModelAvailability {
                checked: true,
                present: true,
            },
        )
    }

    fn ndjson(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(body.to_string(), "application/x-ndjson")
    }

    #[tokio::test]
    async fn aggregates_fragments_in_arrival_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ndjson(
                "{\"response\":\"a\"}\n\
                 {\"response\":\"b\"}\n\
                 this line is not json\n\
                 {\"response\":\"c\"}\n\
                 {\"done\":true}\n",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, RetryPolicy::new(3, 1));
        assert_eq!(client.generate("x").await, "abc");
    }

    #[tokio::test]
    async fn model_not_found_returns_fallback_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1) // exactly one request: 404 is not retried
            .mount(&server)
            .await;

        let client = client_for(&server, RetryPolicy::new(5, 60_000));
        assert_eq!(client.generate("x").await, FALLBACK_TEXT);
    }

    #[tokio::test]
    async fn transport_failure_retries_then_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let client = client_for(&server, RetryPolicy::new(3, 1));
        assert_eq!(client.generate("x").await, FALLBACK_TEXT);
    }

    #[tokio::test]
    async fn transient_failure_then_success_returns_real_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ndjson("{\"response\":\"ready in June\"}\n"))
            .mount(&server)
            .await;

        let client = client_for(&server, RetryPolicy::new(5, 1));
        assert_eq!(client.generate("x").await, "ready in June");
    }

    #[tokio::test]
    async fn unreachable_server_falls_back() {
        let server = MockServer::start().await;
        let client = client_for(&server, RetryPolicy::new(2, 1));
        // Shut the server down so the connection is refused.
        drop(server);

        assert_eq!(client.generate("x").await, FALLBACK_TEXT);
    }

    #[tokio::test]
    async fn trims_surrounding_whitespace() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ndjson("{\"response\":\"  harvest soon  \"}\n"))
            .mount(&server)
            .await;

        let client = client_for(&server, RetryPolicy::new(1, 0));
        assert_eq!(client.generate("x").await, "harvest soon");
    }
}
