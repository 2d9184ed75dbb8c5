//! HTTP Oracle Implementation
//!
//! Talks to a remote extraction service speaking the Ollama-style generate
//! API. The service receives the full prompt for one extraction and answers
//! with a JSON candidate list in the `response` field; validation of that
//! JSON is the caller's job, never this client's.
//!
//! # Features
//!
//! - Configurable endpoint and model
//! - Retry logic with exponential backoff
//! - Timeout handling

use std::time::Duration;

use samtrace_domain::traits::{ExtractionOracle, OracleRequest};
use serde::{Deserialize, Serialize};

use crate::OracleError;

/// Default extraction service endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for extraction requests (120 seconds; pair comparisons
/// over long documents are slow)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default number of retry attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// HTTP client for a remote extraction service.
pub struct HttpOracle {
    endpoint: String,
    model: String,
    client: reqwest::Client,
    max_retries: u32,
}

/// Request body for the generate API
#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    format: String,
}

/// Response from the generate API
#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
    #[allow(dead_code)]
    done: bool,
}

impl HttpOracle {
    /// Create a new HTTP oracle.
    ///
    /// # Parameters
    ///
    /// - `endpoint`: service endpoint (e.g., "http://localhost:11434")
    /// - `model`: model to use (e.g., "llama3", "mistral")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| OracleError::Communication(format!("Client setup failed: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            model: model.into(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Create a new HTTP oracle against the default endpoint.
    pub fn default_endpoint(model: impl Into<String>) -> Result<Self, OracleError> {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Set the maximum number of retry attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Run one extraction against the service.
    ///
    /// # Errors
    ///
    /// Returns an error if the service is unreachable, the model is not
    /// available, or the response body cannot be read.
    pub async fn extract_async(&self, request: &OracleRequest) -> Result<String, OracleError> {
        let url = format!("{}/api/generate", self.endpoint);

        let request_body = GenerateRequest {
            model: self.model.clone(),
            prompt: request.prompt.clone(),
            stream: false,
            format: "json".to_string(),
        };

        // Retry with exponential backoff: 1s, 2s, 4s, ...
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self.client.post(&url).json(&request_body).send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        return match response.json::<GenerateResponse>().await {
                            Ok(body) => Ok(body.response),
                            Err(e) => Err(OracleError::InvalidResponse(format!(
                                "Failed to parse response: {}",
                                e
                            ))),
                        };
                    } else if response.status() == reqwest::StatusCode::NOT_FOUND {
                        return Err(OracleError::ModelNotAvailable(self.model.clone()));
                    } else {
                        let status = response.status();
                        let error_text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Unknown error".to_string());
                        last_error = Some(OracleError::Communication(format!(
                            "HTTP {}: {}",
                            status, error_text
                        )));
                    }
                }
                Err(e) => {
                    last_error = Some(OracleError::Communication(format!(
                        "Request failed: {}",
                        e
                    )));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| OracleError::Communication("Max retries exceeded".to_string())))
    }
}

impl ExtractionOracle for HttpOracle {
    type Error = OracleError;

    fn extract(&self, request: &OracleRequest) -> Result<String, Self::Error> {
        // Blocking wrapper; the pipeline calls this off the async runtime
        // via spawn_blocking, so a throwaway current-thread runtime is fine.
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| OracleError::Communication(format!("Runtime setup failed: {}", e)))?;
        runtime.block_on(self.extract_async(request))
    }
}
