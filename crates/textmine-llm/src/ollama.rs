//! Ollama backend implementation
//!
//! Local inference through Ollama's HTTP API. No network credential is
//! required; availability is probed through the lightweight `/api/tags`
//! endpoint, which doubles as the model listing.

use crate::{LlmError, ModelBackend};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default Ollama API endpoint
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default per-call timeout (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Timeout for the reachability probe (seconds)
const PROBE_TIMEOUT_SECS: u64 = 5;

/// Configuration for the Ollama backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// API base URL
    pub base_url: String,

    /// Model to use (e.g., "llama3.2")
    pub model: String,

    /// Per-call timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "llama3.2".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Local Ollama backend
pub struct OllamaBackend {
    config: OllamaConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f64,
    top_p: f64,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
}

impl OllamaBackend {
    /// Create a backend from configuration
    pub fn new(config: OllamaConfig) -> Result<Self, LlmError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Backend {
                backend: "ollama".to_string(),
                cause: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            config: OllamaConfig { base_url, ..config },
            client,
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout {
                secs: self.config.timeout_secs,
            }
        } else {
            LlmError::Backend {
                backend: "ollama".to_string(),
                cause: e.to_string(),
            }
        }
    }

    async fn status_error(&self, response: reqwest::Response) -> LlmError {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return LlmError::ModelNotAvailable(self.config.model.clone());
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return LlmError::RateLimited;
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        LlmError::Backend {
            backend: "ollama".to_string(),
            cause: format!("HTTP {}: {}", status, body),
        }
    }
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.config.base_url);
        debug!(url = %url, model = %self.config.model, "sending generate request");

        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            // Low temperature keeps the structured output stable.
            options: GenerateOptions {
                temperature: 0.1,
                top_p: 0.9,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(self.status_error(response).await);
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("failed to parse response: {}", e)))?;

        Ok(body.response)
    }

    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let url = format!("{}/api/tags", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(self.status_error(response).await);
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("failed to parse tags: {}", e)))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.config.base_url);
        matches!(
            self.client
                .get(&url)
                .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
                .send()
                .await,
            Ok(response) if response.status().is_success()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = OllamaConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let backend = OllamaBackend::new(OllamaConfig {
            base_url: "http://localhost:11434/".to_string(),
            ..OllamaConfig::default()
        })
        .unwrap();
        assert_eq!(backend.config.base_url, "http://localhost:11434");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_backend_error() {
        // Port 9 (discard) is unassigned in test environments.
        let backend = OllamaBackend::new(OllamaConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..OllamaConfig::default()
        })
        .unwrap();

        let result = backend.complete("test").await;
        assert!(matches!(
            result,
            Err(LlmError::Backend { .. }) | Err(LlmError::Timeout { .. })
        ));
        assert!(!backend.is_available().await);
    }

    // Integration test, requires a running Ollama instance.
    #[tokio::test]
    #[ignore]
    async fn test_generate_against_local_ollama() {
        let backend = OllamaBackend::new(OllamaConfig::default()).unwrap();
        if backend.is_available().await {
            let response = backend.complete("Say 'hello' and nothing else").await.unwrap();
            assert!(!response.is_empty());
        }
    }
}
