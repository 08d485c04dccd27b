//! textmine Model Backend Layer
//!
//! Pluggable LLM backend implementations behind the [`ModelBackend`] trait.
//!
//! # Backends
//!
//! - [`MockBackend`]: deterministic mock for testing
//! - [`OllamaBackend`]: local Ollama API, no credential required
//! - [`OpenAiBackend`]: remote OpenAI-compatible API, requires an API key
//!
//! Every completion call carries a mandatory timeout; expiry surfaces as
//! [`LlmError::Timeout`]. Retry policy belongs to the caller and is provided
//! by [`retry::complete_with_retry`].
//!
//! # Examples
//!
//! ```
//! use textmine_llm::{MockBackend, ModelBackend};
//!
//! # tokio_test::block_on(async {
//! let backend = MockBackend::new("[]");
//! let result = backend.complete("test prompt").await.unwrap();
//! assert_eq!(result, "[]");
//! # });
//! ```

#![warn(missing_docs)]

pub mod ollama;
pub mod openai;
pub mod retry;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use ollama::{OllamaBackend, OllamaConfig};
pub use openai::{OpenAiBackend, OpenAiConfig};
pub use retry::{complete_with_retry, CompletionOutcome, RetryPolicy};

/// Errors that can occur during model backend operations
#[derive(Debug, Error)]
pub enum LlmError {
    /// The per-call timeout expired before the backend responded
    #[error("completion timed out after {secs}s")]
    Timeout {
        /// Configured timeout in seconds
        secs: u64,
    },

    /// Transport failure or non-2xx status from the backend
    #[error("backend '{backend}' error: {cause}")]
    Backend {
        /// Backend name (e.g., "ollama")
        backend: String,
        /// Underlying cause
        cause: String,
    },

    /// The configured model is not served by the backend
    #[error("model not available: {0}")]
    ModelNotAvailable(String),

    /// Provider-side rate limit hit
    #[error("rate limit exceeded")]
    RateLimited,

    /// The backend answered with a body we could not interpret
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Required credential missing for a remote backend
    #[error("API key not provided for backend '{0}'")]
    MissingCredentials(String),
}

/// A pluggable LLM execution target
///
/// Implementations cover the {local-inference, remote-API} capability set.
/// An empty completion is a valid success; the response parser downstream
/// treats it as an empty record list.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Backend name for logging and error attribution
    fn name(&self) -> &str;

    /// Configured model identifier
    fn model(&self) -> &str;

    /// Generate a completion for `prompt`
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Model identifiers the backend can serve (pre-flight capability check)
    async fn list_models(&self) -> Result<Vec<String>, LlmError>;

    /// Lightweight reachability probe
    async fn is_available(&self) -> bool;
}

/// Mock backend for deterministic testing
///
/// Returns scripted replies in order, falling back to a fixed default.
/// No network calls are made.
///
/// # Examples
///
/// ```
/// use textmine_llm::{LlmError, MockBackend, ModelBackend};
///
/// # tokio_test::block_on(async {
/// let backend = MockBackend::new("default");
/// backend.push_response("first");
/// backend.push_error(LlmError::RateLimited);
///
/// assert_eq!(backend.complete("p").await.unwrap(), "first");
/// assert!(backend.complete("p").await.is_err());
/// assert_eq!(backend.complete("p").await.unwrap(), "default");
/// assert_eq!(backend.call_count(), 3);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockBackend {
    default_response: String,
    scripted: Arc<Mutex<VecDeque<Result<String, LlmError>>>>,
    call_count: Arc<Mutex<usize>>,
    reachable: bool,
}

impl MockBackend {
    /// Create a mock that returns `response` for every call
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            scripted: Arc::new(Mutex::new(VecDeque::new())),
            call_count: Arc::new(Mutex::new(0)),
            reachable: true,
        }
    }

    /// Create a mock whose every call fails with a backend error
    pub fn unreachable() -> Self {
        Self {
            default_response: String::new(),
            scripted: Arc::new(Mutex::new(VecDeque::new())),
            call_count: Arc::new(Mutex::new(0)),
            reachable: false,
        }
    }

    /// Queue a successful reply, consumed before the default response
    pub fn push_response(&self, response: impl Into<String>) {
        self.scripted.lock().unwrap().push_back(Ok(response.into()));
    }

    /// Queue an error reply
    pub fn push_error(&self, error: LlmError) {
        self.scripted.lock().unwrap().push_back(Err(error));
    }

    /// Number of times `complete` was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("[]")
    }
}

#[async_trait]
impl ModelBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        *self.call_count.lock().unwrap() += 1;

        if !self.reachable {
            return Err(LlmError::Backend {
                backend: "mock".to_string(),
                cause: "connection refused".to_string(),
            });
        }

        if let Some(reply) = self.scripted.lock().unwrap().pop_front() {
            return reply;
        }

        Ok(self.default_response.clone())
    }

    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        if !self.reachable {
            return Err(LlmError::Backend {
                backend: "mock".to_string(),
                cause: "connection refused".to_string(),
            });
        }
        Ok(vec!["mock-model".to_string()])
    }

    async fn is_available(&self) -> bool {
        self.reachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_default_response() {
        let backend = MockBackend::new("hello");
        assert_eq!(backend.complete("any").await.unwrap(), "hello");
        assert_eq!(backend.complete("other").await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_mock_scripted_order() {
        let backend = MockBackend::new("default");
        backend.push_response("one");
        backend.push_response("two");

        assert_eq!(backend.complete("p").await.unwrap(), "one");
        assert_eq!(backend.complete("p").await.unwrap(), "two");
        assert_eq!(backend.complete("p").await.unwrap(), "default");
    }

    #[tokio::test]
    async fn test_mock_error_injection() {
        let backend = MockBackend::new("default");
        backend.push_error(LlmError::Timeout { secs: 1 });

        let err = backend.complete("p").await.unwrap_err();
        assert!(matches!(err, LlmError::Timeout { secs: 1 }));
    }

    #[tokio::test]
    async fn test_mock_call_count_shared_across_clones() {
        let backend = MockBackend::new("x");
        let clone = backend.clone();

        backend.complete("p").await.unwrap();
        clone.complete("p").await.unwrap();

        assert_eq!(backend.call_count(), 2);
        assert_eq!(clone.call_count(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_mock() {
        let backend = MockBackend::unreachable();
        assert!(!backend.is_available().await);
        assert!(matches!(
            backend.complete("p").await,
            Err(LlmError::Backend { .. })
        ));
        assert!(backend.list_models().await.is_err());
    }

    #[tokio::test]
    async fn test_mock_lists_its_model() {
        let backend = MockBackend::default();
        assert_eq!(backend.list_models().await.unwrap(), vec!["mock-model"]);
        assert!(backend.is_available().await);
    }
}
