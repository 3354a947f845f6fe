//! Pluggable external classifier abstraction
//!
//! # Architecture
//!
//! - `ClassifierBackend` trait: the single async operation every backend provides
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `GeminiBackend`, `OpenAICompatibleBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (gemini, openai_compatible, mock). Default: gemini
//! - `AI_TIMEOUT_SECS`: Request timeout for external calls. Default: 10
//! - Backend-specific variables are documented on each backend.

mod gemini;
mod mock;
mod openai_compatible;
pub mod parsing;
pub mod prompt;
pub mod types;

pub use gemini::{GeminiBackend, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
pub use mock::MockBackend;
pub use openai_compatible::{OpenAICompatibleBackend, DEFAULT_OPENAI_MODEL};
pub use types::*;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::warn;

use crate::error::Result;
use crate::models::{Category, ClassificationSuggestion};

/// Default timeout for a single external classification call
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub(crate) fn default_timeout() -> Duration {
    Duration::from_secs(DEFAULT_TIMEOUT_SECS)
}

/// Read `AI_TIMEOUT_SECS`, falling back to the default
pub(crate) fn timeout_from_env() -> Duration {
    std::env::var("AI_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(default_timeout)
}

pub(crate) fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Trait defining the interface for external classifiers
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait ClassifierBackend: Send + Sync {
    /// Ask the model which of the candidate categories fits the expense
    async fn classify_expense(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ExternalClassification>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete classifier client enum
#[derive(Clone)]
pub enum AIClient {
    /// Google Gemini (generateContent API)
    Gemini(GeminiBackend),
    /// OpenAI-compatible chat completions server
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create a classifier client from environment variables
    ///
    /// Checks `AI_BACKEND` to determine which backend to use:
    /// - `gemini` (default): Uses GEMINI_API_KEY, GEMINI_MODEL, GEMINI_BASE_URL
    /// - `openai_compatible`: Uses OPENAI_COMPATIBLE_HOST, OPENAI_COMPATIBLE_MODEL
    /// - `mock`: Deterministic offline backend
    ///
    /// Returns None if the required environment variables are not set.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "gemini".to_string());

        match backend.to_lowercase().as_str() {
            "gemini" | "google" => GeminiBackend::from_env().map(AIClient::Gemini),
            "openai_compatible" | "openai" | "vllm" | "localai" => {
                OpenAICompatibleBackend::from_env().map(AIClient::OpenAICompatible)
            }
            "mock" => Some(AIClient::mock()),
            "none" | "off" => None,
            _ => {
                warn!(backend = %backend, "Unknown AI_BACKEND, falling back to gemini");
                GeminiBackend::from_env().map(AIClient::Gemini)
            }
        }
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Backend name, model and host for health output
    pub fn info(&self) -> BackendInfo {
        let backend = match self {
            AIClient::Gemini(_) => "gemini",
            AIClient::OpenAICompatible(_) => "openai_compatible",
            AIClient::Mock(_) => "mock",
        };
        BackendInfo {
            backend,
            model: self.model().to_string(),
            host: self.host().to_string(),
        }
    }

    /// Classify an expense against the user's categories
    ///
    /// Any failure (transport, status, malformed body, unknown category name)
    /// is logged and reported as "no suggestion".
    pub async fn suggest_category(
        &self,
        amount: f64,
        merchant: &str,
        description: Option<&str>,
        categories: &[Category],
    ) -> Option<ClassificationSuggestion> {
        let request = ClassificationRequest::new(amount, merchant, description, categories);

        match self.classify_expense(&request).await {
            Ok(answer) => {
                let suggestion = parsing::resolve_category(&answer, categories);
                if suggestion.is_none() {
                    warn!(
                        model = self.model(),
                        answer = ?answer.category_name,
                        "Classifier returned a category outside the user's set"
                    );
                }
                suggestion
            }
            Err(e) => {
                warn!(model = self.model(), host = self.host(), "Classification failed: {}", e);
                None
            }
        }
    }
}

// Implement ClassifierBackend for AIClient by delegating to the inner backend
#[async_trait]
impl ClassifierBackend for AIClient {
    async fn classify_expense(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ExternalClassification> {
        match self {
            AIClient::Gemini(b) => b.classify_expense(request).await,
            AIClient::OpenAICompatible(b) => b.classify_expense(request).await,
            AIClient::Mock(b) => b.classify_expense(request).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Gemini(b) => b.health_check().await,
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.model(),
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.host(),
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}
