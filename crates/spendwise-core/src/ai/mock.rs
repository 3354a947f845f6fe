//! Mock backend for testing
//!
//! Deterministic and offline. Picks a candidate category whose name appears
//! in the merchant or description, or returns a scripted answer.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::types::{ClassificationRequest, ExternalClassification};
use super::ClassifierBackend;

/// Mock classifier backend
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// Fixed answer returned for every request
    pub response: Option<ExternalClassification>,
    /// Fail every classification call
    pub failing: bool,
    /// Runs at the start of every classification call
    pub on_call: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Default::default()
        }
    }

    /// Always answer with the given classification
    pub fn with_response(response: ExternalClassification) -> Self {
        Self {
            healthy: true,
            response: Some(response),
            ..Default::default()
        }
    }

    /// Every call errors, as if the service were down
    pub fn failing() -> Self {
        Self {
            healthy: false,
            failing: true,
            ..Default::default()
        }
    }

    /// Run `hook` whenever a classification is requested, while the caller awaits
    pub fn with_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_call = Some(Arc::new(hook));
        self
    }
}

#[async_trait]
impl ClassifierBackend for MockBackend {
    async fn classify_expense(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ExternalClassification> {
        if let Some(ref hook) = self.on_call {
            hook();
        }
        if self.failing {
            return Err(Error::InvalidData("Mock classifier failure".into()));
        }
        if let Some(ref response) = self.response {
            return Ok(response.clone());
        }

        let haystack = format!(
            "{} {}",
            request.merchant,
            request.description.as_deref().unwrap_or("")
        )
        .to_lowercase();

        request
            .categories
            .iter()
            .find(|name| haystack.contains(&name.to_lowercase()))
            .map(|name| ExternalClassification::new(name, 0.9, "Mock match on category name"))
            .ok_or_else(|| Error::InvalidData("Mock classifier found no category".into()))
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn request(merchant: &str) -> ClassificationRequest {
        ClassificationRequest {
            amount: 10.0,
            merchant: merchant.into(),
            description: None,
            categories: vec!["Food".into(), "Travel".into()],
        }
    }

    #[tokio::test]
    async fn test_mock_matches_category_name() {
        let mock = MockBackend::new();
        let answer = mock.classify_expense(&request("Travel Desk")).await.unwrap();
        assert_eq!(answer.category_name.as_deref(), Some("Travel"));
        assert!(mock.classify_expense(&request("Cinema")).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_scripted_and_failing() {
        let scripted = MockBackend::with_response(ExternalClassification::new("Food", 0.7, "x"));
        assert_eq!(
            scripted.classify_expense(&request("anything")).await.unwrap().confidence,
            Some(0.7)
        );

        let failing = MockBackend::failing();
        assert!(failing.classify_expense(&request("Food court")).await.is_err());
        assert!(!failing.health_check().await);
    }

    #[tokio::test]
    async fn test_hook_runs_per_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mock = MockBackend::new().with_hook(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let _ = mock.classify_expense(&request("Food court")).await;
        let _ = mock.classify_expense(&request("Cinema")).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
