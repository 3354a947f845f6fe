//! Classifier request/response types
//!
//! These types are backend-agnostic and used across all classifier implementations.

use serde::{Deserialize, Serialize};

use crate::models::Category;

/// What an external classifier sees about an expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRequest {
    pub amount: f64,
    pub merchant: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Candidate category names; the answer must be one of these
    pub categories: Vec<String>,
}

impl ClassificationRequest {
    pub fn new(
        amount: f64,
        merchant: &str,
        description: Option<&str>,
        categories: &[Category],
    ) -> Self {
        Self {
            amount,
            merchant: merchant.to_string(),
            description: description.map(str::to_string),
            categories: categories.iter().map(|c| c.name.clone()).collect(),
        }
    }
}

/// Structured answer returned by a classifier model
///
/// Wire format: `{"categoryName": "...", "confidence": 0.0, "reason": "..."}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalClassification {
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ExternalClassification {
    pub fn new(category_name: &str, confidence: f64, reason: &str) -> Self {
        Self {
            category_name: Some(category_name.to_string()),
            confidence: Some(confidence),
            reason: Some(reason.to_string()),
        }
    }
}

/// Backend description for health output
#[derive(Debug, Clone, Serialize)]
pub struct BackendInfo {
    pub backend: &'static str,
    pub model: String,
    pub host: String,
}
