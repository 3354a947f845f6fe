//! Spendwise Core Library
//!
//! Shared functionality for the Spendwise expense tracker:
//! - Database access and migrations (users, categories, expenses, budgets)
//! - Pluggable external classifier backends (Gemini, OpenAI-compatible, mock)
//! - Classification pipeline: merchant cache, keyword heuristics, orchestrator
//! - Recurring charge detection
//! - Budget alerts and spending analytics
//! - Password hashing and bearer tokens

pub mod ai;
pub mod analytics;
pub mod auth;
pub mod budget;
pub mod categories;
pub mod classify;
pub mod db;
pub mod error;
pub mod expenses;
pub mod models;
pub mod recurrence;

/// Test utilities including mock classifier server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    AIClient, ClassificationRequest, ClassifierBackend, ExternalClassification, GeminiBackend,
    MockBackend, OpenAICompatibleBackend,
};
pub use auth::{hash_password, validate_password, verify_password, Claims, TokenIssuer};
pub use budget::{budget_alerts, compute_alerts};
pub use classify::{ClassificationCache, Classifier, ClassifierConfig, KeywordClassifier};
pub use db::Database;
pub use error::{Error, Result};
pub use expenses::ExpenseService;
pub use recurrence::RecurrenceDetector;
