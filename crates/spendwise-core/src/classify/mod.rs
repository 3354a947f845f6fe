//! Expense classification pipeline
//!
//! Order of attempts for an expense without a category:
//! 1. cached result for (user, normalized merchant)
//! 2. external classifier, when one is configured
//! 3. keyword heuristic, when `heuristic_fallback` is enabled
//! 4. the "Uncategorized" sentinel, asking the user to pick manually
//!
//! Results from steps 2 and 3 are cached; sentinels never are.

mod cache;
mod heuristic;

pub use cache::{ClassificationCache, DEFAULT_CACHE_CAPACITY};
pub use heuristic::{KeywordClassifier, Topic, FALLBACK_CONFIDENCE, KEYWORD_CONFIDENCE};

use std::sync::Arc;

use tracing::{debug, info};

use crate::ai::{AIClient, ClassifierBackend};
use crate::db::Database;
use crate::error::Result;
use crate::models::{Category, ClassificationSuggestion, NewExpense};

/// Rationale when the user has no categories at all
pub const NO_CATEGORIES_REASON: &str =
    "No categories defined by user. Please create categories first.";

/// Rationale when nothing could classify the expense
pub const MANUAL_SELECTION_REASON: &str =
    "The AI could not identify a category. Please select one manually.";

/// Orchestrator settings
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    pub cache_capacity: usize,
    /// Use keyword heuristics when the external classifier is absent or fails
    pub heuristic_fallback: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            heuristic_fallback: true,
        }
    }
}

impl ClassifierConfig {
    /// Read `CLASSIFIER_CACHE_CAPACITY` and `CLASSIFIER_HEURISTIC_FALLBACK`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let cache_capacity = std::env::var("CLASSIFIER_CACHE_CAPACITY")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.cache_capacity);
        let heuristic_fallback = std::env::var("CLASSIFIER_HEURISTIC_FALLBACK")
            .ok()
            .and_then(|v| parse_flag(&v))
            .unwrap_or(defaults.heuristic_fallback);

        Self {
            cache_capacity,
            heuristic_fallback,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Trimmed, lowercased merchant; `None` when blank
pub fn normalize_merchant(merchant: &str) -> Option<String> {
    let normalized = merchant.trim().to_lowercase();
    (!normalized.is_empty()).then_some(normalized)
}

/// Classification orchestrator
///
/// Constructed once at start-up and shared; the cache is its only mutable state.
pub struct Classifier {
    cache: Arc<ClassificationCache>,
    external: Option<AIClient>,
    heuristic: KeywordClassifier,
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(external: Option<AIClient>, config: ClassifierConfig) -> Self {
        Self {
            cache: Arc::new(ClassificationCache::new(config.cache_capacity)),
            external,
            heuristic: KeywordClassifier::default(),
            config,
        }
    }

    /// Build from `AI_BACKEND` and classifier environment variables
    pub fn from_env() -> Self {
        let external = AIClient::from_env();
        let config = ClassifierConfig::from_env();
        match &external {
            Some(client) => info!(
                backend = client.info().backend,
                model = client.model(),
                "External classifier configured"
            ),
            None => info!("No external classifier configured, using keyword heuristics"),
        }
        Self::new(external, config)
    }

    pub fn cache(&self) -> &Arc<ClassificationCache> {
        &self.cache
    }

    pub fn external(&self) -> Option<&AIClient> {
        self.external.as_ref()
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Suggest a category for an expense, loading the user's categories on a cache miss
    ///
    /// Returns `Ok(None)` when the expense already has a category or has no merchant.
    pub async fn classify(
        &self,
        db: &Database,
        user_id: i64,
        expense: &NewExpense,
    ) -> Result<Option<ClassificationSuggestion>> {
        let Some(merchant) = Self::merchant_to_classify(expense) else {
            return Ok(None);
        };
        if let Some(hit) = self.cached(user_id, &merchant) {
            return Ok(Some(hit));
        }

        let generation = self.cache.generation(user_id);
        let categories = db.list_categories(user_id)?;
        let suggestion = self
            .resolve(user_id, &merchant, expense, &categories, generation)
            .await;
        if self.cache.generation(user_id) == generation {
            return Ok(Some(suggestion));
        }

        // Categories changed while classifying; the pick may be gone
        let generation = self.cache.generation(user_id);
        let categories = db.list_categories(user_id)?;
        let still_owned = suggestion
            .category_id
            .map_or(true, |id| categories.iter().any(|c| c.id == id));
        if still_owned {
            return Ok(Some(suggestion));
        }
        debug!(user_id, merchant, "Suggested category was removed, classifying again");
        Ok(Some(
            self.resolve(user_id, &merchant, expense, &categories, generation)
                .await,
        ))
    }

    /// Same as [`Classifier::classify`] over an already-loaded category list
    pub async fn classify_with_categories(
        &self,
        user_id: i64,
        expense: &NewExpense,
        categories: &[Category],
    ) -> Option<ClassificationSuggestion> {
        let merchant = Self::merchant_to_classify(expense)?;
        if let Some(hit) = self.cached(user_id, &merchant) {
            return Some(hit);
        }
        let generation = self.cache.generation(user_id);
        Some(
            self.resolve(user_id, &merchant, expense, categories, generation)
                .await,
        )
    }

    fn merchant_to_classify(expense: &NewExpense) -> Option<String> {
        if expense.category_id.is_some() {
            return None;
        }
        normalize_merchant(&expense.merchant)
    }

    fn cached(&self, user_id: i64, merchant: &str) -> Option<ClassificationSuggestion> {
        let hit = self.cache.get(user_id, merchant)?;
        debug!(user_id, merchant, category = %hit.category_name, "Classification cache hit");
        Some(hit)
    }

    async fn resolve(
        &self,
        user_id: i64,
        merchant: &str,
        expense: &NewExpense,
        categories: &[Category],
        generation: u64,
    ) -> ClassificationSuggestion {
        if categories.is_empty() {
            debug!(user_id, "User has no categories");
            return ClassificationSuggestion::uncategorized(NO_CATEGORIES_REASON);
        }

        if let Some(ref external) = self.external {
            if let Some(suggestion) = external
                .suggest_category(
                    expense.amount,
                    expense.merchant.trim(),
                    expense.description.as_deref(),
                    categories,
                )
                .await
            {
                debug!(user_id, merchant, category = %suggestion.category_name, "External classification");
                self.remember(user_id, merchant, &suggestion, generation);
                return suggestion;
            }
        }

        if self.config.heuristic_fallback {
            if let Some(suggestion) = self.heuristic.classify(merchant, categories) {
                debug!(user_id, merchant, category = %suggestion.category_name, "Keyword classification");
                self.remember(user_id, merchant, &suggestion, generation);
                return suggestion;
            }
        }

        debug!(user_id, merchant, "No classification, manual selection required");
        ClassificationSuggestion::uncategorized(MANUAL_SELECTION_REASON)
    }

    fn remember(
        &self,
        user_id: i64,
        merchant: &str,
        suggestion: &ClassificationSuggestion,
        generation: u64,
    ) {
        if !self
            .cache
            .insert_if_current(user_id, merchant, suggestion.clone(), generation)
        {
            debug!(user_id, merchant, "Categories changed mid-classification, not caching");
        }
    }
}
