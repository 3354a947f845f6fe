//! Expense service
//!
//! Composes the store, the classification pipeline and the recurrence
//! detector. Every operation is scoped to the acting user.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::classify::Classifier;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{ClassificationSuggestion, DerivedFields, Expense, NewExpense};
use crate::recurrence::{RecurrenceCandidate, RecurrenceDetector};

/// Application service over expenses, categories and budgets
#[derive(Clone)]
pub struct ExpenseService {
    db: Database,
    classifier: Arc<Classifier>,
    recurrence: RecurrenceDetector,
}

impl ExpenseService {
    pub fn new(db: Database, classifier: Arc<Classifier>) -> Self {
        Self {
            db,
            classifier,
            recurrence: RecurrenceDetector,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn classifier(&self) -> &Arc<Classifier> {
        &self.classifier
    }

    pub fn list_expenses(&self, user_id: i64) -> Result<Vec<Expense>> {
        self.db.list_expenses(user_id)
    }

    pub fn get_expense(&self, user_id: i64, id: i64) -> Result<Expense> {
        self.db
            .get_expense(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Expense {} not found", id)))
    }

    /// Create an expense, classifying it when no category was given
    pub async fn create_expense(&self, user_id: i64, expense: &NewExpense) -> Result<Expense> {
        expense.validate()?;
        let date = expense.date.unwrap_or_else(today);
        let derived = self.derive(user_id, expense, date, None).await?;

        let id = self.db.create_expense(user_id, expense, date, &derived)?;
        debug!(user_id, id, recurring = derived.is_recurring, "Created expense");
        self.get_expense(user_id, id)
    }

    /// Create expenses one after another, in order
    ///
    /// Later items see earlier ones as history. Stops at the first failure;
    /// expenses already created stay created.
    pub async fn bulk_create_expenses(
        &self,
        user_id: i64,
        expenses: &[NewExpense],
    ) -> Result<Vec<Expense>> {
        let mut created = Vec::with_capacity(expenses.len());
        for expense in expenses {
            created.push(self.create_expense(user_id, expense).await?);
        }
        Ok(created)
    }

    /// Replace an expense; a missing date keeps the stored one
    pub async fn update_expense(
        &self,
        user_id: i64,
        id: i64,
        expense: &NewExpense,
    ) -> Result<Expense> {
        expense.validate()?;
        let existing = self.get_expense(user_id, id)?;
        let date = expense.date.unwrap_or(existing.date);
        let derived = self.derive(user_id, expense, date, Some(id)).await?;

        if !self.db.update_expense(user_id, id, expense, date, &derived)? {
            return Err(Error::NotFound(format!("Expense {} not found", id)));
        }
        self.get_expense(user_id, id)
    }

    pub fn delete_expense(&self, user_id: i64, id: i64) -> Result<()> {
        if !self.db.delete_expense(user_id, id)? {
            return Err(Error::NotFound(format!("Expense {} not found", id)));
        }
        Ok(())
    }

    /// Run the classifier without persisting anything
    pub async fn suggest_category(
        &self,
        user_id: i64,
        draft: &NewExpense,
    ) -> Result<Option<ClassificationSuggestion>> {
        if let Some(category_id) = draft.category_id {
            self.validate_category(user_id, category_id)?;
        }
        self.classifier.classify(&self.db, user_id, draft).await
    }

    /// Category, confidence, rationale and recurring flag for an expense
    async fn derive(
        &self,
        user_id: i64,
        expense: &NewExpense,
        date: NaiveDate,
        existing_id: Option<i64>,
    ) -> Result<DerivedFields> {
        let mut derived = DerivedFields::default();

        match expense.category_id {
            Some(category_id) => {
                self.validate_category(user_id, category_id)?;
                derived.category_id = Some(category_id);
            }
            None => {
                if let Some(suggestion) = self.classifier.classify(&self.db, user_id, expense).await? {
                    derived.category_id = suggestion.category_id;
                    derived.confidence_score = Some(suggestion.confidence);
                    derived.classification_reason = Some(suggestion.reason);
                }
            }
        }

        let mut candidate = RecurrenceCandidate::new(&expense.merchant, expense.amount, date);
        if let Some(id) = existing_id {
            candidate = candidate.excluding(id);
        }
        derived.is_recurring = self.recurrence.detect(&self.db, user_id, &candidate)?;

        Ok(derived)
    }
}

pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AIClient, ExternalClassification, MockBackend};
    use crate::classify::{ClassifierConfig, MANUAL_SELECTION_REASON, NO_CATEGORIES_REASON};
    use crate::models::NewCategory;

    fn service() -> (ExpenseService, i64) {
        service_with(None)
    }

    fn service_with(external: Option<AIClient>) -> (ExpenseService, i64) {
        let db = Database::in_memory().unwrap();
        let user = db.create_user("a@example.com", "hash").unwrap();
        let classifier = Arc::new(Classifier::new(external, ClassifierConfig::default()));
        (ExpenseService::new(db, classifier), user)
    }

    fn add_category(service: &ExpenseService, user: i64, name: &str) -> i64 {
        service
            .create_category(
                user,
                &NewCategory {
                    name: name.into(),
                    color: None,
                    icon: None,
                },
            )
            .unwrap()
            .id
    }

    fn draft(merchant: &str, amount: f64, on: &str) -> NewExpense {
        NewExpense {
            amount,
            merchant: merchant.into(),
            date: Some(NaiveDate::parse_from_str(on, "%Y-%m-%d").unwrap()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_classifies_missing_category() {
        let (service, user) = service();
        add_category(&service, user, "Food");
        let travel = add_category(&service, user, "Travel");

        let expense = service
            .create_expense(user, &draft("Ola Cabs", 320.0, "2025-11-02"))
            .await
            .unwrap();
        assert_eq!(expense.category_id, Some(travel));
        assert_eq!(expense.confidence_score, Some(0.55));
        assert!(expense.classification_reason.is_some());
        assert!(!expense.is_recurring);
    }

    #[tokio::test]
    async fn test_create_with_own_category_skips_classifier() {
        let (service, user) = service();
        let food = add_category(&service, user, "Food");

        let mut new = draft("Ola Cabs", 320.0, "2025-11-02");
        new.category_id = Some(food);
        let expense = service.create_expense(user, &new).await.unwrap();
        assert_eq!(expense.category_id, Some(food));
        assert_eq!(expense.confidence_score, None);
        assert!(service.classifier().cache().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_foreign_category() {
        let (service, user) = service();
        let other = service.db().create_user("b@example.com", "hash").unwrap();
        let theirs = add_category(&service, other, "Food");

        let mut new = draft("Cafe", 80.0, "2025-11-02");
        new.category_id = Some(theirs);
        let err = service.create_expense(user, &new).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(service.list_expenses(user).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_without_categories_stores_sentinel() {
        let (service, user) = service();
        let expense = service
            .create_expense(user, &draft("Zomato", 450.0, "2025-11-02"))
            .await
            .unwrap();
        assert_eq!(expense.category_id, None);
        assert_eq!(expense.confidence_score, Some(0.0));
        assert_eq!(
            expense.classification_reason.as_deref(),
            Some(NO_CATEGORIES_REASON)
        );
    }

    #[tokio::test]
    async fn test_create_defaults_date_to_today() {
        let (service, user) = service();
        let new = NewExpense {
            amount: 10.0,
            merchant: "Chai".into(),
            ..Default::default()
        };
        let expense = service.create_expense(user, &new).await.unwrap();
        assert_eq!(expense.date, today());
    }

    #[tokio::test]
    async fn test_create_rejects_negative_amount() {
        let (service, user) = service();
        let err = service
            .create_expense(user, &draft("Cafe", -1.0, "2025-11-02"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_bulk_create_detects_recurrence_in_order() {
        let (service, user) = service();
        add_category(&service, user, "Entertainment");

        let created = service
            .bulk_create_expenses(
                user,
                &[
                    draft("Netflix", 199.0, "2025-09-12"),
                    draft("Netflix", 200.0, "2025-10-11"),
                    draft("Netflix", 199.0, "2025-11-10"),
                ],
            )
            .await
            .unwrap();

        let flags: Vec<_> = created.iter().map(|e| e.is_recurring).collect();
        assert_eq!(flags, vec![false, false, true]);
    }

    #[tokio::test]
    async fn test_update_keeps_date_and_excludes_itself() {
        let (service, user) = service();
        service
            .create_expense(user, &draft("Spotify", 119.0, "2025-10-05"))
            .await
            .unwrap();
        let expense = service
            .create_expense(user, &draft("Spotify", 119.0, "2025-11-05"))
            .await
            .unwrap();
        assert!(!expense.is_recurring);

        let mut change = draft("Spotify", 119.0, "2025-11-05");
        change.date = None;
        change.description = Some("Family plan".into());
        let updated = service
            .update_expense(user, expense.id, &change)
            .await
            .unwrap();
        assert_eq!(updated.date, expense.date);
        assert_eq!(updated.description.as_deref(), Some("Family plan"));
        // Only one other charge exists; the expense must not count itself
        assert!(!updated.is_recurring);
    }

    #[tokio::test]
    async fn test_update_and_delete_not_found() {
        let (service, user) = service();
        let other = service.db().create_user("b@example.com", "hash").unwrap();
        let expense = service
            .create_expense(user, &draft("Cafe", 80.0, "2025-11-02"))
            .await
            .unwrap();

        let err = service
            .update_expense(other, expense.id, &draft("Cafe", 1.0, "2025-11-02"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(matches!(
            service.delete_expense(other, expense.id),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            service.get_expense(other, expense.id),
            Err(Error::NotFound(_))
        ));

        service.delete_expense(user, expense.id).unwrap();
        assert!(service.list_expenses(user).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_external_failure_without_fallback() {
        let db = Database::in_memory().unwrap();
        let user = db.create_user("a@example.com", "hash").unwrap();
        let config = ClassifierConfig {
            heuristic_fallback: false,
            ..Default::default()
        };
        let classifier = Arc::new(Classifier::new(
            Some(AIClient::Mock(MockBackend::failing())),
            config,
        ));
        let service = ExpenseService::new(db, classifier);
        add_category(&service, user, "Food");

        let expense = service
            .create_expense(user, &draft("Swiggy", 300.0, "2025-11-02"))
            .await
            .unwrap();
        assert_eq!(expense.category_id, None);
        assert_eq!(
            expense.classification_reason.as_deref(),
            Some(MANUAL_SELECTION_REASON)
        );
    }

    #[tokio::test]
    async fn test_suggest_does_not_persist() {
        let (service, user) = service_with(Some(AIClient::Mock(MockBackend::with_response(
            ExternalClassification::new("food", 0.8, "Restaurant"),
        ))));
        let food = add_category(&service, user, "Food");

        let suggestion = service
            .suggest_category(user, &draft("Barbeque Nation", 1500.0, "2025-11-02"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(suggestion.category_id, Some(food));
        assert!(service.list_expenses(user).unwrap().is_empty());
    }
}
