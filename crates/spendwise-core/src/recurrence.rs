//! Recurring charge detection
//!
//! An expense is recurring when at least two earlier charges at the same
//! merchant fall within the trailing 90 days and each is within 10% of its amount.

use chrono::NaiveDate;

use crate::db::Database;
use crate::error::Result;
use crate::models::Expense;

/// The facts about an expense the detector looks at
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RecurrenceCandidate<'a> {
    pub merchant: Option<&'a str>,
    pub amount: Option<f64>,
    pub date: Option<NaiveDate>,
    /// Excluded from history (the expense itself, on update)
    pub expense_id: Option<i64>,
}

impl<'a> RecurrenceCandidate<'a> {
    pub fn new(merchant: &'a str, amount: f64, date: NaiveDate) -> Self {
        Self {
            merchant: Some(merchant),
            amount: Some(amount),
            date: Some(date),
            expense_id: None,
        }
    }

    pub fn excluding(mut self, expense_id: i64) -> Self {
        self.expense_id = Some(expense_id);
        self
    }
}

/// Recurrence detector
#[derive(Debug, Clone, Copy, Default)]
pub struct RecurrenceDetector;

impl RecurrenceDetector {
    /// How far back similar charges are looked for
    pub const WINDOW_DAYS: i64 = 90;
    /// Allowed amount deviation as a fraction of the candidate amount
    pub const AMOUNT_TOLERANCE: f64 = 0.10;
    /// Similar charges needed to call it recurring
    pub const MIN_MATCHES: usize = 2;

    /// Decide over an in-memory history
    ///
    /// History may contain other merchants; they are filtered out here.
    pub fn is_recurring(&self, candidate: &RecurrenceCandidate<'_>, history: &[Expense]) -> bool {
        let (Some(merchant), Some(amount), Some(date)) =
            (candidate.merchant, candidate.amount, candidate.date)
        else {
            return false;
        };
        let merchant = merchant.trim().to_lowercase();
        if merchant.is_empty() || !amount.is_finite() {
            return false;
        }

        let tolerance = amount.abs() * Self::AMOUNT_TOLERANCE;
        let matches = history
            .iter()
            .filter(|e| Some(e.id) != candidate.expense_id)
            .filter(|e| e.merchant.trim().to_lowercase() == merchant)
            .filter(|e| {
                let age = (date - e.date).num_days();
                (0..=Self::WINDOW_DAYS).contains(&age)
            })
            .filter(|e| (e.amount - amount).abs() <= tolerance)
            .count();

        matches >= Self::MIN_MATCHES
    }

    /// Decide against the user's stored history at the same merchant
    pub fn detect(
        &self,
        db: &Database,
        user_id: i64,
        candidate: &RecurrenceCandidate<'_>,
    ) -> Result<bool> {
        let Some(merchant) = candidate.merchant.filter(|m| !m.trim().is_empty()) else {
            return Ok(false);
        };
        let history = db.list_expenses_by_merchant(user_id, merchant)?;
        Ok(self.is_recurring(candidate, &history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn charge(id: i64, merchant: &str, amount: f64, on: &str) -> Expense {
        Expense {
            id,
            user_id: 1,
            amount,
            merchant: merchant.to_string(),
            description: None,
            category_id: None,
            date: date(on),
            payment_method: None,
            is_recurring: false,
            confidence_score: None,
            classification_reason: None,
        }
    }

    fn netflix_history() -> Vec<Expense> {
        vec![
            charge(1, "Netflix", 199.0, "2025-09-12"),
            charge(2, "Netflix", 200.0, "2025-10-11"),
        ]
    }

    #[test]
    fn test_monthly_subscription_is_recurring() {
        let candidate = RecurrenceCandidate::new("Netflix", 199.0, date("2025-11-10"));
        assert!(RecurrenceDetector.is_recurring(&candidate, &netflix_history()));
    }

    #[test]
    fn test_stale_history_is_not_recurring() {
        let candidate = RecurrenceCandidate::new("Netflix", 199.0, date("2026-06-01"));
        assert!(!RecurrenceDetector.is_recurring(&candidate, &netflix_history()));
    }

    #[test]
    fn test_missing_fields_are_not_recurring() {
        let history = netflix_history();
        let full = RecurrenceCandidate::new("Netflix", 199.0, date("2025-11-10"));

        for candidate in [
            RecurrenceCandidate {
                merchant: None,
                ..full
            },
            RecurrenceCandidate {
                merchant: Some("  "),
                ..full
            },
            RecurrenceCandidate {
                amount: None,
                ..full
            },
            RecurrenceCandidate { date: None, ..full },
        ] {
            assert!(!RecurrenceDetector.is_recurring(&candidate, &history));
        }
    }

    #[test]
    fn test_merchant_match_is_case_insensitive() {
        let candidate = RecurrenceCandidate::new(" NETFLIX ", 199.0, date("2025-11-10"));
        assert!(RecurrenceDetector.is_recurring(&candidate, &netflix_history()));

        let other = RecurrenceCandidate::new("Netflix India", 199.0, date("2025-11-10"));
        assert!(!RecurrenceDetector.is_recurring(&other, &netflix_history()));
    }

    #[test]
    fn test_amount_tolerance_boundary() {
        let history = vec![
            charge(1, "Gym", 110.0, "2025-10-01"),
            charge(2, "Gym", 90.0, "2025-11-01"),
        ];
        // Both exactly 10% away from 100
        let candidate = RecurrenceCandidate::new("Gym", 100.0, date("2025-11-20"));
        assert!(RecurrenceDetector.is_recurring(&candidate, &history));

        let history = vec![
            charge(1, "Gym", 111.0, "2025-10-01"),
            charge(2, "Gym", 90.0, "2025-11-01"),
        ];
        assert!(!RecurrenceDetector.is_recurring(&candidate, &history));
    }

    #[test]
    fn test_window_boundary_and_future_charges() {
        let candidate = RecurrenceCandidate::new("Rent", 1000.0, date("2025-12-31"));
        let on_edge = vec![
            charge(1, "Rent", 1000.0, "2025-10-02"), // 90 days back
            charge(2, "Rent", 1000.0, "2025-12-31"), // same day
        ];
        assert!(RecurrenceDetector.is_recurring(&candidate, &on_edge));

        let outside = vec![
            charge(1, "Rent", 1000.0, "2025-10-01"), // 91 days back
            charge(2, "Rent", 1000.0, "2026-01-15"), // after the candidate
            charge(3, "Rent", 1000.0, "2025-12-01"),
        ];
        assert!(!RecurrenceDetector.is_recurring(&candidate, &outside));
    }

    #[test]
    fn test_candidate_excluded_from_its_own_history() {
        let mut history = netflix_history();
        history.truncate(1);
        history.push(charge(9, "Netflix", 199.0, "2025-11-10"));

        let candidate = RecurrenceCandidate::new("Netflix", 199.0, date("2025-11-10"));
        assert!(RecurrenceDetector.is_recurring(&candidate, &history));
        assert!(!RecurrenceDetector.is_recurring(&candidate.excluding(9), &history));
    }

    #[test]
    fn test_detect_reads_store() {
        use crate::models::{DerivedFields, NewExpense};

        let db = Database::in_memory().unwrap();
        let user = db.create_user("a@example.com", "hash").unwrap();
        for (amount, on) in [(199.0, "2025-09-12"), (200.0, "2025-10-11")] {
            let expense = NewExpense {
                amount,
                merchant: "Netflix".into(),
                ..Default::default()
            };
            db.create_expense(user, &expense, date(on), &DerivedFields::default())
                .unwrap();
        }

        let candidate = RecurrenceCandidate::new("netflix", 199.0, date("2025-11-10"));
        assert!(RecurrenceDetector.detect(&db, user, &candidate).unwrap());

        let other_user = db.create_user("b@example.com", "hash").unwrap();
        assert!(!RecurrenceDetector.detect(&db, other_user, &candidate).unwrap());
    }

    #[test]
    fn test_detect_matches_non_ascii_merchant_case() {
        use crate::models::{DerivedFields, NewExpense};

        let db = Database::in_memory().unwrap();
        let user = db.create_user("a@example.com", "hash").unwrap();
        for (amount, on) in [(199.0, "2025-09-12"), (200.0, "2025-10-11")] {
            let expense = NewExpense {
                amount,
                merchant: "CAFÉ NOIR".into(),
                ..Default::default()
            };
            db.create_expense(user, &expense, date(on), &DerivedFields::default())
                .unwrap();
        }

        let candidate = RecurrenceCandidate::new("café noir", 199.0, date("2025-11-10"));
        assert!(RecurrenceDetector.detect(&db, user, &candidate).unwrap());
    }
}
