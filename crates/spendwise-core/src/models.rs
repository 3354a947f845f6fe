//! Domain models for Spendwise

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    /// Argon2 PHC string, never sent over the wire
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A user-defined spending category (Food, Travel, Shopping, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    /// UI color hex
    pub color: Option<String>,
    /// Icon name
    pub icon: Option<String>,
}

/// For creating or replacing a category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl NewCategory {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("Category name cannot be empty".into()));
        }
        Ok(())
    }
}

/// A single expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub merchant: String,
    pub description: Option<String>,
    /// User-chosen or classifier-suggested; `None` until classified
    pub category_id: Option<i64>,
    pub date: NaiveDate,
    /// UPI, Card, Cash, Wallet, ...
    pub payment_method: Option<String>,
    pub is_recurring: bool,
    /// Classifier confidence (0.0 - 1.0)
    pub confidence_score: Option<f64>,
    /// Short rationale from the classifier
    pub classification_reason: Option<String>,
}

/// For creating or replacing an expense
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewExpense {
    pub amount: f64,
    #[serde(default)]
    pub merchant: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    /// Defaults to today on create, to the stored date on update
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

impl NewExpense {
    pub fn validate(&self) -> Result<()> {
        validate_amount(self.amount, "Expense amount")
    }
}

/// Fields the classification and recurrence steps derive for an expense
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedFields {
    pub category_id: Option<i64>,
    pub is_recurring: bool,
    pub confidence_score: Option<f64>,
    pub classification_reason: Option<String>,
}

/// A monthly spending limit for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub month_year: Period,
    pub monthly_limit: f64,
}

/// For creating or replacing a budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBudget {
    pub category_id: i64,
    /// Period token, e.g. "2025-11"
    pub month_year: String,
    pub monthly_limit: f64,
}

impl NewBudget {
    /// Validate the limit and parse the period token
    pub fn validate(&self) -> Result<Period> {
        validate_amount(self.monthly_limit, "Monthly limit")?;
        self.month_year.parse()
    }
}

fn validate_amount(value: f64, what: &str) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::Validation(format!(
            "{} must be a non-negative number",
            what
        )));
    }
    Ok(())
}

/// How a classification suggestion was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSource {
    /// External language-model classifier
    External,
    /// Keyword heuristic table
    Keyword,
    /// No usable signal; the user has to pick a category
    Uncategorized,
}

impl SuggestionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::External => "external",
            Self::Keyword => "keyword",
            Self::Uncategorized => "uncategorized",
        }
    }
}

impl std::fmt::Display for SuggestionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A proposed category for an expense (never persisted on its own)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationSuggestion {
    /// `None` means "Uncategorized"
    pub category_id: Option<i64>,
    pub category_name: String,
    pub confidence: f64,
    pub reason: String,
    pub source: SuggestionSource,
}

impl ClassificationSuggestion {
    pub const UNCATEGORIZED: &'static str = "Uncategorized";

    /// Suggestion pointing at one of the user's categories
    pub fn for_category(
        category: &Category,
        confidence: f64,
        reason: impl Into<String>,
        source: SuggestionSource,
    ) -> Self {
        Self {
            category_id: Some(category.id),
            category_name: category.name.clone(),
            confidence,
            reason: reason.into(),
            source,
        }
    }

    /// The "Uncategorized" sentinel
    pub fn uncategorized(reason: impl Into<String>) -> Self {
        Self {
            category_id: None,
            category_name: Self::UNCATEGORIZED.to_string(),
            confidence: 0.0,
            reason: reason.into(),
            source: SuggestionSource::Uncategorized,
        }
    }
}

/// A year-month period token such as "2025-11"
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(Error::Validation(format!(
                "Invalid period: {}-{:02}",
                year, month
            )));
        }
        Ok(Self { year, month })
    }

    /// Period containing the given date
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The current calendar month (local time)
    pub fn current() -> Self {
        Self::containing(chrono::Local::now().date_naive())
    }

    /// Parse an optional token, defaulting to the current month when absent or blank
    pub fn resolve(token: Option<&str>) -> Result<Self> {
        match token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => t.parse(),
            None => Ok(Self::current()),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // Both fields were validated on construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first_day()
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first_day() && date <= self.last_day()
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl std::str::FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Validation(format!("Invalid period '{}', expected YYYY-MM", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let digits = |part: &str, len: usize| {
            part.len() == len && part.bytes().all(|b| b.is_ascii_digit())
        };
        if !digits(year, 4) || !digits(month, 2) {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl TryFrom<String> for Period {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

/// Budget utilization severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    /// Under 70% used
    Green,
    /// 70% up to (not including) 90%
    Yellow,
    /// 90% and above
    Red,
}

impl BudgetStatus {
    pub const YELLOW_THRESHOLD: f64 = 70.0;
    pub const RED_THRESHOLD: f64 = 90.0;

    pub fn from_percent(percent: f64) -> Self {
        if percent < Self::YELLOW_THRESHOLD {
            Self::Green
        } else if percent < Self::RED_THRESHOLD {
            Self::Yellow
        } else {
            Self::Red
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Utilization of one budget over its period (computed per request)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetAlert {
    pub category_id: i64,
    pub month_year: Period,
    pub spent: f64,
    pub limit: f64,
    pub percent_used: f64,
    pub status: BudgetStatus,
}

/// Spending so far this month compared with last month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub month_year: Period,
    pub total_spent: f64,
    /// Keyed by category id, "uncategorized" for expenses without one
    pub category_totals: BTreeMap<String, f64>,
    pub last_month_total: f64,
}

/// Total spent in one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category_id: Option<i64>,
    pub total: f64,
}

/// Total spent in one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub month_year: Period,
    pub total: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_parse_and_display() {
        let period: Period = "2025-11".parse().unwrap();
        assert_eq!(period.year(), 2025);
        assert_eq!(period.month(), 11);
        assert_eq!(period.to_string(), "2025-11");
    }

    #[test]
    fn test_period_rejects_bad_tokens() {
        for token in [
            "2025-13", "2025-00", "25-11", "2025/11", "2025-1", "november", "", "+202-11",
            "2025-+1", " 202-11", "-202-11",
        ] {
            assert!(token.parse::<Period>().is_err(), "{} should be rejected", token);
        }
    }

    #[test]
    fn test_period_bounds() {
        let feb_leap: Period = "2024-02".parse().unwrap();
        assert_eq!(feb_leap.first_day(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(feb_leap.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let dec: Period = "2025-12".parse().unwrap();
        assert_eq!(dec.last_day(), NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        assert!(dec.contains(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()));
        assert!(!dec.contains(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()));
    }

    #[test]
    fn test_period_previous_wraps_year() {
        let jan: Period = "2026-01".parse().unwrap();
        assert_eq!(jan.previous().to_string(), "2025-12");
    }

    #[test]
    fn test_period_resolve_defaults_to_current() {
        assert_eq!(Period::resolve(None).unwrap(), Period::current());
        assert_eq!(Period::resolve(Some("  ")).unwrap(), Period::current());
        assert_eq!(
            Period::resolve(Some("2025-11")).unwrap().to_string(),
            "2025-11"
        );
    }

    #[test]
    fn test_period_serde_as_string() {
        let period: Period = "2025-11".parse().unwrap();
        assert_eq!(serde_json::to_string(&period).unwrap(), "\"2025-11\"");
        let back: Period = serde_json::from_str("\"2025-11\"").unwrap();
        assert_eq!(back, period);
        assert!(serde_json::from_str::<Period>("\"2025-99\"").is_err());
    }

    #[test]
    fn test_budget_status_bands() {
        assert_eq!(BudgetStatus::from_percent(0.0), BudgetStatus::Green);
        assert_eq!(BudgetStatus::from_percent(69.99), BudgetStatus::Green);
        assert_eq!(BudgetStatus::from_percent(70.0), BudgetStatus::Yellow);
        assert_eq!(BudgetStatus::from_percent(89.99), BudgetStatus::Yellow);
        assert_eq!(BudgetStatus::from_percent(90.0), BudgetStatus::Red);
        assert_eq!(BudgetStatus::from_percent(250.0), BudgetStatus::Red);
    }

    #[test]
    fn test_new_expense_validation() {
        let mut expense = NewExpense {
            amount: 12.5,
            merchant: "Cafe".into(),
            ..Default::default()
        };
        assert!(expense.validate().is_ok());

        expense.amount = -1.0;
        assert!(matches!(expense.validate(), Err(Error::Validation(_))));

        expense.amount = f64::NAN;
        assert!(expense.validate().is_err());
    }

    #[test]
    fn test_new_budget_validation() {
        let budget = NewBudget {
            category_id: 1,
            month_year: "2025-11".into(),
            monthly_limit: 0.0,
        };
        assert_eq!(budget.validate().unwrap().to_string(), "2025-11");

        let bad_period = NewBudget {
            month_year: "Nov 2025".into(),
            ..budget.clone()
        };
        assert!(matches!(bad_period.validate(), Err(Error::Validation(_))));

        let bad_limit = NewBudget {
            monthly_limit: -5.0,
            ..budget
        };
        assert!(bad_limit.validate().is_err());
    }

    #[test]
    fn test_user_password_hash_not_serialized() {
        let user = User {
            id: 1,
            email: "a@b.c".into(),
            password_hash: "secret".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
