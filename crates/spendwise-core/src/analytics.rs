//! Spending analytics: monthly summary, category breakdown, 12-month trend

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::db::Database;
use crate::error::Result;
use crate::expenses::{today, ExpenseService};
use crate::models::{CategoryTotal, Expense, MonthlySummary, Period, TrendPoint};

/// Key used for expenses without a category in summary maps
pub const UNCATEGORIZED_KEY: &str = "uncategorized";

/// Number of months in the trend series
pub const TREND_MONTHS: usize = 12;

fn total(expenses: &[Expense]) -> f64 {
    expenses.iter().map(|e| e.amount).sum()
}

/// Per-category totals, largest first (ties by category id, uncategorized last)
pub fn totals_by_category(expenses: &[Expense]) -> Vec<CategoryTotal> {
    let mut sums: BTreeMap<Option<i64>, f64> = BTreeMap::new();
    for expense in expenses {
        *sums.entry(expense.category_id).or_default() += expense.amount;
    }

    let mut totals: Vec<CategoryTotal> = sums
        .into_iter()
        .map(|(category_id, total)| CategoryTotal { category_id, total })
        .collect();
    totals.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.category_id.is_none().cmp(&b.category_id.is_none()))
            .then_with(|| a.category_id.cmp(&b.category_id))
    });
    totals
}

/// Spending from the 1st of `today`'s month through `today`, against last month
pub fn monthly_summary(db: &Database, user_id: i64, today: NaiveDate) -> Result<MonthlySummary> {
    let period = Period::containing(today);
    let this_month = db.list_expenses_in_range(user_id, period.first_day(), today)?;

    let last = period.previous();
    let last_month = db.list_expenses_in_range(user_id, last.first_day(), last.last_day())?;

    let category_totals = totals_by_category(&this_month)
        .into_iter()
        .map(|t| {
            let key = t
                .category_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| UNCATEGORIZED_KEY.to_string());
            (key, t.total)
        })
        .collect();

    Ok(MonthlySummary {
        month_year: period,
        total_spent: total(&this_month),
        category_totals,
        last_month_total: total(&last_month),
    })
}

/// Totals per category over all of a user's expenses
pub fn category_breakdown(db: &Database, user_id: i64) -> Result<Vec<CategoryTotal>> {
    Ok(totals_by_category(&db.list_expenses(user_id)?))
}

/// Monthly totals for the twelve months ending with `today`'s month, oldest first
pub fn trends(db: &Database, user_id: i64, today: NaiveDate) -> Result<Vec<TrendPoint>> {
    let mut periods = Vec::with_capacity(TREND_MONTHS);
    let mut period = Period::containing(today);
    for _ in 0..TREND_MONTHS {
        periods.push(period);
        period = period.previous();
    }
    periods.reverse();

    let (Some(first), Some(last)) = (periods.first(), periods.last()) else {
        return Ok(Vec::new());
    };
    let expenses = db.list_expenses_in_range(user_id, first.first_day(), last.last_day())?;

    Ok(periods
        .into_iter()
        .map(|p| TrendPoint {
            month_year: p,
            total: expenses
                .iter()
                .filter(|e| p.contains(e.date))
                .map(|e| e.amount)
                .sum(),
        })
        .collect())
}

impl ExpenseService {
    pub fn monthly_summary(&self, user_id: i64) -> Result<MonthlySummary> {
        monthly_summary(self.db(), user_id, today())
    }

    pub fn category_breakdown(&self, user_id: i64) -> Result<Vec<CategoryTotal>> {
        category_breakdown(self.db(), user_id)
    }

    pub fn trends(&self, user_id: i64) -> Result<Vec<TrendPoint>> {
        trends(self.db(), user_id, today())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DerivedFields, NewExpense};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn seed(db: &Database, user: i64, rows: &[(Option<i64>, f64, &str)]) {
        for (category_id, amount, on) in rows {
            let expense = NewExpense {
                amount: *amount,
                merchant: "Shop".into(),
                ..Default::default()
            };
            let derived = DerivedFields {
                category_id: *category_id,
                ..Default::default()
            };
            db.create_expense(user, &expense, date(on), &derived).unwrap();
        }
    }

    fn setup() -> (Database, i64, i64) {
        let db = Database::in_memory().unwrap();
        let user = db.create_user("a@example.com", "hash").unwrap();
        let food = db
            .create_category(
                user,
                &crate::models::NewCategory {
                    name: "Food".into(),
                    color: None,
                    icon: None,
                },
            )
            .unwrap();
        (db, user, food)
    }

    #[test]
    fn test_monthly_summary() {
        let (db, user, food) = setup();
        seed(
            &db,
            user,
            &[
                (Some(food), 100.0, "2025-11-01"),
                (Some(food), 50.0, "2025-11-14"),
                (None, 25.0, "2025-11-10"),
                (Some(food), 999.0, "2025-11-20"), // after "today"
                (Some(food), 300.0, "2025-10-31"),
                (None, 200.0, "2025-10-01"),
            ],
        );

        let summary = monthly_summary(&db, user, date("2025-11-15")).unwrap();
        assert_eq!(summary.month_year.to_string(), "2025-11");
        assert_eq!(summary.total_spent, 175.0);
        assert_eq!(summary.last_month_total, 500.0);
        assert_eq!(summary.category_totals.get(&food.to_string()), Some(&150.0));
        assert_eq!(summary.category_totals.get(UNCATEGORIZED_KEY), Some(&25.0));
    }

    #[test]
    fn test_monthly_summary_in_january_looks_at_december() {
        let (db, user, _) = setup();
        seed(&db, user, &[(None, 40.0, "2025-12-24")]);
        let summary = monthly_summary(&db, user, date("2026-01-03")).unwrap();
        assert_eq!(summary.total_spent, 0.0);
        assert_eq!(summary.last_month_total, 40.0);
    }

    #[test]
    fn test_category_breakdown_sorted() {
        let (db, user, food) = setup();
        seed(
            &db,
            user,
            &[
                (Some(food), 10.0, "2024-01-01"),
                (None, 30.0, "2025-01-01"),
                (Some(food), 5.0, "2025-06-01"),
            ],
        );
        let breakdown = category_breakdown(&db, user).unwrap();
        assert_eq!(
            breakdown,
            vec![
                CategoryTotal {
                    category_id: None,
                    total: 30.0
                },
                CategoryTotal {
                    category_id: Some(food),
                    total: 15.0
                },
            ]
        );
    }

    #[test]
    fn test_trends_twelve_months_oldest_first() {
        let (db, user, _) = setup();
        seed(
            &db,
            user,
            &[
                (None, 10.0, "2024-12-31"), // outside the window
                (None, 20.0, "2025-01-15"),
                (None, 30.0, "2025-12-01"),
                (None, 5.0, "2025-12-31"),
            ],
        );

        let points = trends(&db, user, date("2025-12-10")).unwrap();
        assert_eq!(points.len(), TREND_MONTHS);
        assert_eq!(points[0].month_year.to_string(), "2025-01");
        assert_eq!(points[0].total, 20.0);
        assert_eq!(points[11].month_year.to_string(), "2025-12");
        assert_eq!(points[11].total, 35.0);
        assert!(points[1..11].iter().all(|p| p.total == 0.0));
    }
}
