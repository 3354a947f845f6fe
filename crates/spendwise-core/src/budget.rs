//! Budget alert engine and budget management

use tracing::debug;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::expenses::ExpenseService;
use crate::models::{Budget, BudgetAlert, BudgetStatus, Expense, NewBudget, Period};

/// Percentage of the limit already spent; 0 when the limit is 0
pub fn percent_used(spent: f64, limit: f64) -> f64 {
    if limit == 0.0 {
        0.0
    } else {
        spent * 100.0 / limit
    }
}

/// Compute one alert per budget in `period`
///
/// Only expenses owned by the budget's user, in its category and dated within
/// the period count toward it. Budgets for other periods are skipped.
pub fn compute_alerts(budgets: &[Budget], expenses: &[Expense], period: Period) -> Vec<BudgetAlert> {
    let (first, last) = (period.first_day(), period.last_day());

    budgets
        .iter()
        .filter(|b| b.month_year == period)
        .map(|budget| {
            let spent: f64 = expenses
                .iter()
                .filter(|e| e.user_id == budget.user_id)
                .filter(|e| e.category_id == Some(budget.category_id))
                .filter(|e| e.date >= first && e.date <= last)
                .map(|e| e.amount)
                .sum();
            let percent = percent_used(spent, budget.monthly_limit);

            BudgetAlert {
                category_id: budget.category_id,
                month_year: period,
                spent,
                limit: budget.monthly_limit,
                percent_used: percent,
                status: BudgetStatus::from_percent(percent),
            }
        })
        .collect()
}

/// Alerts for a user's budgets in the given period (current month when absent)
pub fn budget_alerts(db: &Database, user_id: i64, month: Option<&str>) -> Result<Vec<BudgetAlert>> {
    let period = Period::resolve(month)?;
    let budgets = db.list_budgets_for_period(user_id, period)?;
    if budgets.is_empty() {
        return Ok(Vec::new());
    }

    let expenses = db.list_expenses_in_range(user_id, period.first_day(), period.last_day())?;
    debug!(
        user_id,
        period = %period,
        budgets = budgets.len(),
        expenses = expenses.len(),
        "Computing budget alerts"
    );
    Ok(compute_alerts(&budgets, &expenses, period))
}

impl ExpenseService {
    pub fn list_budgets(&self, user_id: i64) -> Result<Vec<Budget>> {
        self.db().list_budgets(user_id)
    }

    pub fn get_budget(&self, user_id: i64, id: i64) -> Result<Budget> {
        self.db()
            .get_budget(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Budget {} not found", id)))
    }

    /// Create a budget for one of the user's categories
    pub fn create_budget(&self, user_id: i64, budget: &NewBudget) -> Result<Budget> {
        let period = budget.validate()?;
        self.validate_category(user_id, budget.category_id)?;
        let id = self
            .db()
            .create_budget(user_id, budget.category_id, period, budget.monthly_limit)?;
        self.get_budget(user_id, id)
    }

    pub fn update_budget(&self, user_id: i64, id: i64, budget: &NewBudget) -> Result<Budget> {
        let period = budget.validate()?;
        self.get_budget(user_id, id)?;
        self.validate_category(user_id, budget.category_id)?;
        self.db()
            .update_budget(user_id, id, budget.category_id, period, budget.monthly_limit)?;
        self.get_budget(user_id, id)
    }

    pub fn delete_budget(&self, user_id: i64, id: i64) -> Result<()> {
        if !self.db().delete_budget(user_id, id)? {
            return Err(Error::NotFound(format!("Budget {} not found", id)));
        }
        Ok(())
    }

    /// Budget alerts for a period token, defaulting to the current month
    pub fn budget_alerts(&self, user_id: i64, month: Option<&str>) -> Result<Vec<BudgetAlert>> {
        budget_alerts(self.db(), user_id, month)
    }
}
