//! Budget operations

use rusqlite::{params, OptionalExtension, Row};

use super::Database;
use crate::error::{Error, Result};
use crate::models::{Budget, Period};

const BUDGET_COLUMNS: &str = "id, user_id, category_id, month_year, monthly_limit";

fn row_to_budget(row: &Row) -> rusqlite::Result<Budget> {
    let month_year: String = row.get(3)?;
    let month_year: Period = month_year.parse().map_err(|e: Error| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Budget {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category_id: row.get(2)?,
        month_year,
        monthly_limit: row.get(4)?,
    })
}

impl Database {
    /// Create a budget (category ownership is checked by the caller)
    pub fn create_budget(
        &self,
        user_id: i64,
        category_id: i64,
        month_year: Period,
        monthly_limit: f64,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO budgets (user_id, category_id, month_year, monthly_limit) VALUES (?, ?, ?, ?)",
            params![user_id, category_id, month_year.to_string(), monthly_limit],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List a user's budgets, newest period first
    pub fn list_budgets(&self, user_id: i64) -> Result<Vec<Budget>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM budgets WHERE user_id = ? ORDER BY month_year DESC, id",
            BUDGET_COLUMNS
        ))?;
        let budgets = stmt
            .query_map(params![user_id], row_to_budget)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(budgets)
    }

    /// A user's budgets for one period, in creation order
    pub fn list_budgets_for_period(&self, user_id: i64, month_year: Period) -> Result<Vec<Budget>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM budgets WHERE user_id = ? AND month_year = ? ORDER BY id",
            BUDGET_COLUMNS
        ))?;
        let budgets = stmt
            .query_map(params![user_id, month_year.to_string()], row_to_budget)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(budgets)
    }

    /// Get a budget by ID, only if owned by the user
    pub fn get_budget(&self, user_id: i64, id: i64) -> Result<Option<Budget>> {
        let conn = self.conn()?;
        let budget = conn
            .query_row(
                &format!(
                    "SELECT {} FROM budgets WHERE id = ? AND user_id = ?",
                    BUDGET_COLUMNS
                ),
                params![id, user_id],
                row_to_budget,
            )
            .optional()?;
        Ok(budget)
    }

    /// Replace a budget; returns false if not found for this user
    pub fn update_budget(
        &self,
        user_id: i64,
        id: i64,
        category_id: i64,
        month_year: Period,
        monthly_limit: f64,
    ) -> Result<bool> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE budgets SET category_id = ?, month_year = ?, monthly_limit = ? \
             WHERE id = ? AND user_id = ?",
            params![category_id, month_year.to_string(), monthly_limit, id, user_id],
        )?;
        Ok(updated > 0)
    }

    /// Delete a budget; returns false if not found for this user
    pub fn delete_budget(&self, user_id: i64, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM budgets WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        Ok(deleted > 0)
    }
}
