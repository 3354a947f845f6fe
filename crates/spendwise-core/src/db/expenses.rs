//! Expense operations

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{format_date, parse_date, Database};
use crate::classify::normalize_merchant;
use crate::error::Result;
use crate::models::{DerivedFields, Expense, NewExpense};

const EXPENSE_COLUMNS: &str = "id, user_id, amount, merchant, description, category_id, date, \
     payment_method, is_recurring, confidence_score, classification_reason";

/// Lookup key for a merchant; SQLite's NOCASE only folds ASCII
fn merchant_key(merchant: &str) -> String {
    normalize_merchant(merchant).unwrap_or_default()
}

fn row_to_expense(row: &Row) -> rusqlite::Result<Expense> {
    let date: String = row.get(6)?;
    Ok(Expense {
        id: row.get(0)?,
        user_id: row.get(1)?,
        amount: row.get(2)?,
        merchant: row.get(3)?,
        description: row.get(4)?,
        category_id: row.get(5)?,
        date: parse_date(&date)?,
        payment_method: row.get(7)?,
        is_recurring: row.get(8)?,
        confidence_score: row.get(9)?,
        classification_reason: row.get(10)?,
    })
}

impl Database {
    /// Insert an expense together with its derived classification fields
    pub fn create_expense(
        &self,
        user_id: i64,
        expense: &NewExpense,
        date: NaiveDate,
        derived: &DerivedFields,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO expenses (user_id, amount, merchant, merchant_key, description, category_id,
                                  date, payment_method, is_recurring, confidence_score,
                                  classification_reason)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                expense.amount,
                expense.merchant.trim(),
                merchant_key(&expense.merchant),
                expense.description,
                derived.category_id,
                format_date(date),
                expense.payment_method,
                derived.is_recurring,
                derived.confidence_score,
                derived.classification_reason,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Replace an expense; returns false if not found for this user
    pub fn update_expense(
        &self,
        user_id: i64,
        id: i64,
        expense: &NewExpense,
        date: NaiveDate,
        derived: &DerivedFields,
    ) -> Result<bool> {
        let conn = self.conn()?;
        let updated = conn.execute(
            r#"
            UPDATE expenses
            SET amount = ?, merchant = ?, merchant_key = ?, description = ?, category_id = ?,
                date = ?, payment_method = ?, is_recurring = ?, confidence_score = ?,
                classification_reason = ?
            WHERE id = ? AND user_id = ?
            "#,
            params![
                expense.amount,
                expense.merchant.trim(),
                merchant_key(&expense.merchant),
                expense.description,
                derived.category_id,
                format_date(date),
                expense.payment_method,
                derived.is_recurring,
                derived.confidence_score,
                derived.classification_reason,
                id,
                user_id,
            ],
        )?;
        Ok(updated > 0)
    }

    /// Get an expense by ID, only if owned by the user
    pub fn get_expense(&self, user_id: i64, id: i64) -> Result<Option<Expense>> {
        let conn = self.conn()?;
        let expense = conn
            .query_row(
                &format!(
                    "SELECT {} FROM expenses WHERE id = ? AND user_id = ?",
                    EXPENSE_COLUMNS
                ),
                params![id, user_id],
                row_to_expense,
            )
            .optional()?;
        Ok(expense)
    }

    /// List a user's expenses, newest first
    pub fn list_expenses(&self, user_id: i64) -> Result<Vec<Expense>> {
        self.query_expenses(
            &format!(
                "SELECT {} FROM expenses WHERE user_id = ? ORDER BY date DESC, id DESC",
                EXPENSE_COLUMNS
            ),
            params![user_id],
        )
    }

    /// A user's expenses at one merchant (case-insensitive, trimmed), oldest first
    pub fn list_expenses_by_merchant(&self, user_id: i64, merchant: &str) -> Result<Vec<Expense>> {
        self.query_expenses(
            &format!(
                "SELECT {} FROM expenses WHERE user_id = ? AND merchant_key = ? ORDER BY date, id",
                EXPENSE_COLUMNS
            ),
            params![user_id, merchant_key(merchant)],
        )
    }

    /// A user's expenses dated within `from..=to`, oldest first
    pub fn list_expenses_in_range(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Expense>> {
        self.query_expenses(
            &format!(
                "SELECT {} FROM expenses WHERE user_id = ? AND date >= ? AND date <= ? \
                 ORDER BY date, id",
                EXPENSE_COLUMNS
            ),
            params![user_id, format_date(from), format_date(to)],
        )
    }

    /// Delete an expense; returns false if not found for this user
    pub fn delete_expense(&self, user_id: i64, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM expenses WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        Ok(deleted > 0)
    }

    fn query_expenses(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Expense>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let expenses = stmt
            .query_map(params, row_to_expense)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(expenses)
    }
}
