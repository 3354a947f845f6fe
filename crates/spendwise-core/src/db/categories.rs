//! Category operations
//!
//! Every lookup is filtered by the owning user, so a category belonging to
//! someone else behaves exactly like a missing one.

use rusqlite::{params, OptionalExtension, Row};

use super::Database;
use crate::error::Result;
use crate::models::{Category, NewCategory};

const CATEGORY_COLUMNS: &str = "id, user_id, name, color, icon";

fn row_to_category(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        color: row.get(3)?,
        icon: row.get(4)?,
    })
}

impl Database {
    /// Create a category for a user
    pub fn create_category(&self, user_id: i64, category: &NewCategory) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO categories (user_id, name, color, icon) VALUES (?, ?, ?, ?)",
            params![
                user_id,
                category.name.trim(),
                category.color,
                category.icon
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List a user's categories in creation order
    pub fn list_categories(&self, user_id: i64) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM categories WHERE user_id = ? ORDER BY id",
            CATEGORY_COLUMNS
        ))?;
        let categories = stmt
            .query_map(params![user_id], row_to_category)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    /// Get a category by ID, only if owned by the user
    pub fn get_category(&self, user_id: i64, id: i64) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                &format!(
                    "SELECT {} FROM categories WHERE id = ? AND user_id = ?",
                    CATEGORY_COLUMNS
                ),
                params![id, user_id],
                row_to_category,
            )
            .optional()?;
        Ok(category)
    }

    /// Replace a category's fields; returns false if not found for this user
    pub fn update_category(&self, user_id: i64, id: i64, category: &NewCategory) -> Result<bool> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE categories SET name = ?, color = ?, icon = ? WHERE id = ? AND user_id = ?",
            params![
                category.name.trim(),
                category.color,
                category.icon,
                id,
                user_id
            ],
        )?;
        Ok(updated > 0)
    }

    /// Delete a category; its expenses become uncategorized and its budgets are removed
    pub fn delete_category(&self, user_id: i64, id: i64) -> Result<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let owned: Option<i64> = tx
            .query_row(
                "SELECT id FROM categories WHERE id = ? AND user_id = ?",
                params![id, user_id],
                |row| row.get(0),
            )
            .optional()?;
        if owned.is_none() {
            return Ok(false);
        }

        tx.execute(
            "UPDATE expenses SET category_id = NULL WHERE category_id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        tx.execute(
            "DELETE FROM budgets WHERE category_id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        tx.execute(
            "DELETE FROM categories WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        tx.commit()?;

        Ok(true)
    }
}
