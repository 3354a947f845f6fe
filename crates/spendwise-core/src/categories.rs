//! Category management

use crate::error::{Error, Result};
use crate::expenses::ExpenseService;
use crate::models::{Category, NewCategory};

impl ExpenseService {
    pub fn list_categories(&self, user_id: i64) -> Result<Vec<Category>> {
        self.db().list_categories(user_id)
    }

    pub fn get_category(&self, user_id: i64, id: i64) -> Result<Category> {
        self.db()
            .get_category(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Category {} not found", id)))
    }

    /// Check that a user-supplied category id refers to one of the user's categories
    pub fn validate_category(&self, user_id: i64, category_id: i64) -> Result<Category> {
        self.db()
            .get_category(user_id, category_id)?
            .ok_or_else(|| {
                Error::Validation(format!("Category not found with id: {}", category_id))
            })
    }

    pub fn create_category(&self, user_id: i64, category: &NewCategory) -> Result<Category> {
        category.validate()?;
        let id = self.db().create_category(user_id, category)?;
        // New names can change what the classifier would pick
        self.classifier().cache().invalidate_user(user_id);
        self.get_category(user_id, id)
    }

    pub fn update_category(
        &self,
        user_id: i64,
        id: i64,
        category: &NewCategory,
    ) -> Result<Category> {
        category.validate()?;
        if !self.db().update_category(user_id, id, category)? {
            return Err(Error::NotFound(format!("Category {} not found", id)));
        }
        self.classifier().cache().invalidate_user(user_id);
        self.get_category(user_id, id)
    }

    /// Delete a category; its expenses become uncategorized and its budgets go away
    pub fn delete_category(&self, user_id: i64, id: i64) -> Result<()> {
        if !self.db().delete_category(user_id, id)? {
            return Err(Error::NotFound(format!("Category {} not found", id)));
        }
        self.classifier().cache().invalidate_user(user_id);
        Ok(())
    }
}
