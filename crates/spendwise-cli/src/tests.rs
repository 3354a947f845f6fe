//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::sync::Arc;

use spendwise_core::db::Database;
use spendwise_core::models::{NewBudget, NewCategory, NewExpense, Period};
use spendwise_core::{Classifier, ClassifierConfig, ExpenseService};

use crate::commands::{self, truncate};

fn setup_service() -> ExpenseService {
    let db = Database::in_memory().unwrap();
    let classifier = Arc::new(Classifier::new(None, ClassifierConfig::default()));
    ExpenseService::new(db, classifier)
}

fn setup_user(service: &ExpenseService) -> i64 {
    commands::cmd_users_add(service.db(), "cli@example.com", "password123").unwrap()
}

// ========== Core Command Tests ==========

#[test]
fn test_open_db_unencrypted_creates_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");

    let db = commands::open_db(&path, true).unwrap();
    assert!(path.exists());
    assert!(db.list_users().unwrap().is_empty());
}

#[test]
fn test_cmd_init() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("init.db");

    assert!(commands::cmd_init(&path, true).is_ok());
    // Re-running is harmless
    assert!(commands::cmd_init(&path, true).is_ok());
}

#[test]
fn test_find_user_missing() {
    let service = setup_service();
    let err = commands::find_user(service.db(), "ghost@example.com").unwrap_err();
    assert!(err.to_string().contains("No user with email"));
}

// ========== Users Command Tests ==========

#[test]
fn test_cmd_users_add_and_list() {
    let service = setup_service();
    let id = setup_user(&service);

    let user = commands::find_user(service.db(), "CLI@example.com").unwrap();
    assert_eq!(user.id, id);
    assert!(user.password_hash.starts_with("$argon2"));

    assert!(commands::cmd_users_list(service.db()).is_ok());
}

#[test]
fn test_cmd_users_add_duplicate() {
    let service = setup_service();
    setup_user(&service);

    let result = commands::cmd_users_add(service.db(), "cli@example.com", "password456");
    assert!(result.unwrap_err().to_string().contains("already exists"));
}

#[test]
fn test_cmd_users_add_rejects_bad_input() {
    let service = setup_service();

    assert!(commands::cmd_users_add(service.db(), "not-an-email", "password123").is_err());
    assert!(commands::cmd_users_add(service.db(), "ok@example.com", "short").is_err());
    assert!(service.db().list_users().unwrap().is_empty());
}

// ========== Report Command Tests ==========

#[tokio::test]
async fn test_cmd_classify() {
    let service = setup_service();
    let user = setup_user(&service);
    service
        .create_category(
            user,
            &NewCategory {
                name: "Food".into(),
                color: None,
                icon: None,
            },
        )
        .unwrap();

    let result =
        commands::cmd_classify(&service, "cli@example.com", "Zomato", 250.0, None, false).await;
    assert!(result.is_ok());

    // Dry run: nothing saved, but the suggestion is cached
    assert!(service.list_expenses(user).unwrap().is_empty());
    assert_eq!(service.classifier().cache().len(), 1);

    let json =
        commands::cmd_classify(&service, "cli@example.com", "Zomato", 250.0, None, true).await;
    assert!(json.is_ok());
}

#[tokio::test]
async fn test_cmd_classify_unknown_user() {
    let service = setup_service();
    let result =
        commands::cmd_classify(&service, "ghost@example.com", "Zomato", 1.0, None, false).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_cmd_alerts_and_summary() {
    let service = setup_service();
    let user = setup_user(&service);
    let food = service
        .create_category(
            user,
            &NewCategory {
                name: "Food".into(),
                color: None,
                icon: None,
            },
        )
        .unwrap();
    service
        .create_budget(
            user,
            &NewBudget {
                category_id: food.id,
                month_year: Period::current().to_string(),
                monthly_limit: 100.0,
            },
        )
        .unwrap();
    service
        .create_expense(
            user,
            &NewExpense {
                amount: 95.0,
                merchant: "Bakery".into(),
                category_id: Some(food.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(commands::cmd_alerts(&service, "cli@example.com", None, false).is_ok());
    assert!(commands::cmd_alerts(&service, "cli@example.com", None, true).is_ok());
    assert!(commands::cmd_summary(&service, "cli@example.com", false).is_ok());
}

#[test]
fn test_cmd_alerts_bad_month() {
    let service = setup_service();
    setup_user(&service);

    let result = commands::cmd_alerts(&service, "cli@example.com", Some("November"), false);
    assert!(result.is_err());
}

#[test]
fn test_cmd_alerts_no_budgets() {
    let service = setup_service();
    setup_user(&service);

    assert!(commands::cmd_alerts(&service, "cli@example.com", Some("2025-11"), false).is_ok());
}

// ========== Helper Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("exactly10!", 10), "exactly10!");
    assert_eq!(truncate("this is a long merchant", 10), "this is...");
    assert_eq!(truncate("café au lait", 8), "café ...");
}
