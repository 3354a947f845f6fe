//! Read-only reporting commands: classify, alerts, summary

use anyhow::Result;
use spendwise_core::models::{BudgetStatus, NewExpense};
use spendwise_core::ExpenseService;

use super::{find_user, truncate};

/// Run the classification pipeline for a merchant without saving
pub async fn cmd_classify(
    service: &ExpenseService,
    email: &str,
    merchant: &str,
    amount: f64,
    description: Option<&str>,
    json: bool,
) -> Result<()> {
    let user = find_user(service.db(), email)?;
    let draft = NewExpense {
        amount,
        merchant: merchant.to_string(),
        description: description.map(str::to_string),
        ..Default::default()
    };

    let suggestion = service.suggest_category(user.id, &draft).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&suggestion)?);
        return Ok(());
    }

    match suggestion {
        Some(s) => {
            println!();
            println!("🏷️  {} → {}", merchant, s.category_name);
            println!("   Confidence: {:.0}%", s.confidence * 100.0);
            println!("   Source:     {:?}", s.source);
            println!("   Reason:     {}", s.reason);
        }
        None => println!("Nothing to classify: merchant is empty"),
    }

    Ok(())
}

fn status_icon(status: BudgetStatus) -> &'static str {
    match status {
        BudgetStatus::Green => "🟢",
        BudgetStatus::Yellow => "🟡",
        BudgetStatus::Red => "🔴",
    }
}

/// Budget utilisation for a month
pub fn cmd_alerts(
    service: &ExpenseService,
    email: &str,
    month: Option<&str>,
    json: bool,
) -> Result<()> {
    let user = find_user(service.db(), email)?;
    let alerts = service.budget_alerts(user.id, month)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&alerts)?);
        return Ok(());
    }

    if alerts.is_empty() {
        println!("No budgets set for this month.");
        return Ok(());
    }

    let categories = service.list_categories(user.id)?;

    println!();
    println!("💰 Budgets for {}", alerts[0].month_year);
    println!("   ─────────────────────────────────────────────────────────────");

    for alert in &alerts {
        let name = categories
            .iter()
            .find(|c| c.id == alert.category_id)
            .map(|c| c.name.as_str())
            .unwrap_or("?");
        println!(
            "   {} {:<20} {:>10.2} / {:>10.2}  ({:.1}%)",
            status_icon(alert.status),
            truncate(name, 20),
            alert.spent,
            alert.limit,
            alert.percent_used
        );
    }

    Ok(())
}

/// This month's spending so far, by category, against last month
pub fn cmd_summary(service: &ExpenseService, email: &str, json: bool) -> Result<()> {
    let user = find_user(service.db(), email)?;
    let summary = service.monthly_summary(user.id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let categories = service.list_categories(user.id)?;

    println!();
    println!("📊 Spending for {}", summary.month_year);
    println!("   ─────────────────────────────");
    println!("   Total:       {:>10.2}", summary.total_spent);
    println!("   Last month:  {:>10.2}", summary.last_month_total);
    println!();

    for (key, total) in &summary.category_totals {
        let name = key
            .parse::<i64>()
            .ok()
            .and_then(|id| categories.iter().find(|c| c.id == id))
            .map(|c| c.name.clone())
            .unwrap_or_else(|| key.clone());
        println!("   {:<20} {:>10.2}", truncate(&name, 20), total);
    }

    Ok(())
}
