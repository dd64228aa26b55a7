/// monthly budget - plan a month, check spending against it and forecast ahead
use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use personal_ledger_rs::chrono::NaiveDate;
use personal_ledger_rs::{
    Category, CategoryKind, EngineConfig, ExpenseRecord, IncomeRecord, Ledger, Loan, MemoryStore, Money, MonthPeriod,
    Rate, SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== monthly budget example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).unwrap()));
    let mut ledger = Ledger::new(MemoryStore::new(), EngineConfig::default())?;
    let owner = 1;

    let salary = ledger.add_category(Category::new(owner, "salary", CategoryKind::Income))?;
    let food = ledger.add_category(Category::new(owner, "food", CategoryKind::Expense))?;
    let rent = ledger.add_category(Category::new(owner, "rent", CategoryKind::Expense))?;

    ledger.add_loan(Loan::new(
        owner,
        "bank",
        Money::from_major(15_000),
        12,
        Rate::from_percentage(12),
        Money::from_major(60_000),
        NaiveDate::from_ymd_opt(2023, 11, 10).ok_or("bad date")?,
    )?
    .with_elapsed_months(8)?)?;

    let july = MonthPeriod::new(2024, 7)?;
    let plan = ledger.upsert_budget(
        owner,
        july,
        BTreeMap::from([(salary.id, Money::from_major(120_000))]),
        BTreeMap::from([(food.id, Money::from_major(10_000)), (rent.id, Money::from_major(35_000))]),
        Money::from_major(15_000),
        None,
        &time,
    )?;
    println!("planned balance for {}: {}", july, plan.planned_balance());

    ledger.record_income(IncomeRecord::new(
        owner,
        Money::from_major(120_000),
        Some(salary.id),
        NaiveDate::from_ymd_opt(2024, 7, 5).ok_or("bad date")?,
    )?)?;

    for (day, amount) in [(3, 6_000), (12, 3_500), (20, 1_000)] {
        let expense = ExpenseRecord::new(
            owner,
            Money::from_major(amount),
            Some(food.id),
            NaiveDate::from_ymd_opt(2024, 7, day).ok_or("bad date")?,
        )?;
        if let Some(check) = ledger.record_expense(expense, &time)? {
            println!(
                "food: {} of {} ({}%){}",
                check.spent_after,
                check.category_planned,
                check.percent_used,
                if check.over_budget { " - over budget" } else { "" }
            );
        }
    }

    let variance = ledger.budgets().plan_vs_actual(owner, plan.id)?;
    println!("\nplanned {} / spent {}", variance.total_planned, variance.total_actual);

    println!("\nforecast:");
    for month in ledger.budgets().forecast_default(owner, &time)? {
        println!(
            "  {}: loans {}, projected {}{}",
            month.period,
            month.total_loan_payments,
            month.projected_balance,
            if month.has_plan { "" } else { " (no budget yet)" }
        );
    }

    Ok(())
}
