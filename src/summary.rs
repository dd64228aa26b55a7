use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::entities::{CategorizedRecord, Category, ExpenseRecord, IncomeRecord};
use crate::types::CategoryId;

/// bucket for records without a known category
pub const UNCATEGORIZED: &str = "uncategorized";

/// totals per category label
pub type LabelTotals = BTreeMap<String, Money>;

/// one label's part of a total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub label: String,
    pub amount: Money,
    /// percent of the side's total, 0 when the total is 0
    pub percent: Decimal,
}

/// income and expense grouped by category over some period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub income_by_category: LabelTotals,
    pub expense_by_category: LabelTotals,
    pub total_income: Money,
    pub total_expense: Money,
    pub balance: Money,
}

impl CategorySummary {
    /// expense labels by share of total expense, largest first
    pub fn expense_shares(&self) -> Vec<CategoryShare> {
        shares(&self.expense_by_category, self.total_expense)
    }

    /// income labels by share of total income, largest first
    pub fn income_shares(&self) -> Vec<CategoryShare> {
        shares(&self.income_by_category, self.total_income)
    }

    pub fn is_empty(&self) -> bool {
        self.income_by_category.is_empty() && self.expense_by_category.is_empty()
    }
}

/// groups records by category label
pub struct CategorySummarizer;

impl CategorySummarizer {
    /// pure function of its inputs; unknown or missing categories are
    /// summed under `UNCATEGORIZED`
    pub fn summarize(incomes: &[IncomeRecord], expenses: &[ExpenseRecord], categories: &[Category]) -> CategorySummary {
        let labels: HashMap<CategoryId, &str> = categories
            .iter()
            .map(|category| (category.id, category.label.as_str()))
            .collect();

        let income_by_category = group(incomes, &labels);
        let expense_by_category = group(expenses, &labels);
        let total_income: Money = income_by_category.values().sum();
        let total_expense: Money = expense_by_category.values().sum();

        CategorySummary {
            income_by_category,
            expense_by_category,
            total_income,
            total_expense,
            balance: total_income - total_expense,
        }
    }
}

fn group<R: CategorizedRecord>(records: &[R], labels: &HashMap<CategoryId, &str>) -> LabelTotals {
    let mut totals = LabelTotals::new();
    for record in records {
        let label = record
            .category_id()
            .and_then(|id| labels.get(&id).copied())
            .unwrap_or(UNCATEGORIZED);
        *totals.entry(label.to_string()).or_insert(Money::ZERO) += record.amount();
    }
    totals
}

fn shares(totals: &LabelTotals, whole: Money) -> Vec<CategoryShare> {
    let mut shares: Vec<CategoryShare> = totals
        .iter()
        .map(|(label, amount)| CategoryShare {
            label: label.clone(),
            amount: *amount,
            percent: amount.percent_of(whole),
        })
        .collect();
    shares.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.label.cmp(&b.label)));
    shares
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CategoryKind;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 12).unwrap()
    }

    fn fixture() -> (Vec<IncomeRecord>, Vec<ExpenseRecord>, Vec<Category>) {
        let salary = Category::new(1, "salary", CategoryKind::Income);
        let food = Category::new(1, "food", CategoryKind::Expense);
        let rent = Category::new(1, "rent", CategoryKind::Expense);

        let incomes = vec![
            IncomeRecord::new(1, Money::from_major(100_000), Some(salary.id), date()).unwrap(),
            IncomeRecord::new(1, Money::from_major(5_000), None, date()).unwrap(),
        ];
        let expenses = vec![
            ExpenseRecord::new(1, Money::from_major(12_000), Some(food.id), date()).unwrap(),
            ExpenseRecord::new(1, Money::from_major(8_000), Some(food.id), date()).unwrap(),
            ExpenseRecord::new(1, Money::from_major(30_000), Some(rent.id), date()).unwrap(),
            // category deleted since
            ExpenseRecord::new(1, Money::from_major(10_000), Some(Uuid::new_v4()), date()).unwrap(),
        ];
        (incomes, expenses, vec![salary, food, rent])
    }

    #[test]
    fn test_groups_and_totals() {
        let (incomes, expenses, categories) = fixture();
        let summary = CategorySummarizer::summarize(&incomes, &expenses, &categories);

        assert_eq!(summary.income_by_category["salary"], Money::from_major(100_000));
        assert_eq!(summary.income_by_category[UNCATEGORIZED], Money::from_major(5_000));
        assert_eq!(summary.expense_by_category["food"], Money::from_major(20_000));
        assert_eq!(summary.expense_by_category[UNCATEGORIZED], Money::from_major(10_000));
        assert_eq!(summary.total_income, Money::from_major(105_000));
        assert_eq!(summary.total_expense, Money::from_major(60_000));
        assert_eq!(summary.balance, Money::from_major(45_000));
    }

    #[test]
    fn test_summarize_is_idempotent() {
        let (incomes, expenses, categories) = fixture();
        let first = CategorySummarizer::summarize(&incomes, &expenses, &categories);
        let second = CategorySummarizer::summarize(&incomes, &expenses, &categories);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_input() {
        let summary = CategorySummarizer::summarize(&[], &[], &[]);
        assert!(summary.is_empty());
        assert_eq!(summary.balance, Money::ZERO);
        assert!(summary.expense_shares().is_empty());
    }

    #[test]
    fn test_expense_shares_sorted() {
        let (incomes, expenses, categories) = fixture();
        let shares = CategorySummarizer::summarize(&incomes, &expenses, &categories).expense_shares();

        let labels: Vec<&str> = shares.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["rent", "food", UNCATEGORIZED]);
        assert_eq!(shares[0].percent, dec!(50));
        let total: Decimal = shares.iter().map(|s| s.percent).sum();
        assert_eq!(total, dec!(100));
    }
}
