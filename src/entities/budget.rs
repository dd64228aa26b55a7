use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::MonthPeriod;
use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::types::{BudgetPlanId, CategoryId, CategoryKind, OwnerId};

/// planned amounts keyed by category
pub type CategoryAmounts = BTreeMap<CategoryId, Money>;

/// monthly budget plan, unique per (owner, period)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetPlan {
    pub id: BudgetPlanId,
    pub owner: OwnerId,
    pub period: MonthPeriod,
    pub income_categories: CategoryAmounts,
    pub expense_categories: CategoryAmounts,
    /// sum of `income_categories`
    pub planned_income: Money,
    /// sum of `expense_categories`
    pub planned_expenses: Money,
    /// planned loan and other contractual payments
    pub credit_expenses: Money,
    pub notes: Option<String>,
}

impl BudgetPlan {
    pub fn new(
        owner: OwnerId,
        period: MonthPeriod,
        income_categories: CategoryAmounts,
        expense_categories: CategoryAmounts,
        credit_expenses: Money,
        notes: Option<String>,
    ) -> Result<Self> {
        validate_amounts(&income_categories)?;
        validate_amounts(&expense_categories)?;
        if credit_expenses.is_negative() {
            return Err(LedgerError::InvalidAmount {
                amount: credit_expenses,
            });
        }

        let mut plan = Self {
            id: Uuid::new_v4(),
            owner,
            period,
            income_categories,
            expense_categories,
            planned_income: Money::ZERO,
            planned_expenses: Money::ZERO,
            credit_expenses,
            notes,
        };
        plan.recompute_totals();
        Ok(plan)
    }

    /// overwrite this plan's content with `other`, keeping identity
    pub fn merge_from(&mut self, other: BudgetPlan) {
        self.income_categories = other.income_categories;
        self.expense_categories = other.expense_categories;
        self.credit_expenses = other.credit_expenses;
        self.notes = other.notes;
        self.recompute_totals();
    }

    /// set one category amount and recompute that side's total
    pub fn set_category(&mut self, kind: CategoryKind, category_id: CategoryId, amount: Money) -> Result<()> {
        if amount.is_negative() {
            return Err(LedgerError::InvalidAmount { amount });
        }
        match kind {
            CategoryKind::Income => {
                self.income_categories.insert(category_id, amount);
                self.planned_income = self.income_categories.values().sum();
            }
            CategoryKind::Expense => {
                self.expense_categories.insert(category_id, amount);
                self.planned_expenses = self.expense_categories.values().sum();
            }
        }
        Ok(())
    }

    pub fn categories(&self, kind: CategoryKind) -> &CategoryAmounts {
        match kind {
            CategoryKind::Income => &self.income_categories,
            CategoryKind::Expense => &self.expense_categories,
        }
    }

    /// planned amount for a category, `None` when the category is not in the plan
    pub fn planned_for(&self, kind: CategoryKind, category_id: CategoryId) -> Option<Money> {
        self.categories(kind).get(&category_id).copied()
    }

    /// planned income minus planned expenses and contractual payments
    pub fn planned_balance(&self) -> Money {
        self.planned_income - self.planned_expenses - self.credit_expenses
    }

    fn recompute_totals(&mut self) {
        self.planned_income = self.income_categories.values().sum();
        self.planned_expenses = self.expense_categories.values().sum();
    }
}

fn validate_amounts(amounts: &CategoryAmounts) -> Result<()> {
    match amounts.values().find(|amount| amount.is_negative()) {
        Some(amount) => Err(LedgerError::InvalidAmount { amount: *amount }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period() -> MonthPeriod {
        MonthPeriod::new(2024, 7).unwrap()
    }

    #[test]
    fn test_totals_are_sums_of_maps() {
        let salary = Uuid::new_v4();
        let food = Uuid::new_v4();
        let rent = Uuid::new_v4();
        let plan = BudgetPlan::new(
            1,
            period(),
            BTreeMap::from([(salary, Money::from_major(100_000))]),
            BTreeMap::from([(food, Money::from_major(20_000)), (rent, Money::from_major(35_000))]),
            Money::from_major(15_000),
            None,
        )
        .unwrap();

        assert_eq!(plan.planned_income, Money::from_major(100_000));
        assert_eq!(plan.planned_expenses, Money::from_major(55_000));
        assert_eq!(plan.planned_balance(), Money::from_major(30_000));
        assert_eq!(plan.planned_for(CategoryKind::Expense, food), Some(Money::from_major(20_000)));
        assert_eq!(plan.planned_for(CategoryKind::Income, food), None);
    }

    #[test]
    fn test_negative_amounts_rejected() {
        let result = BudgetPlan::new(
            1,
            period(),
            BTreeMap::new(),
            BTreeMap::from([(Uuid::new_v4(), Money::from_major(-1))]),
            Money::ZERO,
            None,
        );
        assert!(matches!(result, Err(LedgerError::InvalidAmount { .. })));
    }

    #[test]
    fn test_set_category_touches_one_side() {
        let food = Uuid::new_v4();
        let mut plan = BudgetPlan::new(
            1,
            period(),
            BTreeMap::from([(Uuid::new_v4(), Money::from_major(50_000))]),
            BTreeMap::from([(food, Money::from_major(10_000))]),
            Money::ZERO,
            None,
        )
        .unwrap();

        plan.set_category(CategoryKind::Expense, food, Money::from_major(12_000)).unwrap();
        assert_eq!(plan.planned_expenses, Money::from_major(12_000));
        assert_eq!(plan.planned_income, Money::from_major(50_000));
        assert!(plan.set_category(CategoryKind::Income, food, Money::from_major(-3)).is_err());
    }

    #[test]
    fn test_merge_keeps_identity() {
        let mut plan = BudgetPlan::new(1, period(), BTreeMap::new(), BTreeMap::new(), Money::ZERO, None).unwrap();
        let id = plan.id;
        let replacement = BudgetPlan::new(
            1,
            period(),
            BTreeMap::new(),
            BTreeMap::from([(Uuid::new_v4(), Money::from_major(7_000))]),
            Money::from_major(1_000),
            Some("vacation".to_string()),
        )
        .unwrap();

        plan.merge_from(replacement);
        assert_eq!(plan.id, id);
        assert_eq!(plan.planned_expenses, Money::from_major(7_000));
        assert_eq!(plan.notes.as_deref(), Some("vacation"));
    }
}
