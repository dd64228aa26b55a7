use std::collections::BTreeMap;

use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use log::{debug, info};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::{DateRange, MonthPeriod};
use crate::config::BudgetConfig;
use crate::decimal::Money;
use crate::entities::{BudgetPlan, CategorizedRecord, CategoryAmounts};
use crate::errors::{LedgerError, Result};
use crate::store::LedgerStore;
use crate::types::{BudgetPlanId, CategoryId, CategoryKind, OwnerId};

/// advisory comparison of a candidate expense with the month's plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetCheck {
    pub period: MonthPeriod,
    pub has_plan: bool,
    pub has_category_in_plan: bool,
    pub category_planned: Money,
    /// already spent in the category this period, candidate excluded
    pub spent_before: Money,
    pub spent_after: Money,
    /// `spent_after` as a percentage of the plan, 0 when nothing is planned
    pub percent_used: Decimal,
    pub over_budget: bool,
}

impl BudgetCheck {
    fn unplanned(period: MonthPeriod, has_plan: bool) -> Self {
        Self {
            period,
            has_plan,
            has_category_in_plan: false,
            category_planned: Money::ZERO,
            spent_before: Money::ZERO,
            spent_after: Money::ZERO,
            percent_used: Decimal::ZERO,
            over_budget: false,
        }
    }

    pub fn remaining(&self) -> Money {
        self.category_planned - self.spent_after
    }
}

/// planning figures averaged over past months
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetSuggestion {
    pub lookback: Vec<MonthPeriod>,
    pub income: CategoryAmounts,
    pub expense: CategoryAmounts,
}

/// one expense category of a plan against actual spending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryVariance {
    pub category_id: CategoryId,
    pub planned: Money,
    pub actual: Money,
    pub remaining: Money,
    pub percent_used: Decimal,
    pub over_budget: bool,
}

/// a plan's expense side against the month's records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanVsActual {
    pub plan_id: BudgetPlanId,
    pub period: MonthPeriod,
    pub categories: Vec<CategoryVariance>,
    pub total_planned: Money,
    pub total_actual: Money,
    /// spending in categories absent from the plan, uncategorized included
    pub unplanned_spend: Money,
    pub actual_income: Money,
}

/// monthly budget plans and their comparison with actual records
pub struct BudgetTracker<'a> {
    pub(super) store: &'a dyn LedgerStore,
    pub(super) config: BudgetConfig,
}

impl<'a> BudgetTracker<'a> {
    pub fn new(store: &'a dyn LedgerStore, config: BudgetConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &BudgetConfig {
        &self.config
    }

    /// create the period's plan or overwrite the existing one in place
    ///
    /// totals are recomputed from the maps; repeating the same call leaves
    /// one plan with the same id and content.
    pub fn upsert_budget(
        &self,
        owner: OwnerId,
        period: MonthPeriod,
        income_categories: CategoryAmounts,
        expense_categories: CategoryAmounts,
        credit_expenses: Money,
        notes: Option<String>,
    ) -> Result<BudgetPlan> {
        let incoming = BudgetPlan::new(owner, period, income_categories, expense_categories, credit_expenses, notes)?;

        let plan = match self.store.budget_plan(owner, period)? {
            Some(mut existing) => {
                existing.merge_from(incoming);
                existing
            }
            None => incoming,
        };

        self.store.save_budget_plan(plan.clone())?;
        info!(
            "budget {} for owner {}: income {}, expenses {}",
            period, owner, plan.planned_income, plan.planned_expenses
        );
        Ok(plan)
    }

    /// set one category amount; the other side of the plan is untouched
    pub fn update_single_category(
        &self,
        owner: OwnerId,
        plan_id: BudgetPlanId,
        kind: CategoryKind,
        category_id: CategoryId,
        amount: Money,
    ) -> Result<BudgetPlan> {
        let mut plan = self.owned_plan(owner, plan_id)?;
        plan.set_category(kind, category_id, amount)?;
        self.store.save_budget_plan(plan.clone())?;
        debug!("budget {} {:?} category {} set to {}", plan.period, kind, category_id, amount);
        Ok(plan)
    }

    pub fn delete_budget(&self, owner: OwnerId, plan_id: BudgetPlanId) -> Result<()> {
        self.store.delete_budget_plan(owner, plan_id)?;
        info!("budget {} deleted for owner {}", plan_id, owner);
        Ok(())
    }

    pub fn budget_for(&self, owner: OwnerId, period: MonthPeriod) -> Result<Option<BudgetPlan>> {
        self.store.budget_plan(owner, period)
    }

    /// newest period first
    pub fn list_recent(&self, owner: OwnerId, limit: usize) -> Result<Vec<BudgetPlan>> {
        self.store.recent_budget_plans(owner, limit)
    }

    /// compare a not-yet-recorded expense with the plan of its month
    ///
    /// never blocks anything; a month without a plan is the common case and
    /// yields `has_plan == false`.
    pub fn check_expense_against_plan(
        &self,
        owner: OwnerId,
        category_id: CategoryId,
        candidate: Money,
        date: NaiveDate,
    ) -> Result<BudgetCheck> {
        let period = MonthPeriod::containing(date);

        let Some(plan) = self.store.budget_plan(owner, period)? else {
            debug!("no budget for owner {} in {}", owner, period);
            return Ok(BudgetCheck::unplanned(period, false));
        };

        let Some(planned) = plan.planned_for(CategoryKind::Expense, category_id) else {
            debug!("category {} is not in the {} budget", category_id, period);
            return Ok(BudgetCheck::unplanned(period, true));
        };

        if candidate.is_negative() {
            return Err(LedgerError::InvalidAmount { amount: candidate });
        }

        let spent_before: Money = self
            .store
            .expenses(owner, &period.date_range())?
            .iter()
            .filter(|record| record.category_id == Some(category_id))
            .map(|record| record.amount)
            .sum();
        let spent_after = spent_before + candidate;

        Ok(BudgetCheck {
            period,
            has_plan: true,
            has_category_in_plan: true,
            category_planned: planned,
            spent_before,
            spent_after,
            percent_used: spent_after.percent_of(planned),
            over_budget: spent_after > planned,
        })
    }

    /// per-category means over the complete months before the current one
    ///
    /// months without records count as zero; uncategorized records are left
    /// out since they cannot be planned.
    pub fn suggest_category_amounts(
        &self,
        owner: OwnerId,
        lookback_months: u32,
        time: &SafeTimeProvider,
    ) -> Result<BudgetSuggestion> {
        if lookback_months == 0 {
            return Ok(BudgetSuggestion::default());
        }

        let current = MonthPeriod::containing(time.now().date_naive());
        let first = current.offset(-(lookback_months as i32));
        let range = DateRange::new(first.first_day(), current.previous().last_day())?;
        let divisor = Decimal::from(lookback_months);

        let income = average_by_category(&self.store.incomes(owner, &range)?, divisor);
        let expense = average_by_category(&self.store.expenses(owner, &range)?, divisor);

        Ok(BudgetSuggestion {
            lookback: first.iter(lookback_months).collect(),
            income,
            expense,
        })
    }

    /// suggestions over the configured lookback window
    pub fn suggest(&self, owner: OwnerId, time: &SafeTimeProvider) -> Result<BudgetSuggestion> {
        self.suggest_category_amounts(owner, self.config.suggestion_lookback_months, time)
    }

    /// expense categories of a plan against what was actually spent that month
    pub fn plan_vs_actual(&self, owner: OwnerId, plan_id: BudgetPlanId) -> Result<PlanVsActual> {
        let plan = self.owned_plan(owner, plan_id)?;
        let range = plan.period.date_range();

        let mut actual_by_category: BTreeMap<Option<CategoryId>, Money> = BTreeMap::new();
        for record in self.store.expenses(owner, &range)? {
            *actual_by_category.entry(record.category_id).or_insert(Money::ZERO) += record.amount;
        }

        let categories: Vec<CategoryVariance> = plan
            .expense_categories
            .iter()
            .map(|(category_id, planned)| {
                let actual = actual_by_category
                    .get(&Some(*category_id))
                    .copied()
                    .unwrap_or(Money::ZERO);
                CategoryVariance {
                    category_id: *category_id,
                    planned: *planned,
                    actual,
                    remaining: *planned - actual,
                    percent_used: actual.percent_of(*planned),
                    over_budget: actual > *planned,
                }
            })
            .collect();

        let unplanned_spend = actual_by_category
            .iter()
            .filter(|(category_id, _)| match category_id {
                Some(id) => !plan.expense_categories.contains_key(id),
                None => true,
            })
            .map(|(_, amount)| *amount)
            .sum();

        let actual_income = self
            .store
            .incomes(owner, &range)?
            .iter()
            .map(|record| record.amount)
            .sum();

        Ok(PlanVsActual {
            plan_id: plan.id,
            period: plan.period,
            total_planned: plan.planned_expenses,
            total_actual: categories.iter().map(|c| c.actual).sum(),
            categories,
            unplanned_spend,
            actual_income,
        })
    }

    fn owned_plan(&self, owner: OwnerId, plan_id: BudgetPlanId) -> Result<BudgetPlan> {
        let plan = self.store.budget_plan_by_id(plan_id)?;
        if plan.owner != owner {
            return Err(LedgerError::not_found("budget plan", plan_id));
        }
        Ok(plan)
    }
}

fn average_by_category<R: CategorizedRecord>(records: &[R], divisor: Decimal) -> CategoryAmounts {
    let mut totals = CategoryAmounts::new();
    for record in records {
        if let Some(category_id) = record.category_id() {
            *totals.entry(category_id).or_insert(Money::ZERO) += record.amount();
        }
    }
    for amount in totals.values_mut() {
        *amount = (*amount / divisor).round_cents();
    }
    totals
}
