use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use log::warn;

use crate::calendar::{DateRange, MonthPeriod};
use crate::decimal::Money;
use crate::entities::{
    BudgetPlan, Category, ExpenseRecord, IncomeRecord, Investment, Loan, LoanCapabilities, LoanHoliday, LoanPayment,
    PeerDebt, SavingsSnapshot,
};
use crate::errors::{LedgerError, Result};
use crate::types::{BudgetPlanId, CategoryId, CategoryKind, DebtId, InvestmentId, LoanId, OwnerId, RecordId};

use super::LedgerStore;

#[derive(Debug, Default)]
struct Tables {
    loans: Vec<Loan>,
    loan_payments: Vec<LoanPayment>,
    holidays: Vec<LoanHoliday>,
    debts: Vec<PeerDebt>,
    categories: Vec<Category>,
    incomes: Vec<IncomeRecord>,
    expenses: Vec<ExpenseRecord>,
    investments: Vec<Investment>,
    savings: Vec<SavingsSnapshot>,
    budget_plans: Vec<BudgetPlan>,
}

/// in-process store; one lock serializes every read and write
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| {
            warn!("memory store lock poisoned");
            LedgerError::Storage {
                message: "memory store lock poisoned".to_string(),
            }
        })
    }
}

impl LedgerStore for MemoryStore {
    fn loans(&self, owner: OwnerId, active_only: bool) -> Result<Vec<Loan>> {
        let tables = self.lock()?;
        Ok(tables
            .loans
            .iter()
            .filter(|loan| loan.owner == owner && (!active_only || loan.active))
            .cloned()
            .collect())
    }

    fn loan(&self, loan_id: LoanId) -> Result<Loan> {
        let tables = self.lock()?;
        tables
            .loans
            .iter()
            .find(|loan| loan.id == loan_id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("loan", loan_id))
    }

    fn insert_loan(&self, loan: Loan) -> Result<()> {
        let mut tables = self.lock()?;
        tables.loans.push(loan);
        Ok(())
    }

    fn update_loan_capabilities(&self, loan_id: LoanId, capabilities: LoanCapabilities) -> Result<Loan> {
        let mut tables = self.lock()?;
        let loan = tables
            .loans
            .iter_mut()
            .find(|loan| loan.id == loan_id)
            .ok_or_else(|| LedgerError::not_found("loan", loan_id))?;
        loan.capabilities = capabilities;
        Ok(loan.clone())
    }

    fn commit_loan_payment(
        &self,
        loan_id: LoanId,
        apply: &mut dyn FnMut(&mut Loan) -> Result<LoanPayment>,
    ) -> Result<Loan> {
        let mut tables = self.lock()?;
        let index = tables
            .loans
            .iter()
            .position(|loan| loan.id == loan_id)
            .ok_or_else(|| LedgerError::not_found("loan", loan_id))?;

        let mut working = tables.loans[index].clone();
        let payment = apply(&mut working)?;

        tables.loans[index] = working.clone();
        tables.loan_payments.push(payment);
        Ok(working)
    }

    fn loan_payments(&self, loan_id: LoanId) -> Result<Vec<LoanPayment>> {
        let tables = self.lock()?;
        Ok(tables
            .loan_payments
            .iter()
            .filter(|payment| payment.loan_id == loan_id)
            .cloned()
            .collect())
    }

    fn insert_holiday(&self, holiday: LoanHoliday) -> Result<()> {
        let mut tables = self.lock()?;
        if !tables.loans.iter().any(|loan| loan.id == holiday.loan_id) {
            return Err(LedgerError::not_found("loan", holiday.loan_id));
        }
        tables.holidays.push(holiday);
        Ok(())
    }

    fn holidays(&self, loan_id: LoanId) -> Result<Vec<LoanHoliday>> {
        let tables = self.lock()?;
        Ok(tables
            .holidays
            .iter()
            .filter(|holiday| holiday.loan_id == loan_id)
            .cloned()
            .collect())
    }

    fn debts(&self, owner: OwnerId, unpaid_only: bool) -> Result<Vec<PeerDebt>> {
        let tables = self.lock()?;
        Ok(tables
            .debts
            .iter()
            .filter(|debt| debt.owner == owner && (!unpaid_only || !debt.paid))
            .cloned()
            .collect())
    }

    fn insert_debt(&self, debt: PeerDebt) -> Result<()> {
        let mut tables = self.lock()?;
        tables.debts.push(debt);
        Ok(())
    }

    fn mark_debt_paid(&self, owner: OwnerId, debt_id: DebtId) -> Result<PeerDebt> {
        let mut tables = self.lock()?;
        let debt = tables
            .debts
            .iter_mut()
            .find(|debt| debt.id == debt_id && debt.owner == owner)
            .ok_or_else(|| LedgerError::not_found("debt", debt_id))?;
        debt.paid = true;
        Ok(debt.clone())
    }

    fn categories(&self, owner: OwnerId, kind: Option<CategoryKind>) -> Result<Vec<Category>> {
        let tables = self.lock()?;
        Ok(tables
            .categories
            .iter()
            .filter(|category| category.owner == owner && kind.map_or(true, |kind| category.kind == kind))
            .cloned()
            .collect())
    }

    fn insert_category(&self, category: Category) -> Result<()> {
        let mut tables = self.lock()?;
        tables.categories.push(category);
        Ok(())
    }

    fn delete_category(&self, owner: OwnerId, category_id: CategoryId) -> Result<()> {
        let mut tables = self.lock()?;
        let before = tables.categories.len();
        tables
            .categories
            .retain(|category| !(category.id == category_id && category.owner == owner));
        if tables.categories.len() == before {
            return Err(LedgerError::not_found("category", category_id));
        }
        Ok(())
    }

    fn incomes(&self, owner: OwnerId, range: &DateRange) -> Result<Vec<IncomeRecord>> {
        let tables = self.lock()?;
        Ok(tables
            .incomes
            .iter()
            .filter(|record| record.owner == owner && range.contains(record.date))
            .cloned()
            .collect())
    }

    fn expenses(&self, owner: OwnerId, range: &DateRange) -> Result<Vec<ExpenseRecord>> {
        let tables = self.lock()?;
        Ok(tables
            .expenses
            .iter()
            .filter(|record| record.owner == owner && range.contains(record.date))
            .cloned()
            .collect())
    }

    fn insert_income(&self, record: IncomeRecord) -> Result<()> {
        let mut tables = self.lock()?;
        tables.incomes.push(record);
        Ok(())
    }

    fn insert_expense(&self, record: ExpenseRecord) -> Result<()> {
        let mut tables = self.lock()?;
        tables.expenses.push(record);
        Ok(())
    }

    fn delete_income(&self, owner: OwnerId, record_id: RecordId) -> Result<()> {
        let mut tables = self.lock()?;
        let before = tables.incomes.len();
        tables
            .incomes
            .retain(|record| !(record.id == record_id && record.owner == owner));
        if tables.incomes.len() == before {
            return Err(LedgerError::not_found("income", record_id));
        }
        Ok(())
    }

    fn delete_expense(&self, owner: OwnerId, record_id: RecordId) -> Result<()> {
        let mut tables = self.lock()?;
        let before = tables.expenses.len();
        tables
            .expenses
            .retain(|record| !(record.id == record_id && record.owner == owner));
        if tables.expenses.len() == before {
            return Err(LedgerError::not_found("expense", record_id));
        }
        Ok(())
    }

    fn investments(&self, owner: OwnerId) -> Result<Vec<Investment>> {
        let tables = self.lock()?;
        Ok(tables
            .investments
            .iter()
            .filter(|investment| investment.owner == owner)
            .cloned()
            .collect())
    }

    fn insert_investment(&self, investment: Investment) -> Result<()> {
        let mut tables = self.lock()?;
        tables.investments.push(investment);
        Ok(())
    }

    fn update_investment_value(&self, investment_id: InvestmentId, value: Money, date: NaiveDate) -> Result<Money> {
        let mut tables = self.lock()?;
        let investment = tables
            .investments
            .iter_mut()
            .find(|investment| investment.id == investment_id)
            .ok_or_else(|| LedgerError::not_found("investment", investment_id))?;
        investment.revalue(value, date)
    }

    fn latest_savings(&self, owner: OwnerId) -> Result<Option<SavingsSnapshot>> {
        let tables = self.lock()?;
        // later inserts win ties on date
        Ok(tables
            .savings
            .iter()
            .filter(|snapshot| snapshot.owner == owner)
            .fold(None::<&SavingsSnapshot>, |latest, snapshot| match latest {
                Some(current) if current.date > snapshot.date => Some(current),
                _ => Some(snapshot),
            })
            .cloned())
    }

    fn insert_savings(&self, snapshot: SavingsSnapshot) -> Result<()> {
        let mut tables = self.lock()?;
        tables.savings.push(snapshot);
        Ok(())
    }

    fn budget_plan(&self, owner: OwnerId, period: MonthPeriod) -> Result<Option<BudgetPlan>> {
        let tables = self.lock()?;
        Ok(tables
            .budget_plans
            .iter()
            .find(|plan| plan.owner == owner && plan.period == period)
            .cloned())
    }

    fn budget_plan_by_id(&self, plan_id: BudgetPlanId) -> Result<BudgetPlan> {
        let tables = self.lock()?;
        tables
            .budget_plans
            .iter()
            .find(|plan| plan.id == plan_id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("budget plan", plan_id))
    }

    fn save_budget_plan(&self, plan: BudgetPlan) -> Result<()> {
        let mut tables = self.lock()?;
        tables
            .budget_plans
            .retain(|existing| existing.id != plan.id && !(existing.owner == plan.owner && existing.period == plan.period));
        tables.budget_plans.push(plan);
        Ok(())
    }

    fn delete_budget_plan(&self, owner: OwnerId, plan_id: BudgetPlanId) -> Result<()> {
        let mut tables = self.lock()?;
        let before = tables.budget_plans.len();
        tables
            .budget_plans
            .retain(|plan| !(plan.id == plan_id && plan.owner == owner));
        if tables.budget_plans.len() == before {
            return Err(LedgerError::not_found("budget plan", plan_id));
        }
        Ok(())
    }

    fn recent_budget_plans(&self, owner: OwnerId, limit: usize) -> Result<Vec<BudgetPlan>> {
        let tables = self.lock()?;
        let mut plans: Vec<BudgetPlan> = tables
            .budget_plans
            .iter()
            .filter(|plan| plan.owner == owner)
            .cloned()
            .collect();
        plans.sort_by(|a, b| b.period.cmp(&a.period));
        plans.truncate(limit);
        Ok(plans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loan() -> Loan {
        Loan::new(
            1,
            "bank",
            Money::from_major(1_000),
            12,
            Rate::from_percentage(12),
            Money::from_major(10_000),
            date(2024, 1, 1),
        )
        .unwrap()
    }

    fn plan(owner: OwnerId, year: i32, month: u32) -> BudgetPlan {
        BudgetPlan::new(
            owner,
            MonthPeriod::new(year, month).unwrap(),
            BTreeMap::new(),
            BTreeMap::new(),
            Money::ZERO,
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_failed_commit_writes_nothing() {
        let store = MemoryStore::new();
        let loan = loan();
        let loan_id = loan.id;
        store.insert_loan(loan.clone()).unwrap();

        let result = store.commit_loan_payment(loan_id, &mut |loan: &mut Loan| {
            loan.remaining_principal = Money::ZERO;
            Err(LedgerError::InvalidAmount { amount: Money::ZERO })
        });

        assert!(result.is_err());
        assert_eq!(store.loan(loan_id).unwrap(), loan);
        assert!(store.loan_payments(loan_id).unwrap().is_empty());
    }

    #[test]
    fn test_commit_writes_loan_and_payment() {
        let store = MemoryStore::new();
        let loan = loan();
        let loan_id = loan.id;
        store.insert_loan(loan).unwrap();

        let updated = store
            .commit_loan_payment(loan_id, &mut |loan: &mut Loan| {
                loan.elapsed_months += 1;
                Ok(LoanPayment {
                    id: Uuid::new_v4(),
                    loan_id: loan.id,
                    date: date(2024, 2, 1),
                    amount: Money::from_major(1_000),
                    kind: crate::types::PaymentKind::Regular,
                    interest_portion: Money::from_major(100),
                    principal_portion: Money::from_major(900),
                    note: None,
                })
            })
            .unwrap();

        assert_eq!(updated.elapsed_months, 1);
        assert_eq!(store.loan(loan_id).unwrap().elapsed_months, 1);
        assert_eq!(store.loan_payments(loan_id).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_ids_are_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(store.loan(Uuid::new_v4()), Err(LedgerError::NotFound { .. })));
        assert!(matches!(store.delete_expense(1, Uuid::new_v4()), Err(LedgerError::NotFound { .. })));
        assert!(matches!(store.budget_plan_by_id(Uuid::new_v4()), Err(LedgerError::NotFound { .. })));
    }

    #[test]
    fn test_record_delete_is_owner_scoped() {
        let store = MemoryStore::new();
        let record = ExpenseRecord::new(1, Money::from_major(100), None, date(2024, 5, 5)).unwrap();
        let record_id = record.id;
        store.insert_expense(record).unwrap();

        assert!(store.delete_expense(2, record_id).is_err());
        store.delete_expense(1, record_id).unwrap();

        let may = MonthPeriod::new(2024, 5).unwrap().date_range();
        assert!(store.expenses(1, &may).unwrap().is_empty());
    }

    #[test]
    fn test_budget_plan_unique_per_period() {
        let store = MemoryStore::new();
        store.save_budget_plan(plan(1, 2024, 5)).unwrap();
        let replacement = plan(1, 2024, 5);
        let replacement_id = replacement.id;
        store.save_budget_plan(replacement).unwrap();
        store.save_budget_plan(plan(1, 2024, 7)).unwrap();
        store.save_budget_plan(plan(1, 2024, 6)).unwrap();
        store.save_budget_plan(plan(2, 2024, 8)).unwrap();

        let recent = store.recent_budget_plans(1, 10).unwrap();
        let periods: Vec<String> = recent.iter().map(|p| p.period.to_string()).collect();
        assert_eq!(periods, vec!["2024-07", "2024-06", "2024-05"]);
        assert_eq!(recent[2].id, replacement_id);
        assert_eq!(store.recent_budget_plans(1, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_latest_savings() {
        let store = MemoryStore::new();
        assert!(store.latest_savings(1).unwrap().is_none());
        store.insert_savings(SavingsSnapshot::new(1, Money::from_major(100), date(2024, 3, 1)).unwrap()).unwrap();
        store.insert_savings(SavingsSnapshot::new(1, Money::from_major(300), date(2024, 4, 1)).unwrap()).unwrap();
        store.insert_savings(SavingsSnapshot::new(1, Money::from_major(200), date(2024, 2, 1)).unwrap()).unwrap();

        assert_eq!(store.latest_savings(1).unwrap().unwrap().amount, Money::from_major(300));
    }

    #[test]
    fn test_deleting_category_keeps_records() {
        let store = MemoryStore::new();
        let food = Category::new(1, "food", CategoryKind::Expense);
        let food_id = food.id;
        store.insert_category(food).unwrap();
        store
            .insert_expense(ExpenseRecord::new(1, Money::from_major(50), Some(food_id), date(2024, 5, 2)).unwrap())
            .unwrap();

        store.delete_category(1, food_id).unwrap();

        assert!(store.categories(1, Some(CategoryKind::Expense)).unwrap().is_empty());
        let may = MonthPeriod::new(2024, 5).unwrap().date_range();
        assert_eq!(store.expenses(1, &may).unwrap()[0].category_id, Some(food_id));
    }

    #[test]
    fn test_concurrent_commits_lose_no_update() {
        use crate::payments::{apply_payment, PaymentRequest};
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(MemoryStore::new());
        let loan = loan();
        let loan_id = loan.id;
        store.insert_loan(loan.clone()).unwrap();

        // equal payments give the same end state in any order
        let request = PaymentRequest::regular(loan_id, Money::from_major(1_000), date(2024, 2, 1));
        let mut expected = loan;
        for _ in 0..8 {
            apply_payment(&mut expected, &request).unwrap();
        }

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let request = request.clone();
                thread::spawn(move || {
                    store
                        .commit_loan_payment(loan_id, &mut |loan: &mut Loan| {
                            thread::yield_now();
                            Ok(apply_payment(loan, &request)?.payment)
                        })
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stored = store.loan(loan_id).unwrap();
        assert_eq!(stored.elapsed_months, 8);
        assert_eq!(stored.remaining_principal, expected.remaining_principal);
        assert_eq!(store.loan_payments(loan_id).unwrap().len(), 8);
    }
}
