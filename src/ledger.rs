use std::collections::BTreeMap;

use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use log::info;

use crate::budget::{BudgetCheck, BudgetTracker};
use crate::calendar::{DateRange, MonthPeriod};
use crate::config::EngineConfig;
use crate::decimal::Money;
use crate::entities::{
    BudgetPlan, Category, CategoryAmounts, ExpenseRecord, IncomeRecord, Investment, Loan, LoanCapabilities,
    LoanHoliday, PeerDebt, SavingsSnapshot,
};
use crate::errors::{LedgerError, Result};
use crate::events::{EventStore, LedgerEvent};
use crate::net_worth::{NetWorthAggregator, NetWorthBreakdown};
use crate::payments::{
    apply_early_payment, apply_payment, AmortizationSchedule, AppliedPayment, EarlyPaymentOutcome, PaymentRequest,
    PayoffPlan, PayoffStrategyAdvisor,
};
use crate::report::FinancialReport;
use crate::store::LedgerStore;
use crate::summary::{CategorySummarizer, CategorySummary};
use crate::types::{
    BudgetPlanId, CategoryId, CategoryKind, DebtId, EarlyPaymentPolicy, InvestmentId, LoanId, OwnerId, RecordId,
};

/// entry point tying the engine to a store
///
/// mutating calls validate first, write through the store and then emit
/// events; a failed call emits nothing.
pub struct Ledger<S: LedgerStore> {
    store: S,
    config: EngineConfig,
    events: EventStore,
}

impl<S: LedgerStore> Ledger<S> {
    pub fn new(store: S, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            events: EventStore::new(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn events(&self) -> &[LedgerEvent] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        self.events.take_events()
    }

    pub fn budgets(&self) -> BudgetTracker<'_> {
        BudgetTracker::new(&self.store, self.config.budget.clone())
    }

    pub fn advisor(&self) -> PayoffStrategyAdvisor {
        PayoffStrategyAdvisor::new(self.config.advisor.clone())
    }

    // loans

    /// store a new loan, telling it apart from active loans of the same lender
    pub fn add_loan(&mut self, mut loan: Loan) -> Result<Loan> {
        let existing = self.store.loans(loan.owner, true)?;
        loan.disambiguate_name(&existing);
        self.store.insert_loan(loan.clone())?;
        info!(
            "loan {} added for owner {}: {} at {}, {} months",
            loan.id, loan.owner, loan.remaining_principal, loan.interest_rate, loan.total_term_months
        );
        Ok(loan)
    }

    pub fn loans(&self, owner: OwnerId) -> Result<Vec<Loan>> {
        self.store.loans(owner, true)
    }

    pub fn set_loan_capabilities(&mut self, loan_id: LoanId, capabilities: LoanCapabilities) -> Result<Loan> {
        self.store.update_loan_capabilities(loan_id, capabilities)
    }

    pub fn record_regular_payment(
        &mut self,
        loan_id: LoanId,
        amount: Money,
        date: NaiveDate,
        time: &SafeTimeProvider,
    ) -> Result<AppliedPayment> {
        self.record_payment(&PaymentRequest::regular(loan_id, amount, date), time)
    }

    /// prepay part or all of a loan; paying the whole balance closes it
    pub fn record_early_payment(
        &mut self,
        loan_id: LoanId,
        amount: Money,
        policy: EarlyPaymentPolicy,
        date: NaiveDate,
        time: &SafeTimeProvider,
    ) -> Result<AppliedPayment> {
        self.record_payment(&PaymentRequest::early(loan_id, amount, policy, date), time)
    }

    /// apply a payment and append it to the log as one store commit
    pub fn record_payment(&mut self, request: &PaymentRequest, time: &SafeTimeProvider) -> Result<AppliedPayment> {
        let mut applied = None;
        self.store.commit_loan_payment(request.loan_id, &mut |loan: &mut Loan| {
            let result = apply_payment(loan, request)?;
            let payment = result.payment.clone();
            applied = Some(result);
            Ok(payment)
        })?;
        let applied = applied.ok_or_else(|| LedgerError::Storage {
            message: format!("payment on loan {} was not applied", request.loan_id),
        })?;

        let now = time.now();
        self.events.emit(LedgerEvent::LoanPaymentRecorded {
            loan_id: request.loan_id,
            amount: applied.payment.amount,
            kind: applied.payment.kind,
            interest_portion: applied.payment.interest_portion,
            principal_portion: applied.payment.principal_portion,
            new_balance: applied.new_balance,
            date: applied.payment.date,
            timestamp: now,
        });
        if let Some(outcome) = &applied.early {
            self.events.emit(LedgerEvent::EarlyPaymentApplied {
                loan_id: request.loan_id,
                amount: outcome.amount,
                kind: outcome.kind,
                months_saved: outcome.months_saved,
                amount_saved: outcome.amount_saved,
                timestamp: now,
            });
        }
        if applied.closed {
            info!("loan {} closed", request.loan_id);
            self.events.emit(LedgerEvent::LoanClosed {
                loan_id: request.loan_id,
                final_payment: applied.payment.amount,
                timestamp: now,
            });
        }

        info!(
            "{:?} payment {} on loan {}, balance {}",
            applied.payment.kind, applied.payment.amount, request.loan_id, applied.new_balance
        );
        Ok(applied)
    }

    /// what an early payment would do, without recording it
    pub fn preview_early_payment(
        &self,
        loan_id: LoanId,
        amount: Money,
        policy: EarlyPaymentPolicy,
    ) -> Result<EarlyPaymentOutcome> {
        let loan = self.store.loan(loan_id)?;
        loan.ensure_active()?;
        apply_early_payment(&loan, amount, policy)
    }

    pub fn record_payment_holiday(
        &mut self,
        loan_id: LoanId,
        start: NaiveDate,
        end: NaiveDate,
        time: &SafeTimeProvider,
    ) -> Result<LoanHoliday> {
        let loan = self.store.loan(loan_id)?;
        loan.ensure_active()?;
        loan.ensure_holiday_allowed()?;

        let holiday = LoanHoliday::new(loan_id, start, end)?;
        self.store.insert_holiday(holiday.clone())?;
        self.events.emit(LedgerEvent::PaymentHolidayRecorded {
            loan_id,
            start,
            end,
            timestamp: time.now(),
        });
        info!("payment holiday {}..{} on loan {}", start, end, loan_id);
        Ok(holiday)
    }

    pub fn loan_schedule(&self, loan_id: LoanId) -> Result<AmortizationSchedule> {
        AmortizationSchedule::project(&self.store.loan(loan_id)?)
    }

    pub fn payoff_advice(&self, owner: OwnerId) -> Result<Option<PayoffPlan>> {
        Ok(self.advisor().recommend(&self.store.loans(owner, true)?))
    }

    // peer debts

    pub fn add_debt(&mut self, debt: PeerDebt) -> Result<PeerDebt> {
        self.store.insert_debt(debt.clone())?;
        Ok(debt)
    }

    pub fn settle_debt(&mut self, owner: OwnerId, debt_id: DebtId, time: &SafeTimeProvider) -> Result<PeerDebt> {
        let debt = self.store.mark_debt_paid(owner, debt_id)?;
        self.events.emit(LedgerEvent::DebtSettled {
            debt_id,
            amount: debt.amount,
            timestamp: time.now(),
        });
        info!("debt {} with {} settled", debt_id, debt.person);
        Ok(debt)
    }

    // categories and records

    pub fn add_category(&mut self, category: Category) -> Result<Category> {
        self.store.insert_category(category.clone())?;
        Ok(category)
    }

    pub fn delete_category(&mut self, owner: OwnerId, category_id: CategoryId) -> Result<()> {
        self.store.delete_category(owner, category_id)
    }

    pub fn record_income(&mut self, record: IncomeRecord) -> Result<IncomeRecord> {
        self.store.insert_income(record.clone())?;
        Ok(record)
    }

    /// store an expense and report how it sits against the month's plan
    ///
    /// the check is advisory: the expense is recorded either way.
    pub fn record_expense(&mut self, record: ExpenseRecord, time: &SafeTimeProvider) -> Result<Option<BudgetCheck>> {
        let check = match record.category_id {
            Some(category_id) => Some(self.budgets().check_expense_against_plan(
                record.owner,
                category_id,
                record.amount,
                record.date,
            )?),
            None => None,
        };

        self.store.insert_expense(record.clone())?;

        if let (Some(check), Some(category_id)) = (&check, record.category_id) {
            if check.over_budget {
                info!(
                    "owner {} over budget in category {} for {}: {} of {}",
                    record.owner, category_id, check.period, check.spent_after, check.category_planned
                );
                self.events.emit(LedgerEvent::BudgetExceeded {
                    owner: record.owner,
                    category_id,
                    period: check.period,
                    planned: check.category_planned,
                    spent_after: check.spent_after,
                    timestamp: time.now(),
                });
            }
        }
        Ok(check)
    }

    pub fn delete_income(&mut self, owner: OwnerId, record_id: RecordId) -> Result<()> {
        self.store.delete_income(owner, record_id)
    }

    pub fn delete_expense(&mut self, owner: OwnerId, record_id: RecordId) -> Result<()> {
        self.store.delete_expense(owner, record_id)
    }

    // investments and savings

    pub fn add_investment(&mut self, investment: Investment) -> Result<Investment> {
        self.store.insert_investment(investment.clone())?;
        Ok(investment)
    }

    pub fn revalue_investment(
        &mut self,
        investment_id: InvestmentId,
        value: Money,
        date: NaiveDate,
        time: &SafeTimeProvider,
    ) -> Result<Money> {
        let old_value = self.store.update_investment_value(investment_id, value, date)?;
        self.events.emit(LedgerEvent::InvestmentRevalued {
            investment_id,
            old_value,
            new_value: value,
            timestamp: time.now(),
        });
        Ok(old_value)
    }

    pub fn record_savings(&mut self, owner: OwnerId, amount: Money, date: NaiveDate) -> Result<SavingsSnapshot> {
        let snapshot = SavingsSnapshot::new(owner, amount, date)?;
        self.store.insert_savings(snapshot.clone())?;
        Ok(snapshot)
    }

    // budgets

    pub fn upsert_budget(
        &mut self,
        owner: OwnerId,
        period: MonthPeriod,
        income_categories: CategoryAmounts,
        expense_categories: CategoryAmounts,
        credit_expenses: Money,
        notes: Option<String>,
        time: &SafeTimeProvider,
    ) -> Result<BudgetPlan> {
        let plan = self.budgets().upsert_budget(
            owner,
            period,
            income_categories,
            expense_categories,
            credit_expenses,
            notes,
        )?;
        self.events.emit(LedgerEvent::BudgetUpserted {
            owner,
            plan_id: plan.id,
            period,
            planned_income: plan.planned_income,
            planned_expenses: plan.planned_expenses,
            timestamp: time.now(),
        });
        Ok(plan)
    }

    pub fn update_budget_category(
        &mut self,
        owner: OwnerId,
        plan_id: BudgetPlanId,
        kind: CategoryKind,
        category_id: CategoryId,
        amount: Money,
        time: &SafeTimeProvider,
    ) -> Result<BudgetPlan> {
        let plan = self
            .budgets()
            .update_single_category(owner, plan_id, kind, category_id, amount)?;
        self.events.emit(LedgerEvent::BudgetCategoryUpdated {
            plan_id,
            kind,
            category_id,
            amount,
            timestamp: time.now(),
        });
        Ok(plan)
    }

    // aggregates

    /// net worth from the latest savings snapshot and current balances
    pub fn net_worth(&self, owner: OwnerId) -> Result<NetWorthBreakdown> {
        let savings = self
            .store
            .latest_savings(owner)?
            .map(|snapshot| snapshot.amount)
            .unwrap_or(Money::ZERO);
        Ok(NetWorthAggregator::compute(
            savings,
            &self.store.loans(owner, false)?,
            &self.store.debts(owner, true)?,
            &self.store.investments(owner)?,
        ))
    }

    pub fn category_summary(&self, owner: OwnerId, range: &DateRange) -> Result<CategorySummary> {
        Ok(CategorySummarizer::summarize(
            &self.store.incomes(owner, range)?,
            &self.store.expenses(owner, range)?,
            &self.store.categories(owner, None)?,
        ))
    }

    /// category labels keyed by id, for callers rendering budget maps
    pub fn category_labels(&self, owner: OwnerId) -> Result<BTreeMap<CategoryId, String>> {
        Ok(self
            .store
            .categories(owner, None)?
            .into_iter()
            .map(|category| (category.id, category.label))
            .collect())
    }

    pub fn report(&self, owner: OwnerId, time: &SafeTimeProvider) -> Result<FinancialReport> {
        FinancialReport::generate(&self.store, owner, &self.config, time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::store::MemoryStore;
    use crate::types::{DebtDirection, PaymentKind};
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;

    const OWNER: OwnerId = 100;

    fn time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2024, 11, 5, 10, 0, 0).unwrap()))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ledger() -> Ledger<MemoryStore> {
        Ledger::new(MemoryStore::new(), EngineConfig::default()).unwrap()
    }

    fn loan(lender: &str, payment: i64, balance: i64) -> Loan {
        Loan::new(
            OWNER,
            lender,
            Money::from_major(payment),
            40,
            Rate::from_percent(dec!(12)),
            Money::from_major(balance),
            date(2024, 1, 5),
        )
        .unwrap()
        .with_elapsed_months(10)
        .unwrap()
    }

    #[test]
    fn test_add_loan_disambiguates_lender() {
        let mut ledger = ledger();
        ledger.add_loan(loan("Sber", 15_000, 500_000)).unwrap();
        let second = ledger.add_loan(loan("Sber", 7_500, 100_000)).unwrap();
        let other = ledger.add_loan(loan("VTB", 7_500, 100_000)).unwrap();

        assert_eq!(second.display_name, "Sber 7500");
        assert_eq!(other.display_name, "VTB");
    }

    #[test]
    fn test_payments_are_logged_and_evented() {
        let mut ledger = ledger();
        let time = time();
        let loan = ledger.add_loan(loan("Sber", 15_000, 500_000)).unwrap();

        ledger
            .record_regular_payment(loan.id, Money::from_major(15_000), date(2024, 11, 5), &time)
            .unwrap();
        let applied = ledger
            .record_early_payment(
                loan.id,
                Money::from_major(100_000),
                EarlyPaymentPolicy::ReduceTerm,
                date(2024, 11, 6),
                &time,
            )
            .unwrap();

        assert_eq!(applied.new_balance, Money::from_major(390_000));
        let stored = ledger.store().loan(loan.id).unwrap();
        assert_eq!(stored.remaining_principal, Money::from_major(390_000));
        assert_eq!(stored.elapsed_months, 12);

        let log = ledger.store().loan_payments(loan.id).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].kind, PaymentKind::EarlyReduceTerm);

        let events = ledger.take_events();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[2], LedgerEvent::EarlyPaymentApplied { .. }));
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn test_failed_payment_changes_nothing() {
        let mut ledger = ledger();
        let time = time();
        let loan = ledger.add_loan(loan("Sber", 15_000, 500_000)).unwrap();

        let result = ledger.record_early_payment(
            loan.id,
            Money::from_major(900_000),
            EarlyPaymentPolicy::ReducePayment,
            date(2024, 11, 6),
            &time,
        );

        assert!(matches!(result, Err(LedgerError::InvalidAmount { .. })));
        assert_eq!(ledger.store().loan(loan.id).unwrap(), loan);
        assert!(ledger.store().loan_payments(loan.id).unwrap().is_empty());
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn test_full_payoff_closes_and_leaves_active_list() {
        let mut ledger = ledger();
        let time = time();
        let loan = ledger.add_loan(loan("Sber", 15_000, 500_000)).unwrap();

        let applied = ledger
            .record_payment(&PaymentRequest::payoff(&loan, date(2024, 11, 6)), &time)
            .unwrap();

        assert!(applied.closed);
        assert!(ledger.loans(OWNER).unwrap().is_empty());
        assert!(ledger
            .events()
            .iter()
            .any(|event| matches!(event, LedgerEvent::LoanClosed { .. })));
        assert_eq!(ledger.net_worth(OWNER).unwrap().total_loans, Money::ZERO);
    }

    #[test]
    fn test_holiday_requires_capability() {
        let mut ledger = ledger();
        let time = time();
        let loan = ledger.add_loan(loan("Sber", 15_000, 500_000)).unwrap();
        ledger
            .record_payment_holiday(loan.id, date(2024, 12, 1), date(2025, 1, 31), &time)
            .unwrap();

        ledger
            .set_loan_capabilities(
                loan.id,
                LoanCapabilities {
                    payment_holiday: false,
                    ..LoanCapabilities::default()
                },
            )
            .unwrap();
        let denied = ledger.record_payment_holiday(loan.id, date(2025, 3, 1), date(2025, 3, 31), &time);
        assert!(matches!(denied, Err(LedgerError::OperationNotAllowed { .. })));
        assert_eq!(ledger.store().holidays(loan.id).unwrap().len(), 1);
    }

    #[test]
    fn test_expense_over_plan_emits_event_but_is_recorded() {
        let mut ledger = ledger();
        let time = time();
        let food = ledger
            .add_category(Category::new(OWNER, "food", CategoryKind::Expense))
            .unwrap();
        ledger
            .upsert_budget(
                OWNER,
                MonthPeriod::new(2024, 11).unwrap(),
                BTreeMap::new(),
                BTreeMap::from([(food.id, Money::from_major(10_000))]),
                Money::ZERO,
                None,
                &time,
            )
            .unwrap();

        let first = ExpenseRecord::new(OWNER, Money::from_major(9_500), Some(food.id), date(2024, 11, 2)).unwrap();
        let check = ledger.record_expense(first, &time).unwrap().unwrap();
        assert!(!check.over_budget);

        let second = ExpenseRecord::new(OWNER, Money::from_major(1_000), Some(food.id), date(2024, 11, 4)).unwrap();
        let check = ledger.record_expense(second, &time).unwrap().unwrap();
        assert!(check.over_budget);
        assert_eq!(check.percent_used, dec!(105));

        let november = MonthPeriod::new(2024, 11).unwrap().date_range();
        assert_eq!(ledger.store().expenses(OWNER, &november).unwrap().len(), 2);
        assert!(ledger
            .events()
            .iter()
            .any(|event| matches!(event, LedgerEvent::BudgetExceeded { .. })));
    }

    #[test]
    fn test_net_worth_uses_latest_savings_and_unpaid_debts() {
        let mut ledger = ledger();
        let time = time();
        ledger.record_savings(OWNER, Money::from_major(10_000), date(2024, 1, 1)).unwrap();
        ledger.record_savings(OWNER, Money::from_major(50_000), date(2024, 10, 1)).unwrap();
        ledger.add_loan(loan("Sber", 15_000, 100_000)).unwrap();
        let lent = ledger
            .add_debt(PeerDebt::new(OWNER, "Ivan", Money::from_major(20_000), DebtDirection::Given, date(2024, 5, 1)).unwrap())
            .unwrap();
        ledger
            .add_debt(PeerDebt::new(OWNER, "Anna", Money::from_major(5_000), DebtDirection::Taken, date(2024, 5, 1)).unwrap())
            .unwrap();
        let etf = ledger
            .add_investment(
                Investment::new(OWNER, "ETF", Money::from_major(30_000), Money::from_major(30_000), date(2024, 2, 1)).unwrap(),
            )
            .unwrap();
        ledger
            .revalue_investment(etf.id, Money::from_major(35_000), date(2024, 11, 1), &time)
            .unwrap();

        let before = ledger.net_worth(OWNER).unwrap();
        assert_eq!(before.total_assets, Money::from_major(105_000));
        assert_eq!(before.total_liabilities, Money::from_major(105_000));
        assert_eq!(before.net_worth, Money::ZERO);

        ledger.settle_debt(OWNER, lent.id, &time).unwrap();
        let after = ledger.net_worth(OWNER).unwrap();
        assert_eq!(after.total_debts_given, Money::ZERO);
        assert_eq!(after.net_worth, Money::from_major(-20_000));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.budget.forecast_months = 0;
        assert!(matches!(
            Ledger::new(MemoryStore::new(), config),
            Err(LedgerError::InvalidConfiguration { .. })
        ));
    }
}
