pub mod memory;

use chrono::NaiveDate;

use crate::calendar::{DateRange, MonthPeriod};
use crate::decimal::Money;
use crate::entities::{
    BudgetPlan, Category, ExpenseRecord, IncomeRecord, Investment, Loan, LoanCapabilities, LoanHoliday, LoanPayment,
    PeerDebt, SavingsSnapshot,
};
use crate::errors::Result;
use crate::types::{BudgetPlanId, CategoryId, CategoryKind, DebtId, InvestmentId, LoanId, OwnerId, RecordId};

pub use memory::MemoryStore;

/// data-access layer the engine reads from and writes through
///
/// reads return consistent snapshots and writes are durable before they
/// return. every lookup by id fails with `NotFound` when nothing matches.
pub trait LedgerStore: Send + Sync {
    // loans
    fn loans(&self, owner: OwnerId, active_only: bool) -> Result<Vec<Loan>>;
    fn loan(&self, loan_id: LoanId) -> Result<Loan>;
    fn insert_loan(&self, loan: Loan) -> Result<()>;
    fn update_loan_capabilities(&self, loan_id: LoanId, capabilities: LoanCapabilities) -> Result<Loan>;

    /// read-modify-write of one loan as a single unit
    ///
    /// `apply` mutates a copy of the loan and returns the log entry; the loan
    /// and the entry are written together, or not at all when `apply` fails.
    /// no other writer may interleave for the same loan.
    fn commit_loan_payment(
        &self,
        loan_id: LoanId,
        apply: &mut dyn FnMut(&mut Loan) -> Result<LoanPayment>,
    ) -> Result<Loan>;
    fn loan_payments(&self, loan_id: LoanId) -> Result<Vec<LoanPayment>>;
    fn insert_holiday(&self, holiday: LoanHoliday) -> Result<()>;
    fn holidays(&self, loan_id: LoanId) -> Result<Vec<LoanHoliday>>;

    // peer debts
    fn debts(&self, owner: OwnerId, unpaid_only: bool) -> Result<Vec<PeerDebt>>;
    fn insert_debt(&self, debt: PeerDebt) -> Result<()>;
    fn mark_debt_paid(&self, owner: OwnerId, debt_id: DebtId) -> Result<PeerDebt>;

    // categories, `None` lists both kinds
    fn categories(&self, owner: OwnerId, kind: Option<CategoryKind>) -> Result<Vec<Category>>;
    fn insert_category(&self, category: Category) -> Result<()>;
    /// records keep their dangling reference
    fn delete_category(&self, owner: OwnerId, category_id: CategoryId) -> Result<()>;

    // income and expense records
    fn incomes(&self, owner: OwnerId, range: &DateRange) -> Result<Vec<IncomeRecord>>;
    fn expenses(&self, owner: OwnerId, range: &DateRange) -> Result<Vec<ExpenseRecord>>;
    fn insert_income(&self, record: IncomeRecord) -> Result<()>;
    fn insert_expense(&self, record: ExpenseRecord) -> Result<()>;
    fn delete_income(&self, owner: OwnerId, record_id: RecordId) -> Result<()>;
    fn delete_expense(&self, owner: OwnerId, record_id: RecordId) -> Result<()>;

    // investments and savings
    fn investments(&self, owner: OwnerId) -> Result<Vec<Investment>>;
    fn insert_investment(&self, investment: Investment) -> Result<()>;
    /// overwrite the current value, returning the previous one
    fn update_investment_value(&self, investment_id: InvestmentId, value: Money, date: NaiveDate) -> Result<Money>;
    fn latest_savings(&self, owner: OwnerId) -> Result<Option<SavingsSnapshot>>;
    fn insert_savings(&self, snapshot: SavingsSnapshot) -> Result<()>;

    // budget plans, unique per (owner, period)
    fn budget_plan(&self, owner: OwnerId, period: MonthPeriod) -> Result<Option<BudgetPlan>>;
    fn budget_plan_by_id(&self, plan_id: BudgetPlanId) -> Result<BudgetPlan>;
    /// insert, or replace the plan with the same id or the same (owner, period)
    fn save_budget_plan(&self, plan: BudgetPlan) -> Result<()>;
    fn delete_budget_plan(&self, owner: OwnerId, plan_id: BudgetPlanId) -> Result<()>;
    /// newest period first
    fn recent_budget_plans(&self, owner: OwnerId, limit: usize) -> Result<Vec<BudgetPlan>>;
}
