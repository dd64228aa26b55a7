pub mod budget;
pub mod calendar;
pub mod config;
pub mod decimal;
pub mod entities;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod net_worth;
pub mod payments;
pub mod report;
pub mod store;
pub mod summary;
pub mod types;

// re-export key types
pub use budget::{BudgetCheck, BudgetSuggestion, BudgetTracker, MonthForecast, PlanVsActual};
pub use calendar::{add_months, DateRange, MonthPeriod};
pub use config::{AdvisorConfig, BudgetConfig, EngineConfig, ReportConfig};
pub use decimal::{Money, Rate};
pub use entities::{
    BudgetPlan, CategorizedRecord, Category, CategoryAmounts, ExpenseRecord, IncomeRecord, Investment, Loan,
    LoanCapabilities, LoanHoliday, LoanPayment, PeerDebt, SavingsSnapshot,
};
pub use errors::{LedgerError, Result};
pub use events::{EventStore, LedgerEvent};
pub use ledger::Ledger;
pub use net_worth::{NetWorthAggregator, NetWorthBreakdown};
pub use payments::{
    AmortizationModel, AmortizationSchedule, AppliedPayment, EarlyPaymentOutcome, PaymentRequest, PaymentSplit,
    PayoffPlan, PayoffStrategyAdvisor,
};
pub use report::{FinancialRatios, FinancialReport};
pub use store::{LedgerStore, MemoryStore};
pub use summary::{CategoryShare, CategorySummarizer, CategorySummary, UNCATEGORIZED};
pub use types::{
    BudgetPlanId, CategoryId, CategoryKind, DebtDirection, DebtId, EarlyPaymentPolicy, InvestmentId, LoanId,
    LoanStatus, OwnerId, PaymentKind, PayoffStrategy, RecordId,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
