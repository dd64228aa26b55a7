pub mod forecast;
pub mod tracker;

pub use forecast::{project_loan_payments, MonthForecast, ScheduledLoanPayment};
pub use tracker::{BudgetCheck, BudgetSuggestion, BudgetTracker, CategoryVariance, PlanVsActual};
