pub mod budget;
pub mod holdings;
pub mod loan;
pub mod records;

pub use budget::{BudgetPlan, CategoryAmounts};
pub use holdings::{Investment, PeerDebt, SavingsSnapshot};
pub use loan::{Loan, LoanCapabilities, LoanHoliday, LoanPayment};
pub use records::{CategorizedRecord, Category, ExpenseRecord, IncomeRecord};
