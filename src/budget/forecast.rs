use std::collections::HashMap;

use hourglass_rs::SafeTimeProvider;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::calendar::{add_months, MonthPeriod};
use crate::decimal::Money;
use crate::entities::{Loan, LoanHoliday};
use crate::errors::Result;
use crate::payments::AmortizationModel;
use crate::types::{LoanId, OwnerId};

use super::tracker::BudgetTracker;

/// one loan's contractual payment inside a forecast month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledLoanPayment {
    pub loan_id: LoanId,
    pub display_name: String,
    pub amount: Money,
    /// 1-based installment number
    pub installment: u32,
}

/// projected cash flow of one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthForecast {
    pub period: MonthPeriod,
    pub has_plan: bool,
    pub planned_income: Money,
    pub planned_expenses: Money,
    /// contractual total the plan itself carries, informational
    pub planned_credit_expenses: Money,
    pub loan_payments: Vec<ScheduledLoanPayment>,
    pub total_loan_payments: Money,
    /// planned income minus planned expenses minus loan payments
    pub projected_balance: Money,
}

impl<'a> BudgetTracker<'a> {
    /// cash-flow projection for the current month and the ones after it
    ///
    /// months without a plan still carry their loan obligations.
    pub fn forecast(&self, owner: OwnerId, months_ahead: u32, time: &SafeTimeProvider) -> Result<Vec<MonthForecast>> {
        let current = MonthPeriod::containing(time.now().date_naive());
        let loans = self.store.loans(owner, true)?;

        let mut holidays = HashMap::new();
        for loan in &loans {
            holidays.insert(loan.id, self.store.holidays(loan.id)?);
        }
        let schedule = project_loan_payments(&loans, &holidays, current, months_ahead)?;

        let mut forecast = Vec::with_capacity(schedule.len());
        for (period, loan_payments) in current.iter(months_ahead).zip(schedule) {
            let plan = self.store.budget_plan(owner, period)?;
            let total_loan_payments: Money = loan_payments.iter().map(|p| p.amount).sum();

            let (planned_income, planned_expenses, planned_credit_expenses) = match &plan {
                Some(plan) => (plan.planned_income, plan.planned_expenses, plan.credit_expenses),
                None => (Money::ZERO, Money::ZERO, Money::ZERO),
            };

            forecast.push(MonthForecast {
                period,
                has_plan: plan.is_some(),
                planned_income,
                planned_expenses,
                planned_credit_expenses,
                projected_balance: planned_income - planned_expenses - total_loan_payments,
                total_loan_payments,
                loan_payments,
            });
        }

        debug!("forecast for owner {}: {} months from {}", owner, months_ahead, current);
        Ok(forecast)
    }

    /// forecast over the configured horizon
    pub fn forecast_default(&self, owner: OwnerId, time: &SafeTimeProvider) -> Result<Vec<MonthForecast>> {
        self.forecast(owner, self.config.forecast_months, time)
    }
}

/// contractual loan payments for `months` consecutive periods from `first`
///
/// the month of the loan's next due date takes its next installment and each
/// later month the one after it, while installments remain. months before the
/// next due date carry nothing. a month whose due date falls inside a payment
/// holiday is skipped and pushes the rest back by a month.
pub fn project_loan_payments(
    loans: &[Loan],
    holidays: &HashMap<LoanId, Vec<LoanHoliday>>,
    first: MonthPeriod,
    months: u32,
) -> Result<Vec<Vec<ScheduledLoanPayment>>> {
    let mut projected = vec![Vec::new(); months as usize];

    for loan in loans.iter().filter(|loan| loan.active) {
        let start_period = MonthPeriod::containing(loan.start_date);
        let first_due = MonthPeriod::containing(AmortizationModel::next_payment_date(loan)?);
        let loan_holidays = holidays.get(&loan.id).map(Vec::as_slice).unwrap_or(&[]);
        let mut installment = loan.elapsed_months;

        for (index, period) in first.iter(months).enumerate() {
            if installment >= loan.total_term_months {
                break;
            }
            if period < first_due {
                continue;
            }

            let offset = start_period.months_until(period);
            if offset > 0 {
                let due = add_months(loan.start_date, offset as u32)?;
                if loan_holidays.iter().any(|holiday| holiday.covers(due)) {
                    debug!("loan {} payment due {} falls in a holiday", loan.id, due);
                    continue;
                }
            }

            installment += 1;
            projected[index].push(ScheduledLoanPayment {
                loan_id: loan.id,
                display_name: loan.display_name.clone(),
                amount: loan.monthly_payment,
                installment,
            });
        }
    }

    Ok(projected)
}
