use chrono::NaiveDate;
use log::debug;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

use crate::calendar::add_months;
use crate::decimal::{Money, Rate};
use crate::entities::Loan;
use crate::errors::{LedgerError, Result};
use crate::types::{EarlyPaymentPolicy, LoanId};

use super::early_payment::{self, EarlyPaymentOutcome};

/// hard stop for schedule projection when a payment barely amortizes
const MAX_SCHEDULE_MONTHS: u32 = 1200;

/// fixed-term installment loan arithmetic
pub struct AmortizationModel;

impl AmortizationModel {
    /// contractual months left: total term minus elapsed months
    pub fn remaining_months(loan: &Loan) -> u32 {
        loan.remaining_months()
    }

    /// due date of the next installment: start + (elapsed + 1) whole months
    pub fn next_payment_date(loan: &Loan) -> Result<NaiveDate> {
        Self::due_date(loan, loan.elapsed_months + 1)
    }

    /// due date of the n-th installment (1-based)
    pub fn due_date(loan: &Loan, installment: u32) -> Result<NaiveDate> {
        add_months(loan.start_date, installment)
    }

    /// effect of an early payment under a recalculation policy
    pub fn apply_early_payment(
        loan: &Loan,
        extra_amount: Money,
        policy: EarlyPaymentPolicy,
    ) -> Result<EarlyPaymentOutcome> {
        early_payment::apply_early_payment(loan, extra_amount, policy)
    }

    /// interest/principal split of a regular installment against the current balance
    pub fn payment_split(loan: &Loan, amount: Money) -> Result<PaymentSplit> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount { amount });
        }

        let interest = loan
            .remaining_principal
            .monthly_interest(loan.interest_rate)
            .round_cents();
        if amount > loan.remaining_principal + interest {
            // a regular payment may not exceed what is owed this month
            return Err(LedgerError::InvalidAmount { amount });
        }

        let interest_portion = interest.min(amount);
        let principal_portion = amount - interest_portion;
        if principal_portion.is_zero() {
            debug!(
                "payment {} on loan {} covers interest only",
                amount, loan.id
            );
        }

        Ok(PaymentSplit {
            amount,
            interest_portion,
            principal_portion,
            balance_after: loan.remaining_principal - principal_portion,
        })
    }
}

/// how one regular payment divides into interest and principal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaymentSplit {
    pub amount: Money,
    pub interest_portion: Money,
    pub principal_portion: Money,
    pub balance_after: Money,
}

/// scheduled payment in a projected schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledPayment {
    pub installment: u32,
    pub due_date: NaiveDate,
    pub beginning_balance: Money,
    pub payment_amount: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    pub ending_balance: Money,
    pub cumulative_interest: Money,
}

/// remaining amortization schedule of a loan, from its next installment on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub loan_id: LoanId,
    pub payments: Vec<ScheduledPayment>,
    pub total_interest: Money,
    pub total_payment: Money,
    /// false when the installment does not cover monthly interest
    pub amortizes: bool,
}

impl AmortizationSchedule {
    /// project the remaining schedule at the loan's fixed payment
    pub fn project(loan: &Loan) -> Result<Self> {
        let monthly_rate = loan.interest_rate.monthly_rate().as_decimal();
        let mut payments = Vec::new();
        let mut balance = loan.remaining_principal;
        let mut cumulative_interest = Money::ZERO;
        let mut amortizes = true;

        let mut installment = loan.elapsed_months;
        while balance.is_positive() && payments.len() < MAX_SCHEDULE_MONTHS as usize {
            installment += 1;
            let interest_portion = Money::from_decimal(balance.as_decimal() * monthly_rate).round_cents();
            let payment_amount = loan.monthly_payment.min(balance + interest_portion);
            let principal_portion = payment_amount - interest_portion;

            if !principal_portion.is_positive() {
                debug!("loan {} payment does not cover interest; schedule stops", loan.id);
                amortizes = false;
                break;
            }

            cumulative_interest += interest_portion;
            let ending_balance = balance - principal_portion;

            payments.push(ScheduledPayment {
                installment,
                due_date: AmortizationModel::due_date(loan, installment)?,
                beginning_balance: balance,
                payment_amount,
                principal_portion,
                interest_portion,
                ending_balance,
                cumulative_interest,
            });

            balance = ending_balance;
        }

        let total_interest = payments.iter().map(|p| p.interest_portion).sum();
        let total_payment = payments.iter().map(|p| p.payment_amount).sum();

        Ok(Self {
            loan_id: loan.id,
            payments,
            total_interest,
            total_payment,
            amortizes,
        })
    }

    pub fn len(&self) -> usize {
        self.payments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }

    /// payments due within [from, to]
    pub fn due_between(&self, from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = &ScheduledPayment> {
        self.payments
            .iter()
            .filter(move |p| from <= p.due_date && p.due_date <= to)
    }
}

/// standard annuity payment retiring `principal` in `months` equal installments
pub fn annuity_payment(principal: Money, annual_rate: Rate, months: u32) -> Money {
    if months == 0 {
        return principal;
    }

    let r = annual_rate.monthly_rate().as_decimal();

    if r.is_zero() {
        return principal / Decimal::from(months);
    }

    // A = P * r * (1 + r)^n / ((1 + r)^n - 1)
    match (Decimal::ONE + r).checked_powu(months as u64) {
        Some(compound) => {
            let numerator = principal.as_decimal() * r * compound;
            let denominator = compound - Decimal::ONE;
            Money::from_decimal(numerator / denominator)
        }
        // (1 + r)^n overflowed: the annuity converges to interest only
        None => Money::from_decimal(principal.as_decimal() * r),
    }
}

/// smallest whole number of months in which `payment` retires `principal`
///
/// `None` when the payment never retires the balance (it does not exceed
/// the monthly interest).
pub fn term_for_payment(principal: Money, annual_rate: Rate, payment: Money) -> Option<u32> {
    if !principal.is_positive() {
        return Some(0);
    }
    if !payment.is_positive() {
        return None;
    }

    let r = annual_rate.monthly_rate().as_decimal();
    let p = principal.as_decimal();
    let e = payment.as_decimal();

    if r.is_zero() {
        return ceil_months(p / e);
    }

    let interest = p * r;
    if e <= interest {
        return None;
    }

    // n = ln(E / (E - P*r)) / ln(1 + r)
    let numerator = (e / (e - interest)).checked_ln()?;
    let denominator = (Decimal::ONE + r).checked_ln()?;
    if denominator.is_zero() {
        return None;
    }
    ceil_months(numerator / denominator)
}

/// ceil a fractional month count, ignoring noise below 1e-6
fn ceil_months(months: Decimal) -> Option<u32> {
    months.round_dp(6).ceil().to_u32()
}
