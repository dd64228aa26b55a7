use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::entities::Loan;
use crate::errors::{LedgerError, Result};
use crate::types::{EarlyPaymentPolicy, PaymentKind};

use super::amortization::{annuity_payment, term_for_payment};

/// recalculated loan terms after an early payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyPaymentOutcome {
    /// `EarlyFull` when the payment retires the whole balance
    pub kind: PaymentKind,
    pub amount: Money,
    pub old_balance: Money,
    pub new_balance: Money,
    /// months left before the payment
    pub old_term_months: u32,
    /// months left after the payment
    pub new_term_months: u32,
    pub old_payment: Money,
    pub new_payment: Money,
    pub months_saved: u32,
    /// nominal cash no longer paid; may be negative for a reduce-payment
    /// recalculation on a loan whose fixed payment was below the annuity
    pub amount_saved: Money,
    pub full_payoff: bool,
}

/// compute the effect of paying `extra_amount` ahead of schedule
///
/// the balance always drops by exactly `extra_amount`. fails with
/// `InvalidAmount` when the amount is not positive or exceeds the balance.
pub fn apply_early_payment(
    loan: &Loan,
    extra_amount: Money,
    policy: EarlyPaymentPolicy,
) -> Result<EarlyPaymentOutcome> {
    if !extra_amount.is_positive() || extra_amount > loan.remaining_principal {
        return Err(LedgerError::InvalidAmount {
            amount: extra_amount,
        });
    }

    let old_balance = loan.remaining_principal;
    let new_balance = old_balance - extra_amount;
    let remaining = loan.remaining_months();

    if new_balance.is_zero() {
        return Ok(full_payoff(loan, extra_amount, remaining));
    }

    let outcome = match policy {
        EarlyPaymentPolicy::ReduceTerm => reduce_term(loan, extra_amount, new_balance, remaining),
        EarlyPaymentPolicy::ReducePayment => reduce_payment(loan, extra_amount, new_balance, remaining),
    };
    Ok(outcome)
}

fn full_payoff(loan: &Loan, amount: Money, remaining: u32) -> EarlyPaymentOutcome {
    EarlyPaymentOutcome {
        kind: PaymentKind::EarlyFull,
        amount,
        old_balance: loan.remaining_principal,
        new_balance: Money::ZERO,
        old_term_months: remaining,
        new_term_months: 0,
        old_payment: loan.monthly_payment,
        new_payment: Money::ZERO,
        months_saved: remaining,
        amount_saved: loan.monthly_payment * Decimal::from(remaining),
        full_payoff: true,
    }
}

/// keep the payment, shorten the term
fn reduce_term(loan: &Loan, amount: Money, new_balance: Money, remaining: u32) -> EarlyPaymentOutcome {
    let payment = loan.monthly_payment;

    // the contractual count can lag behind what the balance actually needs
    let baseline = term_for_payment(loan.remaining_principal, loan.interest_rate, payment)
        .map_or(remaining, |needed| needed.max(remaining));

    let new_term = match term_for_payment(new_balance, loan.interest_rate, payment) {
        Some(term) => term.min(baseline),
        None => {
            debug!(
                "loan {}: payment {} does not cover interest on {}, term unchanged",
                loan.id, payment, new_balance
            );
            baseline
        }
    };

    let months_saved = baseline - new_term;

    EarlyPaymentOutcome {
        kind: PaymentKind::EarlyReduceTerm,
        amount,
        old_balance: loan.remaining_principal,
        new_balance,
        old_term_months: remaining,
        new_term_months: new_term,
        old_payment: payment,
        new_payment: payment,
        months_saved,
        amount_saved: payment * Decimal::from(months_saved),
        full_payoff: false,
    }
}

/// keep the term, lower the payment
fn reduce_payment(loan: &Loan, amount: Money, new_balance: Money, remaining: u32) -> EarlyPaymentOutcome {
    let old_payment = loan.monthly_payment;
    let new_payment = annuity_payment(new_balance, loan.interest_rate, remaining);
    let amount_saved = (old_payment - new_payment) * Decimal::from(remaining);

    EarlyPaymentOutcome {
        kind: PaymentKind::EarlyReducePayment,
        amount,
        old_balance: loan.remaining_principal,
        new_balance,
        old_term_months: remaining,
        new_term_months: remaining,
        old_payment,
        new_payment,
        months_saved: 0,
        amount_saved,
        full_payoff: false,
    }
}
