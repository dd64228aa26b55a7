pub mod amortization;
pub mod early_payment;
pub mod payoff;

use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::entities::{Loan, LoanPayment};
use crate::errors::{LedgerError, Result};
use crate::types::{EarlyPaymentPolicy, LoanId, PaymentKind};

pub use amortization::{
    annuity_payment, term_for_payment, AmortizationModel, AmortizationSchedule, PaymentSplit, ScheduledPayment,
};
pub use early_payment::{apply_early_payment, EarlyPaymentOutcome};
pub use payoff::{AvalanchePick, PayoffPlan, PayoffStrategyAdvisor, SnowballPick};

/// payment request against one loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub loan_id: LoanId,
    pub amount: Money,
    pub kind: PaymentKind,
    pub date: NaiveDate,
    pub note: Option<String>,
}

impl PaymentRequest {
    /// scheduled monthly installment
    pub fn regular(loan_id: LoanId, amount: Money, date: NaiveDate) -> Self {
        Self {
            loan_id,
            amount,
            kind: PaymentKind::Regular,
            date,
            note: None,
        }
    }

    /// partial early payment recalculated under `policy`
    pub fn early(loan_id: LoanId, amount: Money, policy: EarlyPaymentPolicy, date: NaiveDate) -> Self {
        Self {
            loan_id,
            amount,
            kind: policy.payment_kind(),
            date,
            note: None,
        }
    }

    /// early repayment of the whole remaining principal
    pub fn payoff(loan: &Loan, date: NaiveDate) -> Self {
        Self {
            loan_id: loan.id,
            amount: loan.remaining_principal,
            kind: PaymentKind::EarlyFull,
            date,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// result of applying a payment to a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedPayment {
    /// log entry to append
    pub payment: LoanPayment,
    /// recalculation for early payments
    pub early: Option<EarlyPaymentOutcome>,
    pub new_balance: Money,
    /// the payment moved the loan to its terminal state
    pub closed: bool,
}

/// apply a payment to a loan in place
///
/// validates everything before touching the loan, so on error the loan is
/// unchanged. every accepted payment advances `elapsed_months` by one.
pub fn apply_payment(loan: &mut Loan, request: &PaymentRequest) -> Result<AppliedPayment> {
    if request.loan_id != loan.id {
        return Err(LedgerError::not_found("loan", request.loan_id));
    }
    loan.ensure_active()?;
    if !request.amount.is_positive() {
        return Err(LedgerError::InvalidAmount {
            amount: request.amount,
        });
    }

    let (kind, interest_portion, principal_portion, early) = match request.kind {
        PaymentKind::Regular => {
            let split = AmortizationModel::payment_split(loan, request.amount)?;
            (PaymentKind::Regular, split.interest_portion, split.principal_portion, None)
        }
        PaymentKind::EarlyFull => {
            if request.amount != loan.remaining_principal {
                return Err(LedgerError::InvalidAmount {
                    amount: request.amount,
                });
            }
            loan.ensure_allows(PaymentKind::EarlyFull)?;
            // policy is irrelevant for a full payoff
            let outcome = apply_early_payment(loan, request.amount, EarlyPaymentPolicy::ReduceTerm)?;
            (PaymentKind::EarlyFull, Money::ZERO, request.amount, Some(outcome))
        }
        PaymentKind::EarlyReduceTerm | PaymentKind::EarlyReducePayment => {
            let policy = match request.kind {
                PaymentKind::EarlyReducePayment => EarlyPaymentPolicy::ReducePayment,
                _ => EarlyPaymentPolicy::ReduceTerm,
            };
            let outcome = apply_early_payment(loan, request.amount, policy)?;
            // a partial payment that clears the balance is a full payoff
            loan.ensure_allows(outcome.kind)?;
            (outcome.kind, Money::ZERO, request.amount, Some(outcome))
        }
    };

    let new_balance = loan.remaining_principal - principal_portion;
    let elapsed_before = loan.elapsed_months;

    if let Some(outcome) = &early {
        match outcome.kind {
            PaymentKind::EarlyReduceTerm => {
                // an early payment never extends the contract
                let total = elapsed_before + 1 + outcome.new_term_months;
                loan.total_term_months = total.min(loan.total_term_months);
            }
            PaymentKind::EarlyReducePayment => {
                loan.monthly_payment = outcome.new_payment.round_cents();
            }
            _ => {}
        }
    }

    loan.advance_month();
    loan.set_balance(new_balance);

    debug!(
        "loan {}: {:?} payment {} (interest {}, principal {}), balance {}",
        loan.id, kind, request.amount, interest_portion, principal_portion, loan.remaining_principal
    );

    Ok(AppliedPayment {
        payment: LoanPayment {
            id: Uuid::new_v4(),
            loan_id: loan.id,
            date: request.date,
            amount: request.amount,
            kind,
            interest_portion,
            principal_portion,
            note: request.note.clone(),
        },
        early,
        new_balance: loan.remaining_principal,
        closed: !loan.active,
    })
}
