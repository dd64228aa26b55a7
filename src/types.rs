use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// owner of a ledger (the external user identifier)
pub type OwnerId = i64;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// unique identifier for a category, also the key of budget category maps
pub type CategoryId = Uuid;

pub type RecordId = Uuid;
pub type DebtId = Uuid;
pub type InvestmentId = Uuid;
pub type BudgetPlanId = Uuid;

/// loan lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    /// balance outstanding, payments expected
    Active,
    /// balance reached zero; terminal
    Closed,
}

/// kind of a recorded loan payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentKind {
    /// scheduled monthly installment
    Regular,
    /// early repayment of the whole remaining principal
    EarlyFull,
    /// partial early repayment, installment kept, term shortened
    EarlyReduceTerm,
    /// partial early repayment, term kept, installment lowered
    EarlyReducePayment,
}

impl PaymentKind {
    pub fn is_early(&self) -> bool {
        !matches!(self, PaymentKind::Regular)
    }
}

/// recalculation policy after a partial early repayment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EarlyPaymentPolicy {
    /// keep the payment, shorten the term
    ReduceTerm,
    /// keep the term, lower the payment
    ReducePayment,
}

impl EarlyPaymentPolicy {
    /// payment kind recorded for a partial early payment under this policy
    pub fn payment_kind(&self) -> PaymentKind {
        match self {
            EarlyPaymentPolicy::ReduceTerm => PaymentKind::EarlyReduceTerm,
            EarlyPaymentPolicy::ReducePayment => PaymentKind::EarlyReducePayment,
        }
    }
}

/// debt payoff heuristic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayoffStrategy {
    /// highest interest rate first
    Avalanche,
    /// smallest balance first
    Snowball,
}

/// direction of a peer debt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebtDirection {
    /// borrowed from someone (liability)
    Taken,
    /// lent to someone (asset)
    Given,
}

/// direction of a category and of budget plan entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryKind {
    Income,
    Expense,
}
