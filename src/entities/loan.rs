use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::errors::{LedgerError, Result};
use crate::types::{LoanId, LoanStatus, OwnerId, PaymentKind};

/// what the lender allows the borrower to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanCapabilities {
    pub full_early_payoff: bool,
    pub partial_reduce_term: bool,
    pub partial_reduce_payment: bool,
    pub payment_holiday: bool,
}

impl Default for LoanCapabilities {
    fn default() -> Self {
        Self {
            full_early_payoff: true,
            partial_reduce_term: true,
            partial_reduce_payment: true,
            payment_holiday: true,
        }
    }
}

impl LoanCapabilities {
    /// whether a payment of this kind is permitted
    pub fn allows(&self, kind: PaymentKind) -> bool {
        match kind {
            PaymentKind::Regular => true,
            PaymentKind::EarlyFull => self.full_early_payoff,
            PaymentKind::EarlyReduceTerm => self.partial_reduce_term,
            PaymentKind::EarlyReducePayment => self.partial_reduce_payment,
        }
    }
}

/// an installment loan snapshot
///
/// invariants: `remaining_principal >= 0`, `elapsed_months <= total_term_months`,
/// `active` is false exactly when the principal has been repaid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub owner: OwnerId,
    pub lender: String,
    pub display_name: String,
    pub monthly_payment: Money,
    pub total_term_months: u32,
    pub interest_rate: Rate,
    pub remaining_principal: Money,
    pub start_date: NaiveDate,
    pub elapsed_months: u32,
    pub active: bool,
    pub capabilities: LoanCapabilities,
}

impl Loan {
    /// create a new active loan
    pub fn new(
        owner: OwnerId,
        lender: impl Into<String>,
        monthly_payment: Money,
        total_term_months: u32,
        interest_rate: Rate,
        remaining_principal: Money,
        start_date: NaiveDate,
    ) -> Result<Self> {
        if !monthly_payment.is_positive() {
            return Err(LedgerError::InvalidAmount {
                amount: monthly_payment,
            });
        }
        if remaining_principal.is_negative() {
            return Err(LedgerError::InvalidAmount {
                amount: remaining_principal,
            });
        }
        if total_term_months == 0 {
            return Err(LedgerError::InvalidConfiguration {
                message: "loan term must be at least one month".to_string(),
            });
        }
        if interest_rate.as_decimal().is_sign_negative() {
            return Err(LedgerError::InvalidConfiguration {
                message: format!("interest rate must not be negative, got {interest_rate}"),
            });
        }

        let lender = lender.into();
        Ok(Self {
            id: Uuid::new_v4(),
            owner,
            display_name: lender.clone(),
            lender,
            monthly_payment,
            total_term_months,
            interest_rate,
            remaining_principal,
            start_date,
            elapsed_months: 0,
            active: remaining_principal.is_positive(),
            capabilities: LoanCapabilities::default(),
        })
    }

    /// set the number of installments already behind the borrower
    pub fn with_elapsed_months(mut self, elapsed_months: u32) -> Result<Self> {
        if elapsed_months > self.total_term_months {
            return Err(LedgerError::InvalidConfiguration {
                message: format!(
                    "elapsed months {} exceed term of {} months",
                    elapsed_months, self.total_term_months
                ),
            });
        }
        self.elapsed_months = elapsed_months;
        Ok(self)
    }

    pub fn with_capabilities(mut self, capabilities: LoanCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// name a second active loan from the same lender apart by its payment
    pub fn disambiguate_name(&mut self, existing_active: &[Loan]) {
        let clash = existing_active
            .iter()
            .any(|other| other.id != self.id && other.active && other.lender == self.lender);
        self.display_name = if clash {
            format!("{} {}", self.lender, self.monthly_payment.round_cents())
        } else {
            self.lender.clone()
        };
    }

    pub fn status(&self) -> LoanStatus {
        if self.active {
            LoanStatus::Active
        } else {
            LoanStatus::Closed
        }
    }

    /// contractual months left on the loan
    pub fn remaining_months(&self) -> u32 {
        self.total_term_months.saturating_sub(self.elapsed_months)
    }

    pub fn ensure_active(&self) -> Result<()> {
        if !self.active {
            return Err(LedgerError::LoanClosed { loan_id: self.id });
        }
        Ok(())
    }

    /// check the capability flags for a payment kind
    pub fn ensure_allows(&self, kind: PaymentKind) -> Result<()> {
        if !self.capabilities.allows(kind) {
            return Err(LedgerError::OperationNotAllowed {
                loan_id: self.id,
                operation: format!("{kind:?} payment"),
            });
        }
        Ok(())
    }

    pub fn ensure_holiday_allowed(&self) -> Result<()> {
        if !self.capabilities.payment_holiday {
            return Err(LedgerError::OperationNotAllowed {
                loan_id: self.id,
                operation: "payment holiday".to_string(),
            });
        }
        Ok(())
    }

    /// move one installment forward; never past the term
    pub(crate) fn advance_month(&mut self) {
        self.elapsed_months = (self.elapsed_months + 1).min(self.total_term_months);
    }

    /// set the new balance, closing the loan when it reaches zero
    pub(crate) fn set_balance(&mut self, balance: Money) {
        self.remaining_principal = balance.max(Money::ZERO);
        if self.remaining_principal.is_zero() {
            self.active = false;
        }
    }
}

/// one entry in the append-only payment log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanPayment {
    pub id: Uuid,
    pub loan_id: LoanId,
    pub date: NaiveDate,
    pub amount: Money,
    pub kind: PaymentKind,
    pub interest_portion: Money,
    pub principal_portion: Money,
    pub note: Option<String>,
}

/// an agreed payment holiday
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanHoliday {
    pub id: Uuid,
    pub loan_id: LoanId,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl LoanHoliday {
    pub fn new(loan_id: LoanId, start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(LedgerError::InvalidDate {
                message: format!("holiday end {end} is before start {start}"),
            });
        }
        Ok(Self {
            id: Uuid::new_v4(),
            loan_id,
            start,
            end,
        })
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn loan() -> Loan {
        Loan::new(
            1,
            "Sber",
            Money::from_major(15_000),
            40,
            Rate::from_percent(dec!(12)),
            Money::from_major(500_000),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_loan_is_active() {
        let loan = loan();
        assert!(loan.active);
        assert_eq!(loan.status(), LoanStatus::Active);
        assert_eq!(loan.remaining_months(), 40);
        assert_eq!(loan.display_name, "Sber");
        assert!(loan.capabilities.allows(PaymentKind::EarlyFull));
    }

    #[test]
    fn test_new_loan_validation() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let rate = Rate::from_percentage(10);
        assert!(Loan::new(1, "a", Money::ZERO, 12, rate, Money::from_major(10), start).is_err());
        assert!(Loan::new(1, "a", Money::ONE, 0, rate, Money::from_major(10), start).is_err());
        assert!(Loan::new(1, "a", Money::ONE, 12, rate, Money::from_major(-10), start).is_err());
        assert!(loan().with_elapsed_months(41).is_err());
    }

    #[test]
    fn test_elapsed_never_passes_term() {
        let mut loan = loan().with_elapsed_months(39).unwrap();
        loan.advance_month();
        loan.advance_month();
        assert_eq!(loan.elapsed_months, 40);
        assert_eq!(loan.remaining_months(), 0);
    }

    #[test]
    fn test_zero_balance_closes() {
        let mut loan = loan();
        loan.set_balance(Money::ZERO);
        assert!(!loan.active);
        assert!(matches!(loan.ensure_active(), Err(LedgerError::LoanClosed { .. })));
    }

    #[test]
    fn test_capability_checks() {
        let loan = loan().with_capabilities(LoanCapabilities {
            partial_reduce_payment: false,
            payment_holiday: false,
            ..LoanCapabilities::default()
        });
        assert!(loan.ensure_allows(PaymentKind::EarlyReduceTerm).is_ok());
        assert!(loan.ensure_allows(PaymentKind::EarlyReducePayment).is_err());
        assert!(loan.ensure_holiday_allowed().is_err());
    }

    #[test]
    fn test_display_name_disambiguation() {
        let existing = loan();
        let mut second = loan();
        second.monthly_payment = Money::from_major(7_500);
        second.disambiguate_name(&[existing]);
        assert_eq!(second.display_name, "Sber 7500");
    }

    #[test]
    fn test_holiday_coverage() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
        let holiday = LoanHoliday::new(Uuid::new_v4(), start, end).unwrap();
        assert!(holiday.covers(NaiveDate::from_ymd_opt(2024, 4, 15).unwrap()));
        assert!(!holiday.covers(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()));
        assert!(LoanHoliday::new(Uuid::new_v4(), end, start).is_err());
    }
}
