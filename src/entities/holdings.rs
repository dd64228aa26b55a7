use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::types::{DebtDirection, DebtId, InvestmentId, OwnerId};

/// money owed between the user and another person; never amortized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerDebt {
    pub id: DebtId,
    pub owner: OwnerId,
    pub person: String,
    pub amount: Money,
    pub direction: DebtDirection,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub paid: bool,
}

impl PeerDebt {
    pub fn new(
        owner: OwnerId,
        person: impl Into<String>,
        amount: Money,
        direction: DebtDirection,
        date: NaiveDate,
    ) -> Result<Self> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount { amount });
        }
        Ok(Self {
            id: Uuid::new_v4(),
            owner,
            person: person.into(),
            amount,
            direction,
            description: None,
            date,
            paid: false,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// unpaid amount in the given direction, zero otherwise
    pub fn outstanding(&self, direction: DebtDirection) -> Money {
        if !self.paid && self.direction == direction {
            self.amount
        } else {
            Money::ZERO
        }
    }
}

/// an investment position with a manually maintained value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    pub id: InvestmentId,
    pub owner: OwnerId,
    pub asset: String,
    pub invested_amount: Money,
    pub current_value: Money,
    pub last_updated: NaiveDate,
}

impl Investment {
    pub fn new(
        owner: OwnerId,
        asset: impl Into<String>,
        invested_amount: Money,
        current_value: Money,
        date: NaiveDate,
    ) -> Result<Self> {
        if invested_amount.is_negative() {
            return Err(LedgerError::InvalidAmount {
                amount: invested_amount,
            });
        }
        if current_value.is_negative() {
            return Err(LedgerError::InvalidAmount {
                amount: current_value,
            });
        }
        Ok(Self {
            id: Uuid::new_v4(),
            owner,
            asset: asset.into(),
            invested_amount,
            current_value,
            last_updated: date,
        })
    }

    /// overwrite the current value; values are not accumulated
    pub fn revalue(&mut self, value: Money, date: NaiveDate) -> Result<Money> {
        if value.is_negative() {
            return Err(LedgerError::InvalidAmount { amount: value });
        }
        let old = self.current_value;
        self.current_value = value;
        self.last_updated = date;
        Ok(old)
    }

    pub fn profit(&self) -> Money {
        self.current_value - self.invested_amount
    }

    /// profit as a percentage of the invested amount, 0 when nothing was invested
    pub fn return_percent(&self) -> Decimal {
        self.profit().percent_of(self.invested_amount)
    }
}

/// point-in-time savings balance; only the latest one matters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsSnapshot {
    pub id: Uuid,
    pub owner: OwnerId,
    pub amount: Money,
    pub date: NaiveDate,
}

impl SavingsSnapshot {
    pub fn new(owner: OwnerId, amount: Money, date: NaiveDate) -> Result<Self> {
        if amount.is_negative() {
            return Err(LedgerError::InvalidAmount { amount });
        }
        Ok(Self {
            id: Uuid::new_v4(),
            owner,
            amount,
            date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_debt_outstanding_by_direction() {
        let mut debt = PeerDebt::new(1, "Ivan", Money::from_major(5_000), DebtDirection::Given, date()).unwrap();
        assert_eq!(debt.outstanding(DebtDirection::Given), Money::from_major(5_000));
        assert_eq!(debt.outstanding(DebtDirection::Taken), Money::ZERO);

        debt.paid = true;
        assert_eq!(debt.outstanding(DebtDirection::Given), Money::ZERO);
    }

    #[test]
    fn test_investment_return() {
        let mut inv = Investment::new(1, "ETF", Money::from_major(10_000), Money::from_major(12_500), date()).unwrap();
        assert_eq!(inv.profit(), Money::from_major(2_500));
        assert_eq!(inv.return_percent(), dec!(25));

        let old = inv.revalue(Money::from_major(9_000), date()).unwrap();
        assert_eq!(old, Money::from_major(12_500));
        assert_eq!(inv.current_value, Money::from_major(9_000));
        assert_eq!(inv.return_percent(), dec!(-10));
    }

    #[test]
    fn test_zero_invested_return_is_zero() {
        let gift = Investment::new(1, "airdrop", Money::ZERO, Money::from_major(300), date()).unwrap();
        assert_eq!(gift.return_percent(), Decimal::ZERO);
    }
}
