use std::cmp::Ordering;

use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::AdvisorConfig;
use crate::decimal::{Money, Rate};
use crate::entities::Loan;
use crate::types::{EarlyPaymentPolicy, LoanId, PayoffStrategy};

use super::amortization::{term_for_payment, AmortizationModel};

/// highest-rate loan and its monthly interest exposure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvalanchePick {
    pub loan_id: LoanId,
    pub display_name: String,
    pub interest_rate: Rate,
    pub balance: Money,
    /// approximate interest accruing on the balance each month
    pub monthly_interest: Money,
}

/// smallest-balance loan and how soon it closes at its current payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnowballPick {
    pub loan_id: LoanId,
    pub display_name: String,
    pub interest_rate: Rate,
    pub balance: Money,
    pub monthly_payment: Money,
    /// installments left on the contract
    pub contractual_months_left: u32,
    /// months the current payment actually needs to retire the balance;
    /// `None` when it does not cover the monthly interest
    pub months_to_close: Option<u32>,
}

/// where to direct extra money, with the numbers behind the choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffPlan {
    pub strategy: PayoffStrategy,
    /// loan to prepay first
    pub target: LoanId,
    pub avalanche: AvalanchePick,
    pub snowball: SnowballPick,
    /// avalanche rate minus snowball rate, in percentage points
    pub rate_gap: Decimal,
    pub average_remaining_months: Decimal,
    pub recommended_policy: EarlyPaymentPolicy,
    pub loan_count: usize,
}

impl PayoffPlan {
    pub fn target_name(&self) -> &str {
        match self.strategy {
            PayoffStrategy::Avalanche => &self.avalanche.display_name,
            PayoffStrategy::Snowball => &self.snowball.display_name,
        }
    }
}

/// heuristic advice on which loan to prepay and how
///
/// avalanche wins when its rate exceeds the snowball pick's rate by more than
/// `avalanche_rate_gap` points, or when both heuristics pick the same loan.
/// reduce-term is advised when the average remaining term is longer than
/// `reduce_term_threshold_months`. neither rule is an optimization.
#[derive(Debug, Clone, Default)]
pub struct PayoffStrategyAdvisor {
    config: AdvisorConfig,
}

impl PayoffStrategyAdvisor {
    pub fn new(config: AdvisorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    /// recommendation over the active loans, `None` when there are none
    pub fn recommend(&self, loans: &[Loan]) -> Option<PayoffPlan> {
        let active: Vec<&Loan> = loans.iter().filter(|loan| loan.active).collect();
        if active.is_empty() {
            debug!("no active loans, no payoff recommendation");
            return None;
        }

        let highest_rate = active.iter().copied().min_by(|a, b| avalanche_order(a, b))?;
        let smallest_balance = active.iter().copied().min_by(|a, b| snowball_order(a, b))?;

        let rate_gap = highest_rate.interest_rate.as_percentage() - smallest_balance.interest_rate.as_percentage();
        let strategy = if highest_rate.id == smallest_balance.id || rate_gap > self.config.avalanche_rate_gap {
            PayoffStrategy::Avalanche
        } else {
            PayoffStrategy::Snowball
        };

        let total_months: u32 = active.iter().map(|loan| AmortizationModel::remaining_months(loan)).sum();
        let average_remaining_months = Decimal::from(total_months) / Decimal::from(active.len() as u64);
        let recommended_policy = if average_remaining_months > Decimal::from(self.config.reduce_term_threshold_months) {
            EarlyPaymentPolicy::ReduceTerm
        } else {
            EarlyPaymentPolicy::ReducePayment
        };

        let target = match strategy {
            PayoffStrategy::Avalanche => highest_rate.id,
            PayoffStrategy::Snowball => smallest_balance.id,
        };

        debug!(
            "payoff advice over {} loans: {:?} (gap {} pts), {:?}",
            active.len(),
            strategy,
            rate_gap,
            recommended_policy
        );

        Some(PayoffPlan {
            strategy,
            target,
            avalanche: AvalanchePick {
                loan_id: highest_rate.id,
                display_name: highest_rate.display_name.clone(),
                interest_rate: highest_rate.interest_rate,
                balance: highest_rate.remaining_principal,
                monthly_interest: highest_rate
                    .remaining_principal
                    .monthly_interest(highest_rate.interest_rate)
                    .round_cents(),
            },
            snowball: SnowballPick {
                loan_id: smallest_balance.id,
                display_name: smallest_balance.display_name.clone(),
                interest_rate: smallest_balance.interest_rate,
                balance: smallest_balance.remaining_principal,
                monthly_payment: smallest_balance.monthly_payment,
                contractual_months_left: AmortizationModel::remaining_months(smallest_balance),
                months_to_close: term_for_payment(
                    smallest_balance.remaining_principal,
                    smallest_balance.interest_rate,
                    smallest_balance.monthly_payment,
                ),
            },
            rate_gap,
            average_remaining_months: average_remaining_months.round_dp(2),
            recommended_policy,
            loan_count: active.len(),
        })
    }
}

/// rate descending, then balance ascending, then id
fn avalanche_order(a: &Loan, b: &Loan) -> Ordering {
    b.interest_rate
        .cmp(&a.interest_rate)
        .then_with(|| a.remaining_principal.cmp(&b.remaining_principal))
        .then_with(|| a.id.cmp(&b.id))
}

/// balance ascending, then rate descending, then id
fn snowball_order(a: &Loan, b: &Loan) -> Ordering {
    a.remaining_principal
        .cmp(&b.remaining_principal)
        .then_with(|| b.interest_rate.cmp(&a.interest_rate))
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn loan(name: &str, balance: i64, payment: i64, rate: Decimal, term: u32, elapsed: u32) -> Loan {
        let mut loan = Loan::new(
            1,
            name,
            Money::from_major(payment),
            term,
            Rate::from_percent(rate),
            Money::from_major(balance),
            NaiveDate::from_ymd_opt(2023, 9, 1).unwrap(),
        )
        .unwrap()
        .with_elapsed_months(elapsed)
        .unwrap();
        loan.display_name = name.to_string();
        loan
    }

    #[test]
    fn test_empty_set_has_no_recommendation() {
        assert!(PayoffStrategyAdvisor::default().recommend(&[]).is_none());

        let mut closed = loan("old", 1_000, 100, dec!(10), 12, 0);
        closed.active = false;
        assert!(PayoffStrategyAdvisor::default().recommend(&[closed]).is_none());
    }

    #[test]
    fn test_avalanche_scenario() {
        let loans = vec![
            loan("first", 300_000, 10_000, dec!(18), 36, 5),
            loan("second", 500_000, 15_000, dec!(8), 48, 10),
        ];
        let plan = PayoffStrategyAdvisor::default().recommend(&loans).unwrap();

        assert_eq!(plan.strategy, PayoffStrategy::Avalanche);
        assert_eq!(plan.target, loans[0].id);
        assert_eq!(plan.avalanche.interest_rate, Rate::from_percent(dec!(18)));
        assert_eq!(plan.avalanche.monthly_interest, Money::from_major(4_500));
        assert_eq!(plan.target_name(), "first");
    }

    #[test]
    fn test_avalanche_on_rate_gap() {
        let loans = vec![
            loan("cheap small", 100_000, 5_000, dec!(8), 24, 0),
            loan("expensive", 500_000, 15_000, dec!(18), 48, 0),
        ];
        let plan = PayoffStrategyAdvisor::default().recommend(&loans).unwrap();

        assert_eq!(plan.strategy, PayoffStrategy::Avalanche);
        assert_eq!(plan.target, loans[1].id);
        assert_eq!(plan.rate_gap, dec!(10));
    }

    #[test]
    fn test_snowball_scenario() {
        let loans = vec![
            loan("small", 100_000, 5_000, dec!(12), 24, 5),
            loan("large", 500_000, 15_000, dec!(13), 48, 10),
        ];
        let plan = PayoffStrategyAdvisor::default().recommend(&loans).unwrap();

        assert_eq!(plan.strategy, PayoffStrategy::Snowball);
        assert_eq!(plan.target, loans[0].id);
        assert_eq!(plan.snowball.balance, Money::from_major(100_000));
        assert_eq!(plan.rate_gap, dec!(1));
        assert_eq!(plan.snowball.months_to_close, Some(23));
        assert_eq!(plan.snowball.contractual_months_left, 19);
    }

    #[test]
    fn test_gap_of_exactly_two_points_is_snowball() {
        let loans = vec![
            loan("small", 100_000, 5_000, dec!(10), 24, 0),
            loan("large", 500_000, 15_000, dec!(12), 48, 0),
        ];
        let plan = PayoffStrategyAdvisor::default().recommend(&loans).unwrap();
        assert_eq!(plan.strategy, PayoffStrategy::Snowball);
    }

    #[test]
    fn test_policy_follows_average_term() {
        let long = vec![
            loan("a", 100_000, 5_000, dec!(12), 60, 10),
            loan("b", 200_000, 5_000, dec!(10), 36, 10),
        ];
        let plan = PayoffStrategyAdvisor::default().recommend(&long).unwrap();
        assert_eq!(plan.average_remaining_months, dec!(38));
        assert_eq!(plan.recommended_policy, EarlyPaymentPolicy::ReduceTerm);

        // exactly at the threshold is not above it
        let short = vec![loan("c", 100_000, 5_000, dec!(12), 30, 6)];
        let plan = PayoffStrategyAdvisor::default().recommend(&short).unwrap();
        assert_eq!(plan.average_remaining_months, dec!(24));
        assert_eq!(plan.recommended_policy, EarlyPaymentPolicy::ReducePayment);
    }

    #[test]
    fn test_ties_are_deterministic() {
        let a = loan("a", 100_000, 5_000, dec!(15), 24, 0);
        let b = loan("b", 100_000, 5_000, dec!(15), 24, 0);
        let forward = PayoffStrategyAdvisor::default().recommend(&[a.clone(), b.clone()]).unwrap();
        let backward = PayoffStrategyAdvisor::default().recommend(&[b, a]).unwrap();
        assert_eq!(forward.target, backward.target);
        assert_eq!(forward.avalanche.loan_id, backward.avalanche.loan_id);
        assert_eq!(forward.snowball.loan_id, backward.snowball.loan_id);
    }

    #[test]
    fn test_configurable_gap() {
        let loans = vec![
            loan("small", 100_000, 5_000, dec!(12), 24, 5),
            loan("large", 500_000, 15_000, dec!(13), 48, 10),
        ];
        let advisor = PayoffStrategyAdvisor::new(AdvisorConfig {
            avalanche_rate_gap: dec!(0.5),
            ..AdvisorConfig::default()
        });
        assert_eq!(advisor.recommend(&loans).unwrap().strategy, PayoffStrategy::Avalanche);
    }

    #[test]
    fn test_snowball_months_when_payment_misses_interest() {
        // 1% of 100k is 1,000 a month; a 900 payment never closes the loan
        let loans = vec![
            loan("stuck", 100_000, 900, dec!(12), 24, 4),
            loan("large", 500_000, 15_000, dec!(13), 48, 10),
        ];
        let plan = PayoffStrategyAdvisor::default().recommend(&loans).unwrap();

        assert_eq!(plan.snowball.loan_id, loans[0].id);
        assert_eq!(plan.snowball.months_to_close, None);
        assert_eq!(plan.snowball.contractual_months_left, 20);
    }
}
