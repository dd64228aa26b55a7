use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::entities::{Investment, Loan, PeerDebt};
use crate::types::DebtDirection;

/// assets, liabilities and their difference at a point in time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetWorthBreakdown {
    pub savings: Money,
    /// remaining principal of active loans
    pub total_loans: Money,
    /// unpaid money borrowed from people
    pub total_debts_taken: Money,
    /// unpaid money lent to people
    pub total_debts_given: Money,
    pub total_investments: Money,
    pub total_assets: Money,
    pub total_liabilities: Money,
    pub net_worth: Money,
}

impl NetWorthBreakdown {
    pub fn is_positive(&self) -> bool {
        self.net_worth.is_positive()
    }
}

/// combines the ledger's balances into a net worth figure
pub struct NetWorthAggregator;

impl NetWorthAggregator {
    /// pure aggregation; empty inputs give a zeroed breakdown
    pub fn compute(savings: Money, loans: &[Loan], debts: &[PeerDebt], investments: &[Investment]) -> NetWorthBreakdown {
        let total_loans: Money = loans
            .iter()
            .filter(|loan| loan.active)
            .map(|loan| loan.remaining_principal)
            .sum();

        let total_debts_taken: Money = debts.iter().map(|debt| debt.outstanding(DebtDirection::Taken)).sum();
        let total_debts_given: Money = debts.iter().map(|debt| debt.outstanding(DebtDirection::Given)).sum();
        let total_investments: Money = investments.iter().map(|inv| inv.current_value).sum();

        let total_assets = savings + total_investments + total_debts_given;
        let total_liabilities = total_loans + total_debts_taken;

        NetWorthBreakdown {
            savings,
            total_loans,
            total_debts_taken,
            total_debts_given,
            total_investments,
            total_assets,
            total_liabilities,
            net_worth: total_assets - total_liabilities,
        }
    }
}
