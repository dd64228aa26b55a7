//! serializable report data for the presentation layer

use chrono::{DateTime, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::DateRange;
use crate::config::EngineConfig;
use crate::decimal::{Money, Rate};
use crate::entities::{Investment, Loan, PeerDebt};
use crate::errors::Result;
use crate::net_worth::{NetWorthAggregator, NetWorthBreakdown};
use crate::payments::{AmortizationModel, AmortizationSchedule, PayoffPlan, PayoffStrategyAdvisor};
use crate::store::LedgerStore;
use crate::summary::{CategoryShare, CategorySummarizer, CategorySummary};
use crate::types::{InvestmentId, LoanId, OwnerId};

/// everything the report screen needs, as plain data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialReport {
    pub owner: OwnerId,
    pub generated_at: DateTime<Utc>,
    pub period: DateRange,
    pub net_worth: NetWorthBreakdown,
    pub summary: CategorySummary,
    pub expense_shares: Vec<CategoryShare>,
    pub loans: Vec<LoanView>,
    pub unpaid_debts: Vec<PeerDebt>,
    pub investments: Vec<InvestmentView>,
    pub payoff: Option<PayoffPlan>,
    pub ratios: FinancialRatios,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanView {
    pub id: LoanId,
    pub display_name: String,
    pub balance: Money,
    pub monthly_payment: Money,
    pub interest_rate: Rate,
    pub remaining_months: u32,
    pub next_payment_date: NaiveDate,
    /// interest still to pay at the current payment
    pub remaining_interest: Money,
    /// false when the payment does not cover the interest
    pub amortizes: bool,
}

impl LoanView {
    pub fn from_loan(loan: &Loan) -> Result<Self> {
        let schedule = AmortizationSchedule::project(loan)?;
        Ok(LoanView {
            id: loan.id,
            display_name: loan.display_name.clone(),
            balance: loan.remaining_principal,
            monthly_payment: loan.monthly_payment,
            interest_rate: loan.interest_rate,
            remaining_months: AmortizationModel::remaining_months(loan),
            next_payment_date: AmortizationModel::next_payment_date(loan)?,
            remaining_interest: schedule.total_interest,
            amortizes: schedule.amortizes,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentView {
    pub id: InvestmentId,
    pub asset: String,
    pub invested_amount: Money,
    pub current_value: Money,
    pub profit: Money,
    pub return_percent: Decimal,
}

impl From<&Investment> for InvestmentView {
    fn from(investment: &Investment) -> Self {
        InvestmentView {
            id: investment.id,
            asset: investment.asset.clone(),
            invested_amount: investment.invested_amount,
            current_value: investment.current_value,
            profit: investment.profit(),
            return_percent: investment.return_percent(),
        }
    }
}

/// household ratios; each is 0 when its denominator is 0
///
/// income and expense over the report period are scaled to a month
/// (`period_days` to 365 / 12 days) before use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialRatios {
    /// monthly loan payments as a percent of monthly income
    pub debt_to_income: Decimal,
    /// liabilities as a percent of assets
    pub debt_to_assets: Decimal,
    /// months of expenses covered by savings
    pub liquidity_months: Decimal,
    /// share of income not spent, percent
    pub savings_rate: Decimal,
    /// net worth as a percent of annual income
    pub net_worth_to_annual_income: Decimal,
}

impl FinancialRatios {
    pub fn compute(
        net_worth: &NetWorthBreakdown,
        summary: &CategorySummary,
        monthly_loan_payments: Money,
        period_days: u32,
    ) -> Self {
        if period_days == 0 {
            return Self::default();
        }
        let to_monthly = Decimal::from(365) / Decimal::from(12) / Decimal::from(period_days);
        let monthly_income = summary.total_income * to_monthly;
        let monthly_expense = summary.total_expense * to_monthly;
        let annual_income = monthly_income * Decimal::from(12);

        let liquidity_months = if monthly_expense.is_zero() {
            Decimal::ZERO
        } else {
            (net_worth.savings.as_decimal() / monthly_expense.as_decimal()).round_dp(2)
        };

        FinancialRatios {
            debt_to_income: monthly_loan_payments.percent_of(monthly_income),
            debt_to_assets: net_worth.total_liabilities.percent_of(net_worth.total_assets),
            liquidity_months,
            savings_rate: summary.balance.percent_of(summary.total_income),
            net_worth_to_annual_income: net_worth.net_worth.percent_of(annual_income),
        }
    }
}

impl FinancialReport {
    /// gather the report for the `period_days` ending today
    pub fn generate(
        store: &dyn LedgerStore,
        owner: OwnerId,
        config: &EngineConfig,
        time: &SafeTimeProvider,
    ) -> Result<Self> {
        let now = time.now();
        let period = DateRange::trailing_days(now.date_naive(), config.report.period_days);

        let all_loans = store.loans(owner, false)?;
        let active: Vec<Loan> = all_loans.iter().filter(|loan| loan.active).cloned().collect();
        let unpaid_debts = store.debts(owner, true)?;
        let investments = store.investments(owner)?;
        let savings = store
            .latest_savings(owner)?
            .map(|snapshot| snapshot.amount)
            .unwrap_or(Money::ZERO);

        let net_worth = NetWorthAggregator::compute(savings, &all_loans, &unpaid_debts, &investments);
        let summary = CategorySummarizer::summarize(
            &store.incomes(owner, &period)?,
            &store.expenses(owner, &period)?,
            &store.categories(owner, None)?,
        );

        let monthly_loan_payments: Money = active.iter().map(|loan| loan.monthly_payment).sum();
        let ratios = FinancialRatios::compute(&net_worth, &summary, monthly_loan_payments, config.report.period_days);

        let loans = active.iter().map(LoanView::from_loan).collect::<Result<Vec<_>>>()?;
        let payoff = PayoffStrategyAdvisor::new(config.advisor.clone()).recommend(&active);

        Ok(FinancialReport {
            owner,
            generated_at: now,
            period,
            expense_shares: summary.expense_shares(),
            net_worth,
            summary,
            loans,
            unpaid_debts,
            investments: investments.iter().map(InvestmentView::from).collect(),
            payoff,
            ratios,
        })
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
