use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::MonthPeriod;
use crate::decimal::Money;
use crate::types::{BudgetPlanId, CategoryId, CategoryKind, DebtId, InvestmentId, LoanId, OwnerId, PaymentKind};

/// all events that can be emitted by the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerEvent {
    // loan events
    LoanPaymentRecorded {
        loan_id: LoanId,
        amount: Money,
        kind: PaymentKind,
        interest_portion: Money,
        principal_portion: Money,
        new_balance: Money,
        date: NaiveDate,
        timestamp: DateTime<Utc>,
    },
    EarlyPaymentApplied {
        loan_id: LoanId,
        amount: Money,
        kind: PaymentKind,
        months_saved: u32,
        amount_saved: Money,
        timestamp: DateTime<Utc>,
    },
    LoanClosed {
        loan_id: LoanId,
        final_payment: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentHolidayRecorded {
        loan_id: LoanId,
        start: NaiveDate,
        end: NaiveDate,
        timestamp: DateTime<Utc>,
    },

    // budget events
    BudgetUpserted {
        owner: OwnerId,
        plan_id: BudgetPlanId,
        period: MonthPeriod,
        planned_income: Money,
        planned_expenses: Money,
        timestamp: DateTime<Utc>,
    },
    BudgetCategoryUpdated {
        plan_id: BudgetPlanId,
        kind: CategoryKind,
        category_id: CategoryId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    BudgetExceeded {
        owner: OwnerId,
        category_id: CategoryId,
        period: MonthPeriod,
        planned: Money,
        spent_after: Money,
        timestamp: DateTime<Utc>,
    },

    // holdings events
    DebtSettled {
        debt_id: DebtId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    InvestmentRevalued {
        investment_id: InvestmentId,
        old_value: Money,
        new_value: Money,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<LedgerEvent>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: LedgerEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
