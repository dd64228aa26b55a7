use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::types::{CategoryId, CategoryKind, OwnerId, RecordId};

/// user-defined income or expense category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub owner: OwnerId,
    pub label: String,
    pub kind: CategoryKind,
}

impl Category {
    pub fn new(owner: OwnerId, label: impl Into<String>, kind: CategoryKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            label: label.into(),
            kind,
        }
    }
}

/// common view over income and expense records
pub trait CategorizedRecord {
    fn record_id(&self) -> RecordId;
    fn owner(&self) -> OwnerId;
    fn amount(&self) -> Money;
    fn category_id(&self) -> Option<CategoryId>;
    fn date(&self) -> NaiveDate;
}

macro_rules! categorized_record {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            pub id: RecordId,
            pub owner: OwnerId,
            pub amount: Money,
            pub category_id: Option<CategoryId>,
            pub description: Option<String>,
            pub date: NaiveDate,
        }

        impl $name {
            pub fn new(
                owner: OwnerId,
                amount: Money,
                category_id: Option<CategoryId>,
                date: NaiveDate,
            ) -> Result<Self> {
                if !amount.is_positive() {
                    return Err(LedgerError::InvalidAmount { amount });
                }
                Ok(Self {
                    id: Uuid::new_v4(),
                    owner,
                    amount,
                    category_id,
                    description: None,
                    date,
                })
            }

            pub fn with_description(mut self, description: impl Into<String>) -> Self {
                self.description = Some(description.into());
                self
            }
        }

        impl CategorizedRecord for $name {
            fn record_id(&self) -> RecordId {
                self.id
            }

            fn owner(&self) -> OwnerId {
                self.owner
            }

            fn amount(&self) -> Money {
                self.amount
            }

            fn category_id(&self) -> Option<CategoryId> {
                self.category_id
            }

            fn date(&self) -> NaiveDate {
                self.date
            }
        }
    };
}

categorized_record!(
    /// money received
    IncomeRecord
);

categorized_record!(
    /// money spent
    ExpenseRecord
);
