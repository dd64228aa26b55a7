use thiserror::Error;
use uuid::Uuid;

use crate::decimal::Money;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invalid amount: {amount}")]
    InvalidAmount {
        amount: Money,
    },

    #[error("{entity} not found: {id}")]
    NotFound {
        entity: &'static str,
        id: String,
    },

    #[error("loan {loan_id} is closed")]
    LoanClosed {
        loan_id: Uuid,
    },

    #[error("operation not allowed for loan {loan_id}: {operation}")]
    OperationNotAllowed {
        loan_id: Uuid,
        operation: String,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage error: {message}")]
    Storage {
        message: String,
    },
}

impl LedgerError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        LedgerError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
