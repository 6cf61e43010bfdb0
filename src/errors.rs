use thiserror::Error;

use crate::decimal::Money;
use crate::types::{LoanId, LoanStatus};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoanError {
    #[error("invalid loan terms: {message}")]
    InvalidTerms {
        message: String,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPayment {
        amount: Money,
    },

    #[error("invalid date range: {message}")]
    InvalidDateRange {
        message: String,
    },

    #[error("installment {sequence_number} not found")]
    InstallmentNotFound {
        sequence_number: u32,
    },

    #[error("installment {sequence_number} already paid")]
    InstallmentAlreadyPaid {
        sequence_number: u32,
    },

    #[error("loan not active: current status is {status:?}")]
    LoanNotActive {
        status: LoanStatus,
    },

    #[error("payment for loan {received} sent to loan {expected}")]
    LoanMismatch {
        expected: LoanId,
        received: LoanId,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

impl LoanError {
    pub(crate) fn invalid_terms(message: impl Into<String>) -> Self {
        LoanError::InvalidTerms {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_date_range(message: impl Into<String>) -> Self {
        LoanError::InvalidDateRange {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LoanError>;
