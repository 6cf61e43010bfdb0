pub mod schedule;
pub mod settlement;
pub mod waterfall;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::types::{InstallmentStatus, LoanId, PaymentAllocation, PaymentMethod};

pub use schedule::{RepaymentInstallment, RepaymentSchedule, ScheduleGenerator, DEPOSIT_REFUND_NOTE};
pub use settlement::{check_settlement, SettlementResult};
pub use waterfall::{OutstandingBalances, PaymentAllocator};

/// payment request against one installment
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub loan_id: LoanId,
    pub sequence_number: u32,
    pub amount: Money,
    pub method: PaymentMethod,
    pub reference: Option<String>,
}

impl PaymentRequest {
    pub fn new(loan_id: LoanId, sequence_number: u32, amount: Money, method: PaymentMethod) -> Self {
        Self {
            loan_id,
            sequence_number,
            amount,
            method,
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// amount must be at least one cent once rounded
    pub fn validate(&self) -> Result<()> {
        if !self.amount.round_cents().is_positive() {
            return Err(LoanError::InvalidPayment { amount: self.amount });
        }
        Ok(())
    }
}

/// outcome of a processed payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub loan_id: LoanId,
    pub sequence_number: u32,
    pub amount: Money,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub allocation: PaymentAllocation,
    pub installment_status: InstallmentStatus,
    pub loan_settled: bool,
    pub payment_date: DateTime<Utc>,
}

/// stored status after cumulative payments against an installment
pub fn installment_status_after_payment(total_due: Money, paid_total: Money) -> InstallmentStatus {
    if (total_due - paid_total).round_cents() <= Money::ZERO {
        InstallmentStatus::Paid
    } else if paid_total.is_positive() {
        InstallmentStatus::Partial
    } else {
        InstallmentStatus::Pending
    }
}

/// status as seen on a given day, unpaid installments past due read as overdue
pub fn effective_status(status: InstallmentStatus, due_date: NaiveDate, today: NaiveDate) -> InstallmentStatus {
    match status {
        InstallmentStatus::Pending | InstallmentStatus::Partial if due_date < today => InstallmentStatus::Overdue,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_payment_request_validation() {
        let id = Uuid::new_v4();
        assert!(PaymentRequest::new(id, 1, Money::from_major(10), PaymentMethod::Cash).validate().is_ok());
        assert!(PaymentRequest::new(id, 1, Money::ZERO, PaymentMethod::Cash).validate().is_err());
        let sub_cent = Money::from_str_exact("0.004").unwrap();
        assert!(PaymentRequest::new(id, 1, sub_cent, PaymentMethod::Cash).validate().is_err());

        let request = PaymentRequest::new(id, 2, Money::from_major(5), PaymentMethod::Check).with_reference("chq-0042");
        assert_eq!(request.reference.as_deref(), Some("chq-0042"));
    }

    #[test]
    fn test_status_after_payment() {
        let due = Money::from_major(1_000);
        assert_eq!(installment_status_after_payment(due, Money::ZERO), InstallmentStatus::Pending);
        assert_eq!(installment_status_after_payment(due, Money::from_major(400)), InstallmentStatus::Partial);
        assert_eq!(installment_status_after_payment(due, due), InstallmentStatus::Paid);
        assert_eq!(installment_status_after_payment(due, Money::from_major(1_200)), InstallmentStatus::Paid);
    }

    #[test]
    fn test_effective_status() {
        let due = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let before = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let after = NaiveDate::from_ymd_opt(2024, 5, 11).unwrap();

        assert_eq!(effective_status(InstallmentStatus::Pending, due, before), InstallmentStatus::Pending);
        assert_eq!(effective_status(InstallmentStatus::Pending, due, after), InstallmentStatus::Overdue);
        assert_eq!(effective_status(InstallmentStatus::Partial, due, after), InstallmentStatus::Overdue);
        assert_eq!(effective_status(InstallmentStatus::Paid, due, after), InstallmentStatus::Paid);
    }
}
