use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{LoanId, PaymentAllocation, PaymentMethod};

/// outcome of settling a loan ahead of schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementResult {
    pub loan_id: LoanId,
    /// amount applied, cent-rounded
    pub amount: Money,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    /// loan-wide split of the settlement amount
    pub allocation: PaymentAllocation,
    /// outstanding balance written off to close the loan
    pub waived: Money,
    pub installments_closed: Vec<u32>,
    pub settlement_date: DateTime<Utc>,
}

/// a loan is settled when neither interest nor principal is owed, compared to the cent
pub fn check_settlement(outstanding_interest: Money, outstanding_principal: Money) -> bool {
    outstanding_interest.round_cents().is_zero() && outstanding_principal.round_cents().is_zero()
}
