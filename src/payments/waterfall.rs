use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::types::PaymentAllocation;

/// amounts still owed on an installment when a payment arrives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OutstandingBalances {
    pub fees: Money,
    pub interest: Money,
    pub principal: Money,
    /// credit already carried on the loan
    pub prepaid_balance: Money,
}

impl OutstandingBalances {
    pub fn new(fees: Money, interest: Money, principal: Money) -> Self {
        Self {
            fees,
            interest,
            principal,
            prepaid_balance: Money::ZERO,
        }
    }

    pub fn with_prepaid(mut self, prepaid_balance: Money) -> Self {
        self.prepaid_balance = prepaid_balance;
        self
    }

    pub fn total_outstanding(&self) -> Money {
        self.fees + self.interest + self.principal
    }
}

/// waterfall stages in the only order payments are consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaterfallStage {
    Fees,
    Interest,
    Principal,
}

const WATERFALL: [WaterfallStage; 3] = [
    WaterfallStage::Fees,
    WaterfallStage::Interest,
    WaterfallStage::Principal,
];

/// splits a payment into fees, interest, principal and prepaid credit
pub struct PaymentAllocator;

impl PaymentAllocator {
    pub fn allocate(paid_amount: Money, outstanding: &OutstandingBalances) -> Result<PaymentAllocation> {
        let mut remaining = paid_amount.round_cents();
        if !remaining.is_positive() {
            return Err(LoanError::InvalidPayment { amount: paid_amount });
        }

        let mut allocation = PaymentAllocation {
            updated_prepaid_balance: outstanding.prepaid_balance.round_cents(),
            ..PaymentAllocation::default()
        };

        for stage in WATERFALL {
            remaining = apply_to_stage(stage, remaining, outstanding, &mut allocation);
            if remaining.is_zero() {
                break;
            }
        }

        if remaining.is_positive() {
            allocation.prepaid_credit = remaining;
            allocation.updated_prepaid_balance += remaining;
        }

        Ok(allocation)
    }
}

fn apply_to_stage(
    stage: WaterfallStage,
    available: Money,
    outstanding: &OutstandingBalances,
    allocation: &mut PaymentAllocation,
) -> Money {
    let (owed, applied) = match stage {
        WaterfallStage::Fees => (outstanding.fees, &mut allocation.fee_portion),
        WaterfallStage::Interest => (outstanding.interest, &mut allocation.interest_portion),
        WaterfallStage::Principal => (outstanding.principal, &mut allocation.principal_portion),
    };

    // caps truncate so a portion never exceeds what is owed
    let portion = available.min(owed.floor_cents().non_negative());
    *applied = portion;
    available - portion
}
