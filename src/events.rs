use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{CustomerStatus, LoanId, LoanMethod, LoanStatus, PaymentMethod, RiskLevel};

/// all events that can be emitted by a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // lifecycle events
    LoanOriginated {
        loan_id: LoanId,
        loan_method: LoanMethod,
        principal_amount: Money,
        received_amount: Money,
        deposit_amount: Money,
        timestamp: DateTime<Utc>,
    },
    ScheduleGenerated {
        loan_id: LoanId,
        installments: u32,
        first_due_date: Option<NaiveDate>,
        final_due_date: Option<NaiveDate>,
        total_due: Money,
    },
    LoanSettled {
        loan_id: LoanId,
        total_paid: Money,
        deposit_refund: Money,
        timestamp: DateTime<Utc>,
    },
    StatusChanged {
        loan_id: LoanId,
        old_status: LoanStatus,
        new_status: LoanStatus,
        timestamp: DateTime<Utc>,
    },

    // payment events
    PaymentAllocated {
        loan_id: LoanId,
        sequence_number: u32,
        amount: Money,
        method: PaymentMethod,
        fee_portion: Money,
        interest_portion: Money,
        principal_portion: Money,
        timestamp: DateTime<Utc>,
    },
    PrepaidCredited {
        loan_id: LoanId,
        amount: Money,
        new_balance: Money,
        timestamp: DateTime<Utc>,
    },
    InstallmentPaid {
        loan_id: LoanId,
        sequence_number: u32,
        timestamp: DateTime<Utc>,
    },
    EarlySettlement {
        loan_id: LoanId,
        amount: Money,
        method: PaymentMethod,
        fee_portion: Money,
        interest_portion: Money,
        principal_portion: Money,
        waived: Money,
        installments_closed: u32,
        timestamp: DateTime<Utc>,
    },

    // overdue events
    OverdueFeeApplied {
        loan_id: LoanId,
        sequence_number: u32,
        fee_amount: Money,
        overdue_days: u32,
        timestamp: DateTime<Utc>,
    },
    OverdueAssessed {
        loan_id: LoanId,
        sequence_number: u32,
        overdue_days: u32,
        risk_level: RiskLevel,
        credit_score: u8,
        timestamp: DateTime<Utc>,
    },
    CustomerStatusChanged {
        loan_id: LoanId,
        customer_id: Option<String>,
        old_status: CustomerStatus,
        new_status: CustomerStatus,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
