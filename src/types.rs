use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// disbursement and repayment structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanMethod {
    /// collateral-backed, fixed principal share per period, interest fully front-loaded
    Method1,
    /// equal installments amortizing principal plus interest
    Method2,
}

/// loan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    /// disbursed and being repaid
    Active,
    /// all installments paid, nothing outstanding
    Completed,
}

/// repayment status of a single installment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    Pending,
    Partial,
    Paid,
    /// pending or partial past its due date
    Overdue,
}

/// customer standing derived from overdue days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatus {
    Normal,
    Negotiating,
    BadDebt,
    /// every loan of the customer settled
    Cleared,
}

/// overdue bucket used for portfolio statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverdueStage {
    Current,
    Early,
    Late,
    BadDebt,
}

/// risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// collection priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionPriority {
    Low,
    Medium,
    High,
    Critical,
}

/// recommended collection channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionMethod {
    UrgentCollection,
    Phone,
    Sms,
    Email,
    InPerson,
    LegalNotice,
    NegotiatedSettlement,
    Litigation,
    CreditBureauReport,
    AssetSeizure,
}

/// how soon the next collection step should happen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionTimeline {
    OneToThreeDays,
    ThreeToSevenDays,
    Immediate,
}

/// how a repayment was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Check,
    Other,
}

/// result of applying a payment to one installment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PaymentAllocation {
    pub fee_portion: Money,
    pub interest_portion: Money,
    pub principal_portion: Money,
    pub prepaid_credit: Money,
    pub updated_prepaid_balance: Money,
}

impl PaymentAllocation {
    /// amount applied to outstanding obligations
    pub fn total_applied(&self) -> Money {
        self.fee_portion + self.interest_portion + self.principal_portion
    }

    /// everything the payment was split into, prepaid overflow included
    pub fn total(&self) -> Money {
        self.total_applied() + self.prepaid_credit
    }
}
