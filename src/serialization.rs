//! serialization support for loans
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::loan::Loan;
use crate::types::{CustomerStatus, InstallmentStatus, LoanId, LoanMethod, LoanStatus};

/// serializable view of a loan's state
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanView {
    pub id: LoanId,
    pub customer_id: Option<String>,
    pub loan_method: LoanMethod,
    pub status: LoanStatus,
    pub customer_status: CustomerStatus,
    pub origination_date: DateTime<Utc>,
    pub settlement_date: Option<DateTime<Utc>>,
    pub disbursement: DisbursementView,
    pub balances: BalanceView,
    pub payments: PaymentView,
    pub installments: Vec<InstallmentView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DisbursementView {
    pub principal_amount: Money,
    pub interest_rate: Rate,
    pub interest: Money,
    pub received_amount: Money,
    pub deposit_amount: Money,
    pub upfront_fees: Money,
    pub payment_per_period: Money,
    pub number_of_periods: u32,
    pub total_repayment: Money,
    pub profit: Money,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceView {
    pub outstanding_fees: Money,
    pub outstanding_interest: Money,
    pub outstanding_principal: Money,
    pub total_outstanding: Money,
    pub total_fees_charged: Money,
    pub prepaid_balance: Money,
    pub total_waived: Money,
    pub deposit_refund: Money,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentView {
    pub total_payments_received: Money,
    pub last_payment_amount: Option<Money>,
    pub last_payment_date: Option<DateTime<Utc>>,
    pub payment_count: u32,
    pub paid_installments: usize,
    pub total_installments: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InstallmentView {
    pub sequence_number: u32,
    pub due_date: NaiveDate,
    pub total_due: Money,
    pub fees_charged: Money,
    pub paid_total: Money,
    pub waived_total: Money,
    pub last_payment_reference: Option<String>,
    /// stored status, not adjusted for the current date
    pub status: InstallmentStatus,
}

impl LoanView {
    pub fn from_loan(loan: &Loan) -> Self {
        let state = &loan.state;
        let computation = &loan.computation;

        LoanView {
            id: loan.id,
            customer_id: state.customer_id.clone(),
            loan_method: computation.loan_method,
            status: state.status,
            customer_status: state.customer_status,
            origination_date: state.origination_date,
            settlement_date: state.settlement_date,
            disbursement: DisbursementView {
                principal_amount: computation.principal_amount,
                interest_rate: loan.terms.interest_rate,
                interest: computation.interest,
                received_amount: computation.received_amount,
                deposit_amount: computation.deposit_amount,
                upfront_fees: computation.upfront_fees,
                payment_per_period: computation.payment_per_period,
                number_of_periods: computation.number_of_periods,
                total_repayment: computation.total_repayment,
                profit: computation.profit,
            },
            balances: BalanceView {
                outstanding_fees: state.outstanding_fees(),
                outstanding_interest: state.outstanding_interest(),
                outstanding_principal: state.outstanding_principal(),
                total_outstanding: state.total_outstanding(),
                total_fees_charged: state.total_fees_charged(),
                prepaid_balance: state.prepaid_balance,
                total_waived: state.total_waived,
                deposit_refund: state.deposit_refund,
            },
            payments: PaymentView {
                total_payments_received: state.total_payments_received,
                last_payment_amount: state.last_payment_amount,
                last_payment_date: state.last_payment_date,
                payment_count: state.payment_count,
                paid_installments: state.paid_installment_count(),
                total_installments: state.installments.len(),
            },
            installments: state
                .installments
                .iter()
                .map(|i| InstallmentView {
                    sequence_number: i.sequence_number,
                    due_date: i.due_date,
                    total_due: i.total_due,
                    fees_charged: i.fees_charged,
                    paid_total: i.paid_total(),
                    waived_total: i.waived_total(),
                    last_payment_reference: i.last_payment_reference.clone(),
                    status: i.status,
                })
                .collect(),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
