use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::payments::{
    check_settlement, effective_status, installment_status_after_payment, OutstandingBalances,
    RepaymentInstallment, RepaymentSchedule,
};
use crate::types::{CustomerStatus, InstallmentStatus, LoanId, LoanStatus, PaymentAllocation, PaymentMethod};

/// repayment ledger of one regular installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentState {
    pub sequence_number: u32,
    pub due_date: NaiveDate,
    pub interest_due: Money,
    pub principal_due: Money,
    pub total_due: Money,

    // overdue fees booked against this installment
    pub fees_charged: Money,

    // cumulative payments
    pub paid_fees: Money,
    pub paid_interest: Money,
    pub paid_principal: Money,
    pub payment_count: u32,
    pub last_payment_method: Option<PaymentMethod>,
    pub last_payment_date: Option<DateTime<Utc>>,
    pub last_payment_reference: Option<String>,

    // written off at early settlement
    pub waived_fees: Money,
    pub waived_interest: Money,
    pub waived_principal: Money,

    pub status: InstallmentStatus,
}

impl InstallmentState {
    pub fn from_installment(installment: &RepaymentInstallment) -> Self {
        Self {
            sequence_number: installment.sequence_number,
            due_date: installment.due_date,
            interest_due: installment.interest_portion,
            principal_due: installment.principal_portion,
            total_due: installment.total_due,
            fees_charged: Money::ZERO,
            paid_fees: Money::ZERO,
            paid_interest: Money::ZERO,
            paid_principal: Money::ZERO,
            payment_count: 0,
            last_payment_method: None,
            last_payment_date: None,
            last_payment_reference: None,
            waived_fees: Money::ZERO,
            waived_interest: Money::ZERO,
            waived_principal: Money::ZERO,
            status: InstallmentStatus::Pending,
        }
    }

    pub fn outstanding_fees(&self) -> Money {
        (self.fees_charged - self.paid_fees - self.waived_fees).non_negative()
    }

    pub fn outstanding_interest(&self) -> Money {
        (self.interest_due - self.paid_interest - self.waived_interest).non_negative()
    }

    pub fn outstanding_principal(&self) -> Money {
        (self.principal_due - self.paid_principal - self.waived_principal).non_negative()
    }

    pub fn total_outstanding(&self) -> Money {
        self.outstanding_fees() + self.outstanding_interest() + self.outstanding_principal()
    }

    /// balances the waterfall runs against
    pub fn outstanding(&self, prepaid_balance: Money) -> OutstandingBalances {
        OutstandingBalances::new(
            self.outstanding_fees(),
            self.outstanding_interest(),
            self.outstanding_principal(),
        )
        .with_prepaid(prepaid_balance)
    }

    /// scheduled amount paid so far, fees excluded
    pub fn paid_toward_schedule(&self) -> Money {
        self.paid_interest + self.paid_principal
    }

    /// everything applied to this installment, fees included
    pub fn paid_total(&self) -> Money {
        self.paid_fees + self.paid_toward_schedule()
    }

    /// interest and principal this installment carries
    pub fn scheduled_amount(&self) -> Money {
        self.interest_due + self.principal_due
    }

    /// scheduled amount left after any write-off
    pub fn net_scheduled_amount(&self) -> Money {
        (self.scheduled_amount() - self.waived_interest - self.waived_principal).non_negative()
    }

    pub fn waived_total(&self) -> Money {
        self.waived_fees + self.waived_interest + self.waived_principal
    }

    /// scheduled amount plus booked fees
    pub fn amount_required(&self) -> Money {
        self.scheduled_amount() + self.fees_charged
    }

    pub fn is_paid(&self) -> bool {
        self.status == InstallmentStatus::Paid
    }

    /// status as seen on the given day
    pub fn effective_status(&self, today: NaiveDate) -> InstallmentStatus {
        effective_status(self.status, self.due_date, today)
    }

    /// record the applied portions of a payment and refresh the status
    pub fn record_allocation(
        &mut self,
        allocation: &PaymentAllocation,
        method: PaymentMethod,
        reference: Option<&str>,
        timestamp: DateTime<Utc>,
    ) {
        self.paid_fees += allocation.fee_portion;
        self.paid_interest += allocation.interest_portion;
        self.paid_principal += allocation.principal_portion;
        self.payment_count += 1;
        self.last_payment_method = Some(method);
        self.last_payment_date = Some(timestamp);
        if reference.is_some() {
            self.last_payment_reference = reference.map(str::to_string);
        }
        self.status = installment_status_after_payment(self.amount_required(), self.paid_total());
    }

    /// write off whatever is still owed and close the installment, returns the amount written off
    pub fn waive_remaining(&mut self) -> Money {
        let fees = self.outstanding_fees();
        let interest = self.outstanding_interest();
        let principal = self.outstanding_principal();

        self.waived_fees += fees;
        self.waived_interest += interest;
        self.waived_principal += principal;
        self.status = InstallmentStatus::Paid;

        fees + interest + principal
    }
}

/// loan state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanState {
    // identification
    pub loan_id: LoanId,
    pub customer_id: Option<String>,

    // status
    pub status: LoanStatus,
    pub customer_status: CustomerStatus,
    pub last_status_change: DateTime<Utc>,

    // dates
    pub origination_date: DateTime<Utc>,
    pub settlement_date: Option<DateTime<Utc>>,

    // payment tracking
    pub prepaid_balance: Money,
    pub total_payments_received: Money,
    pub last_payment_amount: Option<Money>,
    pub last_payment_date: Option<DateTime<Utc>>,
    pub payment_count: u32,

    // written off by early settlement
    pub total_waived: Money,

    // collateral refund owed back to the borrower at settlement
    pub deposit_refund: Money,

    pub installments: Vec<InstallmentState>,
}

impl LoanState {
    /// create new loan state from a generated schedule
    pub fn new(loan_id: LoanId, schedule: &RepaymentSchedule, origination_date: DateTime<Utc>) -> Self {
        let installments = schedule
            .regular_installments()
            .map(InstallmentState::from_installment)
            .collect();
        let deposit_refund = schedule
            .deposit_refund()
            .map(|row| -row.total_due)
            .unwrap_or(Money::ZERO);

        Self {
            loan_id,
            customer_id: None,
            status: LoanStatus::Active,
            customer_status: CustomerStatus::Normal,
            last_status_change: origination_date,
            origination_date,
            settlement_date: None,
            prepaid_balance: Money::ZERO,
            total_payments_received: Money::ZERO,
            last_payment_amount: None,
            last_payment_date: None,
            payment_count: 0,
            total_waived: Money::ZERO,
            deposit_refund,
            installments,
        }
    }

    pub fn installment(&self, sequence_number: u32) -> Option<&InstallmentState> {
        self.installments
            .iter()
            .find(|i| i.sequence_number == sequence_number)
    }

    pub fn installment_mut(&mut self, sequence_number: u32) -> Option<&mut InstallmentState> {
        self.installments
            .iter_mut()
            .find(|i| i.sequence_number == sequence_number)
    }

    pub fn outstanding_fees(&self) -> Money {
        self.installments.iter().map(|i| i.outstanding_fees()).sum()
    }

    pub fn outstanding_interest(&self) -> Money {
        self.installments.iter().map(|i| i.outstanding_interest()).sum()
    }

    pub fn outstanding_principal(&self) -> Money {
        self.installments.iter().map(|i| i.outstanding_principal()).sum()
    }

    /// get total outstanding balance
    pub fn total_outstanding(&self) -> Money {
        self.outstanding_fees() + self.outstanding_interest() + self.outstanding_principal()
    }

    pub fn total_fees_charged(&self) -> Money {
        self.installments.iter().map(|i| i.fees_charged).sum()
    }

    pub fn paid_installment_count(&self) -> usize {
        self.installments.iter().filter(|i| i.is_paid()).count()
    }

    /// every installment paid and no interest or principal left
    pub fn is_settled(&self) -> bool {
        self.installments.iter().all(InstallmentState::is_paid)
            && check_settlement(self.outstanding_interest(), self.outstanding_principal())
    }

    /// check if loan can accept payments
    pub fn can_accept_payment(&self) -> bool {
        self.status == LoanStatus::Active
    }

    /// update status
    pub fn update_status(&mut self, new_status: LoanStatus, timestamp: DateTime<Utc>) {
        self.status = new_status;
        self.last_status_change = timestamp;
    }

    /// record payment
    pub fn record_payment(&mut self, amount: Money, prepaid_balance: Money, timestamp: DateTime<Utc>) {
        self.total_payments_received += amount;
        self.prepaid_balance = prepaid_balance;
        self.last_payment_amount = Some(amount);
        self.last_payment_date = Some(timestamp);
        self.payment_count += 1;
    }
}

/// state snapshot for audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub snapshot_id: Uuid,
    pub loan_id: LoanId,
    pub timestamp: DateTime<Utc>,
    pub state: LoanState,
    pub trigger: String,
}

impl StateSnapshot {
    pub fn capture(state: &LoanState, trigger: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            snapshot_id: Uuid::new_v4(),
            loan_id: state.loan_id,
            timestamp,
            state: state.clone(),
            trigger,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn installment(total: i64, interest: i64, principal: i64) -> InstallmentState {
        InstallmentState::from_installment(&RepaymentInstallment {
            sequence_number: 1,
            due_date: NaiveDate::from_ymd_opt(2024, 1, 9).unwrap(),
            principal_portion: Money::from_major(principal),
            interest_portion: Money::from_major(interest),
            total_due: Money::from_major(total),
            remaining_balance: Money::ZERO,
            note: None,
        })
    }

    fn allocation(fee: i64, interest: i64, principal: i64) -> PaymentAllocation {
        PaymentAllocation {
            fee_portion: Money::from_major(fee),
            interest_portion: Money::from_major(interest),
            principal_portion: Money::from_major(principal),
            ..PaymentAllocation::default()
        }
    }

    #[test]
    fn test_installment_ledger() {
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).unwrap();
        let mut row = installment(1_000, 300, 700);
        row.fees_charged = Money::from_major(50);

        assert_eq!(row.amount_required(), Money::from_major(1_050));

        row.record_allocation(&allocation(50, 300, 200), PaymentMethod::Cash, Some("rcpt-1"), now);
        assert_eq!(row.status, InstallmentStatus::Partial);
        assert_eq!(row.outstanding_fees(), Money::ZERO);
        assert_eq!(row.outstanding_interest(), Money::ZERO);
        assert_eq!(row.outstanding_principal(), Money::from_major(500));
        assert_eq!(row.paid_toward_schedule(), Money::from_major(500));

        assert_eq!(row.last_payment_reference.as_deref(), Some("rcpt-1"));

        row.record_allocation(&allocation(0, 0, 500), PaymentMethod::BankTransfer, None, now);
        assert_eq!(row.status, InstallmentStatus::Paid);
        assert_eq!(row.payment_count, 2);
        assert_eq!(row.last_payment_method, Some(PaymentMethod::BankTransfer));
        // a payment without a reference keeps the last one seen
        assert_eq!(row.last_payment_reference.as_deref(), Some("rcpt-1"));
    }

    #[test]
    fn test_waive_remaining_closes_installment() {
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).unwrap();
        let mut row = installment(1_000, 300, 700);
        row.fees_charged = Money::from_major(20);
        row.record_allocation(&allocation(20, 300, 100), PaymentMethod::Cash, None, now);

        let waived = row.waive_remaining();
        assert_eq!(waived, Money::from_major(600));
        assert_eq!(row.waived_principal, Money::from_major(600));
        assert_eq!(row.waived_interest, Money::ZERO);
        assert_eq!(row.total_outstanding(), Money::ZERO);
        assert_eq!(row.net_scheduled_amount(), Money::from_major(400));
        assert_eq!(row.paid_toward_schedule(), row.net_scheduled_amount());
        assert!(row.is_paid());

        assert_eq!(row.waive_remaining(), Money::ZERO);
    }

    #[test]
    fn test_effective_status_reads_overdue_after_due_date() {
        let row = installment(100, 0, 100);
        assert_eq!(
            row.effective_status(NaiveDate::from_ymd_opt(2024, 1, 9).unwrap()),
            InstallmentStatus::Pending
        );
        assert_eq!(
            row.effective_status(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()),
            InstallmentStatus::Overdue
        );
    }
}
