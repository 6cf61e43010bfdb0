use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::decimal::Money;
use crate::disbursement::{DisbursementCalculator, LoanComputation, LoanTerms};
use crate::errors::{LoanError, Result};
use crate::events::{Event, EventStore};
use crate::overdue::{
    assess_overdue, calculate_overdue_days, CreditHistory, OverdueAssessment, OverdueInput, PenaltyEngine,
};
use crate::payments::{
    OutstandingBalances, PaymentAllocator, PaymentRequest, PaymentResult, RepaymentSchedule, ScheduleGenerator,
    SettlementResult,
};
use crate::serialization::LoanView;
use crate::state::{InstallmentState, LoanState, StateSnapshot};
use crate::types::{
    CustomerStatus, InstallmentStatus, LoanId, LoanStatus, PaymentAllocation, PaymentMethod, RiskLevel,
};

/// core loan struct
pub struct Loan {
    pub id: LoanId,
    pub terms: LoanTerms,
    pub config: EngineConfig,
    pub computation: LoanComputation,
    pub schedule: RepaymentSchedule,
    pub state: LoanState,
    pub events: EventStore,
    pub snapshots: Vec<StateSnapshot>,
}

impl Loan {
    /// compute disbursement, generate the schedule and open the loan
    pub fn originate(terms: LoanTerms, config: EngineConfig, time_provider: &SafeTimeProvider) -> Result<Self> {
        config.validate()?;

        let computation = DisbursementCalculator::calculate(&terms)?;
        let schedule = ScheduleGenerator::new(config.schedule).generate(&terms, &computation, time_provider)?;

        let loan_id = Uuid::new_v4();
        let now = time_provider.now();
        let state = LoanState::new(loan_id, &schedule, now);

        let mut loan = Self {
            id: loan_id,
            terms,
            config,
            computation,
            schedule,
            state,
            events: EventStore::new(),
            snapshots: Vec::new(),
        };

        loan.events.emit(Event::LoanOriginated {
            loan_id,
            loan_method: loan.computation.loan_method,
            principal_amount: loan.computation.principal_amount,
            received_amount: loan.computation.received_amount,
            deposit_amount: loan.computation.deposit_amount,
            timestamp: now,
        });

        loan.events.emit(Event::ScheduleGenerated {
            loan_id,
            installments: loan.computation.number_of_periods,
            first_due_date: loan.schedule.installments.first().map(|i| i.due_date),
            final_due_date: loan.schedule.final_due_date(),
            total_due: loan.schedule.total_due(),
        });

        info!(
            loan_id = %loan_id,
            loan_method = ?loan.computation.loan_method,
            principal = %loan.computation.principal_amount,
            received = %loan.computation.received_amount,
            periods = loan.computation.number_of_periods,
            "loan originated"
        );

        // capture initial snapshot
        loan.snapshots
            .push(StateSnapshot::capture(&loan.state, "origination".to_string(), now));

        Ok(loan)
    }

    pub fn with_customer_id(mut self, customer_id: impl Into<String>) -> Self {
        self.state.customer_id = Some(customer_id.into());
        self
    }

    /// allocate a payment to one installment: fees, then interest, then principal, overflow to prepaid
    pub fn pay_installment(
        &mut self,
        sequence_number: u32,
        amount: Money,
        method: PaymentMethod,
        time_provider: &SafeTimeProvider,
    ) -> Result<PaymentResult> {
        let request = PaymentRequest::new(self.id, sequence_number, amount, method);
        self.process_payment(&request, time_provider)
    }

    /// process a payment request against one of this loan's installments
    pub fn process_payment(
        &mut self,
        request: &PaymentRequest,
        time_provider: &SafeTimeProvider,
    ) -> Result<PaymentResult> {
        if !self.state.can_accept_payment() {
            return Err(LoanError::LoanNotActive {
                status: self.state.status,
            });
        }
        if request.loan_id != self.id {
            return Err(LoanError::LoanMismatch {
                expected: self.id,
                received: request.loan_id,
            });
        }
        request.validate()?;

        let sequence_number = request.sequence_number;
        let now = time_provider.now();
        let prepaid_balance = self.state.prepaid_balance;

        // the deposit refund row is not part of the ledger, so it reads as not found
        let installment = self
            .state
            .installment_mut(sequence_number)
            .ok_or(LoanError::InstallmentNotFound { sequence_number })?;
        if installment.is_paid() {
            return Err(LoanError::InstallmentAlreadyPaid { sequence_number });
        }

        let allocation = PaymentAllocator::allocate(request.amount, &installment.outstanding(prepaid_balance))?;
        installment.record_allocation(&allocation, request.method, request.reference.as_deref(), now);
        let installment_status = installment.status;

        self.state
            .record_payment(allocation.total(), allocation.updated_prepaid_balance, now);

        self.events.emit(Event::PaymentAllocated {
            loan_id: self.id,
            sequence_number,
            amount: allocation.total(),
            method: request.method,
            fee_portion: allocation.fee_portion,
            interest_portion: allocation.interest_portion,
            principal_portion: allocation.principal_portion,
            timestamp: now,
        });

        debug!(
            loan_id = %self.id,
            sequence_number,
            amount = %allocation.total(),
            fees = %allocation.fee_portion,
            interest = %allocation.interest_portion,
            principal = %allocation.principal_portion,
            prepaid = %allocation.prepaid_credit,
            "payment allocated"
        );

        if allocation.prepaid_credit.is_positive() {
            self.events.emit(Event::PrepaidCredited {
                loan_id: self.id,
                amount: allocation.prepaid_credit,
                new_balance: allocation.updated_prepaid_balance,
                timestamp: now,
            });
        }

        if installment_status == InstallmentStatus::Paid {
            self.events.emit(Event::InstallmentPaid {
                loan_id: self.id,
                sequence_number,
                timestamp: now,
            });
        }

        let loan_settled = self.state.is_settled();
        if loan_settled {
            self.settle(time_provider);
        }

        // snapshot state
        self.snapshots.push(StateSnapshot::capture(
            &self.state,
            format!("payment: {} on installment {}", allocation.total(), sequence_number),
            now,
        ));

        Ok(PaymentResult {
            loan_id: self.id,
            sequence_number,
            amount: allocation.total(),
            method: request.method,
            reference: request.reference.clone(),
            allocation,
            installment_status,
            loan_settled,
            payment_date: now,
        })
    }

    /// settle the whole loan now: the amount runs through the waterfall against everything
    /// still owed, any remainder is written off and the loan completes
    pub fn settle_early(
        &mut self,
        amount: Money,
        method: PaymentMethod,
        reference: Option<String>,
        time_provider: &SafeTimeProvider,
    ) -> Result<SettlementResult> {
        if !self.state.can_accept_payment() {
            return Err(LoanError::LoanNotActive {
                status: self.state.status,
            });
        }

        let now = time_provider.now();
        let outstanding = OutstandingBalances::new(
            self.state.outstanding_fees(),
            self.state.outstanding_interest(),
            self.state.outstanding_principal(),
        )
        .with_prepaid(self.state.prepaid_balance);
        let allocation = PaymentAllocator::allocate(amount, &outstanding)?;

        // spread the loan-wide portions over open installments in due order
        let mut fees_left = allocation.fee_portion;
        let mut interest_left = allocation.interest_portion;
        let mut principal_left = allocation.principal_portion;
        let mut waived = Money::ZERO;
        let mut installments_closed = Vec::new();

        for installment in self.state.installments.iter_mut().filter(|i| !i.is_paid()) {
            let part = PaymentAllocation {
                fee_portion: fees_left.min(installment.outstanding_fees()),
                interest_portion: interest_left.min(installment.outstanding_interest()),
                principal_portion: principal_left.min(installment.outstanding_principal()),
                ..PaymentAllocation::default()
            };
            fees_left -= part.fee_portion;
            interest_left -= part.interest_portion;
            principal_left -= part.principal_portion;

            if part.total_applied().is_positive() {
                installment.record_allocation(&part, method, reference.as_deref(), now);
            }
            waived += installment.waive_remaining();
            installments_closed.push(installment.sequence_number);
        }

        self.state
            .record_payment(allocation.total(), allocation.updated_prepaid_balance, now);
        self.state.total_waived += waived;

        self.events.emit(Event::EarlySettlement {
            loan_id: self.id,
            amount: allocation.total(),
            method,
            fee_portion: allocation.fee_portion,
            interest_portion: allocation.interest_portion,
            principal_portion: allocation.principal_portion,
            waived,
            installments_closed: installments_closed.len() as u32,
            timestamp: now,
        });

        if allocation.prepaid_credit.is_positive() {
            self.events.emit(Event::PrepaidCredited {
                loan_id: self.id,
                amount: allocation.prepaid_credit,
                new_balance: allocation.updated_prepaid_balance,
                timestamp: now,
            });
        }

        for &sequence_number in &installments_closed {
            self.events.emit(Event::InstallmentPaid {
                loan_id: self.id,
                sequence_number,
                timestamp: now,
            });
        }

        if waived.is_positive() {
            warn!(
                loan_id = %self.id,
                amount = %allocation.total(),
                waived = %waived,
                "early settlement wrote off outstanding balance"
            );
        }

        self.settle(time_provider);

        self.snapshots.push(StateSnapshot::capture(
            &self.state,
            format!("early settlement: {}", allocation.total()),
            now,
        ));

        Ok(SettlementResult {
            loan_id: self.id,
            amount: allocation.total(),
            method,
            reference,
            allocation,
            waived,
            installments_closed,
            settlement_date: now,
        })
    }

    fn settle(&mut self, time_provider: &SafeTimeProvider) {
        let now = time_provider.now();
        let old_status = self.state.status;
        self.state.update_status(LoanStatus::Completed, now);
        self.state.settlement_date = Some(now);

        self.events.emit(Event::StatusChanged {
            loan_id: self.id,
            old_status,
            new_status: LoanStatus::Completed,
            timestamp: now,
        });

        self.set_customer_status(CustomerStatus::Cleared, time_provider);

        self.events.emit(Event::LoanSettled {
            loan_id: self.id,
            total_paid: self.state.total_payments_received,
            deposit_refund: self.state.deposit_refund,
            timestamp: now,
        });

        info!(
            loan_id = %self.id,
            total_paid = %self.state.total_payments_received,
            deposit_refund = %self.state.deposit_refund,
            "loan settled"
        );
    }

    /// book overdue fees, only the increase over fees already charged is added
    pub fn apply_overdue_fees(&mut self, time_provider: &SafeTimeProvider) -> Result<Money> {
        if !self.state.can_accept_payment() {
            return Ok(Money::ZERO);
        }

        let engine = PenaltyEngine::new(self.config.penalty.clone());
        let grace_period_days = self.config.penalty.grace_period_days;
        let now = time_provider.now();
        let mut total_applied = Money::ZERO;

        for installment in self.state.installments.iter_mut().filter(|i| !i.is_paid()) {
            let overdue_days = calculate_overdue_days(
                installment.due_date,
                installment.paid_toward_schedule(),
                installment.net_scheduled_amount(),
                grace_period_days,
                time_provider,
            )?;
            if overdue_days == 0 {
                continue;
            }

            let overdue_amount =
                (installment.net_scheduled_amount() - installment.paid_toward_schedule()).non_negative();
            let fee = engine.calculate_overdue_fee(overdue_days, overdue_amount);
            let increase = (fee - installment.fees_charged).non_negative();
            if increase.is_zero() {
                continue;
            }

            installment.fees_charged += increase;
            total_applied += increase;

            self.events.emit(Event::OverdueFeeApplied {
                loan_id: self.id,
                sequence_number: installment.sequence_number,
                fee_amount: increase,
                overdue_days,
                timestamp: now,
            });

            debug!(
                loan_id = %self.id,
                sequence_number = installment.sequence_number,
                overdue_days,
                fee = %increase,
                "overdue fee applied"
            );
        }

        if total_applied.is_positive() {
            self.snapshots
                .push(StateSnapshot::capture(&self.state, format!("overdue fees: {}", total_applied), now));
        }

        Ok(total_applied)
    }

    /// assess the most overdue installment against the customer's history
    pub fn assess(&mut self, history: &CreditHistory, time_provider: &SafeTimeProvider) -> Result<OverdueAssessment> {
        let target = match self.most_overdue_installment(time_provider)? {
            Some(installment) => installment,
            None => self
                .state
                .installments
                .last()
                .ok_or(LoanError::InstallmentNotFound { sequence_number: 0 })?,
        };
        let sequence_number = target.sequence_number;
        let input = OverdueInput {
            due_date: target.due_date,
            paid_amount: target.paid_toward_schedule(),
            required_amount: target.net_scheduled_amount(),
            history: *history,
        };

        let mut assessment = assess_overdue(&input, &self.config, time_provider)?;

        if self.state.status == LoanStatus::Completed {
            assessment.customer_status = CustomerStatus::Cleared;
        } else {
            self.set_customer_status(assessment.customer_status, time_provider);
        }

        self.events.emit(Event::OverdueAssessed {
            loan_id: self.id,
            sequence_number,
            overdue_days: assessment.overdue_days,
            risk_level: assessment.risk_level,
            credit_score: assessment.credit_score,
            timestamp: time_provider.now(),
        });

        if assessment.risk_level == RiskLevel::Critical {
            warn!(
                loan_id = %self.id,
                sequence_number,
                overdue_days = assessment.overdue_days,
                blacklisted = history.is_blacklisted,
                next_action = %assessment.collection_advice.next_action,
                "critical collection risk"
            );
        } else {
            debug!(
                loan_id = %self.id,
                sequence_number,
                overdue_days = assessment.overdue_days,
                risk_level = ?assessment.risk_level,
                "overdue assessed"
            );
        }

        Ok(assessment)
    }

    /// unpaid installment with the most overdue days, earliest first on ties
    fn most_overdue_installment(&self, time_provider: &SafeTimeProvider) -> Result<Option<&InstallmentState>> {
        let grace_period_days = self.config.penalty.grace_period_days;
        let mut worst: Option<(&InstallmentState, u32)> = None;

        for installment in self.state.installments.iter().filter(|i| !i.is_paid()) {
            let days = calculate_overdue_days(
                installment.due_date,
                installment.paid_toward_schedule(),
                installment.net_scheduled_amount(),
                grace_period_days,
                time_provider,
            )?;
            if worst.map_or(true, |(_, most)| days > most) {
                worst = Some((installment, days));
            }
        }

        Ok(worst.map(|(installment, _)| installment))
    }

    fn set_customer_status(&mut self, new_status: CustomerStatus, time_provider: &SafeTimeProvider) {
        let old_status = self.state.customer_status;
        if old_status == new_status {
            return;
        }

        self.state.customer_status = new_status;
        self.events.emit(Event::CustomerStatusChanged {
            loan_id: self.id,
            customer_id: self.state.customer_id.clone(),
            old_status,
            new_status,
            timestamp: time_provider.now(),
        });

        info!(
            loan_id = %self.id,
            old_status = ?old_status,
            new_status = ?new_status,
            "customer status changed"
        );
    }

    /// status of every installment as seen today
    pub fn effective_statuses(&self, time_provider: &SafeTimeProvider) -> Vec<(u32, InstallmentStatus)> {
        let today: NaiveDate = time_provider.now().date_naive();
        self.state
            .installments
            .iter()
            .map(|i| (i.sequence_number, i.effective_status(today)))
            .collect()
    }

    pub fn view(&self) -> LoanView {
        LoanView::from_loan(self)
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        self.view().to_json_pretty()
    }

    /// get events and clear
    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }
}
