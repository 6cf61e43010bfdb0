use chrono::{DateTime, Days, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::ScheduleConfig;
use crate::decimal::Money;
use crate::disbursement::{check_period_count, overflow, LoanComputation, LoanTerms};
use crate::errors::{LoanError, Result};
use crate::types::LoanMethod;

/// note carried by the trailing collateral refund row
pub const DEPOSIT_REFUND_NOTE: &str = "deposit refund";

/// one row of a repayment schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentInstallment {
    /// 1-based, unique within the loan
    pub sequence_number: u32,
    pub due_date: NaiveDate,
    pub principal_portion: Money,
    pub interest_portion: Money,
    /// negative on the deposit refund row
    pub total_due: Money,
    pub remaining_balance: Money,
    pub note: Option<String>,
}

impl RepaymentInstallment {
    pub fn is_deposit_refund(&self) -> bool {
        self.total_due.is_negative()
    }
}

/// repayment schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentSchedule {
    pub loan_method: LoanMethod,
    pub generated_at: DateTime<Utc>,
    pub installments: Vec<RepaymentInstallment>,
    pub total_principal: Money,
    pub total_interest: Money,
}

impl RepaymentSchedule {
    /// installments the borrower pays, refund row excluded
    pub fn regular_installments(&self) -> impl Iterator<Item = &RepaymentInstallment> {
        self.installments.iter().filter(|i| !i.is_deposit_refund())
    }

    pub fn deposit_refund(&self) -> Option<&RepaymentInstallment> {
        self.installments.iter().find(|i| i.is_deposit_refund())
    }

    /// sum of total due over regular installments
    pub fn total_due(&self) -> Money {
        self.regular_installments().map(|i| i.total_due).sum()
    }

    pub fn final_due_date(&self) -> Option<NaiveDate> {
        self.installments.last().map(|i| i.due_date)
    }
}

/// builds repayment schedules from computed loan economics
pub struct ScheduleGenerator {
    config: ScheduleConfig,
}

impl ScheduleGenerator {
    pub fn new(config: ScheduleConfig) -> Self {
        Self { config }
    }

    /// generate the schedule, first installment due one period after now
    pub fn generate(
        &self,
        terms: &LoanTerms,
        computation: &LoanComputation,
        time_provider: &SafeTimeProvider,
    ) -> Result<RepaymentSchedule> {
        terms.validate()?;
        if terms.loan_method != computation.loan_method {
            return Err(LoanError::invalid_terms(
                "loan computation was produced for a different loan method",
            ));
        }

        let generated_at = time_provider.now();
        let start = generated_at.date_naive();

        // reject before any rows are built
        let periods = check_period_count(computation.number_of_periods)?;
        self.due_date(start, periods).map_err(|_| {
            LoanError::invalid_terms(format!(
                "{} periods of {} days from {} run past the calendar",
                periods, self.config.period_days, start
            ))
        })?;

        let mut installments = match terms.loan_method {
            LoanMethod::Method1 => self.fixed_principal_rows(terms, computation, start)?,
            LoanMethod::Method2 => self.equal_installment_rows(terms, computation, start)?,
        };

        if terms.deposit_amount.is_positive() {
            let sequence_number = computation.number_of_periods + 1;
            installments.push(RepaymentInstallment {
                sequence_number,
                due_date: self.due_date(start, computation.number_of_periods)?,
                principal_portion: Money::ZERO,
                interest_portion: Money::ZERO,
                total_due: -terms.deposit_amount.round_cents(),
                remaining_balance: Money::ZERO,
                note: Some(DEPOSIT_REFUND_NOTE.to_string()),
            });
        }

        let total_principal = installments.iter().map(|i| i.principal_portion).sum();
        let total_interest = installments.iter().map(|i| i.interest_portion).sum();

        Ok(RepaymentSchedule {
            loan_method: terms.loan_method,
            generated_at,
            installments,
            total_principal,
            total_interest,
        })
    }

    /// method1: fixed principal share, all interest on the first row
    fn fixed_principal_rows(
        &self,
        terms: &LoanTerms,
        computation: &LoanComputation,
        start: NaiveDate,
    ) -> Result<Vec<RepaymentInstallment>> {
        let rate = terms.method1_rate()?;
        let per_period = terms
            .principal_amount
            .checked_mul(rate.as_decimal())
            .ok_or_else(|| overflow("principal per period"))?
            .round_cents();
        let periods = computation.number_of_periods;

        let mut rows = Vec::with_capacity(periods as usize + 1);
        let mut remaining = terms.principal_amount.round_cents();

        for i in 1..=periods {
            // last row sweeps whatever cent rounding left behind
            let principal_portion = if i == periods {
                remaining
            } else {
                per_period.min(remaining)
            };
            let interest_portion = if i == 1 { computation.interest } else { Money::ZERO };
            remaining = (remaining - principal_portion).non_negative();

            rows.push(RepaymentInstallment {
                sequence_number: i,
                due_date: self.due_date(start, i)?,
                principal_portion,
                interest_portion,
                total_due: principal_portion + interest_portion,
                remaining_balance: remaining,
                note: None,
            });
        }

        Ok(rows)
    }

    /// method2: principal and interest split evenly over the periods
    fn equal_installment_rows(
        &self,
        terms: &LoanTerms,
        computation: &LoanComputation,
        start: NaiveDate,
    ) -> Result<Vec<RepaymentInstallment>> {
        let periods = terms.method2_periods()?;
        let divisor = Decimal::from(periods);
        let principal_portion = (terms.principal_amount / divisor).round_cents();
        let interest_portion = terms
            .interest()?
            .checked_div(divisor)
            .ok_or_else(|| overflow("interest per period"))?
            .round_cents();
        let payment = computation.payment_per_period;

        let mut rows = Vec::with_capacity(periods as usize + 1);
        for i in 1..=periods {
            let paid_so_far = payment
                .checked_mul(Decimal::from(i))
                .ok_or_else(|| overflow("remaining balance"))?;
            rows.push(RepaymentInstallment {
                sequence_number: i,
                due_date: self.due_date(start, i)?,
                principal_portion,
                interest_portion,
                total_due: payment,
                remaining_balance: (computation.target_amount - paid_so_far).non_negative().round_cents(),
                note: None,
            });
        }

        Ok(rows)
    }

    fn due_date(&self, start: NaiveDate, period: u32) -> Result<NaiveDate> {
        let offset = u64::from(self.config.period_days) * u64::from(period);
        start
            .checked_add_days(Days::new(offset))
            .ok_or_else(|| LoanError::invalid_date_range(format!("due date {} days after {} is out of range", offset, start)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::disbursement::DisbursementCalculator;
    use chrono::TimeZone;
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;

    fn test_time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()))
    }

    fn build(terms: &LoanTerms, time: &SafeTimeProvider) -> RepaymentSchedule {
        let computation = DisbursementCalculator::calculate(terms).unwrap();
        ScheduleGenerator::new(ScheduleConfig::default())
            .generate(terms, &computation, time)
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_method1_schedule() {
        let time = test_time();
        let terms = LoanTerms::method1(
            Money::from_major(10_000),
            Rate::from_decimal(dec!(0.15)),
            Rate::from_decimal(dec!(0.10)),
        );
        let schedule = build(&terms, &time);

        assert_eq!(schedule.installments.len(), 10);

        let first = &schedule.installments[0];
        assert_eq!(first.sequence_number, 1);
        assert_eq!(first.principal_portion, Money::from_major(1_000));
        assert_eq!(first.interest_portion, Money::from_major(1_500));
        assert_eq!(first.total_due, Money::from_major(2_500));
        assert_eq!(first.remaining_balance, Money::from_major(9_000));

        for (idx, row) in schedule.installments.iter().enumerate().skip(1) {
            assert_eq!(row.total_due, Money::from_major(1_000));
            assert_eq!(row.interest_portion, Money::ZERO);
            let expected_remaining = 10_000 - 1_000 * (idx as i64 + 1);
            assert_eq!(row.remaining_balance, Money::from_major(expected_remaining));
        }

        assert_eq!(schedule.installments[9].remaining_balance, Money::ZERO);
        assert_eq!(schedule.total_principal, Money::from_major(10_000));
        assert_eq!(schedule.total_interest, Money::from_major(1_500));
        assert!(schedule.deposit_refund().is_none());
    }

    #[test]
    fn test_method1_final_period_is_capped() {
        let time = test_time();
        let terms = LoanTerms::method1(
            Money::from_major(9_000),
            Rate::from_decimal(dec!(0.1)),
            Rate::from_decimal(dec!(0.3)),
        );
        let schedule = build(&terms, &time);

        let principals: Vec<Money> = schedule.installments.iter().map(|i| i.principal_portion).collect();
        assert_eq!(
            principals,
            vec![
                Money::from_major(2_700),
                Money::from_major(2_700),
                Money::from_major(2_700),
                Money::from_major(900),
            ]
        );
    }

    #[test]
    fn test_method1_principal_sums_exactly() {
        let time = test_time();
        let principals = ["100.01", "10000", "7777.77", "0.05", "12345.67"];
        let ratios = [dec!(0.1), dec!(0.25), dec!(0.3), dec!(0.07), dec!(0.333), dec!(1), dec!(1.5)];

        for principal in principals {
            for ratio in ratios {
                let terms = LoanTerms::method1(
                    Money::from_str_exact(principal).unwrap(),
                    Rate::from_decimal(dec!(0.12)),
                    Rate::from_decimal(ratio),
                );
                let computation = DisbursementCalculator::calculate(&terms).unwrap();
                let schedule = ScheduleGenerator::new(ScheduleConfig::default())
                    .generate(&terms, &computation, &time)
                    .unwrap();

                assert_eq!(schedule.installments.len() as u32, computation.number_of_periods);
                let total: Money = schedule.installments.iter().map(|i| i.principal_portion).sum();
                assert_eq!(total, terms.principal_amount, "principal {} ratio {}", principal, ratio);
                assert!(schedule.installments.iter().all(|i| !i.remaining_balance.is_negative()));
            }
        }
    }

    #[test]
    fn test_method2_schedule() {
        let time = test_time();
        let terms = LoanTerms::method2(Money::from_major(10_000), Rate::from_decimal(dec!(0.20)), 4);
        let schedule = build(&terms, &time);

        assert_eq!(schedule.installments.len(), 4);
        for (idx, row) in schedule.installments.iter().enumerate() {
            assert_eq!(row.principal_portion, Money::from_major(2_500));
            assert_eq!(row.interest_portion, Money::from_major(500));
            assert_eq!(row.total_due, Money::from_major(3_000));
            let expected = 12_000 - 3_000 * (idx as i64 + 1);
            assert_eq!(row.remaining_balance, Money::from_major(expected));
        }
    }

    #[test]
    fn test_method2_total_within_rounding_tolerance() {
        let time = test_time();
        for periods in [3u32, 4, 6, 7, 9, 12] {
            for principal in ["1000", "3333.33", "10000.01"] {
                let terms = LoanTerms::method2(
                    Money::from_str_exact(principal).unwrap(),
                    Rate::from_decimal(dec!(0.17)),
                    periods,
                );
                let computation = DisbursementCalculator::calculate(&terms).unwrap();
                let schedule = ScheduleGenerator::new(ScheduleConfig::default())
                    .generate(&terms, &computation, &time)
                    .unwrap();

                let drift = (schedule.total_due() - computation.target_amount).abs();
                assert!(drift <= Money::CENT * Decimal::from(periods), "drift {} for {} over {}", drift, principal, periods);
            }
        }
    }

    #[test]
    fn test_deposit_refund_row() {
        let time = test_time();
        let terms = LoanTerms::method2(Money::from_major(10_000), Rate::from_decimal(dec!(0.20)), 4)
            .with_deposit(Money::from_major(800));
        let schedule = build(&terms, &time);

        assert_eq!(schedule.installments.len(), 5);
        let refund = schedule.deposit_refund().unwrap();
        assert_eq!(refund.sequence_number, 5);
        assert_eq!(refund.total_due, Money::from_major(-800));
        assert_eq!(refund.principal_portion, Money::ZERO);
        assert_eq!(refund.interest_portion, Money::ZERO);
        assert_eq!(refund.remaining_balance, Money::ZERO);
        assert_eq!(refund.note.as_deref(), Some(DEPOSIT_REFUND_NOTE));
        assert_eq!(refund.due_date, schedule.installments[3].due_date);
        assert_eq!(schedule.total_due(), Money::from_major(12_000));
    }

    #[test]
    fn test_due_dates_every_eight_days() {
        let time = test_time();
        let terms = LoanTerms::method1(
            Money::from_major(1_000),
            Rate::from_decimal(dec!(0.1)),
            Rate::from_decimal(dec!(0.25)),
        );
        let schedule = build(&terms, &time);

        let dates: Vec<NaiveDate> = schedule.installments.iter().map(|i| i.due_date).collect();
        assert_eq!(dates, vec![date(2024, 3, 9), date(2024, 3, 17), date(2024, 3, 25), date(2024, 4, 2)]);
    }

    #[test]
    fn test_custom_cadence() {
        let time = test_time();
        let terms = LoanTerms::method2(Money::from_major(1_000), Rate::ZERO, 2);
        let computation = DisbursementCalculator::calculate(&terms).unwrap();
        let schedule = ScheduleGenerator::new(ScheduleConfig { period_days: 30 })
            .generate(&terms, &computation, &time)
            .unwrap();
        assert_eq!(schedule.installments[1].due_date, date(2024, 4, 30));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let time = test_time();
        let terms = LoanTerms::method1(
            Money::from_major(5_000),
            Rate::from_decimal(dec!(0.15)),
            Rate::from_decimal(dec!(0.2)),
        )
        .with_deposit(Money::from_major(500));

        assert_eq!(build(&terms, &time), build(&terms, &time));
    }

    #[test]
    fn test_oversized_schedules_fail_before_building() {
        let time = test_time();
        let generator = ScheduleGenerator::new(ScheduleConfig::default());

        let terms = LoanTerms::method2(Money::from_major(1_000), Rate::ZERO, u32::MAX);
        let mut computation = DisbursementCalculator::calculate(&LoanTerms::method2(
            Money::from_major(1_000),
            Rate::ZERO,
            4,
        ))
        .unwrap();
        assert!(matches!(
            generator.generate(&terms, &computation, &time),
            Err(LoanError::InvalidTerms { .. })
        ));

        let terms = LoanTerms::method2(Money::from_major(1_000), Rate::ZERO, 4);
        computation.number_of_periods = u32::MAX;
        assert!(matches!(
            generator.generate(&terms, &computation, &time),
            Err(LoanError::InvalidTerms { .. })
        ));

        let terms = LoanTerms::method1(
            Money::from_major(1_000),
            Rate::from_decimal(dec!(0.1)),
            Rate::from_decimal(dec!(0.000000001)),
        );
        assert!(matches!(DisbursementCalculator::calculate(&terms), Err(LoanError::InvalidTerms { .. })));
    }

    #[test]
    fn test_last_due_date_past_calendar_is_invalid_terms() {
        let time = test_time();
        let terms = LoanTerms::method2(Money::from_major(1_000), Rate::ZERO, 2);
        let computation = DisbursementCalculator::calculate(&terms).unwrap();

        let result = ScheduleGenerator::new(ScheduleConfig { period_days: u32::MAX })
            .generate(&terms, &computation, &time);
        assert!(matches!(result, Err(LoanError::InvalidTerms { .. })));
    }

    #[test]
    fn test_rejects_mismatched_computation() {
        let time = test_time();
        let method1 = LoanTerms::method1(Money::from_major(1_000), Rate::ZERO, Rate::from_percentage(50));
        let method2 = LoanTerms::method2(Money::from_major(1_000), Rate::ZERO, 2);
        let computation = DisbursementCalculator::calculate(&method2).unwrap();

        let result = ScheduleGenerator::new(ScheduleConfig::default()).generate(&method1, &computation, &time);
        assert!(matches!(result, Err(LoanError::InvalidTerms { .. })));
    }
}
