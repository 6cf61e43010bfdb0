pub mod days;
pub mod penalty;
pub mod risk;

use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::decimal::Money;
use crate::errors::Result;
use crate::types::{CustomerStatus, OverdueStage, RiskLevel};

pub use days::{calculate_overdue_days, parse_due_date};
pub use penalty::{PenaltyCalculation, PenaltyConfig, PenaltyEngine};
pub use risk::{
    calculate_credit_score, calculate_risk_level, derive_customer_status, generate_collection_advice,
    overdue_stage, CollectionAdvice, CreditHistory,
};

/// what is known about one installment and its customer when assessing arrears
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverdueInput {
    pub due_date: NaiveDate,
    pub paid_amount: Money,
    pub required_amount: Money,
    pub history: CreditHistory,
}

/// overdue risk signals for one installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverdueAssessment {
    pub overdue_days: u32,
    pub overdue_amount: Money,
    pub overdue_fee: Money,
    pub risk_level: RiskLevel,
    pub collection_advice: CollectionAdvice,
    pub credit_score: u8,
    pub customer_status: CustomerStatus,
    pub overdue_stage: OverdueStage,
}

/// run every overdue rule against one installment
pub fn assess_overdue(
    input: &OverdueInput,
    config: &EngineConfig,
    time_provider: &SafeTimeProvider,
) -> Result<OverdueAssessment> {
    let overdue_days = calculate_overdue_days(
        input.due_date,
        input.paid_amount,
        input.required_amount,
        config.penalty.grace_period_days,
        time_provider,
    )?;

    let overdue_amount = (input.required_amount - input.paid_amount).non_negative().round_cents();
    let overdue_fee = PenaltyEngine::new(config.penalty.clone()).calculate_overdue_fee(overdue_days, overdue_amount);

    let history = &input.history;
    let risk_level = calculate_risk_level(
        overdue_days,
        history.overdue_count,
        history.is_blacklisted,
        &config.risk,
    );

    Ok(OverdueAssessment {
        overdue_days,
        overdue_amount,
        overdue_fee,
        risk_level,
        collection_advice: generate_collection_advice(overdue_days, risk_level),
        credit_score: calculate_credit_score(history),
        customer_status: derive_customer_status(overdue_days, &config.customer_status),
        overdue_stage: overdue_stage(overdue_days, &config.customer_status),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CollectionMethod, CollectionPriority};
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;

    fn time_at(y: i32, m: u32, d: u32) -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(y, m, d, 8, 0, 0).unwrap()))
    }

    fn input(due: NaiveDate, paid: i64, required: i64, history: CreditHistory) -> OverdueInput {
        OverdueInput {
            due_date: due,
            paid_amount: Money::from_major(paid),
            required_amount: Money::from_major(required),
            history,
        }
    }

    #[test]
    fn test_assessment_for_ten_days_overdue() {
        let time = time_at(2024, 4, 11);
        let due = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let history = CreditHistory {
            overdue_count: 2,
            max_overdue_days: 20,
            total_loans: 5,
            successful_loans: 4,
            is_blacklisted: false,
        };

        let assessment = assess_overdue(&input(due, 0, 1_000, history), &EngineConfig::standard(), &time).unwrap();

        assert_eq!(assessment.overdue_days, 10);
        assert_eq!(assessment.overdue_amount, Money::from_major(1_000));
        assert_eq!(assessment.overdue_fee, Money::from_major(60));
        assert_eq!(assessment.risk_level, RiskLevel::Medium);
        assert_eq!(assessment.collection_advice.priority, CollectionPriority::Medium);
        assert_eq!(assessment.credit_score, 86);
        assert_eq!(assessment.customer_status, CustomerStatus::Negotiating);
        assert_eq!(assessment.overdue_stage, OverdueStage::Early);
    }

    #[test]
    fn test_paid_installment_is_clean() {
        let time = time_at(2024, 9, 1);
        let due = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();

        let assessment =
            assess_overdue(&input(due, 500, 500, CreditHistory::default()), &EngineConfig::standard(), &time).unwrap();

        assert_eq!(assessment.overdue_days, 0);
        assert_eq!(assessment.overdue_amount, Money::ZERO);
        assert_eq!(assessment.overdue_fee, Money::ZERO);
        assert_eq!(assessment.risk_level, RiskLevel::Low);
        assert_eq!(assessment.customer_status, CustomerStatus::Normal);
        assert_eq!(assessment.overdue_stage, OverdueStage::Current);
    }

    #[test]
    fn test_blacklisted_customer() {
        let time = time_at(2024, 4, 3);
        let due = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let history = CreditHistory {
            is_blacklisted: true,
            ..CreditHistory::default()
        };

        let assessment = assess_overdue(&input(due, 0, 100, history), &EngineConfig::standard(), &time).unwrap();

        assert_eq!(assessment.risk_level, RiskLevel::Critical);
        assert_eq!(assessment.credit_score, 0);
        assert_eq!(assessment.collection_advice.priority, CollectionPriority::Critical);
        assert_eq!(assessment.collection_advice.methods[0], CollectionMethod::UrgentCollection);
    }

    #[test]
    fn test_grace_period_from_config() {
        let time = time_at(2024, 4, 11);
        let due = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();

        let assessment = assess_overdue(
            &input(due, 0, 1_000, CreditHistory::default()),
            &EngineConfig::with_grace_period(5),
            &time,
        )
        .unwrap();

        assert_eq!(assessment.overdue_days, 5);
        assert_eq!(assessment.overdue_fee, Money::from_major(55));
    }
}
