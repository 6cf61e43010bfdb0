use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::{RiskThresholds, StatusThresholds};
use crate::types::{
    CollectionMethod, CollectionPriority, CollectionTimeline, CustomerStatus, OverdueStage, RiskLevel,
};

/// repayment track record of a customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CreditHistory {
    pub overdue_count: u32,
    pub max_overdue_days: u32,
    pub total_loans: u32,
    pub successful_loans: u32,
    pub is_blacklisted: bool,
}

/// risk tier, first matching rule wins
pub fn calculate_risk_level(
    overdue_days: u32,
    overdue_count: u32,
    is_blacklisted: bool,
    thresholds: &RiskThresholds,
) -> RiskLevel {
    if is_blacklisted {
        RiskLevel::Critical
    } else if overdue_days >= thresholds.critical_days || overdue_count >= thresholds.critical_count {
        RiskLevel::Critical
    } else if overdue_days >= thresholds.high_days || overdue_count >= thresholds.high_count {
        RiskLevel::High
    } else if overdue_days >= thresholds.medium_days || overdue_count >= thresholds.medium_count {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// recommended collection response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionAdvice {
    pub priority: CollectionPriority,
    pub methods: Vec<CollectionMethod>,
    pub next_action: String,
    pub timeline: CollectionTimeline,
}

/// advice by overdue-day bucket, escalated when the risk tier is critical
pub fn generate_collection_advice(overdue_days: u32, risk_level: RiskLevel) -> CollectionAdvice {
    use CollectionMethod::*;

    let (priority, methods, next_action, timeline) = match overdue_days {
        0..=7 => (
            CollectionPriority::Low,
            vec![Phone, Sms],
            "send a friendly repayment reminder",
            CollectionTimeline::OneToThreeDays,
        ),
        8..=30 => (
            CollectionPriority::Medium,
            vec![Phone, Sms, Email],
            "step up collection and find out the customer's situation",
            CollectionTimeline::ThreeToSevenDays,
        ),
        31..=60 => (
            CollectionPriority::High,
            vec![InPerson, LegalNotice, NegotiatedSettlement],
            "negotiate a repayment plan or prepare legal action",
            CollectionTimeline::Immediate,
        ),
        _ => (
            CollectionPriority::Critical,
            vec![Litigation, CreditBureauReport, AssetSeizure],
            "start legal proceedings",
            CollectionTimeline::Immediate,
        ),
    };

    let mut advice = CollectionAdvice {
        priority,
        methods,
        next_action: next_action.to_string(),
        timeline,
    };

    if risk_level == RiskLevel::Critical {
        advice.priority = CollectionPriority::Critical;
        advice.methods.insert(0, UrgentCollection);
    }

    advice
}

/// credit score in 0..=100, higher is better
pub fn calculate_credit_score(history: &CreditHistory) -> u8 {
    if history.is_blacklisted {
        return 0;
    }

    let mut score = dec!(100);
    score -= Decimal::from(history.overdue_count) * dec!(10);
    score -= (Decimal::from(history.max_overdue_days) * dec!(0.5)).min(dec!(30));

    if history.total_loans > 0 {
        let success_rate = Decimal::from(history.successful_loans) / Decimal::from(history.total_loans);
        score += success_rate * dec!(20);
    }

    score
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .clamp(Decimal::ZERO, dec!(100))
        .to_u8()
        .unwrap_or(0)
}

/// customer standing: normal, negotiating up to the bad-debt threshold, bad debt beyond it
pub fn derive_customer_status(overdue_days: u32, thresholds: &StatusThresholds) -> CustomerStatus {
    if overdue_days == 0 {
        CustomerStatus::Normal
    } else if overdue_days <= thresholds.bad_debt_threshold {
        CustomerStatus::Negotiating
    } else {
        CustomerStatus::BadDebt
    }
}

/// portfolio bucket for overdue statistics
pub fn overdue_stage(overdue_days: u32, thresholds: &StatusThresholds) -> OverdueStage {
    if overdue_days == 0 {
        OverdueStage::Current
    } else if overdue_days <= thresholds.negotiation_threshold {
        OverdueStage::Early
    } else if overdue_days <= thresholds.bad_debt_threshold {
        OverdueStage::Late
    } else {
        OverdueStage::BadDebt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn risk(days: u32, count: u32, blacklisted: bool) -> RiskLevel {
        calculate_risk_level(days, count, blacklisted, &RiskThresholds::default())
    }

    #[test]
    fn test_blacklist_overrides_everything() {
        assert_eq!(risk(0, 0, true), RiskLevel::Critical);
    }

    #[test]
    fn test_risk_tiers() {
        assert_eq!(risk(0, 0, false), RiskLevel::Low);
        assert_eq!(risk(6, 0, false), RiskLevel::Low);
        assert_eq!(risk(7, 0, false), RiskLevel::Medium);
        assert_eq!(risk(0, 1, false), RiskLevel::Medium);
        assert_eq!(risk(30, 0, false), RiskLevel::High);
        assert_eq!(risk(2, 3, false), RiskLevel::High);
        assert_eq!(risk(89, 4, false), RiskLevel::High);
        assert_eq!(risk(90, 0, false), RiskLevel::Critical);
        assert_eq!(risk(0, 5, false), RiskLevel::Critical);
    }

    #[test]
    fn test_advice_buckets() {
        let low = generate_collection_advice(7, RiskLevel::Low);
        assert_eq!(low.priority, CollectionPriority::Low);
        assert_eq!(low.methods, vec![CollectionMethod::Phone, CollectionMethod::Sms]);
        assert_eq!(low.timeline, CollectionTimeline::OneToThreeDays);

        let medium = generate_collection_advice(8, RiskLevel::Medium);
        assert_eq!(medium.priority, CollectionPriority::Medium);
        assert_eq!(medium.methods.len(), 3);
        assert_eq!(medium.timeline, CollectionTimeline::ThreeToSevenDays);

        let high = generate_collection_advice(31, RiskLevel::High);
        assert_eq!(high.priority, CollectionPriority::High);
        assert_eq!(
            high.methods,
            vec![
                CollectionMethod::InPerson,
                CollectionMethod::LegalNotice,
                CollectionMethod::NegotiatedSettlement
            ]
        );
        assert_eq!(high.timeline, CollectionTimeline::Immediate);

        let critical = generate_collection_advice(61, RiskLevel::High);
        assert_eq!(critical.priority, CollectionPriority::Critical);
        assert_eq!(critical.methods[0], CollectionMethod::Litigation);
    }

    #[test]
    fn test_critical_risk_escalates_advice() {
        let advice = generate_collection_advice(2, RiskLevel::Critical);
        assert_eq!(advice.priority, CollectionPriority::Critical);
        assert_eq!(
            advice.methods,
            vec![CollectionMethod::UrgentCollection, CollectionMethod::Phone, CollectionMethod::Sms]
        );
        assert_eq!(advice.timeline, CollectionTimeline::OneToThreeDays);
    }

    #[test]
    fn test_credit_score_example() {
        let history = CreditHistory {
            overdue_count: 2,
            max_overdue_days: 20,
            total_loans: 5,
            successful_loans: 4,
            is_blacklisted: false,
        };
        assert_eq!(calculate_credit_score(&history), 86);
    }

    #[test]
    fn test_credit_score_bounds() {
        assert_eq!(calculate_credit_score(&CreditHistory::default()), 100);

        let perfect = CreditHistory {
            total_loans: 3,
            successful_loans: 3,
            ..CreditHistory::default()
        };
        assert_eq!(calculate_credit_score(&perfect), 100);

        let terrible = CreditHistory {
            overdue_count: 12,
            max_overdue_days: 400,
            ..CreditHistory::default()
        };
        assert_eq!(calculate_credit_score(&terrible), 0);

        let blacklisted = CreditHistory {
            total_loans: 10,
            successful_loans: 10,
            is_blacklisted: true,
            ..CreditHistory::default()
        };
        assert_eq!(calculate_credit_score(&blacklisted), 0);
    }

    #[test]
    fn test_credit_score_rounds_half_up() {
        let history = CreditHistory {
            overdue_count: 1,
            max_overdue_days: 3,
            ..CreditHistory::default()
        };
        // 100 - 10 - 1.5
        assert_eq!(calculate_credit_score(&history), 89);

        let history = CreditHistory {
            max_overdue_days: 1,
            total_loans: 3,
            successful_loans: 1,
            ..CreditHistory::default()
        };
        // 100 - 0.5 + 6.67
        assert_eq!(calculate_credit_score(&history), 100);
    }

    #[test]
    fn test_customer_status() {
        let thresholds = StatusThresholds::default();
        assert_eq!(derive_customer_status(0, &thresholds), CustomerStatus::Normal);
        assert_eq!(derive_customer_status(1, &thresholds), CustomerStatus::Negotiating);
        assert_eq!(derive_customer_status(30, &thresholds), CustomerStatus::Negotiating);
        assert_eq!(derive_customer_status(60, &thresholds), CustomerStatus::Negotiating);
        assert_eq!(derive_customer_status(90, &thresholds), CustomerStatus::Negotiating);
        assert_eq!(derive_customer_status(91, &thresholds), CustomerStatus::BadDebt);
    }

    #[test]
    fn test_overdue_stage() {
        let thresholds = StatusThresholds::default();
        assert_eq!(overdue_stage(0, &thresholds), OverdueStage::Current);
        assert_eq!(overdue_stage(30, &thresholds), OverdueStage::Early);
        assert_eq!(overdue_stage(31, &thresholds), OverdueStage::Late);
        assert_eq!(overdue_stage(90, &thresholds), OverdueStage::Late);
        assert_eq!(overdue_stage(91, &thresholds), OverdueStage::BadDebt);
    }
}
