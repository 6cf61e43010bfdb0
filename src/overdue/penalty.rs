use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;

/// overdue penalty configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyConfig {
    /// percent of the overdue amount charged per day (0.1 = 0.1%)
    pub daily_penalty_rate: Decimal,
    /// flat amount added once an installment is overdue
    pub fixed_penalty: Money,
    /// days after the due date before an installment counts as overdue
    pub grace_period_days: u32,
}

/// engine for calculating overdue fees
pub struct PenaltyEngine {
    pub config: PenaltyConfig,
}

impl PenaltyEngine {
    pub fn new(config: PenaltyConfig) -> Self {
        Self { config }
    }

    /// overdue fee for the given days, zero when nothing is overdue
    pub fn calculate_overdue_fee(&self, overdue_days: u32, overdue_amount: Money) -> Money {
        self.calculate_penalty(overdue_days, overdue_amount).total_fee
    }

    /// fee with its daily and fixed components
    pub fn calculate_penalty(&self, overdue_days: u32, overdue_amount: Money) -> PenaltyCalculation {
        if overdue_days == 0 {
            return PenaltyCalculation {
                total_fee: Money::ZERO,
                daily_component: Money::ZERO,
                fixed_component: Money::ZERO,
                days_charged: 0,
                overdue_base: overdue_amount,
            };
        }

        let daily_component = overdue_amount.percentage(self.config.daily_penalty_rate) * Decimal::from(overdue_days);
        let fixed_component = self.config.fixed_penalty;

        PenaltyCalculation {
            total_fee: (daily_component + fixed_component).round_cents(),
            daily_component: daily_component.round_cents(),
            fixed_component,
            days_charged: overdue_days,
            overdue_base: overdue_amount,
        }
    }
}

/// overdue fee breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyCalculation {
    pub total_fee: Money,
    pub daily_component: Money,
    pub fixed_component: Money,
    pub days_charged: u32,
    pub overdue_base: Money,
}
