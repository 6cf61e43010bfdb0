use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::overdue::PenaltyConfig;

/// engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub schedule: ScheduleConfig,
    pub penalty: PenaltyConfig,
    pub risk: RiskThresholds,
    pub customer_status: StatusThresholds,
}

/// repayment schedule cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// days between installments, first installment due one period after generation
    pub period_days: u32,
}

/// risk tier thresholds, a tier applies when either its days or its count is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub critical_days: u32,
    pub critical_count: u32,
    pub high_days: u32,
    pub high_count: u32,
    pub medium_days: u32,
    pub medium_count: u32,
}

/// customer status thresholds in overdue days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusThresholds {
    pub negotiation_threshold: u32,
    pub bad_debt_threshold: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { period_days: 8 }
    }
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            critical_days: 90,
            critical_count: 5,
            high_days: 30,
            high_count: 3,
            medium_days: 7,
            medium_count: 1,
        }
    }
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            negotiation_threshold: 30,
            bad_debt_threshold: 90,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl EngineConfig {
    /// business defaults: 8-day cadence, 0.1%/day penalty plus 50 fixed, no grace period
    pub fn standard() -> Self {
        Self {
            schedule: ScheduleConfig::default(),
            penalty: PenaltyConfig {
                daily_penalty_rate: dec!(0.1),
                fixed_penalty: Money::from_major(50),
                grace_period_days: 0,
            },
            risk: RiskThresholds::default(),
            customer_status: StatusThresholds::default(),
        }
    }

    /// same as standard with a grace period before installments count as overdue
    pub fn with_grace_period(grace_period_days: u32) -> Self {
        let mut config = Self::standard();
        config.penalty.grace_period_days = grace_period_days;
        config
    }

    /// parse and validate a json configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| LoanError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| LoanError::InvalidConfiguration {
            message: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.schedule.period_days == 0 {
            return Err(invalid("schedule.period_days must be positive"));
        }
        if self.penalty.daily_penalty_rate.is_sign_negative() {
            return Err(invalid("penalty.daily_penalty_rate cannot be negative"));
        }
        if self.penalty.fixed_penalty.is_negative() {
            return Err(invalid("penalty.fixed_penalty cannot be negative"));
        }

        let risk = &self.risk;
        if !(risk.medium_days <= risk.high_days && risk.high_days <= risk.critical_days) {
            return Err(invalid("risk day thresholds must be ordered medium <= high <= critical"));
        }
        if !(risk.medium_count <= risk.high_count && risk.high_count <= risk.critical_count) {
            return Err(invalid("risk count thresholds must be ordered medium <= high <= critical"));
        }

        let status = &self.customer_status;
        if status.negotiation_threshold > status.bad_debt_threshold {
            return Err(invalid("negotiation_threshold cannot exceed bad_debt_threshold"));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> LoanError {
    LoanError::InvalidConfiguration {
        message: message.to_string(),
    }
}
