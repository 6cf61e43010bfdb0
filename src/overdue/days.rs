use chrono::{DateTime, Days, NaiveDate};
use hourglass_rs::SafeTimeProvider;

use crate::decimal::Money;
use crate::errors::{LoanError, Result};

/// whole days past the grace date, zero once the required amount is paid
pub fn calculate_overdue_days(
    due_date: NaiveDate,
    paid_amount: Money,
    required_amount: Money,
    grace_period_days: u32,
    time_provider: &SafeTimeProvider,
) -> Result<u32> {
    if paid_amount >= required_amount {
        return Ok(0);
    }

    let grace_date = due_date
        .checked_add_days(Days::new(u64::from(grace_period_days)))
        .ok_or_else(|| {
            LoanError::invalid_date_range(format!(
                "grace period of {} days after {} is out of range",
                grace_period_days, due_date
            ))
        })?;

    let today = time_provider.now().date_naive();
    let elapsed = (today - grace_date).num_days().max(0);

    u32::try_from(elapsed)
        .map_err(|_| LoanError::invalid_date_range(format!("{} overdue days out of range", elapsed)))
}

/// parse a due date given either as `YYYY-MM-DD` or as an RFC 3339 timestamp
pub fn parse_due_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
        .map_err(|_| LoanError::invalid_date_range(format!("malformed date '{}'", value)))
}
