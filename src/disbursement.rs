use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::types::LoanMethod;

/// upper bound on installments per loan, keeps every due date on the calendar
pub const MAX_PERIODS: u32 = 10_000;

/// terms a loan is originated with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal_amount: Money,
    /// fraction of principal charged as interest, 0.15 = 15%
    pub interest_rate: Rate,
    pub loan_method: LoanMethod,
    /// collateral held back at disbursement, refunded after the last installment
    pub deposit_amount: Money,
    pub upfront_fees: Money,
    /// share of principal repaid per period (method1)
    pub principal_rate_per_period: Option<Rate>,
    /// number of installments (method2)
    pub periods: Option<u32>,
}

impl LoanTerms {
    /// method1 terms without deposit or fees
    pub fn method1(principal_amount: Money, interest_rate: Rate, principal_rate_per_period: Rate) -> Self {
        Self {
            principal_amount,
            interest_rate,
            loan_method: LoanMethod::Method1,
            deposit_amount: Money::ZERO,
            upfront_fees: Money::ZERO,
            principal_rate_per_period: Some(principal_rate_per_period),
            periods: None,
        }
    }

    /// method2 terms without deposit or fees
    pub fn method2(principal_amount: Money, interest_rate: Rate, periods: u32) -> Self {
        Self {
            principal_amount,
            interest_rate,
            loan_method: LoanMethod::Method2,
            deposit_amount: Money::ZERO,
            upfront_fees: Money::ZERO,
            principal_rate_per_period: None,
            periods: Some(periods),
        }
    }

    pub fn with_deposit(mut self, deposit_amount: Money) -> Self {
        self.deposit_amount = deposit_amount;
        self
    }

    pub fn with_upfront_fees(mut self, upfront_fees: Money) -> Self {
        self.upfront_fees = upfront_fees;
        self
    }

    /// interest on the principal, unrounded
    pub fn interest(&self) -> Result<Money> {
        self.principal_amount
            .checked_mul(self.interest_rate.as_decimal())
            .ok_or_else(|| overflow("interest"))
    }

    pub fn validate(&self) -> Result<()> {
        if !self.principal_amount.is_positive() {
            return Err(LoanError::invalid_terms(format!(
                "principal amount must be positive, got {}",
                self.principal_amount
            )));
        }
        if self.interest_rate.is_negative() {
            return Err(LoanError::invalid_terms(format!(
                "interest rate cannot be negative, got {}",
                self.interest_rate
            )));
        }
        if self.deposit_amount.is_negative() {
            return Err(LoanError::invalid_terms("deposit amount cannot be negative"));
        }
        if self.upfront_fees.is_negative() {
            return Err(LoanError::invalid_terms("upfront fees cannot be negative"));
        }

        match self.loan_method {
            LoanMethod::Method1 => {
                self.method1_rate()?;
            }
            LoanMethod::Method2 => {
                self.method2_periods()?;
            }
        }

        Ok(())
    }

    pub(crate) fn method1_rate(&self) -> Result<Rate> {
        match self.principal_rate_per_period {
            Some(rate) if rate.is_positive() => Ok(rate),
            Some(rate) => Err(LoanError::invalid_terms(format!(
                "principal rate per period must be positive, got {}",
                rate
            ))),
            None => Err(LoanError::invalid_terms(
                "method1 requires a principal rate per period",
            )),
        }
    }

    pub(crate) fn method2_periods(&self) -> Result<u32> {
        match self.periods {
            Some(0) => Err(LoanError::invalid_terms("periods must be positive")),
            Some(periods) => check_period_count(periods),
            None => Err(LoanError::invalid_terms("method2 requires a number of periods")),
        }
    }
}

/// disbursement economics derived from loan terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanComputation {
    pub loan_method: LoanMethod,
    pub principal_amount: Money,
    pub interest: Money,
    /// amount handed to the borrower, never below zero
    pub received_amount: Money,
    pub payment_per_period: Money,
    pub number_of_periods: u32,
    pub total_repayment: Money,
    pub profit: Money,
    /// method1: principal, method2: principal plus interest
    pub target_amount: Money,
    pub deposit_amount: Money,
    pub upfront_fees: Money,
}

/// computes disbursement and repayment totals for both loan methods
pub struct DisbursementCalculator;

impl DisbursementCalculator {
    pub fn calculate(terms: &LoanTerms) -> Result<LoanComputation> {
        terms.validate()?;

        let principal = terms.principal_amount;
        let interest = terms.interest()?;
        let received = principal
            .checked_sub(interest)
            .and_then(|m| m.checked_sub(terms.deposit_amount))
            .and_then(|m| m.checked_sub(terms.upfront_fees))
            .ok_or_else(|| overflow("received amount"))?
            .non_negative();

        let (payment_per_period, number_of_periods, target_amount) = match terms.loan_method {
            LoanMethod::Method1 => {
                let rate = terms.method1_rate()?;
                let periods = periods_for_rate(rate)?;
                let payment = principal
                    .checked_mul(rate.as_decimal())
                    .and_then(|m| m.checked_add(interest))
                    .ok_or_else(|| overflow("payment per period"))?;
                (payment, periods, principal)
            }
            LoanMethod::Method2 => {
                let periods = terms.method2_periods()?;
                let target = principal.checked_add(interest).ok_or_else(|| overflow("repayment target"))?;
                let payment = target
                    .checked_div(Decimal::from(periods))
                    .ok_or_else(|| overflow("payment per period"))?;
                (payment, periods, target)
            }
        };

        let total_repayment = payment_per_period
            .checked_mul(Decimal::from(number_of_periods))
            .and_then(|m| m.checked_sub(terms.deposit_amount))
            .ok_or_else(|| overflow("total repayment"))?;
        let profit = total_repayment.checked_sub(principal).ok_or_else(|| overflow("profit"))?;

        Ok(LoanComputation {
            loan_method: terms.loan_method,
            principal_amount: principal,
            interest: interest.round_cents(),
            received_amount: received.round_cents(),
            payment_per_period: payment_per_period.round_cents(),
            number_of_periods,
            total_repayment: total_repayment.round_cents(),
            profit: profit.round_cents(),
            target_amount: target_amount.round_cents(),
            deposit_amount: terms.deposit_amount,
            upfront_fees: terms.upfront_fees,
        })
    }
}

/// ceil(1 / rate)
fn periods_for_rate(rate: Rate) -> Result<u32> {
    let too_many =
        || LoanError::invalid_terms(format!("principal rate per period {} yields too many periods", rate));
    let periods = Decimal::ONE
        .checked_div(rate.as_decimal())
        .and_then(|d| d.ceil().to_u32())
        .ok_or_else(too_many)?;
    if periods > MAX_PERIODS {
        return Err(too_many());
    }
    Ok(periods)
}

pub(crate) fn check_period_count(periods: u32) -> Result<u32> {
    if periods > MAX_PERIODS {
        return Err(LoanError::invalid_terms(format!(
            "{} periods exceeds the maximum of {}",
            periods, MAX_PERIODS
        )));
    }
    Ok(periods)
}

pub(crate) fn overflow(what: &str) -> LoanError {
    LoanError::invalid_terms(format!("{} overflows the supported range", what))
}
