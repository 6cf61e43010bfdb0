/// overdue collection - fees, risk tiers and collection advice as arrears age
use chrono::{Duration, TimeZone, Utc};
use loan_engine_rs::{
    CreditHistory, EngineConfig, Loan, LoanTerms, Money, PaymentMethod, Rate, SafeTimeProvider, TimeSource,
};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("loan_engine_rs=info"))
        .init();

    println!("=== overdue collection ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()));
    let controller = time.test_control().unwrap();

    let terms = LoanTerms::method1(
        Money::from_major(20_000),
        Rate::from_decimal(dec!(0.12)),
        Rate::from_decimal(dec!(0.25)),
    );
    let mut loan = Loan::originate(terms, EngineConfig::with_grace_period(2), &time)?;

    let history = CreditHistory {
        overdue_count: 1,
        max_overdue_days: 12,
        total_loans: 3,
        successful_loans: 2,
        is_blacklisted: false,
    };

    // first installment missed, check in as the arrears age
    let mut elapsed = 0;
    for days in [8, 12, 30, 45, 80, 120] {
        controller.advance(Duration::days(days - elapsed));
        elapsed = days;

        let fees = loan.apply_overdue_fees(&time)?;
        let assessment = loan.assess(&history, &time)?;

        println!("day {:>3}: {} days overdue", days, assessment.overdue_days);
        println!("  new fees booked: {}", fees);
        println!("  risk: {:?}, score: {}", assessment.risk_level, assessment.credit_score);
        println!("  customer: {:?}, stage: {:?}", assessment.customer_status, assessment.overdue_stage);
        println!(
            "  advice: {:?} via {:?} ({:?})",
            assessment.collection_advice.priority,
            assessment.collection_advice.methods,
            assessment.collection_advice.timeline
        );
        println!("  next action: {}\n", assessment.collection_advice.next_action);
    }

    // the customer finally pays the first installment with its fees
    let owed = loan.state.installment(1).map(|i| i.amount_required()).unwrap_or(Money::ZERO);
    let result = loan.pay_installment(1, owed, PaymentMethod::Cash, &time)?;
    println!(
        "paid {}: fees {}, interest {}, principal {}",
        owed, result.allocation.fee_portion, result.allocation.interest_portion, result.allocation.principal_portion
    );

    Ok(())
}
