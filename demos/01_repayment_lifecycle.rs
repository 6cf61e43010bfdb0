/// repayment lifecycle - equal installments with a deposit, paid to settlement
use chrono::{Duration, TimeZone, Utc};
use loan_engine_rs::{
    EngineConfig, Event, Loan, LoanTerms, Money, PaymentMethod, Rate, SafeTimeProvider, TimeSource,
};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("loan_engine_rs=debug"))
        .init();

    println!("=== repayment lifecycle ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()));
    let controller = time.test_control().unwrap();

    let terms = LoanTerms::method2(Money::from_major(10_000), Rate::from_decimal(dec!(0.20)), 4)
        .with_deposit(Money::from_major(500));
    let mut loan = Loan::originate(terms, EngineConfig::standard(), &time)?.with_customer_id("cust-42");

    println!("received amount: {}", loan.computation.received_amount);
    println!("payment per period: {}", loan.computation.payment_per_period);
    println!("\nschedule:");
    for row in &loan.schedule.installments {
        println!(
            "  #{:<2} {}  due {:>10}  balance {:>10}  {}",
            row.sequence_number,
            row.due_date,
            row.total_due,
            row.remaining_balance,
            row.note.as_deref().unwrap_or("")
        );
    }

    // pay the first installment on time
    controller.advance(Duration::days(8));
    loan.pay_installment(1, Money::from_major(3_000), PaymentMethod::BankTransfer, &time)?;

    // split the second one, the overflow becomes prepaid credit
    controller.advance(Duration::days(8));
    loan.pay_installment(2, Money::from_major(1_000), PaymentMethod::Cash, &time)?;
    let result = loan.pay_installment(2, Money::from_major(2_100), PaymentMethod::Cash, &time)?;
    println!("\nprepaid credit from installment 2: {}", result.allocation.prepaid_credit);

    for seq in 3..=4 {
        controller.advance(Duration::days(8));
        let result = loan.pay_installment(seq, Money::from_major(3_000), PaymentMethod::BankTransfer, &time)?;
        println!("installment {} -> {:?}, settled: {}", seq, result.installment_status, result.loan_settled);
    }

    println!("\nevents:");
    for event in loan.take_events() {
        if let Event::LoanSettled { total_paid, deposit_refund, .. } = event {
            println!("  settled: paid {}, deposit refund {}", total_paid, deposit_refund);
        }
    }

    println!("\nfinal state:");
    println!("{}", loan.to_json_pretty()?);

    // a second loan paid off after one installment, at a negotiated discount
    println!("\n=== early settlement ===\n");
    let terms = LoanTerms::method1(Money::from_major(5_000), Rate::from_decimal(dec!(0.15)), Rate::from_decimal(dec!(0.25)));
    let mut early = Loan::originate(terms, EngineConfig::standard(), &time)?;
    controller.advance(Duration::days(8));
    early.pay_installment(1, Money::from_major(2_000), PaymentMethod::Cash, &time)?;

    controller.advance(Duration::days(3));
    let settlement = early.settle_early(
        Money::from_major(3_500),
        PaymentMethod::BankTransfer,
        Some("payoff-001".to_string()),
        &time,
    )?;
    println!(
        "paid {}, written off {}, installments closed {:?}, status {:?}",
        settlement.amount, settlement.waived, settlement.installments_closed, early.state.status
    );

    Ok(())
}
