/// quick start - originate a loan and pay the first installment
use loan_engine_rs::{EngineConfig, Loan, LoanTerms, Money, PaymentMethod, Rate, SafeTimeProvider, TimeSource};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // 10,000 at 15% interest, 10% of principal due every period
    let terms = LoanTerms::method1(
        Money::from_major(10_000),
        Rate::from_decimal(dec!(0.15)),
        Rate::from_decimal(dec!(0.10)),
    );

    let time = SafeTimeProvider::new(TimeSource::System);
    let mut loan = Loan::originate(terms, EngineConfig::standard(), &time)?;

    // first installment carries all of the interest
    loan.pay_installment(1, Money::from_major(2_500), PaymentMethod::BankTransfer, &time)?;

    println!("{}", loan.to_json_pretty()?);

    Ok(())
}
