/// quick start - record a loan, prepay it and ask which loan to prepay next
use personal_ledger_rs::chrono::NaiveDate;
use personal_ledger_rs::{
    EarlyPaymentPolicy, EngineConfig, Ledger, Loan, MemoryStore, Money, Rate, SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== quick start example ===\n");

    let time = SafeTimeProvider::new(TimeSource::System);
    let today = time.now().date_naive();
    let mut ledger = Ledger::new(MemoryStore::new(), EngineConfig::default())?;

    let start = NaiveDate::from_ymd_opt(2024, 1, 15).ok_or("bad date")?;
    let loan = Loan::new(
        1,
        "Sber",
        Money::from_major(15_000),
        40,
        Rate::from_percentage(12),
        Money::from_major(500_000),
        start,
    )?
    .with_elapsed_months(10)?;
    let loan = ledger.add_loan(loan)?;

    ledger.add_loan(Loan::new(
        1,
        "card",
        Money::from_major(5_000),
        24,
        Rate::from_percentage(24),
        Money::from_major(80_000),
        start,
    )?)?;

    // see what a prepayment would do before committing to it
    let preview = ledger.preview_early_payment(loan.id, Money::from_major(100_000), EarlyPaymentPolicy::ReduceTerm)?;
    println!(
        "prepaying 100000 saves {} months and {}",
        preview.months_saved, preview.amount_saved
    );

    ledger.record_regular_payment(loan.id, Money::from_major(15_000), today, &time)?;
    ledger.record_early_payment(
        loan.id,
        Money::from_major(100_000),
        EarlyPaymentPolicy::ReduceTerm,
        today,
        &time,
    )?;

    if let Some(plan) = ledger.payoff_advice(1)? {
        println!(
            "prepay '{}' first ({:?}), then {:?}",
            plan.target_name(),
            plan.strategy,
            plan.recommended_policy
        );
    }

    println!("{}", ledger.report(1, &time)?.to_json_pretty()?);

    Ok(())
}
