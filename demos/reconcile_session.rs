//! A day of cash register reconciliation

use chrono::NaiveDate;
use reconciliation_core::{
    BankEntry, CashEntry, Direction, EngineConfig, Money, ReconciliationEngine, TransferResult,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("🧾 Reconciliation Core - Conferência de Caixa\n");

    let config = EngineConfig::from_env()?;
    let mut engine = ReconciliationEngine::with_config(config)?;
    let date = NaiveDate::from_ymd_opt(2024, 7, 1).ok_or("invalid date")?;

    // 1. Load the parsed bank statement
    println!("🏦 Loading bank statement...");
    let statement = vec![
        BankEntry::new(
            "ext-001".to_string(),
            date,
            Money::parse("150,75")?,
            "PIX RECEBIDO".to_string(),
            "PIX RECEBIDO - MARIA SILVA".to_string(),
        )
        .with_document("123.456.789-09"),
        BankEntry::new(
            "ext-002".to_string(),
            date,
            Money::parse("100,50")?,
            "PIX RECEBIDO".to_string(),
            "PIX RECEBIDO - JOAO SOUZA".to_string(),
        ),
        BankEntry::new(
            "ext-003".to_string(),
            date,
            Money::parse("1.234,56")?,
            "TED".to_string(),
            "TED RECEBIDA - EMPRESA LTDA".to_string(),
        )
        .with_document("12.345.678/0001-90"),
        BankEntry::new(
            "ext-004".to_string(),
            date,
            Money::parse_signed("-12,90")?,
            "TARIFA".to_string(),
            "TARIFA PACOTE SERVICOS".to_string(),
        ),
    ];
    let loaded = engine.ingest_bank_entries(statement)?;
    println!("  ✓ {} statement lines loaded", loaded);

    for entry in engine.list_bank_entries(None) {
        println!(
            "    {} {:>12} {:?} {}",
            entry.id,
            entry.value.format(),
            entry.validation_status,
            entry.description
        );
    }
    println!();

    // 2. Search register values against the statement
    println!("🔎 Searching values...");
    for (text, tolerance) in [("150,75", None), ("1.234,50", Some(10)), ("999,99", None)] {
        let value = Money::parse(text)?;
        match engine.search_and_transfer(value, tolerance)? {
            TransferResult::Transferred {
                cash_entry_id,
                kind,
                difference,
            } => println!(
                "  ✓ {} → {} ({:?}, diferença {})",
                text,
                cash_entry_id,
                kind,
                Money::from_cents(difference as i64).format()
            ),
            TransferResult::NotFound { record } => {
                println!("  ✗ {} não encontrado ({})", text, record.searched_at)
            }
        }
    }
    println!();

    // 3. Register launches made at the counter
    println!("✍️  Manual launches...");
    let withdrawal = engine.add_manual_entry(CashEntry::manual(
        date,
        Money::parse("50,00")?,
        Direction::Outgoing,
        "Saída - troco",
    ))?;
    println!("  ✓ Saída registered: {}", withdrawal);

    // 4. Undo a mistaken transfer
    println!("\n↩️  Undoing transfer of ext-001...");
    let restored = engine.undo_transfer("ext-001")?;
    println!("  ✓ {} back in the statement", restored.id);
    if let Err(e) = engine.undo_transfer("ext-001") {
        println!("  ✓ second undo rejected: {}", e);
    }

    // 5. Totals
    let stats = engine.statistics()?;
    println!("\n📊 Summary");
    println!("  Bank entries pending: {} ({})", stats.bank.count, stats.bank.total_value);
    println!("  Cash entries:         {} ({})", stats.cash.count, stats.cash.total_value);
    println!("  Transferred / manual: {} / {}", stats.transferred_count, stats.manual_count);
    println!("  Not found searches:   {}", stats.unresolved_not_found);
    println!("  Audit trail entries:  {}", stats.actions_logged);

    Ok(())
}
