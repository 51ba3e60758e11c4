//! Persisting a session and restoring it through a storage backend

use chrono::NaiveDate;
use reconciliation_core::utils::MemorySnapshotStorage;
use reconciliation_core::{BankEntry, Money, ReconciliationEngine, SnapshotStorage};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("💾 Reconciliation Core - Backup and Restore\n");

    let mut storage = MemorySnapshotStorage::new();
    let mut engine = ReconciliationEngine::new();
    let date = NaiveDate::from_ymd_opt(2024, 7, 2).ok_or("invalid date")?;

    engine.ingest_bank_entries(vec![
        BankEntry::new(
            "a1".to_string(),
            date,
            Money::parse("20,00")?,
            "PIX RECEBIDO".to_string(),
            "PIX".to_string(),
        ),
        BankEntry::new(
            "a2".to_string(),
            date,
            Money::parse("35,10")?,
            "CARTAO DEBITO".to_string(),
            "REDE DEBITO".to_string(),
        ),
    ])?;
    engine.search_and_transfer(Money::parse("20,00")?, None)?;

    engine.persist(&mut storage, "caixa-2024-07-02").await?;
    println!("  ✓ Session saved");

    let snapshot = engine.export_state();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    let mut restored = ReconciliationEngine::new();
    if restored.restore(&storage, "caixa-2024-07-02").await? {
        println!(
            "  ✓ Restored {} bank and {} cash entries",
            restored.list_bank_entries(None).len(),
            restored.list_cash_entries(None).len()
        );
    }

    println!("  Sessions: {:?}", storage.list_sessions().await?);
    Ok(())
}
