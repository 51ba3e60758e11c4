//! Integration tests for reconciliation-core

use std::collections::HashSet;

use chrono::NaiveDate;
use reconciliation_core::{
    compute_totals,
    utils::{MemorySnapshotStorage, StrictEntryValidator},
    ActionKind, BankEntry, CashEntry, CashSource, Direction, EngineConfig, EngineSnapshot,
    EntryFilter, Money, ReconError, ReconciliationEngine, SnapshotStorage, TransferResult,
    ValidationStatus,
};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
}

fn bank(id: &str, cents: i64) -> BankEntry {
    BankEntry::new(
        id.to_string(),
        day(1),
        Money::from_cents(cents),
        "PIX RECEBIDO".to_string(),
        format!("PIX RECEBIDO {}", id),
    )
}

fn engine_with(entries: Vec<BankEntry>) -> ReconciliationEngine {
    let mut engine = ReconciliationEngine::new();
    engine.add_bank_entries(entries).unwrap();
    engine
}

fn assert_disjoint(engine: &ReconciliationEngine) {
    let bank: HashSet<String> = engine
        .list_bank_entries(None)
        .into_iter()
        .map(|e| e.id)
        .collect();
    let cash: HashSet<String> = engine
        .list_cash_entries(None)
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert!(bank.is_disjoint(&cash), "ids in both collections");
}

#[test]
fn test_single_exact_transfer() {
    let mut engine = engine_with(vec![bank("1", 15075)]);

    let result = engine
        .search_and_transfer(Money::parse("150,75").unwrap(), None)
        .unwrap();
    assert!(matches!(result, TransferResult::Transferred { .. }));
    assert!(engine.list_bank_entries(None).is_empty());

    let cash = engine.list_cash_entries(None);
    assert_eq!(cash.len(), 1);
    assert_eq!(cash[0].id, "1");
    assert_eq!(cash[0].value, Money::from_cents(15075));
    assert!(matches!(cash[0].source, CashSource::Transferred { .. }));
}

#[test]
fn test_search_without_match_records_not_found() {
    let mut engine = engine_with(vec![bank("1", 10000)]);

    let result = engine
        .search_and_transfer(Money::from_cents(99999), None)
        .unwrap();
    assert!(matches!(result, TransferResult::NotFound { .. }));
    assert_eq!(engine.not_found_records().len(), 1);
    assert_eq!(engine.not_found_records()[0].value, Money::from_cents(99999));
    assert_eq!(engine.list_bank_entries(None), vec![bank("1", 10000)]);
}

#[test]
fn test_undo_restores_and_second_undo_fails() {
    let mut engine = engine_with(vec![bank("1", 15075)]);
    engine
        .search_and_transfer(Money::from_cents(15075), None)
        .unwrap();

    engine.undo_transfer("1").unwrap();
    assert!(engine.list_cash_entries(None).is_empty());
    assert_eq!(engine.list_bank_entries(None), vec![bank("1", 15075)]);

    let err = engine.undo_transfer("1").unwrap_err();
    assert!(matches!(err, ReconError::NotFound(_)));

    let log = engine.action_log();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].kind, ActionKind::Transfer);
    assert_eq!(log[1].kind, ActionKind::UndoTransfer);
    assert_eq!(log[1].entry_id, "1");
}

#[test]
fn test_identical_values_match_first_inserted() {
    let mut engine = engine_with(vec![bank("1", 10050), bank("2", 10050)]);
    let result = engine
        .search_and_transfer(Money::parse("100,50").unwrap(), None)
        .unwrap();
    assert_eq!(result.cash_entry_id(), Some("1"));
    assert_eq!(engine.list_bank_entries(None), vec![bank("2", 10050)]);
}

#[test]
fn test_totals_net_outgoing_entries() {
    let mut engine = engine_with(vec![bank("1", 20000)]);
    engine.transfer_entry("1").unwrap();
    engine
        .add_manual_entry(CashEntry::manual(
            day(1),
            Money::parse("50,00").unwrap(),
            Direction::Outgoing,
            "Saída para troco",
        ))
        .unwrap();

    let totals = compute_totals(&engine.list_cash_entries(None)).unwrap();
    assert_eq!(totals.count, 2);
    assert_eq!(totals.total_value, Money::from_cents(15000));
    assert_eq!(totals.total_value.format(), "150,00");
}

#[test]
fn test_conservation_and_disjointness_over_sequences() {
    let values = [10000, 2550, 10000, 799, 123456, 2550, 10];
    let entries: Vec<BankEntry> = values
        .iter()
        .enumerate()
        .map(|(i, cents)| bank(&format!("e{}", i), *cents))
        .collect();
    let mut engine = engine_with(entries);
    let initial = engine.conserved_total().unwrap();
    assert_eq!(initial, Money::from_cents(values.iter().sum()));

    // Deterministic pseudo-random walk over transfers, misses and undos
    let mut seed: u64 = 42;
    let mut transferred: Vec<String> = Vec::new();
    for _ in 0..200 {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let pick = (seed >> 33) as usize;

        if pick % 3 == 0 && !transferred.is_empty() {
            let id = transferred.remove(pick % transferred.len());
            engine.undo_transfer(&id).unwrap();
        } else {
            let target = Money::from_cents(values[pick % values.len()] + (pick % 2) as i64);
            let tolerance = if pick % 5 == 0 { Some(1) } else { None };
            if let TransferResult::Transferred { cash_entry_id, .. } =
                engine.search_and_transfer(target, tolerance).unwrap()
            {
                transferred.push(cash_entry_id);
            }
        }

        assert_eq!(engine.conserved_total().unwrap(), initial);
        assert_disjoint(&engine);
    }

    // Manual launches do not disturb the conserved total
    engine
        .add_manual_entry(CashEntry::manual(
            day(2),
            Money::from_cents(999),
            Direction::Incoming,
            "Venda avulsa",
        ))
        .unwrap();
    assert_eq!(engine.conserved_total().unwrap(), initial);
}

#[test]
fn test_manual_entry_collisions_are_rejected() {
    let mut engine = engine_with(vec![bank("1", 100)]);

    let mut manual = CashEntry::manual(day(1), Money::from_cents(100), Direction::Incoming, "Venda");
    manual.id = "1".to_string();
    assert!(matches!(
        engine.add_manual_entry(manual),
        Err(ReconError::DuplicateId(_))
    ));
    assert!(engine.action_log().is_empty());
    assert!(engine.list_cash_entries(None).is_empty());
}

#[test]
fn test_duplicate_upload_is_rejected_wholesale() {
    let mut engine = ReconciliationEngine::new();
    engine
        .ingest_bank_entries(vec![bank("1", 100), bank("2", 200)])
        .unwrap();

    let err = engine
        .ingest_bank_entries(vec![bank("3", 300), bank("2", 200)])
        .unwrap_err();
    assert_eq!(err, ReconError::DuplicateId("2".to_string()));
    assert_eq!(engine.list_bank_entries(None).len(), 2);
}

#[test]
fn test_search_preview_does_not_mutate() {
    let engine = engine_with(vec![bank("a", 10010), bank("b", 10000), bank("c", 9000)]);
    let candidates = engine.search(Money::from_cents(10000), Some(20)).unwrap();
    let ids: Vec<&str> = candidates.iter().map(|c| c.entry.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
    assert_eq!(engine.list_bank_entries(None).len(), 3);
    assert!(engine.not_found_records().is_empty());
}

#[test]
fn test_outgoing_bank_lines_match_negative_targets() {
    let mut engine = engine_with(vec![bank("tarifa", -1290), bank("pix", 1290)]);
    let result = engine
        .search_and_transfer(Money::parse_signed("-12,90").unwrap(), None)
        .unwrap();
    assert_eq!(result.cash_entry_id(), Some("tarifa"));

    let cash = engine.list_cash_entries(None);
    assert_eq!(cash[0].direction, Direction::Outgoing);
}

#[test]
fn test_list_filters_through_engine() {
    let mut engine = ReconciliationEngine::new();
    let mut ted = bank("ted", 500);
    ted.payment_type = "TED".to_string();
    ted.date = day(10);
    engine.add_bank_entries(vec![bank("pix", 100), ted]).unwrap();

    let filter = EntryFilter::new().payment_type("ted");
    assert_eq!(engine.list_bank_entries(Some(&filter)).len(), 1);

    let filter = EntryFilter::new().from_date(day(5));
    let listed = engine.list_bank_entries(Some(&filter));
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "ted");
}

#[test]
fn test_strict_validator_rejects_bad_documents() {
    let mut engine =
        ReconciliationEngine::with_validator(EngineConfig::default(), Box::new(StrictEntryValidator))
            .unwrap();

    let err = engine
        .ingest_bank_entries(vec![bank("1", 100).with_document("12")])
        .unwrap_err();
    assert!(matches!(err, ReconError::Validation(_)));
    assert!(engine.list_bank_entries(None).is_empty());

    engine
        .ingest_bank_entries(vec![bank("2", 100).with_document("12.345.678/0001-90")])
        .unwrap();
    engine
        .set_validation_status("2", ValidationStatus::Warning)
        .unwrap();
    assert_eq!(
        engine.list_bank_entries(None)[0].validation_status,
        ValidationStatus::Warning
    );
}

#[test]
fn test_snapshot_round_trip_through_json() {
    let mut engine = engine_with(vec![bank("1", 100), bank("2", 200), bank("3", 300)]);
    engine.transfer_entry("1").unwrap();
    engine
        .search_and_transfer(Money::from_cents(7), None)
        .unwrap();
    engine
        .add_manual_entry(CashEntry::manual(
            day(3),
            Money::from_cents(50),
            Direction::Outgoing,
            "Sangria",
        ))
        .unwrap();

    let json = serde_json::to_string(&engine.export_state()).unwrap();
    let snapshot: EngineSnapshot = serde_json::from_str(&json).unwrap();

    let mut restored = ReconciliationEngine::new();
    restored.import_state(snapshot).unwrap();
    assert_eq!(restored.list_bank_entries(None), engine.list_bank_entries(None));
    assert_eq!(restored.list_cash_entries(None), engine.list_cash_entries(None));
    assert_eq!(restored.not_found_records(), engine.not_found_records());
    assert_eq!(restored.action_log(), engine.action_log());

    // Undo after restore puts the entry back at its original place
    restored.undo_transfer("1").unwrap();
    let ids: Vec<String> = restored
        .list_bank_entries(None)
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_persist_and_restore_session() {
    let mut storage = MemorySnapshotStorage::new();
    let mut engine = engine_with(vec![bank("1", 15075), bank("2", 990)]);
    engine
        .search_and_transfer(Money::from_cents(15075), None)
        .unwrap();
    engine.persist(&mut storage, "caixa-2024-07-01").await.unwrap();

    let mut next_session = ReconciliationEngine::new();
    assert!(next_session
        .restore(&storage, "caixa-2024-07-01")
        .await
        .unwrap());
    assert_eq!(next_session.statistics().unwrap(), engine.statistics().unwrap());

    let mut empty = ReconciliationEngine::new();
    assert!(!empty.restore(&storage, "missing").await.unwrap());
    assert_eq!(storage.list_sessions().await.unwrap().len(), 1);
}
