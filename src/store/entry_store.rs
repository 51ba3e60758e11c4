//! Bank and cash entry collections

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::money::Money;
use crate::types::*;

/// Which collection currently owns an id, and at which insertion position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    Bank(u64),
    Cash(u64),
}

/// Predicate over date range and payment type used by the list operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Case-insensitive match against the payment type
    pub payment_type: Option<String>,
}

impl EntryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn until_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    pub fn payment_type(mut self, payment_type: impl Into<String>) -> Self {
        self.payment_type = Some(payment_type.into());
        self
    }

    fn matches_date(&self, date: NaiveDate) -> bool {
        self.start_date.is_none_or(|start| date >= start)
            && self.end_date.is_none_or(|end| date <= end)
    }

    fn matches_type(&self, payment_type: Option<&str>) -> bool {
        match (&self.payment_type, payment_type) {
            (None, _) => true,
            (Some(wanted), Some(actual)) => wanted.eq_ignore_ascii_case(actual.trim()),
            (Some(_), None) => false,
        }
    }

    pub fn matches_bank(&self, entry: &BankEntry) -> bool {
        self.matches_date(entry.date) && self.matches_type(Some(&entry.payment_type))
    }

    /// Cash entries only carry a payment type when they were transferred
    pub fn matches_cash(&self, entry: &CashEntry) -> bool {
        let payment_type = match &entry.source {
            CashSource::Transferred { origin, .. } => Some(origin.payment_type.as_str()),
            CashSource::Manual => None,
        };
        self.matches_date(entry.date) && self.matches_type(payment_type)
    }
}

/// Holds the two disjoint collections, each kept in insertion order
///
/// Every id lives in exactly one place, tracked by a single index, so a
/// transfer is a move of ownership rather than a copy.
#[derive(Debug, Clone, Default)]
pub struct EntryStore {
    bank: BTreeMap<u64, BankEntry>,
    cash: BTreeMap<u64, CashEntry>,
    index: HashMap<String, Location>,
    next_position: u64,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_position(&mut self) -> u64 {
        let position = self.next_position;
        self.next_position += 1;
        position
    }

    /// Bulk insert; the whole batch is rejected if any id collides
    pub fn add_bank_entries(&mut self, entries: Vec<BankEntry>) -> ReconResult<()> {
        let mut incoming = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if entry.id.trim().is_empty() {
                return Err(ReconError::Validation(
                    "Bank entry id cannot be empty".to_string(),
                ));
            }
            if self.index.contains_key(&entry.id) || !incoming.insert(entry.id.as_str()) {
                return Err(ReconError::DuplicateId(entry.id.clone()));
            }
            check_value_range(&entry.id, entry.value)?;
        }

        for entry in entries {
            let position = self.allocate_position();
            self.index.insert(entry.id.clone(), Location::Bank(position));
            self.bank.insert(position, entry);
        }
        Ok(())
    }

    /// Take a bank entry out of the store
    pub fn remove_bank_entry(&mut self, id: &str) -> ReconResult<BankEntry> {
        self.take_bank_entry(id).map(|(_, entry)| entry)
    }

    pub fn add_cash_entry(&mut self, entry: CashEntry) -> ReconResult<()> {
        if entry.id.trim().is_empty() {
            return Err(ReconError::Validation(
                "Cash entry id cannot be empty".to_string(),
            ));
        }
        if self.index.contains_key(&entry.id) {
            return Err(ReconError::DuplicateId(entry.id));
        }
        if let Some(origin_id) = entry.bank_entry_id() {
            if origin_id != entry.id {
                return Err(ReconError::Validation(format!(
                    "cash entry '{}' references bank entry '{}'",
                    entry.id, origin_id
                )));
            }
        }
        check_value_range(&entry.id, entry.value)?;
        let position = self.allocate_position();
        self.index.insert(entry.id.clone(), Location::Cash(position));
        self.cash.insert(position, entry);
        Ok(())
    }

    pub fn remove_cash_entry(&mut self, id: &str) -> ReconResult<CashEntry> {
        match self.index.get(id) {
            Some(Location::Cash(position)) => {
                let position = *position;
                let entry = self
                    .cash
                    .remove(&position)
                    .ok_or_else(|| ReconError::NotFound(format!("cash entry '{}'", id)))?;
                self.index.remove(id);
                Ok(entry)
            }
            _ => Err(ReconError::NotFound(format!("cash entry '{}'", id))),
        }
    }

    pub fn get_bank_entry(&self, id: &str) -> Option<&BankEntry> {
        match self.index.get(id) {
            Some(Location::Bank(position)) => self.bank.get(position),
            _ => None,
        }
    }

    pub fn get_cash_entry(&self, id: &str) -> Option<&CashEntry> {
        match self.index.get(id) {
            Some(Location::Cash(position)) => self.cash.get(position),
            _ => None,
        }
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// The only in-place change a bank entry accepts
    pub fn set_validation_status(&mut self, id: &str, status: ValidationStatus) -> ReconResult<()> {
        match self.index.get(id) {
            Some(Location::Bank(position)) => {
                if let Some(entry) = self.bank.get_mut(position) {
                    entry.validation_status = status;
                    return Ok(());
                }
                Err(ReconError::NotFound(format!("bank entry '{}'", id)))
            }
            _ => Err(ReconError::NotFound(format!("bank entry '{}'", id))),
        }
    }

    /// Bank entries in insertion order, optionally filtered
    pub fn list_bank_entries(&self, filter: Option<&EntryFilter>) -> Vec<BankEntry> {
        self.bank
            .values()
            .filter(|entry| filter.is_none_or(|f| f.matches_bank(entry)))
            .cloned()
            .collect()
    }

    /// Cash entries in insertion order, optionally filtered
    pub fn list_cash_entries(&self, filter: Option<&EntryFilter>) -> Vec<CashEntry> {
        self.cash
            .values()
            .filter(|entry| filter.is_none_or(|f| f.matches_cash(entry)))
            .cloned()
            .collect()
    }

    /// Borrowing iterator over bank entries in insertion order
    pub fn bank_entries(&self) -> impl Iterator<Item = &BankEntry> {
        self.bank.values()
    }

    pub fn cash_entries(&self) -> impl Iterator<Item = &CashEntry> {
        self.cash.values()
    }

    /// Bank entries paired with their insertion positions
    pub fn positioned_bank_entries(&self) -> impl Iterator<Item = (u64, &BankEntry)> {
        self.bank.iter().map(|(position, entry)| (*position, entry))
    }

    pub fn bank_len(&self) -> usize {
        self.bank.len()
    }

    pub fn cash_len(&self) -> usize {
        self.cash.len()
    }

    /// Move a bank entry into the cash collection in one step
    ///
    /// All checks happen before either collection is touched, so on error
    /// nothing has changed.
    pub fn transfer_to_cash(&mut self, id: &str) -> ReconResult<CashEntry> {
        let position = match self.index.get(id) {
            Some(Location::Bank(position)) => *position,
            _ => return Err(ReconError::NotFound(format!("bank entry '{}'", id))),
        };
        let origin = self
            .bank
            .remove(&position)
            .ok_or_else(|| ReconError::NotFound(format!("bank entry '{}'", id)))?;

        let cash_entry = CashEntry::from_transfer(origin, position);
        let cash_position = self.allocate_position();
        self.index
            .insert(cash_entry.id.clone(), Location::Cash(cash_position));
        self.cash.insert(cash_position, cash_entry.clone());
        Ok(cash_entry)
    }

    /// Move a transferred cash entry back to its original bank position
    pub fn restore_to_bank(&mut self, id: &str) -> ReconResult<BankEntry> {
        let cash_position = match self.index.get(id) {
            Some(Location::Cash(position)) => *position,
            _ => return Err(ReconError::NotFound(format!("transferred cash entry '{}'", id))),
        };
        let bank_position = match self.cash.get(&cash_position).map(|entry| &entry.source) {
            Some(CashSource::Transferred {
                origin,
                bank_position,
            }) => {
                if origin.id != id && self.index.contains_key(&origin.id) {
                    return Err(ReconError::DuplicateId(origin.id.clone()));
                }
                *bank_position
            }
            _ => return Err(ReconError::NotFound(format!("transferred cash entry '{}'", id))),
        };
        // The original slot can only be occupied after a snapshot import with
        // clashing positions; fall back to appending in that case.
        let bank_position = if self.bank.contains_key(&bank_position) {
            self.allocate_position()
        } else {
            bank_position
        };

        let origin = match self.cash.remove(&cash_position) {
            Some(CashEntry {
                source: CashSource::Transferred { origin, .. },
                ..
            }) => origin,
            _ => return Err(ReconError::NotFound(format!("transferred cash entry '{}'", id))),
        };
        self.index.remove(id);
        self.index
            .insert(origin.id.clone(), Location::Bank(bank_position));
        self.bank.insert(bank_position, origin.clone());
        Ok(origin)
    }

    /// Rebuild a store from positioned bank entries and ordered cash entries
    pub fn from_parts(
        bank_entries: Vec<(u64, BankEntry)>,
        cash_entries: Vec<CashEntry>,
    ) -> ReconResult<Self> {
        let mut store = EntryStore::new();

        for (position, entry) in bank_entries {
            if entry.id.trim().is_empty() {
                return Err(ReconError::Validation(
                    "Bank entry id cannot be empty".to_string(),
                ));
            }
            if store.index.contains_key(&entry.id) {
                return Err(ReconError::DuplicateId(entry.id));
            }
            if store.bank.contains_key(&position) {
                return Err(ReconError::Validation(format!(
                    "Bank position {} used twice",
                    position
                )));
            }
            check_value_range(&entry.id, entry.value)?;
            store.index.insert(entry.id.clone(), Location::Bank(position));
            store.bank.insert(position, entry);
        }

        // Keep fresh positions clear of anything a bank entry held or will hold again
        let highest_origin = cash_entries
            .iter()
            .filter_map(|entry| match &entry.source {
                CashSource::Transferred { bank_position, .. } => Some(*bank_position),
                CashSource::Manual => None,
            })
            .max();
        let highest_bank = store.bank.keys().next_back().copied();
        store.next_position = highest_origin
            .into_iter()
            .chain(highest_bank)
            .max()
            .map_or(0, |p| p + 1);

        for entry in cash_entries {
            store.add_cash_entry(entry)?;
        }
        Ok(store)
    }

    fn take_bank_entry(&mut self, id: &str) -> ReconResult<(u64, BankEntry)> {
        match self.index.get(id) {
            Some(Location::Bank(position)) => {
                let position = *position;
                let entry = self
                    .bank
                    .remove(&position)
                    .ok_or_else(|| ReconError::NotFound(format!("bank entry '{}'", id)))?;
                self.index.remove(id);
                Ok((position, entry))
            }
            _ => Err(ReconError::NotFound(format!("bank entry '{}'", id))),
        }
    }
}

fn check_value_range(id: &str, value: Money) -> ReconResult<()> {
    if value.is_within_limits() {
        Ok(())
    } else {
        Err(ReconError::Validation(format!(
            "entry '{}' value {} is out of range",
            id, value
        )))
    }
}
