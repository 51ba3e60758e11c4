//! Validation utilities

use crate::money::Direction;
use crate::traits::*;
use crate::types::*;

/// Validate that an entry ID is valid
pub fn validate_entry_id(entry_id: &str) -> ReconResult<()> {
    if entry_id.trim().is_empty() {
        return Err(ReconError::Validation(
            "Entry ID cannot be empty".to_string(),
        ));
    }

    if entry_id.len() > 64 {
        return Err(ReconError::Validation(
            "Entry ID cannot exceed 64 characters".to_string(),
        ));
    }

    // Check for valid characters (alphanumeric, dashes, underscores)
    if !entry_id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ReconError::Validation(
            "Entry ID can only contain alphanumeric characters, dashes, and underscores"
                .to_string(),
        ));
    }

    Ok(())
}

/// Validate that a counterparty document is a CPF (11 digits) or CNPJ (14 digits)
///
/// Punctuation such as `123.456.789-09` or `12.345.678/0001-90` is ignored.
pub fn validate_document(document: &str) -> ReconResult<()> {
    let digits = document.chars().filter(|c| c.is_ascii_digit()).count();
    let others_ok = document
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '/' | ' '));

    if !others_ok || (digits != 11 && digits != 14) {
        return Err(ReconError::Validation(format!(
            "Document '{}' is neither a CPF nor a CNPJ",
            document
        )));
    }
    Ok(())
}

/// Validate that an entry description is within limits
pub fn validate_description(description: &str) -> ReconResult<()> {
    if description.len() > 500 {
        return Err(ReconError::Validation(
            "Entry description cannot exceed 500 characters".to_string(),
        ));
    }
    Ok(())
}

/// Validate that the stored sign agrees with the declared direction
pub fn validate_direction(entry: &BankEntry) -> ReconResult<()> {
    if entry.value.is_zero() || Direction::of(entry.value) == entry.direction {
        Ok(())
    } else {
        Err(ReconError::Validation(format!(
            "Entry '{}' has value {} but direction {:?}",
            entry.id, entry.value, entry.direction
        )))
    }
}

/// Validate a manual launch before it reaches the cash collection
pub fn validate_manual_entry(entry: &CashEntry) -> ReconResult<()> {
    validate_entry_id(&entry.id)?;
    validate_description(&entry.description)?;

    if !entry.is_manual() {
        return Err(ReconError::Validation(format!(
            "Entry '{}' is not a manual launch",
            entry.id
        )));
    }
    if entry.value.is_zero() {
        return Err(ReconError::Validation(
            "Manual launch value cannot be zero".to_string(),
        ));
    }
    if Direction::of(entry.value) != entry.direction {
        return Err(ReconError::Validation(format!(
            "Entry '{}' has value {} but direction {:?}",
            entry.id, entry.value, entry.direction
        )));
    }
    Ok(())
}

/// Stricter validator that rejects malformed ids and documents outright
pub struct StrictEntryValidator;

impl EntryValidator for StrictEntryValidator {
    fn validate_entry(&self, entry: &BankEntry) -> ReconResult<()> {
        validate_entry_id(&entry.id)?;
        validate_description(&entry.description)?;
        validate_direction(entry)?;

        if let Some(document) = &entry.document {
            validate_document(document)?;
        }
        Ok(())
    }

    fn classify(&self, entry: &BankEntry) -> ValidationStatus {
        if entry.value.is_zero() {
            return ValidationStatus::Invalid;
        }
        match &entry.document {
            None => ValidationStatus::Warning,
            Some(_) if entry.payment_type.trim().is_empty() => ValidationStatus::Warning,
            Some(_) => ValidationStatus::Valid,
        }
    }
}
