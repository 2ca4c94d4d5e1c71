//! Strict validation for manually entered term data.
//!
//! Manual input is all-or-nothing: the first violation rejects the whole
//! submission before any record is touched. Ingested data does not pass
//! through here; the parser drops bad rows instead.

use transcript_state::{normalize_registration, MAX_COMPONENT_SCORE, MAX_TERM_NUMBER, MAX_TOTAL_SCORE};

use crate::error::ValidationError;
use crate::merge::{IncomingItem, IncomingTerm};

/// Minimum length of a registration number on manual submission.
pub const MIN_MANUAL_REGISTRATION_LEN: usize = 10;

/// Minimum length of a registration number for an external fetch.
pub const MIN_FETCH_REGISTRATION_LEN: usize = 8;

/// Normalize a registration number and check its length.
pub fn validate_registration(raw: &str, min: usize) -> Result<String, ValidationError> {
    let normalized = normalize_registration(raw);
    if normalized.chars().count() < min {
        return Err(ValidationError::RegistrationTooShort {
            value: normalized,
            min,
        });
    }
    Ok(normalized)
}

/// Validate a non-empty batch of terms.
pub fn validate_terms(terms: &[IncomingTerm]) -> Result<(), ValidationError> {
    if terms.is_empty() {
        return Err(ValidationError::NoTerms);
    }
    terms.iter().try_for_each(validate_term)
}

/// Validate one term and all of its items.
pub fn validate_term(term: &IncomingTerm) -> Result<(), ValidationError> {
    if term.number == 0 || term.number > MAX_TERM_NUMBER {
        return Err(ValidationError::TermOutOfRange {
            number: term.number,
            max: MAX_TERM_NUMBER,
        });
    }
    term.items
        .iter()
        .enumerate()
        .try_for_each(|(index, item)| validate_item(term.number, index, item))
}

fn validate_item(term: u8, index: usize, item: &IncomingItem) -> Result<(), ValidationError> {
    if item.code.trim().is_empty() {
        return Err(ValidationError::MissingField {
            term,
            index,
            field: "code",
        });
    }
    if item.name.trim().is_empty() {
        return Err(ValidationError::MissingField {
            term,
            index,
            field: "name",
        });
    }
    if item.credits == 0 {
        return Err(ValidationError::NonPositiveCredits {
            term,
            code: item.code.clone(),
        });
    }

    let bounded = [
        ("internal_score", item.internal_score, MAX_COMPONENT_SCORE),
        ("external_score", item.external_score, MAX_COMPONENT_SCORE),
        ("total_score", item.total_score, MAX_TOTAL_SCORE),
        ("grade_point", item.grade_point.map(u32::from), 10),
    ];
    for (field, value, max) in bounded {
        if let Some(value) = value {
            if value > max {
                return Err(ValidationError::ScoreOutOfRange {
                    term,
                    code: item.code.clone(),
                    field,
                    value,
                    max,
                });
            }
        }
    }
    Ok(())
}
