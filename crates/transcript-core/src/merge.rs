//! Record merge engine.
//!
//! Folds incoming term data into an existing record:
//! - upsert by term number (new terms are inserted in term-number order)
//! - upsert by item code within a term
//! - unconditional re-derivation of grades and averages afterwards
//!
//! Terms that are not named by the incoming data are left untouched.
//! Merging the same input twice yields the same record apart from
//! `last_updated`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use transcript_state::{
    normalize_registration, AcademicRecord, ExamMonth, Grade, Item, Provenance, Term,
    MAX_TOTAL_SCORE,
};

use crate::aggregate::{cumulative_average, term_average};
use crate::error::{RecordError, Result};
use crate::grade::grade_of;
use crate::source::FetchedTerm;

/// Caller-supplied data for one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingItem {
    pub code: String,
    pub name: String,
    pub credits: u32,
    #[serde(default)]
    pub internal_score: Option<u32>,
    #[serde(default)]
    pub external_score: Option<u32>,
    #[serde(default)]
    pub total_score: Option<u32>,
    /// Only honoured when no total score is known
    #[serde(default)]
    pub grade: Option<Grade>,
    /// Only honoured when no total score is known
    #[serde(default)]
    pub grade_point: Option<u8>,
}

impl IncomingItem {
    pub fn new(code: impl Into<String>, name: impl Into<String>, credits: u32) -> Self {
        IncomingItem {
            code: code.into(),
            name: name.into(),
            credits,
            internal_score: None,
            external_score: None,
            total_score: None,
            grade: None,
            grade_point: None,
        }
    }

    /// Set both raw components
    pub fn with_components(mut self, internal: u32, external: u32) -> Self {
        self.internal_score = Some(internal);
        self.external_score = Some(external);
        self
    }

    /// Set the total score directly
    pub fn with_total(mut self, total: u32) -> Self {
        self.total_score = Some(total);
        self
    }
}

/// Caller-supplied data for one term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingTerm {
    /// May be omitted when the term number comes from elsewhere, as in
    /// `RecordService::update_term`
    #[serde(default)]
    pub number: u8,
    #[serde(default)]
    pub exam_month: Option<ExamMonth>,
    #[serde(default)]
    pub exam_year: Option<i32>,
    #[serde(default)]
    pub items: Vec<IncomingItem>,
    #[serde(default)]
    pub fetched_at: Option<DateTime<Utc>>,
}

impl IncomingTerm {
    pub fn new(number: u8, items: Vec<IncomingItem>) -> Self {
        IncomingTerm {
            number,
            exam_month: None,
            exam_year: None,
            items,
            fetched_at: None,
        }
    }

    /// Convert parsed external results into merge input.
    ///
    /// The fetched score becomes the item's total score. Rows whose score
    /// exceeds the total maximum keep their code and name but lose the score.
    pub fn from_fetched(fetched: &FetchedTerm, fetched_at: DateTime<Utc>) -> Self {
        let items = fetched
            .items
            .iter()
            .map(|row| {
                let mut item = IncomingItem::new(row.code.trim(), row.name.trim(), row.credits);
                match row.score {
                    Some(score) if score <= MAX_TOTAL_SCORE => item.total_score = Some(score),
                    Some(score) => {
                        debug!(code = %row.code, score, "dropping out-of-range fetched score")
                    }
                    None => {}
                }
                item
            })
            .collect();

        IncomingTerm {
            number: fetched.term_number,
            exam_month: None,
            exam_year: None,
            items,
            fetched_at: Some(fetched_at),
        }
    }
}

/// Reject an externally supplied registration number that does not match
/// the record's own.
pub fn ensure_registration(record: &AcademicRecord, registration_number: &str) -> Result<()> {
    let actual = normalize_registration(registration_number);
    if record.registration_number != actual {
        return Err(RecordError::RecordMismatch {
            expected: record.registration_number.clone(),
            actual,
        });
    }
    Ok(())
}

/// Re-derive an item's total and grade from its scores.
fn derive_item(item: &mut Item) {
    if let (Some(internal), Some(external)) = (item.internal_score, item.external_score) {
        item.total_score = Some(internal + external);
    }
    if let Some(total) = item.total_score {
        let grade = grade_of(f64::from(total));
        item.grade = Some(grade);
        item.grade_point = Some(grade.point());
    }
}

/// Overwrite score, credit and grade fields; the stored name is kept.
fn overlay_item(existing: &mut Item, incoming: &IncomingItem) {
    existing.credits = incoming.credits;
    if incoming.internal_score.is_some() {
        existing.internal_score = incoming.internal_score;
    }
    if incoming.external_score.is_some() {
        existing.external_score = incoming.external_score;
    }
    if incoming.total_score.is_some() {
        existing.total_score = incoming.total_score;
    }
    if incoming.grade.is_some() {
        existing.grade = incoming.grade;
    }
    if incoming.grade_point.is_some() {
        existing.grade_point = incoming.grade_point;
    }
}

fn item_from_incoming(incoming: &IncomingItem) -> Item {
    Item {
        code: incoming.code.trim().to_string(),
        name: incoming.name.trim().to_string(),
        credits: incoming.credits,
        internal_score: incoming.internal_score,
        external_score: incoming.external_score,
        total_score: incoming.total_score,
        grade: incoming.grade,
        grade_point: incoming.grade_point,
    }
}

fn upsert_items(term: &mut Term, incoming: &[IncomingItem]) {
    for item in incoming {
        let code = item.code.trim();
        match term.items.iter_mut().find(|i| i.code == code) {
            Some(existing) => overlay_item(existing, item),
            None => term.items.push(item_from_incoming(item)),
        }
    }
    for item in &mut term.items {
        derive_item(item);
    }
    term.average = term_average(&term.items);
}

/// Merge one term into a record, returning the updated record.
///
/// Performs no validation; manual input must pass
/// [`crate::validation::validate_terms`] first.
pub fn merge_term(record: &AcademicRecord, incoming: &IncomingTerm) -> AcademicRecord {
    let mut merged = record.clone();
    apply_term(&mut merged, incoming);
    merged.cumulative_average = cumulative_average(&merged.terms);
    merged.last_updated = Utc::now();
    merged
}

/// Merge several terms in order, then stamp provenance.
pub fn merge_terms(
    record: &AcademicRecord,
    incoming: &[IncomingTerm],
    provenance: Provenance,
) -> AcademicRecord {
    let mut merged = record.clone();
    for term in incoming {
        apply_term(&mut merged, term);
    }
    merged.cumulative_average = cumulative_average(&merged.terms);
    merged.provenance = provenance;
    merged.last_updated = Utc::now();
    merged
}

fn apply_term(record: &mut AcademicRecord, incoming: &IncomingTerm) {
    let index = match record.terms.iter().position(|t| t.number == incoming.number) {
        Some(index) => index,
        None => {
            let at = record
                .terms
                .iter()
                .position(|t| t.number > incoming.number)
                .unwrap_or(record.terms.len());
            record.terms.insert(at, Term::new(incoming.number));
            at
        }
    };

    let term = &mut record.terms[index];
    if incoming.exam_month.is_some() {
        term.exam_month = incoming.exam_month;
    }
    if incoming.exam_year.is_some() {
        term.exam_year = incoming.exam_year;
    }
    if incoming.fetched_at.is_some() {
        term.fetched_at = incoming.fetched_at;
    }
    upsert_items(term, &incoming.items);

    debug!(
        term = incoming.number,
        items = term.items.len(),
        average = term.average,
        "term merged"
    );
}
