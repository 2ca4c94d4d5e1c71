//! Schema definitions for persisted academic records
//!
//! One `AcademicRecord` document exists per owner identity. It holds the
//! ordered set of `Term`s, each of which holds its `Item`s (courses).
//! Derived fields (`Item::grade`, `Term::average`,
//! `AcademicRecord::cumulative_average`) are written by the merge engine in
//! `transcript-core`; this crate only stores them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Highest term number a record may hold.
pub const MAX_TERM_NUMBER: u8 = 8;

/// Upper bound for each raw component score (internal, external).
pub const MAX_COMPONENT_SCORE: u32 = 50;

/// Upper bound for an item's total score.
pub const MAX_TOTAL_SCORE: u32 = 100;

/// Normalize a registration number: surrounding whitespace removed, ASCII
/// letters uppercased.
pub fn normalize_registration(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Letter grade awarded to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "O")]
    O,
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "P")]
    P,
    #[serde(rename = "F")]
    F,
}

impl Grade {
    /// Display label as printed on a marks card.
    pub fn label(self) -> &'static str {
        match self {
            Grade::O => "O",
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::C => "C",
            Grade::P => "P",
            Grade::F => "F",
        }
    }

    /// Grade-point on the 0..=10 scale.
    pub fn point(self) -> u8 {
        match self {
            Grade::O => 10,
            Grade::APlus => 9,
            Grade::A => 8,
            Grade::BPlus => 7,
            Grade::B => 6,
            Grade::C => 5,
            Grade::P => 4,
            Grade::F => 0,
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Month in which a term's examination was held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExamMonth {
    January,
    June,
    December,
}

/// Where the current content of a record came from.
///
/// Serialized as a plain string: `"manual"`, `"automated"`, or the name of an
/// external system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Provenance {
    Manual,
    Automated,
    External(String),
}

impl From<String> for Provenance {
    fn from(s: String) -> Self {
        match s.as_str() {
            "manual" => Provenance::Manual,
            "automated" => Provenance::Automated,
            _ => Provenance::External(s),
        }
    }
}

impl From<Provenance> for String {
    fn from(p: Provenance) -> Self {
        match p {
            Provenance::Manual => "manual".to_string(),
            Provenance::Automated => "automated".to_string(),
            Provenance::External(name) => name,
        }
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provenance::Manual => f.write_str("manual"),
            Provenance::Automated => f.write_str("automated"),
            Provenance::External(name) => f.write_str(name),
        }
    }
}

/// One gradable course within a term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Course code, unique within its term
    pub code: String,
    /// Display name
    pub name: String,
    /// Credit weight
    pub credits: u32,
    /// Internal component score (0..=50)
    #[serde(default)]
    pub internal_score: Option<u32>,
    /// External component score (0..=50)
    #[serde(default)]
    pub external_score: Option<u32>,
    /// Total score (0..=100)
    #[serde(default)]
    pub total_score: Option<u32>,
    /// Letter grade
    #[serde(default)]
    pub grade: Option<Grade>,
    /// Grade-point (0..=10)
    #[serde(default)]
    pub grade_point: Option<u8>,
}

impl Item {
    /// Create an item with no scores yet
    pub fn new(code: impl Into<String>, name: impl Into<String>, credits: u32) -> Self {
        Item {
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
}

/// One academic grading period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    /// Term number (1..=8)
    pub number: u8,
    /// Examination month, if known
    #[serde(default)]
    pub exam_month: Option<ExamMonth>,
    /// Examination year, if known
    #[serde(default)]
    pub exam_year: Option<i32>,
    /// Courses in this term, in insertion order
    pub items: Vec<Item>,
    /// Credit-weighted mean grade-point of `items`
    pub average: f64,
    /// When this term's data was last fetched from an external source
    #[serde(default)]
    pub fetched_at: Option<DateTime<Utc>>,
}

impl Term {
    /// Create an empty term
    pub fn new(number: u8) -> Self {
        Term {
            number,
            exam_month: None,
            exam_year: None,
            items: Vec::new(),
            average: 0.0,
            fetched_at: None,
        }
    }

    /// Find an item by course code
    pub fn item(&self, code: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.code == code)
    }
}

/// A student's complete academic record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicRecord {
    /// Owning identity (unique)
    pub owner_id: String,
    /// Institutional registration number, normalized uppercase
    pub registration_number: String,
    /// Terms ordered by increasing term number
    pub terms: Vec<Term>,
    /// Unweighted mean of the stored term averages
    pub cumulative_average: f64,
    /// Last time any merge touched this record
    pub last_updated: DateTime<Utc>,
    /// Origin of the current content
    pub provenance: Provenance,
}

impl AcademicRecord {
    /// Create an empty record for an owner
    pub fn new(
        owner_id: impl Into<String>,
        registration_number: &str,
        provenance: Provenance,
    ) -> Self {
        AcademicRecord {
            owner_id: owner_id.into(),
            registration_number: normalize_registration(registration_number),
            terms: Vec::new(),
            cumulative_average: 0.0,
            last_updated: Utc::now(),
            provenance,
        }
    }

    /// Find a term by number
    pub fn term(&self, number: u8) -> Option<&Term> {
        self.terms.iter().find(|t| t.number == number)
    }
}
