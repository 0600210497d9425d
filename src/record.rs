// Record Model
// One student entry of the catalog. Identity is the identifier, nothing else.

use crate::error::{Result, RosterError};
use crate::xml::strip_illegal_chars;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// STUDENT RECORD
// ============================================================================

/// Student - one catalog entry
///
/// Two students are equal when their identifiers are equal, whatever the other
/// fields hold. Uniqueness itself is only enforced by `CatalogStore::append`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub identifier: String,
    pub name: String,
    pub section: String,
    pub tuition_fee: f64,
    pub initial_payout: f64,
}

impl Student {
    pub fn new(
        identifier: impl Into<String>,
        name: impl Into<String>,
        section: impl Into<String>,
        tuition_fee: f64,
        initial_payout: f64,
    ) -> Self {
        Student {
            identifier: identifier.into(),
            name: name.into(),
            section: section.into(),
            tuition_fee,
            initial_payout,
        }
    }

    /// Value of one field, typed for comparison
    pub fn field(&self, key: SortKey) -> FieldValue<'_> {
        match key {
            SortKey::Identifier => FieldValue::Text(&self.identifier),
            SortKey::Name => FieldValue::Text(&self.name),
            SortKey::Section => FieldValue::Text(&self.section),
            SortKey::TuitionFee => FieldValue::Number(self.tuition_fee),
            SortKey::InitialPayout => FieldValue::Number(self.initial_payout),
        }
    }
}

impl PartialEq for Student {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for Student {}

// ============================================================================
// FIELD ADDRESSING
// ============================================================================

/// SortKey - the record fields a view can be ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Identifier,
    #[default]
    Name,
    Section,
    TuitionFee,
    InitialPayout,
}

impl SortKey {
    /// Column order used by the table adapters
    pub const ALL: [SortKey; 5] = [
        SortKey::Identifier,
        SortKey::Name,
        SortKey::Section,
        SortKey::TuitionFee,
        SortKey::InitialPayout,
    ];

    /// Wire name, also the XML element name for the child fields
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Identifier => "id",
            SortKey::Name => "name",
            SortKey::Section => "section",
            SortKey::TuitionFee => "tuition_fee",
            SortKey::InitialPayout => "initial_payout",
        }
    }

    /// Column header text
    pub fn title(&self) -> &'static str {
        match self {
            SortKey::Identifier => "Student ID",
            SortKey::Name => "Name",
            SortKey::Section => "Section",
            SortKey::TuitionFee => "Tuition Fee",
            SortKey::InitialPayout => "Initial Payout",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "id" | "identifier" | "student_id" => Ok(SortKey::Identifier),
            "name" | "student_name" => Ok(SortKey::Name),
            "section" => Ok(SortKey::Section),
            "tuition_fee" | "tuition" => Ok(SortKey::TuitionFee),
            "initial_payout" | "payout" => Ok(SortKey::InitialPayout),
            _ => Err(RosterError::UnknownSortKey(s.to_string())),
        }
    }
}

/// FieldValue - a field as seen by the sorter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{}", n),
        }
    }
}

// ============================================================================
// AMOUNTS
// ============================================================================

/// Lenient decimal parse used for documents and forms alike.
///
/// Empty, non-numeric and non-finite input all become 0 so NaN never reaches
/// the store. Negative values are kept.
pub fn parse_amount(text: &str) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Two-decimal rendering shared by the exporter and the table views.
///
/// Exact halves round away from zero (0.125 gives "0.13") and negative zero
/// renders as "0.00". Everything else is the correctly rounded `{:.2}`.
pub fn format_amount(value: f64) -> String {
    if value == 0.0 {
        return "0.00".to_string();
    }
    if is_cent_tie(value) {
        // exact: |value| * 100 is n + 0.5 and well inside f64's integer range
        let cents = (value.abs() * 100.0).round() as u64;
        let sign = if value < 0.0 { "-" } else { "" };
        return format!("{}{}.{:02}", sign, cents / 100, cents % 100);
    }
    format!("{:.2}", value)
}

/// A binary double sits exactly halfway between two cents only when eight
/// times it is an odd integer.
fn is_cent_tie(value: f64) -> bool {
    let eighths = value * 8.0;
    eighths.abs() < 1e12 && eighths.fract() == 0.0 && eighths % 2.0 != 0.0
}

// ============================================================================
// INPUT FORM
// ============================================================================

/// StudentForm - the add-student form exactly as typed.
///
/// Kept separate from `Student` so a rejected submission can be handed back to
/// the user untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentForm {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub tuition_fee: String,
    #[serde(default)]
    pub initial_payout: String,
}

impl StudentForm {
    pub fn to_student(&self) -> Student {
        Student {
            identifier: strip_illegal_chars(&self.identifier).trim().to_string(),
            name: strip_illegal_chars(&self.name).trim().to_string(),
            section: strip_illegal_chars(&self.section).trim().to_string(),
            tuition_fee: parse_amount(&self.tuition_fee),
            initial_payout: parse_amount(&self.initial_payout),
        }
    }

    /// Mutable access to a field by column, used by the TUI form editor
    pub fn field_mut(&mut self, key: SortKey) -> &mut String {
        match key {
            SortKey::Identifier => &mut self.identifier,
            SortKey::Name => &mut self.name,
            SortKey::Section => &mut self.section,
            SortKey::TuitionFee => &mut self.tuition_fee,
            SortKey::InitialPayout => &mut self.initial_payout,
        }
    }

    pub fn field(&self, key: SortKey) -> &str {
        match key {
            SortKey::Identifier => &self.identifier,
            SortKey::Name => &self.name,
            SortKey::Section => &self.section,
            SortKey::TuitionFee => &self.tuition_fee,
            SortKey::InitialPayout => &self.initial_payout,
        }
    }

    pub fn clear(&mut self) {
        *self = StudentForm::default();
    }
}

// ============================================================================
// TESTS
// ============================================================================
