//! Core domain model shared by all TaxPilot services.
//!
//! Canonical definitions for filing statuses, conversation stages, session
//! state, computed tax results, and review items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Confidence score (0.0-1.0)
pub type Confidence = f64;

// ============================================================================
// Filing status
// ============================================================================

/// Federal filing status for a tax return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    Single,
    MarriedFilingJointly,
    MarriedFilingSeparately,
    HeadOfHousehold,
    QualifyingWidow,
}

impl FilingStatus {
    pub const ALL: [FilingStatus; 5] = [
        FilingStatus::Single,
        FilingStatus::MarriedFilingJointly,
        FilingStatus::MarriedFilingSeparately,
        FilingStatus::HeadOfHousehold,
        FilingStatus::QualifyingWidow,
    ];

    /// Canonical string representation (matches the wire/database form).
    pub fn as_str(&self) -> &'static str {
        match self {
            FilingStatus::Single => "single",
            FilingStatus::MarriedFilingJointly => "married_filing_jointly",
            FilingStatus::MarriedFilingSeparately => "married_filing_separately",
            FilingStatus::HeadOfHousehold => "head_of_household",
            FilingStatus::QualifyingWidow => "qualifying_widow",
        }
    }

    /// Human-readable label for conversational responses.
    pub fn label(&self) -> &'static str {
        match self {
            FilingStatus::Single => "Single",
            FilingStatus::MarriedFilingJointly => "Married Filing Jointly",
            FilingStatus::MarriedFilingSeparately => "Married Filing Separately",
            FilingStatus::HeadOfHousehold => "Head of Household",
            FilingStatus::QualifyingWidow => "Qualifying Widow/Widower",
        }
    }
}

impl fmt::Display for FilingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FilingStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(FilingStatus::Single),
            "married_filing_jointly" => Ok(FilingStatus::MarriedFilingJointly),
            "married_filing_separately" => Ok(FilingStatus::MarriedFilingSeparately),
            "head_of_household" => Ok(FilingStatus::HeadOfHousehold),
            "qualifying_widow" => Ok(FilingStatus::QualifyingWidow),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown filing status: {other}"
            ))),
        }
    }
}

// ============================================================================
// Conversation stage
// ============================================================================

/// Phase of a filing conversation.
///
/// Ordered: a session only moves forward through these except via explicit
/// re-declaration, which overwrites data without regressing the stage.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Intake,
    Classifying,
    Deductions,
    Computing,
    Review,
}

impl Stage {
    /// Total number of steps shown on progress cards.
    pub const TOTAL_STEPS: u8 = 5;

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Intake => "intake",
            Stage::Classifying => "classifying",
            Stage::Deductions => "deductions",
            Stage::Computing => "computing",
            Stage::Review => "review",
        }
    }

    /// 1-based progress step for this stage.
    pub fn step(&self) -> u8 {
        match self {
            Stage::Intake => 1,
            Stage::Classifying => 2,
            Stage::Deductions => 3,
            Stage::Computing => 4,
            Stage::Review => 5,
        }
    }

    /// Progress label shown on the progress card for this stage.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Intake => "Personal Information",
            Stage::Classifying => "Income Information",
            Stage::Deductions => "Deductions & Credits",
            Stage::Computing => "Tax Calculation",
            Stage::Review => "Review & File",
        }
    }

    /// Review is terminal for the conversational core.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Review)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "intake" => Ok(Stage::Intake),
            "classifying" => Ok(Stage::Classifying),
            "deductions" => Ok(Stage::Deductions),
            "computing" => Ok(Stage::Computing),
            "review" => Ok(Stage::Review),
            other => Err(crate::Error::InvalidInput(format!("unknown stage: {other}"))),
        }
    }
}

// ============================================================================
// Income
// ============================================================================

/// Kind of income source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeSource {
    W2,
    #[serde(rename = "1099")]
    Form1099,
    SelfEmployment,
    Investment,
    Rental,
    Other,
}

impl IncomeSource {
    pub fn label(&self) -> &'static str {
        match self {
            IncomeSource::W2 => "W-2 Employment",
            IncomeSource::Form1099 => "1099 Income",
            IncomeSource::SelfEmployment => "Self-Employment",
            IncomeSource::Investment => "Investment Income",
            IncomeSource::Rental => "Rental Income",
            IncomeSource::Other => "Other Income",
        }
    }
}

/// One declared or extracted income item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeItem {
    pub source: IncomeSource,
    pub employer: Option<String>,
    pub amount: f64,
    pub federal_withheld: f64,
    pub state_withheld: f64,
    /// True when the item came from document extraction rather than typed input.
    pub extracted: bool,
}

// ============================================================================
// Deductions
// ============================================================================

/// The deduction decision for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionChoice {
    pub standard_deduction: f64,
    pub itemized_total: f64,
    pub use_standard: bool,
    /// True when the standard deduction was looked up without a declared
    /// filing status (fell back to single's amount).
    pub assumed_status: bool,
}

impl DeductionChoice {
    /// The deduction amount that actually applies.
    pub fn effective(&self) -> f64 {
        if self.use_standard {
            self.standard_deduction
        } else {
            self.itemized_total
        }
    }
}

// ============================================================================
// Tax result
// ============================================================================

/// A computed tax outcome. Replaced wholesale on each compute; never
/// partially mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxResult {
    pub gross_income: f64,
    pub deductions: f64,
    pub taxable_income: f64,
    /// Federal tax, rounded to whole dollars at the final total only.
    pub tax: f64,
    pub withheld: f64,
    /// Positive = refund, negative = amount owed. Never clamped.
    pub refund_or_owed: f64,
    /// tax / gross_income (0 when gross_income is 0).
    pub effective_rate: f64,
    /// Attached by the review gate; never exceeds the minimum confidence of
    /// the result's constituent inputs.
    pub confidence: Confidence,
}

// ============================================================================
// Session state
// ============================================================================

/// Per-field confidence for declared session inputs (0.0 until declared).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldConfidence {
    pub filing_status: Confidence,
    pub income: Confidence,
    pub deductions: Confidence,
}

/// One conversation's mutable state. Created on first interaction, mutated
/// only by the session state machine, one transition in flight at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    pub stage: Stage,
    pub filing_status: Option<FilingStatus>,
    pub income: Vec<IncomeItem>,
    pub total_income: f64,
    pub total_withheld: f64,
    pub dependents: u32,
    pub deduction: Option<DeductionChoice>,
    pub last_result: Option<TaxResult>,
    pub field_confidence: FieldConfidence,
    pub confidence: Confidence,
    pub needs_review: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionState {
    /// Fresh session at the intake stage.
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            stage: Stage::Intake,
            filing_status: None,
            income: Vec::new(),
            total_income: 0.0,
            total_withheld: 0.0,
            dependents: 0,
            deduction: None,
            last_result: None,
            field_confidence: FieldConfidence::default(),
            confidence: 0.0,
            needs_review: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Recompute cumulative income totals from the item list.
    pub fn recompute_totals(&mut self) {
        self.total_income = self.income.iter().map(|i| i.amount).sum();
        self.total_withheld = self.income.iter().map(|i| i.federal_withheld).sum();
    }

    /// True once both inputs required by the calculator are present.
    pub fn ready_to_compute(&self) -> bool {
        self.filing_status.is_some() && self.total_income > 0.0
    }
}

// ============================================================================
// Review items
// ============================================================================

/// Disposition of a review item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
    Modified,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
            ReviewStatus::Modified => "modified",
        }
    }

    /// Approved/rejected/modified are terminal dispositions.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReviewStatus::Pending)
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReviewStatus::Pending),
            "approved" => Ok(ReviewStatus::Approved),
            "rejected" => Ok(ReviewStatus::Rejected),
            "modified" => Ok(ReviewStatus::Modified),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown review status: {other}"
            ))),
        }
    }
}

/// A flagged field awaiting human disposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    pub id: Uuid,
    pub session_id: String,
    pub field_name: String,
    pub field_value: String,
    pub reason: String,
    pub confidence: Confidence,
    pub status: ReviewStatus,
    pub reviewer_notes: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ReviewItem {
    /// New pending item flagged by the review gate.
    pub fn pending(
        session_id: impl Into<String>,
        field_name: impl Into<String>,
        field_value: impl Into<String>,
        reason: impl Into<String>,
        confidence: Confidence,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id: session_id.into(),
            field_name: field_name.into(),
            field_value: field_value.into(),
            reason: reason.into(),
            confidence,
            status: ReviewStatus::Pending,
            reviewer_notes: None,
            resolved_at: None,
            created_at: Utc::now(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
