//! Shared API request/response types
//!
//! Wire types used by the TaxPilot services:
//! - taxpilot-agent (conversational agent)
//! - taxpilot-review (reviewer service)

use serde::{Deserialize, Serialize};

use crate::types::{Confidence, ReviewItem, ReviewStatus, SessionState, Stage, TaxResult};

// ========================================
// Chat
// ========================================

/// POST /api/chat request body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatRequest {
    /// Session identifier; a fresh demo session is used when absent.
    pub session_id: Option<String>,
    pub message: String,
}

/// Summary of the session's position, attached to every chat response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageInfo {
    pub current_stage: Stage,
    pub confidence: Confidence,
    pub needs_review: bool,
}

/// POST /api/chat response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
    pub cards: Vec<StructuredCard>,
    pub stage_info: StageInfo,
}

/// Structured card rendered alongside a chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StructuredCard {
    ProgressCard {
        title: String,
        step: u8,
        total: u8,
        label: String,
    },
    IncomeCard {
        title: String,
        employer: String,
        wages: f64,
        federal_withheld: f64,
        state_withheld: f64,
    },
    DeductionCard {
        title: String,
        standard_deduction: f64,
        itemized_total: f64,
        recommendation: String,
        savings: f64,
    },
    RefundCard {
        title: String,
        gross_income: f64,
        deductions: f64,
        taxable_income: f64,
        tax: f64,
        withheld: f64,
        refund: f64,
    },
    ReviewCard {
        title: String,
        field: String,
        reason: String,
        confidence: Confidence,
    },
}

// ========================================
// Session / tax return views
// ========================================

/// GET /api/session/:id response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session: Option<SessionState>,
}

/// GET /api/tax-return/:id response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxReturnResponse {
    pub result: Option<TaxResult>,
}

// ========================================
// Upload / document extraction
// ========================================

/// Fields extracted from an uploaded W-2 document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub employer: String,
    pub ein: String,
    pub wages: f64,
    pub federal_withheld: f64,
    pub state_withheld: f64,
    pub social_security_wages: f64,
    pub social_security_tax: f64,
    pub medicare_wages: f64,
    pub medicare_tax: f64,
}

/// POST /api/upload response body. The extraction feeds the same income
/// declaration transition as a typed message, so the chat response rides
/// along.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub filename: String,
    pub size: usize,
    pub extracted: ExtractedFields,
    pub chat: ChatResponse,
}

// ========================================
// Review queue
// ========================================

/// GET /api/reviews response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewListResponse {
    pub items: Vec<ReviewItem>,
}

/// PUT /api/reviews/:id request body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolveRequest {
    pub status: ReviewStatus,
    pub reviewer_notes: Option<String>,
}

/// PUT /api/reviews/:id response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub success: bool,
    pub item: ReviewItem,
}

// ========================================
// Errors
// ========================================

/// Error payload returned by the HTTP APIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ========================================
// Tests
// ========================================
