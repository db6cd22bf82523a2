//! Session state machine
//!
//! Applies a classified intent to a session, producing the stage
//! transition, the conversational reply, and any structured cards. Pure
//! over `SessionState`: persistence and per-session locking live in
//! [`crate::sessions`].
//!
//! Stages only move forward. Re-declaring a value at a later stage
//! overwrites it without regressing the stage; a filing-status change
//! additionally clears any previously computed result.

use taxpilot_common::api::{ExtractedFields, StructuredCard};
use taxpilot_common::brackets::standard_deduction;
use taxpilot_common::calculator;
use taxpilot_common::money::{fmt_percent, fmt_usd, fmt_usd_whole};
use taxpilot_common::types::{
    Confidence, DeductionChoice, FilingStatus, IncomeItem, IncomeSource, ReviewItem,
    SessionState, Stage,
};
use taxpilot_common::Error;
use tracing::debug;

use crate::gate;
use crate::intent::Intent;

/// Fraction of typed income assumed already withheld for federal tax.
pub const FEDERAL_WITHHOLDING_RATE: f64 = 0.167;
/// Fraction of typed income assumed already withheld for state tax.
pub const STATE_WITHHOLDING_RATE: f64 = 0.05;

// Confidence model: a baseline plus a weighted share per collected input,
// scaled by that input's own confidence. The happy path lands near
// 0.05 / 0.17 / 0.47 / 0.72 / 0.92 across the five stages.
const CONFIDENCE_BASELINE: Confidence = 0.05;
const WEIGHT_FILING_STATUS: Confidence = 0.12;
const WEIGHT_INCOME: Confidence = 0.33;
const WEIGHT_DEDUCTIONS: Confidence = 0.25;
const WEIGHT_RESULT: Confidence = 0.20;

/// Field confidence for income typed in chat.
pub const CONF_TYPED_INCOME: Confidence = 0.90;
/// Field confidence for income read out of an uploaded document.
pub const CONF_EXTRACTED_INCOME: Confidence = 0.80;
/// Field confidence for an unambiguous filing-status declaration.
pub const CONF_EXPLICIT_STATUS: Confidence = 1.0;
/// Field confidence when the status was inferred from a bare keyword.
pub const CONF_AMBIGUOUS_STATUS: Confidence = 0.75;
/// Field confidence when the deduction lookup had a declared status.
pub const CONF_DEDUCTION: Confidence = 1.0;
/// Field confidence when the lookup fell back to single's deduction.
pub const CONF_ASSUMED_DEDUCTION: Confidence = 0.50;
/// Field confidence when compute defaulted the deduction itself.
const CONF_DEFAULTED_DEDUCTION: Confidence = 0.90;

/// Result of applying one intent to a session.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub reply: String,
    pub cards: Vec<StructuredCard>,
    /// Pending review items flagged by the gate (compute transitions only).
    pub review_candidates: Vec<ReviewItem>,
}

impl TransitionOutcome {
    fn reply(reply: impl Into<String>) -> Self {
        Self { reply: reply.into(), cards: Vec::new(), review_candidates: Vec::new() }
    }
}

/// Cumulative session confidence derived from input completeness.
pub fn cumulative_confidence(session: &SessionState) -> Confidence {
    let mut confidence = CONFIDENCE_BASELINE;
    if session.filing_status.is_some() {
        confidence += WEIGHT_FILING_STATUS * session.field_confidence.filing_status;
    }
    if session.total_income > 0.0 {
        confidence += WEIGHT_INCOME * session.field_confidence.income;
    }
    if session.deduction.is_some() {
        confidence += WEIGHT_DEDUCTIONS * session.field_confidence.deductions;
    }
    if session.last_result.is_some() {
        confidence += WEIGHT_RESULT;
    }
    confidence.clamp(0.0, 1.0)
}

/// Apply a classified intent to the session. Atomic with respect to the
/// session: the caller holds the per-session lock and saves afterwards.
pub fn apply(session: &mut SessionState, intent: &Intent) -> TransitionOutcome {
    let outcome = match intent {
        Intent::Greeting => on_greeting(session),
        Intent::DeclareFilingStatus { status, explicit } => {
            on_declare_status(session, *status, *explicit)
        }
        Intent::DeclareIncome { amount, source } => on_declare_income(session, *amount, *source),
        Intent::RequestDeductionInfo => on_deduction_info(session),
        Intent::RequestMoreDeductions => on_more_deductions(session),
        Intent::ConfirmCompute => on_confirm_compute(session),
        Intent::UploadRedirect => TransitionOutcome::reply(
            "You can upload a photo of your W-2 and I'll read the numbers off it: \
             send the image to POST /api/upload. I'll record the wages and \
             withholding exactly as they appear on the form.",
        ),
        Intent::Thanks => TransitionOutcome::reply(
            "You're welcome! If anything else about your return comes up, just ask.",
        ),
        Intent::Unrecognized => on_unrecognized(session),
    };

    session.confidence = cumulative_confidence(session);
    outcome
}

/// Feed document-extracted W-2 fields through the same income-declaration
/// transition as a typed message.
pub fn apply_extracted_income(
    session: &mut SessionState,
    fields: &ExtractedFields,
) -> TransitionOutcome {
    let item = IncomeItem {
        source: IncomeSource::W2,
        employer: Some(fields.employer.clone()),
        amount: fields.wages,
        federal_withheld: fields.federal_withheld,
        state_withheld: fields.state_withheld,
        extracted: true,
    };

    let advanced = push_income(session, item.clone(), CONF_EXTRACTED_INCOME);

    let mut cards = vec![income_card(&item)];
    if advanced {
        cards.push(progress_card(session.stage));
    }

    let mut reply = format!(
        "I've read your W-2 from {}: wages of {} with {} federal tax withheld.",
        fields.employer,
        fmt_usd(fields.wages),
        fmt_usd(fields.federal_withheld),
    );
    reply.push_str(&after_income_prompt(session));

    session.confidence = cumulative_confidence(session);
    TransitionOutcome { reply, cards, review_candidates: Vec::new() }
}

// ============================================================================
// Per-intent transitions
// ============================================================================

fn on_greeting(session: &mut SessionState) -> TransitionOutcome {
    if session.stage == Stage::Intake {
        let reply = "Welcome to TaxPilot! I'm here to help you file your 2025 federal \
                     tax return. Let's start with some basic information.\n\n\
                     What is your filing status? (Single, Married Filing Jointly, \
                     Married Filing Separately, Head of Household, or Qualifying \
                     Widow/Widower)";
        TransitionOutcome {
            reply: reply.to_string(),
            cards: vec![progress_card(Stage::Intake)],
            review_candidates: Vec::new(),
        }
    } else {
        TransitionOutcome {
            reply: format!(
                "Welcome back! We're on the {} step. {}",
                session.stage.label(),
                contextual_prompt(session.stage)
            ),
            cards: vec![progress_card(session.stage)],
            review_candidates: Vec::new(),
        }
    }
}

fn on_declare_status(
    session: &mut SessionState,
    status: FilingStatus,
    explicit: bool,
) -> TransitionOutcome {
    let previous = session.filing_status.replace(status);
    session.field_confidence.filing_status =
        if explicit { CONF_EXPLICIT_STATUS } else { CONF_AMBIGUOUS_STATUS };

    let changed = previous.is_some_and(|p| p != status);
    let mut cleared = false;
    if changed {
        // A status change invalidates a previously computed result; the
        // stage itself never regresses.
        cleared = session.last_result.take().is_some();
        if cleared {
            debug!(session_id = %session.session_id, "filing status change cleared computed result");
        }
        if let Some(deduction) = session.deduction.as_mut() {
            if !deduction.assumed_status {
                deduction.standard_deduction = standard_deduction(status);
                deduction.use_standard =
                    deduction.standard_deduction >= deduction.itemized_total;
            }
        }
    }

    if session.stage == Stage::Intake {
        session.stage = Stage::Classifying;
    }

    let mut reply = format!(
        "Got it — filing status set to {}. Now let's gather your income \
         information.\n\nDo you have a W-2 from an employer? You can upload a \
         photo of it, or just tell me your total wages.",
        status.label()
    );
    if !explicit {
        reply.push_str(
            "\n\n(I assumed Married Filing Jointly — tell me if you file separately.)",
        );
    }
    if cleared {
        reply.push_str(
            "\n\nSince your filing status changed, I've cleared the previous \
             calculation; say \"calculate\" to recompute.",
        );
    }

    TransitionOutcome {
        reply,
        cards: vec![progress_card(session.stage)],
        review_candidates: Vec::new(),
    }
}

fn on_declare_income(
    session: &mut SessionState,
    amount: f64,
    source: IncomeSource,
) -> TransitionOutcome {
    // Typed declarations carry no withholding figures, so derive them from
    // a fixed schedule until a real document supplies the actual numbers.
    let item = IncomeItem {
        source,
        employer: None,
        amount,
        federal_withheld: amount * FEDERAL_WITHHOLDING_RATE,
        state_withheld: amount * STATE_WITHHOLDING_RATE,
        extracted: false,
    };

    let advanced = push_income(session, item.clone(), CONF_TYPED_INCOME);

    let mut cards = vec![income_card(&item)];
    if advanced {
        cards.push(progress_card(session.stage));
    }

    let mut reply = format!(
        "I've recorded your income of {}.",
        fmt_usd(session.total_income)
    );
    reply.push_str(&after_income_prompt(session));

    TransitionOutcome { reply, cards, review_candidates: Vec::new() }
}

/// Shared income bookkeeping for typed and extracted declarations.
/// Returns true when the stage advanced.
fn push_income(session: &mut SessionState, item: IncomeItem, confidence: Confidence) -> bool {
    session.income.push(item);
    session.recompute_totals();
    session.field_confidence.income = confidence;

    if session.stage == Stage::Classifying {
        session.stage = Stage::Deductions;
        true
    } else {
        false
    }
}

fn after_income_prompt(session: &SessionState) -> String {
    if session.filing_status.is_none() {
        " I still need your filing status before I can calculate anything — \
         are you filing as Single, Married Filing Jointly, Married Filing \
         Separately, Head of Household, or Qualifying Widow/Widower?"
            .to_string()
    } else {
        " Next up: deductions. Ask me about deductions and I'll compare the \
         standard deduction against itemizing."
            .to_string()
    }
}

fn on_deduction_info(session: &mut SessionState) -> TransitionOutcome {
    // MissingFilingStatus is recovered here rather than surfaced: fall back
    // to the most conservative (single) deduction and mark it low-confidence.
    let (status, assumed) = match session.filing_status {
        Some(status) => (status, false),
        None => {
            debug!(session_id = %session.session_id, error = %Error::MissingFilingStatus,
                "deduction lookup defaulting to single");
            (FilingStatus::Single, true)
        }
    };

    let amount = standard_deduction(status);
    let itemized_total: f64 = 0.0;

    let choice = DeductionChoice {
        standard_deduction: amount,
        itemized_total,
        use_standard: amount >= itemized_total,
        assumed_status: assumed,
    };
    session.deduction = Some(choice.clone());
    session.field_confidence.deductions =
        if assumed { CONF_ASSUMED_DEDUCTION } else { CONF_DEDUCTION };

    if session.stage == Stage::Deductions {
        session.stage = Stage::Computing;
    }

    let mut reply = String::new();
    if assumed {
        reply.push_str(
            "You haven't told me your filing status yet, so I'm assuming Single \
             for now — the numbers below will update once you declare it.\n\n",
        );
    }
    reply.push_str(&format!(
        "Based on the 2025 tax law, I recommend the **Standard Deduction** of \
         **{}**.\n\nThe standard deduction ({}) exceeds your itemized \
         deductions ({}), so the standard deduction saves you more.\n\nShall I \
         calculate your estimated tax and refund?",
        fmt_usd_whole(amount),
        fmt_usd_whole(amount),
        fmt_usd_whole(itemized_total),
    ));

    TransitionOutcome {
        reply,
        cards: vec![deduction_card(&choice), progress_card(session.stage)],
        review_candidates: Vec::new(),
    }
}

fn on_more_deductions(session: &SessionState) -> TransitionOutcome {
    let standard = session
        .filing_status
        .map(standard_deduction)
        .unwrap_or_else(|| standard_deduction(FilingStatus::Single));
    TransitionOutcome::reply(format!(
        "Common deductions worth checking:\n\n\
         - **Student Loan Interest:** up to $2,500\n\
         - **Charitable Contributions:** keep receipts for donations over $250\n\
         - **Mortgage Interest:** deductible if you itemize\n\n\
         Unless your itemized total exceeds the standard deduction of {}, the \
         standard deduction still saves you more.",
        fmt_usd_whole(standard)
    ))
}

fn on_confirm_compute(session: &mut SessionState) -> TransitionOutcome {
    // IncompleteSession is recovered into a clarifying prompt; the stage
    // does not advance.
    let status = match session.filing_status {
        Some(status) if session.total_income > 0.0 => status,
        _ => {
            let mut missing = Vec::new();
            if session.filing_status.is_none() {
                missing.push("your filing status");
            }
            if session.total_income <= 0.0 {
                missing.push("your income");
            }
            let missing = missing.join(" and ");
            debug!(session_id = %session.session_id,
                error = %Error::IncompleteSession(missing.clone()), "compute blocked");
            return TransitionOutcome::reply(format!(
                "I need a bit more information before I can calculate your return — \
                 specifically {}. Tell me and I'll take it from there.",
                missing
            ));
        }
    };
    let deduction = match session.deduction.clone() {
        Some(choice) => choice,
        None => {
            // Compute requested without the deduction step; default to the
            // declared status' standard deduction.
            let choice = DeductionChoice {
                standard_deduction: standard_deduction(status),
                itemized_total: 0.0,
                use_standard: true,
                assumed_status: false,
            };
            session.deduction = Some(choice.clone());
            session.field_confidence.deductions = CONF_DEFAULTED_DEDUCTION;
            choice
        }
    };

    let mut result = match calculator::compute(
        session.total_income,
        status,
        deduction.effective(),
        session.total_withheld,
    ) {
        Ok(result) => result,
        Err(e) => {
            // Inputs are non-negative by construction, so this is a
            // clarifying response rather than a crash if it ever fires.
            debug!(session_id = %session.session_id, error = %e, "compute rejected inputs");
            return TransitionOutcome::reply(
                "Something about these figures doesn't add up — try re-declaring \
                 your income and I'll recalculate.",
            );
        }
    };

    session.stage = Stage::Review;
    session.last_result = Some(result.clone());

    let gate_outcome = gate::evaluate(&result, session);
    result.confidence = gate_outcome.confidence;
    session.last_result = Some(result.clone());
    session.needs_review = session.needs_review || !gate_outcome.candidates.is_empty();

    let mut reply = if result.refund_or_owed >= 0.0 {
        format!(
            "Here's your estimated 2025 tax return:\n\n\
             **Gross Income:** {}\n\
             **Deductions:** -{}\n\
             **Taxable Income:** {}\n\
             **Federal Tax:** {}\n\
             **Already Withheld:** {}\n\n\
             **Estimated Refund: {}**",
            fmt_usd_whole(result.gross_income),
            fmt_usd_whole(result.deductions),
            fmt_usd_whole(result.taxable_income),
            fmt_usd_whole(result.tax),
            fmt_usd_whole(result.withheld),
            fmt_usd_whole(result.refund_or_owed),
        )
    } else {
        format!(
            "Based on your information, you may owe **{}** in additional \
             taxes.\n\n\
             **Gross Income:** {}\n\
             **Taxable Income:** {}\n\
             **Federal Tax:** {}\n\
             **Already Withheld:** {}",
            fmt_usd_whole(result.refund_or_owed.abs()),
            fmt_usd_whole(result.gross_income),
            fmt_usd_whole(result.taxable_income),
            fmt_usd_whole(result.tax),
            fmt_usd_whole(result.withheld),
        )
    };

    let session_confidence = cumulative_confidence(session);
    if gate_outcome.candidates.is_empty() {
        reply.push_str(&format!(
            "\n\nThis return has a **high confidence score ({})**. No items \
             flagged for review.",
            fmt_percent(session_confidence)
        ));
    } else {
        reply.push_str(&format!(
            "\n\nThis return has a **confidence score of {}**. I've flagged \
             {} item(s) for professional review by a licensed reviewer.",
            fmt_percent(session_confidence),
            gate_outcome.candidates.len()
        ));
    }

    let mut cards = vec![refund_card(&result)];
    for item in &gate_outcome.candidates {
        cards.push(review_card(item));
    }

    TransitionOutcome { reply, cards, review_candidates: gate_outcome.candidates }
}

fn on_unrecognized(session: &SessionState) -> TransitionOutcome {
    TransitionOutcome::reply(format!(
        "I can help with your 2025 federal return. {}",
        contextual_prompt(session.stage)
    ))
}

/// What to nudge the user toward next, by stage.
fn contextual_prompt(stage: Stage) -> &'static str {
    match stage {
        Stage::Intake => {
            "To begin, what is your filing status? (Single, Married Filing \
             Jointly, Married Filing Separately, Head of Household, or \
             Qualifying Widow/Widower)"
        }
        Stage::Classifying => {
            "What was your total income for 2025? You can type the amount or \
             upload a photo of your W-2."
        }
        Stage::Deductions => {
            "Ask me about deductions and I'll compare the standard deduction \
             against itemizing."
        }
        Stage::Computing => {
            "Say \"calculate\" when you're ready and I'll estimate your tax \
             and refund."
        }
        Stage::Review => {
            "Your return is computed. You can re-declare any figure to update \
             it, or ask about your refund."
        }
    }
}

// ============================================================================
// Cards
// ============================================================================

fn progress_card(stage: Stage) -> StructuredCard {
    StructuredCard::ProgressCard {
        title: "Tax Return Progress".to_string(),
        step: stage.step(),
        total: Stage::TOTAL_STEPS,
        label: stage.label().to_string(),
    }
}

fn income_card(item: &IncomeItem) -> StructuredCard {
    StructuredCard::IncomeCard {
        title: format!("{} Recorded", item.source.label()),
        employer: item.employer.clone().unwrap_or_else(|| "N/A".to_string()),
        wages: item.amount,
        federal_withheld: item.federal_withheld,
        state_withheld: item.state_withheld,
    }
}

fn deduction_card(choice: &DeductionChoice) -> StructuredCard {
    StructuredCard::DeductionCard {
        title: "Deduction Analysis".to_string(),
        standard_deduction: choice.standard_deduction,
        itemized_total: choice.itemized_total,
        recommendation: if choice.use_standard { "standard" } else { "itemized" }.to_string(),
        savings: if choice.use_standard {
            choice.standard_deduction - choice.itemized_total
        } else {
            0.0
        },
    }
}

fn refund_card(result: &taxpilot_common::types::TaxResult) -> StructuredCard {
    StructuredCard::RefundCard {
        title: "Estimated Refund".to_string(),
        gross_income: result.gross_income,
        deductions: result.deductions,
        taxable_income: result.taxable_income,
        tax: result.tax,
        withheld: result.withheld,
        refund: result.refund_or_owed,
    }
}

fn review_card(item: &ReviewItem) -> StructuredCard {
    StructuredCard::ReviewCard {
        title: "Flagged for Review".to_string(),
        field: item.field_name.clone(),
        reason: item.reason.clone(),
        confidence: item.confidence,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Intent;
    use taxpilot_common::types::{FilingStatus, IncomeSource, Stage};

    fn session() -> SessionState {
        SessionState::new("test-session")
    }

    fn declare_single() -> Intent {
        Intent::DeclareFilingStatus { status: FilingStatus::Single, explicit: true }
    }

    fn declare_income(amount: f64) -> Intent {
        Intent::DeclareIncome { amount, source: IncomeSource::W2 }
    }

    #[test]
    fn test_greeting_stays_at_intake() {
        let mut s = session();
        let outcome = apply(&mut s, &Intent::Greeting);
        assert_eq!(s.stage, Stage::Intake);
        assert!((s.confidence - 0.05).abs() < 1e-9);
        assert!(outcome.reply.contains("filing status"));
        assert!(matches!(outcome.cards[0], StructuredCard::ProgressCard { step: 1, .. }));
    }

    #[test]
    fn test_status_advances_intake_to_classifying() {
        let mut s = session();
        apply(&mut s, &declare_single());
        assert_eq!(s.stage, Stage::Classifying);
        assert_eq!(s.filing_status, Some(FilingStatus::Single));
        assert!((s.confidence - 0.17).abs() < 1e-9);
    }

    #[test]
    fn test_income_advances_classifying_to_deductions() {
        let mut s = session();
        apply(&mut s, &declare_single());
        let outcome = apply(&mut s, &declare_income(75_000.0));
        assert_eq!(s.stage, Stage::Deductions);
        assert_eq!(s.total_income, 75_000.0);
        assert!((s.total_withheld - 12_525.0).abs() < 1e-6);
        assert!(outcome.cards.iter().any(|c| matches!(c, StructuredCard::IncomeCard { .. })));
    }

    #[test]
    fn test_income_before_status_recorded_but_stays_at_intake() {
        let mut s = session();
        let outcome = apply(&mut s, &declare_income(50_000.0));
        assert_eq!(s.stage, Stage::Intake);
        assert_eq!(s.total_income, 50_000.0);
        assert!(outcome.reply.contains("filing status"));

        // Compute still fails until the status arrives.
        let outcome = apply(&mut s, &Intent::ConfirmCompute);
        assert_eq!(s.stage, Stage::Intake);
        assert!(s.last_result.is_none());
        assert!(outcome.reply.contains("filing status"));
    }

    #[test]
    fn test_deduction_lookup_advances_and_uses_status() {
        let mut s = session();
        apply(&mut s, &declare_single());
        apply(&mut s, &declare_income(75_000.0));
        apply(&mut s, &Intent::RequestDeductionInfo);
        assert_eq!(s.stage, Stage::Computing);
        let choice = s.deduction.clone().unwrap();
        assert_eq!(choice.standard_deduction, 15_000.0);
        assert!(choice.use_standard);
        assert!(!choice.assumed_status);
    }

    #[test]
    fn test_deduction_lookup_without_status_falls_back_to_single() {
        let mut s = session();
        let outcome = apply(&mut s, &Intent::RequestDeductionInfo);
        let choice = s.deduction.clone().unwrap();
        assert_eq!(choice.standard_deduction, 15_000.0);
        assert!(choice.assumed_status);
        assert_eq!(s.field_confidence.deductions, CONF_ASSUMED_DEDUCTION);
        assert!(outcome.reply.contains("assuming Single"));
    }

    #[test]
    fn test_full_flow_computes_and_reaches_review() {
        let mut s = session();
        apply(&mut s, &Intent::Greeting);
        apply(&mut s, &declare_single());
        apply(&mut s, &declare_income(75_000.0));
        apply(&mut s, &Intent::RequestDeductionInfo);
        let outcome = apply(&mut s, &Intent::ConfirmCompute);

        assert_eq!(s.stage, Stage::Review);
        let result = s.last_result.clone().unwrap();
        assert_eq!(result.taxable_income, 60_000.0);
        assert_eq!(result.tax, 8_114.0);
        assert_eq!(result.refund_or_owed, 4_411.0);
        assert!(outcome.cards.iter().any(|c| matches!(c, StructuredCard::RefundCard { .. })));
        // Single filer: head-of-household optimization check fires.
        assert!(s.needs_review);
        assert!(!outcome.review_candidates.is_empty());
    }

    #[test]
    fn test_confidence_monotone_on_happy_path() {
        let mut s = session();
        let mut last = 0.0;
        for intent in [
            Intent::Greeting,
            declare_single(),
            declare_income(75_000.0),
            Intent::RequestDeductionInfo,
            Intent::ConfirmCompute,
        ] {
            apply(&mut s, &intent);
            assert!(
                s.confidence >= last,
                "confidence regressed: {} -> {} after {:?}",
                last,
                s.confidence,
                intent
            );
            last = s.confidence;
        }
        assert!(last <= 0.92 + 1e-9);
    }

    #[test]
    fn test_result_confidence_not_above_weakest_input() {
        let mut s = session();
        apply(&mut s, &declare_single());
        apply(&mut s, &declare_income(75_000.0));
        apply(&mut s, &Intent::RequestDeductionInfo);
        apply(&mut s, &Intent::ConfirmCompute);

        let result = s.last_result.clone().unwrap();
        let weakest = s
            .field_confidence
            .filing_status
            .min(s.field_confidence.income)
            .min(s.field_confidence.deductions);
        assert!(result.confidence <= weakest + 1e-9);
    }

    #[test]
    fn test_unrecognized_never_changes_stage() {
        let mut s = session();
        apply(&mut s, &declare_single());
        let stage_before = s.stage;
        apply(&mut s, &Intent::Unrecognized);
        assert_eq!(s.stage, stage_before);

        apply(&mut s, &Intent::Thanks);
        assert_eq!(s.stage, stage_before);

        apply(&mut s, &Intent::RequestMoreDeductions);
        assert_eq!(s.stage, stage_before);
    }

    #[test]
    fn test_redeclaring_status_does_not_regress_stage() {
        let mut s = session();
        apply(&mut s, &declare_single());
        apply(&mut s, &declare_income(75_000.0));
        assert_eq!(s.stage, Stage::Deductions);

        apply(
            &mut s,
            &Intent::DeclareFilingStatus {
                status: FilingStatus::HeadOfHousehold,
                explicit: true,
            },
        );
        assert_eq!(s.stage, Stage::Deductions);
        assert_eq!(s.filing_status, Some(FilingStatus::HeadOfHousehold));
    }

    #[test]
    fn test_status_change_invalidates_computed_result() {
        let mut s = session();
        apply(&mut s, &declare_single());
        apply(&mut s, &declare_income(75_000.0));
        apply(&mut s, &Intent::RequestDeductionInfo);
        apply(&mut s, &Intent::ConfirmCompute);
        assert!(s.last_result.is_some());

        apply(
            &mut s,
            &Intent::DeclareFilingStatus {
                status: FilingStatus::MarriedFilingJointly,
                explicit: true,
            },
        );
        assert!(s.last_result.is_none());
        assert_eq!(s.stage, Stage::Review);

        // The standard deduction tracked the new status.
        assert_eq!(s.deduction.clone().unwrap().standard_deduction, 30_000.0);
    }

    #[test]
    fn test_redeclaring_same_status_keeps_result() {
        let mut s = session();
        apply(&mut s, &declare_single());
        apply(&mut s, &declare_income(75_000.0));
        apply(&mut s, &Intent::ConfirmCompute);
        assert!(s.last_result.is_some());

        apply(&mut s, &declare_single());
        assert!(s.last_result.is_some());
    }

    #[test]
    fn test_compute_without_deduction_step_defaults_standard() {
        let mut s = session();
        apply(&mut s, &declare_single());
        apply(&mut s, &declare_income(75_000.0));
        let outcome = apply(&mut s, &Intent::ConfirmCompute);

        assert_eq!(s.stage, Stage::Review);
        let result = s.last_result.clone().unwrap();
        assert_eq!(result.deductions, 15_000.0);
        assert!(outcome.reply.contains("Estimated Refund"));
    }

    #[test]
    fn test_result_replaced_wholesale_on_recompute() {
        let mut s = session();
        apply(&mut s, &declare_single());
        apply(&mut s, &declare_income(75_000.0));
        apply(&mut s, &Intent::ConfirmCompute);
        let first = s.last_result.clone().unwrap();

        apply(&mut s, &declare_income(10_000.0));
        apply(&mut s, &Intent::ConfirmCompute);
        let second = s.last_result.clone().unwrap();

        assert_eq!(second.gross_income, 85_000.0);
        assert_ne!(first.tax, second.tax);
    }

    #[test]
    fn test_extracted_income_flows_through_same_transition() {
        let mut s = session();
        apply(&mut s, &declare_single());

        let fields = ExtractedFields {
            employer: "Demo Employer Inc.".to_string(),
            ein: "12-3456789".to_string(),
            wages: 75_000.0,
            federal_withheld: 12_500.0,
            state_withheld: 3_750.0,
            social_security_wages: 75_000.0,
            social_security_tax: 4_650.0,
            medicare_wages: 75_000.0,
            medicare_tax: 1_087.5,
        };
        let outcome = apply_extracted_income(&mut s, &fields);

        assert_eq!(s.stage, Stage::Deductions);
        assert_eq!(s.total_income, 75_000.0);
        // Extracted withholding is used verbatim, not derived.
        assert_eq!(s.total_withheld, 12_500.0);
        assert_eq!(s.field_confidence.income, CONF_EXTRACTED_INCOME);
        assert!(outcome.reply.contains("Demo Employer Inc."));
    }

    #[test]
    fn test_extracted_income_confidence_below_typed() {
        assert!(CONF_EXTRACTED_INCOME < CONF_TYPED_INCOME);
    }

    #[test]
    fn test_owed_phrasing_when_withholding_low() {
        let mut s = session();
        apply(&mut s, &declare_single());
        // Direct item with no withholding: user owes.
        s.income.push(IncomeItem {
            source: IncomeSource::Form1099,
            employer: None,
            amount: 90_000.0,
            federal_withheld: 0.0,
            state_withheld: 0.0,
            extracted: false,
        });
        s.recompute_totals();
        s.field_confidence.income = CONF_TYPED_INCOME;

        let outcome = apply(&mut s, &Intent::ConfirmCompute);
        let result = s.last_result.clone().unwrap();
        assert!(result.refund_or_owed < 0.0);
        assert!(outcome.reply.contains("you may owe"));
    }
}
