//! Confidence and review gate
//!
//! Post-processes a computed result: attaches a confidence score and runs a
//! fixed set of heuristic checks. Every check scoring below
//! [`REVIEW_THRESHOLD`] emits one pending review item; checks at or above
//! it never do. Items accumulate across the session's lifetime and are
//! never silently dropped.

use taxpilot_common::brackets::standard_deduction;
use taxpilot_common::calculator;
use taxpilot_common::money::fmt_usd_whole;
use taxpilot_common::types::{Confidence, FilingStatus, ReviewItem, SessionState, TaxResult};

use crate::engine::cumulative_confidence;

/// Checks scoring below this flag the field for human review.
pub const REVIEW_THRESHOLD: Confidence = 0.70;

/// Tax savings under an alternative filing status considered material.
const MATERIAL_STATUS_SAVINGS: f64 = 1_000.0;
/// Withholding above this fraction of gross income is an outlier.
const HIGH_WITHHOLDING_RATE: f64 = 0.25;
/// Withholding below this fraction of gross income is an outlier.
const LOW_WITHHOLDING_RATE: f64 = 0.10;
/// Refunds above this amount warrant a second pair of eyes.
const LARGE_REFUND: f64 = 5_000.0;

const SCORE_PASSED: Confidence = 0.95;
const SCORE_STATUS_OPTIMIZATION: Confidence = 0.68;
const SCORE_WITHHOLDING_OUTLIER: Confidence = 0.65;
const SCORE_LARGE_REFUND: Confidence = 0.60;

/// Gate verdict for one computed result.
#[derive(Debug, Clone)]
pub struct GateOutcome {
    /// Confidence attached to the result: the session's cumulative
    /// confidence capped by its weakest constituent input.
    pub confidence: Confidence,
    /// Pending review items for every check that scored below threshold.
    pub candidates: Vec<ReviewItem>,
}

/// One heuristic check's outcome. Every check always reports a score;
/// only sub-threshold scores carry a reason worth escalating.
#[derive(Debug, Clone)]
struct Check {
    field_name: &'static str,
    field_value: String,
    reason: String,
    score: Confidence,
}

impl Check {
    fn passed(field_name: &'static str) -> Self {
        Self {
            field_name,
            field_value: String::new(),
            reason: String::new(),
            score: SCORE_PASSED,
        }
    }
}

/// Evaluate a computed result against the session that produced it.
pub fn evaluate(result: &TaxResult, session: &SessionState) -> GateOutcome {
    let checks = [
        status_optimization_check(result, session),
        withholding_rate_check(result),
        large_refund_check(result),
    ];

    let candidates = checks
        .iter()
        .filter(|check| check.score < REVIEW_THRESHOLD)
        .map(|check| {
            ReviewItem::pending(
                session.session_id.clone(),
                check.field_name,
                check.field_value.clone(),
                check.reason.clone(),
                check.score,
            )
        })
        .collect();

    GateOutcome {
        confidence: cumulative_confidence(session).min(weakest_input(session)),
        candidates,
    }
}

/// The minimum confidence among the inputs the result was computed from.
fn weakest_input(session: &SessionState) -> Confidence {
    let mut weakest: Confidence = 1.0;
    if session.filing_status.is_some() {
        weakest = weakest.min(session.field_confidence.filing_status);
    }
    if session.total_income > 0.0 {
        weakest = weakest.min(session.field_confidence.income);
    }
    if session.deduction.is_some() {
        weakest = weakest.min(session.field_confidence.deductions);
    }
    weakest
}

/// Would a different filing status reduce tax liability by a material margin?
fn status_optimization_check(result: &TaxResult, session: &SessionState) -> Check {
    const FIELD: &str = "Filing Status Optimization";

    let Some(status) = session.filing_status else {
        return Check::passed(FIELD);
    };
    let alternative = match status {
        FilingStatus::Single => FilingStatus::HeadOfHousehold,
        FilingStatus::MarriedFilingSeparately => FilingStatus::MarriedFilingJointly,
        _ => return Check::passed(FIELD),
    };

    let Ok(alt_result) = calculator::compute(
        result.gross_income,
        alternative,
        standard_deduction(alternative),
        result.withheld,
    ) else {
        return Check::passed(FIELD);
    };

    let savings = result.tax - alt_result.tax;
    if savings > MATERIAL_STATUS_SAVINGS {
        Check {
            field_name: FIELD,
            field_value: status.as_str().to_string(),
            reason: format!(
                "Filer may qualify for {} status, which would save about {} in \
                 federal tax. Confirm eligibility before filing.",
                alternative.label(),
                fmt_usd_whole(savings),
            ),
            score: SCORE_STATUS_OPTIMIZATION,
        }
    } else {
        Check::passed(FIELD)
    }
}

/// Is the withholding rate far outside the typical band?
fn withholding_rate_check(result: &TaxResult) -> Check {
    const FIELD: &str = "Withholding Rate";

    if result.gross_income <= 0.0 {
        return Check::passed(FIELD);
    }
    let rate = result.withheld / result.gross_income;
    let field_value = format!("{:.1}%", rate * 100.0);

    if rate > HIGH_WITHHOLDING_RATE {
        Check {
            field_name: FIELD,
            field_value,
            reason: "Withholding rate exceeds 25% of gross income. Verify the \
                     withholding figures and consider adjusting the W-4."
                .to_string(),
            score: SCORE_WITHHOLDING_OUTLIER,
        }
    } else if rate < LOW_WITHHOLDING_RATE {
        Check {
            field_name: FIELD,
            field_value,
            reason: "Withholding rate is below 10% of gross income. The filer \
                     may owe at tax time; verify all withholding was captured."
                .to_string(),
            score: SCORE_WITHHOLDING_OUTLIER,
        }
    } else {
        Check::passed(FIELD)
    }
}

/// Unusually large refunds suggest a missed income source or typo.
fn large_refund_check(result: &TaxResult) -> Check {
    const FIELD: &str = "Large Refund Amount";

    if result.refund_or_owed > LARGE_REFUND {
        Check {
            field_name: FIELD,
            field_value: fmt_usd_whole(result.refund_or_owed),
            reason: format!(
                "Refund exceeds {}. Verify all income sources and withholding \
                 amounts before filing.",
                fmt_usd_whole(LARGE_REFUND),
            ),
            score: SCORE_LARGE_REFUND,
        }
    } else {
        Check::passed(FIELD)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CONF_DEDUCTION, CONF_EXPLICIT_STATUS, CONF_TYPED_INCOME};
    use taxpilot_common::types::{DeductionChoice, IncomeItem, IncomeSource, SessionState};

    /// Session with typed income at the given gross/withheld, deduction
    /// chosen, and the given status — ready for a compute.
    fn session_with(status: FilingStatus, gross: f64, withheld: f64) -> SessionState {
        let mut session = SessionState::new("gate-test");
        session.filing_status = Some(status);
        session.income.push(IncomeItem {
            source: IncomeSource::W2,
            employer: None,
            amount: gross,
            federal_withheld: withheld,
            state_withheld: 0.0,
            extracted: false,
        });
        session.recompute_totals();
        session.deduction = Some(DeductionChoice {
            standard_deduction: standard_deduction(status),
            itemized_total: 0.0,
            use_standard: true,
            assumed_status: false,
        });
        session.field_confidence.filing_status = CONF_EXPLICIT_STATUS;
        session.field_confidence.income = CONF_TYPED_INCOME;
        session.field_confidence.deductions = CONF_DEDUCTION;
        session
    }

    fn computed(session: &SessionState) -> TaxResult {
        let status = session.filing_status.unwrap();
        calculator::compute(
            session.total_income,
            status,
            standard_deduction(status),
            session.total_withheld,
        )
        .unwrap()
    }

    #[test]
    fn test_single_filer_flags_status_optimization() {
        let session = session_with(FilingStatus::Single, 75_000.0, 12_525.0);
        let result = computed(&session);
        let outcome = evaluate(&result, &session);

        assert_eq!(outcome.candidates.len(), 1);
        let item = &outcome.candidates[0];
        assert_eq!(item.field_name, "Filing Status Optimization");
        assert!(item.confidence < REVIEW_THRESHOLD);
        assert!(item.reason.contains("Head of Household"));
        assert!(item.reason.contains("$2,154"));
    }

    #[test]
    fn test_quiet_return_flags_nothing() {
        // Head of household has no cheaper alternative status; withholding
        // at 16.7% is in band; refund stays under the large-refund line.
        let session = session_with(FilingStatus::HeadOfHousehold, 40_000.0, 6_680.0);
        let result = computed(&session);
        let outcome = evaluate(&result, &session);
        assert!(outcome.candidates.is_empty());
    }

    #[test]
    fn test_zero_withholding_flags_rate_outlier() {
        let session = session_with(FilingStatus::HeadOfHousehold, 90_000.0, 0.0);
        let result = computed(&session);
        let outcome = evaluate(&result, &session);

        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].field_name, "Withholding Rate");
        assert!(outcome.candidates[0].reason.contains("below 10%"));
    }

    #[test]
    fn test_heavy_withholding_flags_rate_and_refund() {
        // 30% withholding: rate outlier, and the refund clears $5,000.
        let session = session_with(FilingStatus::HeadOfHousehold, 80_000.0, 24_000.0);
        let result = computed(&session);
        let outcome = evaluate(&result, &session);

        let fields: Vec<&str> =
            outcome.candidates.iter().map(|c| c.field_name.as_str()).collect();
        assert!(fields.contains(&"Withholding Rate"));
        assert!(fields.contains(&"Large Refund Amount"));
    }

    #[test]
    fn test_separate_filers_compared_against_joint() {
        let session = session_with(FilingStatus::MarriedFilingSeparately, 60_000.0, 10_020.0);
        let result = computed(&session);
        let outcome = evaluate(&result, &session);

        assert!(outcome
            .candidates
            .iter()
            .any(|c| c.field_name == "Filing Status Optimization"
                && c.reason.contains("Married Filing Jointly")));
    }

    #[test]
    fn test_every_candidate_scores_below_threshold() {
        let session = session_with(FilingStatus::Single, 80_000.0, 24_000.0);
        let result = computed(&session);
        let outcome = evaluate(&result, &session);

        assert!(!outcome.candidates.is_empty());
        for item in &outcome.candidates {
            assert!(item.confidence < REVIEW_THRESHOLD, "{}", item.field_name);
        }
    }

    #[test]
    fn test_confidence_capped_by_weakest_input() {
        let mut session = session_with(FilingStatus::Single, 75_000.0, 12_525.0);
        session.field_confidence.income = 0.40;
        let result = computed(&session);
        let outcome = evaluate(&result, &session);
        assert!(outcome.confidence <= 0.40 + 1e-9);
    }

    #[test]
    fn test_candidates_are_pending() {
        let session = session_with(FilingStatus::Single, 75_000.0, 12_525.0);
        let result = computed(&session);
        for item in evaluate(&result, &session).candidates {
            assert_eq!(item.status, taxpilot_common::types::ReviewStatus::Pending);
            assert_eq!(item.session_id, "gate-test");
            assert!(item.resolved_at.is_none());
        }
    }
}
