//! Intent classification
//!
//! Maps a free-text utterance plus the current conversation stage to a
//! recognized intent. Pure function of its two inputs: no session access,
//! no I/O, so it is independently testable.
//!
//! Matching is an ordered rule table. Precedence is the list order in
//! [`RULES`]; notably, filing-status keywords are checked before any
//! numeric pattern, so "married, and I made $80,000" declares a status.

use once_cell::sync::Lazy;
use regex::Regex;

use taxpilot_common::types::{FilingStatus, IncomeSource, Stage};

/// A classified user intent.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Greeting,
    DeclareFilingStatus {
        status: FilingStatus,
        /// False when inferred from an ambiguous keyword (bare "married").
        explicit: bool,
    },
    DeclareIncome {
        amount: f64,
        source: IncomeSource,
    },
    RequestDeductionInfo,
    RequestMoreDeductions,
    ConfirmCompute,
    UploadRedirect,
    Thanks,
    Unrecognized,
}

/// One entry in the ordered rule table.
struct Rule {
    name: &'static str,
    matcher: fn(Stage, &str) -> Option<Intent>,
}

/// Ordered rule table; the first match wins.
static RULES: &[Rule] = &[
    Rule { name: "filing-status", matcher: match_filing_status },
    Rule { name: "upload", matcher: match_upload },
    Rule { name: "deductions", matcher: match_deductions },
    Rule { name: "income", matcher: match_income },
    Rule { name: "compute", matcher: match_compute },
    Rule { name: "greeting", matcher: match_greeting },
    Rule { name: "thanks", matcher: match_thanks },
];

/// Classify an utterance in the context of the current stage.
pub fn classify(stage: Stage, utterance: &str) -> Intent {
    let lower = utterance.to_lowercase();
    for rule in RULES {
        if let Some(intent) = (rule.matcher)(stage, &lower) {
            tracing::trace!(rule = rule.name, "intent rule matched");
            return intent;
        }
    }
    Intent::Unrecognized
}

// ============================================================================
// Matchers (all take the lowercased utterance)
// ============================================================================

fn has_token(lower: &str, token: &str) -> bool {
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|t| t == token)
}

fn match_filing_status(_stage: Stage, lower: &str) -> Option<Intent> {
    let status = if lower.contains("married") && lower.contains("joint") {
        Some((FilingStatus::MarriedFilingJointly, true))
    } else if lower.contains("married") && lower.contains("separate") {
        Some((FilingStatus::MarriedFilingSeparately, true))
    } else if lower.contains("head") && lower.contains("household") {
        Some((FilingStatus::HeadOfHousehold, true))
    } else if lower.contains("widow") || lower.contains("qualifying") {
        Some((FilingStatus::QualifyingWidow, true))
    } else if has_token(lower, "single") {
        Some((FilingStatus::Single, true))
    } else if has_token(lower, "married") {
        // Bare "married" defaults to joint filing; lower confidence.
        Some((FilingStatus::MarriedFilingJointly, false))
    } else {
        None
    };

    status.map(|(status, explicit)| Intent::DeclareFilingStatus { status, explicit })
}

fn match_upload(_stage: Stage, lower: &str) -> Option<Intent> {
    const KEYWORDS: &[&str] = &["upload", "photo", "picture", "scan", "camera"];
    KEYWORDS
        .iter()
        .any(|k| lower.contains(k))
        .then_some(Intent::UploadRedirect)
}

fn match_deductions(stage: Stage, lower: &str) -> Option<Intent> {
    const KEYWORDS: &[&str] = &[
        "deduct",
        "credit",
        "mortgage",
        "charitable",
        "student loan",
        "itemiz",
        "write-off",
        "write off",
    ];
    if !KEYWORDS.iter().any(|k| lower.contains(k)) {
        return None;
    }
    if stage >= Stage::Computing {
        Some(Intent::RequestMoreDeductions)
    } else {
        Some(Intent::RequestDeductionInfo)
    }
}

fn match_income(stage: Stage, lower: &str) -> Option<Intent> {
    const KEYWORDS: &[&str] = &[
        "w-2", "w2", "income", "salary", "wage", "paycheck", "1099", "earned", "made",
    ];
    let has_keyword = KEYWORDS.iter().any(|k| lower.contains(k));

    let amount = largest_amount(lower)?;

    // A bare monetary amount only reads as income while the session is
    // still collecting it; with an income keyword, a later amount is a
    // re-declaration.
    if has_keyword || stage < Stage::Computing {
        let source = if lower.contains("1099") {
            IncomeSource::Form1099
        } else if lower.contains("self-employ") || lower.contains("freelance") {
            IncomeSource::SelfEmployment
        } else {
            IncomeSource::W2
        };
        Some(Intent::DeclareIncome { amount, source })
    } else {
        None
    }
}

fn match_compute(stage: Stage, lower: &str) -> Option<Intent> {
    const STRONG: &[&str] = &[
        "calculate",
        "compute",
        "refund",
        "how much do i owe",
        "file my",
        "estimate",
    ];
    if STRONG.iter().any(|k| lower.contains(k)) {
        return Some(Intent::ConfirmCompute);
    }

    // Bare affirmations only confirm a compute when the agent just offered
    // one (the session sits at the computing stage).
    const AFFIRM: &[&str] = &["yes", "yep", "yeah", "sure", "ok", "okay", "proceed", "ready"];
    if stage == Stage::Computing
        && (AFFIRM.iter().any(|t| has_token(lower, t)) || lower.contains("go ahead"))
    {
        return Some(Intent::ConfirmCompute);
    }
    None
}

fn match_greeting(_stage: Stage, lower: &str) -> Option<Intent> {
    const TOKENS: &[&str] = &["hello", "hi", "hey", "howdy", "greetings", "start"];
    const PHRASES: &[&str] = &["get started", "start over", "good morning", "good afternoon"];
    (TOKENS.iter().any(|t| has_token(lower, t)) || PHRASES.iter().any(|p| lower.contains(p)))
        .then_some(Intent::Greeting)
}

fn match_thanks(_stage: Stage, lower: &str) -> Option<Intent> {
    (lower.contains("thank") || has_token(lower, "thx") || has_token(lower, "ty"))
        .then_some(Intent::Thanks)
}

// ============================================================================
// Amount extraction
// ============================================================================

static AMOUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?\d[\d,]*(?:\.\d{1,2})?").expect("amount regex"));

/// Minimum value treated as a declared income amount.
const MIN_INCOME_AMOUNT: f64 = 100.0;

/// Largest plausible dollar amount mentioned in the utterance, if any.
///
/// Trivial figures (<= $100) are ignored. A bare integer with no `$`,
/// comma, or cents is skipped when it reads as a year ("my 2025 return")
/// or a form number ("I got a 1099").
pub fn largest_amount(lower: &str) -> Option<f64> {
    let mut best: Option<f64> = None;
    for m in AMOUNT_RE.find_iter(lower) {
        let text = m.as_str();
        let marked = text.starts_with('$') || text.contains(',') || text.contains('.');
        let cleaned: String = text.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
        let Ok(value) = cleaned.parse::<f64>() else {
            continue;
        };
        let year_like = (1900.0..=2100.0).contains(&value);
        let form_number = value == 1040.0 || value == 1099.0;
        if !marked && (year_like || form_number) {
            continue;
        }
        if value > MIN_INCOME_AMOUNT && best.map_or(true, |b| value > b) {
            best = Some(value);
        }
    }
    best
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting() {
        assert_eq!(classify(Stage::Intake, "Hello!"), Intent::Greeting);
        assert_eq!(classify(Stage::Intake, "hi there"), Intent::Greeting);
        assert_eq!(classify(Stage::Intake, "let's get started"), Intent::Greeting);
    }

    #[test]
    fn test_greeting_token_does_not_match_inside_words() {
        // "hi" inside "this" must not read as a greeting
        assert_eq!(classify(Stage::Intake, "this is confusing"), Intent::Unrecognized);
    }

    #[test]
    fn test_filing_status_variants() {
        let cases = [
            ("I'm single", FilingStatus::Single, true),
            ("married filing jointly", FilingStatus::MarriedFilingJointly, true),
            ("we are married, filing separately", FilingStatus::MarriedFilingSeparately, true),
            ("head of household", FilingStatus::HeadOfHousehold, true),
            ("qualifying widow", FilingStatus::QualifyingWidow, true),
            ("I'm married", FilingStatus::MarriedFilingJointly, false),
        ];
        for (utterance, expected, explicit) in cases {
            assert_eq!(
                classify(Stage::Intake, utterance),
                Intent::DeclareFilingStatus { status: expected, explicit },
                "{utterance}"
            );
        }
    }

    #[test]
    fn test_filing_status_beats_amount() {
        // An utterance carrying both a status keyword and an amount
        // resolves to the status declaration.
        assert_eq!(
            classify(Stage::Intake, "I'm married and I made $80,000"),
            Intent::DeclareFilingStatus {
                status: FilingStatus::MarriedFilingJointly,
                explicit: false
            }
        );
    }

    #[test]
    fn test_income_with_keyword() {
        assert_eq!(
            classify(Stage::Classifying, "My W-2 salary was $75,000"),
            Intent::DeclareIncome { amount: 75_000.0, source: IncomeSource::W2 }
        );
    }

    #[test]
    fn test_income_1099_source() {
        assert_eq!(
            classify(Stage::Classifying, "I got a 1099 for 12,000"),
            Intent::DeclareIncome { amount: 12_000.0, source: IncomeSource::Form1099 }
        );
    }

    #[test]
    fn test_bare_amount_is_income_before_computing() {
        assert_eq!(
            classify(Stage::Classifying, "$75,000"),
            Intent::DeclareIncome { amount: 75_000.0, source: IncomeSource::W2 }
        );
    }

    #[test]
    fn test_bare_amount_is_not_income_after_computing() {
        assert_eq!(classify(Stage::Computing, "$75,000"), Intent::Unrecognized);
        assert_eq!(classify(Stage::Review, "300"), Intent::Unrecognized);
    }

    #[test]
    fn test_keyworded_amount_redeclares_late() {
        assert_eq!(
            classify(Stage::Review, "actually my salary was $82,000"),
            Intent::DeclareIncome { amount: 82_000.0, source: IncomeSource::W2 }
        );
    }

    #[test]
    fn test_year_is_not_income() {
        assert_eq!(classify(Stage::Classifying, "filing for 2025"), Intent::Unrecognized);
    }

    #[test]
    fn test_bare_form_number_is_not_income() {
        assert_eq!(classify(Stage::Classifying, "I got a 1099"), Intent::Unrecognized);
    }

    #[test]
    fn test_small_amounts_ignored() {
        assert_eq!(classify(Stage::Classifying, "about 50 dollars"), Intent::Unrecognized);
    }

    #[test]
    fn test_deduction_request() {
        assert_eq!(
            classify(Stage::Deductions, "what deductions can I take?"),
            Intent::RequestDeductionInfo
        );
        assert_eq!(
            classify(Stage::Deductions, "can I deduct my $5,200 donation?"),
            Intent::RequestDeductionInfo
        );
    }

    #[test]
    fn test_more_deductions_after_computing() {
        assert_eq!(
            classify(Stage::Review, "any other credits I should know about?"),
            Intent::RequestMoreDeductions
        );
    }

    #[test]
    fn test_compute_keywords() {
        assert_eq!(classify(Stage::Intake, "calculate my taxes"), Intent::ConfirmCompute);
        assert_eq!(classify(Stage::Computing, "what's my refund?"), Intent::ConfirmCompute);
    }

    #[test]
    fn test_affirmation_confirms_only_at_computing() {
        assert_eq!(classify(Stage::Computing, "yes, go ahead"), Intent::ConfirmCompute);
        assert_eq!(classify(Stage::Intake, "yes"), Intent::Unrecognized);
        assert_eq!(classify(Stage::Deductions, "sure"), Intent::Unrecognized);
    }

    #[test]
    fn test_upload() {
        assert_eq!(
            classify(Stage::Classifying, "can I upload a photo of my W-2?"),
            Intent::UploadRedirect
        );
    }

    #[test]
    fn test_thanks() {
        assert_eq!(classify(Stage::Review, "thank you!"), Intent::Thanks);
    }

    #[test]
    fn test_unrecognized_default() {
        assert_eq!(classify(Stage::Intake, "what's the weather like?"), Intent::Unrecognized);
    }

    #[test]
    fn test_largest_amount_picks_max() {
        assert_eq!(largest_amount("i made $60,000 and $15,000 freelancing"), Some(60_000.0));
    }

    #[test]
    fn test_classify_is_pure() {
        let a = classify(Stage::Classifying, "salary $50,000");
        let b = classify(Stage::Classifying, "salary $50,000");
        assert_eq!(a, b);
    }
}
