//! 2025 federal tax brackets and standard deductions
//!
//! Static data per filing status. Each bracket list is ordered, contiguous,
//! and gap-free over [0, ∞): `upper[i] == lower[i+1]` and the last bracket
//! is unbounded.

use crate::types::FilingStatus;

/// A contiguous income range taxed at a single marginal rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxBracket {
    pub lower: f64,
    pub upper: f64,
    pub rate: f64,
}

const SINGLE: &[TaxBracket] = &[
    TaxBracket { lower: 0.0, upper: 11_925.0, rate: 0.10 },
    TaxBracket { lower: 11_925.0, upper: 48_475.0, rate: 0.12 },
    TaxBracket { lower: 48_475.0, upper: 103_350.0, rate: 0.22 },
    TaxBracket { lower: 103_350.0, upper: 197_300.0, rate: 0.24 },
    TaxBracket { lower: 197_300.0, upper: 250_525.0, rate: 0.32 },
    TaxBracket { lower: 250_525.0, upper: 626_350.0, rate: 0.35 },
    TaxBracket { lower: 626_350.0, upper: f64::INFINITY, rate: 0.37 },
];

const MARRIED_FILING_JOINTLY: &[TaxBracket] = &[
    TaxBracket { lower: 0.0, upper: 23_850.0, rate: 0.10 },
    TaxBracket { lower: 23_850.0, upper: 96_950.0, rate: 0.12 },
    TaxBracket { lower: 96_950.0, upper: 206_700.0, rate: 0.22 },
    TaxBracket { lower: 206_700.0, upper: 394_600.0, rate: 0.24 },
    TaxBracket { lower: 394_600.0, upper: 501_050.0, rate: 0.32 },
    TaxBracket { lower: 501_050.0, upper: 751_600.0, rate: 0.35 },
    TaxBracket { lower: 751_600.0, upper: f64::INFINITY, rate: 0.37 },
];

const MARRIED_FILING_SEPARATELY: &[TaxBracket] = &[
    TaxBracket { lower: 0.0, upper: 11_925.0, rate: 0.10 },
    TaxBracket { lower: 11_925.0, upper: 48_475.0, rate: 0.12 },
    TaxBracket { lower: 48_475.0, upper: 103_350.0, rate: 0.22 },
    TaxBracket { lower: 103_350.0, upper: 197_300.0, rate: 0.24 },
    TaxBracket { lower: 197_300.0, upper: 250_525.0, rate: 0.32 },
    TaxBracket { lower: 250_525.0, upper: 375_800.0, rate: 0.35 },
    TaxBracket { lower: 375_800.0, upper: f64::INFINITY, rate: 0.37 },
];

const HEAD_OF_HOUSEHOLD: &[TaxBracket] = &[
    TaxBracket { lower: 0.0, upper: 17_000.0, rate: 0.10 },
    TaxBracket { lower: 17_000.0, upper: 64_850.0, rate: 0.12 },
    TaxBracket { lower: 64_850.0, upper: 103_350.0, rate: 0.22 },
    TaxBracket { lower: 103_350.0, upper: 197_300.0, rate: 0.24 },
    TaxBracket { lower: 197_300.0, upper: 250_500.0, rate: 0.32 },
    TaxBracket { lower: 250_500.0, upper: 626_350.0, rate: 0.35 },
    TaxBracket { lower: 626_350.0, upper: f64::INFINITY, rate: 0.37 },
];

const QUALIFYING_WIDOW: &[TaxBracket] = &[
    TaxBracket { lower: 0.0, upper: 23_850.0, rate: 0.10 },
    TaxBracket { lower: 23_850.0, upper: 96_950.0, rate: 0.12 },
    TaxBracket { lower: 96_950.0, upper: 206_700.0, rate: 0.22 },
    TaxBracket { lower: 206_700.0, upper: 394_600.0, rate: 0.24 },
    TaxBracket { lower: 394_600.0, upper: 501_050.0, rate: 0.32 },
    TaxBracket { lower: 501_050.0, upper: 751_600.0, rate: 0.35 },
    TaxBracket { lower: 751_600.0, upper: f64::INFINITY, rate: 0.37 },
];

/// Ordered marginal brackets for a filing status.
pub fn brackets(status: FilingStatus) -> &'static [TaxBracket] {
    match status {
        FilingStatus::Single => SINGLE,
        FilingStatus::MarriedFilingJointly => MARRIED_FILING_JOINTLY,
        FilingStatus::MarriedFilingSeparately => MARRIED_FILING_SEPARATELY,
        FilingStatus::HeadOfHousehold => HEAD_OF_HOUSEHOLD,
        FilingStatus::QualifyingWidow => QUALIFYING_WIDOW,
    }
}

/// 2025 standard deduction for a filing status.
pub fn standard_deduction(status: FilingStatus) -> f64 {
    match status {
        FilingStatus::Single => 15_000.0,
        FilingStatus::MarriedFilingJointly => 30_000.0,
        FilingStatus::MarriedFilingSeparately => 15_000.0,
        FilingStatus::HeadOfHousehold => 22_500.0,
        FilingStatus::QualifyingWidow => 30_000.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FilingStatus;

    #[test]
    fn test_brackets_start_at_zero() {
        for status in FilingStatus::ALL {
            assert_eq!(brackets(status)[0].lower, 0.0, "{status}");
        }
    }

    #[test]
    fn test_brackets_contiguous_and_gap_free() {
        for status in FilingStatus::ALL {
            let table = brackets(status);
            for pair in table.windows(2) {
                assert_eq!(
                    pair[0].upper, pair[1].lower,
                    "{status}: gap or overlap between brackets"
                );
            }
        }
    }

    #[test]
    fn test_last_bracket_unbounded() {
        for status in FilingStatus::ALL {
            let last = brackets(status).last().unwrap();
            assert!(last.upper.is_infinite(), "{status}");
            assert_eq!(last.rate, 0.37, "{status}");
        }
    }

    #[test]
    fn test_rates_non_decreasing() {
        for status in FilingStatus::ALL {
            let table = brackets(status);
            for pair in table.windows(2) {
                assert!(pair[0].rate <= pair[1].rate, "{status}");
            }
        }
    }

    #[test]
    fn test_standard_deductions() {
        assert_eq!(standard_deduction(FilingStatus::Single), 15_000.0);
        assert_eq!(standard_deduction(FilingStatus::MarriedFilingJointly), 30_000.0);
        assert_eq!(standard_deduction(FilingStatus::MarriedFilingSeparately), 15_000.0);
        assert_eq!(standard_deduction(FilingStatus::HeadOfHousehold), 22_500.0);
        assert_eq!(standard_deduction(FilingStatus::QualifyingWidow), 30_000.0);
    }
}
