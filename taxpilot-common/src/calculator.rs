//! Progressive federal tax calculator
//!
//! Pure and deterministic: identical inputs always produce identical
//! outputs. No session state, no I/O.

use crate::brackets::{brackets, standard_deduction};
use crate::error::{Error, Result};
use crate::types::{FilingStatus, TaxResult};

/// Compute a tax outcome with progressive marginal taxation.
///
/// `taxable = max(0, gross_income - deductions)`. Each bracket taxes
/// `min(remaining, upper - lower)` at its marginal rate. The total is
/// rounded to whole dollars once at the end, never per bracket.
/// `refund_or_owed = withheld - tax`; negative means the filer owes.
///
/// Fails with `InvalidInput` on negative or non-finite inputs.
pub fn compute(
    gross_income: f64,
    status: FilingStatus,
    deductions: f64,
    withheld: f64,
) -> Result<TaxResult> {
    if !gross_income.is_finite() || gross_income < 0.0 {
        return Err(Error::InvalidInput(format!(
            "gross income must be a non-negative amount, got {gross_income}"
        )));
    }
    if !deductions.is_finite() || deductions < 0.0 {
        return Err(Error::InvalidInput(format!(
            "deductions must be a non-negative amount, got {deductions}"
        )));
    }
    if !withheld.is_finite() || withheld < 0.0 {
        return Err(Error::InvalidInput(format!(
            "withholding must be a non-negative amount, got {withheld}"
        )));
    }

    let taxable_income = (gross_income - deductions).max(0.0);

    let mut tax = 0.0;
    for bracket in brackets(status) {
        if taxable_income <= bracket.lower {
            break;
        }
        let taxed = taxable_income.min(bracket.upper) - bracket.lower;
        tax += taxed * bracket.rate;
    }
    let tax = tax.round();

    let effective_rate = if gross_income > 0.0 {
        tax / gross_income
    } else {
        0.0
    };

    Ok(TaxResult {
        gross_income,
        deductions,
        taxable_income,
        tax,
        withheld,
        refund_or_owed: withheld - tax,
        effective_rate,
        confidence: 1.0,
    })
}

/// Convenience: compute with the filing status' standard deduction.
pub fn compute_with_standard_deduction(
    gross_income: f64,
    status: FilingStatus,
    withheld: f64,
) -> Result<TaxResult> {
    compute(gross_income, status, standard_deduction(status), withheld)
}
