//! Tax engine (C7): federal brackets, state table, FICA, Social Security
//! provisional-income taxation, long-term capital gains brackets, and
//! Medicare/IRMAA with its 2-year MAGI lookback.

use crate::model::profile::{FilingStatus, TaxBracket};

pub const FICA_RATE: f64 = 0.0765;
pub const MEDICARE_START_AGE: u32 = 65;

/// Marginal federal (or any other bracket-schedule) tax on `income`,
/// walking the brackets the way the teacher's bracket walker does.
#[must_use]
pub fn calculate_bracket_tax(income: f64, brackets: &[TaxBracket]) -> f64 {
    if income <= 0.0 || brackets.is_empty() {
        return 0.0;
    }

    let mut tax = 0.0;
    let mut prev_threshold = 0.0;

    for (i, bracket) in brackets.iter().enumerate() {
        let next_threshold = brackets
            .get(i + 1)
            .map(|b| b.threshold)
            .unwrap_or(f64::INFINITY);

        if income <= bracket.threshold {
            break;
        }

        let taxable_in_bracket =
            (income.min(next_threshold) - bracket.threshold.max(prev_threshold)).max(0.0);
        tax += taxable_in_bracket * bracket.rate;
        prev_threshold = bracket.threshold;
    }

    tax
}

/// Marginal tax on `additional_income` given `ytd_income` already earned
/// this year, within the same bracket schedule.
#[must_use]
pub fn calculate_marginal_tax(
    additional_income: f64,
    ytd_income: f64,
    brackets: &[TaxBracket],
) -> f64 {
    calculate_bracket_tax(ytd_income + additional_income, brackets)
        - calculate_bracket_tax(ytd_income, brackets)
}

/// FICA applies to wages only, never to withdrawals or Social Security.
#[must_use]
pub fn fica_tax(wages: f64) -> f64 {
    wages.max(0.0) * FICA_RATE
}

#[must_use]
pub fn standard_deduction(filing_status: FilingStatus, base_year_value: f64) -> f64 {
    match filing_status {
        FilingStatus::Single => base_year_value,
        FilingStatus::MarriedFilingJointly => base_year_value * 2.0,
    }
}

/// CPI-index a nominal, base-year dollar amount (bracket thresholds,
/// deductions) forward by `years_elapsed` at `inflation_rate`.
#[must_use]
pub fn index_for_inflation(base_amount: f64, inflation_rate: f64, years_elapsed: u32) -> f64 {
    base_amount * (1.0 + inflation_rate).powi(years_elapsed as i32)
}

#[must_use]
pub fn index_brackets(brackets: &[TaxBracket], inflation_rate: f64, years_elapsed: u32) -> Vec<TaxBracket> {
    brackets
        .iter()
        .map(|b| TaxBracket {
            threshold: index_for_inflation(b.threshold, inflation_rate, years_elapsed),
            rate: b.rate,
        })
        .collect()
}

/// Social Security's provisional-income formula: how much of the benefit
/// is included in taxable income (0%, 50%, or 85%), based on provisional
/// income = AGI excluding SS + tax-exempt interest + half of SS benefit.
#[must_use]
pub fn taxable_social_security(
    annual_benefit: f64,
    other_income: f64,
    filing_status: FilingStatus,
) -> f64 {
    let (first_threshold, second_threshold) = match filing_status {
        FilingStatus::Single => (25_000.0, 34_000.0),
        FilingStatus::MarriedFilingJointly => (32_000.0, 44_000.0),
    };

    let provisional_income = other_income + 0.5 * annual_benefit;

    if provisional_income <= first_threshold {
        0.0
    } else if provisional_income <= second_threshold {
        (0.5 * (provisional_income - first_threshold)).min(0.5 * annual_benefit)
    } else {
        let tier2 = 0.85 * (provisional_income - second_threshold);
        let tier1_cap = 0.5 * (second_threshold - first_threshold);
        (tier2 + tier1_cap).min(0.85 * annual_benefit)
    }
}

/// Long-term capital gains brackets (0/15/20%), computed the same way a
/// bracket walk computes ordinary tax but stacked on top of ordinary
/// taxable income (the income that fills the 0%/15% thresholds first).
#[must_use]
pub fn long_term_capital_gains_tax(
    ordinary_taxable_income: f64,
    long_term_gain: f64,
    ltcg_brackets: &[TaxBracket],
) -> f64 {
    if long_term_gain <= 0.0 {
        return 0.0;
    }
    calculate_marginal_tax(long_term_gain, ordinary_taxable_income, ltcg_brackets)
}

#[must_use]
pub fn default_ltcg_brackets(filing_status: FilingStatus) -> Vec<TaxBracket> {
    match filing_status {
        FilingStatus::Single => vec![
            TaxBracket { threshold: 0.0, rate: 0.0 },
            TaxBracket { threshold: 47_025.0, rate: 0.15 },
            TaxBracket { threshold: 518_900.0, rate: 0.20 },
        ],
        FilingStatus::MarriedFilingJointly => vec![
            TaxBracket { threshold: 0.0, rate: 0.0 },
            TaxBracket { threshold: 94_050.0, rate: 0.15 },
            TaxBracket { threshold: 583_750.0, rate: 0.20 },
        ],
    }
}

/// IRMAA tier: annual Part B + Part D surcharge on top of standard
/// Medicare premiums, keyed by MAGI from two years prior.
#[derive(Debug, Clone, Copy)]
struct IrmaaTier {
    magi_single: f64,
    magi_joint: f64,
    annual_surcharge: f64,
}

const IRMAA_TIERS: &[IrmaaTier] = &[
    IrmaaTier { magi_single: 103_000.0, magi_joint: 206_000.0, annual_surcharge: 0.0 },
    IrmaaTier { magi_single: 129_000.0, magi_joint: 258_000.0, annual_surcharge: 840.0 },
    IrmaaTier { magi_single: 161_000.0, magi_joint: 322_000.0, annual_surcharge: 2_100.0 },
    IrmaaTier { magi_single: 193_000.0, magi_joint: 386_000.0, annual_surcharge: 3_360.0 },
    IrmaaTier { magi_single: 500_000.0, magi_joint: 750_000.0, annual_surcharge: 4_620.0 },
    IrmaaTier { magi_single: f64::INFINITY, magi_joint: f64::INFINITY, annual_surcharge: 5_040.0 },
];

/// IRMAA surcharge for the current Medicare year, using MAGI from two
/// years before (the statutory lookback). `None` before age 65 or when
/// the 2-year-prior MAGI isn't yet in history (first two Medicare years
/// fall back to pre-retirement wage MAGI per §4.7).
#[must_use]
pub fn irmaa_surcharge(age: u32, magi_two_years_ago: f64, filing_status: FilingStatus) -> f64 {
    if age < MEDICARE_START_AGE {
        return 0.0;
    }
    for tier in IRMAA_TIERS {
        let threshold = match filing_status {
            FilingStatus::Single => tier.magi_single,
            FilingStatus::MarriedFilingJointly => tier.magi_joint,
        };
        if magi_two_years_ago <= threshold {
            return tier.annual_surcharge;
        }
    }
    IRMAA_TIERS.last().unwrap().annual_surcharge
}

/// States with no state income tax, used by the parameter mapper to zero
/// `TaxConfig::state_rate`.
pub const NO_TAX_STATES: &[&str] = &[
    "AK", "FL", "NV", "NH", "SD", "TN", "TX", "WA", "WY",
];

#[must_use]
pub fn state_tax(income: f64, state_rate: f64) -> f64 {
    income.max(0.0) * state_rate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brackets() -> Vec<TaxBracket> {
        vec![
            TaxBracket { threshold: 0.0, rate: 0.10 },
            TaxBracket { threshold: 10_000.0, rate: 0.12 },
            TaxBracket { threshold: 40_000.0, rate: 0.22 },
        ]
    }

    #[test]
    fn bracket_tax_walks_multiple_brackets() {
        let tax = calculate_bracket_tax(50_000.0, &brackets());
        // 10k@10% + 30k@12% + 10k@22% = 1000+3600+2200 = 6800
        assert!((tax - 6_800.0).abs() < 0.01);
    }

    #[test]
    fn provisional_income_below_first_threshold_is_untaxed() {
        let taxable = taxable_social_security(24_000.0, 5_000.0, FilingStatus::Single);
        assert_eq!(taxable, 0.0);
    }

    #[test]
    fn provisional_income_above_second_threshold_caps_at_85_percent() {
        let taxable = taxable_social_security(30_000.0, 200_000.0, FilingStatus::Single);
        assert!((taxable - 0.85 * 30_000.0).abs() < 1.0);
    }

    #[test]
    fn irmaa_is_zero_before_medicare_age() {
        assert_eq!(irmaa_surcharge(64, 1_000_000.0, FilingStatus::Single), 0.0);
    }

    #[test]
    fn irmaa_escalates_with_magi() {
        let low = irmaa_surcharge(66, 90_000.0, FilingStatus::Single);
        let high = irmaa_surcharge(66, 600_000.0, FilingStatus::Single);
        assert!(high > low);
        assert_eq!(low, 0.0);
    }

    #[test]
    fn no_tax_states_list_contains_texas_and_florida() {
        assert!(NO_TAX_STATES.contains(&"TX"));
        assert!(NO_TAX_STATES.contains(&"FL"));
    }

    #[test]
    fn ltcg_tax_is_zero_within_zero_percent_bracket() {
        let brackets = default_ltcg_brackets(FilingStatus::Single);
        let tax = long_term_capital_gains_tax(0.0, 10_000.0, &brackets);
        assert_eq!(tax, 0.0);
    }
}
