//! Year-by-year cashflow projection for the `/v2/rpc/cashflow-map` contract
//! (C14, §6). Unlike the Monte Carlo batch, this walks a single
//! deterministic path at `RetirementParams::expected_return` with no
//! regime switching, no stochastic longevity, and no LTC draws — the
//! contract asks for bracket thresholds, marginal rate, and tax-planning
//! flags for *one* canonical year-by-year projection, not a distribution
//! over trials. `YearlyCashflow` (the Monte Carlo per-trial record) only
//! carries the aggregated guaranteed-income and tax totals a batch needs;
//! this module recomputes the same withdrawal/tax order (§4.8, §4.7) with
//! the income and tax breakdown the cashflow-map contract asks for.

use serde::{Deserialize, Serialize};

use crate::model::params::RetirementParams;
use crate::model::profile::TaxBracket;
use crate::model::rmd::RmdTable;
use crate::model::state::MagiHistory;
use crate::taxes;
use crate::withdrawal;

/// Statutory QCD eligibility age is 70½; collapsed to the nearest whole
/// year the same way the SS optimizer collapses FRA's two-month steps
/// (see `optimization::social_security::full_retirement_age`).
const QCD_ELIGIBLE_AGE: u32 = 70;

/// A marginal bracket is "comfortable" Roth-conversion headroom when
/// taxable ordinary income sits at or below this rate's bracket.
const ROTH_CONVERSION_RATE_CEILING: f64 = 0.22;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashflowInflows {
    pub gross_income: f64,
    pub portfolio_withdrawals: f64,
    pub social_security: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashflowOutflows {
    pub fixed: f64,
    pub discretionary: f64,
    pub insurance: f64,
    pub goal_outflows: f64,
    pub taxes_total: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashflowFlags {
    pub roth_conversion_suggested: bool,
    pub qcd_suggested: bool,
    pub daf_bunching_suggested: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashflowMapEntry {
    pub year: u32,
    pub inflows: CashflowInflows,
    pub outflows: CashflowOutflows,
    pub effective_tax_rate: f64,
    pub bracket_thresholds: Vec<f64>,
    pub taxable_income: f64,
    pub marginal_rate: f64,
    pub flags: CashflowFlags,
}

fn marginal_rate_for(income: f64, brackets: &[TaxBracket]) -> f64 {
    brackets
        .iter()
        .rev()
        .find(|b| income >= b.threshold)
        .map(|b| b.rate)
        .unwrap_or(0.0)
}

/// Build the full deterministic cashflow map from `current_age` through
/// the household's horizon (the later of the user's and spouse's life
/// expectancy).
#[must_use]
pub fn build_cashflow_map(params: &RetirementParams) -> Vec<CashflowMapEntry> {
    let horizon_age = params
        .spouse_life_expectancy
        .map_or(params.life_expectancy, |s| s.max(params.life_expectancy));
    let years = horizon_age.saturating_sub(params.current_age);

    let mut buckets = params.asset_buckets;
    let rmd_table = RmdTable::irs_uniform_lifetime_2024();
    let ltcg_brackets = taxes::default_ltcg_brackets(params.filing_status);
    let mut magi_history = MagiHistory::default();

    let mut inflation_index = 1.0_f64;
    let mut cola_index = 1.0_f64;
    let mut entries = Vec::with_capacity(years as usize + 1);

    for t in 0..=years {
        let age = params.current_age + t;
        let spouse_age = params.spouse_current_age.map(|a| a + t);

        let entry = if age < params.retirement_age {
            buckets.user.tax_deferred += params.annual_savings;
            for b in [&mut buckets.user, &mut buckets.spouse, &mut buckets.joint] {
                b.tax_deferred *= 1.0 + params.expected_return;
                b.tax_free *= 1.0 + params.expected_return;
                b.capital_gains *= 1.0 + params.expected_return;
            }
            CashflowMapEntry {
                year: t,
                inflows: CashflowInflows {
                    gross_income: params.annual_savings,
                    portfolio_withdrawals: 0.0,
                    social_security: 0.0,
                },
                outflows: CashflowOutflows::default(),
                effective_tax_rate: 0.0,
                bracket_thresholds: params.tax_config.federal_brackets.iter().map(|b| b.threshold).collect(),
                taxable_income: 0.0,
                marginal_rate: 0.0,
                flags: CashflowFlags::default(),
            }
        } else {
            let mut ss_benefit = 0.0;
            if let Some(ss) = params.social_security {
                if age >= ss.claim_age {
                    ss_benefit += ss.monthly_benefit * 12.0 * cola_index;
                }
            }
            if let Some(ss) = params.spouse_social_security {
                if spouse_age.is_some_and(|a| a >= ss.claim_age) {
                    ss_benefit += ss.monthly_benefit * 12.0 * cola_index;
                }
            }
            let guaranteed_income = ss_benefit
                + params.annual_pension
                + params.spouse_annual_pension
                + params.annual_part_time_income;

            let healthcare_cost = params.annual_healthcare_costs.unwrap_or(0.0) * inflation_index;
            let base_expenses = params.annual_retirement_expenses * inflation_index;
            let net_need = (base_expenses + healthcare_cost - guaranteed_income).max(0.0);

            let withdrawal_result = withdrawal::execute_withdrawal(
                &mut buckets,
                net_need,
                age,
                spouse_age,
                params.rmd_age,
                &rmd_table,
            );

            let taxable_ss = taxes::taxable_social_security(
                ss_benefit,
                withdrawal_result.tax_deferred_withdrawn + params.annual_pension + params.spouse_annual_pension,
                params.filing_status,
            );
            let ordinary_income = withdrawal_result.tax_deferred_withdrawn
                + taxable_ss
                + params.annual_pension
                + params.spouse_annual_pension
                + params.annual_part_time_income;

            let deduction = taxes::standard_deduction(params.filing_status, 14_600.0) * inflation_index;
            let taxable_ordinary = (ordinary_income - deduction).max(0.0);

            let federal_brackets =
                taxes::index_brackets(&params.tax_config.federal_brackets, params.inflation_rate, t);
            let federal_tax_ordinary = taxes::calculate_bracket_tax(taxable_ordinary, &federal_brackets);

            let long_term_gain = withdrawal_result.taxable_withdrawn * 0.5;
            let federal_tax_ltcg =
                taxes::long_term_capital_gains_tax(taxable_ordinary, long_term_gain, &ltcg_brackets);
            let federal_tax = federal_tax_ordinary + federal_tax_ltcg;
            let state_tax = taxes::state_tax(taxable_ordinary, params.tax_config.state_rate);

            let magi = ordinary_income + long_term_gain;
            magi_history.push(magi);
            let medicare_premium = if age >= taxes::MEDICARE_START_AGE {
                let lookback_magi = magi_history.two_years_ago().unwrap_or(magi);
                taxes::irmaa_surcharge(age, lookback_magi, params.filing_status)
            } else {
                0.0
            };

            for b in [&mut buckets.user, &mut buckets.spouse, &mut buckets.joint] {
                b.tax_deferred *= 1.0 + params.expected_return;
                b.tax_free *= 1.0 + params.expected_return;
                b.capital_gains *= 1.0 + params.expected_return;
            }

            let taxes_total = federal_tax + state_tax + medicare_premium;
            let gross_income = withdrawal_result.total_withdrawn() + guaranteed_income;
            let marginal_rate = marginal_rate_for(taxable_ordinary, &federal_brackets);

            let roth_conversion_suggested = !params.roth_conversions_enabled
                && marginal_rate <= ROTH_CONVERSION_RATE_CEILING
                && buckets.user.tax_deferred + buckets.spouse.tax_deferred > 0.0;
            let qcd_suggested = age >= QCD_ELIGIBLE_AGE && withdrawal_result.rmd_forced > 0.0;
            let daf_bunching_suggested = marginal_rate >= 0.24 && base_expenses > 0.0;

            CashflowMapEntry {
                year: t,
                inflows: CashflowInflows {
                    gross_income,
                    portfolio_withdrawals: withdrawal_result.total_withdrawn(),
                    social_security: ss_benefit,
                },
                outflows: CashflowOutflows {
                    fixed: base_expenses,
                    discretionary: 0.0,
                    insurance: healthcare_cost,
                    goal_outflows: 0.0,
                    taxes_total,
                },
                effective_tax_rate: if gross_income > 0.0 { taxes_total / gross_income } else { 0.0 },
                bracket_thresholds: federal_brackets.iter().map(|b| b.threshold).collect(),
                taxable_income: taxable_ordinary,
                marginal_rate,
                flags: CashflowFlags {
                    roth_conversion_suggested,
                    qcd_suggested,
                    daf_bunching_suggested,
                },
            }
        };

        entries.push(entry);
        inflation_index *= 1.0 + params.inflation_rate;
        cola_index *= 1.0 + params.inflation_rate;
    }

    entries
}
