//! Parameter mapper (C11): `profile_to_retirement_params` turns a caller's
//! [`Profile`] into the engine's internal [`RetirementParams`].

use crate::cma::Cma;
use crate::model::params::{AssetBuckets, OwnerMap, RetirementParams, SocialSecurityParams, TaxConfig};
use crate::model::profile::{
    AssetKind, FilingStatus, MaritalStatus, Owner, Profile, SocialSecurityInput, TaxBracket,
};
use crate::taxes;

/// 2024 federal single-filer brackets, base year for CPI indexing.
fn default_federal_brackets(filing_status: FilingStatus) -> Vec<TaxBracket> {
    match filing_status {
        FilingStatus::Single => vec![
            TaxBracket { threshold: 0.0, rate: 0.10 },
            TaxBracket { threshold: 11_600.0, rate: 0.12 },
            TaxBracket { threshold: 47_150.0, rate: 0.22 },
            TaxBracket { threshold: 100_525.0, rate: 0.24 },
            TaxBracket { threshold: 191_950.0, rate: 0.32 },
            TaxBracket { threshold: 243_725.0, rate: 0.35 },
            TaxBracket { threshold: 609_350.0, rate: 0.37 },
        ],
        FilingStatus::MarriedFilingJointly => vec![
            TaxBracket { threshold: 0.0, rate: 0.10 },
            TaxBracket { threshold: 23_200.0, rate: 0.12 },
            TaxBracket { threshold: 94_300.0, rate: 0.22 },
            TaxBracket { threshold: 201_050.0, rate: 0.24 },
            TaxBracket { threshold: 383_900.0, rate: 0.32 },
            TaxBracket { threshold: 487_450.0, rate: 0.35 },
            TaxBracket { threshold: 731_200.0, rate: 0.37 },
        ],
    }
}

/// Flat supplemental state rate for taxed states not in
/// [`taxes::NO_TAX_STATES`]. A single documented approximation rather
/// than the full 50-state marginal table (noted as a simplification in
/// DESIGN.md).
const DEFAULT_TAXED_STATE_RATE: f64 = 0.05;

fn state_income_tax_rate(state_of_residence: &str) -> f64 {
    if taxes::NO_TAX_STATES.contains(&state_of_residence) {
        0.0
    } else {
        DEFAULT_TAXED_STATE_RATE
    }
}

const HEALTHCARE_COST_INFLATION: f64 = 0.026;
const BASE_HEALTHCARE_COST_AT_65: f64 = 8_000.0;

/// Estimated annual out-of-pocket healthcare cost at `age`, anchored to
/// age 65 and compounded at medical-specific inflation in both
/// directions.
fn estimated_healthcare_cost(age: u32) -> f64 {
    let years_from_65 = i32::from(age) - 65;
    BASE_HEALTHCARE_COST_AT_65 * (1.0 + HEALTHCARE_COST_INFLATION).powi(years_from_65)
}

fn social_security_params(input: &SocialSecurityInput) -> SocialSecurityParams {
    SocialSecurityParams {
        monthly_benefit: input.monthly_benefit,
        claim_age: input.claim_age,
    }
}

/// Map a household's [`Profile`] into the engine's [`RetirementParams`].
///
/// Design notes:
/// - Checking-account balances are never counted toward retirement assets.
/// - `Savings` and `CashValueLifeInsurance` use their asset-specific fixed
///   returns for the *mapper's* aggregate `expected_return`/volatility
///   summary fields; the per-year return generator (C3) still draws from
///   the allocation-weighted CMA model for the bulk of the portfolio —
///   this field only informs the validator and API summary surface.
/// - Allocation is currently applied household-wide; per-owner allocation
///   overrides are accepted on input (`spouse_allocation`) and passed
///   through, but the mapper does not yet split `current_retirement_assets`
///   by owner-specific allocation weights before computing the headline
///   `expected_return`/`return_volatility` figures (documented Open
///   Question resolution in DESIGN.md).
#[must_use]
pub fn profile_to_retirement_params(profile: &Profile, cma: &Cma, current_year: i32) -> RetirementParams {
    let filing_status = match profile.marital_status {
        MaritalStatus::Single => FilingStatus::Single,
        MaritalStatus::Married => FilingStatus::MarriedFilingJointly,
    };

    let mut buckets = OwnerMap::<AssetBuckets>::default();
    for asset in &profile.assets {
        if matches!(asset.kind, AssetKind::Checking) {
            continue;
        }
        let bucket = buckets.get_mut(asset.owner);
        match asset.kind.tax_bucket() {
            Some(crate::model::profile::TaxBucket::TaxDeferred) => bucket.tax_deferred += asset.value,
            Some(crate::model::profile::TaxBucket::TaxFree) => bucket.tax_free += asset.value,
            Some(crate::model::profile::TaxBucket::CapitalGains) => bucket.capital_gains += asset.value,
            Some(crate::model::profile::TaxBucket::CashEquivalents) => {
                bucket.cash_equivalents += asset.value;
            }
            None => {}
        }
    }

    let current_age = profile.current_age(current_year);
    let spouse_current_age = profile
        .spouse_birth_date_year
        .map(|year| (current_year - year).max(0) as u32);

    let expected_return = match profile.expected_return_override {
        Some(v) if v > 0.0 => v,
        _ => cma.weighted_mean_return(&profile.allocation),
    };
    let return_volatility = profile
        .expected_volatility_override
        .unwrap_or_else(|| cma.weighted_volatility(&profile.allocation));

    let inflation_rate = profile
        .inflation_override
        .unwrap_or(cma.default_inflation_mean);

    let annual_healthcare_costs = if profile.expenses_include_healthcare {
        None
    } else {
        Some(estimated_healthcare_cost(current_age))
    };

    let federal_brackets = default_federal_brackets(filing_status);
    let tax_config = TaxConfig {
        federal_brackets,
        state_rate: state_income_tax_rate(&profile.retirement_state),
        capital_gains_brackets: taxes::default_ltcg_brackets(filing_status),
        standard_deduction: taxes::standard_deduction(filing_status, 14_600.0),
        fica_rate: taxes::FICA_RATE,
    };

    RetirementParams {
        current_age,
        retirement_age: profile.desired_retirement_age,
        life_expectancy: profile.life_expectancy,
        spouse_current_age,
        spouse_retirement_age: profile.spouse_desired_retirement_age,
        spouse_life_expectancy: profile.spouse_life_expectancy,
        gender: profile.gender,
        spouse_gender: profile.spouse_gender,
        health_status: profile.health_status,
        spouse_health_status: profile.spouse_health_status,

        current_retirement_assets: buckets.total(),
        annual_savings: monthly_and_annual_contributions(profile),
        annual_wage_income: profile.annual_income + profile.spouse_annual_income.unwrap_or(0.0),
        annual_retirement_expenses: profile.monthly_retirement_expenses * 12.0,
        annual_healthcare_costs,

        expected_return,
        return_volatility,
        inflation_rate,

        allocation: profile.allocation,
        spouse_allocation: profile.spouse_allocation,

        withdrawal_rate: profile.withdrawal_rate,
        use_guardrails: profile.use_guardrails,

        tax_config,
        filing_status,
        retirement_state: profile.retirement_state.clone(),

        asset_buckets: buckets,

        social_security: profile.social_security.as_ref().map(social_security_params),
        spouse_social_security: profile
            .spouse_social_security
            .as_ref()
            .map(social_security_params),
        annual_pension: profile.annual_pension,
        spouse_annual_pension: profile.spouse_annual_pension,
        annual_part_time_income: profile.annual_part_time_income,

        has_ltc_insurance: profile.has_ltc_insurance,
        legacy_goal: profile.legacy_goal,

        rmd_age: 73,
        roth_conversions_enabled: false,
        roth_conversion_bracket_ceiling: 0.0,

        random_seed: profile.random_seed.unwrap_or(0),
    }
}

fn monthly_and_annual_contributions(profile: &Profile) -> f64 {
    let monthly = profile.monthly_401k_employee
        + profile.monthly_401k_employer
        + profile.spouse_monthly_401k_employee
        + profile.spouse_monthly_401k_employer;
    monthly * 12.0
        + profile.annual_ira_contribution
        + profile.annual_roth_contribution
        + profile.spouse_annual_ira_contribution
        + profile.spouse_annual_roth_contribution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::profile::{Allocation, Asset, Gender, HealthStatus, MaritalStatus};

    fn minimal_profile() -> Profile {
        Profile {
            birth_date_year: 1965,
            spouse_birth_date_year: None,
            marital_status: MaritalStatus::Single,
            state_of_residence: "TX".to_string(),
            retirement_state: "TX".to_string(),
            life_expectancy: 88,
            spouse_life_expectancy: None,
            gender: Some(Gender::Female),
            spouse_gender: None,
            health_status: HealthStatus::Good,
            spouse_health_status: None,
            annual_income: 120_000.0,
            spouse_annual_income: None,
            desired_retirement_age: 65,
            spouse_desired_retirement_age: None,
            social_security: None,
            spouse_social_security: None,
            annual_pension: 0.0,
            spouse_annual_pension: 0.0,
            annual_part_time_income: 0.0,
            monthly_retirement_expenses: 5_000.0,
            discretionary_fraction: None,
            expenses_include_healthcare: false,
            assets: vec![
                Asset { kind: AssetKind::Plan401k, value: 400_000.0, owner: Owner::User },
                Asset { kind: AssetKind::Checking, value: 10_000.0, owner: Owner::User },
            ],
            monthly_401k_employee: 1_000.0,
            monthly_401k_employer: 500.0,
            annual_ira_contribution: 0.0,
            annual_roth_contribution: 0.0,
            spouse_monthly_401k_employee: 0.0,
            spouse_monthly_401k_employer: 0.0,
            spouse_annual_ira_contribution: 0.0,
            spouse_annual_roth_contribution: 0.0,
            allocation: Allocation {
                us_stocks: 0.6,
                intl_stocks: 0.1,
                bonds: 0.25,
                cash: 0.05,
                alternatives: 0.0,
            },
            spouse_allocation: None,
            has_ltc_insurance: false,
            legacy_goal: 0.0,
            inflation_override: None,
            expected_return_override: None,
            expected_volatility_override: None,
            withdrawal_rate: 0.04,
            use_guardrails: true,
            random_seed: Some(1),
        }
    }

    #[test]
    fn checking_balance_is_excluded_from_retirement_assets() {
        let profile = minimal_profile();
        let cma = Cma::baked_in_defaults();
        let params = profile_to_retirement_params(&profile, &cma, 2026);
        assert_eq!(params.current_retirement_assets, 400_000.0);
    }

    #[test]
    fn healthcare_cost_added_when_not_included_in_expenses() {
        let profile = minimal_profile();
        let cma = Cma::baked_in_defaults();
        let params = profile_to_retirement_params(&profile, &cma, 2026);
        assert!(params.annual_healthcare_costs.is_some());
    }

    #[test]
    fn healthcare_cost_omitted_when_already_included() {
        let mut profile = minimal_profile();
        profile.expenses_include_healthcare = true;
        let cma = Cma::baked_in_defaults();
        let params = profile_to_retirement_params(&profile, &cma, 2026);
        assert!(params.annual_healthcare_costs.is_none());
    }

    #[test]
    fn no_tax_state_maps_to_zero_state_rate() {
        let profile = minimal_profile();
        let cma = Cma::baked_in_defaults();
        let params = profile_to_retirement_params(&profile, &cma, 2026);
        assert_eq!(params.tax_config.state_rate, 0.0);
    }
}
