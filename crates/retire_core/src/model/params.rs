//! `RetirementParams`: the immutable, validated input to a simulation batch
//! derived from a `Profile` by the parameter mapper (C11).

use serde::{Deserialize, Serialize};

use crate::model::profile::{Allocation, FilingStatus, Gender, HealthStatus, Owner, TaxBracket};

/// Per-owner tax-bucket balances. Checking balances never appear here —
/// they are excluded from retirement assets at mapping time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetBuckets {
    pub tax_deferred: f64,
    pub tax_free: f64,
    pub capital_gains: f64,
    pub cash_equivalents: f64,
}

impl AssetBuckets {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.tax_deferred + self.tax_free + self.capital_gains + self.cash_equivalents
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct OwnerMap<T> {
    pub user: T,
    pub spouse: T,
    pub joint: T,
}

impl<T> OwnerMap<T> {
    pub fn get(&self, owner: Owner) -> &T {
        match owner {
            Owner::User => &self.user,
            Owner::Spouse => &self.spouse,
            Owner::Joint => &self.joint,
        }
    }

    pub fn get_mut(&mut self, owner: Owner) -> &mut T {
        match owner {
            Owner::User => &mut self.user,
            Owner::Spouse => &mut self.spouse,
            Owner::Joint => &mut self.joint,
        }
    }
}

impl OwnerMap<AssetBuckets> {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.user.total() + self.spouse.total() + self.joint.total()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxConfig {
    pub federal_brackets: Vec<TaxBracket>,
    pub state_rate: f64,
    pub capital_gains_brackets: Vec<TaxBracket>,
    pub standard_deduction: f64,
    pub fica_rate: f64,
}

/// Social Security input carried through to the cashflow engine: a fixed
/// monthly nominal benefit at a given claim age, COLA-adjusted per year in
/// the scenario kernel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialSecurityParams {
    pub monthly_benefit: f64,
    pub claim_age: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetirementParams {
    pub current_age: u32,
    pub retirement_age: u32,
    pub life_expectancy: u32,
    pub spouse_current_age: Option<u32>,
    pub spouse_retirement_age: Option<u32>,
    pub spouse_life_expectancy: Option<u32>,
    pub gender: Option<Gender>,
    pub spouse_gender: Option<Gender>,
    pub health_status: HealthStatus,
    pub spouse_health_status: Option<HealthStatus>,

    pub current_retirement_assets: f64,
    pub annual_savings: f64,
    /// Combined gross household wages during the accumulation phase,
    /// taxed and counted toward MAGI for the IRMAA lookback (§4.7) each
    /// pre-retirement year.
    pub annual_wage_income: f64,
    pub annual_retirement_expenses: f64,
    pub annual_healthcare_costs: Option<f64>,

    pub expected_return: f64,
    pub return_volatility: f64,
    pub inflation_rate: f64,

    pub allocation: Allocation,
    pub spouse_allocation: Option<Allocation>,

    pub withdrawal_rate: f64,
    pub use_guardrails: bool,

    pub tax_config: TaxConfig,
    pub filing_status: FilingStatus,
    pub retirement_state: String,

    pub asset_buckets: OwnerMap<AssetBuckets>,

    pub social_security: Option<SocialSecurityParams>,
    pub spouse_social_security: Option<SocialSecurityParams>,
    pub annual_pension: f64,
    pub spouse_annual_pension: f64,
    pub annual_part_time_income: f64,

    pub has_ltc_insurance: bool,
    pub legacy_goal: f64,

    pub rmd_age: u32,
    pub roth_conversions_enabled: bool,
    pub roth_conversion_bracket_ceiling: f64,

    pub random_seed: u32,
}
