//! The input `Profile`: everything a caller submits about a household.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaritalStatus {
    Single,
    Married,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilingStatus {
    Single,
    MarriedFilingJointly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl HealthStatus {
    /// Years added or subtracted from base life expectancy (C5).
    #[must_use]
    pub fn longevity_adjustment_years(self) -> f64 {
        match self {
            HealthStatus::Excellent => 3.0,
            HealthStatus::Good => 0.0,
            HealthStatus::Fair => -2.5,
            HealthStatus::Poor => -6.0,
        }
    }

    /// LTC event probability multiplier relative to the baseline 50-70%
    /// range used by the LTC model (C6).
    #[must_use]
    pub fn ltc_probability(self) -> f64 {
        match self {
            HealthStatus::Excellent => 0.50,
            HealthStatus::Good => 0.58,
            HealthStatus::Fair => 0.65,
            HealthStatus::Poor => 0.70,
        }
    }
}

/// Which household member (or joint ownership) an asset or allocation
/// belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    User,
    Spouse,
    Joint,
}

/// Closed enum of recognized asset categories (see Design Note in §9:
/// unknown kinds route to `Other` with a validator warning, never silently
/// dropped).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "label", rename_all = "kebab-case")]
pub enum AssetKind {
    #[serde(rename = "401k")]
    Plan401k,
    #[serde(rename = "403b")]
    Plan403b,
    #[serde(rename = "457b")]
    Plan457b,
    TraditionalIra,
    RothIra,
    SepIra,
    TaxableBrokerage,
    Savings,
    /// Never counted toward retirement assets (spec invariant).
    Checking,
    CashValueLifeInsurance,
    RealEstate,
    Other(String),
}

impl AssetKind {
    /// Which tax bucket this asset category contributes to, if any.
    /// `Checking` has none — it is excluded from retirement assets
    /// entirely.
    #[must_use]
    pub fn tax_bucket(&self) -> Option<TaxBucket> {
        match self {
            AssetKind::Plan401k
            | AssetKind::Plan403b
            | AssetKind::Plan457b
            | AssetKind::TraditionalIra
            | AssetKind::SepIra => Some(TaxBucket::TaxDeferred),
            AssetKind::RothIra => Some(TaxBucket::TaxFree),
            AssetKind::TaxableBrokerage | AssetKind::RealEstate | AssetKind::Other(_) => {
                Some(TaxBucket::CapitalGains)
            }
            AssetKind::Savings | AssetKind::CashValueLifeInsurance => {
                Some(TaxBucket::CashEquivalents)
            }
            AssetKind::Checking => None,
        }
    }

    /// Asset-specific expected nominal return override used by the
    /// parameter mapper (C11) for assets whose return doesn't track the
    /// household's stock/bond allocation.
    #[must_use]
    pub fn fixed_expected_return(&self) -> Option<f64> {
        match self {
            AssetKind::Savings => Some(0.005),
            AssetKind::CashValueLifeInsurance => Some(0.03),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxBucket {
    TaxDeferred,
    TaxFree,
    CapitalGains,
    CashEquivalents,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub kind: AssetKind,
    pub value: f64,
    pub owner: Owner,
}

/// A single federal (or state) marginal tax bracket: tax `rate` applies to
/// income above `threshold`, up to the next bracket's threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub threshold: f64,
    pub rate: f64,
}

/// Per-household allocation across five asset classes, expressed as
/// fractions summing to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub us_stocks: f64,
    pub intl_stocks: f64,
    pub bonds: f64,
    pub cash: f64,
    pub alternatives: f64,
}

impl Allocation {
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.us_stocks + self.intl_stocks + self.bonds + self.cash + self.alternatives
    }

    #[must_use]
    pub fn equity_weight(&self) -> f64 {
        self.us_stocks + self.intl_stocks
    }
}

/// Sentinel values for `Profile::expected_return_override`, matching the
/// two special routing cases in C3 step 1.
pub const EXPECTED_RETURN_GLIDE_PATH: f64 = -1.0;
pub const EXPECTED_RETURN_CURRENT_ALLOCATION: f64 = -2.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialSecurityInput {
    pub monthly_benefit: f64,
    pub claim_age: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    // Demographics
    pub birth_date_year: i32,
    pub spouse_birth_date_year: Option<i32>,
    pub marital_status: MaritalStatus,
    pub state_of_residence: String,
    pub retirement_state: String,
    pub life_expectancy: u32,
    pub spouse_life_expectancy: Option<u32>,
    pub gender: Option<Gender>,
    pub spouse_gender: Option<Gender>,
    pub health_status: HealthStatus,
    pub spouse_health_status: Option<HealthStatus>,

    // Employment
    pub annual_income: f64,
    pub spouse_annual_income: Option<f64>,
    pub desired_retirement_age: u32,
    pub spouse_desired_retirement_age: Option<u32>,

    // Benefits
    pub social_security: Option<SocialSecurityInput>,
    pub spouse_social_security: Option<SocialSecurityInput>,
    pub annual_pension: f64,
    pub spouse_annual_pension: f64,
    pub annual_part_time_income: f64,

    // Expenses
    pub monthly_retirement_expenses: f64,
    pub discretionary_fraction: Option<f64>,
    pub expenses_include_healthcare: bool,

    // Assets
    pub assets: Vec<Asset>,

    // Contributions
    pub monthly_401k_employee: f64,
    pub monthly_401k_employer: f64,
    pub annual_ira_contribution: f64,
    pub annual_roth_contribution: f64,
    pub spouse_monthly_401k_employee: f64,
    pub spouse_monthly_401k_employer: f64,
    pub spouse_annual_ira_contribution: f64,
    pub spouse_annual_roth_contribution: f64,

    // Allocation
    pub allocation: Allocation,
    pub spouse_allocation: Option<Allocation>,

    // Insurance / legacy / overrides
    pub has_ltc_insurance: bool,
    pub legacy_goal: f64,
    pub inflation_override: Option<f64>,
    pub expected_return_override: Option<f64>,
    pub expected_volatility_override: Option<f64>,

    pub withdrawal_rate: f64,
    pub use_guardrails: bool,

    pub random_seed: Option<u32>,
}

impl Profile {
    #[must_use]
    pub fn current_age(&self, current_year: i32) -> u32 {
        (current_year - self.birth_date_year).max(0) as u32
    }

    #[must_use]
    pub fn is_married(&self) -> bool {
        self.marital_status == MaritalStatus::Married
    }
}
