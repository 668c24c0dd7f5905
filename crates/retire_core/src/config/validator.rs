//! Parameter validator (C11): `MonteCarloValidator::validate_parameters`
//! enforces the data-model invariants in §3, returning hard errors and
//! soft warnings separately.

use crate::error::FieldError;
use crate::model::params::RetirementParams;
use crate::model::profile::FilingStatus;

#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub errors: Vec<FieldError>,
    pub warnings: Vec<String>,
}

pub struct MonteCarloValidator;

impl MonteCarloValidator {
    #[must_use]
    pub fn validate_parameters(params: &RetirementParams) -> ValidationOutcome {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if !(18..=120).contains(&params.current_age) {
            errors.push(FieldError::new("currentAge", "must be between 18 and 120"));
        }
        if params.current_age > params.retirement_age {
            errors.push(FieldError::new(
                "retirementAge",
                "must be greater than or equal to currentAge",
            ));
        }
        if params.retirement_age > params.life_expectancy {
            errors.push(FieldError::new(
                "lifeExpectancy",
                "must be greater than or equal to retirementAge",
            ));
        }
        if params.life_expectancy > 120 {
            errors.push(FieldError::new("lifeExpectancy", "must be at most 120"));
        }

        let allocation_sum = params.allocation.sum();
        if (allocation_sum - 1.0).abs() > 1e-6 {
            errors.push(FieldError::new(
                "allocation",
                "fractions must sum to 1.0 within tolerance 1e-6",
            ));
        }
        for (field, value) in [
            ("allocation.usStocks", params.allocation.us_stocks),
            ("allocation.intlStocks", params.allocation.intl_stocks),
            ("allocation.bonds", params.allocation.bonds),
            ("allocation.cash", params.allocation.cash),
            ("allocation.alternatives", params.allocation.alternatives),
        ] {
            if !(0.0..=1.0).contains(&value) {
                errors.push(FieldError::new(field, "must be in [0, 1]"));
            }
        }

        if !(0.0..=0.25).contains(&params.withdrawal_rate) || params.withdrawal_rate <= 0.0 {
            errors.push(FieldError::new("withdrawalRate", "must be in (0, 0.25]"));
        }
        if !(-0.05..=0.15).contains(&params.inflation_rate) {
            errors.push(FieldError::new("inflationRate", "must be in [-0.05, 0.15]"));
        }
        if !(-0.10..=0.30).contains(&params.expected_return) {
            warnings.push("expectedReturn outside [-0.10, 0.30]".to_string());
        }

        if params.annual_retirement_expenses < 0.0 {
            errors.push(FieldError::new("annualRetirementExpenses", "must be >= 0"));
        }
        if params.current_retirement_assets < 0.0 {
            errors.push(FieldError::new("currentRetirementAssets", "must be >= 0"));
        }
        if params.tax_config.state_rate > 0.5 || params.tax_config.state_rate < 0.0 {
            errors.push(FieldError::new("taxConfig.stateRate", "must be in [0, 0.5]"));
        }

        if params.filing_status == FilingStatus::MarriedFilingJointly
            && params.spouse_current_age.is_none()
        {
            errors.push(FieldError::new(
                "spouseCurrentAge",
                "required when filing status is married-filing-jointly",
            ));
        }

        if params.expected_return > 0.12 {
            warnings.push("expectedReturn exceeds 12%, an unusually optimistic assumption".to_string());
        }
        if params.withdrawal_rate > 0.06 {
            warnings.push("withdrawalRate exceeds 6%, elevated sequence-of-returns risk".to_string());
        }
        if params.tax_config.state_rate + top_federal_rate(params) > 0.40 {
            warnings.push("combined marginal tax rate exceeds 40%".to_string());
        }
        if params.current_age < params.retirement_age
            && params.allocation.equity_weight() < 0.3
            && (params.retirement_age - params.current_age) > 10
        {
            warnings.push(
                "low equity allocation more than 10 years from retirement may underperform inflation"
                    .to_string(),
            );
        }

        ValidationOutcome {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Names of fields `params` is missing values for. Since
    /// `RetirementParams` has no optional numeric fields beyond the
    /// spouse-specific ones, this mainly surfaces spouse-data
    /// inconsistency with filing status.
    #[must_use]
    pub fn check_required_parameters(params: &RetirementParams) -> Vec<String> {
        let mut missing = Vec::new();
        if params.filing_status == FilingStatus::MarriedFilingJointly {
            if params.spouse_current_age.is_none() {
                missing.push("spouseCurrentAge".to_string());
            }
            if params.spouse_life_expectancy.is_none() {
                missing.push("spouseLifeExpectancy".to_string());
            }
        }
        missing
    }
}

fn top_federal_rate(params: &RetirementParams) -> f64 {
    params
        .tax_config
        .federal_brackets
        .last()
        .map(|b| b.rate)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::params::{AssetBuckets, OwnerMap, TaxConfig};
    use crate::model::profile::{Allocation, TaxBracket};
    use crate::taxes;

    fn valid_params() -> RetirementParams {
        RetirementParams {
            current_age: 60,
            retirement_age: 65,
            life_expectancy: 88,
            spouse_current_age: None,
            spouse_retirement_age: None,
            spouse_life_expectancy: None,
            gender: None,
            spouse_gender: None,
            health_status: crate::model::profile::HealthStatus::Good,
            spouse_health_status: None,
            current_retirement_assets: 500_000.0,
            annual_savings: 20_000.0,
            annual_wage_income: 100_000.0,
            annual_retirement_expenses: 60_000.0,
            annual_healthcare_costs: None,
            expected_return: 0.06,
            return_volatility: 0.12,
            inflation_rate: 0.025,
            allocation: Allocation {
                us_stocks: 0.5,
                intl_stocks: 0.1,
                bonds: 0.35,
                cash: 0.05,
                alternatives: 0.0,
            },
            spouse_allocation: None,
            withdrawal_rate: 0.04,
            use_guardrails: true,
            tax_config: TaxConfig {
                federal_brackets: vec![TaxBracket { threshold: 0.0, rate: 0.22 }],
                state_rate: 0.0,
                capital_gains_brackets: taxes::default_ltcg_brackets(FilingStatus::Single),
                standard_deduction: 14_600.0,
                fica_rate: taxes::FICA_RATE,
            },
            filing_status: FilingStatus::Single,
            retirement_state: "TX".to_string(),
            asset_buckets: OwnerMap::<AssetBuckets>::default(),
            social_security: None,
            spouse_social_security: None,
            annual_pension: 0.0,
            spouse_annual_pension: 0.0,
            annual_part_time_income: 0.0,
            has_ltc_insurance: false,
            legacy_goal: 0.0,
            rmd_age: 73,
            roth_conversions_enabled: false,
            roth_conversion_bracket_ceiling: 0.0,
            random_seed: 1,
        }
    }

    #[test]
    fn valid_params_pass() {
        let outcome = MonteCarloValidator::validate_parameters(&valid_params());
        assert!(outcome.is_valid);
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn allocation_not_summing_to_one_is_an_error() {
        let mut params = valid_params();
        params.allocation.cash += 0.1;
        let outcome = MonteCarloValidator::validate_parameters(&params);
        assert!(!outcome.is_valid);
    }

    #[test]
    fn retirement_age_before_current_age_is_an_error() {
        let mut params = valid_params();
        params.retirement_age = params.current_age - 1;
        let outcome = MonteCarloValidator::validate_parameters(&params);
        assert!(!outcome.is_valid);
    }

    #[test]
    fn high_withdrawal_rate_is_a_warning_not_an_error() {
        let mut params = valid_params();
        params.withdrawal_rate = 0.08;
        let outcome = MonteCarloValidator::validate_parameters(&params);
        assert!(outcome.is_valid);
        assert!(!outcome.warnings.is_empty());
    }

    #[test]
    fn married_filing_jointly_without_spouse_age_is_an_error() {
        let mut params = valid_params();
        params.filing_status = FilingStatus::MarriedFilingJointly;
        let outcome = MonteCarloValidator::validate_parameters(&params);
        assert!(!outcome.is_valid);
    }

    #[test]
    fn missing_spouse_fields_reported_by_name() {
        let mut params = valid_params();
        params.filing_status = FilingStatus::MarriedFilingJointly;
        let missing = MonteCarloValidator::check_required_parameters(&params);
        assert!(missing.contains(&"spouseCurrentAge".to_string()));
    }
}
