//! Sustainable withdrawal-rate search: binary search over `withdrawal_rate`
//! for the highest rate whose batch success probability still clears a
//! target threshold. Success probability is monotonically non-increasing in
//! the withdrawal rate, which is what makes bisection valid here the same
//! way it is for a single-parameter retirement-age or spend search.

use crate::cma::Cma;
use crate::error::Result;
use crate::model::params::RetirementParams;
use crate::model::results::MonteCarloResult;
use crate::returns::ReturnGeneratorConfig;
use crate::simulation::{self, SimulationConfig};

const MIN_WITHDRAWAL_RATE: f64 = 0.02;
const MAX_WITHDRAWAL_RATE: f64 = 0.08;
const MAX_ITERATIONS: u32 = 12;
const TOLERANCE: f64 = 0.0005;

#[derive(Debug, Clone, Copy)]
pub struct WithdrawalRateSearch {
    pub optimal_withdrawal_rate: f64,
    pub success_probability_at_optimal: f64,
    pub converged: bool,
}

/// Find the highest withdrawal rate whose simulated success probability is
/// still `>= target_success_probability`, and return the full result at
/// that rate. Runs one batch per bisection step plus the final report run.
pub fn find_sustainable_withdrawal_rate(
    params: &RetirementParams,
    cma: &Cma,
    return_config: &ReturnGeneratorConfig,
    sim_config: &SimulationConfig,
    target_success_probability: f64,
) -> Result<(WithdrawalRateSearch, MonteCarloResult)> {
    let mut low = MIN_WITHDRAWAL_RATE;
    let mut high = MAX_WITHDRAWAL_RATE;

    let mut best_rate = MIN_WITHDRAWAL_RATE;
    let mut best_success = 0.0;
    let mut converged = false;

    let evaluate = |rate: f64| -> Result<f64> {
        let mut trial_params = params.clone();
        trial_params.withdrawal_rate = rate;
        let result = simulation::run_simulation(&trial_params, cma, return_config, sim_config)?;
        Ok(result.success_probability)
    };

    let low_success = evaluate(low)?;
    if low_success >= target_success_probability {
        best_rate = low;
        best_success = low_success;
    }

    for _ in 0..MAX_ITERATIONS {
        if (high - low) <= TOLERANCE {
            converged = true;
            break;
        }
        let mid = f64::midpoint(low, high);
        let mid_success = evaluate(mid)?;

        if mid_success >= target_success_probability {
            if mid >= best_rate {
                best_rate = mid;
                best_success = mid_success;
            }
            low = mid;
        } else {
            high = mid;
        }
    }

    let mut final_params = params.clone();
    final_params.withdrawal_rate = best_rate;
    let final_result = simulation::run_simulation(&final_params, cma, return_config, sim_config)?;

    Ok((
        WithdrawalRateSearch {
            optimal_withdrawal_rate: best_rate,
            success_probability_at_optimal: best_success.max(final_result.success_probability),
            converged,
        },
        final_result,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::params::{AssetBuckets, OwnerMap, SocialSecurityParams, TaxConfig};
    use crate::model::profile::{Allocation, FilingStatus, HealthStatus, TaxBracket};
    use crate::taxes;

    fn base_params() -> RetirementParams {
        RetirementParams {
            current_age: 60,
            retirement_age: 65,
            life_expectancy: 88,
            spouse_current_age: None,
            spouse_retirement_age: None,
            spouse_life_expectancy: None,
            gender: None,
            spouse_gender: None,
            health_status: HealthStatus::Good,
            spouse_health_status: None,
            current_retirement_assets: 800_000.0,
            annual_savings: 20_000.0,
            annual_wage_income: 100_000.0,
            annual_retirement_expenses: 60_000.0,
            annual_healthcare_costs: Some(10_000.0),
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
                federal_brackets: vec![
                    TaxBracket { threshold: 0.0, rate: 0.10 },
                    TaxBracket { threshold: 40_000.0, rate: 0.22 },
                ],
                state_rate: 0.0,
                capital_gains_brackets: taxes::default_ltcg_brackets(FilingStatus::Single),
                standard_deduction: 14_600.0,
                fica_rate: taxes::FICA_RATE,
            },
            filing_status: FilingStatus::Single,
            retirement_state: "TX".to_string(),
            asset_buckets: OwnerMap {
                user: AssetBuckets {
                    tax_deferred: 500_000.0,
                    tax_free: 100_000.0,
                    capital_gains: 150_000.0,
                    cash_equivalents: 50_000.0,
                },
                spouse: AssetBuckets::default(),
                joint: AssetBuckets::default(),
            },
            social_security: Some(SocialSecurityParams {
                monthly_benefit: 2_200.0,
                claim_age: 67,
            }),
            spouse_social_security: None,
            annual_pension: 0.0,
            spouse_annual_pension: 0.0,
            annual_part_time_income: 0.0,
            has_ltc_insurance: false,
            legacy_goal: 0.0,
            rmd_age: 73,
            roth_conversions_enabled: false,
            roth_conversion_bracket_ceiling: 0.0,
            random_seed: 7,
        }
    }

    #[test]
    fn search_returns_rate_within_bounds() {
        let params = base_params();
        let cma = Cma::baked_in_defaults();
        let sim_config = SimulationConfig {
            iterations: 80,
            worker_count: 1,
            timeout: None,
        };
        let (search, _) = find_sustainable_withdrawal_rate(
            &params,
            &cma,
            &ReturnGeneratorConfig::default(),
            &sim_config,
            0.85,
        )
        .unwrap();
        assert!(search.optimal_withdrawal_rate >= MIN_WITHDRAWAL_RATE);
        assert!(search.optimal_withdrawal_rate <= MAX_WITHDRAWAL_RATE);
    }
}
