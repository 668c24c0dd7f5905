//! Simulation driver (C10): runs N trials sequentially or (behind the
//! `parallel` feature) across a rayon thread pool, with per-trial RNG
//! derivation that makes the aggregate result independent of worker count.
//!
//! Each trial is actually run twice against the same market/mortality path:
//! once with LTC costs in effect, once with them suppressed (see
//! `scenario::run_trial_without_ltc_cost`), using [`crate::rng::RecordingRng`]
//! and [`crate::rng::ReplayRng`] to keep the two runs on an identical RNG
//! stream. The second run feeds [`crate::aggregator`]'s LTC with/without
//! comparison.

use crate::aggregator;
use crate::cma::Cma;
use crate::error::{EngineError, Result};
use crate::model::params::RetirementParams;
use crate::model::results::MonteCarloResult;
use crate::returns::ReturnGeneratorConfig;
use crate::rng::{derive_rng, root_rng, RecordingRng, ReplayRng, XorShift32};
use crate::scenario::{self, ScenarioOutcome};

/// Fraction of trials that may produce a non-finite ending balance before
/// the batch is treated as a numerical failure (§ Failure semantics).
const MAX_NON_FINITE_RATE: f64 = 0.001;

#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub iterations: usize,
    pub worker_count: usize,
    pub timeout: Option<std::time::Duration>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            iterations: 1_000,
            worker_count: default_worker_count(),
            timeout: None,
        }
    }
}

pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
        .min(8)
}

pub struct SimulationBatch {
    pub outcomes: Vec<ScenarioOutcome>,
    /// Same trials, replayed on an identical RNG stream with LTC cost
    /// zeroed out, aligned index-for-index with `outcomes`.
    pub outcomes_without_ltc: Vec<ScenarioOutcome>,
}

/// Run `config.iterations` trials against `params`, sequentially.
pub fn run_sequential(
    params: &RetirementParams,
    cma: &Cma,
    return_config: &ReturnGeneratorConfig,
    config: &SimulationConfig,
) -> Result<SimulationBatch> {
    let start = std::time::Instant::now();
    let mut outcomes = Vec::with_capacity(config.iterations);
    let mut outcomes_without_ltc = Vec::with_capacity(config.iterations);
    for i in 0..config.iterations {
        if let Some(timeout) = config.timeout {
            if start.elapsed() > timeout {
                return Err(EngineError::Timeout);
            }
        }
        let (with_ltc, without_ltc) = run_one_trial_pair(params, cma, return_config, i);
        outcomes.push(with_ltc);
        outcomes_without_ltc.push(without_ltc);
    }
    finalize_batch(outcomes, outcomes_without_ltc)
}

/// Run trials across a rayon thread pool sized to `config.worker_count`.
/// Per the determinism requirement in §4.10, each trial's RNG is derived
/// from `(params.random_seed, "trial-i")` regardless of which worker runs
/// it, so partitioning and worker count never affect the result.
#[cfg(feature = "parallel")]
pub fn run_parallel(
    params: &RetirementParams,
    cma: &Cma,
    return_config: &ReturnGeneratorConfig,
    config: &SimulationConfig,
) -> Result<SimulationBatch> {
    use rayon::prelude::*;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_count.max(1))
        .build()
        .map_err(|e| EngineError::Worker(e.to_string()))?;

    let pairs: Vec<(ScenarioOutcome, ScenarioOutcome)> = pool.install(|| {
        (0..config.iterations)
            .into_par_iter()
            .map(|i| run_one_trial_pair(params, cma, return_config, i))
            .collect()
    });

    let (outcomes, outcomes_without_ltc) = pairs.into_iter().unzip();
    finalize_batch(outcomes, outcomes_without_ltc)
}

fn derive_trial_rng(params: &RetirementParams, trial_index: usize) -> XorShift32 {
    let mut parent = root_rng(params.random_seed, "simulation-root");
    let label = format!("trial-{trial_index}");
    derive_rng(&mut parent, &label, trial_index as u32)
}

/// Run a single trial unmodified (LTC costs in effect). Cheaper than
/// [`run_one_trial_pair`] when the without-LTC counterfactual isn't needed,
/// e.g. the CLI's quick single-seed preview.
pub fn run_one_trial(
    params: &RetirementParams,
    cma: &Cma,
    return_config: &ReturnGeneratorConfig,
    trial_index: usize,
) -> ScenarioOutcome {
    let mut trial_rng = derive_trial_rng(params, trial_index);
    scenario::run_trial(&mut trial_rng, params, cma, return_config)
}

/// Run one trial twice on the same underlying RNG stream: once normally,
/// once with LTC cost suppressed. The first pass is recorded via
/// [`RecordingRng`]; the second replays its tape through
/// [`scenario::run_trial_without_ltc_cost`].
fn run_one_trial_pair(
    params: &RetirementParams,
    cma: &Cma,
    return_config: &ReturnGeneratorConfig,
    trial_index: usize,
) -> (ScenarioOutcome, ScenarioOutcome) {
    let trial_rng = derive_trial_rng(params, trial_index);
    let mut recorder = RecordingRng::new(trial_rng);
    let with_ltc = scenario::run_trial(&mut recorder, params, cma, return_config);
    let tapes = recorder.into_tapes();

    let mut replay = ReplayRng::new(tapes);
    let without_ltc = scenario::run_trial_without_ltc_cost(&mut replay, params, cma, return_config);

    (with_ltc, without_ltc)
}

fn finalize_batch(
    outcomes: Vec<ScenarioOutcome>,
    outcomes_without_ltc: Vec<ScenarioOutcome>,
) -> Result<SimulationBatch> {
    let total = outcomes.len();
    let non_finite = outcomes
        .iter()
        .filter(|o| !o.ending_balance.is_finite())
        .count();

    if total > 0 && (non_finite as f64 / total as f64) > MAX_NON_FINITE_RATE {
        return Err(EngineError::NumericalFailureRateExceeded {
            non_finite,
            total,
            rate: non_finite as f64 / total as f64,
        });
    }

    Ok(SimulationBatch {
        outcomes,
        outcomes_without_ltc,
    })
}

/// Dispatch to parallel or sequential execution depending on the
/// `parallel` feature and `worker_count`.
pub fn run_batch(
    params: &RetirementParams,
    cma: &Cma,
    return_config: &ReturnGeneratorConfig,
    config: &SimulationConfig,
) -> Result<SimulationBatch> {
    #[cfg(feature = "parallel")]
    {
        if config.worker_count > 1 {
            return run_parallel(params, cma, return_config, config);
        }
    }
    run_sequential(params, cma, return_config, config)
}

/// Run a batch and reduce it straight to the RPC-facing result, timing the
/// whole thing for `calculation_time_ms`.
pub fn run_simulation(
    params: &RetirementParams,
    cma: &Cma,
    return_config: &ReturnGeneratorConfig,
    config: &SimulationConfig,
) -> Result<MonteCarloResult> {
    let start = std::time::Instant::now();
    let batch = run_batch(params, cma, return_config, config)?;
    let elapsed_ms = start.elapsed().as_millis() as u64;
    Ok(aggregator::aggregate(&batch, params, elapsed_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::params::{AssetBuckets, OwnerMap, SocialSecurityParams, TaxConfig};
    use crate::model::profile::{Allocation, FilingStatus, HealthStatus, TaxBracket};
    use crate::taxes;

    fn params_with_seed(seed: u32) -> RetirementParams {
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
            current_retirement_assets: 500_000.0,
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
                    tax_deferred: 300_000.0,
                    tax_free: 50_000.0,
                    capital_gains: 100_000.0,
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
            random_seed: seed,
        }
    }

    #[test]
    fn sequential_batch_runs_requested_iterations() {
        let params = params_with_seed(1);
        let cma = Cma::baked_in_defaults();
        let config = SimulationConfig {
            iterations: 50,
            ..Default::default()
        };
        let batch =
            run_sequential(&params, &cma, &ReturnGeneratorConfig::default(), &config).unwrap();
        assert_eq!(batch.outcomes.len(), 50);
        assert_eq!(batch.outcomes_without_ltc.len(), 50);
    }

    #[test]
    fn same_seed_and_trial_index_is_worker_count_independent() {
        let params = params_with_seed(7);
        let cma = Cma::baked_in_defaults();
        let a = run_one_trial(&params, &cma, &ReturnGeneratorConfig::default(), 3);
        let b = run_one_trial(&params, &cma, &ReturnGeneratorConfig::default(), 3);
        assert_eq!(a.cashflows.len(), b.cashflows.len());
        assert!((a.ending_balance - b.ending_balance).abs() < 1e-6);
    }

    #[test]
    fn different_trial_indices_diverge() {
        let params = params_with_seed(7);
        let cma = Cma::baked_in_defaults();
        let a = run_one_trial(&params, &cma, &ReturnGeneratorConfig::default(), 0);
        let b = run_one_trial(&params, &cma, &ReturnGeneratorConfig::default(), 1);
        assert!((a.ending_balance - b.ending_balance).abs() > 1e-9);
    }

    #[test]
    fn without_ltc_counterfactual_matches_when_no_ltc_event_occurs() {
        let params = params_with_seed(7);
        let cma = Cma::baked_in_defaults();
        let (with_ltc, without_ltc) = run_one_trial_pair(
            &params,
            &cma,
            &ReturnGeneratorConfig::default(),
            3,
        );
        if !with_ltc.ltc_event_occurred {
            assert!((with_ltc.ending_balance - without_ltc.ending_balance).abs() < 1e-6);
        }
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_and_sequential_batches_agree_on_success_rate() {
        let params = params_with_seed(123);
        let cma = Cma::baked_in_defaults();
        let config_seq = SimulationConfig {
            iterations: 200,
            worker_count: 1,
            timeout: None,
        };
        let config_par = SimulationConfig {
            iterations: 200,
            worker_count: 4,
            timeout: None,
        };
        let seq =
            run_sequential(&params, &cma, &ReturnGeneratorConfig::default(), &config_seq).unwrap();
        let par =
            run_parallel(&params, &cma, &ReturnGeneratorConfig::default(), &config_par).unwrap();

        let success_rate = |batch: &SimulationBatch| {
            batch.outcomes.iter().filter(|o| o.success).count() as f64 / batch.outcomes.len() as f64
        };
        assert!((success_rate(&seq) - success_rate(&par)).abs() < 1e-6);
    }
}
