//! `POST /calculate-retirement-bands` and
//! `POST /calculate-retirement-bands-optimization` (C14).
//!
//! Both endpoints share this handler; `-optimization` only clamps the
//! iteration count down for a faster, lower-fidelity pass suitable for
//! interactive sliders. Responses are cached by a hash of the normalized
//! request (§6: "a cached snapshot of the last bands response, keyed by a
//! hash of input variables").

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use jiff::Timestamp;
use retire_core::config::profile_to_retirement_params;
use retire_core::model::Profile;
use retire_core::returns::ReturnGeneratorConfig;
use retire_core::simulation::{SimulationConfig, default_worker_count, run_simulation};
use retire_core::MonteCarloValidator;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult, FieldErrorBody};
use crate::state::{AppState, CachedBands, cache_key};

/// Iteration ceiling for the `-optimization` variant: enough trials for a
/// stable band shape without the cost of a full run.
const OPTIMIZATION_ITERATIONS: usize = 200;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandsRequest {
    pub params: Profile,
    pub iterations: Option<usize>,
    pub seed: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BandPercentiles {
    pub p05: Vec<f64>,
    pub p25: Vec<f64>,
    pub p50: Vec<f64>,
    pub p75: Vec<f64>,
    pub p95: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandsMeta {
    pub current_age: u32,
    pub retirement_age: u32,
    pub longevity_age: u32,
    pub runs: usize,
    pub calculated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandsResponse {
    pub ages: Vec<u32>,
    pub percentiles: BandPercentiles,
    pub meta: BandsMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculation_time: Option<u64>,
}

async fn calculate_bands(
    state: Arc<AppState>,
    req: BandsRequest,
    iteration_ceiling: Option<usize>,
) -> ApiResult<Json<BandsResponse>> {
    // `iteration_ceiling` distinguishes the two endpoints in the cache key
    // so a full bands run never satisfies an `-optimization` request or
    // vice versa.
    let cache_key_input = (&req, iteration_ceiling);
    if let Some(key) = cache_key(&cache_key_input) {
        if let Ok(cache) = state.bands_cache.lock() {
            if let Some(cached) = cache.get(&key) {
                let mut response = cached.response.clone();
                response.cached = Some(true);
                response.calculation_time = None;
                return Ok(Json(response));
            }
        }
    }

    let current_year = Timestamp::now().to_zoned(jiff::tz::TimeZone::UTC).date().year() as i32;
    let mut params = profile_to_retirement_params(&req.params, &state.cma, current_year);
    if let Some(seed) = req.seed {
        params.random_seed = seed;
    }

    let outcome = MonteCarloValidator::validate_parameters(&params);
    if !outcome.errors.is_empty() {
        return Err(ApiError::Validation {
            errors: outcome
                .errors
                .into_iter()
                .map(FieldErrorBody::from)
                .collect::<Vec<_>>(),
            warnings: outcome.warnings,
        });
    }

    let mut iterations = req
        .iterations
        .unwrap_or(state.engine_config.default_iterations);
    if let Some(ceiling) = iteration_ceiling {
        iterations = iterations.min(ceiling);
    }

    let return_config = ReturnGeneratorConfig {
        use_fat_tails: true,
        disable_crash_overlay: state.engine_config.disable_crash_overlay,
        strict_baseline: state.engine_config.iid_lognormal_baseline,
        crash_overlay: state.engine_config.crash_overlay,
    };
    let sim_config = SimulationConfig {
        iterations,
        worker_count: if state.engine_config.force_inline {
            1
        } else {
            default_worker_count()
        },
        timeout: Some(Duration::from_secs(30)),
    };

    let result = run_simulation(&params, &state.cma, &return_config, &sim_config)?;

    let ages: Vec<u32> = result.percentiles_by_age.iter().map(|b| b.age).collect();
    let percentiles = BandPercentiles {
        p05: result.percentiles_by_age.iter().map(|b| b.p05).collect(),
        p25: result.percentiles_by_age.iter().map(|b| b.p25).collect(),
        p50: result.percentiles_by_age.iter().map(|b| b.p50).collect(),
        p75: result.percentiles_by_age.iter().map(|b| b.p75).collect(),
        p95: result.percentiles_by_age.iter().map(|b| b.p95).collect(),
    };

    let longevity_age = longevity_age(req.params.life_expectancy, req.params.spouse_life_expectancy);

    let response = BandsResponse {
        ages,
        percentiles,
        meta: BandsMeta {
            current_age: params.current_age,
            retirement_age: params.retirement_age,
            longevity_age,
            runs: iterations,
            calculated_at: Timestamp::now().to_string(),
        },
        cached: Some(false),
        calculation_time: Some(result.calculation_time_ms),
    };

    if let Some(key) = cache_key(&cache_key_input) {
        if let Ok(mut cache) = state.bands_cache.lock() {
            cache.insert(
                key,
                CachedBands {
                    response: response.clone(),
                },
            );
        }
    }

    Ok(Json(response))
}

pub async fn calculate_retirement_bands(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BandsRequest>,
) -> ApiResult<Json<BandsResponse>> {
    calculate_bands(state, req, None).await
}

pub async fn calculate_retirement_bands_optimization(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BandsRequest>,
) -> ApiResult<Json<BandsResponse>> {
    calculate_bands(state, req, Some(OPTIMIZATION_ITERATIONS)).await
}

/// The household's longevity horizon for the `meta.longevityAge` field:
/// whichever spouse's life expectancy is later, or the household member's
/// alone when unmarried.
fn longevity_age(life_expectancy: u32, spouse_life_expectancy: Option<u32>) -> u32 {
    spouse_life_expectancy.map_or(life_expectancy, |s| s.max(life_expectancy))
}
