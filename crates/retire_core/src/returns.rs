//! Per-year return generator (C3): blends user overrides with the CMA
//! model mean, draws a base return (fat-tailed or normal), applies the
//! current regime's mean/volatility, and optionally overlays crash events.

use serde::{Deserialize, Serialize};

use crate::cma::Cma;
use crate::model::{Allocation, Regime};
use crate::regime::regime_parameters;
use crate::rng::RetireRng;

use crate::model::profile::{EXPECTED_RETURN_CURRENT_ALLOCATION, EXPECTED_RETURN_GLIDE_PATH};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CrashOverlayConfig {
    pub black_swan_prob: f64,
    pub severe_prob: f64,
    pub moderate_prob: f64,
}

impl Default for CrashOverlayConfig {
    fn default() -> Self {
        Self {
            black_swan_prob: 0.002,
            severe_prob: 0.01,
            moderate_prob: 0.03,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReturnGeneratorConfig {
    pub use_fat_tails: bool,
    pub disable_crash_overlay: bool,
    /// Strict baseline mode (`IID_LOGNORMAL_BASELINE=1`): pure log-normal
    /// draws, crash overlay forced off, used for calibration tests.
    pub strict_baseline: bool,
    pub crash_overlay: CrashOverlayConfig,
}

/// One year's gross portfolio return, following C3's five steps.
pub fn generate_year_return(
    rng: &mut impl RetireRng,
    cma: &Cma,
    allocation: &Allocation,
    regime: Regime,
    expected_return_override: Option<f64>,
    volatility_override: Option<f64>,
    config: &ReturnGeneratorConfig,
) -> f64 {
    // Step 1: blend override (or route sentinel) with model mean.
    let model_mean = cma.weighted_mean_return(allocation);
    let model_vol = volatility_override.unwrap_or_else(|| cma.weighted_volatility(allocation));

    let blended_mean = match expected_return_override {
        Some(EXPECTED_RETURN_GLIDE_PATH) => model_mean,
        Some(EXPECTED_RETURN_CURRENT_ALLOCATION) => model_mean,
        Some(user_value) if user_value > 0.0 => 0.5 * user_value + 0.5 * model_mean,
        _ => model_mean,
    };

    let strict = config.strict_baseline;
    let crash_enabled = !strict && !config.disable_crash_overlay;

    // Step 2: base annual draw.
    let base_draw = if !strict && config.use_fat_tails {
        rng.student_t(5.0)
    } else {
        rng.normal()
    };

    // Step 3: apply regime mean/volatility, unless in strict baseline
    // (which uses the blended model mean/vol directly, ignoring regime).
    let (year_mean, year_vol) = if strict {
        (blended_mean, model_vol)
    } else {
        let regime_params = regime_parameters(regime);
        // Blend the household's allocation-driven mean/vol with the
        // regime's, weighted toward the regime since it represents the
        // prevailing market environment.
        let mean = 0.4 * blended_mean + 0.6 * regime_params.mean_return;
        let vol = 0.4 * model_vol + 0.6 * regime_params.volatility;
        (mean, vol)
    };

    let log_return = year_mean + year_vol * base_draw;

    // Step 4: crash overlay. At most one shock per year, most severe wins.
    let log_return = if crash_enabled {
        apply_crash_overlay(rng, log_return, &config.crash_overlay)
    } else {
        log_return
    };

    // Step 5: convert log-return to arithmetic return.
    log_return.exp() - 1.0
}

fn apply_crash_overlay(rng: &mut impl RetireRng, log_return: f64, cfg: &CrashOverlayConfig) -> f64 {
    let black_swan = rng.uniform() < cfg.black_swan_prob;
    let severe = rng.uniform() < cfg.severe_prob;
    let moderate = rng.uniform() < cfg.moderate_prob;

    let shock = if black_swan {
        -0.40
    } else if severe {
        -0.25
    } else if moderate {
        -0.12
    } else {
        0.0
    };

    log_return + shock
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct ReturnConfigRequest {
    pub use_fat_tails: Option<bool>,
    pub disable_crash_overlay: Option<bool>,
    pub strict_baseline: Option<bool>,
}

impl ReturnConfigRequest {
    #[must_use]
    pub fn resolve(&self, process_config: &ReturnGeneratorConfig) -> ReturnGeneratorConfig {
        ReturnGeneratorConfig {
            use_fat_tails: self.use_fat_tails.unwrap_or(process_config.use_fat_tails),
            disable_crash_overlay: self
                .disable_crash_overlay
                .unwrap_or(process_config.disable_crash_overlay),
            strict_baseline: self
                .strict_baseline
                .unwrap_or(process_config.strict_baseline),
            crash_overlay: process_config.crash_overlay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::XorShift32;

    fn allocation() -> Allocation {
        Allocation {
            us_stocks: 0.6,
            intl_stocks: 0.0,
            bonds: 0.35,
            cash: 0.05,
            alternatives: 0.0,
        }
    }

    #[test]
    fn strict_baseline_disables_crash_overlay() {
        let cma = Cma::baked_in_defaults();
        let mut rng = XorShift32::new(1);
        let config = ReturnGeneratorConfig {
            strict_baseline: true,
            ..Default::default()
        };
        let mut min_return = f64::INFINITY;
        for _ in 0..5000 {
            let r = generate_year_return(
                &mut rng,
                &cma,
                &allocation(),
                Regime::Normal,
                None,
                None,
                &config,
            );
            min_return = min_return.min(r);
        }
        // Without crash overlay, an extreme -40% shock should not appear;
        // the unshocked normal draw alone won't produce it at this vol.
        assert!(min_return > -0.6);
    }

    #[test]
    fn returns_are_finite_across_all_regimes() {
        let cma = Cma::baked_in_defaults();
        let mut rng = XorShift32::new(2);
        let config = ReturnGeneratorConfig::default();
        for regime in [Regime::Bull, Regime::Normal, Regime::Bear, Regime::Crisis] {
            for _ in 0..1000 {
                let r = generate_year_return(
                    &mut rng,
                    &cma,
                    &allocation(),
                    regime,
                    None,
                    None,
                    &config,
                );
                assert!(r.is_finite());
            }
        }
    }

    #[test]
    fn positive_override_blends_fifty_fifty_with_model_mean() {
        let cma = Cma::baked_in_defaults();
        let model_mean = cma.weighted_mean_return(&allocation());
        let override_value = 0.20;
        let blended = 0.5 * override_value + 0.5 * model_mean;
        assert!(blended > model_mean);
    }
}
