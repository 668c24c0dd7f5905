//! Process-wide engine configuration (C16, ambient).
//!
//! `EngineConfig` is constructed once at process start and never mutated
//! during a simulation (§9 "Global configuration" design note: the CMA
//! active-version pointer in particular is read-only for the life of the
//! process). It is populated from environment variables named in §6, and
//! from CLI flags in the `retire-cli` binary.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::returns::CrashOverlayConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub cma_version: String,
    pub default_iterations: usize,
    pub crash_overlay: CrashOverlayConfig,
    pub disable_crash_overlay: bool,
    pub iid_lognormal_baseline: bool,
    /// Matches `MC_FORCE_INLINE`: forces sequential trial execution even
    /// when the `parallel` feature is compiled in, useful for
    /// reproducing a bug under a debugger.
    pub force_inline: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cma_version: "2025-US".to_string(),
            default_iterations: 1_000,
            crash_overlay: CrashOverlayConfig::default(),
            disable_crash_overlay: false,
            iid_lognormal_baseline: false,
            force_inline: false,
        }
    }
}

impl EngineConfig {
    /// Read configuration from the environment variables named in §6,
    /// falling back to defaults for anything unset. Malformed numeric
    /// values are a `ConfigurationError` (fail fast at startup).
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("CMA_VERSION") {
            config.cma_version = v;
        }
        if let Ok(v) = std::env::var("MC_ITERATIONS") {
            config.default_iterations = parse_env("MC_ITERATIONS", &v)?;
        }
        if let Ok(v) = std::env::var("FAT_TAIL_BLACK_SWAN_PROB") {
            config.crash_overlay.black_swan_prob = parse_env("FAT_TAIL_BLACK_SWAN_PROB", &v)?;
        }
        if let Ok(v) = std::env::var("FAT_TAIL_SEVERE_PROB") {
            config.crash_overlay.severe_prob = parse_env("FAT_TAIL_SEVERE_PROB", &v)?;
        }
        if let Ok(v) = std::env::var("FAT_TAIL_MODERATE_PROB") {
            config.crash_overlay.moderate_prob = parse_env("FAT_TAIL_MODERATE_PROB", &v)?;
        }
        if let Ok(v) = std::env::var("DISABLE_CRASH_OVERLAY") {
            config.disable_crash_overlay = parse_bool_env(&v);
        }
        if let Ok(v) = std::env::var("IID_LOGNORMAL_BASELINE") {
            config.iid_lognormal_baseline = parse_bool_env(&v);
        }
        if let Ok(v) = std::env::var("MC_FORCE_INLINE") {
            config.force_inline = parse_bool_env(&v);
        }

        Ok(config)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| EngineError::Configuration(format!("invalid value for {name}: {value:?}")))
}

fn parse_bool_env(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes")
}
