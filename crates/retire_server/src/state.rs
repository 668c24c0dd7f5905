//! Shared process state (C16, ambient): the engine configuration and CMA
//! bundle loaded once at startup, plus the bands response cache described
//! in §6 ("a cached snapshot of the last bands response, keyed by a hash
//! of input variables").

use std::collections::HashMap;
use std::hash::Hasher;
use std::sync::Mutex;

use retire_core::{Cma, EngineConfig};
use rustc_hash::FxHasher;
use serde::Serialize;

use crate::handlers::bands::BandsResponse;

pub struct CachedBands {
    pub response: BandsResponse,
}

pub struct AppState {
    pub engine_config: EngineConfig,
    pub cma: Cma,
    pub bands_cache: Mutex<HashMap<u64, CachedBands>>,
}

impl AppState {
    #[must_use]
    pub fn new(engine_config: EngineConfig) -> Self {
        let cma = Cma::resolve(&engine_config.cma_version);
        Self {
            engine_config,
            cma,
            bands_cache: Mutex::new(HashMap::new()),
        }
    }
}

/// Hash a JSON-serializable request body into a cache key. Two
/// structurally-identical requests (same field values, any field order)
/// hash identically because `serde_json::to_vec` always emits fields in
/// struct-declaration order.
pub fn cache_key<T: Serialize>(value: &T) -> Option<u64> {
    let bytes = serde_json::to_vec(value).ok()?;
    let mut hasher = FxHasher::default();
    hasher.write(&bytes);
    Some(hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        a: u32,
        b: String,
    }

    #[test]
    fn identical_values_hash_identically() {
        let one = Sample { a: 1, b: "x".into() };
        let two = Sample { a: 1, b: "x".into() };
        assert_eq!(cache_key(&one), cache_key(&two));
    }

    #[test]
    fn different_values_hash_differently() {
        let one = Sample { a: 1, b: "x".into() };
        let two = Sample { a: 2, b: "x".into() };
        assert_ne!(cache_key(&one), cache_key(&two));
    }
}
