//! Capital Market Assumptions (C2): a versioned, read-only bundle of
//! per-asset-class expected returns, volatilities, and a correlation
//! matrix, plus default inflation parameters.
//!
//! The active bundle is selected once by `EngineConfig` at process start
//! and never changes mid-simulation (§9 "Global configuration" design
//! note).

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AssetClassAssumption {
    pub mean_real_return: f64,
    pub volatility: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    UsStocks,
    IntlStocks,
    Bonds,
    Cash,
    Alternatives,
}

const ASSET_CLASSES: [AssetClass; 5] = [
    AssetClass::UsStocks,
    AssetClass::IntlStocks,
    AssetClass::Bonds,
    AssetClass::Cash,
    AssetClass::Alternatives,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cma {
    pub version: String,
    pub assumptions: FxHashMap<AssetClass, AssetClassAssumption>,
    /// Row-major 5x5 correlation matrix ordered per [`AssetClass`]'s
    /// declaration order.
    pub correlation: [[f64; 5]; 5],
    pub default_inflation_mean: f64,
    pub default_inflation_std_dev: f64,
}

impl Cma {
    /// Baked-in defaults used when the requested version is missing (the
    /// one documented fallback the specification allows; any other
    /// resolution failure is a `ConfigurationError`).
    #[must_use]
    pub fn baked_in_defaults() -> Self {
        let mut assumptions = FxHashMap::default();
        assumptions.insert(
            AssetClass::UsStocks,
            AssetClassAssumption {
                mean_real_return: 0.072,
                volatility: 0.18,
            },
        );
        assumptions.insert(
            AssetClass::IntlStocks,
            AssetClassAssumption {
                mean_real_return: 0.065,
                volatility: 0.19,
            },
        );
        assumptions.insert(
            AssetClass::Bonds,
            AssetClassAssumption {
                mean_real_return: 0.025,
                volatility: 0.06,
            },
        );
        assumptions.insert(
            AssetClass::Cash,
            AssetClassAssumption {
                mean_real_return: 0.005,
                volatility: 0.01,
            },
        );
        assumptions.insert(
            AssetClass::Alternatives,
            AssetClassAssumption {
                mean_real_return: 0.045,
                volatility: 0.12,
            },
        );

        Self {
            version: "2025-US".to_string(),
            assumptions,
            // us_stocks, intl_stocks, bonds, cash, alternatives
            correlation: [
                [1.00, 0.80, 0.10, 0.00, 0.30],
                [0.80, 1.00, 0.05, 0.00, 0.25],
                [0.10, 0.05, 1.00, 0.20, 0.05],
                [0.00, 0.00, 0.20, 1.00, 0.00],
                [0.30, 0.25, 0.05, 0.00, 1.00],
            ],
            default_inflation_mean: 0.025,
            default_inflation_std_dev: 0.015,
        }
    }

    /// Resolve a CMA bundle by version tag. Only `"2025-US"` is known; any
    /// other request falls back to the baked-in defaults (documented
    /// behavior, not an error — a truly unresolvable bundle would be a
    /// `ConfigurationError` raised by the caller before constructing
    /// `EngineConfig`).
    #[must_use]
    pub fn resolve(version: &str) -> Self {
        match version {
            "2025-US" => Self::baked_in_defaults(),
            _ => Self::baked_in_defaults(),
        }
    }

    /// Allocation-weighted expected real return and volatility, ignoring
    /// cross-asset correlation (a first-moment blend used as the "model
    /// mean" in C3 step 1).
    #[must_use]
    pub fn weighted_mean_return(&self, allocation: &crate::model::Allocation) -> f64 {
        let weights = [
            (AssetClass::UsStocks, allocation.us_stocks),
            (AssetClass::IntlStocks, allocation.intl_stocks),
            (AssetClass::Bonds, allocation.bonds),
            (AssetClass::Cash, allocation.cash),
            (AssetClass::Alternatives, allocation.alternatives),
        ];
        weights
            .iter()
            .map(|(class, weight)| {
                self.assumptions
                    .get(class)
                    .map(|a| a.mean_real_return)
                    .unwrap_or(0.0)
                    * weight
            })
            .sum()
    }

    /// Allocation-weighted volatility, accounting for pairwise correlation
    /// (portfolio variance = w^T Σ w).
    #[must_use]
    pub fn weighted_volatility(&self, allocation: &crate::model::Allocation) -> f64 {
        let weights = [
            allocation.us_stocks,
            allocation.intl_stocks,
            allocation.bonds,
            allocation.cash,
            allocation.alternatives,
        ];
        let vols: Vec<f64> = ASSET_CLASSES
            .iter()
            .map(|c| self.assumptions.get(c).map(|a| a.volatility).unwrap_or(0.0))
            .collect();

        let mut variance = 0.0;
        for i in 0..5 {
            for j in 0..5 {
                variance += weights[i] * weights[j] * vols[i] * vols[j] * self.correlation[i][j];
            }
        }
        variance.max(0.0).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_matrix_is_symmetric_with_unit_diagonal() {
        let cma = Cma::baked_in_defaults();
        for i in 0..5 {
            assert!((cma.correlation[i][i] - 1.0).abs() < 1e-9);
            for j in 0..5 {
                assert!((cma.correlation[i][j] - cma.correlation[j][i]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn unknown_version_falls_back_to_defaults() {
        let cma = Cma::resolve("nonexistent");
        assert_eq!(cma.version, "2025-US");
    }

    #[test]
    fn all_equity_allocation_has_higher_vol_than_all_cash() {
        let cma = Cma::baked_in_defaults();
        let equity = crate::model::Allocation {
            us_stocks: 1.0,
            intl_stocks: 0.0,
            bonds: 0.0,
            cash: 0.0,
            alternatives: 0.0,
        };
        let cash = crate::model::Allocation {
            us_stocks: 0.0,
            intl_stocks: 0.0,
            bonds: 0.0,
            cash: 1.0,
            alternatives: 0.0,
        };
        assert!(cma.weighted_volatility(&equity) > cma.weighted_volatility(&cash));
    }
}
