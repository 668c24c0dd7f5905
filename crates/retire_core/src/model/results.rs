//! Output types produced by the aggregator (C13) and returned across the
//! RPC boundary (C14).

use serde::{Deserialize, Serialize};

use crate::model::cashflow::YearlyCashflow;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ConfidenceIntervals {
    pub percentile10: f64,
    pub percentile25: f64,
    pub percentile50: f64,
    pub percentile75: f64,
    pub percentile90: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Scenarios {
    pub successful: usize,
    pub failed: usize,
    pub total: usize,
}

/// Percentile band for portfolio balance at a single age.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PercentileBand {
    pub age: u32,
    pub p05: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LtcAnalysis {
    pub success_with_ltc: f64,
    pub success_without_ltc: f64,
    pub success_delta: f64,
    pub average_ltc_cost: f64,
    pub average_ltc_duration_years: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloResult {
    /// In `[0, 1]`.
    pub success_probability: f64,
    /// `success_probability * 100`, in `[0, 100]`.
    pub probability_of_success: f64,
    pub median_ending_balance: f64,
    pub confidence_intervals: ConfidenceIntervals,
    pub scenarios: Scenarios,
    pub yearly_cash_flows: Vec<YearlyCashflow>,
    pub ltc_analysis: Option<LtcAnalysis>,
    pub safe_withdrawal_rate: f64,
    /// Percentile bands over portfolio balance, indexed by simulated age.
    pub percentiles_by_age: Vec<PercentileBand>,
    /// `probability_of_ruin_by_age[i]` corresponds to `percentiles_by_age[i].age`.
    pub probability_of_ruin_by_age: Vec<f64>,
    #[serde(rename = "calculationTime")]
    pub calculation_time_ms: u64,
}
