//! Result aggregator (C13): reduces a [`SimulationBatch`] of per-trial
//! outcomes into the percentile bands, success probability, and LTC
//! with/without comparison returned across the RPC boundary.

use crate::model::cashflow::YearlyCashflow;
use crate::model::params::RetirementParams;
use crate::model::results::{
    ConfidenceIntervals, LtcAnalysis, MonteCarloResult, PercentileBand, Scenarios,
};
use crate::simulation::SimulationBatch;

/// Linear-interpolated percentile of an already-sorted slice, `p` in `[0, 1]`.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] + (sorted[upper] - sorted[lower]) * frac
    }
}

/// Picks the trial whose ending balance sits closest to the batch median,
/// used as the representative path for `yearly_cash_flows`. Any single
/// trial is noisy; the median trial is the closest thing to "the" typical
/// outcome without averaging cashflow rows that belong to different
/// simulated lifespans.
fn median_trial_cashflows(batch: &SimulationBatch, sorted_balances: &[f64]) -> Vec<YearlyCashflow> {
    let median_balance = percentile_sorted(sorted_balances, 0.5);
    batch
        .outcomes
        .iter()
        .min_by(|a, b| {
            (a.ending_balance - median_balance)
                .abs()
                .total_cmp(&(b.ending_balance - median_balance).abs())
        })
        .map(|o| o.cashflows.clone())
        .unwrap_or_default()
}

/// Percentile bands and ruin probability, both indexed by simulated age.
/// A trial contributes a balance to every age it actually reached; a
/// failed trial's last cashflow age is its ruin age, and it contributes to
/// `probability_of_ruin_by_age` for every age at or after that.
fn percentiles_and_ruin_by_age(
    batch: &SimulationBatch,
) -> (Vec<PercentileBand>, Vec<f64>) {
    let total = batch.outcomes.len();
    if total == 0 {
        return (Vec::new(), Vec::new());
    }

    let min_age = batch
        .outcomes
        .iter()
        .filter_map(|o| o.cashflows.first().map(|c| c.age))
        .min()
        .unwrap_or(0);
    let max_age = batch
        .outcomes
        .iter()
        .filter_map(|o| o.cashflows.last().map(|c| c.age))
        .max()
        .unwrap_or(min_age);

    let failure_ages: Vec<u32> = batch
        .outcomes
        .iter()
        .filter(|o| !o.success)
        .filter_map(|o| o.cashflows.last().map(|c| c.age))
        .collect();

    let mut bands = Vec::new();
    let mut ruin = Vec::new();

    for age in min_age..=max_age {
        let mut balances: Vec<f64> = batch
            .outcomes
            .iter()
            .filter_map(|o| o.cashflows.iter().find(|c| c.age == age).map(|c| c.portfolio_balance))
            .collect();
        balances.sort_by(f64::total_cmp);

        bands.push(PercentileBand {
            age,
            p05: percentile_sorted(&balances, 0.05),
            p25: percentile_sorted(&balances, 0.25),
            p50: percentile_sorted(&balances, 0.50),
            p75: percentile_sorted(&balances, 0.75),
            p95: percentile_sorted(&balances, 0.95),
        });

        let ruined_by_now = failure_ages.iter().filter(|&&a| a <= age).count();
        ruin.push(ruined_by_now as f64 / total as f64);
    }

    (bands, ruin)
}

fn ltc_analysis(batch: &SimulationBatch) -> Option<LtcAnalysis> {
    let total = batch.outcomes.len();
    if total == 0 {
        return None;
    }

    let with_events = batch.outcomes.iter().filter(|o| o.ltc_event_occurred).count();
    if with_events == 0 {
        return None;
    }

    let success_with_ltc =
        batch.outcomes.iter().filter(|o| o.success).count() as f64 / total as f64;
    let success_without_ltc = batch
        .outcomes_without_ltc
        .iter()
        .filter(|o| o.success)
        .count() as f64
        / batch.outcomes_without_ltc.len().max(1) as f64;

    let (total_cost, total_duration) = batch
        .outcomes
        .iter()
        .filter(|o| o.ltc_event_occurred)
        .fold((0.0, 0u64), |(cost, duration), o| {
            (cost + o.ltc_gross_cost_total, duration + u64::from(o.ltc_event_duration_years))
        });

    Some(LtcAnalysis {
        success_with_ltc,
        success_without_ltc,
        success_delta: success_without_ltc - success_with_ltc,
        average_ltc_cost: total_cost / with_events as f64,
        average_ltc_duration_years: total_duration as f64 / with_events as f64,
    })
}

/// Reduce one simulation batch into the full result payload.
#[must_use]
pub fn aggregate(
    batch: &SimulationBatch,
    params: &RetirementParams,
    calculation_time_ms: u64,
) -> MonteCarloResult {
    let total = batch.outcomes.len();
    let successful = batch.outcomes.iter().filter(|o| o.success).count();
    let failed = total - successful;
    let success_probability = if total > 0 {
        successful as f64 / total as f64
    } else {
        0.0
    };

    let mut ending_balances: Vec<f64> = batch.outcomes.iter().map(|o| o.ending_balance).collect();
    ending_balances.sort_by(f64::total_cmp);

    let confidence_intervals = ConfidenceIntervals {
        percentile10: percentile_sorted(&ending_balances, 0.10),
        percentile25: percentile_sorted(&ending_balances, 0.25),
        percentile50: percentile_sorted(&ending_balances, 0.50),
        percentile75: percentile_sorted(&ending_balances, 0.75),
        percentile90: percentile_sorted(&ending_balances, 0.90),
    };

    let (percentiles_by_age, probability_of_ruin_by_age) = percentiles_and_ruin_by_age(batch);

    MonteCarloResult {
        success_probability,
        probability_of_success: success_probability * 100.0,
        median_ending_balance: confidence_intervals.percentile50,
        confidence_intervals,
        scenarios: Scenarios {
            successful,
            failed,
            total,
        },
        yearly_cash_flows: median_trial_cashflows(batch, &ending_balances),
        ltc_analysis: ltc_analysis(batch),
        safe_withdrawal_rate: params.withdrawal_rate,
        percentiles_by_age,
        probability_of_ruin_by_age,
        calculation_time_ms,
    }
}
