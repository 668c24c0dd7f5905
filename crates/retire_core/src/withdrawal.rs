//! Withdrawal sequencer (C8): bucket draw order, RMD forcing, optional
//! Roth conversions, and Guyton-Klinger guardrail adjustments.
//!
//! Design note (§9, "Guardrails and RMDs interaction"): RMDs are always
//! applied first; guardrails only ever decide the following year's
//! inflation adjustment. That ordering is load-bearing for tax outcomes
//! and must not be reversed.

use crate::model::cashflow::{AdjustmentReason, AdjustmentType};
use crate::model::params::OwnerMap;
use crate::model::profile::Owner;
use crate::model::rmd::RmdTable;
use crate::model::AssetBuckets;

#[derive(Debug, Clone, Copy, Default)]
pub struct WithdrawalResult {
    pub cash_withdrawn: f64,
    pub taxable_withdrawn: f64,
    pub tax_deferred_withdrawn: f64,
    pub tax_free_withdrawn: f64,
    pub rmd_forced: f64,
    /// Amount of the forced RMD beyond what spending needed, redeposited
    /// into the owner's taxable bucket.
    pub rmd_surplus_to_taxable: f64,
    /// Net need that could not be met from any bucket.
    pub shortfall: f64,
}

impl WithdrawalResult {
    #[must_use]
    pub fn total_withdrawn(&self) -> f64 {
        self.cash_withdrawn + self.taxable_withdrawn + self.tax_deferred_withdrawn + self.tax_free_withdrawn
    }
}

/// Execute one year's withdrawal against `buckets`, mutating them in
/// place, and return a breakdown for tax and cashflow reporting.
pub fn execute_withdrawal(
    buckets: &mut OwnerMap<AssetBuckets>,
    net_need: f64,
    user_age: u32,
    spouse_age: Option<u32>,
    rmd_age: u32,
    rmd_table: &RmdTable,
) -> WithdrawalResult {
    let mut result = WithdrawalResult::default();

    // RMD is forced first, per owner, from their own tax-deferred bucket.
    let owner_ages = [(Owner::User, Some(user_age)), (Owner::Spouse, spouse_age)];
    let mut total_rmd = 0.0;
    for (owner, age) in owner_ages {
        let Some(age) = age else { continue };
        if age < rmd_age {
            continue;
        }
        let bucket = buckets.get_mut(owner);
        if bucket.tax_deferred <= 0.0 {
            continue;
        }
        let Some(divisor) = rmd_table.divisor_for_age(age) else {
            continue;
        };
        let rmd = (bucket.tax_deferred / divisor).min(bucket.tax_deferred);
        bucket.tax_deferred -= rmd;
        total_rmd += rmd;
    }
    result.rmd_forced = total_rmd;
    result.tax_deferred_withdrawn += total_rmd;

    let remaining_need = (net_need - total_rmd).max(0.0);
    let surplus = (total_rmd - net_need).max(0.0);
    result.rmd_surplus_to_taxable = surplus;
    if surplus > 0.0 {
        // Redeposit the unneeded RMD into the taxable bucket of whichever
        // owner has a positive taxable balance, preferring joint.
        deposit_surplus(buckets, surplus);
    }

    let mut need = remaining_need;

    need = draw_category(buckets, need, |b| &mut b.cash_equivalents, &mut result.cash_withdrawn);
    need = draw_category(buckets, need, |b| &mut b.capital_gains, &mut result.taxable_withdrawn);
    need = draw_category(buckets, need, |b| &mut b.tax_deferred, &mut result.tax_deferred_withdrawn);
    need = draw_category(buckets, need, |b| &mut b.tax_free, &mut result.tax_free_withdrawn);

    result.shortfall = need.max(0.0);
    result
}

fn deposit_surplus(buckets: &mut OwnerMap<AssetBuckets>, surplus: f64) {
    buckets.joint.capital_gains += surplus;
}

/// Draw `need` proportionally from one category across all three owners'
/// buckets, reducing balances in place and returning the unmet remainder.
fn draw_category(
    buckets: &mut OwnerMap<AssetBuckets>,
    need: f64,
    field: impl Fn(&mut AssetBuckets) -> &mut f64,
    withdrawn_tracker: &mut f64,
) -> f64 {
    if need <= 0.0 {
        return 0.0;
    }

    let mut owners = [
        field(&mut buckets.user),
        field(&mut buckets.spouse),
        field(&mut buckets.joint),
    ];
    let total: f64 = owners.iter().map(|b| **b).sum();
    if total <= 0.0 {
        return need;
    }

    let draw = need.min(total);
    for bucket in owners.iter_mut() {
        let share = if total > 0.0 { **bucket / total } else { 0.0 };
        let amount = draw * share;
        **bucket -= amount;
    }
    *withdrawn_tracker += draw;
    (need - draw).max(0.0)
}

/// Amount to convert from tax-deferred to tax-free this year, up to the
/// top of `bracket_ceiling`, given current ordinary income already
/// recognized. Converted dollars are taxable in the year performed.
#[must_use]
pub fn roth_conversion_amount(
    tax_deferred_balance: f64,
    current_ordinary_income: f64,
    bracket_ceiling: f64,
) -> f64 {
    if current_ordinary_income >= bracket_ceiling {
        return 0.0;
    }
    (bracket_ceiling - current_ordinary_income).min(tax_deferred_balance).max(0.0)
}

pub fn apply_roth_conversion(buckets: &mut OwnerMap<AssetBuckets>, owner: Owner, amount: f64) {
    let bucket = buckets.get_mut(owner);
    let amount = amount.min(bucket.tax_deferred);
    bucket.tax_deferred -= amount;
    bucket.tax_free += amount;
}

/// Guyton-Klinger guardrail decision for the *next* year's withdrawal,
/// given this year's realized withdrawal rate against the initial rate
/// fixed at retirement, and whether the portfolio's most recent return
/// was negative.
#[must_use]
pub fn guardrail_adjustment(
    current_withdrawal_rate: f64,
    initial_withdrawal_rate: f64,
    previous_year_return: f64,
) -> (AdjustmentType, AdjustmentReason, f64) {
    if current_withdrawal_rate > initial_withdrawal_rate * 1.2 {
        return (
            AdjustmentType::GuardrailCut,
            AdjustmentReason::CapitalPreservationRule,
            -0.10,
        );
    }
    if current_withdrawal_rate < initial_withdrawal_rate * 0.8 {
        return (
            AdjustmentType::GuardrailRaise,
            AdjustmentReason::ProsperityRule,
            0.10,
        );
    }
    if previous_year_return < 0.0 {
        return (
            AdjustmentType::SkipInflationAdjustment,
            AdjustmentReason::PortfolioManagementRule,
            0.0,
        );
    }
    (AdjustmentType::None, AdjustmentReason::None, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buckets() -> OwnerMap<AssetBuckets> {
        OwnerMap {
            user: AssetBuckets {
                tax_deferred: 200_000.0,
                tax_free: 50_000.0,
                capital_gains: 100_000.0,
                cash_equivalents: 20_000.0,
            },
            spouse: AssetBuckets::default(),
            joint: AssetBuckets {
                tax_deferred: 0.0,
                tax_free: 0.0,
                capital_gains: 50_000.0,
                cash_equivalents: 10_000.0,
            },
        }
    }

    #[test]
    fn draws_cash_before_taxable_before_tax_deferred() {
        let mut b = buckets();
        let table = RmdTable::irs_uniform_lifetime_2024();
        let result = execute_withdrawal(&mut b, 15_000.0, 60, None, 73, &table);
        assert_eq!(result.cash_withdrawn, 15_000.0);
        assert_eq!(result.taxable_withdrawn, 0.0);
        assert_eq!(result.tax_deferred_withdrawn, 0.0);
    }

    #[test]
    fn rmd_is_forced_even_when_need_is_smaller() {
        let mut b = buckets();
        let table = RmdTable::irs_uniform_lifetime_2024();
        let result = execute_withdrawal(&mut b, 1_000.0, 75, None, 73, &table);
        assert!(result.rmd_forced > 1_000.0);
        assert!(result.rmd_surplus_to_taxable > 0.0);
    }

    #[test]
    fn no_rmd_before_rmd_age() {
        let mut b = buckets();
        let table = RmdTable::irs_uniform_lifetime_2024();
        let result = execute_withdrawal(&mut b, 10_000.0, 65, None, 73, &table);
        assert_eq!(result.rmd_forced, 0.0);
    }

    #[test]
    fn shortfall_reported_when_buckets_exhausted() {
        let mut b = OwnerMap::<AssetBuckets>::default();
        let table = RmdTable::irs_uniform_lifetime_2024();
        let result = execute_withdrawal(&mut b, 50_000.0, 70, None, 73, &table);
        assert_eq!(result.shortfall, 50_000.0);
    }

    #[test]
    fn capital_preservation_rule_cuts_when_rate_too_high() {
        let (adj_type, reason, delta) = guardrail_adjustment(0.07, 0.05, 0.03);
        assert_eq!(adj_type, AdjustmentType::GuardrailCut);
        assert_eq!(reason, AdjustmentReason::CapitalPreservationRule);
        assert!(delta < 0.0);
    }

    #[test]
    fn prosperity_rule_raises_when_rate_too_low() {
        let (adj_type, _, delta) = guardrail_adjustment(0.03, 0.05, 0.03);
        assert_eq!(adj_type, AdjustmentType::GuardrailRaise);
        assert!(delta > 0.0);
    }

    #[test]
    fn negative_prior_return_skips_inflation_adjustment() {
        let (adj_type, reason, _) = guardrail_adjustment(0.05, 0.05, -0.08);
        assert_eq!(adj_type, AdjustmentType::SkipInflationAdjustment);
        assert_eq!(reason, AdjustmentReason::PortfolioManagementRule);
    }
}
