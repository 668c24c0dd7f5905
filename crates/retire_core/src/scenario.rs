//! Scenario kernel (C9): evolves one trial's [`TrialState`] year by year
//! through an explicit Accumulate / Transition / Distribute / Terminated
//! state machine, emitting a [`YearlyCashflow`] per simulated year.

use crate::ltc::{self, LtcEvent, LtcPolicy};
use crate::model::cashflow::{AdjustmentReason, AdjustmentType, YearlyCashflow};
use crate::model::params::RetirementParams;
use crate::model::profile::Owner;
use crate::model::rmd::RmdTable;
use crate::model::state::{KernelPhase, LtcStatus, TrialState};
use crate::mortality;
use crate::regime;
use crate::returns::{self, ReturnGeneratorConfig};
use crate::rng::RetireRng;
use crate::taxes;
use crate::withdrawal;

/// Default LTC policy used whenever `RetirementParams::has_ltc_insurance`
/// is set but no finer-grained policy terms were supplied; a household
/// that wants different terms provides its own coverage upstream of the
/// engine and folds the difference into `annual_healthcare_costs`.
const DEFAULT_LTC_POLICY: LtcPolicy = LtcPolicy {
    daily_benefit: 200.0,
    benefit_period_years: 3,
    elimination_period_days: 90,
};

/// Fraction of a taxable-bucket withdrawal treated as realized long-term
/// gain for tax purposes, absent per-lot cost-basis tracking.
const ASSUMED_TAXABLE_GAIN_FRACTION: f64 = 0.5;

pub struct ScenarioOutcome {
    pub cashflows: Vec<YearlyCashflow>,
    pub success: bool,
    pub ending_balance: f64,
    /// Whether an LTC event occurred for either household member.
    pub ltc_event_occurred: bool,
    /// Sum of the LTC cost actually drawn across all years, independent of
    /// whether `suppress_ltc` zeroed its effect on this trial's cashflows.
    pub ltc_gross_cost_total: f64,
    /// Longest of the user's/spouse's LTC event duration, in years.
    pub ltc_event_duration_years: u32,
}

/// Run one trial to completion.
///
/// `suppress_ltc` zeroes the LTC cost's effect on spending and cashflows
/// while still drawing from the same RNG positions, so a trial replayed
/// from a recorded tape with `suppress_ltc` flipped produces the
/// with-vs-without-LTC counterfactual the aggregator needs for
/// [`crate::model::LtcAnalysis`] on an otherwise identical market and
/// mortality path.
pub fn run_trial(
    rng: &mut impl RetireRng,
    params: &RetirementParams,
    cma: &crate::cma::Cma,
    return_config: &ReturnGeneratorConfig,
) -> ScenarioOutcome {
    run_trial_inner(rng, params, cma, return_config, false)
}

/// Counterfactual variant of [`run_trial`] used to measure the portfolio's
/// success rate had no LTC event cost been incurred, on the same RNG
/// stream (see `suppress_ltc` on [`run_trial`]).
pub fn run_trial_without_ltc_cost(
    rng: &mut impl RetireRng,
    params: &RetirementParams,
    cma: &crate::cma::Cma,
    return_config: &ReturnGeneratorConfig,
) -> ScenarioOutcome {
    run_trial_inner(rng, params, cma, return_config, true)
}

fn run_trial_inner(
    rng: &mut impl RetireRng,
    params: &RetirementParams,
    cma: &crate::cma::Cma,
    return_config: &ReturnGeneratorConfig,
    suppress_ltc: bool,
) -> ScenarioOutcome {
    let end_of_life_age;
    let spouse_end_of_life_age;

    if let (Some(spouse_age), Some(spouse_life_expectancy)) =
        (params.spouse_current_age, params.spouse_life_expectancy)
    {
        let (user_eol, spouse_eol) = mortality::generate_couples_stochastic_life_expectancy(
            rng,
            params.life_expectancy,
            params.current_age,
            params.gender,
            params.health_status.longevity_adjustment_years(),
            spouse_life_expectancy,
            spouse_age,
            params.spouse_gender,
            params
                .spouse_health_status
                .map(|h| h.longevity_adjustment_years())
                .unwrap_or(0.0),
            0.4,
        );
        end_of_life_age = user_eol;
        spouse_end_of_life_age = Some(spouse_eol);
    } else {
        end_of_life_age = mortality::generate_stochastic_life_expectancy(
            rng,
            params.life_expectancy,
            params.current_age,
            params.gender,
            params.health_status.longevity_adjustment_years(),
        );
        spouse_end_of_life_age = None;
    }

    let years_to_retirement = i64::from(params.retirement_age) - i64::from(params.current_age);

    let mut state = TrialState {
        year: 0,
        user_age: params.current_age,
        spouse_age: params.spouse_current_age,
        buckets: params.asset_buckets,
        regime: regime::initial_regime(rng, years_to_retirement),
        phase: KernelPhase::Accumulate,
        magi_history: Default::default(),
        cola_index: 1.0,
        inflation_index: 1.0,
        ltc_status: LtcStatus::None,
        spouse_ltc_status: LtcStatus::None,
        end_of_life_age,
        spouse_end_of_life_age,
        initial_withdrawal_rate: 0.0,
        previous_year_return: 0.0,
    };

    let rmd_table = RmdTable::irs_uniform_lifetime_2024();
    let ltcg_brackets = taxes::default_ltcg_brackets(params.filing_status);

    let mut user_ltc_event: Option<LtcEvent> = None;
    let mut spouse_ltc_event: Option<LtcEvent> = None;
    let mut next_year_expense_multiplier = 1.0_f64;
    let mut skip_inflation_next_year = false;
    let mut ltc_gross_cost_total = 0.0_f64;

    let mut cashflows = Vec::new();
    let horizon = state.horizon_age();

    loop {
        let current_max_age = state.user_age.max(state.spouse_age.unwrap_or(0));
        if current_max_age > horizon {
            state.phase = KernelPhase::Terminated;
        }
        if state.total_assets() < 0.0 {
            state.phase = KernelPhase::Terminated;
        }
        if state.phase == KernelPhase::Terminated {
            break;
        }

        if state.user_age >= params.retirement_age && state.phase == KernelPhase::Accumulate {
            state.phase = KernelPhase::Transition;
        }

        let cashflow = if state.phase == KernelPhase::Accumulate {
            step_accumulate(rng, params, cma, return_config, &mut state)
        } else {
            if state.phase == KernelPhase::Transition {
                state.initial_withdrawal_rate = params.withdrawal_rate;
                state.phase = KernelPhase::Distribute;
            }
            step_distribute(
                rng,
                params,
                cma,
                return_config,
                &rmd_table,
                &ltcg_brackets,
                &mut state,
                &mut user_ltc_event,
                &mut spouse_ltc_event,
                &mut next_year_expense_multiplier,
                &mut skip_inflation_next_year,
                &mut ltc_gross_cost_total,
                suppress_ltc,
            )
        };

        cashflows.push(cashflow);

        state.year += 1;
        state.user_age += 1;
        state.spouse_age = state.spouse_age.map(|a| a + 1);
        if !skip_inflation_next_year {
            state.inflation_index *= 1.0 + params.inflation_rate;
        }
        state.cola_index *= 1.0 + params.inflation_rate;
        state.regime = regime::transition(rng, state.regime);
    }

    let success = cashflows.iter().all(|c| c.portfolio_balance >= 0.0);
    let ltc_event_occurred = user_ltc_event.is_some() || spouse_ltc_event.is_some();
    let ltc_event_duration_years = user_ltc_event
        .map(|e| e.duration_years)
        .into_iter()
        .chain(spouse_ltc_event.map(|e| e.duration_years))
        .max()
        .unwrap_or(0);

    ScenarioOutcome {
        success,
        ending_balance: state.total_assets(),
        cashflows,
        ltc_event_occurred,
        ltc_gross_cost_total,
        ltc_event_duration_years,
    }
}

fn step_accumulate(
    rng: &mut impl RetireRng,
    params: &RetirementParams,
    cma: &crate::cma::Cma,
    return_config: &ReturnGeneratorConfig,
    state: &mut TrialState,
) -> YearlyCashflow {
    state.buckets.user.tax_deferred += params.annual_savings;

    // Wages are taxed and pushed into MAGI history each pre-retirement
    // year, so the IRMAA lookback (§4.7) can see pre-retirement income at
    // ages 65-66 even though Medicare itself hasn't started yet.
    let wages = params.annual_wage_income * state.inflation_index;
    let deduction = taxes::standard_deduction(params.filing_status, 14_600.0) * state.inflation_index;
    let taxable_wages = (wages - deduction).max(0.0);
    let federal_brackets = taxes::index_brackets(
        &params.tax_config.federal_brackets,
        params.inflation_rate,
        state.year,
    );
    let federal_tax = taxes::calculate_bracket_tax(taxable_wages, &federal_brackets);
    let state_tax = taxes::state_tax(taxable_wages, params.tax_config.state_rate);
    state.magi_history.push(wages);

    let year_return = returns::generate_year_return(
        rng,
        cma,
        &params.allocation,
        state.regime,
        Some(params.expected_return),
        Some(params.return_volatility),
        return_config,
    );
    grow_buckets(state, year_return);
    state.previous_year_return = year_return;

    YearlyCashflow {
        year: state.year,
        age: state.user_age,
        portfolio_balance: state.total_assets(),
        contributions: params.annual_savings,
        withdrawal: 0.0,
        guaranteed_income: 0.0,
        healthcare_cost: 0.0,
        ltc_cost: 0.0,
        federal_tax,
        state_tax,
        medicare_premium: 0.0,
        net_cash_flow: params.annual_savings - federal_tax - state_tax,
        regime: state.regime,
        adjustment_type: AdjustmentType::None,
        adjustment_reason: AdjustmentReason::None,
    }
}

#[allow(clippy::too_many_arguments)]
fn step_distribute(
    rng: &mut impl RetireRng,
    params: &RetirementParams,
    cma: &crate::cma::Cma,
    return_config: &ReturnGeneratorConfig,
    rmd_table: &RmdTable,
    ltcg_brackets: &[crate::model::profile::TaxBracket],
    state: &mut TrialState,
    user_ltc_event: &mut Option<LtcEvent>,
    spouse_ltc_event: &mut Option<LtcEvent>,
    next_year_expense_multiplier: &mut f64,
    skip_inflation_next_year: &mut bool,
    ltc_gross_cost_total: &mut f64,
    suppress_ltc: bool,
) -> YearlyCashflow {
    let starting_balance = state.total_assets();

    // Guaranteed income: Social Security (COLA-adjusted), pensions, and
    // part-time income.
    let mut guaranteed_income = 0.0;
    let mut ss_benefit_this_year = 0.0;
    if let Some(ss) = params.social_security {
        if state.user_age >= ss.claim_age {
            let benefit = ss.monthly_benefit * 12.0 * state.cola_index;
            guaranteed_income += benefit;
            ss_benefit_this_year += benefit;
        }
    }
    if let Some(ss) = params.spouse_social_security {
        if state.spouse_age.is_some_and(|a| a >= ss.claim_age) {
            let benefit = ss.monthly_benefit * 12.0 * state.cola_index;
            guaranteed_income += benefit;
            ss_benefit_this_year += benefit;
        }
    }
    guaranteed_income += params.annual_pension + params.spouse_annual_pension;
    guaranteed_income += params.annual_part_time_income;

    let healthcare_cost =
        params.annual_healthcare_costs.unwrap_or(0.0) * state.inflation_index;

    // LTC: draw once per member, persist across years until resolved.
    if user_ltc_event.is_none() && state.ltc_status == LtcStatus::None {
        *user_ltc_event = ltc::draw_ltc_event(
            rng,
            params.health_status,
            state.user_age,
            state.end_of_life_age,
            healthcare_cost.max(20_000.0) * 3.0,
        );
        if user_ltc_event.is_some() {
            state.ltc_status = LtcStatus::Active { years_remaining: user_ltc_event.unwrap().duration_years };
        }
    }
    if let (Some(spouse_health), true) = (params.spouse_health_status, spouse_ltc_event.is_none() && state.spouse_ltc_status == LtcStatus::None) {
        if let Some(spouse_age) = state.spouse_age {
            *spouse_ltc_event = ltc::draw_ltc_event(
                rng,
                spouse_health,
                spouse_age,
                state.spouse_end_of_life_age.unwrap_or(spouse_age),
                healthcare_cost.max(20_000.0) * 3.0,
            );
            if spouse_ltc_event.is_some() {
                state.spouse_ltc_status = LtcStatus::Active { years_remaining: spouse_ltc_event.unwrap().duration_years };
            }
        }
    }

    let policy = params.has_ltc_insurance.then_some(&DEFAULT_LTC_POLICY);
    let mut ltc_cost = 0.0;
    if let Some(event) = user_ltc_event {
        ltc_cost += ltc::annual_ltc_cost(event, state.user_age, state.year, policy);
    }
    if let (Some(event), Some(spouse_age)) = (spouse_ltc_event, state.spouse_age) {
        ltc_cost += ltc::annual_ltc_cost(event, spouse_age, state.year, policy);
    }
    *ltc_gross_cost_total += ltc_cost;
    // The draws above still happen on the suppressed path so the RNG
    // stream stays aligned with the unsuppressed replay (see `run_trial`).
    let ltc_cost = if suppress_ltc { 0.0 } else { ltc_cost };

    let base_expenses = params.annual_retirement_expenses * state.inflation_index
        * *next_year_expense_multiplier;

    let net_need = (base_expenses + healthcare_cost + ltc_cost - guaranteed_income).max(0.0);

    let withdrawal_result = withdrawal::execute_withdrawal(
        &mut state.buckets,
        net_need,
        state.user_age,
        state.spouse_age,
        params.rmd_age,
        rmd_table,
    );

    if params.roth_conversions_enabled {
        let current_ordinary_income = withdrawal_result.tax_deferred_withdrawn + ss_benefit_this_year * 0.85;
        let conversion = withdrawal::roth_conversion_amount(
            state.buckets.user.tax_deferred,
            current_ordinary_income,
            params.roth_conversion_bracket_ceiling,
        );
        if conversion > 0.0 {
            withdrawal::apply_roth_conversion(&mut state.buckets, Owner::User, conversion);
        }
    }

    // Tax: ordinary income = tax-deferred withdrawal + taxable SS +
    // pensions/part-time; LTCG on the assumed-gain fraction of the
    // taxable-bucket withdrawal.
    let taxable_ss = taxes::taxable_social_security(
        ss_benefit_this_year,
        withdrawal_result.tax_deferred_withdrawn + params.annual_pension + params.spouse_annual_pension,
        params.filing_status,
    );
    let ordinary_income = withdrawal_result.tax_deferred_withdrawn
        + taxable_ss
        + params.annual_pension
        + params.spouse_annual_pension
        + params.annual_part_time_income;

    let deduction = taxes::standard_deduction(params.filing_status, 14_600.0)
        * state.inflation_index;
    let taxable_ordinary = (ordinary_income - deduction).max(0.0);

    let federal_brackets = taxes::index_brackets(
        &params.tax_config.federal_brackets,
        params.inflation_rate,
        state.year,
    );
    let federal_tax_ordinary = taxes::calculate_bracket_tax(taxable_ordinary, &federal_brackets);

    let long_term_gain = withdrawal_result.taxable_withdrawn * ASSUMED_TAXABLE_GAIN_FRACTION;
    let federal_tax_ltcg =
        taxes::long_term_capital_gains_tax(taxable_ordinary, long_term_gain, ltcg_brackets);

    let federal_tax = federal_tax_ordinary + federal_tax_ltcg;
    let state_tax = taxes::state_tax(taxable_ordinary, params.tax_config.state_rate);

    let magi = ordinary_income + long_term_gain;
    state.magi_history.push(magi);
    let medicare_premium = if state.user_age >= taxes::MEDICARE_START_AGE {
        let lookback_magi = state.magi_history.two_years_ago().unwrap_or(magi);
        taxes::irmaa_surcharge(state.user_age, lookback_magi, params.filing_status)
    } else {
        0.0
    };

    let year_return = returns::generate_year_return(
        rng,
        cma,
        &params.allocation,
        state.regime,
        Some(params.expected_return),
        Some(params.return_volatility),
        return_config,
    );
    grow_buckets(state, year_return);

    // Guyton-Klinger guardrails decide *next* year's expense multiplier.
    let current_withdrawal_rate = if starting_balance > 0.0 {
        withdrawal_result.total_withdrawn() / starting_balance
    } else {
        0.0
    };
    let (adjustment_type, adjustment_reason, delta) = if params.use_guardrails {
        withdrawal::guardrail_adjustment(
            current_withdrawal_rate,
            state.initial_withdrawal_rate,
            state.previous_year_return,
        )
    } else {
        (AdjustmentType::None, AdjustmentReason::None, 0.0)
    };
    *next_year_expense_multiplier *= 1.0 + delta;
    *skip_inflation_next_year = adjustment_type == AdjustmentType::SkipInflationAdjustment;

    state.previous_year_return = year_return;

    let total_tax = federal_tax + state_tax + medicare_premium;
    let net_cash_flow = guaranteed_income - base_expenses - healthcare_cost - ltc_cost - total_tax;

    YearlyCashflow {
        year: state.year,
        age: state.user_age,
        portfolio_balance: state.total_assets(),
        contributions: 0.0,
        withdrawal: withdrawal_result.total_withdrawn(),
        guaranteed_income,
        healthcare_cost,
        ltc_cost,
        federal_tax,
        state_tax,
        medicare_premium,
        net_cash_flow,
        regime: state.regime,
        adjustment_type,
        adjustment_reason,
    }
}

fn grow_buckets(state: &mut TrialState, year_return: f64) {
    let growth = 1.0 + year_return;
    for bucket in [&mut state.buckets.user, &mut state.buckets.spouse, &mut state.buckets.joint] {
        bucket.tax_deferred *= growth;
        bucket.tax_free *= growth;
        bucket.capital_gains *= growth;
        // Cash-equivalents earn a small nominal return regardless of
        // regime, not the full portfolio return.
        bucket.cash_equivalents *= 1.0 + (year_return * 0.1).clamp(-0.02, 0.05);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::params::{AssetBuckets, OwnerMap, SocialSecurityParams, TaxConfig};
    use crate::model::profile::{Allocation, FilingStatus, HealthStatus, TaxBracket};
    use crate::rng::XorShift32;

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
            random_seed: 42,
        }
    }

    #[test]
    fn trial_completes_and_emits_one_cashflow_per_year() {
        let params = base_params();
        let cma = crate::cma::Cma::baked_in_defaults();
        let mut rng = XorShift32::new(params.random_seed);
        let outcome = run_trial(&mut rng, &params, &cma, &ReturnGeneratorConfig::default());
        assert!(!outcome.cashflows.is_empty());
        assert_eq!(outcome.cashflows.first().unwrap().age, params.current_age);
    }

    #[test]
    fn same_seed_produces_identical_trial() {
        let params = base_params();
        let cma = crate::cma::Cma::baked_in_defaults();
        let mut rng_a = XorShift32::new(99);
        let mut rng_b = XorShift32::new(99);
        let a = run_trial(&mut rng_a, &params, &cma, &ReturnGeneratorConfig::default());
        let b = run_trial(&mut rng_b, &params, &cma, &ReturnGeneratorConfig::default());
        assert_eq!(a.cashflows.len(), b.cashflows.len());
        for (ca, cb) in a.cashflows.iter().zip(b.cashflows.iter()) {
            assert!((ca.portfolio_balance - cb.portfolio_balance).abs() < 1e-6);
        }
    }

    #[test]
    fn accumulate_phase_precedes_distribute_phase() {
        let params = base_params();
        let cma = crate::cma::Cma::baked_in_defaults();
        let mut rng = XorShift32::new(7);
        let outcome = run_trial(&mut rng, &params, &cma, &ReturnGeneratorConfig::default());
        let accumulate_years = outcome
            .cashflows
            .iter()
            .filter(|c| c.age < params.retirement_age)
            .count();
        assert_eq!(accumulate_years, (params.retirement_age - params.current_age) as usize);
    }

    #[test]
    fn irmaa_lookback_sees_pre_retirement_wages_at_ages_65_and_66() {
        let mut params = base_params();
        params.annual_wage_income = 400_000.0;
        params.annual_retirement_expenses = 40_000.0;
        params.annual_healthcare_costs = Some(5_000.0);
        params.social_security = Some(SocialSecurityParams {
            monthly_benefit: 3_000.0,
            claim_age: 62,
        });
        let cma = crate::cma::Cma::baked_in_defaults();
        let mut rng = XorShift32::new(7);
        // `run_trial_without_ltc_cost` keeps the LTC draw on the RNG stream
        // but zeroes its effect on spending, isolating the wage/MAGI
        // mechanism this test cares about from LTC cost noise.
        let outcome =
            run_trial_without_ltc_cost(&mut rng, &params, &cma, &ReturnGeneratorConfig::default());

        let premium_at = |age: u32| {
            outcome
                .cashflows
                .iter()
                .find(|c| c.age == age)
                .map(|c| c.medicare_premium)
        };

        let premium_65 = premium_at(65).expect("age 65 cashflow");
        let premium_66 = premium_at(66).expect("age 66 cashflow");
        let premium_70 = premium_at(70).expect("age 70 cashflow");

        assert!(premium_65 > 0.0, "high pre-retirement wages should trigger an IRMAA surcharge at 65");
        assert!(premium_66 > 0.0, "the lookback still sees pre-retirement wages at 66");
        assert!(
            premium_70 < premium_65,
            "by 70 the lookback has rolled onto modest post-retirement income"
        );
    }
}
