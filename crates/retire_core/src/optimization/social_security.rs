//! Social Security claim-age optimizer (C12): PIA bend points, FRA by
//! birth year, early/delayed claim adjustment, and an NPV grid over
//! claim ages 62-70.

use serde::{Deserialize, Serialize};

pub const DEFAULT_REAL_DISCOUNT_RATE: f64 = 0.03;
pub const EARLIEST_CLAIM_AGE: u32 = 62;
pub const LATEST_CLAIM_AGE: u32 = 70;

/// 2024 AIME bend points (simplified: treats `annual_income` as a proxy
/// for AIME rather than running a full 35-year wage-indexed average,
/// documented as a deliberate simplification in DESIGN.md).
const BEND_POINT_1: f64 = 1_174.0 * 12.0;
const BEND_POINT_2: f64 = 7_078.0 * 12.0;

/// Primary Insurance Amount from `annual_income`, using the bend-point
/// formula: 90% of the first bend point, 32% of the amount between the
/// two bend points, 15% of the remainder.
#[must_use]
pub fn calculate_pia(annual_income: f64) -> f64 {
    let income = annual_income.max(0.0);
    if income <= BEND_POINT_1 {
        income * 0.90
    } else if income <= BEND_POINT_2 {
        BEND_POINT_1 * 0.90 + (income - BEND_POINT_1) * 0.32
    } else {
        BEND_POINT_1 * 0.90 + (BEND_POINT_2 - BEND_POINT_1) * 0.32 + (income - BEND_POINT_2) * 0.15
    }
}

/// Full retirement age in whole years, by birth year (simplified to
/// whole-year FRA; the true schedule has a two-month step for 1955-1959
/// birth years, which this collapses to the nearest whole year per
/// DESIGN.md).
#[must_use]
pub fn full_retirement_age(birth_year: i32) -> u32 {
    match birth_year {
        y if y <= 1937 => 65,
        1938..=1942 => 65,
        1943..=1954 => 66,
        1955..=1959 => 67,
        _ => 67,
    }
}

/// Monthly benefit at claim age `a`, derived from `pia` at `fra`.
///
/// Early claiming: reduces at 5/9% per month for the first 36 months
/// before FRA, then 5/12% per month beyond that.
/// Delayed claiming: 2/3% per month (8%/year) up to age 70.
#[must_use]
pub fn monthly_benefit_at_claim_age(pia: f64, fra: u32, claim_age_months: i64) -> f64 {
    let fra_months = i64::from(fra) * 12;
    let months_early = fra_months - claim_age_months;

    if months_early > 0 {
        let first_36 = months_early.min(36) as f64;
        let beyond_36 = (months_early - 36).max(0) as f64;
        let reduction = first_36 * (5.0 / 9.0 / 100.0) + beyond_36 * (5.0 / 12.0 / 100.0);
        pia * (1.0 - reduction).max(0.0)
    } else {
        let months_delayed = (-months_early) as f64;
        pia * (1.0 + months_delayed * (2.0 / 3.0 / 100.0))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClaimAgeGridPoint {
    pub claim_age: u32,
    pub monthly_benefit: f64,
    pub npv: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialSecurityOptimizationResult {
    pub optimal_age: u32,
    pub max_lifetime_benefit: f64,
    pub monthly_at_optimal: f64,
    pub monthly_at_current_age: f64,
    pub grid: Vec<ClaimAgeGridPoint>,
}

/// NPV of lifetime benefits from claiming at `claim_age` through
/// `life_expectancy`, discounted at `discount_rate` (real, no separate
/// CPI layer — COLA is assumed to roughly track the discount rate over
/// a full retirement horizon, matching the §4.12 note that inflation is
/// embedded in nominal streams elsewhere, not in this NPV).
fn npv_of_claim_age(
    monthly_benefit: f64,
    claim_age: u32,
    life_expectancy: u32,
    discount_rate: f64,
) -> f64 {
    if claim_age >= life_expectancy {
        return 0.0;
    }
    let annual_benefit = monthly_benefit * 12.0;
    let years = life_expectancy - claim_age;
    (0..years)
        .map(|t| annual_benefit / (1.0 + discount_rate).powi(t as i32 + 1))
        .sum()
}

/// Optimize claim age for one individual over the grid
/// `[max(62, current_age), 70]`.
#[must_use]
pub fn optimize_claim_age(
    annual_income: f64,
    birth_year: i32,
    current_age: u32,
    life_expectancy: u32,
    discount_rate: f64,
) -> SocialSecurityOptimizationResult {
    let pia = calculate_pia(annual_income);
    let fra = full_retirement_age(birth_year);

    let start_age = current_age.max(EARLIEST_CLAIM_AGE);
    let mut grid = Vec::new();
    for claim_age in start_age..=LATEST_CLAIM_AGE {
        let monthly = monthly_benefit_at_claim_age(pia, fra, i64::from(claim_age) * 12);
        let npv = npv_of_claim_age(monthly, claim_age, life_expectancy, discount_rate);
        grid.push(ClaimAgeGridPoint {
            claim_age,
            monthly_benefit: monthly,
            npv,
        });
    }

    let best = grid
        .iter()
        .max_by(|a, b| a.npv.total_cmp(&b.npv))
        .copied()
        .unwrap_or(ClaimAgeGridPoint {
            claim_age: start_age,
            monthly_benefit: 0.0,
            npv: 0.0,
        });

    let monthly_at_current_age = grid
        .iter()
        .find(|g| g.claim_age == start_age)
        .map(|g| g.monthly_benefit)
        .unwrap_or(0.0);

    SocialSecurityOptimizationResult {
        optimal_age: best.claim_age,
        max_lifetime_benefit: best.npv,
        monthly_at_optimal: best.monthly_benefit,
        monthly_at_current_age,
        grid,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoupleOptimizationResult {
    pub user: SocialSecurityOptimizationResult,
    pub spouse: SocialSecurityOptimizationResult,
    pub combined_max_lifetime_benefit: f64,
}

/// Optimize each spouse's claim age independently; the joint combined
/// NPV is the sum (§4.12).
#[must_use]
pub fn optimize_couple_claim_ages(
    user_annual_income: f64,
    user_birth_year: i32,
    user_current_age: u32,
    user_life_expectancy: u32,
    spouse_annual_income: f64,
    spouse_birth_year: i32,
    spouse_current_age: u32,
    spouse_life_expectancy: u32,
    discount_rate: f64,
) -> CoupleOptimizationResult {
    let user = optimize_claim_age(
        user_annual_income,
        user_birth_year,
        user_current_age,
        user_life_expectancy,
        discount_rate,
    );
    let spouse = optimize_claim_age(
        spouse_annual_income,
        spouse_birth_year,
        spouse_current_age,
        spouse_life_expectancy,
        discount_rate,
    );
    let combined_max_lifetime_benefit = user.max_lifetime_benefit + spouse.max_lifetime_benefit;
    CoupleOptimizationResult {
        user,
        spouse,
        combined_max_lifetime_benefit,
    }
}
