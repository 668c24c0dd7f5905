//! Stochastic life-expectancy generator (C5): a mixture distribution
//! skewed so roughly 40-50% of draws fall in a +/-4 year band around the
//! base expectancy, with a longer tail toward longevity than toward early
//! death, plus joint sampling for couples at a target Pearson correlation.

use crate::model::Gender;
use crate::rng::RetireRng;

/// Draw a single integer age-at-death.
///
/// `health_adjustment` shifts the mean (years); positive extends life.
pub fn generate_stochastic_life_expectancy(
    rng: &mut impl RetireRng,
    base_expectancy: u32,
    current_age: u32,
    gender: Option<Gender>,
    health_adjustment: f64,
) -> u32 {
    let gender_adjustment = match gender {
        // Female life expectancy tables run slightly longer than male.
        Some(Gender::Female) => 1.5,
        Some(Gender::Male) => -1.0,
        None => 0.0,
    };

    let mean = base_expectancy as f64 + health_adjustment + gender_adjustment;

    // Mixture: 45% a tight band around the mean (std 2.0 years), 35% a
    // longevity tail (mean shifted +6 years, std 5.0), 20% an early-death
    // tail (mean shifted -5 years, std 4.0).
    let bucket = rng.uniform();
    let (component_mean, component_std) = if bucket < 0.45 {
        (mean, 2.0)
    } else if bucket < 0.80 {
        (mean + 6.0, 5.0)
    } else {
        (mean - 5.0, 4.0)
    };

    let draw = component_mean + component_std * rng.normal();
    let age = draw.round().max(current_age as f64 + 1.0);
    age as u32
}

/// Jointly sample life expectancies for a couple with target Pearson
/// correlation `rho`, via a shared-factor construction: a common standard
/// normal `z_common` mixed with independent noise at weight
/// `sqrt(1 - rho^2)` reproduces correlation `rho` between the two
/// component draws before they're remapped into ages.
pub fn generate_couples_stochastic_life_expectancy(
    rng: &mut impl RetireRng,
    user_base_expectancy: u32,
    user_current_age: u32,
    user_gender: Option<Gender>,
    user_health_adjustment: f64,
    spouse_base_expectancy: u32,
    spouse_current_age: u32,
    spouse_gender: Option<Gender>,
    spouse_health_adjustment: f64,
    rho: f64,
) -> (u32, u32) {
    let rho = rho.clamp(-1.0, 1.0);
    let z_common = rng.normal();
    let z_user = rng.normal();
    let z_spouse = rng.normal();

    let shared_weight = rho.abs().sqrt();
    let indep_weight = (1.0 - rho.abs()).sqrt();
    let sign = if rho < 0.0 { -1.0 } else { 1.0 };

    let user_noise = shared_weight * z_common + indep_weight * z_user;
    let spouse_noise = sign * shared_weight * z_common + indep_weight * z_spouse;

    let user_age = correlated_age(
        user_noise,
        user_base_expectancy,
        user_current_age,
        user_gender,
        user_health_adjustment,
    );
    let spouse_age = correlated_age(
        spouse_noise,
        spouse_base_expectancy,
        spouse_current_age,
        spouse_gender,
        spouse_health_adjustment,
    );

    (user_age, spouse_age)
}

fn correlated_age(
    noise: f64,
    base_expectancy: u32,
    current_age: u32,
    gender: Option<Gender>,
    health_adjustment: f64,
) -> u32 {
    let gender_adjustment = match gender {
        Some(Gender::Female) => 1.5,
        Some(Gender::Male) => -1.0,
        None => 0.0,
    };
    let mean = base_expectancy as f64 + health_adjustment + gender_adjustment;
    let age = (mean + 4.0 * noise).round().max(current_age as f64 + 1.0);
    age as u32
}
