//! Long-term-care event model (C6): per-trial event draw, onset/duration,
//! cost inflation, insurance offset, and the premium table feeding the
//! pre-retirement expense stream.

use serde::{Deserialize, Serialize};

use crate::model::{Gender, HealthStatus};
use crate::rng::RetireRng;

pub const LTC_COST_INFLATION_RATE: f64 = 0.045;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LtcPolicy {
    pub daily_benefit: f64,
    pub benefit_period_years: u32,
    pub elimination_period_days: u32,
}

impl LtcPolicy {
    #[must_use]
    pub fn annual_benefit_cap(&self) -> f64 {
        self.daily_benefit * 365.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LtcEvent {
    pub onset_age: u32,
    pub duration_years: u32,
    /// Annual cost at the reference year, before inflation compounding.
    pub base_annual_cost: f64,
}

/// Draw whether an LTC event occurs this trial for one household member,
/// and if so its onset age and duration.
pub fn draw_ltc_event(
    rng: &mut impl RetireRng,
    health_status: HealthStatus,
    current_age: u32,
    end_of_life_age: u32,
    reference_annual_cost: f64,
) -> Option<LtcEvent> {
    let occurs = rng.uniform() < health_status.ltc_probability();
    if !occurs {
        return None;
    }

    // Onset anywhere from current age to end-of-life; not always terminal.
    let span = end_of_life_age.saturating_sub(current_age).max(1);
    let onset_offset = rng.random_int(0, span as i64) as u32;
    let onset_age = current_age + onset_offset;

    let duration_years = 1 + rng.random_int(0, 4) as u32;

    Some(LtcEvent {
        onset_age,
        duration_years,
        base_annual_cost: reference_annual_cost,
    })
}

/// Net LTC cost for `event` in a year at `age`, `years_since_reference`
/// years after the reference year used to anchor `base_annual_cost`.
/// Returns 0.0 outside the event's active window.
#[must_use]
pub fn annual_ltc_cost(
    event: &LtcEvent,
    age: u32,
    years_since_reference: u32,
    policy: Option<&LtcPolicy>,
) -> f64 {
    let active_end = event.onset_age + event.duration_years;
    if age < event.onset_age || age >= active_end {
        return 0.0;
    }

    let inflated_cost =
        event.base_annual_cost * (1.0 + LTC_COST_INFLATION_RATE).powi(years_since_reference as i32);

    match policy {
        Some(p) => (inflated_cost - p.annual_benefit_cap()).max(0.0),
        None => inflated_cost,
    }
}

/// Age-breakpoint, gender-multiplier premium table. Monotone
/// non-decreasing in age, as required since premiums only rise with
/// issue-age at purchase in this simplified single-point-of-sale model.
const PREMIUM_TABLE: &[(u32, f64)] = &[
    (40, 900.0),
    (50, 1_400.0),
    (55, 1_900.0),
    (60, 2_600.0),
    (65, 3_600.0),
    (70, 5_200.0),
    (75, 7_800.0),
];

/// Annual premium for ongoing LTC insurance coverage at `age`, scaled by
/// `gender` and the policy's benefit generosity.
#[must_use]
pub fn calculate_ltc_insurance_premium(
    age: u32,
    gender: Option<Gender>,
    health_status: HealthStatus,
    policy: &LtcPolicy,
) -> f64 {
    let base = premium_base_for_age(age);

    // Female policyholders historically file LTC claims more often, so
    // base premiums run slightly higher; male multiplier is slightly
    // below parity.
    let gender_multiplier = match gender {
        Some(Gender::Female) => 1.08,
        Some(Gender::Male) => 0.95,
        None => 1.0,
    };

    let health_multiplier = match health_status {
        HealthStatus::Excellent => 0.90,
        HealthStatus::Good => 1.0,
        HealthStatus::Fair => 1.20,
        HealthStatus::Poor => 1.45,
    };

    let benefit_scale =
        (policy.daily_benefit / 200.0) * (policy.benefit_period_years as f64 / 3.0);

    base * gender_multiplier * health_multiplier * benefit_scale.max(0.1)
}

fn premium_base_for_age(age: u32) -> f64 {
    if age <= PREMIUM_TABLE[0].0 {
        return PREMIUM_TABLE[0].1;
    }
    for window in PREMIUM_TABLE.windows(2) {
        let (age_lo, cost_lo) = window[0];
        let (age_hi, cost_hi) = window[1];
        if age <= age_hi {
            let t = (age - age_lo) as f64 / (age_hi - age_lo) as f64;
            return cost_lo + t * (cost_hi - cost_lo);
        }
    }
    let (last_age, last_cost) = *PREMIUM_TABLE.last().unwrap();
    let years_past = (age - last_age) as f64;
    // Beyond the table, premiums keep climbing ~6%/year (typical
    // attained-age-rated policy behavior).
    last_cost * 1.06_f64.powf(years_past)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::XorShift32;

    fn policy() -> LtcPolicy {
        LtcPolicy {
            daily_benefit: 200.0,
            benefit_period_years: 3,
            elimination_period_days: 90,
        }
    }

    #[test]
    fn premium_table_is_monotone_non_decreasing() {
        let mut prev = 0.0;
        for age in 40..=95 {
            let premium = premium_base_for_age(age);
            assert!(premium >= prev - 1e-9, "age {age}: {premium} < {prev}");
            prev = premium;
        }
    }

    #[test]
    fn event_probability_tracks_health_status() {
        let mut rng_poor = XorShift32::new(3);
        let mut rng_excellent = XorShift32::new(3);
        let n = 4000;
        let mut poor_events = 0;
        let mut excellent_events = 0;
        for _ in 0..n {
            if draw_ltc_event(&mut rng_poor, HealthStatus::Poor, 70, 90, 80_000.0).is_some() {
                poor_events += 1;
            }
            if draw_ltc_event(&mut rng_excellent, HealthStatus::Excellent, 70, 90, 80_000.0)
                .is_some()
            {
                excellent_events += 1;
            }
        }
        assert!(poor_events > excellent_events);
    }

    #[test]
    fn insurance_offset_caps_out_of_pocket_cost() {
        let event = LtcEvent {
            onset_age: 80,
            duration_years: 2,
            base_annual_cost: 90_000.0,
        };
        let uninsured = annual_ltc_cost(&event, 80, 0, None);
        let insured = annual_ltc_cost(&event, 80, 0, Some(&policy()));
        assert!(insured < uninsured);
        assert!(insured >= 0.0);
    }

    #[test]
    fn cost_outside_active_window_is_zero() {
        let event = LtcEvent {
            onset_age: 80,
            duration_years: 2,
            base_annual_cost: 90_000.0,
        };
        assert_eq!(annual_ltc_cost(&event, 79, 0, None), 0.0);
        assert_eq!(annual_ltc_cost(&event, 83, 0, None), 0.0);
    }
}
