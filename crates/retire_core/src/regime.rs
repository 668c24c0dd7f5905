//! Four-state Markov regime model (C4): Bull/Normal/Bear/Crisis, with an
//! initial distribution tilted by years-to-retirement and a fixed
//! row-stochastic transition matrix.

use crate::model::Regime;
use crate::rng::RetireRng;

#[derive(Debug, Clone, Copy)]
pub struct RegimeParameters {
    pub mean_return: f64,
    pub volatility: f64,
    pub average_duration_years: f64,
}

/// Per-regime mean return / volatility / average duration. Constants,
/// covered by unit tests per §4.4.
#[must_use]
pub fn regime_parameters(regime: Regime) -> RegimeParameters {
    match regime {
        Regime::Bull => RegimeParameters {
            mean_return: 0.14,
            volatility: 0.11,
            average_duration_years: 6.0,
        },
        Regime::Normal => RegimeParameters {
            mean_return: 0.07,
            volatility: 0.14,
            average_duration_years: 4.0,
        },
        Regime::Bear => RegimeParameters {
            mean_return: -0.08,
            volatility: 0.22,
            average_duration_years: 1.5,
        },
        Regime::Crisis => RegimeParameters {
            mean_return: -0.28,
            volatility: 0.35,
            average_duration_years: 0.75,
        },
    }
}

/// Row-stochastic 4x4 transition matrix, rows/columns ordered
/// Bull/Normal/Bear/Crisis. Each row sums to 1.0 within 1e-9.
const TRANSITION_MATRIX: [[f64; 4]; 4] = [
    // from Bull
    [0.80, 0.15, 0.04, 0.01],
    // from Normal
    [0.12, 0.74, 0.12, 0.02],
    // from Bear
    [0.10, 0.25, 0.55, 0.10],
    // from Crisis
    [0.05, 0.20, 0.35, 0.40],
];

/// Draw the next year's regime given the current one.
pub fn transition(rng: &mut impl RetireRng, current: Regime) -> Regime {
    let row = TRANSITION_MATRIX[current.index()];
    sample_from_row(rng, row)
}

fn sample_from_row(rng: &mut impl RetireRng, row: [f64; 4]) -> Regime {
    let u = rng.uniform();
    let mut cumulative = 0.0;
    for (i, p) in row.iter().enumerate() {
        cumulative += p;
        if u < cumulative {
            return Regime::from_index(i);
        }
    }
    Regime::from_index(3)
}

/// Initial regime distribution, tilted bearish when `years_to_retirement`
/// is small and bullish when large.
pub fn initial_regime(rng: &mut impl RetireRng, years_to_retirement: i64) -> Regime {
    let t = (years_to_retirement as f64 / 20.0).clamp(0.0, 1.0);
    // At t=0 (retiring now / already retired): tilt bearish.
    // At t=1 (20+ years out): tilt bullish.
    let bull = 0.15 + 0.35 * t;
    let normal = 0.45;
    let bear = 0.30 - 0.20 * t;
    let crisis = 1.0 - bull - normal - bear;
    sample_from_row(rng, [bull, normal, bear, crisis.max(0.0)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::XorShift32;

    #[test]
    fn transition_matrix_rows_sum_to_one() {
        for row in TRANSITION_MATRIX {
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "row sum {sum}");
        }
    }

    #[test]
    fn crisis_has_the_worst_mean_and_highest_vol() {
        let crisis = regime_parameters(Regime::Crisis);
        for r in [Regime::Bull, Regime::Normal, Regime::Bear] {
            let p = regime_parameters(r);
            assert!(crisis.mean_return < p.mean_return);
            assert!(crisis.volatility > p.volatility);
        }
    }

    #[test]
    fn initial_regime_tilts_bearish_near_retirement() {
        let mut rng = XorShift32::new(1);
        let mut near_counts = [0usize; 4];
        let mut far_counts = [0usize; 4];
        for i in 0..5000 {
            let mut near_rng = XorShift32::new(1000 + i);
            let mut far_rng = XorShift32::new(5000 + i);
            near_counts[initial_regime(&mut near_rng, 0).index()] += 1;
            far_counts[initial_regime(&mut far_rng, 30).index()] += 1;
        }
        let _ = rng.uniform();
        // Bull share should be higher far from retirement than near it.
        let near_bull = near_counts[0] as f64 / 5000.0;
        let far_bull = far_counts[0] as f64 / 5000.0;
        assert!(far_bull > near_bull);
    }

    #[test]
    fn stationary_distribution_is_a_probability_vector() {
        // Power-iterate the transition matrix from a uniform start to
        // sanity-check it converges to a proper probability vector.
        let mut dist = [0.25; 4];
        for _ in 0..500 {
            let mut next = [0.0; 4];
            for (i, row) in TRANSITION_MATRIX.iter().enumerate() {
                for (j, p) in row.iter().enumerate() {
                    next[j] += dist[i] * p;
                }
            }
            dist = next;
        }
        let sum: f64 = dist.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(dist.iter().all(|&p| p >= 0.0));
    }
}
