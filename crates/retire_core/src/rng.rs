//! Deterministic RNG and variance-reduction machinery (C1).
//!
//! A lint-style rule for this crate: `rand::rng()`/`rand::thread_rng()` (or
//! any other uncontrolled source of randomness) must never appear in
//! `returns.rs`, `regime.rs`, `mortality.rs`, `ltc.rs`, `withdrawal.rs`,
//! `scenario.rs`, or `simulation.rs` — every draw flows through a
//! [`RetireRng`] seeded (directly or via [`derive_rng`]) from
//! `RetirementParams::random_seed`. This is what makes a trial replayable
//! from its seed alone.

use rustc_hash::FxHashMap;

/// Variate kinds tracked separately by recording/replay tapes and by
/// antithetic mirroring, since exponential and Poisson draws are not
/// mirror-symmetric the way uniform/normal/Student-t draws are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variate {
    Uniform,
    Normal,
    StudentT,
    Exponential,
    Poisson,
    RandomInt,
}

/// Common interface every RNG flavor in this module implements: the plain
/// [`XorShift32`] core, [`RecordingRng`], [`ReplayRng`], [`AntitheticRng`],
/// and [`OverlayRng`].
pub trait RetireRng {
    /// Uniform draw in `[0, 1)`.
    fn uniform(&mut self) -> f64;

    /// Standard normal draw via Box-Muller on two uniforms, both clamped to
    /// `>= 1e-12` so the log never blows up.
    fn normal(&mut self) -> f64 {
        let u1 = self.uniform().max(1e-12);
        let u2 = self.uniform().max(1e-12);
        (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }

    /// Student-t draw with `df` degrees of freedom, built from a normal
    /// draw and an independent chi-squared draw (sum of `df` squared
    /// normals), so it shares this RNG's uniform stream end to end.
    fn student_t(&mut self, df: f64) -> f64 {
        let z = self.normal();
        let mut chi_sq = 0.0;
        let whole = df.floor() as u64;
        for _ in 0..whole {
            let n = self.normal();
            chi_sq += n * n;
        }
        let frac = df - whole as f64;
        if frac > 0.0 {
            chi_sq += frac * self.normal().powi(2);
        }
        let denom = (chi_sq / df).sqrt();
        if denom <= 0.0 { z } else { z / denom }
    }

    /// Exponential draw via inverse-CDF sampling. Not mirrored under
    /// antithetic replay.
    fn exponential(&mut self, lambda: f64) -> f64 {
        let u = self.uniform().max(1e-12);
        -u.ln() / lambda
    }

    /// Poisson draw via Knuth's algorithm. Not mirrored under antithetic
    /// replay.
    fn poisson(&mut self, lambda: f64) -> u64 {
        let l = (-lambda).exp();
        let mut k = 0u64;
        let mut p = 1.0;
        loop {
            k += 1;
            p *= self.uniform();
            if p <= l {
                return k - 1;
            }
        }
    }

    /// Uniform integer in `[min, max]` inclusive.
    fn random_int(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f64;
        min + (self.uniform() * span).floor() as i64
    }
}

/// XorShift32 core PRNG. Chosen over a richer generator because its output
/// is a pure function of a 32-bit word with no platform-dependent behavior
/// (no `f64` intermediate state, no OS entropy), which is what lets the
/// engine promise bitwise-identical streams across platforms for a given
/// seed.
#[derive(Debug, Clone, Copy)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    #[must_use]
    pub fn new(seed: u32) -> Self {
        // XorShift32 is undefined at state == 0; perturb deterministically.
        Self {
            state: if seed == 0 { 0x9E37_79B9 } else { seed },
        }
    }

    #[inline]
    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }
}

impl RetireRng for XorShift32 {
    fn uniform(&mut self) -> f64 {
        f64::from(self.next_u32()) / f64::from(u32::MAX)
    }
}

/// Stable 32-bit hash of a `label|salt` string, used by [`derive_rng`] to
/// build independent child streams. Not cryptographic; only needs to be
/// a deterministic, well-mixed function of its input.
fn hash_label(label: &str, salt: u32) -> u32 {
    // FNV-1a
    let mut hash: u32 = 0x811c_9dc5;
    for byte in label.as_bytes() {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    for byte in salt.to_le_bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

/// Derive a child RNG from a parent stream and a stable label/salt pair.
///
/// Same parent state + same label + same salt always yields the same child
/// seed, which is what lets sub-streams (per-trial, per-component) be
/// produced independently of iteration order or worker assignment.
pub fn derive_rng(parent: &mut impl RetireRng, label: &str, salt: u32) -> XorShift32 {
    let label_hash = hash_label(label, salt);
    let u1 = parent.uniform();
    let u2 = parent.uniform();
    let mixed = label_hash
        ^ (u1 * f64::from(u32::MAX)) as u32
        ^ ((u2 * f64::from(u32::MAX)) as u32).rotate_left(16);
    XorShift32::new(mixed)
}

/// Seed a root RNG directly from a label with no parent stream (used when
/// there is no natural parent, e.g. seeding the very first derivation from
/// `RetirementParams::random_seed`).
#[must_use]
pub fn root_rng(seed: u32, label: &str) -> XorShift32 {
    XorShift32::new(seed ^ hash_label(label, 0))
}

/// Wraps any [`RetireRng`] and records every draw onto a per-variate tape,
/// so a later [`ReplayRng`] (or [`AntitheticRng`]) can reproduce or mirror
/// the exact sequence.
pub struct RecordingRng<R> {
    inner: R,
    tapes: FxHashMap<Variate, Vec<f64>>,
}

impl<R: RetireRng> RecordingRng<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            tapes: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn into_tapes(self) -> FxHashMap<Variate, Vec<f64>> {
        self.tapes
    }

    fn record(&mut self, variate: Variate, value: f64) -> f64 {
        self.tapes.entry(variate).or_default().push(value);
        value
    }
}

impl<R: RetireRng> RetireRng for RecordingRng<R> {
    fn uniform(&mut self) -> f64 {
        let v = self.inner.uniform();
        self.record(Variate::Uniform, v)
    }

    fn normal(&mut self) -> f64 {
        let v = self.inner.normal();
        self.record(Variate::Normal, v)
    }

    fn student_t(&mut self, df: f64) -> f64 {
        let v = self.inner.student_t(df);
        self.record(Variate::StudentT, v)
    }

    fn exponential(&mut self, lambda: f64) -> f64 {
        let v = self.inner.exponential(lambda);
        self.record(Variate::Exponential, v)
    }

    fn poisson(&mut self, lambda: f64) -> u64 {
        let v = self.inner.poisson(lambda);
        self.record(Variate::Poisson, v as f64);
        v
    }

    fn random_int(&mut self, min: i64, max: i64) -> i64 {
        let v = self.inner.random_int(min, max);
        self.record(Variate::RandomInt, v as f64);
        v
    }
}

/// Consumes a recorded tape deterministically, one draw per variate call,
/// in recording order. Panics (via `expect`) if the tape runs dry, since
/// that indicates a replay driven by a different code path than the one
/// that produced the tape.
pub struct ReplayRng {
    tapes: FxHashMap<Variate, Vec<f64>>,
    cursors: FxHashMap<Variate, usize>,
}

impl ReplayRng {
    #[must_use]
    pub fn new(tapes: FxHashMap<Variate, Vec<f64>>) -> Self {
        Self {
            tapes,
            cursors: FxHashMap::default(),
        }
    }

    fn take(&mut self, variate: Variate) -> f64 {
        let cursor = self.cursors.entry(variate).or_insert(0);
        let tape = self
            .tapes
            .get(&variate)
            .expect("replay tape missing for variate");
        let value = tape
            .get(*cursor)
            .copied()
            .expect("replay tape exhausted for variate");
        *cursor += 1;
        value
    }
}

impl RetireRng for ReplayRng {
    fn uniform(&mut self) -> f64 {
        self.take(Variate::Uniform)
    }
    fn normal(&mut self) -> f64 {
        self.take(Variate::Normal)
    }
    fn student_t(&mut self, _df: f64) -> f64 {
        self.take(Variate::StudentT)
    }
    fn exponential(&mut self, _lambda: f64) -> f64 {
        self.take(Variate::Exponential)
    }
    fn poisson(&mut self, _lambda: f64) -> u64 {
        self.take(Variate::Poisson) as u64
    }
    fn random_int(&mut self, _min: i64, _max: i64) -> i64 {
        self.take(Variate::RandomInt) as i64
    }
}

/// Replays a recorded tape with antithetic mirroring applied to
/// uniform/normal/Student-t draws (`u -> 1-u`, `z -> -z`, `t -> -t`).
/// Exponential and Poisson draws are replayed unchanged, per the
/// specification (mirroring a rate-positive count/waiting-time variate has
/// no natural antithetic partner).
pub struct AntitheticRng {
    replay: ReplayRng,
}

impl AntitheticRng {
    #[must_use]
    pub fn new(tapes: FxHashMap<Variate, Vec<f64>>) -> Self {
        Self {
            replay: ReplayRng::new(tapes),
        }
    }
}

impl RetireRng for AntitheticRng {
    fn uniform(&mut self) -> f64 {
        1.0 - self.replay.uniform()
    }
    fn normal(&mut self) -> f64 {
        -self.replay.normal()
    }
    fn student_t(&mut self, df: f64) -> f64 {
        -self.replay.student_t(df)
    }
    fn exponential(&mut self, lambda: f64) -> f64 {
        self.replay.exponential(lambda)
    }
    fn poisson(&mut self, lambda: f64) -> u64 {
        self.replay.poisson(lambda)
    }
    fn random_int(&mut self, min: i64, max: i64) -> i64 {
        self.replay.random_int(min, max)
    }
}

/// Overrides the first `k` draws of specific variate kinds with fixed
/// values, then falls through to the wrapped RNG for everything after.
/// Used in calibration tests that need to pin the first few market draws
/// while leaving the rest of the trial stochastic.
pub struct OverlayRng<R> {
    inner: R,
    overrides: FxHashMap<Variate, Vec<f64>>,
    consumed: FxHashMap<Variate, usize>,
}

impl<R: RetireRng> OverlayRng<R> {
    #[must_use]
    pub fn new(inner: R, overrides: FxHashMap<Variate, Vec<f64>>) -> Self {
        Self {
            inner,
            overrides,
            consumed: FxHashMap::default(),
        }
    }

    fn overridden(&mut self, variate: Variate) -> Option<f64> {
        let idx = self.consumed.entry(variate).or_insert(0);
        let value = self.overrides.get(&variate).and_then(|v| v.get(*idx));
        if value.is_some() {
            *idx += 1;
        }
        value.copied()
    }
}

impl<R: RetireRng> RetireRng for OverlayRng<R> {
    fn uniform(&mut self) -> f64 {
        self.overridden(Variate::Uniform)
            .unwrap_or_else(|| self.inner.uniform())
    }
    fn normal(&mut self) -> f64 {
        self.overridden(Variate::Normal)
            .unwrap_or_else(|| self.inner.normal())
    }
    fn student_t(&mut self, df: f64) -> f64 {
        self.overridden(Variate::StudentT)
            .unwrap_or_else(|| self.inner.student_t(df))
    }
    fn exponential(&mut self, lambda: f64) -> f64 {
        self.overridden(Variate::Exponential)
            .unwrap_or_else(|| self.inner.exponential(lambda))
    }
    fn poisson(&mut self, lambda: f64) -> u64 {
        self.overridden(Variate::Poisson)
            .unwrap_or_else(|| self.inner.poisson(lambda) as f64) as u64
    }
    fn random_int(&mut self, min: i64, max: i64) -> i64 {
        self.overridden(Variate::RandomInt)
            .unwrap_or_else(|| self.inner.random_int(min, max) as f64) as i64
    }
}

/// Latin Hypercube stratification over `[0, 1)` for a designated risk
/// factor. Divides the unit interval into `strata` equal bins and draws a
/// single uniform within the bin assigned to this trial, so that across a
/// batch of `strata` trials the designated factor's draws cover the whole
/// interval evenly instead of clustering.
pub struct StratifiedSampler {
    strata: usize,
}

impl StratifiedSampler {
    #[must_use]
    pub fn new(strata: usize) -> Self {
        Self {
            strata: strata.max(1),
        }
    }

    /// Draw a stratified uniform for `trial_index` (0-based, wraps modulo
    /// `strata` for batches larger than the stratum count).
    pub fn sample(&self, rng: &mut impl RetireRng, trial_index: usize) -> f64 {
        let stratum = trial_index % self.strata;
        let width = 1.0 / self.strata as f64;
        let offset = stratum as f64 * width;
        offset + rng.uniform() * width
    }
}
