//! Per-trial mutable state (C9). Created at trial start, destroyed at trial
//! end; never shared across trials.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::model::params::OwnerMap;
use crate::model::profile::AssetKind;
use crate::model::{AssetBuckets, TaxBucket};

/// Hidden Markov regime governing the mean/volatility of annual returns
/// (C4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    Bull,
    Normal,
    Bear,
    Crisis,
}

impl Regime {
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Regime::Bull => 0,
            Regime::Normal => 1,
            Regime::Bear => 2,
            Regime::Crisis => 3,
        }
    }

    #[must_use]
    pub fn from_index(i: usize) -> Self {
        match i {
            0 => Regime::Bull,
            1 => Regime::Normal,
            2 => Regime::Bear,
            _ => Regime::Crisis,
        }
    }
}

/// Long-term-care event status for one household member within a trial
/// (C6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LtcStatus {
    None,
    Active { years_remaining: u32 },
    Past,
}

/// The three phases of the scenario kernel's state machine (C9, §9 design
/// note: an explicit state machine rather than implicit branches).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KernelPhase {
    Accumulate,
    Transition,
    Distribute,
    Terminated,
}

/// Ring buffer of MAGI values, indexed so that `magi_two_years_ago()`
/// answers the IRMAA lookback query directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MagiHistory {
    history: VecDeque<f64>,
}

impl MagiHistory {
    pub fn push(&mut self, magi: f64) {
        self.history.push_back(magi);
        // Keep only as much history as IRMAA's 2-year lookback ever needs
        // plus a little slack.
        while self.history.len() > 4 {
            self.history.pop_front();
        }
    }

    /// MAGI from two years before the most recent push, if available.
    #[must_use]
    pub fn two_years_ago(&self) -> Option<f64> {
        let len = self.history.len();
        if len < 3 {
            return None;
        }
        self.history.get(len - 3).copied()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialState {
    pub year: u32,
    pub user_age: u32,
    pub spouse_age: Option<u32>,

    pub buckets: OwnerMap<AssetBuckets>,

    pub regime: Regime,
    pub phase: KernelPhase,

    pub magi_history: MagiHistory,
    pub cola_index: f64,
    pub inflation_index: f64,

    pub ltc_status: LtcStatus,
    pub spouse_ltc_status: LtcStatus,

    pub end_of_life_age: u32,
    pub spouse_end_of_life_age: Option<u32>,

    pub initial_withdrawal_rate: f64,
    pub previous_year_return: f64,
}

impl TrialState {
    #[must_use]
    pub fn total_assets(&self) -> f64 {
        self.buckets.total()
    }

    #[must_use]
    pub fn horizon_age(&self) -> u32 {
        self.spouse_end_of_life_age
            .map_or(self.end_of_life_age, |s| s.max(self.end_of_life_age))
    }

    /// Route a dollar amount into the per-owner bucket matching `kind`'s
    /// tax treatment. Unknown (`Other`) kinds fall into capital-gains, the
    /// same bucket taxable brokerage uses, per the parameter mapper's
    /// fallback rule.
    pub fn deposit(&mut self, owner: crate::model::Owner, kind: &AssetKind, amount: f64) {
        let bucket = self.buckets.get_mut(owner);
        match kind.tax_bucket() {
            Some(TaxBucket::TaxDeferred) => bucket.tax_deferred += amount,
            Some(TaxBucket::TaxFree) => bucket.tax_free += amount,
            Some(TaxBucket::CapitalGains) => bucket.capital_gains += amount,
            Some(TaxBucket::CashEquivalents) => bucket.cash_equivalents += amount,
            None => {}
        }
    }
}
