//! Domain types shared across the engine: the input `Profile`, the derived
//! `RetirementParams`, per-trial mutable state, and the records trials and
//! the aggregator exchange.

pub mod cashflow;
pub mod params;
pub mod profile;
pub mod results;
pub mod rmd;
pub mod state;

pub use cashflow::{AdjustmentReason, AdjustmentType, YearlyCashflow};
pub use params::{AssetBuckets, OwnerMap, RetirementParams, SocialSecurityParams, TaxConfig};
pub use profile::{
    Allocation, Asset, AssetKind, FilingStatus, Gender, HealthStatus, MaritalStatus, Owner,
    Profile, SocialSecurityInput, TaxBracket, TaxBucket,
};
pub use results::{
    ConfidenceIntervals, LtcAnalysis, MonteCarloResult, PercentileBand, Scenarios,
};
pub use rmd::RmdTable;
pub use state::{KernelPhase, LtcStatus, MagiHistory, Regime, TrialState};
