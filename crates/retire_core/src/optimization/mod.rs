//! Standalone optimization entry points that sit beside the main Monte
//! Carlo engine rather than inside a single trial.

pub mod cashflow_map;
pub mod social_security;
pub mod withdrawal_rate;

pub use cashflow_map::{build_cashflow_map, CashflowMapEntry};
pub use social_security::{
    optimize_claim_age, optimize_couple_claim_ages, CoupleOptimizationResult,
    SocialSecurityOptimizationResult,
};
pub use withdrawal_rate::{find_sustainable_withdrawal_rate, WithdrawalRateSearch};
