//! Deterministic Monte Carlo retirement simulation engine.
//!
//! This crate answers one quantitative question for a household: given a
//! financial profile and a set of planning variables, what is the
//! probability that the portfolio sustains desired spending through
//! end-of-life, and what is the distribution of outcomes along the way?
//!
//! The engine composes stochastic market returns, regime-switching
//! dynamics, stochastic longevity, long-term-care shocks, tax-aware
//! withdrawal sequencing, RMDs, Social Security COLA, IRMAA, and
//! Guyton-Klinger guardrails into a single per-trial scenario kernel, then
//! aggregates thousands of trials into a success probability and
//! percentile bands. A separate entry point computes a Social Security
//! claim-age optimizer.
//!
//! Every source of randomness in this crate flows through [`rng`]; see
//! that module's lint note before touching the return, regime, mortality,
//! LTC, withdrawal, scenario, or simulation modules.

#![warn(clippy::all)]

pub mod aggregator;
pub mod cma;
pub mod config;
pub mod error;
pub mod ltc;
pub mod model;
pub mod mortality;
pub mod optimization;
pub mod regime;
pub mod returns;
pub mod rng;
pub mod scenario;
pub mod simulation;
pub mod taxes;
pub mod withdrawal;

pub use cma::Cma;
pub use config::{profile_to_retirement_params, EngineConfig, MonteCarloValidator};
pub use error::{EngineError, FieldError, Result};
pub use model::{MonteCarloResult, Profile, RetirementParams};
pub use simulation::{run_simulation, SimulationBatch, SimulationConfig};
