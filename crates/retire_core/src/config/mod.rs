//! Parameter mapping, validation, and process-wide engine configuration
//! (C11, ambient C16).

pub mod engine_config;
pub mod mapper;
pub mod validator;

pub use engine_config::EngineConfig;
pub use mapper::profile_to_retirement_params;
pub use validator::{MonteCarloValidator, ValidationOutcome};
