pub mod bands;
pub mod cashflow_map;
pub mod monte_carlo;
pub mod social_security;

pub use bands::{calculate_retirement_bands, calculate_retirement_bands_optimization};
pub use cashflow_map::cashflow_map as cashflow_map_handler;
pub use monte_carlo::simulate_retirement_monte_carlo;
pub use social_security::calculate_cumulative_ss_optimization;
