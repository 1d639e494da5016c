//! Grid Strike Controller Module
//!
//! Grid Strike places orders across a fixed price band (start to end) with a
//! limit price acting as stop. LONG grids buy low and sell high, SHORT grids the
//! reverse.

pub mod advisor;
pub mod config;
pub mod levels;

pub use advisor::{suggest_grid_params, GridSuggestion};
pub use config::{calculate_auto_prices, validate_config, AutoPrices, GridStrikeConfig, TripleBarrierConfig};
pub use levels::{format_grid_summary, generate_theoretical_grid, GridLevel, GridLevelSet, GridRequest};
