//! PMM Mister Controller Module
//!
//! Pure market making: symmetric buy and sell ladders quoted around the
//! current price, with inventory kept between a min and max base share.

pub mod advisor;
pub mod config;
pub mod levels;

pub use advisor::{suggest_pmm_params, PmmSuggestion};
pub use config::{format_spreads, parse_spreads, validate_config, PmmConfig, SpreadParseError};
pub use levels::{
    calculate_effective_spread, format_pmm_summary, generate_theoretical_levels, EffectiveSpread, PmmLevel,
    PmmLevelSet, PmmRequest, DEFAULT_MIN_NOTIONAL,
};
