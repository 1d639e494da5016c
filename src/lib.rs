//! Controller Advisor
//!
//! Deterministic parameter engine for Grid Strike and PMM market-making
//! controllers: volatility estimation from candles, range and spread
//! suggestions, quantization against venue trading rules, theoretical level
//! generation and structural config validation.

pub mod config;
pub mod controllers;
pub mod data;
pub mod indicators;
pub mod quantizer;
pub mod types;
pub mod volatility;

pub use config::Config;
pub use controllers::{Controller, ControllerConfig, ValidationError};
pub use quantizer::TradingRules;
pub use types::*;
