//! Controller advisor - main entry point
//!
//! This binary provides five subcommands:
//! - volatility: NATR and price statistics for a candle file
//! - grid: Evaluate (or suggest) a Grid Strike config
//! - pmm: Evaluate (or suggest) a PMM config
//! - validate: Structural checks on a controller config
//! - scan: Volatility and suggestions for every candle file in a directory

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use controller_advisor::volatility::{DEFAULT_ATR_PERIOD, DEFAULT_LOOKBACK};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "controller-advisor")]
#[command(about = "Volatility-driven parameters and level previews for Grid Strike and PMM controllers", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show volatility metrics for a candle file
    Volatility {
        /// Candle file (CSV or JSON)
        #[arg(long)]
        candles: PathBuf,

        /// ATR period
        #[arg(short, long, default_value_t = DEFAULT_ATR_PERIOD)]
        period: usize,

        /// Number of recent candles for price statistics
        #[arg(short, long, default_value_t = DEFAULT_LOOKBACK)]
        lookback: usize,
    },

    /// Evaluate a Grid Strike config
    Grid {
        /// Path to configuration file
        #[arg(short, long)]
        config: String,

        /// Candle file (overrides config)
        #[arg(long)]
        candles: Option<PathBuf>,

        /// Current price (overrides config and candles)
        #[arg(long)]
        price: Option<f64>,

        /// Replace range, spread and take profit with volatility suggestions
        #[arg(long)]
        suggest: bool,

        /// Print config and levels as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate a PMM config
    Pmm {
        /// Path to configuration file
        #[arg(short, long)]
        config: String,

        /// Candle file (overrides config)
        #[arg(long)]
        candles: Option<PathBuf>,

        /// Current price (overrides config and candles)
        #[arg(long)]
        price: Option<f64>,

        /// Portfolio value in quote currency
        #[arg(long)]
        portfolio_value: Option<f64>,

        /// Replace spreads, take profit and distances with volatility suggestions
        #[arg(long)]
        suggest: bool,

        /// Print config and levels as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a controller config
    Validate {
        /// Path to configuration file
        #[arg(short, long)]
        config: String,
    },

    /// Scan a data directory of <SYMBOL>_<timeframe>.csv files
    Scan {
        /// Data directory
        #[arg(short, long, default_value = "data")]
        data_dir: PathBuf,

        /// Timeframe suffix. E.g., "1h", "4h", "1d"
        #[arg(short, long, default_value = "1h")]
        timeframe: String,

        /// ATR period
        #[arg(short, long, default_value_t = DEFAULT_ATR_PERIOD)]
        period: usize,
    },
}

fn setup_logging(verbose: bool, command_name: &str) -> Result<()> {
    std::fs::create_dir_all("logs")?;

    // {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    let level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    // Console on stderr so report output on stdout stays clean
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true);

    // File layer - same format but without ANSI colors
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!("Log file: {}", log_path.display());

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let command_name = match &cli.command {
        Commands::Volatility { .. } => "volatility",
        Commands::Grid { .. } => "grid",
        Commands::Pmm { .. } => "pmm",
        Commands::Validate { .. } => "validate",
        Commands::Scan { .. } => "scan",
    };

    setup_logging(cli.verbose, command_name)?;

    match cli.command {
        Commands::Volatility {
            candles,
            period,
            lookback,
        } => commands::volatility::run(candles, period, lookback),

        Commands::Grid {
            config,
            candles,
            price,
            suggest,
            json,
        } => commands::grid::run(config, candles, price, suggest, json),

        Commands::Pmm {
            config,
            candles,
            price,
            portfolio_value,
            suggest,
            json,
        } => commands::pmm::run(config, candles, price, portfolio_value, suggest, json),

        Commands::Validate { config } => commands::validate::run(config),

        Commands::Scan {
            data_dir,
            timeframe,
            period,
        } => commands::scan::run(data_dir, timeframe, period),
    }
}
