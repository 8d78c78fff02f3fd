//! GOPAX breakout bot - main entry point
//!
//! This binary provides two subcommands:
//! - live: run the polling trading loop against the exchange
//! - backtest: replay the breakout rule over historical candles

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "gopax-breakout")]
#[command(about = "GOPAX volatility-breakout trading bot with backtesting", long_about = None)]
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
    /// Run the live trading loop (CAUTION - REAL MONEY!)
    Live {
        /// Path to configuration file (defaults to built-in config + env credentials)
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Backtest the breakout rule over historical candles
    Backtest {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Trading pair (overrides config), e.g. "ETH-KRW"
        #[arg(short, long)]
        pair: Option<String>,

        /// Days of history to replay
        #[arg(short, long)]
        days: Option<i64>,

        /// Single threshold to test instead of the 0.1..0.9 sweep
        #[arg(short, long)]
        k: Option<f64>,

        /// Write the per-day candle/target table to this CSV file
        #[arg(short, long)]
        export: Option<String>,
    },
}

fn setup_logging(verbose: bool, command_name: &str) -> Result<()> {
    std::fs::create_dir_all("logs")?;

    // Log file naming pattern: {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    // Filter out noisy external crates
    let level = if verbose { "debug" } else { "info" };
    let filter_str = format!(
        "{},hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn,h2=warn",
        level
    );
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true);

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

    info!("Logging initialized");
    info!("Log file: {}", log_path.display());

    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let command_name = match &cli.command {
        Commands::Live { .. } => "live",
        Commands::Backtest { .. } => "backtest",
    };

    setup_logging(cli.verbose, command_name)?;

    match cli.command {
        Commands::Live { config } => commands::live::run(config),

        Commands::Backtest {
            config,
            pair,
            days,
            k,
            export,
        } => commands::backtest::run(config, pair, days, k, export),
    }
}
