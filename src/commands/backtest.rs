//! Backtest command implementation

use anyhow::Result;
use tracing::info;

use gopax_breakout::exchange::{ExchangeApi, GopaxClient};
use gopax_breakout::types::Pair;
use gopax_breakout::{backtest, Config};

pub fn run(
    config_path: Option<String>,
    pair_override: Option<String>,
    days_override: Option<i64>,
    k_override: Option<f64>,
    export_override: Option<String>,
) -> Result<()> {
    let config = match config_path {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    let pair = pair_override
        .map(Pair::new)
        .unwrap_or_else(|| config.trading.pair.clone());
    let days = days_override.unwrap_or(config.backtest.days);

    info!("Fetching {} days of daily candles for {}", days, pair);
    let client = GopaxClient::public();
    let candles = client.get_candles(&pair, days)?;
    info!("Fetched {} candles", candles.len());

    let export_path = export_override.or_else(|| config.backtest.export_path.clone());
    if let Some(path) = export_path {
        let table_k = k_override.unwrap_or(config.trading.k);
        let rows = backtest::build_table(&candles, table_k)?;
        backtest::export_table_csv(&rows, &path)?;
        info!("Exported candle/target table (k = {}) to {}", table_k, path);
    }

    let ks = match k_override {
        Some(k) => vec![k],
        None => backtest::default_k_values(),
    };
    let results = backtest::sweep(&candles, &ks)?;

    println!("\n{}", "=".repeat(32));
    println!("BREAKOUT BACKTEST  {}  {}d", pair, days);
    println!("{}", "=".repeat(32));
    println!("{:>4}  {:>12}", "k", "ROR");
    for (k, ror) in results {
        println!("{:>4.1}  {:>12.6}", k, ror);
    }
    println!("{}", "=".repeat(32));

    Ok(())
}
