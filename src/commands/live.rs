//! Live trading command

use anyhow::{Context, Result};
use tracing::{info, warn};

use gopax_breakout::exchange::GopaxClient;
use gopax_breakout::live::TradingLoop;
use gopax_breakout::Config;

pub fn run(config_path: Option<String>) -> Result<()> {
    let config = match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            Config::from_file(path)?
        }
        None => Config::from_env()?,
    };

    let credentials = config
        .credentials()
        .context("GOPAX_API_KEY and GOPAX_API_SECRET must be set for live trading")?;

    warn!("LIVE TRADING - REAL MONEY AT RISK");
    info!(
        pair = %config.trading.pair,
        k = config.trading.k,
        ma_window = config.trading.ma_window,
        cutover_hour = config.trading.cutover_hour,
        "starting trading loop"
    );

    let client = GopaxClient::new(credentials);
    let mut trading = TradingLoop::new(client, config.trading.clone())?;
    trading.run()?;

    Ok(())
}
