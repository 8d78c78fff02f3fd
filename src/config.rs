//! Configuration management
//!
//! Handles loading and parsing of JSON configuration files with environment
//! variable support for API credentials.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::gopax::Credentials;
use crate::strategy::{MaMode, DEFAULT_K, DEFAULT_MA_WINDOW};
use crate::types::Pair;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub trading: TradingConfig,
    #[serde(default)]
    pub backtest: BacktestConfig,
}

impl Config {
    /// Load configuration from JSON file.
    ///
    /// `GOPAX_API_KEY` / `GOPAX_API_SECRET` environment variables override
    /// anything in the file, so secrets can stay out of it entirely.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        let mut config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Built-in defaults plus environment credentials
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(api_key) = std::env::var("GOPAX_API_KEY") {
            self.exchange.api_key = Some(api_key);
        }
        if let Ok(api_secret) = std::env::var("GOPAX_API_SECRET") {
            self.exchange.api_secret = Some(api_secret);
        }
    }

    fn validate(&self) -> Result<()> {
        if self.trading.cutover_hour >= 24 {
            anyhow::bail!(
                "cutover_hour must be 0..=23, got {}",
                self.trading.cutover_hour
            );
        }
        if !(0.0..=1.0).contains(&self.trading.k) {
            anyhow::bail!("k must be within [0, 1], got {}", self.trading.k);
        }
        if self.trading.ma_window == 0 {
            anyhow::bail!("ma_window must be positive");
        }
        if self.trading.heartbeat_ticks == 0 {
            anyhow::bail!("heartbeat_ticks must be positive");
        }
        // zero would turn the polling loop into a sleepless hammer on the API
        if self.trading.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be positive");
        }
        Ok(())
    }

    /// Credentials, if both key and secret are configured
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.exchange.api_key, &self.exchange.api_secret) {
            (Some(key), Some(secret)) => Some(Credentials::new(key.clone(), secret.clone())),
            _ => None,
        }
    }
}

/// Exchange API credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExchangeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<String>,
}

/// Live trading parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Trading pair, e.g. "BTC-KRW"
    pub pair: Pair,
    /// Breakout threshold fraction of yesterday's range
    pub k: f64,
    /// Moving average window in days
    pub ma_window: usize,
    /// Which reading of the rolling moving average to use
    #[serde(default)]
    pub ma_mode: MaMode,
    /// Days of daily candles fetched for each recompute
    pub candle_days: i64,
    /// Local hour of the daily cutover
    pub cutover_hour: u32,
    /// Seconds between polling ticks
    pub poll_interval_secs: u64,
    /// Ticks between heartbeat log lines
    pub heartbeat_ticks: u64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        TradingConfig {
            pair: Pair::new("BTC-KRW"),
            k: DEFAULT_K,
            ma_window: DEFAULT_MA_WINDOW,
            ma_mode: MaMode::default(),
            // one more day than the MA window, so the rolling series has
            // exactly one defined entry in the historical mode
            candle_days: 6,
            cutover_hour: 6,
            poll_interval_secs: 1,
            heartbeat_ticks: 1800,
        }
    }
}

/// Backtest parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Days of history to replay
    pub days: i64,
    /// Optional CSV export path for the candle/target table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_path: Option<String>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            days: 365,
            export_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.trading.pair.as_str(), "BTC-KRW");
        assert_eq!(config.trading.k, 0.5);
        assert_eq!(config.trading.ma_window, 5);
        assert!(config.credentials().is_none());
    }

    #[test]
    fn test_parse_partial_config() {
        let json = r#"{
            "trading": {
                "pair": "ETH-KRW",
                "k": 0.3,
                "ma_window": 5,
                "candle_days": 6,
                "cutover_hour": 6,
                "poll_interval_secs": 1,
                "heartbeat_ticks": 1800
            }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.trading.pair.as_str(), "ETH-KRW");
        assert_eq!(config.trading.k, 0.3);
        assert_eq!(config.trading.ma_mode, MaMode::FixedIndex);
        assert_eq!(config.backtest.days, 365);
    }

    #[test]
    fn test_invalid_cutover_hour_rejected() {
        let mut config = Config::default();
        config.trading.cutover_hour = 24;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_k_rejected() {
        let mut config = Config::default();
        config.trading.k = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let mut config = Config::default();
        config.trading.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_credentials_require_both_parts() {
        let mut config = Config::default();
        config.exchange.api_key = Some("key".to_string());
        assert!(config.credentials().is_none());

        config.exchange.api_secret = Some("secret".to_string());
        assert!(config.credentials().is_some());
    }

    #[test]
    fn test_ma_mode_parses_snake_case() {
        let json = r#""latest_complete""#;
        let mode: MaMode = serde_json::from_str(json).unwrap();
        assert_eq!(mode, MaMode::LatestComplete);
    }
}
