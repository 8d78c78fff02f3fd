//! Core data types used across the trading system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for candle data
#[derive(Debug, Error)]
pub enum CandleValidationError {
    #[error("high ({high}) must be >= low ({low})")]
    HighLessThanLow { high: f64, low: f64 },

    #[error("volume ({0}) must be >= 0")]
    NegativeVolume(f64),

    #[error("prices must be positive: open={open}, high={high}, low={low}, close={close}")]
    NonPositivePrice {
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },
}

/// Daily OHLCV candlestick as returned by the exchange candles endpoint.
///
/// Sequences are chronological, oldest first; the last element is the
/// current (possibly incomplete) period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Interval start time
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Create a new candle with validation
    pub fn new(
        open_time: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, CandleValidationError> {
        let candle = Self {
            open_time,
            open,
            high,
            low,
            close,
            volume,
        };
        candle.validate()?;
        Ok(candle)
    }

    /// Validate the candle data
    pub fn validate(&self) -> Result<(), CandleValidationError> {
        if self.open <= 0.0 || self.high <= 0.0 || self.low <= 0.0 || self.close <= 0.0 {
            return Err(CandleValidationError::NonPositivePrice {
                open: self.open,
                high: self.high,
                low: self.low,
                close: self.close,
            });
        }

        if self.high < self.low {
            return Err(CandleValidationError::HighLessThanLow {
                high: self.high,
                low: self.low,
            });
        }

        if self.volume < 0.0 {
            return Err(CandleValidationError::NegativeVolume(self.volume));
        }

        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Trading pair symbol in GOPAX format, e.g. "BTC-KRW"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pair(String);

impl Pair {
    pub fn new(s: impl Into<String>) -> Self {
        Pair(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Base asset, the part before the dash ("BTC" for "BTC-KRW")
    pub fn base(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }

    /// Quote asset, the part after the dash ("KRW" for "BTC-KRW")
    pub fn quote(&self) -> &str {
        self.0.split('-').nth(1).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for Pair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

/// Order execution type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Limit,
    Market,
}

/// Errors from the strategy engine
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("need at least {required} candles, got {actual}")]
    InsufficientCandles { required: usize, actual: usize },
}

/// Errors from the backtest accumulator. Malformed or insufficient
/// historical data fails the whole computation; there is no recovery.
#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("need at least {required} candles to backtest, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },

    #[error("candle {index}: {source}")]
    InvalidCandle {
        index: usize,
        source: CandleValidationError,
    },

    #[error("non-positive target price {target} at day {index}")]
    NonPositiveTarget { index: usize, target: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open: f64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
        Candle {
            open_time: Utc::now(),
            open,
            high,
            low,
            close,
            volume,
        }
    }

    #[test]
    fn test_valid_candle() {
        assert!(candle(100.0, 110.0, 90.0, 105.0, 1.5).is_valid());
    }

    #[test]
    fn test_high_below_low_rejected() {
        let c = candle(100.0, 90.0, 110.0, 105.0, 1.5);
        assert!(matches!(
            c.validate(),
            Err(CandleValidationError::HighLessThanLow { .. })
        ));
    }

    #[test]
    fn test_negative_volume_rejected() {
        let c = candle(100.0, 110.0, 90.0, 105.0, -1.0);
        assert!(matches!(
            c.validate(),
            Err(CandleValidationError::NegativeVolume(_))
        ));
    }

    #[test]
    fn test_non_positive_price_rejected() {
        let c = candle(0.0, 110.0, 90.0, 105.0, 1.0);
        assert!(matches!(
            c.validate(),
            Err(CandleValidationError::NonPositivePrice { .. })
        ));
    }

    #[test]
    fn test_pair_split() {
        let pair = Pair::new("BTC-KRW");
        assert_eq!(pair.base(), "BTC");
        assert_eq!(pair.quote(), "KRW");
        assert_eq!(pair.to_string(), "BTC-KRW");
    }

    #[test]
    fn test_side_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"buy\"");
        assert_eq!(
            serde_json::to_string(&OrderType::Market).unwrap(),
            "\"market\""
        );
    }
}
