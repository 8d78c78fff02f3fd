//! Volatility breakout strategy
//!
//! Pure functions over a candle sequence, shared by the live trading loop
//! and the backtester. No network access and no mutable state.
//!
//! The target price is the classic Larry Williams breakout threshold:
//! today's open plus a fraction `k` of yesterday's range. A buy is
//! signalled when the current price is above both the target and the
//! trailing moving average of closes.

use crate::indicators::sma;
use crate::types::{Candle, StrategyError};
use serde::{Deserialize, Serialize};

/// Default breakout threshold fraction
pub const DEFAULT_K: f64 = 0.5;
/// Default moving average window in days
pub const DEFAULT_MA_WINDOW: usize = 5;

/// How the moving average picks its value from the rolling series.
///
/// The original implementation fetched six days of candles, computed a
/// rolling 5-day mean and then read the series at a fixed index, which
/// averages the *oldest* five closes of the slice rather than the most
/// recent complete ones. Whether that was intended is unresolved, so both
/// interpretations are supported and the historical one stays the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaMode {
    /// Rolling-mean series read at index `window - 1` (historical behavior)
    #[default]
    FixedIndex,
    /// Mean of the last `window` closes, excluding the final (incomplete) candle
    LatestComplete,
}

/// Evaluation of one polling tick against the strategy state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Hold,
}

/// Breakout target price: `today.open + (yesterday.high - yesterday.low) * k`.
///
/// `candles` must be chronological with the current (incomplete) day last.
pub fn target_price(candles: &[Candle], k: f64) -> Result<f64, StrategyError> {
    if candles.len() < 2 {
        return Err(StrategyError::InsufficientCandles {
            required: 2,
            actual: candles.len(),
        });
    }

    let today = &candles[candles.len() - 1];
    let yesterday = &candles[candles.len() - 2];

    Ok(today.open + (yesterday.high - yesterday.low) * k)
}

/// Trailing moving average of closes, resolved per `mode`.
pub fn moving_average(
    candles: &[Candle],
    window: usize,
    mode: MaMode,
) -> Result<f64, StrategyError> {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

    match mode {
        MaMode::FixedIndex => {
            if closes.len() < window {
                return Err(StrategyError::InsufficientCandles {
                    required: window,
                    actual: closes.len(),
                });
            }
            let series = sma(&closes, window);
            // First defined entry of the rolling series
            series[window - 1].ok_or(StrategyError::InsufficientCandles {
                required: window,
                actual: closes.len(),
            })
        }
        MaMode::LatestComplete => {
            // The final candle is the in-progress day and is excluded
            if closes.len() < window + 1 {
                return Err(StrategyError::InsufficientCandles {
                    required: window + 1,
                    actual: closes.len(),
                });
            }
            let complete = &closes[..closes.len() - 1];
            let tail = &complete[complete.len() - window..];
            Ok(tail.iter().sum::<f64>() / window as f64)
        }
    }
}

/// Breakout signal: buy only when the current price exceeds both the
/// target price and the moving average.
pub fn breakout_signal(current_price: f64, target_price: f64, moving_average: f64) -> Signal {
    if current_price > target_price && current_price > moving_average {
        Signal::Buy
    } else {
        Signal::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, Utc};

    fn candles_from_ohlc(rows: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
        let start = Utc::now() - Duration::days(rows.len() as i64);
        rows.iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| Candle {
                open_time: start + Duration::days(i as i64),
                open,
                high,
                low,
                close,
                volume: 1.0,
            })
            .collect()
    }

    fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
        candles_from_ohlc(
            &closes
                .iter()
                .map(|&c| (c, c + 1.0, c - 1.0, c))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_target_price_reference_values() {
        // yesterday: high 110, low 90; today: open 100; k = 0.5 -> 110
        let candles = candles_from_ohlc(&[(95.0, 110.0, 90.0, 100.0), (100.0, 105.0, 99.0, 101.0)]);
        let target = target_price(&candles, 0.5).unwrap();
        assert_relative_eq!(target, 110.0);
    }

    #[test]
    fn test_target_price_scales_with_k() {
        let candles = candles_from_ohlc(&[(95.0, 110.0, 90.0, 100.0), (100.0, 105.0, 99.0, 101.0)]);
        assert_relative_eq!(target_price(&candles, 0.1).unwrap(), 102.0);
        assert_relative_eq!(target_price(&candles, 0.9).unwrap(), 118.0);
    }

    #[test]
    fn test_target_price_requires_two_candles() {
        let candles = candles_from_ohlc(&[(100.0, 105.0, 99.0, 101.0)]);
        assert!(matches!(
            target_price(&candles, 0.5),
            Err(StrategyError::InsufficientCandles {
                required: 2,
                actual: 1
            })
        ));
        assert!(target_price(&[], 0.5).is_err());
    }

    #[test]
    fn test_moving_average_five_closes() {
        let candles = candles_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let ma = moving_average(&candles, 5, MaMode::FixedIndex).unwrap();
        assert_relative_eq!(ma, 3.0);
    }

    #[test]
    fn test_moving_average_fixed_index_uses_oldest_window() {
        // Six closes fetched; the historical mode averages the first five
        let candles = candles_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]);
        let ma = moving_average(&candles, 5, MaMode::FixedIndex).unwrap();
        assert_relative_eq!(ma, 3.0);
    }

    #[test]
    fn test_moving_average_latest_complete_excludes_last() {
        // Last candle (in-progress day) excluded; mean of [2,3,4,5,6]
        let candles = candles_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 100.0]);
        let ma = moving_average(&candles, 5, MaMode::LatestComplete).unwrap();
        assert_relative_eq!(ma, 4.0);
    }

    #[test]
    fn test_moving_average_insufficient_data() {
        let candles = candles_from_closes(&[1.0, 2.0, 3.0]);
        assert!(moving_average(&candles, 5, MaMode::FixedIndex).is_err());
        assert!(moving_average(&candles, 5, MaMode::LatestComplete).is_err());

        // LatestComplete needs one more candle than FixedIndex
        let five = candles_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(moving_average(&five, 5, MaMode::FixedIndex).is_ok());
        assert!(moving_average(&five, 5, MaMode::LatestComplete).is_err());
    }

    #[test]
    fn test_breakout_signal_requires_both_conditions() {
        assert_eq!(breakout_signal(120.0, 110.0, 100.0), Signal::Buy);
        // above target but below MA
        assert_eq!(breakout_signal(105.0, 100.0, 110.0), Signal::Hold);
        // above MA but below target
        assert_eq!(breakout_signal(105.0, 110.0, 100.0), Signal::Hold);
        // equality is not a breakout
        assert_eq!(breakout_signal(110.0, 110.0, 100.0), Signal::Hold);
    }
}
