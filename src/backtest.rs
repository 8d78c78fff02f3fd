//! Breakout backtester
//!
//! Replays the volatility-breakout rule over a historical daily candle
//! sequence and compounds the per-day return into a single rate-of-return
//! multiplier. Unlike the live loop there is no recovery policy here:
//! malformed or insufficient history fails the whole computation.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::types::{BacktestError, Candle};

/// Default threshold sweep: 0.1 to 0.9 in steps of 0.1
pub fn default_k_values() -> Vec<f64> {
    (1..10).map(|i| i as f64 / 10.0).collect()
}

/// Per-day evaluation of the breakout rule
#[derive(Debug, Clone)]
pub struct BacktestRow {
    pub candle: Candle,
    /// `(high - low) * k` for this day
    pub range: f64,
    /// `open + previous day's range`; none for the first day
    pub target: Option<f64>,
    /// `close / target` if the high crossed the target, else 1
    pub ror: f64,
}

/// Evaluate the breakout rule for every day of the sequence.
///
/// Day 0 has no prior range and therefore no target; its return is 1.
pub fn build_table(candles: &[Candle], k: f64) -> Result<Vec<BacktestRow>, BacktestError> {
    for (index, candle) in candles.iter().enumerate() {
        candle
            .validate()
            .map_err(|source| BacktestError::InvalidCandle { index, source })?;
    }

    let mut rows = Vec::with_capacity(candles.len());
    let mut prev_range: Option<f64> = None;

    for (index, candle) in candles.iter().enumerate() {
        let range = (candle.high - candle.low) * k;
        let target = prev_range.map(|r| candle.open + r);

        let ror = match target {
            Some(target) if candle.high > target => {
                if target <= 0.0 {
                    return Err(BacktestError::NonPositiveTarget { index, target });
                }
                candle.close / target
            }
            _ => 1.0,
        };

        rows.push(BacktestRow {
            candle: candle.clone(),
            range,
            target,
            ror,
        });
        prev_range = Some(range);
    }

    Ok(rows)
}

/// Cumulative rate-of-return multiplier for threshold `k`.
///
/// The product runs over every day with a prior day, up to but excluding
/// the final candle, which is the in-progress period.
pub fn rate_of_return(candles: &[Candle], k: f64) -> Result<f64, BacktestError> {
    if candles.len() < 3 {
        return Err(BacktestError::InsufficientHistory {
            required: 3,
            actual: candles.len(),
        });
    }

    let rows = build_table(candles, k)?;
    let ror = rows[..rows.len() - 1].iter().map(|r| r.ror).product();

    debug!(k, ror, days = candles.len(), "computed rate of return");
    Ok(ror)
}

/// Rate of return for each threshold in `ks`, over the same candle sequence
pub fn sweep(candles: &[Candle], ks: &[f64]) -> Result<Vec<(f64, f64)>, BacktestError> {
    ks.iter()
        .map(|&k| rate_of_return(candles, k).map(|ror| (k, ror)))
        .collect()
}

/// Export the per-day candle/target table as CSV
pub fn export_table_csv(rows: &[BacktestRow], path: impl AsRef<Path>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())
        .with_context(|| format!("Failed to create {}", path.as_ref().display()))?;

    writer.write_record([
        "date", "low", "high", "open", "close", "volume", "range", "target", "ror",
    ])?;

    for row in rows {
        let c = &row.candle;
        writer.write_record([
            c.open_time.format("%Y-%m-%d").to_string(),
            c.low.to_string(),
            c.high.to_string(),
            c.open.to_string(),
            c.close.to_string(),
            c.volume.to_string(),
            row.range.to_string(),
            row.target.map(|t| t.to_string()).unwrap_or_default(),
            row.ror.to_string(),
        ])?;
    }

    writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}
