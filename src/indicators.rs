//! Technical indicators
//!
//! Only the rolling simple moving average is needed here; entries before
//! a full window are `None`, mirroring how a rolling mean over a series
//! leaves the head undefined.

/// Calculate Simple Moving Average
pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = Vec::with_capacity(values.len());

    for i in 0..values.len() {
        if i + 1 < period {
            result.push(None);
        } else {
            let sum: f64 = values[i + 1 - period..=i].iter().sum();
            result.push(Some(sum / period as f64));
        }
    }

    result
}
