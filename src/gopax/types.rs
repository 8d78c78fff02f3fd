//! Typed response schemas for the GOPAX REST API
//!
//! Every endpoint the bot consumes gets an explicit structure decoded at
//! the boundary; a schema mismatch fails the call with a decode error
//! instead of surfacing as an ad hoc lookup failure deep in the strategy.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Candle, OrderType, Pair, Side};

/// One candle row as the exchange serializes it:
/// `[open_time_ms, low, high, open, close, volume]`
#[derive(Debug, Clone, Deserialize)]
pub struct CandleRow(pub i64, pub f64, pub f64, pub f64, pub f64, pub f64);

#[derive(Debug, thiserror::Error)]
#[error("candle row has invalid open time {0}")]
pub struct BadCandleTime(pub i64);

impl CandleRow {
    /// Reorder the wire tuple into a `Candle`
    pub fn into_candle(self) -> Result<Candle, BadCandleTime> {
        let CandleRow(time, low, high, open, close, volume) = self;
        let open_time = DateTime::from_timestamp_millis(time).ok_or(BadCandleTime(time))?;
        Ok(Candle {
            open_time,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// Ticker for a trading pair (`/trading-pairs/{pair}/ticker`)
#[derive(Debug, Clone, Deserialize)]
pub struct Ticker {
    /// Last traded price
    pub price: f64,
    #[serde(default)]
    pub ask: Option<f64>,
    #[serde(default)]
    pub bid: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
}

/// One side of the level-1 order book: `[entry id, price, volume]`.
/// The entry id is opaque and unused; only price and volume are typed.
#[derive(Debug, Clone, Deserialize)]
pub struct BookEntry(pub Value, pub f64, pub f64);

impl BookEntry {
    pub fn price(&self) -> f64 {
        self.1
    }

    pub fn volume(&self) -> f64 {
        self.2
    }
}

/// Level-1 order book (`/trading-pairs/{pair}/book?level=1`)
#[derive(Debug, Clone, Deserialize)]
pub struct OrderBook {
    #[serde(default)]
    pub bid: Vec<BookEntry>,
    #[serde(default)]
    pub ask: Vec<BookEntry>,
}

impl OrderBook {
    pub fn best_bid(&self) -> Option<&BookEntry> {
        self.bid.first()
    }

    pub fn best_ask(&self) -> Option<&BookEntry> {
        self.ask.first()
    }
}

/// Per-currency balance (`/balances/{currency}`)
#[derive(Debug, Clone, Deserialize)]
pub struct Balance {
    #[serde(default)]
    pub asset: Option<String>,
    /// Available (non-reserved) amount
    pub avail: f64,
    #[serde(default)]
    pub hold: f64,
}

/// Order submission body (`POST /orders`).
///
/// Field order matters: serialization order is also signing order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(rename = "tradingPairName")]
    pub trading_pair_name: String,
}

impl OrderRequest {
    /// Limit buy at `price` for `amount` units of the base asset
    pub fn limit_buy(pair: &Pair, amount: f64, price: f64) -> Self {
        Self {
            side: Side::Buy,
            order_type: OrderType::Limit,
            amount,
            price: Some(price),
            trading_pair_name: pair.as_str().to_string(),
        }
    }

    /// Market sell of `amount` units of the base asset
    pub fn market_sell(pair: &Pair, amount: f64) -> Self {
        Self {
            side: Side::Sell,
            order_type: OrderType::Market,
            amount,
            price: None,
            trading_pair_name: pair.as_str().to_string(),
        }
    }
}

/// Acknowledgement for a submitted order. Orders are fire-and-forget;
/// the ack is logged and not tracked further.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderAck {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candle_row_field_order() {
        // [time, low, high, open, close, volume]
        let json = "[1601032200000, 12353000, 12361000, 12360000, 12355000, 0.5902]";
        let row: CandleRow = serde_json::from_str(json).unwrap();
        let candle = row.into_candle().unwrap();

        assert_eq!(candle.open_time.timestamp_millis(), 1601032200000);
        assert_eq!(candle.low, 12353000.0);
        assert_eq!(candle.high, 12361000.0);
        assert_eq!(candle.open, 12360000.0);
        assert_eq!(candle.close, 12355000.0);
        assert_eq!(candle.volume, 0.5902);
    }

    #[test]
    fn test_candle_row_rejects_short_array() {
        let json = "[1601032200000, 12353000, 12361000]";
        assert!(serde_json::from_str::<CandleRow>(json).is_err());
    }

    #[test]
    fn test_order_book_best_bid() {
        let json = r#"{"bid": [["17", 12000000, 0.5], ["16", 11990000, 1.0]],
                       "ask": [["22", 12010000, 0.2]]}"#;
        let book: OrderBook = serde_json::from_str(json).unwrap();

        assert_eq!(book.best_bid().unwrap().price(), 12000000.0);
        assert_eq!(book.best_bid().unwrap().volume(), 0.5);
        assert_eq!(book.best_ask().unwrap().price(), 12010000.0);
    }

    #[test]
    fn test_order_book_empty_side() {
        let book: OrderBook = serde_json::from_str(r#"{"bid": [], "ask": []}"#).unwrap();
        assert!(book.best_bid().is_none());
    }

    #[test]
    fn test_balance_decode() {
        let json = r#"{"asset": "KRW", "avail": 1500000.5, "hold": 0, "pendingWithdrawal": 0}"#;
        let balance: Balance = serde_json::from_str(json).unwrap();
        assert_eq!(balance.avail, 1500000.5);
        assert_eq!(balance.asset.as_deref(), Some("KRW"));
    }

    #[test]
    fn test_balance_decode_fails_without_avail() {
        assert!(serde_json::from_str::<Balance>(r#"{"asset": "KRW"}"#).is_err());
    }

    #[test]
    fn test_limit_buy_serialization_order() {
        let pair = Pair::new("BTC-KRW");
        let order = OrderRequest::limit_buy(&pair, 0.1, 10000.0);
        let json = serde_json::to_string(&order).unwrap();
        assert_eq!(
            json,
            r#"{"side":"buy","type":"limit","amount":0.1,"price":10000.0,"tradingPairName":"BTC-KRW"}"#
        );
    }

    #[test]
    fn test_market_sell_omits_price() {
        let pair = Pair::new("BTC-KRW");
        let order = OrderRequest::market_sell(&pair, 0.25);
        let json = serde_json::to_string(&order).unwrap();
        assert_eq!(
            json,
            r#"{"side":"sell","type":"market","amount":0.25,"tradingPairName":"BTC-KRW"}"#
        );
    }

    #[test]
    fn test_ticker_decode() {
        let json = r#"{"price": 12355000, "ask": 12356000, "bid": 12354000, "volume": 10.2, "time": "x"}"#;
        let ticker: Ticker = serde_json::from_str(json).unwrap();
        assert_eq!(ticker.price, 12355000.0);
    }
}
