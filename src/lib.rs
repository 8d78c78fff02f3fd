//! GOPAX Volatility Breakout Bot
//!
//! A single-pair trading bot for the GOPAX exchange: signed REST calls,
//! a daily breakout target price with a trailing moving average, a
//! 1-second polling loop that buys the full quote balance on breakout
//! and liquidates at a fixed daily cutover, plus an offline backtester
//! that replays the same rule over historical candles.

pub mod backtest;
pub mod config;
pub mod exchange;
pub mod gopax;
pub mod indicators;
pub mod live;
pub mod strategy;
pub mod types;

pub use config::Config;
pub use types::*;
