pub mod backtest;
pub mod live;
