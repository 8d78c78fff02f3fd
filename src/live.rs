//! Live trading loop
//!
//! Polls the ticker on a fixed cadence and trades the full balance of one
//! pair: at the daily cutover the held position is liquidated and the
//! strategy parameters are recomputed; on a breakout signal the entire
//! quote balance is spent at the best bid.
//!
//! Strategy parameters live in a `SignalState` value held in a single
//! mutable slot, replaced only at cutover. Each tick yields a typed
//! outcome; transient errors are logged and the loop keeps going, while
//! auth/config errors terminate it instead of failing silently forever.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::TradingConfig;
use crate::exchange::{ExchangeApi, ExchangeError};
use crate::gopax::types::OrderRequest;
use crate::strategy::{self, Signal};

/// Length of the daily window in which the cutover may fire
const CUTOVER_WINDOW_SECS: i64 = 10;

#[derive(Debug, Error)]
pub enum LiveError {
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Strategy(#[from] crate::types::StrategyError),
}

impl LiveError {
    /// Transient errors are retried on the next tick; fatal ones stop the loop.
    pub fn is_fatal(&self) -> bool {
        match self {
            LiveError::Exchange(e) => e.is_fatal(),
            // Short history from the exchange can heal on the next fetch
            LiveError::Strategy(_) => false,
        }
    }
}

/// Strategy parameters in force until the next cutover. Replaced as a
/// whole, never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalState {
    pub target_price: f64,
    pub moving_average: f64,
    /// Next instant at which parameters are recomputed and the position sold
    pub cutover_boundary: NaiveDateTime,
}

/// The fixed daily cutover instant strictly after `now`: today's local
/// midnight plus the cutover hour plus one day.
pub fn cutover_boundary_after(now: NaiveDateTime, cutover_hour: u32) -> NaiveDateTime {
    now.date()
        .and_hms_opt(cutover_hour, 0, 0)
        .expect("cutover hour is validated to be < 24")
        + Duration::days(1)
}

/// Whether `now` falls inside `[boundary, boundary + 10s)`
pub fn in_cutover_window(now: NaiveDateTime, boundary: NaiveDateTime) -> bool {
    now >= boundary && now < boundary + Duration::seconds(CUTOVER_WINDOW_SECS)
}

/// Trade action taken by one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickAction {
    /// Signal not triggered
    None,
    /// Limit buy submitted at the best bid
    Bought { amount: f64, price: f64 },
    /// Signal triggered but the quote balance was zero
    SkippedZeroBalance,
}

/// Typed outcome of a successful tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    /// Whether this tick performed the daily cutover (recompute + sell)
    pub cutover_fired: bool,
    pub action: TickAction,
}

#[derive(Debug)]
pub struct TradingLoop<E: ExchangeApi> {
    exchange: E,
    config: TradingConfig,
    state: SignalState,
    /// Guard against re-firing the cutover on later ticks inside the window
    last_cutover_day: Option<NaiveDate>,
    tick_count: u64,
}

impl<E: ExchangeApi> TradingLoop<E> {
    /// Build the loop and compute the initial signal state from fresh candles
    pub fn new(exchange: E, config: TradingConfig) -> Result<Self, LiveError> {
        Self::with_start_time(exchange, config, Local::now().naive_local())
    }

    /// Like `new`, with an explicit wall-clock start (used by tests)
    pub fn with_start_time(
        exchange: E,
        config: TradingConfig,
        now: NaiveDateTime,
    ) -> Result<Self, LiveError> {
        let state = Self::compute_state(&exchange, &config, now)?;
        info!(
            pair = %config.pair,
            target_price = state.target_price,
            moving_average = state.moving_average,
            cutover_boundary = %state.cutover_boundary,
            "initial signal state"
        );

        Ok(Self {
            exchange,
            config,
            state,
            last_cutover_day: None,
            tick_count: 0,
        })
    }

    pub fn state(&self) -> &SignalState {
        &self.state
    }

    fn compute_state(
        exchange: &E,
        config: &TradingConfig,
        now: NaiveDateTime,
    ) -> Result<SignalState, LiveError> {
        let candles = exchange.get_candles(&config.pair, config.candle_days)?;
        let target_price = strategy::target_price(&candles, config.k)?;
        let moving_average =
            strategy::moving_average(&candles, config.ma_window, config.ma_mode)?;

        Ok(SignalState {
            target_price,
            moving_average,
            cutover_boundary: cutover_boundary_after(now, config.cutover_hour),
        })
    }

    /// Run until a fatal error. There is no terminal state; the process is
    /// stopped externally.
    pub fn run(&mut self) -> Result<(), LiveError> {
        let interval = std::time::Duration::from_secs(self.config.poll_interval_secs);

        loop {
            let now = Local::now().naive_local();
            match self.tick(now) {
                Ok(outcome) => {
                    if let TickAction::Bought { amount, price } = outcome.action {
                        info!(amount, price, "breakout buy submitted");
                    }
                }
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "fatal error, stopping trading loop");
                    return Err(e);
                }
                Err(e) => {
                    warn!(error = %e, "tick failed, continuing after sleep");
                }
            }

            std::thread::sleep(interval);
        }
    }

    /// One iteration of the polling loop.
    ///
    /// Cutover handling and signal evaluation both run in the same tick;
    /// a tick inside the cutover window can therefore sell and then buy.
    pub fn tick(&mut self, now: NaiveDateTime) -> Result<TickOutcome, LiveError> {
        let mut cutover_fired = false;

        if in_cutover_window(now, self.state.cutover_boundary)
            && self.last_cutover_day != Some(now.date())
        {
            self.state = Self::compute_state(&self.exchange, &self.config, now)?;
            self.last_cutover_day = Some(now.date());
            cutover_fired = true;
            info!(
                target_price = self.state.target_price,
                moving_average = self.state.moving_average,
                cutover_boundary = %self.state.cutover_boundary,
                "daily cutover: signal state recomputed"
            );
            self.sell_all()?;
        }

        let current_price = self.exchange.get_current_price(&self.config.pair)?;

        self.tick_count += 1;
        if self.tick_count % self.config.heartbeat_ticks == 0 {
            info!(price = current_price, tick = self.tick_count, "heartbeat");
        }

        let action = match strategy::breakout_signal(
            current_price,
            self.state.target_price,
            self.state.moving_average,
        ) {
            Signal::Buy => self.buy_all()?,
            Signal::Hold => TickAction::None,
        };

        Ok(TickOutcome {
            cutover_fired,
            action,
        })
    }

    /// Spend the entire available quote balance at the best bid
    fn buy_all(&self) -> Result<TickAction, LiveError> {
        let pair = &self.config.pair;
        let quote_avail = self.exchange.get_balance(pair.quote())?.avail;
        if quote_avail <= 0.0 {
            debug!(currency = pair.quote(), "no quote balance, skipping buy");
            return Ok(TickAction::SkippedZeroBalance);
        }

        let book = self.exchange.get_order_book(pair)?;
        let best_bid = book
            .best_bid()
            .map(|entry| entry.price())
            .ok_or_else(|| ExchangeError::EmptyOrderBook(pair.clone()))?;

        let amount = quote_avail / best_bid;
        let order = OrderRequest::limit_buy(pair, amount, best_bid);
        let ack = self.exchange.place_order(&order)?;
        debug!(?ack, "buy order acknowledged");

        Ok(TickAction::Bought {
            amount,
            price: best_bid,
        })
    }

    /// Liquidate the entire available base balance at market
    fn sell_all(&self) -> Result<(), LiveError> {
        let pair = &self.config.pair;
        let base_avail = self.exchange.get_balance(pair.base())?.avail;
        if base_avail <= 0.0 {
            debug!(currency = pair.base(), "no base balance, nothing to sell");
            return Ok(());
        }

        let order = OrderRequest::market_sell(pair, base_avail);
        let ack = self.exchange.place_order(&order)?;
        info!(amount = base_avail, ?ack, "cutover sell submitted");
        Ok(())
    }
}
