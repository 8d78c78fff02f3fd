//! GOPAX Exchange API client
//!
//! HTTP client for the GOPAX REST API. Authenticated calls are signed per
//! the protocol in `gopax::auth`; all calls are blocking request/response
//! with a fixed per-call timeout. There is no retry at this layer; the
//! caller decides what a failure means.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use reqwest::blocking::Client;
use reqwest::Method;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::gopax::auth::{self, AuthError, Credentials};
use crate::gopax::types::{Balance, CandleRow, OrderAck, OrderBook, OrderRequest, Ticker};
use crate::types::{Candle, Pair};

const API_BASE_URL: &str = "https://api.gopax.co.kr";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DAY_MS: i64 = 86_400_000;
/// Daily candles
const CANDLE_INTERVAL_MIN: u32 = 1440;
/// Receive window attached to order submissions, in milliseconds
const ORDER_RECEIVE_WINDOW: u32 = 200;

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("authentication rejected (status {status}): {body}")]
    Auth { status: u16, body: String },

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {what}: {detail}")]
    InvalidData { what: &'static str, detail: String },

    #[error(transparent)]
    Signing(#[from] AuthError),

    #[error("API credentials not configured")]
    MissingCredentials,

    #[error("order book for {0} has no bids")]
    EmptyOrderBook(Pair),
}

impl ExchangeError {
    /// Auth, signing and missing-credential failures are systematic and
    /// will not heal on a retry; everything else is transient from the
    /// trading loop's point of view.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExchangeError::Auth { .. }
                | ExchangeError::Signing(_)
                | ExchangeError::MissingCredentials
        )
    }
}

pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// Raw result of a single API call: numeric status, parsed JSON body and
/// response headers.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
    pub headers: HashMap<String, String>,
}

/// Minimal interface the trading loop needs from the exchange.
///
/// `GopaxClient` is the production implementation; tests drive the loop
/// with a stub.
pub trait ExchangeApi {
    fn get_current_price(&self, pair: &Pair) -> ExchangeResult<f64>;
    fn get_candles(&self, pair: &Pair, days: i64) -> ExchangeResult<Vec<Candle>>;
    fn get_order_book(&self, pair: &Pair) -> ExchangeResult<OrderBook>;
    fn get_balance(&self, currency: &str) -> ExchangeResult<Balance>;
    fn place_order(&self, order: &OrderRequest) -> ExchangeResult<OrderAck>;
}

#[derive(Debug, Clone)]
pub struct GopaxClient {
    credentials: Option<Credentials>,
    client: Client,
    base_url: String,
}

impl GopaxClient {
    pub fn new(credentials: Credentials) -> Self {
        Self::build(Some(credentials))
    }

    /// Client without credentials; only unauthenticated endpoints work.
    pub fn public() -> Self {
        Self::build(None)
    }

    fn build(credentials: Option<Credentials>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        GopaxClient {
            credentials,
            client,
            base_url: API_BASE_URL.to_string(),
        }
    }

    /// Override the API base URL (used by tests against a local server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Perform one API call.
    ///
    /// `body_json` must be the exact compact serialization to send; the
    /// same bytes participate in the signature and in the request body.
    pub fn call(
        &self,
        requires_auth: bool,
        method: Method,
        path: &str,
        body_json: Option<&str>,
        receive_window: Option<u32>,
    ) -> ExchangeResult<ApiResponse> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method.clone(), &url);

        if requires_auth {
            let credentials = self
                .credentials
                .as_ref()
                .ok_or(ExchangeError::MissingCredentials)?;

            // Milliseconds since epoch, no fractional part
            let timestamp = Utc::now().timestamp_millis();
            let message = auth::signing_message(
                timestamp,
                method.as_str(),
                path,
                receive_window,
                body_json,
            );
            let signature = credentials.sign(&message)?;

            request = request
                .header("api-key", credentials.api_key())
                .header("timestamp", timestamp.to_string())
                .header("signature", signature);
            if let Some(window) = receive_window {
                request = request.header("receive-window", window.to_string());
            }
        }

        if let Some(body) = body_json {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body.to_string());
        }

        let response = request.send()?;
        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let text = response.text()?;

        debug!(%method, path, status, "API call");

        if status == 401 || status == 403 {
            return Err(ExchangeError::Auth { status, body: text });
        }
        if !(200..300).contains(&status) {
            return Err(ExchangeError::Api { status, body: text });
        }

        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|source| ExchangeError::Decode {
                what: "response body",
                source,
            })?
        };

        Ok(ApiResponse {
            status,
            body,
            headers,
        })
    }

    fn decode<T: serde::de::DeserializeOwned>(
        what: &'static str,
        body: Value,
    ) -> ExchangeResult<T> {
        serde_json::from_value(body).map_err(|source| ExchangeError::Decode { what, source })
    }

    /// Ticker for a pair (unauthenticated)
    pub fn get_ticker(&self, pair: &Pair) -> ExchangeResult<Ticker> {
        let path = format!("/trading-pairs/{}/ticker", pair);
        let response = self.call(false, Method::GET, &path, None, None)?;
        Self::decode("ticker", response.body)
    }

}

impl ExchangeApi for GopaxClient {
    fn get_current_price(&self, pair: &Pair) -> ExchangeResult<f64> {
        Ok(self.get_ticker(pair)?.price)
    }

    /// Daily candles covering the trailing `days` days, oldest first
    fn get_candles(&self, pair: &Pair, days: i64) -> ExchangeResult<Vec<Candle>> {
        let end = Utc::now().timestamp_millis();
        let start = end - days * DAY_MS;
        let path = format!(
            "/trading-pairs/{}/candles?start={}&end={}&interval={}",
            pair, start, end, CANDLE_INTERVAL_MIN
        );

        let response = self.call(false, Method::GET, &path, None, None)?;
        let rows: Vec<CandleRow> = Self::decode("candles", response.body)?;

        rows.into_iter()
            .map(|row| {
                row.into_candle().map_err(|e| ExchangeError::InvalidData {
                    what: "candle row",
                    detail: e.to_string(),
                })
            })
            .collect()
    }

    fn get_order_book(&self, pair: &Pair) -> ExchangeResult<OrderBook> {
        let path = format!("/trading-pairs/{}/book?level=1", pair);
        let response = self.call(false, Method::GET, &path, None, None)?;
        Self::decode("order book", response.body)
    }

    fn get_balance(&self, currency: &str) -> ExchangeResult<Balance> {
        let path = format!("/balances/{}", currency);
        let response = self.call(true, Method::GET, &path, None, None)?;
        Self::decode("balance", response.body)
    }

    fn place_order(&self, order: &OrderRequest) -> ExchangeResult<OrderAck> {
        let body = serde_json::to_string(order).map_err(|source| ExchangeError::Decode {
            what: "order request",
            source,
        })?;
        let response = self.call(
            true,
            Method::POST,
            "/orders",
            Some(&body),
            Some(ORDER_RECEIVE_WINDOW),
        )?;
        Self::decode("order ack", response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let auth = ExchangeError::Auth {
            status: 401,
            body: String::new(),
        };
        let api = ExchangeError::Api {
            status: 500,
            body: String::new(),
        };
        assert!(auth.is_fatal());
        assert!(ExchangeError::MissingCredentials.is_fatal());
        assert!(!api.is_fatal());
    }

    #[test]
    fn test_public_client_rejects_auth_calls() {
        let client = GopaxClient::public();
        let result = client.call(true, Method::GET, "/balances/KRW", None, None);
        assert!(matches!(result, Err(ExchangeError::MissingCredentials)));
    }
}
