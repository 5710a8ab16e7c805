//! Pass-through to the external quote/candle vendor.
//!
//! Responses are opaque JSON handed back to the caller untouched. Failures are
//! reported once; nothing here retries.

use crate::config::MarketDataConfig;
use crate::rate_limiter::TokenBucket;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Upstream error: {0}")]
    Api(String),
    #[error("Upstream rate limit reached")]
    RateLimited,
    #[error("Invalid upstream response: {0}")]
    Decode(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandleQuery {
    pub symbol: String,
    pub interval: String,
    pub size: u32,
}

impl CandleQuery {
    pub const DEFAULT_INTERVAL: &'static str = "1min";
    pub const DEFAULT_SIZE: u32 = 50;

    pub fn new(symbol: impl Into<String>, interval: Option<String>, size: Option<u32>) -> Self {
        Self {
            symbol: symbol.into(),
            interval: interval.unwrap_or_else(|| Self::DEFAULT_INTERVAL.to_string()),
            size: size.unwrap_or(Self::DEFAULT_SIZE),
        }
    }
}

#[async_trait]
pub trait MarketDataService: Send + Sync {
    async fn quote(&self, symbol: &str) -> Result<Value, UpstreamError>;

    async fn candles(&self, query: &CandleQuery) -> Result<Value, UpstreamError>;

    fn name(&self) -> &str;
}

/// Twelve Data REST client (`/quote`, `/time_series`).
pub struct TwelveDataClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
    limiter: TokenBucket,
}

impl TwelveDataClient {
    pub fn new(config: &MarketDataConfig) -> Self {
        let api_key = config.api_key.clone().filter(|k| !k.is_empty());
        if api_key.is_none() {
            warn!("⚠️ market_data.api_key not set. Quote and candle requests will fail.");
        }

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
            limiter: TokenBucket::per_minute(config.requests_per_minute.max(1)),
        }
    }

    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| UpstreamError::Config("market data API key not configured".into()))?;

        if !self.limiter.try_acquire(1) {
            return Err(UpstreamError::RateLimited);
        }

        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "Market data request");

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("apikey", api_key)])
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;

        if !status.is_success() {
            return Err(UpstreamError::Api(
                vendor_message(&body).unwrap_or_else(|| format!("HTTP {}", status)),
            ));
        }

        check_vendor_body(body)
    }
}

fn vendor_message(body: &Value) -> Option<String> {
    body.get("message").and_then(Value::as_str).map(str::to_string)
}

/// The vendor reports errors in a 200 body: `{"status":"error","message":...}`.
pub fn check_vendor_body(body: Value) -> Result<Value, UpstreamError> {
    if body.get("status").and_then(Value::as_str) == Some("error") {
        return Err(UpstreamError::Api(
            vendor_message(&body).unwrap_or_else(|| "unknown upstream error".to_string()),
        ));
    }
    Ok(body)
}

#[async_trait]
impl MarketDataService for TwelveDataClient {
    async fn quote(&self, symbol: &str) -> Result<Value, UpstreamError> {
        self.get("quote", &[("symbol", symbol.to_string())]).await
    }

    async fn candles(&self, query: &CandleQuery) -> Result<Value, UpstreamError> {
        self.get(
            "time_series",
            &[
                ("symbol", query.symbol.clone()),
                ("interval", query.interval.clone()),
                ("outputsize", query.size.to_string()),
            ],
        )
        .await
    }

    fn name(&self) -> &str {
        "Twelve Data"
    }
}
