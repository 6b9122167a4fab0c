//! HTTP client for the external quote service.
//!
//! Wraps a Yahoo-style chart endpoint: daily OHLCV history plus a current
//! snapshot derived from the chart metadata. All fetching happens before
//! the valuation core runs; this crate never feeds the formulas directly.

use std::time::Duration;

use analysis_core::{AnalysisError, MarketDataSource, PriceBar, QuoteSnapshot};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const MAX_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct QuoteClient {
    base_url: String,
    client: Client,
}

impl QuoteClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string())
    }

    /// Base URL override from `QUOTE_BASE_URL`, falling back to the public
    /// endpoint.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("QUOTE_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(base_url)
    }

    pub fn with_base_url(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("growthlens/0.1")
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { base_url, client }
    }

    /// Fetch the chart payload for one ticker, retrying 429 responses with
    /// a short pause.
    async fn fetch_chart(&self, ticker: &str, days: u32) -> Result<ChartResult, AnalysisError> {
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(AnalysisError::InvalidData("Ticker is required".to_string()));
        }
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);

        for attempt in 0..MAX_ATTEMPTS {
            let response = self
                .client
                .get(&url)
                .query(&[("range", format!("{days}d")), ("interval", "1d".to_string())])
                .send()
                .await
                .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

            if response.status().as_u16() == 429 {
                let wait = Duration::from_secs(2u64 << attempt);
                tracing::warn!(
                    "quote service rate limited, waiting {}s before retry {}/{}",
                    wait.as_secs(),
                    attempt + 1,
                    MAX_ATTEMPTS
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            if !response.status().is_success() {
                return Err(AnalysisError::ApiError(format!(
                    "HTTP {}: {}",
                    response.status(),
                    response.text().await.unwrap_or_default()
                )));
            }

            let body: ChartResponse = response
                .json()
                .await
                .map_err(|e| AnalysisError::ApiError(e.to_string()))?;
            return body
                .chart
                .result
                .into_iter()
                .next()
                .ok_or_else(|| AnalysisError::NotFound(format!("No chart data for {ticker}")));
        }

        Err(AnalysisError::ApiError(
            "Rate limited by quote service after retries".to_string(),
        ))
    }
}

impl Default for QuoteClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataSource for QuoteClient {
    async fn quote(&self, ticker: &str) -> Result<QuoteSnapshot, AnalysisError> {
        let chart = self.fetch_chart(ticker, 2).await?;
        snapshot_from_chart(&chart)
    }

    async fn history(&self, ticker: &str, days: u32) -> Result<Vec<PriceBar>, AnalysisError> {
        let chart = self.fetch_chart(ticker, days).await?;
        Ok(bars_from_chart(&chart))
    }
}

/// Build the snapshot from chart metadata. The chart feed carries no market
/// cap; that field stays empty here.
fn snapshot_from_chart(chart: &ChartResult) -> Result<QuoteSnapshot, AnalysisError> {
    let price = chart.meta.regular_market_price.ok_or_else(|| {
        AnalysisError::InsufficientData(format!("No market price for {}", chart.meta.symbol))
    })?;
    let previous_close = chart.meta.chart_previous_close;
    let price_change = previous_close.map(|prev| price - prev);
    let price_change_percent = previous_close.and_then(|prev| {
        if prev == 0.0 {
            None
        } else {
            Some((price - prev) / prev * 100.0)
        }
    });

    Ok(QuoteSnapshot {
        ticker: chart.meta.symbol.clone(),
        current_price: price,
        price_change,
        price_change_percent,
        volume: chart.meta.regular_market_volume,
        market_cap: None,
        previous_close,
    })
}

/// Zip the chart's timestamp spine with its OHLCV columns. Slots the feed
/// left empty (halts, partial sessions) are skipped.
fn bars_from_chart(chart: &ChartResult) -> Vec<PriceBar> {
    let Some(quote) = chart.indicators.quote.first() else {
        return Vec::new();
    };

    chart
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let date = DateTime::from_timestamp(ts, 0)?.date_naive();
            let close = (*quote.close.get(i)?)?;
            Some(PriceBar {
                date,
                open: quote.open.get(i).copied().flatten().unwrap_or(close),
                high: quote.high.get(i).copied().flatten().unwrap_or(close),
                low: quote.low.get(i).copied().flatten().unwrap_or(close),
                close,
                volume: quote.volume.get(i).copied().flatten().unwrap_or(0.0),
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Vec<ChartResult>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    symbol: String,
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(rename = "chartPreviousClose")]
    chart_previous_close: Option<f64>,
    #[serde(rename = "regularMarketVolume")]
    regular_market_volume: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Deserialize, Default)]
struct QuoteBlock {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART_BODY: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "symbol": "ACME",
                    "regularMarketPrice": 151.5,
                    "chartPreviousClose": 150.0,
                    "regularMarketVolume": 1200000.0
                },
                "timestamp": [1754006400, 1754092800, 1754179200],
                "indicators": {
                    "quote": [{
                        "open":   [149.0, 150.5, null],
                        "high":   [151.0, 152.0, null],
                        "low":    [148.5, 149.8, null],
                        "close":  [150.0, 151.5, null],
                        "volume": [1000000.0, 1200000.0, null]
                    }]
                }
            }]
        }
    }"#;

    #[test]
    fn chart_maps_to_bars_skipping_empty_slots() {
        let response: ChartResponse = serde_json::from_str(CHART_BODY).unwrap();
        let chart = &response.chart.result[0];
        let bars = bars_from_chart(chart);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 150.0);
        assert_eq!(bars[1].close, 151.5);
        assert!(bars[0].date < bars[1].date);
    }

    #[test]
    fn chart_maps_to_snapshot() {
        let response: ChartResponse = serde_json::from_str(CHART_BODY).unwrap();
        let snapshot = snapshot_from_chart(&response.chart.result[0]).unwrap();
        assert_eq!(snapshot.ticker, "ACME");
        assert_eq!(snapshot.current_price, 151.5);
        assert_eq!(snapshot.previous_close, Some(150.0));
        assert_eq!(snapshot.price_change, Some(1.5));
        assert_eq!(snapshot.market_cap, None);
    }

    #[test]
    fn snapshot_requires_a_price() {
        let body = r#"{
            "chart": { "result": [{
                "meta": { "symbol": "ACME" },
                "indicators": { "quote": [] }
            }]}
        }"#;
        let response: ChartResponse = serde_json::from_str(body).unwrap();
        assert!(snapshot_from_chart(&response.chart.result[0]).is_err());
    }
}
