use async_trait::async_trait;
use bursa_core::{CoreError, MarketSnapshot, QuoteProvider};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_YAHOO_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Exchange suffix for tickers listed on the Indonesia Stock Exchange.
const IDX_SUFFIX: &str = ".JK";

/// Stock quotes from the Yahoo Finance chart endpoint.
#[derive(Clone)]
pub struct YahooChartClient {
    base_url: String,
    client: Client,
}

impl YahooChartClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }
}

/// Map a display symbol to the provider ticker: `BBCA` -> `BBCA.JK`.
/// Index symbols (`^JKSE`) and already-suffixed tickers pass through.
pub fn provider_ticker(symbol: &str) -> String {
    if symbol.starts_with('^') || symbol.contains('.') {
        symbol.to_string()
    } else {
        format!("{}{}", symbol, IDX_SUFFIX)
    }
}

impl YahooChartClient {
    /// Chart URL for a symbol. The ticker is appended as a single encoded
    /// path segment.
    fn chart_url(&self, symbol: &str) -> Result<Url, CoreError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| CoreError::Upstream(format!("invalid Yahoo base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| CoreError::Upstream("Yahoo base URL cannot take a path".to_string()))?
            .pop_if_empty()
            .push(&provider_ticker(symbol));
        Ok(url)
    }
}

#[async_trait]
impl QuoteProvider for YahooChartClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<Option<MarketSnapshot>, CoreError> {
        let url = self.chart_url(symbol)?;

        let response = self
            .client
            .get(url)
            .query(&[("interval", "1d"), ("range", "1d")])
            .send()
            .await
            .map_err(|e| CoreError::Upstream(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(CoreError::Upstream(format!(
                "HTTP {} from Yahoo for {}",
                response.status(),
                symbol
            )));
        }

        let chart: ChartResponse = response
            .json()
            .await
            .map_err(|e| CoreError::Upstream(e.to_string()))?;

        Ok(parse_chart(symbol, chart))
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}

fn parse_chart(symbol: &str, chart: ChartResponse) -> Option<MarketSnapshot> {
    let meta = chart.chart.result?.into_iter().next()?.meta;
    let price = meta.regular_market_price?;
    let previous = meta
        .chart_previous_close
        .or(meta.previous_close)
        .unwrap_or(price);

    let change = price - previous;
    let change_percent = if previous != 0.0 {
        change / previous * 100.0
    } else {
        0.0
    };

    let name = match symbol {
        "^JKSE" => "IHSG".to_string(),
        _ => meta
            .long_name
            .or(meta.short_name)
            .unwrap_or_else(|| symbol.to_string()),
    };

    Some(MarketSnapshot {
        symbol: symbol.to_string(),
        name,
        price,
        change_24h: change,
        change_percent,
        volume: meta.regular_market_volume.unwrap_or(0.0),
        market_cap: None,
        high_24h: meta.regular_market_day_high,
        low_24h: meta.regular_market_day_low,
        last_updated: meta
            .regular_market_time
            .and_then(|t| DateTime::from_timestamp(t, 0))
            .unwrap_or_else(Utc::now),
    })
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    long_name: Option<String>,
    short_name: Option<String>,
    regular_market_price: Option<f64>,
    chart_previous_close: Option<f64>,
    previous_close: Option<f64>,
    regular_market_day_high: Option<f64>,
    regular_market_day_low: Option<f64>,
    regular_market_volume: Option<f64>,
    regular_market_time: Option<i64>,
}
