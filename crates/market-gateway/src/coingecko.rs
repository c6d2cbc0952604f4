use async_trait::async_trait;
use bursa_core::{CoreError, MarketSnapshot, QuoteProvider};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";

/// Prices are quoted in rupiah.
const VS_CURRENCY: &str = "idr";

/// Ticker -> CoinGecko coin id for the coins the site tracks by default.
const KNOWN_COINS: &[(&str, &str)] = &[
    ("BTC", "bitcoin"),
    ("ETH", "ethereum"),
    ("BNB", "binancecoin"),
    ("SOL", "solana"),
    ("XRP", "ripple"),
    ("USDT", "tether"),
    ("DOGE", "dogecoin"),
    ("ADA", "cardano"),
];

pub fn coin_id(symbol: &str) -> Option<&'static str> {
    KNOWN_COINS
        .iter()
        .find(|(ticker, _)| ticker.eq_ignore_ascii_case(symbol))
        .map(|(_, id)| *id)
}

/// Crypto quotes from the CoinGecko `coins/markets` endpoint.
#[derive(Clone)]
pub struct CoinGeckoClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl CoinGeckoClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client,
        }
    }
}

#[async_trait]
impl QuoteProvider for CoinGeckoClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<Option<MarketSnapshot>, CoreError> {
        let url = format!("{}/coins/markets", self.base_url);

        let lookup = match coin_id(symbol) {
            Some(id) => ("ids", id.to_string()),
            None => ("symbols", symbol.to_lowercase()),
        };

        let mut request = self
            .client
            .get(&url)
            .query(&[("vs_currency", VS_CURRENCY.to_string()), lookup]);
        if let Some(key) = &self.api_key {
            request = request.header("x-cg-demo-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CoreError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CoreError::Upstream(format!(
                "HTTP {} from CoinGecko for {}",
                response.status(),
                symbol
            )));
        }

        let coins: Vec<CoinMarket> = response
            .json()
            .await
            .map_err(|e| CoreError::Upstream(e.to_string()))?;

        Ok(coins.into_iter().next().and_then(|c| c.into_snapshot(symbol)))
    }

    fn name(&self) -> &str {
        "coingecko"
    }
}

#[derive(Debug, Deserialize)]
struct CoinMarket {
    name: String,
    current_price: Option<f64>,
    price_change_24h: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    total_volume: Option<f64>,
    market_cap: Option<f64>,
    high_24h: Option<f64>,
    low_24h: Option<f64>,
    last_updated: Option<String>,
}

impl CoinMarket {
    fn into_snapshot(self, symbol: &str) -> Option<MarketSnapshot> {
        let price = self.current_price?;
        Some(MarketSnapshot {
            symbol: symbol.to_string(),
            name: self.name,
            price,
            change_24h: self.price_change_24h.unwrap_or(0.0),
            change_percent: self.price_change_percentage_24h.unwrap_or(0.0),
            volume: self.total_volume.unwrap_or(0.0),
            market_cap: self.market_cap,
            high_24h: self.high_24h,
            low_24h: self.low_24h,
            last_updated: self
                .last_updated
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(Utc::now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_id_lookup() {
        assert_eq!(coin_id("BTC"), Some("bitcoin"));
        assert_eq!(coin_id("eth"), Some("ethereum"));
        assert_eq!(coin_id("PEPE"), None);
    }

    #[test]
    fn test_market_entry_to_snapshot() {
        let coin: CoinMarket = serde_json::from_value(serde_json::json!({
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "current_price": 1_050_000_000.0,
            "price_change_24h": -5_000_000.0,
            "price_change_percentage_24h": -0.47,
            "total_volume": 400_000_000_000.0,
            "market_cap": 20_000_000_000_000.0,
            "high_24h": 1_060_000_000.0,
            "low_24h": 1_040_000_000.0,
            "last_updated": "2024-05-01T10:00:00.000Z"
        }))
        .unwrap();

        let snap = coin.into_snapshot("BTC").unwrap();
        assert_eq!(snap.symbol, "BTC");
        assert_eq!(snap.name, "Bitcoin");
        assert_eq!(snap.change_percent, -0.47);
        assert!(snap.market_cap.is_some());
        assert_eq!(snap.last_updated.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn test_entry_without_price_is_dropped() {
        let coin: CoinMarket = serde_json::from_value(serde_json::json!({
            "name": "Delisted",
            "current_price": null
        }))
        .unwrap();
        assert!(coin.into_snapshot("DLS").is_none());
    }
}
