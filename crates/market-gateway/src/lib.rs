//! Market data gateway.
//!
//! Routes each symbol to the stock or crypto provider, fans batch requests
//! out concurrently and degrades per-symbol failures to `None`. Nothing is
//! cached here; callers decide how long a response may live.

mod coingecko;
mod yahoo;

pub use coingecko::{coin_id, CoinGeckoClient, DEFAULT_COINGECKO_URL};
pub use yahoo::{provider_ticker, YahooChartClient, DEFAULT_YAHOO_URL};

use bursa_core::{normalize_symbol, AssetType, MarketSnapshot, QuoteProvider};
use futures_util::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Benchmark IDX stocks shown when no symbols are requested.
pub const DEFAULT_STOCKS: [&str; 5] = ["BBCA", "BBRI", "BMRI", "TLKM", "ASII"];

/// Benchmark coins shown when no symbols are requested.
pub const DEFAULT_CRYPTOS: [&str; 5] = ["BTC", "ETH", "BNB", "SOL", "XRP"];

/// Jakarta Composite Index.
pub const IHSG_SYMBOL: &str = "^JKSE";

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub yahoo_base_url: String,
    pub coingecko_base_url: String,
    pub coingecko_api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            yahoo_base_url: DEFAULT_YAHOO_URL.to_string(),
            coingecko_base_url: DEFAULT_COINGECKO_URL.to_string(),
            coingecko_api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Default basket split by asset class, failed symbols omitted.
#[derive(Debug, Clone, Serialize)]
pub struct MarketOverview {
    pub stocks: Vec<MarketSnapshot>,
    pub cryptos: Vec<MarketSnapshot>,
}

#[derive(Clone)]
pub struct MarketGateway {
    stocks: Arc<dyn QuoteProvider>,
    crypto: Arc<dyn QuoteProvider>,
}

impl MarketGateway {
    pub fn new(stocks: Arc<dyn QuoteProvider>, crypto: Arc<dyn QuoteProvider>) -> Self {
        Self { stocks, crypto }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            Arc::new(YahooChartClient::new(&config.yahoo_base_url, config.timeout)),
            Arc::new(CoinGeckoClient::new(
                &config.coingecko_base_url,
                config.coingecko_api_key.clone(),
                config.timeout,
            )),
        )
    }

    /// Guess the asset class of a bare symbol.
    pub fn infer_asset_type(symbol: &str) -> AssetType {
        if coin_id(symbol).is_some() {
            AssetType::Crypto
        } else {
            AssetType::Stock
        }
    }

    fn provider_for(&self, asset_type: AssetType) -> &Arc<dyn QuoteProvider> {
        match asset_type {
            AssetType::Stock => &self.stocks,
            AssetType::Crypto => &self.crypto,
        }
    }

    /// Fetch one symbol. Malformed symbols never reach a provider; upstream
    /// errors are logged and become `None`.
    pub async fn quote(&self, symbol: &str, hint: Option<AssetType>) -> Option<MarketSnapshot> {
        let Some(symbol) = normalize_symbol(symbol) else {
            tracing::debug!("Rejected malformed symbol {:?}", symbol);
            return None;
        };

        let asset_type = hint.unwrap_or_else(|| Self::infer_asset_type(&symbol));
        let provider = self.provider_for(asset_type);

        match provider.fetch_quote(&symbol).await {
            Ok(Some(snapshot)) => Some(snapshot),
            Ok(None) => {
                tracing::debug!("{} has no data for {}", provider.name(), symbol);
                None
            }
            Err(e) => {
                tracing::warn!("{} quote failed for {}: {}", provider.name(), symbol, e);
                None
            }
        }
    }

    /// Fetch many symbols concurrently. The result is positional: entry `i`
    /// belongs to `symbols[i]`.
    pub async fn quotes<S: AsRef<str>>(
        &self,
        symbols: &[S],
        hint: Option<AssetType>,
    ) -> Vec<Option<MarketSnapshot>> {
        let futures: Vec<_> = symbols
            .iter()
            .map(|symbol| self.quote(symbol.as_ref(), hint))
            .collect();

        join_all(futures).await
    }

    /// Default stock and crypto baskets, fetched together.
    pub async fn overview(&self) -> MarketOverview {
        let (stocks, cryptos) = futures_util::join!(
            self.quotes(&DEFAULT_STOCKS, Some(AssetType::Stock)),
            self.quotes(&DEFAULT_CRYPTOS, Some(AssetType::Crypto)),
        );

        MarketOverview {
            stocks: stocks.into_iter().flatten().collect(),
            cryptos: cryptos.into_iter().flatten().collect(),
        }
    }

    pub async fn ihsg(&self) -> Option<MarketSnapshot> {
        self.quote(IHSG_SYMBOL, Some(AssetType::Stock)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bursa_core::CoreError;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Knows a fixed set of symbols and fails on anything starting with `ERR`.
    struct FakeProvider {
        known: Vec<&'static str>,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new(known: Vec<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                known,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl QuoteProvider for FakeProvider {
        async fn fetch_quote(&self, symbol: &str) -> Result<Option<MarketSnapshot>, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if symbol.starts_with("ERR") {
                return Err(CoreError::Upstream("boom".to_string()));
            }
            if !self.known.iter().any(|k| *k == symbol) {
                return Ok(None);
            }
            Ok(Some(MarketSnapshot {
                symbol: symbol.to_string(),
                name: format!("{} name", symbol),
                price: 100.0,
                change_24h: 1.0,
                change_percent: 1.0,
                volume: 10.0,
                market_cap: None,
                high_24h: None,
                low_24h: None,
                last_updated: Utc::now(),
            }))
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn gateway(stocks: Arc<FakeProvider>, crypto: Arc<FakeProvider>) -> MarketGateway {
        MarketGateway::new(stocks, crypto)
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_isolates_failures() {
        let gw = gateway(FakeProvider::new(vec!["BBCA", "TLKM"]), FakeProvider::new(vec![]));

        let result = gw.quotes(&["BBCA", "INVALID123", "ERRX", "TLKM"], None).await;

        assert_eq!(result.len(), 4);
        assert_eq!(result[0].as_ref().map(|s| s.symbol.as_str()), Some("BBCA"));
        assert!(result[1].is_none());
        assert!(result[2].is_none());
        assert_eq!(result[3].as_ref().map(|s| s.symbol.as_str()), Some("TLKM"));
    }

    #[tokio::test]
    async fn test_symbols_are_routed_by_asset_type() {
        let stocks = FakeProvider::new(vec!["BBCA"]);
        let crypto = FakeProvider::new(vec!["BTC"]);
        let gw = gateway(stocks.clone(), crypto.clone());

        assert!(gw.quote("btc", None).await.is_some());
        assert!(gw.quote("BBCA", None).await.is_some());
        assert_eq!(stocks.calls.load(Ordering::SeqCst), 1);
        assert_eq!(crypto.calls.load(Ordering::SeqCst), 1);

        // explicit hint wins over inference
        assert!(gw.quote("BTC", Some(AssetType::Stock)).await.is_none());
        assert_eq!(stocks.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_blank_symbol_skips_upstream() {
        let stocks = FakeProvider::new(vec![]);
        let gw = gateway(stocks.clone(), FakeProvider::new(vec![]));
        assert!(gw.quote("   ", None).await.is_none());
        assert_eq!(stocks.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_symbols_skip_upstream() {
        let stocks = FakeProvider::new(vec!["BBCA"]);
        let gw = gateway(stocks.clone(), FakeProvider::new(vec![]));

        for symbol in ["../../../ADMIN/SECRET", "..", "BBCA?range=max", "BB CA"] {
            assert!(gw.quote(symbol, None).await.is_none(), "{}", symbol);
        }
        assert_eq!(stocks.calls.load(Ordering::SeqCst), 0);

        let result = gw.quotes(&["BBCA", "../x"], None).await;
        assert!(result[0].is_some());
        assert!(result[1].is_none());
        assert_eq!(stocks.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_overview_uses_default_basket() {
        let stocks = FakeProvider::new(DEFAULT_STOCKS.to_vec());
        let crypto = FakeProvider::new(vec!["BTC", "ETH"]);
        let gw = gateway(stocks.clone(), crypto.clone());

        let overview = gw.overview().await;
        assert_eq!(overview.stocks.len(), 5);
        assert_eq!(overview.cryptos.len(), 2);
        assert_eq!(crypto.calls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_infer_asset_type() {
        assert_eq!(MarketGateway::infer_asset_type("ETH"), AssetType::Crypto);
        assert_eq!(MarketGateway::infer_asset_type("BBRI"), AssetType::Stock);
    }
}
