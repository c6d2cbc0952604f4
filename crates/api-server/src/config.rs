//! Server configuration read from the environment (after `.env` is loaded).

use market_gateway::{GatewayConfig, DEFAULT_COINGECKO_URL, DEFAULT_YAHOO_URL};
use std::time::Duration;

use crate::response_cache::DEFAULT_MAX_ENTRIES;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub gateway: GatewayConfig,
    pub market_cache_ttl: Duration,
    pub response_cache_max_entries: usize,
    /// Gate `POST /api/articles` behind an admin session.
    pub require_auth_for_article_create: bool,
    pub enable_hsts: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:warta-bursa.db".to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
            gateway: GatewayConfig::default(),
            market_cache_ttl: Duration::from_secs(60),
            response_cache_max_entries: DEFAULT_MAX_ENTRIES,
            require_auth_for_article_create: false,
            enable_hsts: false,
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
}

fn env_secs(name: &str, default: u64) -> Duration {
    let secs = std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default);
    Duration::from_secs(secs)
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let coingecko_api_key = std::env::var("COINGECKO_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        if coingecko_api_key.is_none() {
            tracing::info!("COINGECKO_API_KEY not set, using the public CoinGecko tier");
        }

        Self {
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            gateway: GatewayConfig {
                yahoo_base_url: std::env::var("YAHOO_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_YAHOO_URL.to_string()),
                coingecko_base_url: std::env::var("COINGECKO_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_COINGECKO_URL.to_string()),
                coingecko_api_key,
                timeout: env_secs("UPSTREAM_TIMEOUT_SECS", 10),
            },
            market_cache_ttl: env_secs("MARKET_CACHE_TTL_SECS", 60),
            response_cache_max_entries: env_usize(
                "RESPONSE_CACHE_MAX_ENTRIES",
                defaults.response_cache_max_entries,
            ),
            require_auth_for_article_create: env_flag("REQUIRE_AUTH_FOR_ARTICLE_CREATE"),
            enable_hsts: env_flag("ENABLE_HSTS"),
        }
    }
}
