//! Market data endpoints. Responses live in the shared response cache for
//! the configured TTL; the gateway itself always goes upstream.

use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::get,
    Json, Router,
};
use bursa_core::{AssetType, MarketSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::response_cache::{cache_middleware, market_cache_control, CachePolicy, ResponseCache};
use crate::{AppError, AppState};

pub const MARKET_TAG: &str = "market";

/// Upper bound on symbols per batch request.
pub const MAX_SYMBOLS: usize = 20;

#[derive(Debug, Default, Deserialize)]
pub struct MarketQuery {
    pub symbols: Option<String>,
    #[serde(rename = "type")]
    pub asset_type: Option<String>,
}

#[derive(Serialize)]
pub struct OverviewResponse {
    pub stocks: Vec<MarketSnapshot>,
    pub cryptos: Vec<MarketSnapshot>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct BatchResponse {
    pub data: Vec<Option<MarketSnapshot>>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct StocksResponse {
    pub stocks: Vec<Option<MarketSnapshot>>,
    pub ihsg: Option<MarketSnapshot>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum MarketResponse {
    Overview(OverviewResponse),
    Batch(BatchResponse),
}

pub fn market_routes(cache: Arc<ResponseCache>) -> Router<AppState> {
    let policy = CachePolicy {
        cache_control: Some(market_cache_control(cache.ttl())),
        cache,
        tag: MARKET_TAG,
    };

    Router::new()
        .route("/api/market", get(get_market))
        .route("/api/market/:symbol", get(get_symbol))
        .route("/api/stocks", get(get_stocks))
        .route_layer(middleware::from_fn_with_state(policy, cache_middleware))
}

/// Split a comma separated list, dropping blanks. `None` when nothing is left.
fn parse_symbols(raw: Option<&str>) -> Result<Option<Vec<String>>, AppError> {
    let symbols: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();

    if symbols.len() > MAX_SYMBOLS {
        return Err(AppError::Validation(format!(
            "Maksimal {} simbol per permintaan",
            MAX_SYMBOLS
        )));
    }
    Ok(if symbols.is_empty() { None } else { Some(symbols) })
}

fn parse_hint(raw: Option<&str>) -> Option<AssetType> {
    raw.and_then(AssetType::parse)
}

async fn get_market(
    State(state): State<AppState>,
    Query(query): Query<MarketQuery>,
) -> Result<Json<MarketResponse>, AppError> {
    let hint = parse_hint(query.asset_type.as_deref());

    let response = match parse_symbols(query.symbols.as_deref())? {
        None => {
            let overview = state.market.overview().await;
            MarketResponse::Overview(OverviewResponse {
                stocks: overview.stocks,
                cryptos: overview.cryptos,
                timestamp: Utc::now(),
            })
        }
        Some(symbols) => MarketResponse::Batch(BatchResponse {
            data: state.market.quotes(&symbols, hint).await,
            timestamp: Utc::now(),
        }),
    };

    Ok(Json(response))
}

async fn get_symbol(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<MarketQuery>,
) -> Result<Json<MarketSnapshot>, AppError> {
    let hint = parse_hint(query.asset_type.as_deref());
    state
        .market
        .quote(&symbol, hint)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Data pasar tidak ditemukan".to_string()))
}

/// IDX quotes plus the composite index.
async fn get_stocks(
    State(state): State<AppState>,
    Query(query): Query<MarketQuery>,
) -> Result<Json<StocksResponse>, AppError> {
    let symbols = parse_symbols(query.symbols.as_deref())?
        .ok_or_else(|| AppError::Validation("Parameter 'symbols' wajib diisi".to_string()))?;

    let (stocks, ihsg) = tokio::join!(
        state.market.quotes(&symbols, Some(AssetType::Stock)),
        state.market.ihsg(),
    );

    Ok(Json(StocksResponse {
        stocks,
        ihsg,
        timestamp: Utc::now(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbols() {
        assert_eq!(parse_symbols(None).unwrap(), None);
        assert_eq!(parse_symbols(Some(" , ")).unwrap(), None);
        assert_eq!(
            parse_symbols(Some("bbca, TLKM,,")).unwrap(),
            Some(vec!["BBCA".to_string(), "TLKM".to_string()])
        );

        let many = vec!["A"; MAX_SYMBOLS + 1].join(",");
        assert!(parse_symbols(Some(&many)).is_err());
    }

    #[test]
    fn test_parse_hint() {
        assert_eq!(parse_hint(Some("crypto")), Some(AssetType::Crypto));
        assert_eq!(parse_hint(Some("saham")), Some(AssetType::Stock));
        assert_eq!(parse_hint(Some("bond")), None);
        assert_eq!(parse_hint(None), None);
    }
}
