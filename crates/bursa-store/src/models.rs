use bursa_core::{AlertCondition, AssetType, Role, UserSummary};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{StoreError, StoreResult};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            image: self.image.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub article_id: i64,
    pub user_id: i64,
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub user: UserSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub user_id: i64,
    pub article_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistItem {
    pub id: i64,
    pub user_id: i64,
    pub symbol: String,
    pub asset_type: AssetType,
    pub name: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistInput {
    pub symbol: String,
    pub asset_type: AssetType,
    pub name: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItem {
    pub id: i64,
    pub user_id: i64,
    pub symbol: String,
    pub asset_type: AssetType,
    pub name: String,
    pub quantity: f64,
    pub buy_price: f64,
    pub buy_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full set of client-editable portfolio fields; used for create and PUT.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioInput {
    pub symbol: String,
    pub asset_type: AssetType,
    pub name: Option<String>,
    pub quantity: f64,
    pub buy_price: f64,
    pub buy_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PriceAlert {
    pub id: i64,
    pub user_id: i64,
    pub symbol: String,
    pub asset_type: AssetType,
    pub condition: AlertCondition,
    pub target_price: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertInput {
    pub symbol: String,
    pub asset_type: AssetType,
    pub condition: AlertCondition,
    pub target_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterSubscription {
    pub id: i64,
    pub email: String,
    pub user_id: Option<i64>,
    pub is_active: bool,
    pub subscribed_at: DateTime<Utc>,
    pub unsubscribed_at: Option<DateTime<Utc>>,
}

pub(crate) fn normalize_symbol(raw: &str) -> StoreResult<String> {
    bursa_core::normalize_symbol(raw)
        .ok_or_else(|| StoreError::Validation("Simbol tidak valid".to_string()))
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl WatchlistInput {
    pub(crate) fn normalized(self) -> StoreResult<Self> {
        let symbol = normalize_symbol(&self.symbol)?;
        Ok(Self {
            name: clean_optional(self.name).or_else(|| Some(symbol.clone())),
            notes: clean_optional(self.notes),
            symbol,
            asset_type: self.asset_type,
        })
    }
}

impl PortfolioInput {
    pub(crate) fn normalized(self) -> StoreResult<Self> {
        let symbol = normalize_symbol(&self.symbol)?;
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(StoreError::Validation(
                "Jumlah harus lebih besar dari 0".to_string(),
            ));
        }
        if !self.buy_price.is_finite() || self.buy_price <= 0.0 {
            return Err(StoreError::Validation(
                "Harga beli harus lebih besar dari 0".to_string(),
            ));
        }
        Ok(Self {
            name: clean_optional(self.name).or_else(|| Some(symbol.clone())),
            notes: clean_optional(self.notes),
            symbol,
            ..self
        })
    }
}

impl AlertInput {
    pub(crate) fn normalized(self) -> StoreResult<Self> {
        let symbol = normalize_symbol(&self.symbol)?;
        if !self.target_price.is_finite() || self.target_price <= 0.0 {
            return Err(StoreError::Validation(
                "Harga target harus lebih besar dari 0".to_string(),
            ));
        }
        Ok(Self { symbol, ..self })
    }
}
