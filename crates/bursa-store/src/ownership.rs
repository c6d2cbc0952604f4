//! Owner-scoped writes.
//!
//! Mutations on user-owned rows are issued as a single statement filtered on
//! both `id` and `user_id`. Only when that statement matches nothing do we
//! look the row up again, and only to pick the right error.

use sqlx::SqlitePool;

use crate::{StoreError, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OwnedTable {
    Watchlist,
    Portfolio,
    Alerts,
}

impl OwnedTable {
    pub(crate) fn table(&self) -> &'static str {
        match self {
            OwnedTable::Watchlist => "watchlist_items",
            OwnedTable::Portfolio => "portfolio_items",
            OwnedTable::Alerts => "price_alerts",
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            OwnedTable::Watchlist => "Watchlist",
            OwnedTable::Portfolio => "Portfolio",
            OwnedTable::Alerts => "Alert",
        }
    }
}

/// Explain why an owner-scoped write on `id` matched no row.
///
/// No row at all is `NotFound`; a row with a different owner is `Forbidden`.
/// A row owned by `user_id` here means it was replaced between the two
/// statements, which is reported as `NotFound` as well.
pub(crate) async fn classify_miss(
    pool: &SqlitePool,
    table: OwnedTable,
    id: i64,
    user_id: i64,
) -> StoreResult<StoreError> {
    let sql = format!("SELECT user_id FROM {} WHERE id = ?", table.table());
    let owner: Option<i64> = sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(match owner {
        Some(owner) if owner != user_id => StoreError::Forbidden,
        _ => StoreError::NotFound(table.label()),
    })
}

/// Turn the outcome of an owner-scoped `... RETURNING *` into a result.
pub(crate) async fn require_owned<T>(
    pool: &SqlitePool,
    table: OwnedTable,
    id: i64,
    user_id: i64,
    row: Option<T>,
) -> StoreResult<T> {
    match row {
        Some(row) => Ok(row),
        None => Err(classify_miss(pool, table, id, user_id).await?),
    }
}
