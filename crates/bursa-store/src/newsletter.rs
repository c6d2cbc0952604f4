//! Newsletter subscriptions.
//!
//! A subscription moves `active -> inactive -> active` and is never deleted,
//! so the row id survives re-subscription.

use chrono::Utc;

use crate::error::is_unique_violation;
use crate::{BursaDb, NewsletterSubscription, StoreError, StoreResult};

#[derive(Debug, Clone)]
pub enum SubscribeOutcome {
    Created(NewsletterSubscription),
    Reactivated(NewsletterSubscription),
}

impl SubscribeOutcome {
    pub fn subscription(&self) -> &NewsletterSubscription {
        match self {
            SubscribeOutcome::Created(s) | SubscribeOutcome::Reactivated(s) => s,
        }
    }
}

/// Trimmed, lower-cased address with one `@`, a non-empty local part and a
/// dotted domain.
pub fn normalize_email(raw: &str) -> StoreResult<String> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
                && domain.split('.').count() >= 2
                && domain.split('.').all(|label| !label.is_empty())
        }
        None => false,
    };
    if !valid || email.len() > 254 {
        return Err(StoreError::Validation("Email tidak valid".to_string()));
    }
    Ok(email)
}

pub struct NewsletterStore {
    db: BursaDb,
}

impl NewsletterStore {
    pub fn new(db: BursaDb) -> Self {
        Self { db }
    }

    /// Subscribe `email`. An inactive subscription is reactivated in place;
    /// an active one is a conflict.
    pub async fn subscribe(&self, email: &str, user_id: Option<i64>) -> StoreResult<SubscribeOutcome> {
        let email = normalize_email(email)?;
        let now = Utc::now();

        let reactivated = sqlx::query_as::<_, NewsletterSubscription>(
            r#"
            UPDATE newsletter_subscriptions
            SET is_active = 1, unsubscribed_at = NULL, subscribed_at = ?,
                user_id = COALESCE(?, user_id)
            WHERE email = ? AND is_active = 0
            RETURNING *
            "#,
        )
        .bind(now)
        .bind(user_id)
        .bind(&email)
        .fetch_optional(self.db.pool())
        .await?;

        if let Some(subscription) = reactivated {
            tracing::info!(id = subscription.id, "Newsletter subscription reactivated");
            return Ok(SubscribeOutcome::Reactivated(subscription));
        }

        let created = sqlx::query_as::<_, NewsletterSubscription>(
            r#"
            INSERT INTO newsletter_subscriptions (email, user_id, is_active, subscribed_at)
            VALUES (?, ?, 1, ?)
            RETURNING *
            "#,
        )
        .bind(&email)
        .bind(user_id)
        .bind(now)
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict("Email sudah terdaftar".to_string())
            } else {
                e.into()
            }
        })?;

        Ok(SubscribeOutcome::Created(created))
    }

    /// Deactivate `email`. Returns whether an active subscription was
    /// switched off; unknown and already-inactive addresses are not errors.
    pub async fn unsubscribe(&self, email: &str) -> StoreResult<bool> {
        let email = normalize_email(email)?;

        let result = sqlx::query(
            r#"
            UPDATE newsletter_subscriptions
            SET is_active = 0, unsubscribed_at = ?
            WHERE email = ? AND is_active = 1
            "#,
        )
        .bind(Utc::now())
        .bind(&email)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
