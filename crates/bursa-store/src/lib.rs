//! SQLite persistence for Warta Bursa: articles, comments, user-owned
//! investment records, newsletter subscriptions and sessions.

pub mod alerts;
pub mod articles;
pub mod bookmarks;
pub mod comments;
pub mod db;
pub mod error;
pub mod models;
pub mod newsletter;
mod ownership;
pub mod portfolio;
pub mod users;
pub mod watchlist;

pub use alerts::AlertStore;
pub use articles::{fts_query, ArticleFilter, ArticlePage, ArticleStore};
pub use bookmarks::BookmarkStore;
pub use comments::CommentStore;
pub use db::BursaDb;
pub use error::{StoreError, StoreResult};
pub use models::*;
pub use newsletter::{normalize_email, NewsletterStore, SubscribeOutcome};
pub use portfolio::PortfolioStore;
pub use users::{hash_token, UserStore};
pub use watchlist::WatchlistStore;
