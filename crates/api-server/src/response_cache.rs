//! In-process response cache for public GET routes.
//!
//! Entries are keyed by request URI and expire after a fixed TTL. Each entry
//! remembers its path and a tag so writers can drop stale pages through
//! [`CacheInvalidator`]. Expired entries are swept at most once per TTL and
//! the map never holds more than `max_entries` pages.

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const DEFAULT_MAX_ENTRIES: usize = 1024;

/// `Cache-Control` for market data: shared caches may keep a response for the
/// TTL and serve it stale for twice as long while revalidating.
pub fn market_cache_control(ttl: Duration) -> HeaderValue {
    let secs = ttl.as_secs().max(1);
    let value = format!("public, s-maxage={}, stale-while-revalidate={}", secs, secs * 2);
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("no-store"))
}

/// Largest body the cache will buffer.
const MAX_CACHED_BODY: usize = 1024 * 1024;

/// Sink for "this page is stale" signals emitted by write paths.
pub trait CacheInvalidator: Send + Sync {
    fn revalidate_path(&self, path: &str);
    fn revalidate_tag(&self, tag: &str);
}

#[derive(Clone)]
struct CachedEntry {
    path: String,
    tag: &'static str,
    status: StatusCode,
    body: Bytes,
    stored_at: Instant,
}

pub struct ResponseCache {
    entries: DashMap<String, CachedEntry>,
    ttl: Duration,
    max_entries: usize,
    last_sweep: Mutex<Instant>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get(&self, key: &str) -> Option<CachedEntry> {
        let entry = self.entries.get(key)?.clone();
        if entry.stored_at.elapsed() < self.ttl {
            Some(entry)
        } else {
            self.entries.remove(key);
            None
        }
    }

    /// Drop every entry older than the TTL.
    pub fn evict_expired(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
    }

    fn sweep_if_due(&self) {
        let Ok(mut last) = self.last_sweep.try_lock() else {
            return;
        };
        if last.elapsed() >= self.ttl {
            *last = Instant::now();
            drop(last);
            self.evict_expired();
        }
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.stored_at)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }

    fn insert(&self, key: String, path: String, tag: &'static str, status: StatusCode, body: Bytes) {
        self.sweep_if_due();
        if !self.entries.contains_key(&key) {
            if self.entries.len() >= self.max_entries {
                self.evict_expired();
            }
            while self.entries.len() >= self.max_entries {
                let before = self.entries.len();
                self.evict_oldest();
                if self.entries.len() == before {
                    break;
                }
            }
        }

        self.entries.insert(
            key,
            CachedEntry {
                path,
                tag,
                status,
                body,
                stored_at: Instant::now(),
            },
        );
    }
}

impl CacheInvalidator for ResponseCache {
    fn revalidate_path(&self, path: &str) {
        self.entries.retain(|_, entry| entry.path != path);
        tracing::debug!("Revalidated path {}", path);
    }

    fn revalidate_tag(&self, tag: &str) {
        self.entries.retain(|_, entry| entry.tag != tag);
        tracing::debug!("Revalidated tag {}", tag);
    }
}

/// Which cache a route group uses and how its entries are labelled.
#[derive(Clone)]
pub struct CachePolicy {
    pub cache: Arc<ResponseCache>,
    pub tag: &'static str,
    pub cache_control: Option<HeaderValue>,
}

fn cached_response(status: StatusCode, body: Bytes, cache_control: Option<HeaderValue>) -> Response {
    let mut response = (status, body).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(value) = cache_control {
        headers.insert(header::CACHE_CONTROL, value);
    }
    response
}

/// Serve GET requests from the cache, filling it with successful responses.
pub async fn cache_middleware(
    State(policy): State<CachePolicy>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = request.uri().to_string();
    if let Some(hit) = policy.cache.get(&key) {
        tracing::debug!("Response cache hit for {}", key);
        return cached_response(hit.status, hit.body, policy.cache_control);
    }

    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_CACHED_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Could not buffer response for {}: {}", key, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, Body::empty()).into_response();
        }
    };

    policy.cache.insert(key, path, policy.tag, parts.status, bytes.clone());

    let mut response = Response::from_parts(parts, Body::from(bytes));
    if let Some(value) = policy.cache_control {
        response.headers_mut().insert(header::CACHE_CONTROL, value);
    }
    response
}
