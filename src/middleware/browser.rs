//! Browser cache headers.
//!
//! Stateless middleware that marks responses as publicly cacheable by
//! clients for a fixed period. Independent of the cache manager.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Duration, Utc};

/// Max-age policy for `browser_cache_headers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowserCache {
    max_age: u64,
}

impl BrowserCache {
    pub fn max_age(&self) -> u64 {
        self.max_age
    }

    fn cache_control(&self) -> String {
        format!("public, max-age={}", self.max_age)
    }

    fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        i64::try_from(self.max_age)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
    }
}

/// Policy for `browser_cache_headers` with the given max-age in seconds.
pub fn set_browser_cache(max_age_seconds: u64) -> BrowserCache {
    BrowserCache {
        max_age: max_age_seconds,
    }
}

/// Sets `Cache-Control: public, max-age=<n>` and a matching `Expires` on
/// every response.
pub async fn browser_cache_headers(
    State(policy): State<BrowserCache>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    if let Ok(value) = HeaderValue::from_str(&policy.cache_control()) {
        headers.insert(header::CACHE_CONTROL, value);
    }
    if let Some(expires) = policy.expires_at(Utc::now()) {
        if let Ok(value) = HeaderValue::from_str(&http_date(expires)) {
            headers.insert(header::EXPIRES, value);
        }
    }

    response
}

/// Formats a timestamp as an IMF-fixdate (`Sun, 06 Nov 1994 08:49:37 GMT`).
fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
