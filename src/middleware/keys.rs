//! Cache key construction for HTTP requests.
//!
//! Keys have the form `<METHOD>:<path>[?<sorted query>]`, optionally prefixed
//! with `user:<id>:` for per-user entries. Query parameters are decoded,
//! sorted, and re-encoded so parameter order never changes the key.

use axum::http::{Method, Uri};
use url::form_urlencoded;

/// Builds the shared cache key for a request.
pub fn cache_key(method: &Method, uri: &Uri) -> String {
    let path = uri.path();
    match uri.query().map(sorted_query).filter(|q| !q.is_empty()) {
        Some(query) => format!("{method}:{path}?{query}"),
        None => format!("{method}:{path}"),
    }
}

/// Builds the per-user cache key for a request.
pub fn user_cache_key(user_id: &str, method: &Method, uri: &Uri) -> String {
    format!("user:{user_id}:{}", cache_key(method, uri))
}

/// Normalizes a raw query string by sorting its decoded pairs.
pub fn sorted_query(query: &str) -> String {
    let mut pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    pairs.sort();

    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}
