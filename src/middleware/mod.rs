//! HTTP Middleware Module
//!
//! Axum middleware that puts the cache manager in front of route handlers,
//! plus the stateless browser-cache header helper.
//!
//! # Middleware
//! - `cache_response` - read-through response cache (`X-Cache: HIT|MISS`)
//! - `browser_cache_headers` - `Cache-Control` / `Expires`

mod browser;
mod keys;
mod response_cache;

pub use browser::{browser_cache_headers, set_browser_cache, BrowserCache};
pub use keys::{cache_key, sorted_query, user_cache_key};
pub use response_cache::{
    cache_api_response, cache_content_response, cache_learning_path_response, cache_response,
    cache_user_api_response, invalidate_cache, AuthUser, CacheOptions, KeyScope, ResponseCache,
    DEFAULT_BYPASS_HEADER, MAX_CACHEABLE_BODY, X_CACHE,
};
