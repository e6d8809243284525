//! Response cache middleware.
//!
//! Wraps route handlers with a read-through cache over the `CacheManager`:
//! a hit is served directly, a miss runs the handler and stores its JSON
//! body when the status is in `[200, 400)`.
//!
//! ```ignore
//! let widgets = cache_api_response(cache.clone(), CacheOptions::default());
//! let app = Router::new()
//!     .route("/api/widgets", get(list_widgets))
//!     .route_layer(middleware::from_fn_with_state(widgets, cache_response));
//! ```

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body, Bytes, HttpBody},
    extract::{OriginalUri, Request, State},
    http::{header, response::Parts, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use futures_util::stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::keys::{cache_key, user_cache_key};
use crate::cache::{CacheManager, Namespace};

/// Response header reporting `HIT` or `MISS`.
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Request header that skips the cache for one call.
pub const DEFAULT_BYPASS_HEADER: HeaderName = HeaderName::from_static("x-bypass-cache");

/// Largest response body that will be buffered for caching.
pub const MAX_CACHEABLE_BODY: u64 = 1024 * 1024;

const HIT: HeaderValue = HeaderValue::from_static("HIT");
const MISS: HeaderValue = HeaderValue::from_static("MISS");

// == Options ==
/// Caller overrides; `None` keeps the factory's default.
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    /// TTL in seconds for stored responses
    pub ttl: Option<u64>,
    /// Namespace the responses are stored in
    pub namespace: Option<Namespace>,
    /// Header whose presence skips caching
    pub bypass_header: Option<HeaderName>,
    /// Request methods eligible for caching
    pub methods: Option<Vec<Method>>,
}

/// Whether entries are shared or partitioned by authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScope {
    Shared,
    PerUser,
}

/// Authenticated caller, inserted into request extensions by the
/// authentication layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
}

impl AuthUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Stored form of a cached response.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedResponse {
    status: u16,
    /// Redirect target, replayed with 3xx hits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    body: Value,
}

// == Response Cache ==
/// Middleware state: the cache manager plus one route group's policy.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    cache: Arc<CacheManager>,
    ttl: u64,
    namespace: Namespace,
    bypass_header: HeaderName,
    methods: Vec<Method>,
    scope: KeyScope,
}

impl ResponseCache {
    fn with_defaults(
        cache: Arc<CacheManager>,
        options: CacheOptions,
        ttl: u64,
        namespace: Namespace,
        scope: KeyScope,
    ) -> Self {
        Self {
            cache,
            ttl: options.ttl.unwrap_or(ttl),
            namespace: options.namespace.unwrap_or(namespace),
            bypass_header: options.bypass_header.unwrap_or(DEFAULT_BYPASS_HEADER),
            methods: options.methods.unwrap_or_else(|| vec![Method::GET]),
            scope,
        }
    }

    pub fn ttl(&self) -> u64 {
        self.ttl
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn scope(&self) -> KeyScope {
        self.scope
    }

    fn is_bypassed(&self, headers: &HeaderMap) -> bool {
        headers
            .get(&self.bypass_header)
            .is_some_and(|value| !value.is_empty())
    }

    /// Cache key for the request, or `None` when a per-user cache sees no
    /// authenticated user.
    ///
    /// Uses the URI as received by the outermost router; inside a nested
    /// router `request.uri()` has lost its mount prefix.
    fn key_for(&self, request: &Request) -> Option<String> {
        let uri = request
            .extensions()
            .get::<OriginalUri>()
            .map_or(request.uri(), |original| &original.0);

        match self.scope {
            KeyScope::Shared => Some(cache_key(request.method(), uri)),
            KeyScope::PerUser => request
                .extensions()
                .get::<AuthUser>()
                .map(|user| user_cache_key(&user.id, request.method(), uri)),
        }
    }

    fn lookup(&self, key: &str) -> Option<Response> {
        let cached: CachedResponse = self.cache.get_as(self.namespace, key)?;
        let status = StatusCode::from_u16(cached.status).unwrap_or(StatusCode::OK);

        let mut response = (status, Json(cached.body)).into_response();
        let headers = response.headers_mut();
        if let Some(location) = cached
            .location
            .and_then(|location| HeaderValue::from_str(&location).ok())
        {
            headers.insert(header::LOCATION, location);
        }
        headers.insert(X_CACHE, HIT);
        Some(response)
    }

    /// Stores the handler's JSON body when the response is cacheable and
    /// hands back an equivalent response.
    async fn capture(&self, key: &str, response: Response) -> Response {
        let status = response.status();
        if !(status.is_success() || status.is_redirection()) {
            debug!(key, %status, "Response status not cacheable");
            return response;
        }
        if !is_json(response.headers()) {
            debug!(key, "Response is not JSON, not caching");
            return response;
        }
        match response.body().size_hint().exact() {
            Some(len) if len <= MAX_CACHEABLE_BODY => {}
            _ => {
                debug!(key, "Response body size unknown or too large, not caching");
                return response;
            }
        }

        let (parts, body) = response.into_parts();
        let bytes = match to_bytes(body, usize::MAX).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(key, %status, error = %err, "Handler response body failed, not caching");
                return with_failed_body(parts, err);
            }
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(body) => {
                let location = parts
                    .headers
                    .get(header::LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_owned);
                let cached = CachedResponse {
                    status: status.as_u16(),
                    location,
                    body,
                };
                self.cache.set(self.namespace, key, &cached, Some(self.ttl));
            }
            Err(err) => debug!(key, error = %err, "Response body is not valid JSON"),
        }

        Response::from_parts(parts, Body::from(bytes))
    }
}

// == Factories ==
/// General-purpose response cache: 5 minutes in the `default` namespace.
pub fn cache_api_response(cache: Arc<CacheManager>, options: CacheOptions) -> ResponseCache {
    ResponseCache::with_defaults(cache, options, 300, Namespace::Default, KeyScope::Shared)
}

/// Per-user response cache: 1 minute in the `user` namespace, keyed by the
/// authenticated user. Requests without an `AuthUser` are never cached.
pub fn cache_user_api_response(cache: Arc<CacheManager>, options: CacheOptions) -> ResponseCache {
    ResponseCache::with_defaults(cache, options, 60, Namespace::User, KeyScope::PerUser)
}

/// Learning-path data: 10 minutes in the `api` namespace.
pub fn cache_learning_path_response(
    cache: Arc<CacheManager>,
    options: CacheOptions,
) -> ResponseCache {
    ResponseCache::with_defaults(cache, options, 600, Namespace::Api, KeyScope::Shared)
}

/// Near-static content: 1 hour in the `content` namespace.
pub fn cache_content_response(cache: Arc<CacheManager>, options: CacheOptions) -> ResponseCache {
    ResponseCache::with_defaults(cache, options, 3600, Namespace::Content, KeyScope::Shared)
}

// == Middleware ==
/// Read-through cache around the wrapped handler.
///
/// Never fails the request because of the cache: manager faults surface
/// only as misses.
#[instrument(skip_all, fields(method = %request.method(), path = %request.uri().path()))]
pub async fn cache_response(
    State(policy): State<ResponseCache>,
    request: Request,
    next: Next,
) -> Response {
    if !policy.methods.contains(request.method()) {
        return next.run(request).await;
    }

    if policy.is_bypassed(request.headers()) {
        debug!("Bypass header present, skipping cache");
        return next.run(request).await;
    }

    let Some(key) = policy.key_for(&request) else {
        debug!("No authenticated user, skipping per-user cache");
        return next.run(request).await;
    };

    if let Some(response) = policy.lookup(&key) {
        debug!(cache = %policy.namespace, key = %key, outcome = "hit", "serving cached response");
        return response;
    }

    debug!(cache = %policy.namespace, key = %key, outcome = "miss", "cache miss, executing handler");

    let response = next.run(request).await;
    let mut response = policy.capture(&key, response).await;
    response.headers_mut().insert(X_CACHE, MISS);
    response
}

// == Invalidation ==
/// Evicts one entry after a write; returns whether an entry was removed.
pub fn invalidate_cache(cache: &CacheManager, namespace: Namespace, key: &str) -> bool {
    cache.del(namespace, key)
}

/// Hands the handler's status and headers back with a body that yields the
/// read error, so the failure reaches the client as the handler's own.
fn with_failed_body(parts: Parts, err: axum::Error) -> Response {
    let body = Body::from_stream(stream::once(async move { Err::<Bytes, _>(err) }));
    Response::from_parts(parts, body)
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| {
            let mime = ct.split(';').next().unwrap_or("").trim();
            mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::Uri, routing::get, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    fn manager() -> Arc<CacheManager> {
        Arc::new(CacheManager::default())
    }

    #[test]
    fn test_factory_defaults() {
        let api = cache_api_response(manager(), CacheOptions::default());
        assert_eq!(
            (api.ttl(), api.namespace(), api.scope()),
            (300, Namespace::Default, KeyScope::Shared)
        );
        assert_eq!(api.methods, vec![Method::GET]);
        assert_eq!(api.bypass_header, DEFAULT_BYPASS_HEADER);

        let user = cache_user_api_response(manager(), CacheOptions::default());
        assert_eq!(
            (user.ttl(), user.namespace(), user.scope()),
            (60, Namespace::User, KeyScope::PerUser)
        );

        let learning = cache_learning_path_response(manager(), CacheOptions::default());
        assert_eq!((learning.ttl(), learning.namespace()), (600, Namespace::Api));

        let content = cache_content_response(manager(), CacheOptions::default());
        assert_eq!((content.ttl(), content.namespace()), (3600, Namespace::Content));
    }

    #[test]
    fn test_options_override_defaults() {
        let policy = cache_content_response(
            manager(),
            CacheOptions {
                ttl: Some(5),
                namespace: Some(Namespace::System),
                bypass_header: Some(HeaderName::from_static("x-no-cache")),
                methods: Some(vec![Method::GET, Method::POST]),
            },
        );

        assert_eq!(policy.ttl(), 5);
        assert_eq!(policy.namespace(), Namespace::System);
        assert_eq!(policy.bypass_header, HeaderName::from_static("x-no-cache"));
        assert_eq!(policy.methods, vec![Method::GET, Method::POST]);
    }

    #[test]
    fn test_is_bypassed_requires_value() {
        let policy = cache_api_response(manager(), CacheOptions::default());

        let mut headers = HeaderMap::new();
        assert!(!policy.is_bypassed(&headers));

        let name = HeaderName::from_bytes(b"X-Bypass-Cache").unwrap();
        headers.insert(name.clone(), HeaderValue::from_static(""));
        assert!(!policy.is_bypassed(&headers));

        headers.insert(name, HeaderValue::from_static("1"));
        assert!(policy.is_bypassed(&headers));
    }

    #[test]
    fn test_per_user_key_requires_auth() {
        let policy = cache_user_api_response(manager(), CacheOptions::default());

        let mut request = Request::builder()
            .uri("/api/progress")
            .body(Body::empty())
            .unwrap();
        assert_eq!(policy.key_for(&request), None);

        request.extensions_mut().insert(AuthUser::new("7"));
        assert_eq!(
            policy.key_for(&request).as_deref(),
            Some("user:7:GET:/api/progress")
        );
    }

    #[test]
    fn test_is_json() {
        let mut headers = HeaderMap::new();
        assert!(!is_json(&headers));

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(is_json(&headers));

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json; charset=utf-8"),
        );
        assert!(is_json(&headers));

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
        assert!(!is_json(&headers));
    }

    #[test]
    fn test_key_uses_original_uri() {
        let policy = cache_api_response(manager(), CacheOptions::default());

        let mut request = Request::builder()
            .uri("/widgets?b=2&a=1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(policy.key_for(&request).as_deref(), Some("GET:/widgets?a=1&b=2"));

        request
            .extensions_mut()
            .insert(OriginalUri(Uri::from_static("/v2/widgets?b=2&a=1")));
        assert_eq!(
            policy.key_for(&request).as_deref(),
            Some("GET:/v2/widgets?a=1&b=2")
        );
    }

    #[tokio::test]
    async fn test_poisoned_namespace_fails_open() {
        let cache = manager();
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = cache_api_response(cache.clone(), CacheOptions::default());
        cache.poison_namespace(policy.namespace());

        let handler_calls = calls.clone();
        let app = Router::new()
            .route(
                "/api/widgets",
                get(move || {
                    let calls = handler_calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Json(serde_json::json!({ "id": 1 }))
                    }
                }),
            )
            .route_layer(axum::middleware::from_fn_with_state(policy, cache_response));

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri("/api/widgets")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.headers()[&X_CACHE], "MISS");
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert_eq!(&bytes[..], br#"{"id":1}"#);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.get_stats().operations.sets, 0);
    }

    #[tokio::test]
    async fn test_failed_body_keeps_handler_status() {
        let (parts, _) = (
            StatusCode::ACCEPTED,
            [(header::CONTENT_TYPE, "application/json")],
        )
            .into_response()
            .into_parts();

        let response = with_failed_body(parts, axum::Error::new("upstream reset"));

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(is_json(response.headers()));
        assert!(to_bytes(response.into_body(), usize::MAX).await.is_err());
    }

    #[test]
    fn test_invalidate_cache() {
        let cache = manager();
        cache.set(Namespace::Api, "GET:/api/paths", &1, None);

        assert!(invalidate_cache(&cache, Namespace::Api, "GET:/api/paths"));
        assert!(!invalidate_cache(&cache, Namespace::Api, "GET:/api/paths"));
    }
}
