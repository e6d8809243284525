//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache layer and its admin surface.
///
/// Backing-store variants never reach an HTTP client: the cache manager
/// converts them into a miss or `false` before returning.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A namespace lock was poisoned by a panic in another thread
    #[error("Namespace store unavailable: {0}")]
    StoreUnavailable(String),

    /// A value could not be converted to or from its JSON document
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Missing or malformed admin credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Admin surface disabled or credentials rejected
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            CacheError::Forbidden(_) => StatusCode::FORBIDDEN,
            CacheError::StoreUnavailable(_)
            | CacheError::Serialization(_)
            | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_maps_to_401() {
        let response = CacheError::Unauthorized("missing token".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_forbidden_maps_to_403() {
        let response = CacheError::Forbidden("disabled".into()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_store_fault_maps_to_500() {
        let response = CacheError::StoreUnavailable("user".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
