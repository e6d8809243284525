//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies not already
//! provided by the cache and performance modules.

use serde::Serialize;

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Seconds since the process started
    pub uptime_secs: u64,
    /// Resident memory in MB, if it could be read
    pub memory_mb: Option<f64>,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(uptime_secs: u64, memory_mb: Option<f64>) -> Self {
        Self {
            status: "healthy".to_string(),
            uptime_secs,
            memory_mb: memory_mb.map(|mb| (mb * 100.0).round() / 100.0),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Acknowledgement for admin actions (POST /reset, POST /cache/flush)
#[derive(Debug, Clone, Serialize)]
pub struct ActionResponse {
    /// Success message
    pub message: String,
    /// When the action ran, ISO 8601
    pub timestamp: String,
}

impl ActionResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
