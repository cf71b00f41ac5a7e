//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3002`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `CALL_TIMEOUT_MS` — bound on cross-service calls (default: `5000`)
/// - `PAYMENT_SUCCESS_RATE` — settlement approval probability
///   (default: `0.9`)
/// - `RESTAURANT_SERVICE_URL` — base URL of the restaurant service; when
///   unset an in-memory directory seeded from `RESTAURANT_IDS`
///   (comma-separated) is used instead
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub call_timeout_ms: u64,
    pub payment_success_rate: f64,
    pub restaurant_service_url: Option<String>,
    pub restaurant_ids: Vec<String>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3002),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            call_timeout_ms: std::env::var("CALL_TIMEOUT_MS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(5000),
            payment_success_rate: std::env::var("PAYMENT_SUCCESS_RATE")
                .ok()
                .and_then(|r| r.parse().ok())
                .unwrap_or(0.9),
            restaurant_service_url: std::env::var("RESTAURANT_SERVICE_URL").ok(),
            restaurant_ids: std::env::var("RESTAURANT_IDS")
                .map(|ids| {
                    ids.split(',')
                        .map(str::trim)
                        .filter(|id| !id.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the cross-service call timeout.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3002,
            log_level: "info".to_string(),
            call_timeout_ms: 5000,
            payment_success_rate: 0.9,
            restaurant_service_url: None,
            restaurant_ids: Vec::new(),
        }
    }
}
