//! Endpoint configuration resolution
//!
//! Settings come from the host's persistent key-value store, read through the
//! [`SettingsSource`] capability. Resolution validates them against the
//! backend contract and always produces a usable configuration: any error
//! invalidates the whole supplied configuration atomically and falls back to
//! defaults, warnings keep the supplied values. The resolver never fails.

use serde::{Deserialize, Serialize};
use url::Url;

/// Default endpoint used when the configured one is missing or invalid
pub const DEFAULT_ENDPOINT_URL: &str = "https://api.example.com";

/// Default request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Minimum accepted request timeout in milliseconds
pub const MIN_TIMEOUT_MS: i64 = 1_000;

/// Timeouts below this are accepted with a warning
pub const LOW_TIMEOUT_MS: i64 = 5_000;

/// Timeouts above this are accepted with a warning
pub const HIGH_TIMEOUT_MS: i64 = 300_000;

/// Read-only view of the host's settings store
pub trait SettingsSource: Send + Sync {
    /// Configured backend base URL, if any
    fn endpoint_url(&self) -> Option<String>;

    /// Configured request timeout in milliseconds, if any
    fn timeout_ms(&self) -> Option<i64>;
}

/// In-memory settings, for hosts without a persistent store and for tests
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    pub endpoint_url: Option<String>,
    pub timeout_ms: Option<i64>,
}

impl MemorySettings {
    pub fn new(endpoint_url: impl Into<String>, timeout_ms: i64) -> Self {
        Self {
            endpoint_url: Some(endpoint_url.into()),
            timeout_ms: Some(timeout_ms),
        }
    }
}

impl SettingsSource for MemorySettings {
    fn endpoint_url(&self) -> Option<String> {
        self.endpoint_url.clone()
    }

    fn timeout_ms(&self) -> Option<i64> {
        self.timeout_ms
    }
}

/// Resolved operational settings for the backend client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Absolute http/https base URL of the backend
    pub base_url: String,

    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ENDPOINT_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Outcome of configuration resolution
///
/// `errors` non-empty means `config` holds the defaults; `warnings` are
/// advisory and do not block using the supplied values.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: EndpointConfig,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ResolvedConfig {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate the supplied settings against the backend contract
pub fn resolve(settings: &dyn SettingsSource) -> ResolvedConfig {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let endpoint = settings.endpoint_url();
    let base_url = match endpoint.as_deref().map(str::trim) {
        None | Some("") => {
            errors.push("Endpoint URL is required".to_string());
            None
        }
        Some(raw) => match Url::parse(raw) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {
                if url.scheme() == "http" {
                    warnings.push("Endpoint URL uses http; traffic is not encrypted".to_string());
                }
                Some(raw.to_string())
            }
            Ok(url) => {
                errors.push(format!(
                    "Endpoint URL must use http or https, got '{}'",
                    url.scheme()
                ));
                None
            }
            Err(_) => {
                errors.push("Endpoint URL must be a valid absolute URL".to_string());
                None
            }
        },
    };

    let timeout_ms = match settings.timeout_ms() {
        None => {
            errors.push("Request timeout is required and must be numeric".to_string());
            None
        }
        Some(ms) if ms < MIN_TIMEOUT_MS => {
            errors.push(format!("Request timeout must be at least {MIN_TIMEOUT_MS}ms"));
            None
        }
        Some(ms) => {
            if ms > HIGH_TIMEOUT_MS {
                warnings.push(format!("Request timeout {ms}ms is very high"));
            } else if ms < LOW_TIMEOUT_MS {
                warnings.push(format!("Request timeout {ms}ms is very low"));
            }
            Some(ms as u64)
        }
    };

    // Errors invalidate the whole configuration, not field by field.
    let config = match (base_url, timeout_ms) {
        (Some(base_url), Some(timeout_ms)) if errors.is_empty() => EndpointConfig {
            base_url,
            timeout_ms,
        },
        _ => EndpointConfig::default(),
    };

    for error in &errors {
        tracing::warn!(%error, "resolve: configuration error, using defaults");
    }
    for warning in &warnings {
        tracing::debug!(%warning, "resolve: configuration warning");
    }

    ResolvedConfig {
        config,
        errors,
        warnings,
    }
}
