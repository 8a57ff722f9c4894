//! Backend client
//!
//! Issues the two outbound request types to the remote AI backend and
//! translates transport and HTTP outcomes into a closed error taxonomy. The
//! [`BackendClient`] trait is the seam the orchestrator depends on; the HTTP
//! implementation lives behind it so tests can substitute their own.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{self, EndpointConfig, SettingsSource};
use crate::session::{ConversationTurn, IntakeRecord};

/// Errors from backend requests
///
/// Anything that is neither a timeout nor an HTTP-level rejection is folded
/// into `Network` so the taxonomy stays closed at this boundary.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },
}

impl BackendError {
    /// Timeouts and connection failures are transient; API rejections are not
    pub fn is_retryable(&self) -> bool {
        matches!(self, BackendError::Timeout(_) | BackendError::Network(_))
    }
}

/// A successful reply from the backend
#[derive(Debug, Clone, PartialEq)]
pub struct BackendReply {
    pub message: String,
    /// True when the reply is the completed requirements document
    pub is_final: bool,
    /// Backend-reported application-level error, if any
    pub error: Option<String>,
}

/// Seam between the orchestrator and the remote backend
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// First call of a session: intake plus opening message in one payload
    async fn send_initial(
        &self,
        intake: &IntakeRecord,
        message: &str,
    ) -> Result<BackendReply, BackendError>;

    /// Subsequent calls: message plus the full prior history
    async fn send_follow_up(
        &self,
        message: &str,
        history: &[ConversationTurn],
    ) -> Result<BackendReply, BackendError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InitRequest<'a> {
    user_input: &'a IntakeRecord,
    message: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    history: &'a [ConversationTurn],
}

#[derive(Debug, Deserialize)]
struct ReplyWire {
    #[serde(default)]
    message: String,
    #[serde(rename = "isPRD", default)]
    is_prd: bool,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP implementation of [`BackendClient`]
///
/// The timeout is applied per request rather than baked into the reqwest
/// client, and each request snapshots the configuration at its start, so a
/// reload takes effect on the next request without touching one already in
/// flight. The configuration sits behind a lock so the host can reload it
/// through a shared handle while a panel holds the client.
pub struct HttpBackendClient {
    http: reqwest::Client,
    config: RwLock<EndpointConfig>,
}

impl HttpBackendClient {
    /// Resolve configuration from the host settings and build a client
    ///
    /// Resolution never fails; invalid settings fall back to defaults with
    /// diagnostics logged by the resolver.
    pub fn from_settings(settings: &dyn SettingsSource) -> Self {
        let resolved = config::resolve(settings);
        Self::with_config(resolved.config)
    }

    /// Build a client around an already-resolved configuration
    pub fn with_config(config: EndpointConfig) -> Self {
        debug!(base_url = %config.base_url, timeout_ms = config.timeout_ms, "with_config: called");
        Self {
            http: reqwest::Client::new(),
            config: RwLock::new(config),
        }
    }

    /// Re-resolve configuration without reconstructing the client
    ///
    /// Takes `&self` so the host can apply a settings change through the same
    /// shared handle a live orchestrator holds. Applies to subsequent
    /// requests only; in-flight requests keep the configuration captured at
    /// their start.
    pub fn reload_configuration(&self, settings: &dyn SettingsSource) {
        let resolved = config::resolve(settings);
        debug!(
            base_url = %resolved.config.base_url,
            timeout_ms = resolved.config.timeout_ms,
            valid = resolved.is_valid(),
            "reload_configuration: applied"
        );
        *self
            .config
            .write()
            .unwrap_or_else(PoisonError::into_inner) = resolved.config;
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> EndpointConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn post_json<T: Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<BackendReply, BackendError> {
        let config = self.config();
        let url = format!("{}{}", config.base_url.trim_end_matches('/'), path);
        let timeout = Duration::from_millis(config.timeout_ms);
        debug!(%url, timeout_ms = config.timeout_ms, "post_json: sending");

        let response = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .json(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_transport_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "post_json: backend rejected request");
            return Err(BackendError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let wire: ReplyWire = response
            .json()
            .await
            .map_err(|e| BackendError::Network(format!("Invalid response body: {e}")))?;

        debug!(is_prd = wire.is_prd, has_error = wire.error.is_some(), "post_json: reply parsed");
        Ok(BackendReply {
            message: wire.message,
            is_final: wire.is_prd,
            error: wire.error,
        })
    }
}

fn classify_transport_error(err: reqwest::Error, timeout: Duration) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout(timeout)
    } else if err.is_connect() {
        BackendError::Network(format!("Could not reach backend: {err}"))
    } else {
        // Fold anything unexpected into Network to keep the taxonomy closed.
        BackendError::Network(format!("Request failed: {err}"))
    }
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn send_initial(
        &self,
        intake: &IntakeRecord,
        message: &str,
    ) -> Result<BackendReply, BackendError> {
        debug!("send_initial: called");
        self.post_json(
            "/spec/init",
            &InitRequest {
                user_input: intake,
                message,
            },
        )
        .await
    }

    async fn send_follow_up(
        &self,
        message: &str,
        history: &[ConversationTurn],
    ) -> Result<BackendReply, BackendError> {
        debug!(history_len = history.len(), "send_follow_up: called");
        self.post_json("/spec/chat", &ChatRequest { message, history })
            .await
    }
}
