//! Shared HTTP client for the HTTP-based completion providers
//!
//! One `reqwest::Client` per provider instance with connection reuse and
//! bounded timeouts. There is no retry loop here: every failure is
//! classified and handed back so the engine's model rotation decides what
//! happens next.

use reqwest::{Client, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use roadmapper_utils::error::CompletionError;
use roadmapper_utils::redaction::redact_error_message;

/// Default maximum HTTP timeout (5 minutes)
const DEFAULT_MAX_HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// Default connect timeout (30 seconds)
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest error body excerpt kept in an error message
const MAX_BODY_EXCERPT: usize = 300;

#[derive(Clone)]
pub(crate) struct HttpClient {
    client: Arc<Client>,
    max_timeout: Duration,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns `CompletionError::Misconfiguration` if the client cannot be constructed
    pub fn new() -> Result<Self, CompletionError> {
        Self::with_max_timeout(DEFAULT_MAX_HTTP_TIMEOUT)
    }

    /// # Errors
    ///
    /// Returns `CompletionError::Misconfiguration` if the client cannot be constructed
    pub fn with_max_timeout(max_timeout: Duration) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| {
                CompletionError::Misconfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client: Arc::new(client),
            max_timeout,
        })
    }

    /// Start a POST request on the shared client.
    pub fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.post(url)
    }

    /// Execute a request once with timeout `min(request_timeout, max_timeout)`.
    ///
    /// # Errors
    ///
    /// - `RateLimited` for 429
    /// - `ModelUnavailable` for 404, or a 400 whose body rejects the model
    /// - `Transient` for 5xx
    /// - `Auth` for 401/403
    /// - `Timeout` when the deadline passes
    /// - `Transport` for other 4xx responses and network failures
    pub async fn execute(
        &self,
        request_builder: reqwest::RequestBuilder,
        request_timeout: Duration,
        provider_name: &str,
    ) -> Result<Response, CompletionError> {
        let effective_timeout = request_timeout.min(self.max_timeout);

        let request = request_builder
            .timeout(effective_timeout)
            .build()
            .map_err(|e| CompletionError::Transport(format!("Failed to build request: {e}")))?;

        debug!(
            provider = provider_name,
            timeout_secs = effective_timeout.as_secs(),
            "Executing HTTP request"
        );

        match self.client.execute(request).await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }

                // Body excerpts help distinguish "unknown model" from other 400s
                let body = response.text().await.unwrap_or_default();
                let error = map_status_error(status, &body, provider_name);
                warn!(
                    provider = provider_name,
                    status = status.as_u16(),
                    kind = %error.kind(),
                    "Provider returned error status"
                );
                Err(error)
            }
            Err(e) if e.is_timeout() => Err(CompletionError::Timeout {
                duration: effective_timeout,
            }),
            Err(e) => Err(CompletionError::Transport(format!(
                "{provider_name} request failed: {}",
                redact_error_message(&e.to_string())
            ))),
        }
    }
}

/// Map a non-success HTTP status (and its body) onto the error taxonomy.
pub(crate) fn map_status_error(
    status: StatusCode,
    body: &str,
    provider_name: &str,
) -> CompletionError {
    let detail = excerpt(body);
    let message = if detail.is_empty() {
        format!("{provider_name} returned {status}")
    } else {
        format!("{provider_name} returned {status}: {detail}")
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS => CompletionError::RateLimited(message),
        StatusCode::NOT_FOUND => CompletionError::ModelUnavailable(message),
        StatusCode::BAD_REQUEST if rejects_model(body) => CompletionError::ModelUnavailable(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CompletionError::Auth(message),
        s if s.is_server_error() => CompletionError::Transient(message),
        _ => CompletionError::Transport(message),
    }
}

fn rejects_model(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("model")
        && (lower.contains("not found")
            || lower.contains("not a valid")
            || lower.contains("does not exist")
            || lower.contains("not supported")
            || lower.contains("unsupported"))
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    let cut: String = trimmed.chars().take(MAX_BODY_EXCERPT).collect();
    redact_error_message(&cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadmapper_utils::error::CompletionErrorKind;

    #[test]
    fn test_http_client_construction() {
        assert!(HttpClient::new().is_ok());
        assert!(HttpClient::with_max_timeout(Duration::from_secs(10)).is_ok());
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (StatusCode::TOO_MANY_REQUESTS, CompletionErrorKind::RateLimited),
            (StatusCode::NOT_FOUND, CompletionErrorKind::ModelUnavailable),
            (StatusCode::SERVICE_UNAVAILABLE, CompletionErrorKind::Transient),
            (StatusCode::BAD_GATEWAY, CompletionErrorKind::Transient),
            (StatusCode::UNAUTHORIZED, CompletionErrorKind::Fatal),
            (StatusCode::FORBIDDEN, CompletionErrorKind::Fatal),
            (StatusCode::UNPROCESSABLE_ENTITY, CompletionErrorKind::Fatal),
        ];
        for (status, kind) in cases {
            assert_eq!(map_status_error(status, "", "test").kind(), kind, "{status}");
        }
    }

    #[test]
    fn test_bad_request_naming_model_is_unavailable() {
        let err = map_status_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"message":"foo/bar is not a valid model ID"}}"#,
            "openrouter",
        );
        assert!(matches!(err, CompletionError::ModelUnavailable(_)));

        let err = map_status_error(StatusCode::BAD_REQUEST, "max_tokens too large", "openrouter");
        assert!(matches!(err, CompletionError::Transport(_)));
    }

    #[test]
    fn test_error_body_is_redacted_and_truncated() {
        let key = "sk-or-v1-abcdefghijklmnopqrstuvwxyz0123456789";
        let body = format!("invalid key {key} {}", "x".repeat(1000));
        let err = map_status_error(StatusCode::UNAUTHORIZED, &body, "openrouter");
        let msg = err.to_string();
        assert!(!msg.contains(key));
        assert!(msg.len() < 600);
    }
}
