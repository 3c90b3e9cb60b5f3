//! Request executor.
//!
//! One entry point, [`get_json`], issues a GET with `f=pjson` forced, bounds
//! it with a timeout, and folds transport failures, HTTP status failures and
//! in-body error objects into a single [`RequestError`].

use std::error::Error as StdError;
use std::time::{Duration, Instant};

use reqwest::{Client, ClientBuilder};
use serde_json::Value;

use crate::core::url::with_forced_format;
use crate::error::RequestError;
use crate::error::suggestions::DEFAULT_API_ERROR_MESSAGE;

/// Timeout used when none is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

/// Shortest allowed timeout.
pub const MIN_TIMEOUT_MS: u64 = 1_000;

/// Longest allowed timeout.
pub const MAX_TIMEOUT_MS: u64 = 60_000;

/// Fixed timeout for record-preview queries.
pub const PREVIEW_TIMEOUT_MS: u64 = 15_000;

/// Clamp a raw timeout to [`MIN_TIMEOUT_MS`, `MAX_TIMEOUT_MS`].
///
/// Non-finite input yields [`DEFAULT_TIMEOUT_MS`].
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn clamp_timeout_ms(raw: f64) -> u64 {
    if !raw.is_finite() {
        return DEFAULT_TIMEOUT_MS;
    }
    raw.floor()
        .clamp(MIN_TIMEOUT_MS as f64, MAX_TIMEOUT_MS as f64) as u64
}

/// Per-request options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    timeout_ms: u64,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl RequestOptions {
    /// Options with the given timeout, clamped to the allowed range.
    #[must_use]
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            timeout_ms: timeout_ms.clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS),
        }
    }

    /// Options from an untrusted numeric timeout.
    #[must_use]
    pub fn from_raw(timeout_ms: f64) -> Self {
        Self {
            timeout_ms: clamp_timeout_ms(timeout_ms),
        }
    }

    #[must_use]
    pub const fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Build the shared HTTP client.
///
/// Timeouts are applied per request by [`get_json`], not on the client.
///
/// # Errors
///
/// Returns error if client construction fails.
pub fn build_client() -> Result<Client, RequestError> {
    ClientBuilder::new()
        .user_agent(format!("svcx/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| RequestError::Network {
            detail: error_chain(&e),
        })
}

/// Fetch `url` as JSON with `f=pjson` forced.
///
/// # Errors
///
/// - `InvalidUrl` when `url` is not an absolute http(s) URL
/// - `Timeout` when the call does not finish in time
/// - `Network` on transport failure
/// - `Http` on a non-success status (the body is not read)
/// - `Protocol` when a success body is not JSON
/// - `ApiError` when the body carries an `error` object
pub async fn get_json(
    client: &Client,
    url: &str,
    options: RequestOptions,
) -> Result<Value, RequestError> {
    let final_url = with_forced_format(url)?;
    let timeout_ms = options.timeout_ms();
    let started = Instant::now();

    tracing::debug!(url = %final_url, timeout_ms, "Issuing request");

    // Dropping the in-flight future on expiry aborts the connection.
    let result = tokio::time::timeout(options.timeout(), execute(client, &final_url, timeout_ms))
        .await
        .unwrap_or(Err(RequestError::Timeout { timeout_ms }));

    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    match &result {
        Ok(_) => tracing::debug!(url = %final_url, elapsed_ms, "Request succeeded"),
        Err(e) => tracing::warn!(
            url = %final_url,
            elapsed_ms,
            kind = %e.kind(),
            error = %e,
            "Request failed"
        ),
    }
    result
}

async fn execute(client: &Client, url: &str, timeout_ms: u64) -> Result<Value, RequestError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| classify_transport(&e, timeout_ms))?;

    let status = response.status();
    tracing::trace!(status = status.as_u16(), "Response status received");
    if !status.is_success() {
        return Err(RequestError::Http {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| classify_transport(&e, timeout_ms))?;

    let data = parse_body(&body)?;
    match extract_api_error(&data) {
        Some(err) => Err(err),
        None => Ok(data),
    }
}

fn classify_transport(err: &reqwest::Error, timeout_ms: u64) -> RequestError {
    if err.is_timeout() {
        RequestError::Timeout { timeout_ms }
    } else {
        RequestError::Network {
            detail: error_chain(err),
        }
    }
}

/// The error message followed by each distinct source message.
fn error_chain(err: &dyn StdError) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        let message = inner.to_string();
        if !text.contains(&message) {
            text.push_str(": ");
            text.push_str(&message);
        }
        source = inner.source();
    }
    text
}

/// Parse a success body as JSON.
///
/// # Errors
///
/// Returns `Protocol` when the body is not valid JSON.
pub fn parse_body(body: &[u8]) -> Result<Value, RequestError> {
    serde_json::from_slice(body).map_err(|e| RequestError::Protocol {
        detail: e.to_string(),
    })
}

/// Truthiness of a JSON value: `null`, `false`, `0` and `""` are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// The in-body `error` object of a parsed response, if it has one.
#[must_use]
pub fn extract_api_error(data: &Value) -> Option<RequestError> {
    let error = data.get("error").filter(|e| is_truthy(e))?;

    let (message, code, details) = match error {
        Value::String(message) => (message.clone(), None, Vec::new()),
        Value::Object(fields) => {
            let message = fields
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let code = match fields.get("code") {
                Some(Value::String(code)) if !code.trim().is_empty() => {
                    Some(code.trim().to_string())
                }
                Some(Value::Number(code)) => Some(code.to_string()),
                _ => None,
            };
            let details = fields
                .get("details")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| match item {
                            Value::Null => None,
                            Value::String(s) => Some(s.trim().to_string()),
                            other => Some(other.to_string()),
                        })
                        .filter(|detail| !detail.is_empty())
                        .collect()
                })
                .unwrap_or_default();
            (message, code, details)
        }
        _ => (String::new(), None, Vec::new()),
    };

    let message = if message.trim().is_empty() {
        DEFAULT_API_ERROR_MESSAGE.to_string()
    } else {
        message
    };

    Some(RequestError::Api {
        message,
        code,
        details,
    })
}
