//! Error types for svcx.
//!
//! Uses `thiserror` for structured error types that map to exit codes.
//!
//! ## Two layers
//!
//! - [`RequestError`] is the single normalized failure produced by the request
//!   pipeline. Transport failures, HTTP status failures, unparsable bodies and
//!   the API's own in-body `error` objects all collapse into it.
//! - [`ExplorerError`] is the application-level error. It wraps
//!   `RequestError` and adds configuration, session and internal failures.
//!
//! ## Error Taxonomy
//!
//! Errors are categorized into five categories:
//! - **Input**: malformed URLs and unusable arguments
//! - **Network**: timeouts and transport failures
//! - **Remote**: HTTP status failures, malformed bodies, payload-level API errors
//! - **Configuration**: config file parsing, validation, or missing values
//! - **Internal**: unexpected errors, bugs, or unclassified issues
//!
//! Each error has a stable error code (e.g., `SVCX-N001`) for programmatic handling.
//!
//! ## Fix Suggestions
//!
//! Each error can provide actionable fix suggestions via
//! [`ExplorerError::fix_suggestions()`].

pub mod suggestions;

use serde::Serialize;
use thiserror::Error;

pub use suggestions::{FixSuggestion, WHERE_CLAUSE_HINT, where_clause_hint};

// =============================================================================
// Request errors
// =============================================================================

/// Classification of a failed request, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestErrorKind {
    /// Malformed input detected before any network call.
    InvalidUrl,
    /// The call exceeded its time bound and was aborted.
    Timeout,
    /// Transport-level failure (DNS, refused connection, TLS, body read).
    Network,
    /// Non-success HTTP status.
    Http,
    /// Success status but the body was not valid JSON (or not the expected shape).
    Protocol,
    /// Error object embedded in an otherwise successful response.
    ApiError,
}

impl RequestErrorKind {
    /// Short label used in logs and robot output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidUrl => "invalid_url",
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::Http => "http",
            Self::Protocol => "protocol",
            Self::ApiError => "api_error",
        }
    }
}

impl std::fmt::Display for RequestErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized failure of one outbound call.
///
/// The `Display` output is the human-readable message shown to users.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The URL was empty or not an absolute http(s) URL.
    #[error("Invalid URL. Paste a full URL starting with http:// or https://")]
    InvalidUrl { input: String },

    /// The call did not complete within `timeout_ms`.
    #[error("Request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// Transport failure before a response status was available.
    #[error("Network error while requesting URL: {detail}")]
    Network { detail: String },

    /// The server answered with a non-success status.
    #[error("HTTP {status} {status_text}")]
    Http { status: u16, status_text: String },

    /// The body of a successful response could not be used.
    #[error("Malformed response from server: {detail}")]
    Protocol { detail: String },

    /// The response body carried an `error` object.
    #[error("{}", format_api_message(.message, .code.as_deref(), .details))]
    Api {
        message: String,
        code: Option<String>,
        details: Vec<String>,
    },
}

impl RequestError {
    /// The classification of this error.
    #[must_use]
    pub const fn kind(&self) -> RequestErrorKind {
        match self {
            Self::InvalidUrl { .. } => RequestErrorKind::InvalidUrl,
            Self::Timeout { .. } => RequestErrorKind::Timeout,
            Self::Network { .. } => RequestErrorKind::Network,
            Self::Http { .. } => RequestErrorKind::Http,
            Self::Protocol { .. } => RequestErrorKind::Protocol,
            Self::Api { .. } => RequestErrorKind::ApiError,
        }
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error was caused by the time bound.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Format a payload-level error the way it is shown to users.
///
/// `"<message> (code <code>)."` followed by `" Details: a | b"` when details
/// exist. A message that already ends in a period does not get a second one.
#[must_use]
pub fn format_api_message(message: &str, code: Option<&str>, details: &[String]) -> String {
    let message = message.trim();
    let mut out = if message.is_empty() {
        suggestions::DEFAULT_API_ERROR_MESSAGE.to_string()
    } else {
        message.to_string()
    };

    if let Some(code) = code.filter(|c| !c.trim().is_empty()) {
        out.push_str(&format!(" (code {})", code.trim()));
    }
    out.push('.');

    let details: Vec<&str> = details
        .iter()
        .map(|d| d.trim())
        .filter(|d| !d.is_empty())
        .collect();
    if !details.is_empty() {
        out.push_str(" Details: ");
        out.push_str(&details.join(" | "));
    }

    collapse_trailing_periods(out)
}

fn collapse_trailing_periods(mut text: String) -> String {
    while text.ends_with("..") {
        text.pop();
    }
    if text.contains(".. Details:") {
        text = text.replacen(".. Details:", ". Details:", 1);
    }
    text
}

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed input (URLs, arguments).
    Input,
    /// Timeouts and transport failures.
    Network,
    /// The remote service answered with a failure.
    Remote,
    /// Configuration issues (parse errors, invalid values).
    Configuration,
    /// Internal errors (bugs, unexpected state, unclassified).
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Input => "Input error",
            Self::Network => "Network error",
            Self::Remote => "Service error",
            Self::Configuration => "Configuration error",
            Self::Internal => "Internal error",
        }
    }

    /// Returns a short code prefix for this category.
    #[must_use]
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            Self::Input => "I",
            Self::Network => "N",
            Self::Remote => "R",
            Self::Configuration => "C",
            Self::Internal => "X",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// Unexpected failure, transport failure
    GeneralError = 1,
    /// Invalid URL, invalid arguments or configuration
    InvalidInput = 2,
    /// HTTP status, malformed body or payload-level API error
    RemoteError = 3,
    /// Timeout
    Timeout = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as Self
    }
}

// =============================================================================
// Application errors
// =============================================================================

/// Main error type for svcx operations.
#[derive(Error, Debug)]
pub enum ExplorerError {
    /// A request failed.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// An operation needs a loaded service.
    #[error("no service loaded")]
    NoServiceLoaded,

    /// An operation needs a selected layer.
    #[error("Select a layer before previewing records.")]
    NoLayerSelected,

    /// Generic configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Error parsing configuration file.
    #[error("config parse error at {path}: {message}")]
    ConfigParse { path: String, message: String },

    /// Invalid value in configuration.
    #[error("invalid config value for '{key}': {message}")]
    ConfigInvalid {
        key: String,
        value: String,
        message: String,
    },

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExplorerError {
    /// Map error to process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::Request(err) => match err {
                RequestError::InvalidUrl { .. } => ExitCode::InvalidInput,
                RequestError::Timeout { .. } => ExitCode::Timeout,
                RequestError::Network { .. } => ExitCode::GeneralError,
                RequestError::Http { .. }
                | RequestError::Protocol { .. }
                | RequestError::Api { .. } => ExitCode::RemoteError,
            },

            Self::NoServiceLoaded
            | Self::NoLayerSelected
            | Self::Config(_)
            | Self::ConfigParse { .. }
            | Self::ConfigInvalid { .. } => ExitCode::InvalidInput,

            Self::Io(_) | Self::Json(_) | Self::Other(_) => ExitCode::GeneralError,
        }
    }

    /// Returns the error category for classification and routing.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Request(err) => match err {
                RequestError::InvalidUrl { .. } => ErrorCategory::Input,
                RequestError::Timeout { .. } | RequestError::Network { .. } => {
                    ErrorCategory::Network
                }
                RequestError::Http { .. }
                | RequestError::Protocol { .. }
                | RequestError::Api { .. } => ErrorCategory::Remote,
            },
            Self::NoServiceLoaded | Self::NoLayerSelected => ErrorCategory::Input,
            Self::Config(_) | Self::ConfigParse { .. } | Self::ConfigInvalid { .. } => {
                ErrorCategory::Configuration
            }
            Self::Io(_) | Self::Json(_) | Self::Other(_) => ErrorCategory::Internal,
        }
    }

    /// Returns a stable error code for programmatic handling.
    ///
    /// Format: `SVCX-{category}{number}`.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Request(err) => match err {
                RequestError::InvalidUrl { .. } => "SVCX-I001",
                RequestError::Timeout { .. } => "SVCX-N001",
                RequestError::Network { .. } => "SVCX-N002",
                RequestError::Http { .. } => "SVCX-R001",
                RequestError::Protocol { .. } => "SVCX-R002",
                RequestError::Api { .. } => "SVCX-R003",
            },
            Self::NoServiceLoaded => "SVCX-I010",
            Self::NoLayerSelected => "SVCX-I011",
            Self::ConfigParse { .. } => "SVCX-C001",
            Self::ConfigInvalid { .. } => "SVCX-C002",
            Self::Config(_) => "SVCX-C003",
            Self::Io(_) => "SVCX-X001",
            Self::Json(_) => "SVCX-X002",
            Self::Other(_) => "SVCX-X099",
        }
    }

    /// The request error kind, when this error came from the pipeline.
    #[must_use]
    pub const fn request_kind(&self) -> Option<RequestErrorKind> {
        match self {
            Self::Request(err) => Some(err.kind()),
            _ => None,
        }
    }

    /// Returns whether a caller could reasonably retry the same call.
    ///
    /// Nothing in svcx retries automatically.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Request(err) => match err {
                RequestError::Timeout { .. } | RequestError::Network { .. } => true,
                RequestError::Http { status, .. } => *status >= 500 || *status == 429,
                _ => false,
            },
            _ => false,
        }
    }

    /// Returns actionable fix suggestions for this error.
    #[must_use]
    pub fn fix_suggestions(&self) -> Vec<FixSuggestion> {
        match self {
            Self::Request(err) => match err {
                RequestError::InvalidUrl { input } => suggestions::invalid_url_suggestions(input),
                RequestError::Timeout { timeout_ms } => {
                    suggestions::timeout_suggestions(*timeout_ms)
                }
                RequestError::Network { detail } => suggestions::network_suggestions(detail),
                RequestError::Http {
                    status,
                    status_text,
                } => suggestions::http_status_suggestions(*status, status_text),
                RequestError::Protocol { detail } => suggestions::protocol_suggestions(detail),
                RequestError::Api { .. } => suggestions::api_error_suggestions(&err.to_string()),
            },
            Self::NoServiceLoaded => vec![FixSuggestion::new(
                vec!["svcx service <URL>".to_string()],
                "Load a service before selecting layers.",
            )],
            Self::NoLayerSelected => vec![FixSuggestion::new(
                vec!["svcx preview <LAYER_ID> --url <URL>".to_string()],
                "Previewing records needs a layer or table id.",
            )],
            Self::ConfigParse { path, message } => {
                suggestions::config_parse_suggestions(path, message)
            }
            Self::ConfigInvalid {
                key,
                value,
                message,
            } => suggestions::config_invalid_suggestions(key, value, message),
            Self::Config(msg) => vec![FixSuggestion::new(
                vec!["svcx --help".to_string()],
                format!("Configuration error: {msg}"),
            )],
            Self::Io(err) => vec![FixSuggestion::new(
                vec!["# Check file permissions and disk space".to_string()],
                format!("I/O error: {err}. Check file permissions and available disk space."),
            )],
            Self::Json(err) => vec![FixSuggestion::new(
                Vec::new(),
                format!("JSON error: {err}. The data may be in an unexpected format."),
            )],
            Self::Other(err) => vec![FixSuggestion::new(
                Vec::new(),
                format!("Unexpected error: {err}. Please report this issue."),
            )],
        }
    }
}

/// Result type alias for svcx operations.
pub type Result<T> = std::result::Result<T, ExplorerError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn api(message: &str, code: Option<&str>, details: &[&str]) -> RequestError {
        RequestError::Api {
            message: message.to_string(),
            code: code.map(str::to_string),
            details: details.iter().map(|d| (*d).to_string()).collect(),
        }
    }

    #[test]
    fn api_message_with_code() {
        let err = api("Invalid field", Some("400"), &[]);
        assert_eq!(err.to_string(), "Invalid field (code 400).");
    }

    #[test]
    fn api_message_with_details() {
        let err = api(
            "Unable to complete operation.",
            Some("400"),
            &["'Invalid field: POPX' parameter is invalid", "Check names"],
        );
        assert_eq!(
            err.to_string(),
            "Unable to complete operation. (code 400). Details: 'Invalid field: POPX' parameter is invalid | Check names"
        );
    }

    #[test]
    fn api_message_without_code_collapses_period() {
        let err = api("Unable to complete operation.", None, &[]);
        assert_eq!(err.to_string(), "Unable to complete operation.");
    }

    #[test]
    fn api_message_trailing_detail_periods_collapse() {
        let err = api("Failed", Some("500"), &["Query failed.."]);
        assert_eq!(err.to_string(), "Failed (code 500). Details: Query failed.");
    }

    #[test]
    fn api_message_defaults_when_blank() {
        let err = api("   ", None, &[]);
        assert_eq!(err.to_string(), "ArcGIS REST error.");
    }

    #[test]
    fn request_error_kinds() {
        assert_eq!(
            RequestError::Timeout { timeout_ms: 1000 }.kind(),
            RequestErrorKind::Timeout
        );
        assert_eq!(
            RequestError::Http {
                status: 500,
                status_text: "Internal Server Error".to_string()
            }
            .status(),
            Some(500)
        );
        assert_eq!(api("x", None, &[]).kind(), RequestErrorKind::ApiError);
    }

    #[test]
    fn http_error_message() {
        let err = RequestError::Http {
            status: 404,
            status_text: "Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 404 Not Found");
    }

    #[test]
    fn exit_codes_follow_kind() {
        let err = ExplorerError::from(RequestError::InvalidUrl {
            input: "nope".to_string(),
        });
        assert_eq!(err.exit_code(), ExitCode::InvalidInput);

        let err = ExplorerError::from(RequestError::Timeout { timeout_ms: 15000 });
        assert_eq!(err.exit_code(), ExitCode::Timeout);

        let err = ExplorerError::from(api("bad", Some("400"), &[]));
        assert_eq!(err.exit_code(), ExitCode::RemoteError);

        let err = ExplorerError::Config("bad".to_string());
        assert_eq!(err.exit_code(), ExitCode::InvalidInput);
    }

    #[test]
    fn categories() {
        let err = ExplorerError::from(RequestError::Network {
            detail: "connection refused".to_string(),
        });
        assert_eq!(err.category(), ErrorCategory::Network);

        let err = ExplorerError::from(RequestError::Protocol {
            detail: "expected value".to_string(),
        });
        assert_eq!(err.category(), ErrorCategory::Remote);

        let err = ExplorerError::Other(anyhow::anyhow!("boom"));
        assert_eq!(err.category(), ErrorCategory::Internal);
    }

    #[test]
    fn error_codes_are_unique() {
        use std::collections::HashSet;

        let errors = [
            ExplorerError::from(RequestError::InvalidUrl {
                input: String::new(),
            }),
            ExplorerError::from(RequestError::Timeout { timeout_ms: 0 }),
            ExplorerError::from(RequestError::Network {
                detail: String::new(),
            }),
            ExplorerError::from(RequestError::Http {
                status: 500,
                status_text: String::new(),
            }),
            ExplorerError::from(RequestError::Protocol {
                detail: String::new(),
            }),
            ExplorerError::from(api("", None, &[])),
            ExplorerError::NoServiceLoaded,
            ExplorerError::NoLayerSelected,
            ExplorerError::Config(String::new()),
            ExplorerError::ConfigParse {
                path: String::new(),
                message: String::new(),
            },
            ExplorerError::ConfigInvalid {
                key: String::new(),
                value: String::new(),
                message: String::new(),
            },
        ];

        let codes: Vec<&str> = errors.iter().map(ExplorerError::error_code).collect();
        let unique: HashSet<_> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len(), "Error codes should be unique");
        assert!(codes.iter().all(|c| c.starts_with("SVCX-")));
    }

    #[test]
    fn retryable_errors() {
        assert!(ExplorerError::from(RequestError::Timeout { timeout_ms: 1000 }).is_retryable());
        assert!(
            ExplorerError::from(RequestError::Http {
                status: 503,
                status_text: "Service Unavailable".to_string()
            })
            .is_retryable()
        );
        assert!(
            !ExplorerError::from(RequestError::Http {
                status: 404,
                status_text: "Not Found".to_string()
            })
            .is_retryable()
        );
        assert!(!ExplorerError::from(api("Invalid field", Some("400"), &[])).is_retryable());
    }

    #[test]
    fn every_error_has_suggestions() {
        let err = ExplorerError::from(RequestError::Timeout { timeout_ms: 15000 });
        assert!(!err.fix_suggestions().is_empty());

        let err = ExplorerError::from(api("Invalid field", Some("400"), &[]));
        let suggestions = err.fix_suggestions();
        assert!(suggestions[0].context.contains("WHERE clause"));
    }
}
