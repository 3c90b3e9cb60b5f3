//! Fix suggestion database for svcx errors.
//!
//! Provides actionable fix suggestions mapped to specific error types,
//! including commands, context explanations, and prevention tips.

// =============================================================================
// Fix Suggestion Types
// =============================================================================

/// Message used when an in-body error object has no usable message.
pub const DEFAULT_API_ERROR_MESSAGE: &str = "ArcGIS REST error";

/// Hint appended to preview failures that look like WHERE-clause problems.
pub const WHERE_CLAUSE_HINT: &str =
    " Check your WHERE clause syntax (field names, quotes, and operators).";

/// Substrings (lowercase) that mark a failure as a likely WHERE-clause problem.
const WHERE_HINT_MARKERS: &[&str] = &[
    "where",
    "sql",
    "invalid",
    "parse",
    "execute query",
    "code 400",
];

/// A fix suggestion for an error.
///
/// Contains actionable information to help users resolve errors.
#[derive(Debug, Clone)]
pub struct FixSuggestion {
    /// Primary fix commands in order of preference.
    /// These should be copy-paste ready for the terminal.
    pub commands: Vec<String>,

    /// Explanation of why this error occurred.
    pub context: String,

    /// Tips to prevent this error in the future.
    pub prevention: Option<String>,

    /// Link to documentation for more information.
    pub doc_url: Option<String>,
}

impl FixSuggestion {
    /// Creates a new fix suggestion with required fields.
    #[must_use]
    pub fn new(commands: Vec<String>, context: impl Into<String>) -> Self {
        Self {
            commands,
            context: context.into(),
            prevention: None,
            doc_url: None,
        }
    }

    /// Builder: adds prevention tips.
    #[must_use]
    pub fn with_prevention(mut self, prevention: impl Into<String>) -> Self {
        self.prevention = Some(prevention.into());
        self
    }

    /// Builder: adds documentation URL.
    #[must_use]
    pub fn with_doc_url(mut self, url: impl Into<String>) -> Self {
        self.doc_url = Some(url.into());
        self
    }
}

// =============================================================================
// WHERE clause heuristics
// =============================================================================

/// Returns the WHERE-clause hint when `message` looks like a query syntax failure.
///
/// This is presentation guidance only; it never changes how a failure is classified.
#[must_use]
pub fn where_clause_hint(message: &str) -> Option<&'static str> {
    let lower = message.to_lowercase();
    WHERE_HINT_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
        .then_some(WHERE_CLAUSE_HINT)
}

// =============================================================================
// Request failures
// =============================================================================

/// Generates fix suggestions for malformed URLs.
#[must_use]
pub fn invalid_url_suggestions(input: &str) -> Vec<FixSuggestion> {
    let shown = if input.trim().is_empty() {
        "(empty)".to_string()
    } else {
        format!("'{}'", input.trim())
    };
    vec![
        FixSuggestion::new(
            vec![
                "svcx service https://sampleserver6.arcgisonline.com/arcgis/rest/services/Census/MapServer"
                    .to_string(),
            ],
            format!(
                "The URL {shown} could not be parsed. Services are addressed by an absolute \
                 http:// or https:// URL ending in MapServer or FeatureServer."
            ),
        )
        .with_prevention("Copy the URL from the service directory page of the server.")
        .with_doc_url("https://developers.arcgis.com/rest/services-reference/enterprise/map-service/"),
    ]
}

/// Generates fix suggestions for timeout errors.
#[must_use]
pub fn timeout_suggestions(timeout_ms: u64) -> Vec<FixSuggestion> {
    let longer = (timeout_ms.saturating_mul(2)).min(60_000);
    vec![
        FixSuggestion::new(
            vec![format!("svcx --timeout-ms {longer} service <URL>")],
            format!(
                "The service did not respond within {timeout_ms} ms. Large services and \
                 busy servers can be slow to describe themselves."
            ),
        )
        .with_prevention(
            "Raise `timeout_ms` in the config file. Preview queries always use 15000 ms; \
             lower the record count or narrow the WHERE clause instead.",
        ),
    ]
}

/// Generates fix suggestions for transport failures.
#[must_use]
pub fn network_suggestions(detail: &str) -> Vec<FixSuggestion> {
    vec![
        FixSuggestion::new(
            vec!["curl -sI <URL>".to_string()],
            format!(
                "The request could not be delivered: {detail}. The host may be unreachable, \
                 refusing connections, or presenting an untrusted certificate."
            ),
        )
        .with_prevention("Check your network connection and the host name in the URL."),
    ]
}

/// Generates fix suggestions for HTTP status failures.
#[must_use]
pub fn http_status_suggestions(status: u16, status_text: &str) -> Vec<FixSuggestion> {
    let context = match status {
        401 | 403 => format!(
            "The server answered HTTP {status} {status_text}. The service is secured; \
             svcx only reads public services."
        ),
        404 => format!(
            "The server answered HTTP {status} {status_text}. The service or layer path \
             does not exist."
        ),
        429 => format!(
            "The server answered HTTP {status} {status_text}. Too many requests were sent; \
             wait before trying again."
        ),
        s if s >= 500 => format!(
            "The server answered HTTP {status} {status_text}. The service failed on its \
             side and may recover shortly."
        ),
        _ => format!("The server answered HTTP {status} {status_text}."),
    };
    vec![FixSuggestion::new(
        vec!["svcx service <URL>".to_string()],
        context,
    )]
}

/// Generates fix suggestions for bodies that are not usable JSON.
#[must_use]
pub fn protocol_suggestions(detail: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec!["curl -s '<URL>?f=pjson'".to_string()],
        format!(
            "The response was not the JSON svcx expected ({detail}). The URL may point \
             at a web page rather than a REST endpoint."
        ),
    )]
}

/// Generates fix suggestions for payload-level API errors.
#[must_use]
pub fn api_error_suggestions(message: &str) -> Vec<FixSuggestion> {
    let mut suggestion = FixSuggestion::new(
        vec!["svcx layer <LAYER_ID> --url <URL>".to_string()],
        where_clause_hint(message).map_or_else(
            || format!("The service reported an error: {message}"),
            |hint| format!("The service reported an error: {message}{hint}"),
        ),
    );
    if where_clause_hint(message).is_some() {
        suggestion = suggestion.with_prevention(
            "List the layer's fields first and quote string values with single quotes, \
             e.g. STATE_NAME = 'Texas'.",
        );
    }
    vec![suggestion]
}

// =============================================================================
// Configuration failures
// =============================================================================

/// Generates fix suggestions for config parse errors.
#[must_use]
pub fn config_parse_suggestions(path: &str, message: &str) -> Vec<FixSuggestion> {
    vec![
        FixSuggestion::new(
            vec![format!("$EDITOR {path}")],
            format!("The config file at {path} is not valid TOML: {message}"),
        )
        .with_prevention("Keep settings under the [general], [preview] and [output] tables."),
    ]
}

/// Generates fix suggestions for invalid config values.
#[must_use]
pub fn config_invalid_suggestions(key: &str, value: &str, message: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec![format!("# Fix '{key}' in the config file")],
        format!("'{value}' is not a valid value for '{key}': {message}"),
    )]
}
