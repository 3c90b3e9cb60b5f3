//! Error rendering.
//!
//! Provides rich error rendering with fix suggestions for terminal output,
//! simple text for non-TTY environments and structured JSON for robots.

use crate::cli::args::OutputFormat;
use crate::error::{ExplorerError, FixSuggestion};
use crate::render::{colored, rich_output_allowed, segments_to_string};
use crate::util::env::stderr_is_tty;
use rich_rust::prelude::*;
use rich_rust::{Segment, Style};
use serde::Serialize;

const WRAP_WIDTH: usize = 60;
const PANEL_WIDTH: usize = 70;

// =============================================================================
// Public API
// =============================================================================

/// Render an error for stderr.
///
/// JSON and Markdown formats get structured JSON. Human format gets a rich
/// panel when stderr is an interactive terminal, plain text otherwise.
#[must_use]
pub fn render_error_full(
    error: &ExplorerError,
    format: OutputFormat,
    no_color: bool,
    pretty: bool,
) -> String {
    match format {
        OutputFormat::Json => return render_error_json(error, pretty),
        OutputFormat::Md => return render_error_json(error, true),
        OutputFormat::Human => {}
    }

    if rich_output_allowed(format, no_color, stderr_is_tty()) {
        render_rich(error)
    } else {
        render_simple(error)
    }
}

/// Render error as structured JSON for machine consumption.
#[must_use]
pub fn render_error_json(error: &ExplorerError, pretty: bool) -> String {
    let envelope = ErrorEnvelope {
        error: ErrorJson::from_error(error),
    };
    let rendered = if pretty {
        serde_json::to_string_pretty(&envelope)
    } else {
        serde_json::to_string(&envelope)
    };
    rendered.unwrap_or_else(|_| render_simple(error))
}

// =============================================================================
// Rich Terminal Rendering
// =============================================================================

fn render_rich(error: &ExplorerError) -> String {
    let suggestions = error.fix_suggestions();
    let mut lines: Vec<String> = vec![render_header(error), String::new()];

    if !suggestions.is_empty() {
        lines.push(render_suggestions_section(&suggestions));
    }

    if let Some(first) = suggestions.first() {
        if !first.context.is_empty() {
            lines.push(String::new());
            lines.push(render_wrapped_section("Why this happened:", "yellow", &first.context));
        }
        if let Some(prevention) = &first.prevention {
            lines.push(String::new());
            lines.push(render_wrapped_section("Prevention:", "green", prevention));
        }
        if let Some(doc_url) = &first.doc_url {
            lines.push(String::new());
            lines.push(segments_to_string(
                &[
                    Segment::styled("Docs: ", Style::new().dim()),
                    Segment::styled(doc_url.clone(), Style::new().underline()),
                ],
                false,
            ));
        }
    }

    render_error_panel(&lines.join("\n"), error)
}

fn render_header(error: &ExplorerError) -> String {
    let segments = vec![
        Segment::styled(error.to_string(), colored("red").bold()),
        Segment::styled(format!(" [{}]", error.error_code()), Style::new().dim()),
    ];
    segments_to_string(&segments, false)
}

fn render_suggestions_section(suggestions: &[FixSuggestion]) -> String {
    let mut lines = vec![segments_to_string(
        &[Segment::styled("How to fix:", colored("cyan").bold())],
        false,
    )];

    for (i, suggestion) in suggestions.iter().enumerate() {
        for (j, cmd) in suggestion.commands.iter().enumerate() {
            let prefix = if j == 0 {
                format!("  {}. ", i + 1)
            } else {
                "     Or: ".to_string()
            };
            lines.push(segments_to_string(
                &[
                    Segment::plain(prefix),
                    Segment::styled(cmd.clone(), colored("cyan")),
                ],
                false,
            ));
        }
    }

    lines.join("\n")
}

fn render_wrapped_section(heading: &str, color: &str, body: &str) -> String {
    let mut lines = vec![segments_to_string(
        &[Segment::styled(heading.to_string(), colored(color).bold())],
        false,
    )];
    lines.extend(wrap_text(body, WRAP_WIDTH).into_iter().map(|l| format!("  {l}")));
    lines.join("\n")
}

fn render_error_panel(content: &str, error: &ExplorerError) -> String {
    let content_lines: Vec<Vec<Segment>> = content
        .lines()
        .map(|line| vec![Segment::plain(line.to_string())])
        .collect();

    let panel = Panel::new(content_lines)
        .title(Text::new(error.category().to_string()))
        .border_style(colored("red"))
        .padding((1, 2));

    segments_to_string(&panel.render(PANEL_WIDTH), false)
}

// =============================================================================
// Simple Text Rendering
// =============================================================================

/// Render error as plain text: header plus the first runnable fix.
fn render_simple(error: &ExplorerError) -> String {
    let mut lines = vec![format!("Error [{}]: {}", error.error_code(), error)];

    // Comment lines are hints, not commands.
    let fix = error
        .fix_suggestions()
        .into_iter()
        .next()
        .and_then(|s| s.commands.into_iter().take(2).find(|c| !c.starts_with('#')));
    if let Some(cmd) = fix {
        lines.push(format!("Fix: {cmd}"));
    }

    lines.join("\n")
}

// =============================================================================
// JSON Rendering
// =============================================================================

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorJson,
}

#[derive(Serialize)]
struct ErrorJson {
    code: String,
    category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
    message: String,
    retryable: bool,
    suggestions: Vec<SuggestionJson>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SuggestionJson {
    commands: Vec<String>,
    context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    prevention: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    doc_url: Option<String>,
}

impl ErrorJson {
    fn from_error(error: &ExplorerError) -> Self {
        Self {
            code: error.error_code().to_string(),
            category: error.category().to_string(),
            kind: error.request_kind().map(|k| k.as_str()),
            message: error.to_string(),
            retryable: error.is_retryable(),
            suggestions: error
                .fix_suggestions()
                .into_iter()
                .map(|s| SuggestionJson {
                    commands: s.commands,
                    context: s.context,
                    prevention: s.prevention,
                    doc_url: s.doc_url,
                })
                .collect(),
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Greedy word wrap.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }

    lines
}
