//! Output rendering for human and robot modes.

pub mod error;
pub mod human;
pub mod robot;
pub mod views;

use crate::cli::args::OutputFormat;
use crate::core::models::{FeatureCollection, LayerDetail, QueryOptions, ServiceDescriptor};
use crate::error::Result;
use crate::util::env as env_util;
use rich_rust::{Color, ColorSystem, Segment, Style};

/// Central safety gate: whether styled output may be written to stdout.
///
/// Returns `false` for robot formats, `--no-color`, `NO_COLOR`,
/// `SVCX_PLAIN`, a non-TTY stdout, `TERM=dumb` and CI environments.
#[must_use]
pub fn should_use_rich_output(format: OutputFormat, no_color_flag: bool) -> bool {
    rich_output_allowed(format, no_color_flag, env_util::stdout_is_tty())
}

/// Same gate, for a stream whose TTY status is already known.
#[must_use]
pub fn rich_output_allowed(format: OutputFormat, no_color_flag: bool, is_tty: bool) -> bool {
    if format != OutputFormat::Human {
        tracing::debug!(
            reason = "robot_mode",
            decision = "disabled",
            "Rich output DISABLED: non-Human format"
        );
        return false;
    }

    if let Some(reason) =
        env_util::plain_output_reason(no_color_flag, &env_util::process_env, is_tty)
    {
        tracing::debug!(reason, decision = "disabled", "Rich output DISABLED");
        return false;
    }

    tracing::debug!(decision = "enabled", "Rich output enabled");
    true
}

/// Convert segments to a string, with ANSI codes unless `no_color`.
pub(crate) fn segments_to_string(segments: &[Segment], no_color: bool) -> String {
    segments
        .iter()
        .map(|seg| match &seg.style {
            Some(style) if !no_color => style.render(&seg.text, ColorSystem::TrueColor),
            _ => seg.text.to_string(),
        })
        .collect()
}

/// Style with a named foreground color, or an unstyled one if the name is unknown.
pub(crate) fn colored(name: &str) -> Style {
    Color::parse(name).map_or_else(|_| Style::new(), |color| Style::new().color(color))
}

/// Render a service description.
pub fn render_service(
    service: &ServiceDescriptor,
    url: &str,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => human::render_service(service, url, no_color),
        OutputFormat::Json => robot::render_service_json(service, url, pretty),
        OutputFormat::Md => robot::render_service_md(service, url),
    }
}

/// Render a layer with its filtered fields.
pub fn render_layer(
    layer: &LayerDetail,
    layer_url: &str,
    request_url: &str,
    filter: &str,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => human::render_layer(layer, layer_url, filter, no_color),
        OutputFormat::Json => robot::render_layer_json(layer, layer_url, request_url, filter, pretty),
        OutputFormat::Md => robot::render_layer_md(layer, layer_url, filter),
    }
}

/// Render a record preview.
pub fn render_preview(
    collection: &FeatureCollection,
    query_url: &str,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => human::render_preview(collection, query_url, no_color),
        OutputFormat::Json => robot::render_preview_json(collection, query_url, pretty),
        OutputFormat::Md => robot::render_preview_md(collection, query_url),
    }
}

/// Render a preview query URL.
pub fn render_query_url(
    url: &str,
    timeout_ms: u64,
    options: &QueryOptions,
    format: OutputFormat,
    pretty: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => human::render_query_url(url),
        OutputFormat::Json => robot::render_query_url_json(url, timeout_ms, options, pretty),
        OutputFormat::Md => robot::render_query_url_md(url, timeout_ms, options),
    }
}
