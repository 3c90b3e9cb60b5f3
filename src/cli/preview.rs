//! Preview and query-url command implementations.

use crate::cli::args::PreviewArgs;
use crate::cli::{client_for, plain_output};
use crate::core::models::{FeatureCollection, QueryOptions, parse_finite};
use crate::error::Result;
use crate::render;
use crate::storage::ResolvedConfig;

/// Query options from the command line, falling back to configured defaults.
///
/// A count that is not a finite number keeps the configured count.
#[must_use]
pub fn preview_options(args: &PreviewArgs, defaults: &QueryOptions) -> QueryOptions {
    let where_clause = args
        .where_clause
        .as_deref()
        .unwrap_or_else(|| defaults.where_clause());
    let count = args
        .count
        .as_deref()
        .and_then(parse_finite)
        .unwrap_or_else(|| f64::from(defaults.record_count()));
    QueryOptions::new(where_clause, count)
}

/// Execute the preview command.
pub async fn execute(args: &PreviewArgs, config: &ResolvedConfig) -> Result<()> {
    let options = preview_options(args, &config.preview);
    let client = client_for(config)?;
    let request = client.prepare_preview(&config.service_url, args.id, &options)?;

    tracing::debug!(
        layer_id = args.id,
        where_clause = options.where_clause(),
        record_count = options.record_count(),
        "Fetching preview"
    );
    let records: FeatureCollection = client.fetch(&request).await?;
    tracing::info!(records = records.len(), "Preview loaded");

    let output = render::render_preview(
        &records,
        &request.url,
        config.format,
        config.pretty,
        plain_output(config),
    )?;
    println!("{output}");
    Ok(())
}

/// Execute the query-url command. Sends nothing.
pub fn execute_query_url(args: &PreviewArgs, config: &ResolvedConfig) -> Result<()> {
    let options = preview_options(args, &config.preview);
    let request = client_for(config)?.prepare_preview(&config.service_url, args.id, &options)?;

    let output = render::render_query_url(
        &request.url,
        request.timeout_ms,
        &options,
        config.format,
        config.pretty,
    )?;
    println!("{output}");
    Ok(())
}
