//! Service command implementation.

use crate::cli::args::ServiceArgs;
use crate::cli::{client_for, plain_output};
use crate::error::Result;
use crate::render;
use crate::storage::ResolvedConfig;

/// Execute the service command.
///
/// `args.url` has already been folded into `config.service_url`.
pub async fn execute(args: &ServiceArgs, config: &ResolvedConfig) -> Result<()> {
    let client = client_for(config)?;
    let request = client.prepare_service(&config.service_url)?;

    tracing::debug!(
        url = %request.url,
        from_args = args.url.is_some(),
        source = %config.sources.service_url,
        "Fetching service"
    );
    let service = client.fetch_service(&config.service_url).await?;
    tracing::info!(
        layers = service.layers.len(),
        tables = service.tables.len(),
        "Service loaded"
    );

    let output = render::render_service(
        &service,
        &request.url,
        config.format,
        config.pretty,
        plain_output(config),
    )?;
    println!("{output}");
    Ok(())
}
