//! Layer command implementation.

use crate::cli::args::LayerArgs;
use crate::cli::{client_for, plain_output};
use crate::core::models::LayerDetail;
use crate::core::url::{layer_url, strip_query};
use crate::error::Result;
use crate::render;
use crate::storage::ResolvedConfig;

/// Execute the layer command.
pub async fn execute(args: &LayerArgs, config: &ResolvedConfig) -> Result<()> {
    let client = client_for(config)?;
    let request = client.prepare_layer(&config.service_url, args.id)?;
    let layer: LayerDetail = client.fetch(&request).await?;
    let url = layer_url(&strip_query(&config.service_url), args.id);
    let filter = args.filter.as_deref().unwrap_or_default();

    tracing::debug!(
        layer_id = args.id,
        fields = layer.fields.len(),
        filter,
        "Layer loaded"
    );

    let output = render::render_layer(
        &layer,
        &url,
        &request.url,
        filter,
        config.format,
        config.pretty,
        plain_output(config),
    )?;
    println!("{output}");
    Ok(())
}
