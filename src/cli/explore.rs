//! Explore command implementation.

use crate::cli::args::ExploreArgs;
use crate::cli::client_for;
use crate::core::session::Session;
use crate::error::Result;
use crate::storage::ResolvedConfig;
use crate::tui;

/// Execute the explore command.
///
/// A URL given on the command line is loaded on start; otherwise the
/// configured service only pre-fills the URL input.
pub async fn execute(args: &ExploreArgs, config: &ResolvedConfig) -> Result<()> {
    let client = client_for(config)?;
    let session = Session::new(&config.service_url, config.preview.clone());

    tracing::info!(
        service_url = %config.service_url,
        timeout_ms = config.timeout_ms,
        autoload = args.url.is_some(),
        "Starting explorer"
    );
    tui::run_explorer(session, client, args.url.clone()).await
}
