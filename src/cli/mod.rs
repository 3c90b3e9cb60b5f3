//! CLI argument parsing and command dispatch.

pub mod args;
pub mod completions;
pub mod explore;
pub mod layer;
pub mod preview;
pub mod service;

pub use args::{Cli, Commands, OutputFormat};

use crate::core::client::ServiceClient;
use crate::error::Result;
use crate::render::should_use_rich_output;
use crate::storage::ResolvedConfig;

/// Client configured with the resolved timeout.
pub(crate) fn client_for(config: &ResolvedConfig) -> Result<ServiceClient> {
    Ok(ServiceClient::new()?.with_timeout_ms(config.timeout_ms))
}

/// Whether human output must be rendered without ANSI styling.
pub(crate) fn plain_output(config: &ResolvedConfig) -> bool {
    !should_use_rich_output(config.format, config.no_color)
}
