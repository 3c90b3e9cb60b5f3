//! Storage for configuration and application paths.

pub mod config;
pub mod paths;

pub use config::{
    Config, ConfigSource, ConfigSources, ENV_CONFIG, ENV_FORMAT, ENV_NO_COLOR, ENV_NO_COLOR_STD,
    ENV_PRETTY, ENV_SERVICE_URL, ENV_TIMEOUT_MS, ENV_VERBOSE, ResolvedConfig,
};
pub use paths::AppPaths;
