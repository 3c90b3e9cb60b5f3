//! Configuration file loading and management.
//!
//! Loads configuration from:
//! - Linux: `~/.config/svcx/config.toml`
//! - macOS: `~/Library/Application Support/svcx/config.toml`
//! - Windows: `%APPDATA%/svcx/config.toml`
//!
//! ## Precedence
//!
//! Settings are resolved with the following precedence (highest first):
//! 1. CLI flags and arguments
//! 2. Environment variables
//! 3. Config file
//! 4. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `SVCX_SERVICE_URL`: Service loaded when no URL is given
//! - `SVCX_TIMEOUT_MS`: Timeout for service and layer requests
//! - `SVCX_FORMAT`: Output format (human, json, md)
//! - `SVCX_NO_COLOR` or `NO_COLOR`: Disable colors
//! - `SVCX_PRETTY`: Pretty-print JSON output
//! - `SVCX_VERBOSE`: Enable verbose logging
//! - `SVCX_CONFIG`: Override config file path

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::cli::args::{Cli, OutputFormat};
use crate::core::http::{DEFAULT_TIMEOUT_MS, MAX_TIMEOUT_MS, MIN_TIMEOUT_MS, RequestOptions};
use crate::core::logging::LogLevel;
use crate::core::models::{
    DEFAULT_RECORD_COUNT, DEFAULT_WHERE, MAX_RECORD_COUNT, MIN_RECORD_COUNT, QueryOptions,
};
use crate::core::session::DEFAULT_SERVICE_URL;
use crate::core::url::parse_http_url;
use crate::error::{ExplorerError, Result};
use crate::util::env::process_env;

// =============================================================================
// Environment Variable Names
// =============================================================================

/// Environment variable for the default service URL.
pub const ENV_SERVICE_URL: &str = "SVCX_SERVICE_URL";
/// Environment variable for the request timeout in milliseconds.
pub const ENV_TIMEOUT_MS: &str = "SVCX_TIMEOUT_MS";
/// Environment variable for output format.
pub const ENV_FORMAT: &str = "SVCX_FORMAT";
/// Environment variable to disable colors.
pub const ENV_NO_COLOR: &str = "SVCX_NO_COLOR";
/// Standard environment variable to disable colors.
pub const ENV_NO_COLOR_STD: &str = "NO_COLOR";
/// Environment variable for verbose output.
pub const ENV_VERBOSE: &str = "SVCX_VERBOSE";
/// Environment variable for pretty JSON output.
pub const ENV_PRETTY: &str = "SVCX_PRETTY";
/// Environment variable to override config file path.
pub const ENV_CONFIG: &str = "SVCX_CONFIG";

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Fully resolved configuration after merging CLI, env vars, and config file.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Service used when a command names none.
    pub service_url: String,
    /// Timeout for service and layer requests.
    pub timeout_ms: u64,
    /// Output format.
    pub format: OutputFormat,
    /// Whether to disable colored output.
    pub no_color: bool,
    /// Whether verbose logging is enabled.
    pub verbose: bool,
    /// Whether to pretty-print JSON output.
    pub pretty: bool,
    /// Log level from CLI or config file, if any.
    pub log_level: Option<LogLevel>,
    /// Default WHERE clause and record count for previews.
    pub preview: QueryOptions,
    /// Source of each setting for debugging.
    pub sources: ConfigSources,
}

/// Tracks the source of each configuration value.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub service_url: ConfigSource,
    pub timeout_ms: ConfigSource,
    pub format: ConfigSource,
    pub no_color: ConfigSource,
    pub verbose: ConfigSource,
    pub pretty: ConfigSource,
    pub log_level: ConfigSource,
}

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value from CLI flag.
    Cli,
    /// Value from environment variable.
    Env,
    /// Value from config file.
    ConfigFile,
    /// Built-in default.
    #[default]
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI flag"),
            Self::Env => write!(f, "environment variable"),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Lookup function for environment variables.
type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

impl ResolvedConfig {
    /// Resolve final configuration from CLI args, environment variables, and config file.
    ///
    /// `service_url` is the URL given to the command, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file exists but is invalid
    /// - A resolved value is invalid (e.g., unknown format)
    pub fn resolve(cli: &Cli, service_url: Option<&str>) -> Result<Self> {
        let config = Config::load_with_override()?;
        Self::resolve_with(cli, service_url, &config, &process_env)
    }

    /// Resolve against an already loaded config and an env lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the config or a resolved value is invalid.
    pub fn resolve_with(
        cli: &Cli,
        service_url: Option<&str>,
        config: &Config,
        env: EnvLookup<'_>,
    ) -> Result<Self> {
        config.validate()?;

        let mut sources = ConfigSources::default();

        let service_url =
            Self::resolve_service_url(service_url, config, env, &mut sources.service_url);
        let timeout_ms = Self::resolve_timeout(cli, config, env, &mut sources.timeout_ms);
        let format = Self::resolve_format(cli, config, env, &mut sources.format)?;
        let no_color = Self::resolve_no_color(cli, config, env, &mut sources.no_color);
        let verbose = Self::resolve_verbose(cli, env, &mut sources.verbose);
        let pretty = Self::resolve_pretty(cli, config, env, &mut sources.pretty);
        let log_level = Self::resolve_log_level(cli, config, &mut sources.log_level)?;

        let preview = QueryOptions::new(
            config.preview.where_clause.as_deref().unwrap_or(DEFAULT_WHERE),
            f64::from(config.preview.record_count.unwrap_or(DEFAULT_RECORD_COUNT)),
        );

        tracing::debug!(
            service_url = %service_url,
            service_url_source = %sources.service_url,
            timeout_ms,
            timeout_source = %sources.timeout_ms,
            format = format.as_str(),
            format_source = %sources.format,
            "Configuration resolved"
        );

        Ok(Self {
            service_url,
            timeout_ms,
            format,
            no_color,
            verbose,
            pretty,
            log_level,
            preview,
            sources,
        })
    }

    fn resolve_service_url(
        arg: Option<&str>,
        config: &Config,
        env: EnvLookup<'_>,
        source: &mut ConfigSource,
    ) -> String {
        // 1. Command argument
        if let Some(url) = arg.filter(|u| !u.trim().is_empty()) {
            *source = ConfigSource::Cli;
            return url.to_string();
        }

        // 2. Environment variable
        if let Some(url) = env(ENV_SERVICE_URL).filter(|u| !u.trim().is_empty()) {
            *source = ConfigSource::Env;
            return url;
        }

        // 3. Config file
        if let Some(url) = &config.general.service_url {
            *source = ConfigSource::ConfigFile;
            return url.clone();
        }

        // 4. Default
        *source = ConfigSource::Default;
        DEFAULT_SERVICE_URL.to_string()
    }

    fn resolve_timeout(
        cli: &Cli,
        config: &Config,
        env: EnvLookup<'_>,
        source: &mut ConfigSource,
    ) -> u64 {
        // 1. CLI --timeout-ms
        if let Some(timeout) = cli.timeout_ms {
            *source = ConfigSource::Cli;
            return RequestOptions::new(timeout).timeout_ms();
        }

        // 2. Environment variable (unparsable values are ignored)
        if let Some(timeout) = env(ENV_TIMEOUT_MS).and_then(|v| v.trim().parse::<u64>().ok()) {
            *source = ConfigSource::Env;
            return RequestOptions::new(timeout).timeout_ms();
        }

        // 3. Config file
        if let Some(timeout) = config.general.timeout_ms {
            *source = ConfigSource::ConfigFile;
            return timeout;
        }

        // 4. Default
        *source = ConfigSource::Default;
        DEFAULT_TIMEOUT_MS
    }

    fn resolve_format(
        cli: &Cli,
        config: &Config,
        env: EnvLookup<'_>,
        source: &mut ConfigSource,
    ) -> Result<OutputFormat> {
        // 1. CLI --json / --format
        if let Some(format) = cli.requested_format() {
            *source = ConfigSource::Cli;
            return Ok(format);
        }

        // 2. Environment variable
        if let Some(value) = env(ENV_FORMAT) {
            *source = ConfigSource::Env;
            return Self::parse_format(ENV_FORMAT, &value);
        }

        // 3. Config file
        if let Some(value) = &config.output.format {
            *source = ConfigSource::ConfigFile;
            return Self::parse_format("output.format", value);
        }

        // 4. Default
        *source = ConfigSource::Default;
        Ok(OutputFormat::Human)
    }

    fn parse_format(key: &str, value: &str) -> Result<OutputFormat> {
        OutputFormat::from_arg(value).ok_or_else(|| ExplorerError::ConfigInvalid {
            key: key.to_string(),
            value: value.to_string(),
            message: "valid formats are human, json, md".to_string(),
        })
    }

    fn resolve_no_color(
        cli: &Cli,
        config: &Config,
        env: EnvLookup<'_>,
        source: &mut ConfigSource,
    ) -> bool {
        // 1. CLI --no-color flag
        if cli.no_color {
            *source = ConfigSource::Cli;
            return true;
        }

        // 2. Environment variable (SVCX_NO_COLOR or standard NO_COLOR)
        if is_truthy(env(ENV_NO_COLOR)) || env(ENV_NO_COLOR_STD).is_some() {
            *source = ConfigSource::Env;
            return true;
        }

        // 3. Config file (color = false means no_color = true)
        if !config.output.color {
            *source = ConfigSource::ConfigFile;
            return true;
        }

        // 4. Default
        *source = ConfigSource::Default;
        false
    }

    fn resolve_verbose(cli: &Cli, env: EnvLookup<'_>, source: &mut ConfigSource) -> bool {
        if cli.verbose {
            *source = ConfigSource::Cli;
            return true;
        }

        if is_truthy(env(ENV_VERBOSE)) {
            *source = ConfigSource::Env;
            return true;
        }

        *source = ConfigSource::Default;
        false
    }

    fn resolve_pretty(
        cli: &Cli,
        config: &Config,
        env: EnvLookup<'_>,
        source: &mut ConfigSource,
    ) -> bool {
        if cli.pretty {
            *source = ConfigSource::Cli;
            return true;
        }

        if is_truthy(env(ENV_PRETTY)) {
            *source = ConfigSource::Env;
            return true;
        }

        if config.output.pretty {
            *source = ConfigSource::ConfigFile;
            return true;
        }

        *source = ConfigSource::Default;
        false
    }

    /// `SVCX_LOG` is read by the logging layer itself, so only CLI and file apply here.
    fn resolve_log_level(
        cli: &Cli,
        config: &Config,
        source: &mut ConfigSource,
    ) -> Result<Option<LogLevel>> {
        if let Some(value) = &cli.log_level {
            *source = ConfigSource::Cli;
            return LogLevel::from_arg(value)
                .map(Some)
                .ok_or_else(|| invalid_log_level("--log-level", value));
        }

        if let Some(value) = &config.general.log_level {
            *source = ConfigSource::ConfigFile;
            return LogLevel::from_arg(value)
                .map(Some)
                .ok_or_else(|| invalid_log_level("general.log_level", value));
        }

        *source = ConfigSource::Default;
        Ok(None)
    }
}

fn invalid_log_level(key: &str, value: &str) -> ExplorerError {
    ExplorerError::ConfigInvalid {
        key: key.to_string(),
        value: value.to_string(),
        message: "valid levels are trace, debug, info, warn, error".to_string(),
    }
}

/// Whether an environment value is set to a truthy value.
fn is_truthy(value: Option<String>) -> bool {
    value.is_some_and(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

// =============================================================================
// Config File
// =============================================================================

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings.
    pub general: GeneralConfig,
    /// Record preview defaults.
    pub preview: PreviewConfig,
    /// Output settings.
    pub output: OutputConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Service loaded when no URL is given.
    pub service_url: Option<String>,
    /// Timeout for service and layer requests in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Default log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
}

/// Record preview defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Default WHERE clause.
    pub where_clause: Option<String>,
    /// Default number of records (1-100).
    pub record_count: Option<u32>,
}

/// Output formatting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format (human, json, md).
    pub format: Option<String>,
    /// Whether to use colors in output.
    pub color: bool,
    /// Whether to pretty-print JSON output.
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
            pretty: false,
        }
    }
}

impl Config {
    /// Load configuration from the default config file path.
    ///
    /// Returns default config if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error only if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration, respecting the `SVCX_CONFIG` override.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn load_with_override() -> Result<Self> {
        match std::env::var(ENV_CONFIG) {
            Ok(path) if !path.trim().is_empty() => Self::load_from(Path::new(path.trim())),
            _ => Self::load(),
        }
    }

    /// Load configuration from a specific path.
    ///
    /// Returns default config if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error only if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        tracing::debug!(?path, "Loading config file");
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ExplorerError::ConfigParse {
            path: path.display().to_string(),
            message: e.message().to_string(),
        })
    }

    /// Save configuration to a specific path.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ExplorerError::Config(format!("Failed to serialize config: {e}")))?;

        fs::write(path, content)?;
        tracing::debug!(?path, "Config file saved");
        Ok(())
    }

    /// Get the config file path.
    #[must_use]
    pub fn config_path() -> PathBuf {
        AppPaths::new().config_file()
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str, value: String, message: &str| ExplorerError::ConfigInvalid {
            key: key.to_string(),
            value,
            message: message.to_string(),
        };

        if let Some(url) = &self.general.service_url
            && parse_http_url(url).is_err()
        {
            return Err(invalid(
                "general.service_url",
                url.clone(),
                "must be an absolute http:// or https:// URL",
            ));
        }

        if let Some(timeout) = self.general.timeout_ms
            && !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&timeout)
        {
            return Err(invalid(
                "general.timeout_ms",
                timeout.to_string(),
                "must be between 1000 and 60000",
            ));
        }

        if let Some(level) = &self.general.log_level
            && LogLevel::from_arg(level).is_none()
        {
            return Err(invalid(
                "general.log_level",
                level.clone(),
                "valid levels are trace, debug, info, warn, error",
            ));
        }

        if let Some(count) = self.preview.record_count
            && !(MIN_RECORD_COUNT..=MAX_RECORD_COUNT).contains(&count)
        {
            return Err(invalid(
                "preview.record_count",
                count.to_string(),
                "must be between 1 and 100",
            ));
        }

        if let Some(format) = &self.output.format
            && OutputFormat::from_arg(format).is_none()
        {
            return Err(invalid(
                "output.format",
                format.clone(),
                "valid formats are human, json, md",
            ));
        }

        Ok(())
    }
}
