//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Service Explorer - inspect map-service REST endpoints from the terminal.
#[derive(Parser, Debug)]
#[command(name = "svcx")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    // === Global flags ===
    /// Output format [default: human]
    #[arg(long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log level
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit JSONL logs to stderr
    #[arg(long, global = true)]
    pub json_output: bool,

    /// Verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Timeout for service and layer requests, in milliseconds (1000-60000)
    #[arg(long, value_name = "MS", global = true)]
    pub timeout_ms: Option<u64>,
}

impl Cli {
    /// The format requested on the command line, if any.
    #[must_use]
    pub const fn requested_format(&self) -> Option<OutputFormat> {
        if self.json {
            Some(OutputFormat::Json)
        } else {
            self.format
        }
    }

    /// Resolve the effective output format, ignoring config and env.
    #[must_use]
    pub fn effective_format(&self) -> OutputFormat {
        self.requested_format().unwrap_or_default()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Describe a service and list its layers and tables
    Service(ServiceArgs),

    /// Show one layer's metadata and fields
    Layer(LayerArgs),

    /// Preview records of a layer
    Preview(PreviewArgs),

    /// Print the preview query URL without sending it
    QueryUrl(PreviewArgs),

    /// Open the interactive explorer
    Explore(ExploreArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `service` command.
#[derive(Args, Debug, Clone)]
pub struct ServiceArgs {
    /// Service URL (defaults to the configured service)
    #[arg(value_name = "URL")]
    pub url: Option<String>,
}

/// Arguments for the `layer` command.
#[derive(Args, Debug, Clone)]
pub struct LayerArgs {
    /// Layer or table id
    #[arg(value_name = "ID", allow_negative_numbers = true)]
    pub id: i64,

    /// Service URL (defaults to the configured service)
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Only show fields whose name, alias, or type contains this text
    #[arg(long, value_name = "TEXT")]
    pub filter: Option<String>,
}

/// Arguments for the `preview` and `query-url` commands.
#[derive(Args, Debug, Clone)]
pub struct PreviewArgs {
    /// Layer or table id
    #[arg(value_name = "ID", allow_negative_numbers = true)]
    pub id: i64,

    /// Service URL (defaults to the configured service)
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// SQL WHERE clause (blank means all records)
    #[arg(long = "where", value_name = "CLAUSE")]
    pub where_clause: Option<String>,

    /// Number of records, clamped to 1-100
    #[arg(long, value_name = "N", allow_hyphen_values = true)]
    pub count: Option<String>,
}

/// Arguments for the `explore` command.
#[derive(Args, Debug, Clone)]
pub struct ExploreArgs {
    /// Service URL to load on start
    #[arg(value_name = "URL")]
    pub url: Option<String>,
}

/// Arguments for the `completions` command.
#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable rich output
    #[default]
    Human,
    /// JSON output
    Json,
    /// Markdown output
    Md,
}

impl OutputFormat {
    /// Parse from a config or env value.
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            "md" | "markdown" => Some(Self::Md),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Json => "json",
            Self::Md => "md",
        }
    }
}
