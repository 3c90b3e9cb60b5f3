//! svcx - Service Explorer
//!
//! CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use std::process::ExitCode;

use svcx::cli::{Cli, Commands};
use svcx::core::logging::{self, LogFormat, LogLevel, LogTarget};
use svcx::storage::{AppPaths, ResolvedConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Completions need neither config nor network.
    if let Some(Commands::Completions(args)) = &cli.command {
        svcx::cli::completions::execute(args);
        return ExitCode::SUCCESS;
    }

    let config = match ResolvedConfig::resolve(&cli, command_url(&cli)) {
        Ok(config) => config,
        Err(e) => return report(&e, cli.effective_format(), cli.no_color, cli.pretty),
    };

    init_logging(&cli, &config);
    tracing::debug!(
        format = config.format.as_str(),
        format_source = %config.sources.format,
        timeout_ms = config.timeout_ms,
        timeout_source = %config.sources.timeout_ms,
        "Configuration resolved"
    );

    match run(&cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e, config.format, config.no_color, config.pretty),
    }
}

/// The service URL a command names explicitly, if any.
fn command_url(cli: &Cli) -> Option<&str> {
    match &cli.command {
        Some(Commands::Service(args)) => args.url.as_deref(),
        Some(Commands::Layer(args)) => args.url.as_deref(),
        Some(Commands::Preview(args) | Commands::QueryUrl(args)) => args.url.as_deref(),
        Some(Commands::Explore(args)) => args.url.as_deref(),
        Some(Commands::Completions(_)) | None => None,
    }
}

fn init_logging(cli: &Cli, config: &ResolvedConfig) {
    let level = cli
        .log_level
        .as_deref()
        .and_then(LogLevel::from_arg)
        .or_else(logging::parse_log_level_from_env)
        .or(config.log_level)
        .unwrap_or_default();
    let format = if cli.json_output {
        LogFormat::Json
    } else {
        logging::parse_log_format_from_env().unwrap_or_default()
    };
    let file = logging::parse_log_file_from_env();

    // The explorer owns the terminal; its logs may only go to a file.
    let target = if matches!(cli.command, Some(Commands::Explore(_))) {
        let paths = AppPaths::new();
        let file = file.or_else(|| {
            paths
                .ensure_dirs()
                .ok()
                .map(|()| paths.explorer_log_file())
        });
        LogTarget::FileOnly { file }
    } else {
        LogTarget::Stderr { file }
    };

    logging::init(level, format, target, config.verbose);
}

fn report(
    error: &svcx::ExplorerError,
    format: svcx::cli::OutputFormat,
    no_color: bool,
    pretty: bool,
) -> ExitCode {
    tracing::debug!(code = error.error_code(), "{error}");
    let output = svcx::render::error::render_error_full(error, format, no_color, pretty);
    eprintln!("{output}");
    ExitCode::from(error.exit_code() as u8)
}

async fn run(cli: &Cli, config: &ResolvedConfig) -> svcx::Result<()> {
    match &cli.command {
        None => {
            print_quickstart(config);
            Ok(())
        }
        Some(Commands::Service(args)) => svcx::cli::service::execute(args, config).await,
        Some(Commands::Layer(args)) => svcx::cli::layer::execute(args, config).await,
        Some(Commands::Preview(args)) => svcx::cli::preview::execute(args, config).await,
        Some(Commands::QueryUrl(args)) => svcx::cli::preview::execute_query_url(args, config),
        Some(Commands::Explore(args)) => svcx::cli::explore::execute(args, config).await,
        Some(Commands::Completions(args)) => {
            svcx::cli::completions::execute(args);
            Ok(())
        }
    }
}

/// Print quickstart help when no command is given.
fn print_quickstart(config: &ResolvedConfig) {
    println!(
        r#"svcx - Service Explorer

Inspect ArcGIS-style map and feature services from the terminal.

USAGE:
    svcx [OPTIONS] <COMMAND>

COMMANDS:
    service [URL]         Describe a service and list its layers and tables
    layer <ID>            Show a layer's metadata and fields
    preview <ID>          Preview a few records of a layer
    query-url <ID>        Print the preview query URL without sending it
    explore [URL]         Open the interactive explorer
    completions <SHELL>   Generate shell completions

QUICK START:
    svcx service                              # Describe the configured service
    svcx layer 3 --filter pop                 # Fields of layer 3 matching "pop"
    svcx preview 3 --where "POP > 1000" --count 10
    svcx explore                              # Browse interactively

ROBOT MODE:
    svcx service --json                       # JSON output
    svcx layer 3 --format md                  # Markdown output

For more help: svcx --help
"#
    );
    println!("Service: {}", config.service_url);
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
}
