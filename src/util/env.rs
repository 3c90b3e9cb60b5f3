//! Environment detection utilities.

use std::io::IsTerminal;

/// Plain-mode override specific to svcx.
pub const PLAIN_ENV: &str = "SVCX_PLAIN";

/// Check if stdout is a TTY.
#[must_use]
pub fn stdout_is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Check if stderr is a TTY.
#[must_use]
pub fn stderr_is_tty() -> bool {
    std::io::stderr().is_terminal()
}

/// Why styled output must be disabled, if it must.
///
/// `env` looks up environment variables; `is_tty` tells whether the target
/// stream is a terminal. Checks run in order of likelihood and cost.
pub fn plain_output_reason(
    no_color_flag: bool,
    env: &dyn Fn(&str) -> Option<String>,
    is_tty: bool,
) -> Option<&'static str> {
    if no_color_flag {
        return Some("no_color_flag");
    }
    // NO_COLOR disables color with any value, including empty.
    if env("NO_COLOR").is_some() {
        return Some("no_color_env");
    }
    if env(PLAIN_ENV).is_some() {
        return Some("svcx_plain");
    }
    if !is_tty {
        return Some("not_tty");
    }
    if env("TERM").is_some_and(|t| t == "dumb") {
        return Some("term_dumb");
    }
    if env("CI").is_some() || env("GITHUB_ACTIONS").is_some() {
        return Some("ci_environment");
    }
    None
}

/// Process environment lookup for [`plain_output_reason`].
#[must_use]
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
