//! Integration tests for logging initialization.

use svcx::core::logging::{self, LogFormat, LogLevel, LogTarget};

#[test]
fn init_human_to_stderr() {
    logging::init(
        LogLevel::Debug,
        LogFormat::Human,
        LogTarget::Stderr { file: None },
        false,
    );
    tracing::debug!("human logging initialized");
}

#[test]
fn init_json_to_file_keeps_first_subscriber() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("explore.log");

    // Tests share a process; whichever init runs first wins and the rest are no-ops.
    logging::init(
        LogLevel::Info,
        LogFormat::Json,
        LogTarget::FileOnly {
            file: Some(path.clone()),
        },
        false,
    );
    assert!(path.exists());
}

#[test]
fn file_only_without_file_is_silent() {
    logging::init(
        LogLevel::Trace,
        LogFormat::Compact,
        LogTarget::FileOnly { file: None },
        true,
    );
}
