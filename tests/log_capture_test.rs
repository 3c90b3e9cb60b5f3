//! Tests for the log capture helpers and the events svcx emits.

use tracing::{error, info};

mod common;
use common::log_capture::TestLogCapture;
use common::logger::TestLogger;

use svcx::core::models::QueryOptions;
use svcx::core::session::{Command, Response, Session};
use svcx::test_utils::make_test_service;

#[test]
fn capture_records_messages_and_fields() {
    let capture = TestLogCapture::start();

    info!(layer_id = 3, "Layer selected");

    capture.assert_logged("Layer selected");
    capture.assert_logged_at_level(tracing::Level::INFO, "selected");
    capture.assert_field_logged("layer_id", "3");
}

#[test]
#[should_panic(expected = "Unexpected errors")]
fn capture_flags_errors() {
    let capture = TestLogCapture::start();

    error!("Something went wrong");
    capture.assert_no_errors();
}

#[test]
fn session_logs_loaded_service() {
    let (log, capture) = TestLogger::with_capture("session_logs_loaded_service");

    let mut session = Session::new("https://x/MapServer", QueryOptions::default());
    let Some(svcx::core::session::Effect::FetchService { ticket, url }) =
        session.handle(Command::LoadService {
            url: "https://x/MapServer".to_string(),
        })
    else {
        panic!("expected a service fetch");
    };
    session.apply(Response::ServiceLoaded {
        ticket,
        url,
        result: Ok(make_test_service()),
    });

    capture.assert_logged_at_level(tracing::Level::INFO, "Service loaded");
    capture.assert_field_logged("layers", "2");
    capture.assert_field_logged("tables", "1");
    capture.assert_no_errors();
    log.finish_ok();
}

#[test]
fn stale_response_is_logged_at_debug() {
    let capture = TestLogCapture::start();

    let mut session = Session::default();
    session.apply(Response::PreviewLoaded {
        ticket: 42,
        result: Ok(svcx::core::models::FeatureCollection::default()),
    });

    capture.assert_logged_at_level(tracing::Level::DEBUG, "Dropping stale preview response");
}
