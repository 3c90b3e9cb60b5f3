//! Mock map-service servers for integration tests.
//!
//! ```rust,ignore
//! use common::fixtures::*;
//!
//! let server = census_server().await;
//! let url = service_url(&server);
//! ```
#![allow(dead_code)]

use serde_json::Value;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub use svcx::test_utils::{
    api_error_json, empty_query_result_json, layer_json, query_result_json, service_json,
};

/// Path of the mocked service below the server root.
pub const SERVICE_PATH: &str = "/arcgis/rest/services/Census/MapServer";

/// Full service URL on a mock server.
pub fn service_url(server: &MockServer) -> String {
    format!("{}{SERVICE_PATH}", server.uri())
}

/// Path of a layer or table below the server root.
pub fn layer_path(layer_id: i64) -> String {
    format!("{SERVICE_PATH}/{layer_id}")
}

/// Path of a layer's query endpoint below the server root.
pub fn query_path(layer_id: i64) -> String {
    format!("{SERVICE_PATH}/{layer_id}/query")
}

/// Answer `GET route` with `body` and HTTP 200.
pub async fn mount_json(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(query_param("f", "pjson"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Answer `GET route` with `status` and a plain-text body.
pub async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string("upstream failure"))
        .mount(server)
        .await;
}

/// Server with the census service, its `states` layer (3) and a query for it.
pub async fn census_server() -> MockServer {
    let server = MockServer::start().await;
    mount_json(&server, SERVICE_PATH, service_json()).await;
    mount_json(&server, &layer_path(3), layer_json()).await;
    mount_json(&server, &query_path(3), query_result_json()).await;
    server
}
