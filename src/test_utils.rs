//! Test utilities for svcx.
//!
//! Canned map-service responses, typed model factories, a temp directory
//! helper and assertion macros shared by unit and integration tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use svcx::test_utils::*;
//!
//! let service = make_test_service();
//! let body = service_json();
//! let dir = TestDir::new();
//! dir.create_file("config.toml", &make_test_config_toml());
//! ```

use std::fs;
use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};

use serde_json::{Value, json};

use crate::core::models::{
    Feature, FeatureCollection, FieldDescriptor, LayerDetail, LayerSummary, ServiceDescriptor,
    TableSummary,
};

// =============================================================================
// Canned Responses
// =============================================================================

/// A service description with two layers and one table.
#[must_use]
pub fn service_json() -> Value {
    json!({
        "currentVersion": 10.81,
        "serviceDescription": "US census demographics",
        "mapName": "Census",
        "capabilities": "Map,Query,Data",
        "supportedQueryFormats": "JSON, geoJSON, PBF",
        "layers": [
            { "id": 0, "name": "cities", "parentLayerId": -1 },
            { "id": 3, "name": "states", "parentLayerId": -1 }
        ],
        "tables": [
            { "id": 5, "name": "census_lookup" }
        ]
    })
}

/// A service description with nothing in it.
#[must_use]
pub fn empty_service_json() -> Value {
    json!({ "currentVersion": "11.1", "layers": [], "tables": [] })
}

/// A layer description for `states`.
#[must_use]
pub fn layer_json() -> Value {
    json!({
        "id": 3,
        "name": "states",
        "type": "Feature Layer",
        "geometryType": "esriGeometryPolygon",
        "objectIdField": "OBJECTID",
        "fields": [
            { "name": "OBJECTID", "alias": "OBJECTID", "type": "esriFieldTypeOID" },
            { "name": "STATE_NAME", "alias": "State Name", "type": "esriFieldTypeString" },
            { "name": "POP2000", "alias": "Population 2000", "type": "esriFieldTypeInteger" },
            { "name": "POP07_SQMI", "alias": "Density", "type": "esriFieldTypeDouble" }
        ]
    })
}

/// A query result with two records.
#[must_use]
pub fn query_result_json() -> Value {
    json!({
        "objectIdFieldName": "OBJECTID",
        "features": [
            { "attributes": { "OBJECTID": 1, "STATE_NAME": "Hawaii", "POP2000": 1_211_537 } },
            { "attributes": { "OBJECTID": 2, "STATE_NAME": "Washington", "POP2000": 5_894_121 } }
        ]
    })
}

/// A query result with no records.
#[must_use]
pub fn empty_query_result_json() -> Value {
    json!({ "features": [] })
}

/// An in-body error object, as servers send with HTTP 200.
#[must_use]
pub fn api_error_json(code: i64, message: &str, details: &[&str]) -> Value {
    json!({
        "error": {
            "code": code,
            "message": message,
            "details": details
        }
    })
}

// =============================================================================
// Model Factories
// =============================================================================

/// Decoded form of [`service_json`].
#[must_use]
pub fn make_test_service() -> ServiceDescriptor {
    ServiceDescriptor {
        service_description: Some("US census demographics".to_string()),
        map_name: Some("Census".to_string()),
        current_version: Some("10.81".to_string()),
        capabilities: Some("Map,Query,Data".to_string()),
        supported_query_formats: Some("JSON, geoJSON, PBF".to_string()),
        layers: vec![
            LayerSummary {
                id: 0,
                name: "cities".to_string(),
            },
            LayerSummary {
                id: 3,
                name: "states".to_string(),
            },
        ],
        tables: vec![TableSummary {
            id: 5,
            name: "census_lookup".to_string(),
        }],
        ..ServiceDescriptor::default()
    }
}

/// Create a field descriptor.
#[must_use]
pub fn make_test_field(name: &str, alias: &str, field_type: &str) -> FieldDescriptor {
    FieldDescriptor {
        name: name.to_string(),
        alias: alias.to_string(),
        field_type: field_type.to_string(),
    }
}

/// Decoded form of [`layer_json`].
#[must_use]
pub fn make_test_layer() -> LayerDetail {
    LayerDetail {
        id: Some(3),
        name: Some("states".to_string()),
        layer_type: Some("Feature Layer".to_string()),
        geometry_type: Some("esriGeometryPolygon".to_string()),
        object_id_field: Some("OBJECTID".to_string()),
        fields: vec![
            make_test_field("OBJECTID", "OBJECTID", "esriFieldTypeOID"),
            make_test_field("STATE_NAME", "State Name", "esriFieldTypeString"),
            make_test_field("POP2000", "Population 2000", "esriFieldTypeInteger"),
            make_test_field("POP07_SQMI", "Density", "esriFieldTypeDouble"),
        ],
    }
}

/// A collection of `count` records with `columns` attributes each.
///
/// Values are `"r{row}c{col}"` strings.
#[must_use]
pub fn make_test_features(count: usize, columns: usize) -> FeatureCollection {
    let features = (0..count)
        .map(|row| Feature {
            attributes: (0..columns)
                .map(|col| (format!("COL_{col}"), Value::from(format!("r{row}c{col}"))))
                .collect(),
        })
        .collect();
    FeatureCollection { features }
}

// =============================================================================
// Temp Directory Utilities
// =============================================================================

/// A temporary directory for tests with automatic cleanup.
///
/// Uses the `tempfile` crate; the directory is removed on drop.
pub struct TestDir {
    inner: tempfile::TempDir,
}

impl TestDir {
    /// Create a new isolated temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: tempfile::tempdir().expect("Failed to create temp directory"),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Create a file with the given content, creating parent directories.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be created or written.
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.inner.path().join(name);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }

        let mut file = fs::File::create(&path).expect("Failed to create test file");
        file.write_all(content.as_bytes())
            .expect("Failed to write test file");
    }

    /// Read a file from the temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read_file(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.inner.path().join(name))
    }

    #[must_use]
    pub fn file_exists(&self, name: &str) -> bool {
        self.inner.path().join(name).exists()
    }

    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.inner.path().join(name)
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Assertion Macros
// =============================================================================

/// Assert that a string contains a substring.
///
/// ```rust,ignore
/// use svcx::assert_contains;
///
/// assert_contains!("Census (MapServer)", "Census");
/// ```
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            haystack.contains(needle),
            "Expected string to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
    ($haystack:expr, $needle:expr, $($arg:tt)*) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(haystack.contains(needle), $($arg)*);
    };
}

/// Assert that a string does NOT contain a substring.
#[macro_export]
macro_rules! assert_not_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            !haystack.contains(needle),
            "Expected string NOT to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
    ($haystack:expr, $needle:expr, $($arg:tt)*) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(!haystack.contains(needle), $($arg)*);
    };
}

/// Assert that a string parses as JSON and evaluate to the parsed value.
///
/// ```rust,ignore
/// use svcx::assert_json_valid;
///
/// let value = assert_json_valid!(r#"{"command": "service"}"#);
/// assert_eq!(value["command"], "service");
/// ```
#[macro_export]
macro_rules! assert_json_valid {
    ($json:expr) => {{
        let json = $json;
        match serde_json::from_str::<serde_json::Value>(json) {
            Ok(value) => value,
            Err(e) => panic!(
                "Expected valid JSON, but parsing failed: {}\n\nJSON string:\n{}",
                e, json
            ),
        }
    }};
}

/// Assert that a string contains ANSI escape codes.
#[macro_export]
macro_rules! assert_ansi_codes {
    ($text:expr) => {
        let text = $text;
        assert!(
            text.contains('\x1b'),
            "Expected string to contain ANSI escape codes, but none found.\n\nActual string:\n{:?}",
            text
        );
    };
}

/// Assert that a string does NOT contain ANSI escape codes.
#[macro_export]
macro_rules! assert_no_ansi_codes {
    ($text:expr) => {
        let text = $text;
        assert!(
            !text.contains('\x1b'),
            "Expected string to NOT contain ANSI escape codes.\n\nActual string:\n{:?}",
            text
        );
    };
}

// =============================================================================
// Test Helpers
// =============================================================================

#[must_use]
pub fn has_ansi_codes(text: &str) -> bool {
    text.contains('\x1b')
}

/// Strip ANSI escape codes from a string.
#[must_use]
pub fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\x1b' {
            if chars.peek() == Some(&'[') {
                chars.next();
                // CSI sequences end at the first letter.
                while let Some(&next) = chars.peek() {
                    chars.next();
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Sample config TOML pointing at `service_url`.
#[must_use]
pub fn make_test_config_toml_for(service_url: &str) -> String {
    format!(
        r#"[general]
service_url = "{service_url}"
timeout_ms = 5000
log_level = "info"

[preview]
where_clause = "1=1"
record_count = 5

[output]
format = "human"
color = false
pretty = false
"#
    )
}

/// Sample config TOML with the default service.
#[must_use]
pub fn make_test_config_toml() -> String {
    make_test_config_toml_for(crate::core::session::DEFAULT_SERVICE_URL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canned_service_decodes_to_factory_model() {
        let decoded: ServiceDescriptor = serde_json::from_value(service_json()).unwrap();
        assert_eq!(decoded, make_test_service());
    }

    #[test]
    fn canned_layer_decodes_to_factory_model() {
        let decoded: LayerDetail = serde_json::from_value(layer_json()).unwrap();
        assert_eq!(decoded, make_test_layer());
    }

    #[test]
    fn canned_query_result_has_records() {
        let decoded: FeatureCollection = serde_json::from_value(query_result_json()).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded.preview_columns(), ["OBJECTID", "STATE_NAME", "POP2000"]);
    }

    #[test]
    fn feature_factory_shapes_rows() {
        let features = make_test_features(3, 10);
        assert_eq!(features.len(), 3);
        assert_eq!(features.features[2].attributes["COL_9"], "r2c9");
    }

    #[test]
    fn api_error_body_has_nested_error() {
        let body = api_error_json(400, "Invalid query", &["bad where"]);
        assert_eq!(body["error"]["code"], 400);
        assert_eq!(body["error"]["details"][0], "bad where");
    }

    #[test]
    fn test_dir_creates_and_cleans_up() {
        let path: PathBuf;
        {
            let dir = TestDir::new();
            path = dir.path().to_path_buf();
            dir.create_file("nested/config.toml", "x = 1");
            assert!(dir.file_exists("nested/config.toml"));
            assert_eq!(dir.read_file("nested/config.toml").unwrap(), "x = 1");
        }
        assert!(!path.exists());
    }

    #[test]
    fn strip_ansi_removes_escape_sequences() {
        assert_eq!(strip_ansi_codes("\x1b[1;31mred\x1b[0m text"), "red text");
        assert!(has_ansi_codes("\x1b[31mred\x1b[0m"));
        assert!(!has_ansi_codes("plain"));
    }

    #[test]
    fn assertion_macros_work() {
        assert_contains!("Census (MapServer)", "Census");
        assert_not_contains!("Census", "Parcels");
        let value = assert_json_valid!(r#"{"command": "service"}"#);
        assert_eq!(value["command"], "service");
        assert_ansi_codes!("\x1b[31mred\x1b[0m");
        assert_no_ansi_codes!("plain");
    }

    #[test]
    fn sample_config_parses() {
        let config: crate::storage::config::Config =
            toml::from_str(&make_test_config_toml_for("https://x/MapServer")).unwrap();
        assert_eq!(
            config.general.service_url.as_deref(),
            Some("https://x/MapServer")
        );
        assert!(config.validate().is_ok());
    }
}
