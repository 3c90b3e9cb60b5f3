//! Boundary schemas for map-service responses.
//!
//! These types are decoded from the JSON a map service returns. Optional
//! fields default the same way the display layer expects, so views never
//! have to deal with missing keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Default WHERE clause (all records).
pub const DEFAULT_WHERE: &str = "1=1";

/// Default number of preview records.
pub const DEFAULT_RECORD_COUNT: u32 = 5;

/// Smallest allowed preview record count.
pub const MIN_RECORD_COUNT: u32 = 1;

/// Largest allowed preview record count.
pub const MAX_RECORD_COUNT: u32 = 100;

/// Number of attribute columns shown in a record preview.
pub const PREVIEW_COLUMN_LIMIT: usize = 8;

const UNTITLED_SERVICE: &str = "Untitled Service";
const NO_DESCRIPTION: &str = "No service description provided.";
const UNNAMED_LAYER: &str = "Unnamed layer";
const NOT_AVAILABLE: &str = "N/A";

/// Treat an explicit JSON `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept a string, number or boolean and keep its text form.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// First non-blank value among the candidates.
fn first_non_blank<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|s| !s.trim().is_empty())
}

// =============================================================================
// Service
// =============================================================================

/// Identity of a layer or table inside a service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LayerSummary {
    /// Id, unique within a service.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,

    /// Display name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Tables are listed with the same shape as layers.
pub type TableSummary = LayerSummary;

/// Root description of a map or feature service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub current_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_query_formats: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub layers: Vec<LayerSummary>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub tables: Vec<TableSummary>,
}

impl ServiceDescriptor {
    /// Display title: service description, map name, or name, in that order.
    #[must_use]
    pub fn title(&self) -> &str {
        first_non_blank(&[
            self.service_description.as_deref(),
            self.map_name.as_deref(),
            self.name.as_deref(),
        ])
        .unwrap_or(UNTITLED_SERVICE)
    }

    /// Display description.
    #[must_use]
    pub fn description_text(&self) -> &str {
        first_non_blank(&[self.description.as_deref()]).unwrap_or(NO_DESCRIPTION)
    }

    /// Version, capability and format facts that are present.
    #[must_use]
    pub fn detail_bits(&self) -> Vec<String> {
        let mut bits = Vec::new();
        if let Some(version) = first_non_blank(&[self.current_version.as_deref()]) {
            bits.push(format!("REST v{version}"));
        }
        if let Some(capabilities) = first_non_blank(&[self.capabilities.as_deref()]) {
            bits.push(format!("Capabilities: {capabilities}"));
        }
        if let Some(formats) = first_non_blank(&[self.supported_query_formats.as_deref()]) {
            bits.push(format!("Formats: {formats}"));
        }
        bits
    }

    /// Whether the service exposes neither layers nor tables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty() && self.tables.is_empty()
    }

    /// Look up a layer or table by id.
    #[must_use]
    pub fn find(&self, id: i64) -> Option<(ResourceKind, &LayerSummary)> {
        self.layers
            .iter()
            .find(|l| l.id == id)
            .map(|l| (ResourceKind::Layer, l))
            .or_else(|| {
                self.tables
                    .iter()
                    .find(|t| t.id == id)
                    .map(|t| (ResourceKind::Table, t))
            })
    }

    /// Layers followed by tables, in service order.
    pub fn entries(&self) -> impl Iterator<Item = (ResourceKind, &LayerSummary)> {
        self.layers
            .iter()
            .map(|l| (ResourceKind::Layer, l))
            .chain(self.tables.iter().map(|t| (ResourceKind::Table, t)))
    }
}

/// Whether a listed resource is a layer or a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Layer,
    Table,
}

impl ResourceKind {
    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Layer => "Layer",
            Self::Table => "Table",
        }
    }
}

// =============================================================================
// Layer
// =============================================================================

/// One attribute column of a layer or table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldDescriptor {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub alias: String,

    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub field_type: String,
}

impl FieldDescriptor {
    /// Whether the field's name, alias or type contains `needle`.
    ///
    /// `needle` must already be trimmed and lowercased.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.name.to_lowercase().contains(needle)
            || self.alias.to_lowercase().contains(needle)
            || self.field_type.to_lowercase().contains(needle)
    }
}

/// Description of a single layer or table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LayerDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub layer_type: Option<String>,

    /// Tables have no geometry.
    #[serde(default)]
    pub geometry_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id_field: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: Vec<FieldDescriptor>,
}

impl LayerDetail {
    /// Display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        first_non_blank(&[self.name.as_deref()]).unwrap_or(UNNAMED_LAYER)
    }

    /// Display type (e.g. "Feature Layer", "Table").
    #[must_use]
    pub fn display_type(&self) -> &str {
        first_non_blank(&[self.layer_type.as_deref()]).unwrap_or(NOT_AVAILABLE)
    }

    /// Display geometry type.
    #[must_use]
    pub fn display_geometry(&self) -> &str {
        first_non_blank(&[self.geometry_type.as_deref()]).unwrap_or(NOT_AVAILABLE)
    }

    /// Display object-id field name.
    #[must_use]
    pub fn display_object_id_field(&self) -> &str {
        first_non_blank(&[self.object_id_field.as_deref()]).unwrap_or(NOT_AVAILABLE)
    }

    /// Fields whose name, alias or type contains `filter` (case-insensitive).
    #[must_use]
    pub fn filter_fields(&self, filter: &str) -> Vec<&FieldDescriptor> {
        let needle = filter.trim().to_lowercase();
        self.fields.iter().filter(|f| f.matches(&needle)).collect()
    }
}

// =============================================================================
// Query
// =============================================================================

/// Clamp a raw record count to the allowed range.
///
/// Non-finite input yields the default; fractional input is floored.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn clamp_record_count(raw: f64) -> u32 {
    if !raw.is_finite() {
        return DEFAULT_RECORD_COUNT;
    }
    raw.floor()
        .clamp(f64::from(MIN_RECORD_COUNT), f64::from(MAX_RECORD_COUNT)) as u32
}

/// Parse user-entered text as a finite number, if it is one.
#[must_use]
pub fn parse_finite(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Options for a record-preview query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    where_clause: String,
    record_count: u32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            where_clause: DEFAULT_WHERE.to_string(),
            record_count: DEFAULT_RECORD_COUNT,
        }
    }
}

impl QueryOptions {
    /// Build options from a WHERE clause and a raw record count.
    ///
    /// A blank clause becomes `1=1`; the count is clamped to [1, 100].
    #[must_use]
    pub fn new(where_clause: &str, record_count: f64) -> Self {
        Self {
            where_clause: normalize_where(where_clause),
            record_count: clamp_record_count(record_count),
        }
    }

    /// Build options from user-entered text.
    ///
    /// Text that is not a finite number yields the default count.
    #[must_use]
    pub fn from_text(where_clause: Option<&str>, record_count: Option<&str>) -> Self {
        let count = record_count
            .and_then(parse_finite)
            .unwrap_or(f64::from(DEFAULT_RECORD_COUNT));
        Self::new(where_clause.unwrap_or(DEFAULT_WHERE), count)
    }

    /// The WHERE clause sent to the server.
    #[must_use]
    pub fn where_clause(&self) -> &str {
        &self.where_clause
    }

    /// The record count sent to the server.
    #[must_use]
    pub const fn record_count(&self) -> u32 {
        self.record_count
    }
}

fn normalize_where(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        DEFAULT_WHERE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// One record returned by a query. Geometry is never requested.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    /// Attribute values in server order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Map<String, Value>,
}

/// Result of a record-preview query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Number of records returned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether no records were returned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Columns shown in a preview: the first keys of the first record.
    #[must_use]
    pub fn preview_columns(&self) -> Vec<&str> {
        self.features.first().map_or_else(Vec::new, |first| {
            first
                .attributes
                .keys()
                .take(PREVIEW_COLUMN_LIMIT)
                .map(String::as_str)
                .collect()
        })
    }

    /// Cell texts of every record for the preview columns.
    #[must_use]
    pub fn preview_rows(&self) -> Vec<Vec<String>> {
        let columns = self.preview_columns();
        self.features
            .iter()
            .map(|feature| {
                columns
                    .iter()
                    .map(|key| cell_text(feature.attributes.get(*key)))
                    .collect()
            })
            .collect()
    }
}

/// Display text of an attribute value; missing and null render empty.
#[must_use]
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

// =============================================================================
// Robot Output
// =============================================================================

/// Envelope for machine-readable output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotOutput<T> {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub command: String,
    pub data: T,

    #[serde(default)]
    pub errors: Vec<String>,

    pub meta: RobotMeta,
}

/// Metadata for robot output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotMeta {
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_url: Option<String>,
    pub runtime: String,
}

impl<T> RobotOutput<T> {
    /// Create a new robot output envelope.
    pub fn new(command: impl Into<String>, data: T) -> Self {
        Self {
            schema_version: "svcx.v1".to_string(),
            generated_at: Utc::now(),
            command: command.into(),
            data,
            errors: Vec::new(),
            meta: RobotMeta {
                format: "json".to_string(),
                request_url: None,
                runtime: "cli".to_string(),
            },
        }
    }

    /// Attach the URL the data was fetched from.
    #[must_use]
    pub fn with_request_url(mut self, url: impl Into<String>) -> Self {
        self.meta.request_url = Some(url.into());
        self
    }
}
