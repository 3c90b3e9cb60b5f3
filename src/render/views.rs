//! Display models.
//!
//! Pure functions from fetched data to the text a user sees. Human,
//! Markdown and TUI output all render these same values, so the wording of
//! every view lives here and nowhere else.

use crate::core::models::{
    FeatureCollection, FieldDescriptor, LayerDetail, LayerSummary, ResourceKind,
    ServiceDescriptor,
};

/// Shown when a service has neither layers nor tables.
pub const NO_LAYERS_OR_TABLES: &str = "No layers or tables found.";

/// Shown when the field filter matches nothing.
pub const NO_MATCHING_FIELDS: &str = "No fields match your filter.";

/// Shown when a preview query returns no features.
pub const NO_RECORDS: &str = "No records returned.";

/// Column headings of the field table.
pub const FIELD_COLUMNS: [&str; 3] = ["Name", "Alias", "Type"];

/// Widest a table cell is rendered before truncation.
pub const MAX_CELL_WIDTH: usize = 32;

// =============================================================================
// Service
// =============================================================================

/// Service header lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHeader {
    pub title: String,
    pub description: String,
    /// Version, capabilities and formats joined with `" | "`.
    pub details: Option<String>,
}

#[must_use]
pub fn service_header(service: &ServiceDescriptor) -> ServiceHeader {
    let bits = service.detail_bits();
    ServiceHeader {
        title: service.title().to_string(),
        description: service.description_text().to_string(),
        details: (!bits.is_empty()).then(|| bits.join(" | ")),
    }
}

/// One selectable entry of the layer list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub kind: ResourceKind,
    pub id: i64,
    pub name: String,
    /// `[Layer <id>] <name>` or `[Table <id>] <name>`.
    pub label: String,
}

/// A headed group of list entries ("Layers" or "Tables").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSection {
    pub heading: &'static str,
    pub items: Vec<ListItem>,
}

/// Label of a layer or table entry.
#[must_use]
pub fn entry_label(kind: ResourceKind, entry: &LayerSummary) -> String {
    format!("[{} {}] {}", kind.label(), entry.id, entry.name)
}

fn list_item(kind: ResourceKind, entry: &LayerSummary) -> ListItem {
    ListItem {
        kind,
        id: entry.id,
        name: entry.name.clone(),
        label: entry_label(kind, entry),
    }
}

/// Layers and tables, each section present only when non-empty.
///
/// An empty result means [`NO_LAYERS_OR_TABLES`] should be shown.
#[must_use]
pub fn layer_list(service: &ServiceDescriptor) -> Vec<ListSection> {
    let mut sections = Vec::new();
    if !service.layers.is_empty() {
        sections.push(ListSection {
            heading: "Layers",
            items: service
                .layers
                .iter()
                .map(|l| list_item(ResourceKind::Layer, l))
                .collect(),
        });
    }
    if !service.tables.is_empty() {
        sections.push(ListSection {
            heading: "Tables",
            items: service
                .tables
                .iter()
                .map(|t| list_item(ResourceKind::Table, t))
                .collect(),
        });
    }
    sections
}

/// All list entries in display order.
#[must_use]
pub fn list_items(service: &ServiceDescriptor) -> Vec<ListItem> {
    service
        .entries()
        .map(|(kind, entry)| list_item(kind, entry))
        .collect()
}

// =============================================================================
// Layer
// =============================================================================

/// Layer detail lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerView {
    pub name: String,
    pub layer_type: String,
    pub geometry: String,
    pub object_id_field: String,
    pub where_clause: String,
    pub record_count: u32,
    pub filter: String,
    /// `Fields (<shown> of <total>)`.
    pub fields_heading: String,
    /// `[name, alias, type]` per matching field.
    pub fields: Vec<[String; 3]>,
}

impl LayerView {
    /// Label of the preview action, e.g. `Preview 5 Records`.
    #[must_use]
    pub fn preview_label(&self) -> String {
        format!("Preview {} Records", self.record_count)
    }
}

fn field_row(field: &FieldDescriptor) -> [String; 3] {
    [
        field.name.clone(),
        field.alias.clone(),
        field.field_type.clone(),
    ]
}

#[must_use]
pub fn layer_view(
    layer: &LayerDetail,
    filter: &str,
    where_clause: &str,
    record_count: u32,
) -> LayerView {
    let matching = layer.filter_fields(filter);
    LayerView {
        name: layer.display_name().to_string(),
        layer_type: layer.display_type().to_string(),
        geometry: layer.display_geometry().to_string(),
        object_id_field: layer.display_object_id_field().to_string(),
        where_clause: where_clause.to_string(),
        record_count,
        filter: filter.to_string(),
        fields_heading: format!("Fields ({} of {})", matching.len(), layer.fields.len()),
        fields: matching.into_iter().map(field_row).collect(),
    }
}

// =============================================================================
// Preview
// =============================================================================

/// Record preview table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewView {
    /// `Records returned: N`.
    pub summary: String,
    /// `Showing up to N rows and C columns (first columns only).`
    pub note: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Preview table, or `None` when no records came back ([`NO_RECORDS`]).
#[must_use]
pub fn preview_view(collection: &FeatureCollection) -> Option<PreviewView> {
    if collection.is_empty() {
        return None;
    }
    let columns: Vec<String> = collection
        .preview_columns()
        .into_iter()
        .map(str::to_string)
        .collect();
    let count = collection.len();
    Some(PreviewView {
        summary: format!("Records returned: {count}"),
        note: format!(
            "Showing up to {count} rows and {} columns (first columns only).",
            columns.len()
        ),
        rows: collection.preview_rows(),
        columns,
    })
}

// =============================================================================
// Plain-text tables
// =============================================================================

/// Shorten `text` to `width` characters, ending with an ellipsis when cut.
#[must_use]
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{kept}…")
}

/// Render a header and rows as space-aligned lines.
///
/// Returns the header line, a rule line, then one line per row.
#[must_use]
pub fn align_columns<S: AsRef<str>>(headers: &[S], rows: &[Vec<String>]) -> Vec<String> {
    let cells = |row: &[String]| -> Vec<String> {
        row.iter().map(|c| truncate(c, MAX_CELL_WIDTH)).collect()
    };
    let header: Vec<String> = headers
        .iter()
        .map(|h| truncate(h.as_ref(), MAX_CELL_WIDTH))
        .collect();
    let body: Vec<Vec<String>> = rows.iter().map(|r| cells(r)).collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &body {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let join = |row: &[String]| -> String {
        row.iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let mut lines = vec![join(&header), join(&rule)];
    lines.extend(body.iter().map(|row| join(row)));
    lines
}
