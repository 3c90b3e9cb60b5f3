//! Robot-mode output (JSON and Markdown).
//!
//! Provides stable, token-efficient output for scripts and agents.

use serde::Serialize;

use crate::core::models::{
    FeatureCollection, FieldDescriptor, LayerDetail, QueryOptions, RobotOutput, ServiceDescriptor,
};
use crate::core::url::strip_query;
use crate::error::Result;
use crate::render::views::{self, NO_LAYERS_OR_TABLES, NO_MATCHING_FIELDS, NO_RECORDS};

/// Render any RobotOutput as JSON.
pub fn render_json<T: Serialize>(output: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(output)?
    } else {
        serde_json::to_string(output)?
    };
    Ok(json)
}

// =============================================================================
// Data payloads
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ServiceSummary {
    pub title: String,
    pub description: String,
    pub details: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ServiceData<'a> {
    pub summary: ServiceSummary,
    pub service: &'a ServiceDescriptor,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerData<'a> {
    pub layer: &'a LayerDetail,
    pub layer_url: String,
    pub filter: &'a str,
    pub fields_shown: usize,
    pub fields_total: usize,
    pub matching_fields: Vec<&'a FieldDescriptor>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewData<'a> {
    pub query_url: &'a str,
    pub record_count: usize,
    pub columns: Vec<&'a str>,
    pub features: &'a FeatureCollection,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryUrlData<'a> {
    pub url: &'a str,
    pub timeout_ms: u64,
    #[serde(rename = "where")]
    pub where_clause: &'a str,
    pub record_count: u32,
}

// =============================================================================
// JSON
// =============================================================================

/// Render a service description as JSON.
pub fn render_service_json(service: &ServiceDescriptor, url: &str, pretty: bool) -> Result<String> {
    let header = views::service_header(service);
    let data = ServiceData {
        summary: ServiceSummary {
            title: header.title,
            description: header.description,
            details: header.details,
        },
        service,
    };
    render_json(
        &RobotOutput::new("service", data).with_request_url(url),
        pretty,
    )
}

/// Render a layer and its matching fields as JSON.
///
/// `request_url` is the URL the layer was fetched from and lands in `meta`.
pub fn render_layer_json(
    layer: &LayerDetail,
    layer_url: &str,
    request_url: &str,
    filter: &str,
    pretty: bool,
) -> Result<String> {
    let matching = layer.filter_fields(filter);
    let data = LayerData {
        layer,
        layer_url: layer_url.to_string(),
        filter,
        fields_shown: matching.len(),
        fields_total: layer.fields.len(),
        matching_fields: matching,
    };
    render_json(
        &RobotOutput::new("layer", data).with_request_url(request_url),
        pretty,
    )
}

/// Render a record preview as JSON.
pub fn render_preview_json(
    collection: &FeatureCollection,
    query_url: &str,
    pretty: bool,
) -> Result<String> {
    let data = PreviewData {
        query_url,
        record_count: collection.len(),
        columns: collection.preview_columns(),
        features: collection,
    };
    render_json(
        &RobotOutput::new("preview", data).with_request_url(query_url),
        pretty,
    )
}

/// Render a preview query URL as JSON.
pub fn render_query_url_json(
    url: &str,
    timeout_ms: u64,
    options: &QueryOptions,
    pretty: bool,
) -> Result<String> {
    let data = QueryUrlData {
        url,
        timeout_ms,
        where_clause: options.where_clause(),
        record_count: options.record_count(),
    };
    render_json(&RobotOutput::new("query-url", data), pretty)
}

// =============================================================================
// Markdown
// =============================================================================

/// Escape a value for a Markdown table cell.
fn md_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn md_table(output: &mut String, headers: &[impl AsRef<str>], rows: &[Vec<String>]) {
    let header: Vec<String> = headers.iter().map(|h| md_cell(h.as_ref())).collect();
    output.push_str(&format!("| {} |\n", header.join(" | ")));
    output.push_str(&format!("|{}\n", " --- |".repeat(header.len())));
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| md_cell(c)).collect();
        output.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
}

/// Render a service description as Markdown.
pub fn render_service_md(service: &ServiceDescriptor, url: &str) -> Result<String> {
    let header = views::service_header(service);
    let mut output = format!("## {}\n\n{}\n\n", header.title, header.description);

    if let Some(details) = &header.details {
        output.push_str(&format!("- details: {details}\n"));
    }
    output.push_str(&format!("- url: {}\n\n", strip_query(url)));

    let sections = views::layer_list(service);
    if sections.is_empty() {
        output.push_str(&format!("_{NO_LAYERS_OR_TABLES}_\n"));
    }
    for section in sections {
        output.push_str(&format!("### {}\n", section.heading));
        for item in section.items {
            output.push_str(&format!("- {}\n", item.label));
        }
        output.push('\n');
    }

    Ok(output)
}

/// Render a layer as Markdown.
pub fn render_layer_md(layer: &LayerDetail, layer_url: &str, filter: &str) -> Result<String> {
    let view = views::layer_view(layer, filter, "", 0);
    let mut output = format!("## {}\n\n", view.name);
    output.push_str(&format!("- type: {}\n", view.layer_type));
    output.push_str(&format!("- geometry: {}\n", view.geometry));
    output.push_str(&format!("- object_id_field: {}\n", view.object_id_field));
    output.push_str(&format!("- url: {layer_url}\n"));
    if !view.filter.trim().is_empty() {
        output.push_str(&format!("- filter: {}\n", view.filter));
    }

    output.push_str(&format!("\n### {}\n\n", view.fields_heading));
    if view.fields.is_empty() {
        output.push_str(&format!("_{NO_MATCHING_FIELDS}_\n"));
    } else {
        let rows: Vec<Vec<String>> = view.fields.iter().map(|f| f.to_vec()).collect();
        md_table(&mut output, &views::FIELD_COLUMNS, &rows);
    }

    Ok(output)
}

/// Render a record preview as Markdown.
pub fn render_preview_md(collection: &FeatureCollection, query_url: &str) -> Result<String> {
    let mut output = String::from("## Preview\n\n");

    match views::preview_view(collection) {
        None => output.push_str(&format!("_{NO_RECORDS}_\n")),
        Some(view) => {
            output.push_str(&format!("{}\n\n{}\n\n", view.summary, view.note));
            md_table(&mut output, &view.columns, &view.rows);
        }
    }
    output.push_str(&format!("\n- query_url: {query_url}\n"));

    Ok(output)
}

/// Render a preview query URL as Markdown.
pub fn render_query_url_md(url: &str, timeout_ms: u64, options: &QueryOptions) -> Result<String> {
    Ok(format!(
        "## Query URL\n\n- url: {url}\n- where: `{}`\n- record_count: {}\n- timeout_ms: {timeout_ms}\n",
        options.where_clause(),
        options.record_count(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn parse(out: &str) -> Value {
        serde_json::from_str(out).unwrap()
    }

    #[test]
    fn service_json_envelope() {
        let service: ServiceDescriptor = serde_json::from_value(json!({
            "serviceDescription": "Demo",
            "layers": [{"id": 1, "name": "Roads"}]
        }))
        .unwrap();
        let out = render_service_json(&service, "https://x/MapServer?f=pjson", false).unwrap();
        let value = parse(&out);
        assert_eq!(value["schemaVersion"], "svcx.v1");
        assert_eq!(value["command"], "service");
        assert_eq!(value["data"]["summary"]["title"], "Demo");
        assert_eq!(value["data"]["service"]["layers"][0]["name"], "Roads");
        assert_eq!(value["meta"]["requestUrl"], "https://x/MapServer?f=pjson");
        assert!(value["errors"].as_array().unwrap().is_empty());
    }

    #[test]
    fn layer_json_counts() {
        let layer: LayerDetail = serde_json::from_value(json!({
            "name": "Roads",
            "fields": [
                {"name": "OBJECTID", "alias": "OBJECTID", "type": "esriFieldTypeOID"},
                {"name": "NAME", "alias": "Road", "type": "esriFieldTypeString"}
            ]
        }))
        .unwrap();
        let value = parse(
            &render_layer_json(
                &layer,
                "https://x/MapServer/1",
                "https://x/MapServer/1?f=pjson",
                "road",
                true,
            )
            .unwrap(),
        );
        assert_eq!(value["data"]["fieldsShown"], 1);
        assert_eq!(value["data"]["fieldsTotal"], 2);
        assert_eq!(value["data"]["matchingFields"][0]["name"], "NAME");
        assert_eq!(value["data"]["layerUrl"], "https://x/MapServer/1");
        assert_eq!(value["meta"]["requestUrl"], "https://x/MapServer/1?f=pjson");
    }

    #[test]
    fn query_url_json_fields() {
        let options = QueryOptions::new("", 250.0);
        let value = parse(&render_query_url_json("https://x/q", 15_000, &options, false).unwrap());
        assert_eq!(value["data"]["where"], "1=1");
        assert_eq!(value["data"]["recordCount"], 100);
        assert_eq!(value["data"]["timeoutMs"], 15_000);
    }

    #[test]
    fn preview_md_table() {
        let collection: FeatureCollection = serde_json::from_value(json!({
            "features": [{"attributes": {"NAME": "a|b", "N": 1}}]
        }))
        .unwrap();
        let out = render_preview_md(&collection, "https://x/q").unwrap();
        assert!(out.contains("Records returned: 1"));
        assert!(out.contains("| NAME | N |"));
        assert!(out.contains("a\\|b"));

        let out = render_preview_md(&FeatureCollection::default(), "https://x/q").unwrap();
        assert!(out.contains(NO_RECORDS));
    }

    #[test]
    fn service_md_sections() {
        let service: ServiceDescriptor = serde_json::from_value(json!({
            "tables": [{"id": 4, "name": "Owners"}]
        }))
        .unwrap();
        let out = render_service_md(&service, "https://x/MapServer").unwrap();
        assert!(out.contains("## Untitled Service"));
        assert!(out.contains("### Tables"));
        assert!(out.contains("- [Table 4] Owners"));
        assert!(!out.contains("### Layers"));
    }
}
