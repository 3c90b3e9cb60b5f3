//! Human-readable output using rich_rust.
//!
//! Renders service, layer and preview views as styled panels.

use crate::core::models::{FeatureCollection, LayerDetail, ServiceDescriptor};
use crate::core::url::strip_query;
use crate::error::Result;
use crate::render::views::{
    self, FIELD_COLUMNS, NO_LAYERS_OR_TABLES, NO_MATCHING_FIELDS, NO_RECORDS,
};
use crate::render::{colored, segments_to_string};
use rich_rust::prelude::*;
use rich_rust::{Segment, Style};

const PANEL_WIDTH: usize = 80;
const WIDE_PANEL_WIDTH: usize = 120;

fn styled<'a>(text: impl Into<String>, style: Style, no_color: bool) -> Segment<'a> {
    if no_color {
        Segment::plain(text.into())
    } else {
        Segment::styled(text.into(), style)
    }
}

fn label_line<'a>(label: &str, value: &str, no_color: bool) -> Vec<Segment<'a>> {
    vec![
        styled(format!("{label}: "), Style::new().bold(), no_color),
        Segment::plain(value.to_string()),
    ]
}

fn dim_line<'a>(text: &str, no_color: bool) -> Vec<Segment<'a>> {
    vec![styled(text.to_string(), Style::new().dim(), no_color)]
}

fn heading_line<'a>(text: &str, color: &str, no_color: bool) -> Vec<Segment<'a>> {
    vec![styled(text.to_string(), colored(color).bold(), no_color)]
}

fn table_lines<'a>(
    headers: &[impl AsRef<str>],
    rows: &[Vec<String>],
    no_color: bool,
) -> Vec<Vec<Segment<'a>>> {
    views::align_columns(headers, rows)
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                vec![styled(line, Style::new().bold(), no_color)]
            } else if i == 1 {
                dim_line(&line, no_color)
            } else {
                vec![Segment::plain(line)]
            }
        })
        .collect()
}

fn panel(
    lines: Vec<Vec<Segment<'_>>>,
    title: &str,
    border: &str,
    width: usize,
    no_color: bool,
) -> String {
    let title = if no_color {
        Text::new(title)
    } else {
        Text::styled(title, colored("cyan").bold())
    };

    let mut panel = Panel::new(lines).title(title).padding((0, 1));
    if !no_color {
        panel = panel.border_style(colored(border));
    }

    let segments = panel.render(width);
    segments_to_string(&segments, no_color)
}

/// Render a service description with its layers and tables.
pub fn render_service(
    service: &ServiceDescriptor,
    url: &str,
    no_color: bool,
) -> Result<String> {
    let header = views::service_header(service);
    let mut lines: Vec<Vec<Segment>> = Vec::new();

    lines.push(vec![styled(header.title.clone(), Style::new().bold(), no_color)]);
    lines.push(vec![Segment::plain(header.description.clone())]);
    if let Some(details) = &header.details {
        lines.push(dim_line(details, no_color));
    }
    lines.push(label_line("URL", &strip_query(url), no_color));
    lines.push(vec![Segment::plain(String::new())]);

    let sections = views::layer_list(service);
    if sections.is_empty() {
        lines.push(dim_line(NO_LAYERS_OR_TABLES, no_color));
    }
    for (i, section) in sections.iter().enumerate() {
        if i > 0 {
            lines.push(vec![Segment::plain(String::new())]);
        }
        lines.push(heading_line(section.heading, "magenta", no_color));
        for item in &section.items {
            lines.push(vec![Segment::plain(format!("  {}", item.label))]);
        }
    }

    Ok(panel(lines, "Service", "blue", PANEL_WIDTH, no_color))
}

/// Render a layer's metadata and its filtered fields.
pub fn render_layer(
    layer: &LayerDetail,
    layer_url: &str,
    filter: &str,
    no_color: bool,
) -> Result<String> {
    let view = views::layer_view(layer, filter, "", 0);
    let mut lines: Vec<Vec<Segment>> = vec![
        label_line("Name", &view.name, no_color),
        label_line("Type", &view.layer_type, no_color),
        label_line("Geometry", &view.geometry, no_color),
        label_line("Object ID Field", &view.object_id_field, no_color),
        label_line("URL", layer_url, no_color),
    ];
    if !view.filter.trim().is_empty() {
        lines.push(label_line("Filter", &view.filter, no_color));
    }
    lines.push(vec![Segment::plain(String::new())]);
    lines.push(heading_line(&view.fields_heading, "magenta", no_color));

    if view.fields.is_empty() {
        lines.push(dim_line(NO_MATCHING_FIELDS, no_color));
    } else {
        let rows: Vec<Vec<String>> = view.fields.iter().map(|f| f.to_vec()).collect();
        lines.extend(table_lines(&FIELD_COLUMNS, &rows, no_color));
    }

    Ok(panel(lines, "Layer", "blue", PANEL_WIDTH, no_color))
}

/// Render a record preview.
pub fn render_preview(
    collection: &FeatureCollection,
    query_url: &str,
    no_color: bool,
) -> Result<String> {
    let mut lines: Vec<Vec<Segment>> = Vec::new();

    match views::preview_view(collection) {
        None => lines.push(dim_line(NO_RECORDS, no_color)),
        Some(view) => {
            lines.push(vec![styled(view.summary, colored("green"), no_color)]);
            lines.push(dim_line(&view.note, no_color));
            lines.push(vec![Segment::plain(String::new())]);
            lines.extend(table_lines(&view.columns, &view.rows, no_color));
        }
    }
    lines.push(vec![Segment::plain(String::new())]);
    lines.push(dim_line(query_url, no_color));

    Ok(panel(lines, "Preview", "green", WIDE_PANEL_WIDTH, no_color))
}

/// Render the preview query URL. Plain text only, so it can be piped.
pub fn render_query_url(url: &str) -> Result<String> {
    Ok(url.to_string())
}
