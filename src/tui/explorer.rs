//! Explorer widget for the TUI.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use crate::core::session::{Session, StatusLevel};
use crate::render::views::{
    self, NO_LAYERS_OR_TABLES, NO_MATCHING_FIELDS, NO_RECORDS, align_columns,
};

use super::app::{App, Focus, InputField};

const CURSOR: &str = "▏";

/// The full-screen explorer layout.
pub struct Explorer<'a> {
    app: &'a App,
}

impl<'a> Explorer<'a> {
    #[must_use]
    pub const fn new(app: &'a App) -> Self {
        Self { app }
    }

    fn session(&self) -> &'a Session {
        self.app.session()
    }

    fn block(&self, title: &'a str, pane: Focus) -> Block<'a> {
        let color = if self.app.focus() == pane {
            Color::Cyan
        } else {
            Color::DarkGray
        };
        Block::default()
            .title(format!(" {title} "))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
    }

    /// Text being edited for `field`, with a cursor, if that field is open.
    fn editing(&self, field: InputField) -> Option<String> {
        self.app
            .input()
            .filter(|input| input.field == field)
            .map(|input| format!("{}{CURSOR}", input.buffer))
    }

    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let title = Line::from(vec![
            Span::styled(
                " svcx explorer ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled("[Tab] Focus  ", Style::default().fg(Color::Gray)),
            Span::styled("[Enter] Load/Select  ", Style::default().fg(Color::Gray)),
            Span::styled("[p] Preview  ", Style::default().fg(Color::Gray)),
            Span::styled("[?] Help  ", Style::default().fg(Color::Gray)),
            Span::styled("[q] Quit", Style::default().fg(Color::Gray)),
        ]);

        Paragraph::new(title)
            .style(Style::default().bg(Color::DarkGray))
            .render(area, buf);
    }

    fn render_url(&self, area: Rect, buf: &mut Buffer) {
        let text = self
            .editing(InputField::Url)
            .unwrap_or_else(|| self.session().service_url_input().to_string());
        let style = if self.app.input().is_some_and(|i| i.field == InputField::Url) {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };

        Paragraph::new(Span::styled(text, style))
            .block(self.block("Service URL [e] edit", Focus::Url))
            .render(area, buf);
    }

    fn render_service(&self, area: Rect, buf: &mut Buffer) {
        let lines = match self.session().service() {
            Some(service) => {
                let header = views::service_header(service);
                let mut lines = vec![
                    Line::from(Span::styled(
                        header.title,
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::from(header.description),
                ];
                if let Some(details) = header.details {
                    lines.push(Line::from(Span::styled(
                        details,
                        Style::default().fg(Color::DarkGray),
                    )));
                }
                lines
            }
            None if self.session().is_loading_service() => {
                vec![Line::from("Loading service metadata...")]
            }
            None => vec![Line::from(Span::styled(
                "Press Enter to load the service.",
                Style::default().fg(Color::DarkGray),
            ))],
        };

        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title(" Service ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .render(area, buf);
    }

    fn render_layers(&self, area: Rect, buf: &mut Buffer) {
        let block = self.block("Layers & Tables", Focus::Layers);
        let Some(service) = self.session().service() else {
            block.render(area, buf);
            return;
        };

        let sections = views::layer_list(service);
        if sections.is_empty() {
            Paragraph::new(Span::styled(
                NO_LAYERS_OR_TABLES,
                Style::default().fg(Color::DarkGray),
            ))
            .block(block)
            .render(area, buf);
            return;
        }

        let mut lines = Vec::new();
        let mut index = 0;
        let mut selected_line = 0;
        for section in sections {
            lines.push(Line::from(Span::styled(
                section.heading,
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            )));
            for item in section.items {
                let highlighted = index == self.app.list_index();
                let chosen = self.session().selected_layer() == Some(item.id);
                let mut style = Style::default();
                if chosen {
                    style = style.fg(Color::Green);
                }
                if highlighted {
                    selected_line = lines.len();
                    if self.app.focus() == Focus::Layers {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                }
                let marker = if highlighted { "> " } else { "  " };
                lines.push(Line::from(Span::styled(
                    format!("{marker}{}", item.label),
                    style,
                )));
                index += 1;
            }
        }

        // Keep the highlighted entry visible.
        let visible = usize::from(area.height.saturating_sub(2)).max(1);
        let offset = u16::try_from(selected_line.saturating_sub(visible - 1)).unwrap_or(u16::MAX);

        Paragraph::new(lines)
            .scroll((offset, 0))
            .block(block)
            .render(area, buf);
    }

    fn control_line(&self, label: &str, key: &str, field: InputField, value: String) -> Line<'a> {
        let (text, style) = match self.editing(field) {
            Some(edit) => (edit, Style::default().fg(Color::Yellow)),
            None => (value, Style::default()),
        };
        Line::from(vec![
            Span::styled(format!("{label}: "), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(text, style),
            Span::styled(format!("  [{key}]"), Style::default().fg(Color::DarkGray)),
        ])
    }

    fn render_details(&self, area: Rect, buf: &mut Buffer) {
        let session = self.session();
        let block = self.block("Layer Details", Focus::Details);

        let Some(layer) = session.layer() else {
            let text = match session.selected_label() {
                Some(label) if session.is_busy() => format!("Loading details for {label}..."),
                _ => "Select a layer or table to see its details.".to_string(),
            };
            Paragraph::new(Span::styled(text, Style::default().fg(Color::DarkGray)))
                .block(block)
                .render(area, buf);
            return;
        };

        let view = views::layer_view(
            layer,
            session.field_filter(),
            session.preview_where(),
            session.preview_record_count(),
        );
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let mut lines = vec![
            Line::from(vec![Span::styled("Name: ", bold), Span::raw(view.name.clone())]),
            Line::from(vec![
                Span::styled("Type: ", bold),
                Span::raw(view.layer_type.clone()),
                Span::styled("  Geometry: ", bold),
                Span::raw(view.geometry.clone()),
            ]),
            Line::from(vec![
                Span::styled("Object ID Field: ", bold),
                Span::raw(view.object_id_field.clone()),
            ]),
            self.control_line("WHERE", "w", InputField::Where, view.where_clause.clone()),
            self.control_line(
                "Records",
                "n",
                InputField::Count,
                view.record_count.to_string(),
            ),
            Line::from(Span::styled(
                format!("[p] {}", view.preview_label()),
                Style::default().fg(Color::Cyan),
            )),
            self.control_line("Filter", "/", InputField::Filter, view.filter.clone()),
            Line::from(""),
            Line::from(Span::styled(
                view.fields_heading.clone(),
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            )),
        ];

        if view.fields.is_empty() {
            lines.push(Line::from(Span::styled(
                NO_MATCHING_FIELDS,
                Style::default().fg(Color::DarkGray),
            )));
        } else {
            let rows: Vec<Vec<String>> = view.fields.iter().map(|f| f.to_vec()).collect();
            lines.extend(table_lines(&views::FIELD_COLUMNS, &rows));
        }

        Paragraph::new(lines).block(block).render(area, buf);
    }

    fn render_preview(&self, area: Rect, buf: &mut Buffer) {
        let block = self.block("Preview", Focus::Preview);
        let dim = Style::default().fg(Color::DarkGray);

        let lines = match self.session().preview() {
            None if self.session().layer().is_some() => {
                vec![Line::from(Span::styled("Press p to preview records.", dim))]
            }
            None => Vec::new(),
            Some(collection) => match views::preview_view(collection) {
                None => vec![Line::from(Span::styled(NO_RECORDS, dim))],
                Some(view) => {
                    let mut lines = vec![
                        Line::from(Span::styled(view.summary, Style::default().fg(Color::Green))),
                        Line::from(Span::styled(view.note, dim)),
                    ];
                    lines.extend(table_lines(&view.columns, &view.rows));
                    lines
                }
            },
        };

        Paragraph::new(lines).block(block).render(area, buf);
    }

    fn render_status(&self, area: Rect, buf: &mut Buffer) {
        let line = if let Some(input) = self.app.input() {
            Line::from(vec![
                Span::styled(
                    format!(" {}: ", input.field.prompt()),
                    Style::default().fg(Color::Yellow),
                ),
                Span::styled(
                    "Enter to apply, Esc to cancel",
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        } else if let Some(status) = self.session().status() {
            let color = match status.level {
                StatusLevel::Info => Color::Cyan,
                StatusLevel::Success => Color::Green,
                StatusLevel::Error => Color::Red,
            };
            Line::from(Span::styled(
                format!(" {}", status.message),
                Style::default().fg(color),
            ))
        } else {
            Line::from(Span::styled(
                " Ready.",
                Style::default().fg(Color::DarkGray),
            ))
        };

        Paragraph::new(line).render(area, buf);
    }

    fn render_help(area: Rect, buf: &mut Buffer) {
        let help_text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "  svcx explorer - Keyboard Shortcuts",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("  Navigation:"),
            Line::from("    Tab, Shift-Tab  Cycle focus"),
            Line::from("    ↑/k, ↓/j        Move in the layer list"),
            Line::from("    Enter           Load service / select layer"),
            Line::from(""),
            Line::from("  Actions:"),
            Line::from("    e               Edit service URL"),
            Line::from("    /               Filter fields"),
            Line::from("    w               Edit WHERE clause"),
            Line::from("    n               Edit record count"),
            Line::from("    p               Preview records"),
            Line::from("    u               Show layer URL"),
            Line::from("    c               Clear"),
            Line::from("    ?               Toggle this help"),
            Line::from("    q, Esc          Quit"),
            Line::from(""),
            Line::from(Span::styled(
                "  Press any key to close",
                Style::default().fg(Color::DarkGray),
            )),
        ];

        let help_width = 52.min(area.width);
        let help_height = 22.min(area.height);
        let x = area.x + (area.width.saturating_sub(help_width)) / 2;
        let y = area.y + (area.height.saturating_sub(help_height)) / 2;
        let help_area = Rect::new(x, y, help_width, help_height);

        let block = Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .style(Style::default().bg(Color::Black));

        Clear.render(help_area, buf);
        Paragraph::new(help_text).block(block).render(help_area, buf);
    }
}

/// Aligned table lines: bold header, dim rule, plain rows.
fn table_lines<'a>(headers: &[impl AsRef<str>], rows: &[Vec<String>]) -> Vec<Line<'a>> {
    align_columns(headers, rows)
        .into_iter()
        .enumerate()
        .map(|(i, text)| match i {
            0 => Line::from(Span::styled(
                text,
                Style::default().add_modifier(Modifier::BOLD),
            )),
            1 => Line::from(Span::styled(text, Style::default().fg(Color::DarkGray))),
            _ => Line::from(text),
        })
        .collect()
}

impl Widget for Explorer<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Length(3), // URL input
                Constraint::Min(10),   // Panes
                Constraint::Length(1), // Status
            ])
            .split(area);

        self.render_header(rows[0], buf);
        self.render_url(rows[1], buf);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(rows[2]);

        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(3)])
            .split(columns[0]);
        self.render_service(left[0], buf);
        self.render_layers(left[1], buf);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(columns[1]);
        self.render_details(right[0], buf);
        self.render_preview(right[1], buf);

        self.render_status(rows[3], buf);

        if self.app.show_help() {
            Self::render_help(area, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::client::ServiceClient;
    use crate::core::session::Session;
    use ratatui::{Terminal, backend::TestBackend};

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal
            .draw(|frame| frame.render_widget(Explorer::new(app), frame.area()))
            .unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(usize::from(buffer.area.width))
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn initial_screen_shows_url_and_prompt() {
        let app = App::new(Session::default(), ServiceClient::new().unwrap());
        let screen = render(&app);
        assert!(screen.contains("svcx explorer"));
        assert!(screen.contains("sampleserver6.arcgisonline.com"));
        assert!(screen.contains("Press Enter to load the service."));
        assert!(screen.contains("Ready."));
    }

    #[test]
    fn small_terminal_does_not_panic() {
        let app = App::new(Session::default(), ServiceClient::new().unwrap());
        let mut terminal = Terminal::new(TestBackend::new(20, 8)).unwrap();
        terminal
            .draw(|frame| frame.render_widget(Explorer::new(&app), frame.area()))
            .unwrap();
    }
}
