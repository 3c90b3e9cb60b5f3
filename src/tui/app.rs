//! Application state and main event loop for the explorer.
//!
//! The [`App`] owns the [`Session`]. Keys become session commands; any
//! network effect runs on its own task and its response comes back over an
//! `mpsc` channel, to be applied on the next loop iteration.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use crate::core::client::ServiceClient;
use crate::core::session::{Command, Effect, Response, Session};
use crate::error::Result;
use crate::render::views;

use super::Tui;
use super::event::{Event, EventHandler, KeyAction};
use super::explorer::Explorer;

const TICK_RATE_MS: u64 = 100;
const RESPONSE_BUFFER: usize = 16;

/// Focusable panes, in `Tab` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Url,
    Layers,
    Details,
    Preview,
}

impl Focus {
    const ORDER: [Self; 4] = [Self::Url, Self::Layers, Self::Details, Self::Preview];

    fn position(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    #[must_use]
    pub fn prev(self) -> Self {
        Self::ORDER[(self.position() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// Text fields that can be edited in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Url,
    Filter,
    Where,
    Count,
}

impl InputField {
    /// Prompt shown while editing.
    #[must_use]
    pub const fn prompt(self) -> &'static str {
        match self {
            Self::Url => "Service URL",
            Self::Filter => "Filter fields",
            Self::Where => "WHERE clause",
            Self::Count => "Record count",
        }
    }
}

/// An edit in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub field: InputField,
    pub buffer: String,
    original: String,
}

/// Application state for the explorer.
pub struct App {
    session: Session,
    client: ServiceClient,
    focus: Focus,
    input: Option<Input>,
    /// Highlighted entry of the layer list.
    list_index: usize,
    show_help: bool,
    should_quit: bool,
}

impl App {
    #[must_use]
    pub fn new(session: Session, client: ServiceClient) -> Self {
        Self {
            session,
            client,
            focus: Focus::default(),
            input: None,
            list_index: 0,
            show_help: false,
            should_quit: false,
        }
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub const fn focus(&self) -> Focus {
        self.focus
    }

    #[must_use]
    pub const fn input(&self) -> Option<&Input> {
        self.input.as_ref()
    }

    #[must_use]
    pub const fn list_index(&self) -> usize {
        self.list_index
    }

    #[must_use]
    pub const fn show_help(&self) -> bool {
        self.show_help
    }

    #[must_use]
    pub const fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Run the application event loop.
    ///
    /// `initial_url`, when given, is loaded immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if drawing to the terminal fails.
    pub async fn run(mut self, terminal: &mut Tui, initial_url: Option<String>) -> Result<()> {
        let events = EventHandler::new(TICK_RATE_MS);
        let (tx, mut rx) = mpsc::channel::<Response>(RESPONSE_BUFFER);

        if let Some(url) = initial_url
            && let Some(effect) = self.dispatch(Command::LoadService { url })
        {
            self.spawn(effect, &tx);
        }

        while !self.should_quit {
            terminal.draw(|frame| frame.render_widget(Explorer::new(&self), frame.area()))?;

            match events.next() {
                Ok(Event::Key(key)) => {
                    if let Some(effect) = self.handle_key(key) {
                        self.spawn(effect, &tx);
                    }
                }
                Ok(Event::Tick | Event::Resize(..)) => {}
                Err(e) => tracing::warn!("Event error: {e}"),
            }

            while let Ok(response) = rx.try_recv() {
                self.apply(response);
            }
        }

        Ok(())
    }

    /// Run an effect on its own task; the response is sent back over `tx`.
    fn spawn(&self, effect: Effect, tx: &mpsc::Sender<Response>) {
        let client = self.client.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let response = effect.run(&client).await;
            if tx.send(response).await.is_err() {
                tracing::debug!("Explorer closed before the response arrived");
            }
        });
    }

    fn dispatch(&mut self, command: Command) -> Option<Effect> {
        self.session.handle(command)
    }

    /// Apply a response from a finished effect.
    pub fn apply(&mut self, response: Response) {
        let service_loaded = matches!(response, Response::ServiceLoaded { .. });
        if self.session.apply(response) && service_loaded {
            self.list_index = 0;
            if self.session.service().is_some() {
                self.focus = Focus::Layers;
            }
        }
    }

    /// Handle a key press, returning the network effect it started, if any.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Effect> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return None;
        }
        if self.input.is_some() {
            return self.handle_input_key(key);
        }

        let action = KeyAction::from_key_event(key);
        if self.show_help {
            if action != KeyAction::None {
                self.show_help = false;
            }
            return None;
        }

        match action {
            KeyAction::Quit => {
                self.should_quit = true;
                None
            }
            KeyAction::FocusNext => {
                self.focus = self.focus.next();
                None
            }
            KeyAction::FocusPrev => {
                self.focus = self.focus.prev();
                None
            }
            KeyAction::Up => {
                self.move_selection(-1);
                None
            }
            KeyAction::Down => {
                self.move_selection(1);
                None
            }
            KeyAction::Select => match self.focus {
                Focus::Url => {
                    let url = self.session.service_url_input().to_string();
                    self.dispatch(Command::LoadService { url })
                }
                Focus::Layers => self.select_highlighted(),
                Focus::Details | Focus::Preview => None,
            },
            KeyAction::Preview => {
                self.focus = Focus::Preview;
                self.dispatch(Command::PreviewRecords)
            }
            KeyAction::EditUrl => {
                self.focus = Focus::Url;
                self.begin_input(InputField::Url);
                None
            }
            KeyAction::EditFilter => {
                self.begin_input(InputField::Filter);
                None
            }
            KeyAction::EditWhere => {
                self.begin_input(InputField::Where);
                None
            }
            KeyAction::EditCount => {
                self.begin_input(InputField::Count);
                None
            }
            KeyAction::ShowLayerUrl => self.dispatch(Command::ShowLayerUrl),
            KeyAction::Clear => {
                let effect = self.dispatch(Command::Clear);
                if !self.session.is_loading_service() {
                    self.list_index = 0;
                    self.focus = Focus::Url;
                }
                effect
            }
            KeyAction::Help => {
                self.show_help = true;
                None
            }
            KeyAction::None => None,
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self
            .session
            .service()
            .map_or(0, |service| views::list_items(service).len());
        if len == 0 {
            return;
        }
        self.list_index = self.list_index.saturating_add_signed(delta).min(len - 1);
    }

    fn select_highlighted(&mut self) -> Option<Effect> {
        let item = views::list_items(self.session.service()?)
            .into_iter()
            .nth(self.list_index)?;
        self.focus = Focus::Details;
        self.dispatch(Command::SelectLayer {
            id: item.id,
            name: Some(item.name),
        })
    }

    /// Start editing `field`. Layer controls need a loaded layer.
    fn begin_input(&mut self, field: InputField) {
        let current = match field {
            InputField::Url => self.session.service_url_input().to_string(),
            _ if self.session.layer().is_none() => return,
            InputField::Filter => self.session.field_filter().to_string(),
            InputField::Where => self.session.preview_where().to_string(),
            InputField::Count => self.session.preview_record_count().to_string(),
        };
        self.input = Some(Input {
            field,
            buffer: current.clone(),
            original: current,
        });
    }

    fn handle_input_key(&mut self, key: KeyEvent) -> Option<Effect> {
        let input = self.input.as_mut()?;
        match key.code {
            KeyCode::Esc => {
                let input = self.input.take()?;
                // The filter applies live, so cancelling must restore it.
                if input.field == InputField::Filter {
                    self.dispatch(Command::SetFieldFilter(input.original));
                }
                None
            }
            KeyCode::Enter => {
                let input = self.input.take()?;
                self.commit(input)
            }
            KeyCode::Backspace => {
                input.buffer.pop();
                self.live_update();
                None
            }
            KeyCode::Char(c) => {
                input.buffer.push(c);
                self.live_update();
                None
            }
            _ => None,
        }
    }

    fn live_update(&mut self) {
        if let Some(input) = &self.input
            && input.field == InputField::Filter
        {
            let text = input.buffer.clone();
            self.dispatch(Command::SetFieldFilter(text));
        }
    }

    fn commit(&mut self, input: Input) -> Option<Effect> {
        match input.field {
            InputField::Url => self.dispatch(Command::LoadService { url: input.buffer }),
            InputField::Filter => self.dispatch(Command::SetFieldFilter(input.buffer)),
            InputField::Where => self.dispatch(Command::SetPreviewWhere(input.buffer)),
            InputField::Count => self.dispatch(Command::SetPreviewRecordCount(input.buffer)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{FieldDescriptor, LayerDetail, LayerSummary, QueryOptions, ServiceDescriptor};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        let client = ServiceClient::new().unwrap();
        App::new(
            Session::new("https://example.com/arcgis/rest/services/Demo/MapServer", QueryOptions::default()),
            client,
        )
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    /// Load a two-layer service through the same path a real response takes.
    fn loaded_app() -> App {
        let mut app = app();
        let effect = app.handle_key(key(KeyCode::Enter)).unwrap();
        let Effect::FetchService { ticket, url } = effect else {
            panic!("expected a service fetch");
        };
        app.apply(Response::ServiceLoaded {
            ticket,
            url,
            result: Ok(ServiceDescriptor {
                layers: vec![
                    LayerSummary { id: 0, name: "Cities".to_string() },
                    LayerSummary { id: 4, name: "Rivers".to_string() },
                ],
                ..ServiceDescriptor::default()
            }),
        });
        app
    }

    fn with_layer(mut app: App) -> App {
        let Some(Effect::FetchLayer { ticket, layer_id, name, .. }) =
            app.handle_key(key(KeyCode::Enter))
        else {
            panic!("expected a layer fetch");
        };
        app.apply(Response::LayerLoaded {
            ticket,
            layer_id,
            name,
            result: Ok(LayerDetail {
                name: Some("Rivers".to_string()),
                fields: vec![
                    FieldDescriptor {
                        name: "NAME".to_string(),
                        alias: "River".to_string(),
                        field_type: "esriFieldTypeString".to_string(),
                    },
                    FieldDescriptor {
                        name: "LENGTH".to_string(),
                        alias: "Length".to_string(),
                        field_type: "esriFieldTypeDouble".to_string(),
                    },
                ],
                ..LayerDetail::default()
            }),
        });
        app
    }

    #[test]
    fn tab_cycles_focus() {
        let mut app = app();
        assert_eq!(app.focus(), Focus::Url);
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus(), Focus::Layers);
        app.handle_key(key(KeyCode::BackTab));
        app.handle_key(key(KeyCode::BackTab));
        assert_eq!(app.focus(), Focus::Preview);
    }

    #[test]
    fn enter_on_url_loads_service() {
        let app = loaded_app();
        assert!(app.session().service().is_some());
        assert_eq!(app.focus(), Focus::Layers);
        assert_eq!(app.list_index(), 0);
    }

    #[test]
    fn selection_is_bounded() {
        let mut app = loaded_app();
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.list_index(), 0);
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.list_index(), 1);
    }

    #[test]
    fn enter_on_list_selects_highlighted_layer() {
        let mut app = loaded_app();
        app.handle_key(key(KeyCode::Down));
        let effect = app.handle_key(key(KeyCode::Enter));
        assert!(matches!(
            effect,
            Some(Effect::FetchLayer { layer_id: 4, ref name, .. }) if name == "Rivers"
        ));
        assert_eq!(app.focus(), Focus::Details);
    }

    #[test]
    fn filter_applies_live_and_esc_restores() {
        let mut app = loaded_app();
        app.handle_key(key(KeyCode::Down));
        let mut app = with_layer(app);

        app.handle_key(key(KeyCode::Char('/')));
        type_text(&mut app, "len");
        assert_eq!(app.session().filtered_fields().len(), 1);

        app.handle_key(key(KeyCode::Esc));
        assert!(app.input().is_none());
        assert_eq!(app.session().field_filter(), "");
        assert!(!app.should_quit());
    }

    #[test]
    fn count_edit_commits_on_enter() {
        let mut app = loaded_app();
        app.handle_key(key(KeyCode::Down));
        let mut app = with_layer(app);

        app.handle_key(key(KeyCode::Char('n')));
        app.handle_key(key(KeyCode::Backspace));
        type_text(&mut app, "500");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.session().preview_record_count(), 100);

        let effect = app.handle_key(key(KeyCode::Char('p')));
        assert!(matches!(effect, Some(Effect::FetchPreview { layer_id: 4, .. })));
    }

    #[test]
    fn layer_inputs_need_a_layer() {
        let mut app = loaded_app();
        app.handle_key(key(KeyCode::Char('w')));
        assert!(app.input().is_none());
        app.handle_key(key(KeyCode::Char('q')));
        assert!(app.should_quit());
    }

    #[test]
    fn url_edit_loads_on_enter() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('e')));
        for _ in 0..200 {
            app.handle_key(key(KeyCode::Backspace));
        }
        type_text(&mut app, "https://other.example/MapServer");
        let effect = app.handle_key(key(KeyCode::Enter));
        assert!(matches!(
            effect,
            Some(Effect::FetchService { ref url, .. }) if url == "https://other.example/MapServer"
        ));
    }

    #[test]
    fn help_swallows_next_key() {
        let mut app = loaded_app();
        app.handle_key(key(KeyCode::Char('?')));
        assert!(app.show_help());
        app.handle_key(key(KeyCode::Char('q')));
        assert!(!app.show_help());
        assert!(!app.should_quit());
    }

    #[test]
    fn clear_resets_view() {
        let mut app = loaded_app();
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Char('c')));
        assert!(app.session().service().is_none());
        assert_eq!(app.list_index(), 0);
        assert_eq!(app.focus(), Focus::Url);
    }
}
