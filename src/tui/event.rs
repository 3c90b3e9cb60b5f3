//! Event handling for the explorer TUI.

use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// TUI events.
#[derive(Debug, Clone)]
pub enum Event {
    /// Nothing happened within the tick rate.
    Tick,
    /// Keyboard input.
    Key(KeyEvent),
    /// Terminal resize.
    Resize(u16, u16),
}

/// Polls the terminal for events.
pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    /// Create a new event handler with the given tick rate.
    #[must_use]
    pub const fn new(tick_rate_ms: u64) -> Self {
        Self {
            tick_rate: Duration::from_millis(tick_rate_ms),
        }
    }

    /// Poll for the next event with timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if event polling fails.
    pub fn next(&self) -> std::io::Result<Event> {
        if event::poll(self.tick_rate)? {
            match event::read()? {
                // Windows reports releases too; only presses drive the UI.
                CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(Event::Key(key)),
                CrosstermEvent::Resize(w, h) => Ok(Event::Resize(w, h)),
                _ => Ok(Event::Tick),
            }
        } else {
            Ok(Event::Tick)
        }
    }
}

/// Action for a key pressed outside of text input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    /// Cycle pane focus.
    FocusNext,
    FocusPrev,
    Up,
    Down,
    /// Load the service or select the highlighted layer.
    Select,
    Preview,
    EditUrl,
    EditFilter,
    EditWhere,
    EditCount,
    ShowLayerUrl,
    Clear,
    Help,
    None,
}

impl KeyAction {
    /// Parse a key event into an action.
    #[must_use]
    pub const fn from_key_event(key: KeyEvent) -> Self {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Self::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Self::Quit,
            KeyCode::Tab => Self::FocusNext,
            KeyCode::BackTab => Self::FocusPrev,
            KeyCode::Up | KeyCode::Char('k') => Self::Up,
            KeyCode::Down | KeyCode::Char('j') => Self::Down,
            KeyCode::Enter => Self::Select,
            KeyCode::Char('p') => Self::Preview,
            KeyCode::Char('e') => Self::EditUrl,
            KeyCode::Char('/') => Self::EditFilter,
            KeyCode::Char('w') => Self::EditWhere,
            KeyCode::Char('n') => Self::EditCount,
            KeyCode::Char('u') => Self::ShowLayerUrl,
            KeyCode::Char('c') => Self::Clear,
            KeyCode::Char('?') | KeyCode::F(1) => Self::Help,
            _ => Self::None,
        }
    }
}
