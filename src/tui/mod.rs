//! Interactive explorer using ratatui.
//!
//! A full-screen front end over [`crate::core::session::Session`].

mod app;
mod event;
mod explorer;

pub use app::{App, Focus, Input, InputField};
pub use event::{Event, EventHandler, KeyAction};
pub use explorer::Explorer;

use std::io;

use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use crate::core::client::ServiceClient;
use crate::core::session::Session;
use crate::error::Result;

/// Terminal type alias for the TUI backend.
pub type Tui = Terminal<CrosstermBackend<io::Stdout>>;

/// Initialize the terminal for TUI mode.
///
/// # Errors
///
/// Returns an error if terminal initialization fails.
pub fn init_terminal() -> io::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

/// Restore the terminal to normal mode.
///
/// # Errors
///
/// Returns an error if terminal restoration fails.
pub fn restore_terminal(terminal: &mut Tui) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the explorer until the user quits.
///
/// # Errors
///
/// Returns an error if the terminal cannot be set up or drawn to.
pub async fn run_explorer(
    session: Session,
    client: ServiceClient,
    initial_url: Option<String>,
) -> Result<()> {
    let mut terminal = init_terminal()?;

    let app_result = App::new(session, client)
        .run(&mut terminal, initial_url)
        .await;

    // Always try to restore terminal, even if app failed
    if let Err(e) = restore_terminal(&mut terminal) {
        eprintln!("Failed to restore terminal: {e}");
    }

    app_result
}
