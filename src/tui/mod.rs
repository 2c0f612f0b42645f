//! Read-only terminal dashboard over a finished simulation result.
//!
//! Feature-gated behind `tui`. Launch with `--tui` on the CLI.

mod controls;
mod layout;
/// Dashboard application state.
pub mod runtime;
mod style;

use std::io;

use crossterm::event;
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::layout::LayoutResult;
use crate::sim::materializer::ResultBundle;
use crate::sizing::VehicleTypeSizing;
use runtime::App;

/// One finished simulator run, ready to browse. Mirrors
/// [`crate::api::AppState`] but kept independent of the `api` feature so
/// `--tui` builds without it.
pub struct AppState {
    pub bundle: ResultBundle,
    pub layout: LayoutResult,
    pub sizes: Vec<VehicleTypeSizing>,
}

/// Launches the dashboard event loop over one finished [`AppState`].
///
/// Sets up the terminal (raw mode, alternate screen), runs the event loop,
/// and restores the terminal on exit.
pub fn run(state: &AppState) {
    enable_raw_mode().unwrap_or_else(|e| {
        eprintln!("error: failed to enable raw mode: {e}");
        std::process::exit(1);
    });

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).unwrap_or_else(|e| {
        let _ = disable_raw_mode();
        eprintln!("error: failed to enter alternate screen: {e}");
        std::process::exit(1);
    });

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).unwrap_or_else(|e| {
        let _ = disable_raw_mode();
        eprintln!("error: failed to create terminal: {e}");
        std::process::exit(1);
    });

    let mut app = App::new(state);
    let result = event_loop(&mut terminal, &mut app);

    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();

    if let Err(e) = result {
        eprintln!("error: dashboard crashed: {e}");
        std::process::exit(1);
    }
}

/// Core event loop: draw, then block for the next key press. Nothing in the
/// dashboard advances on its own, so there's no tick interval to poll.
fn event_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|frame| layout::render(frame, app))?;

        if app.quit {
            return Ok(());
        }

        if let event::Event::Key(key) = event::read()? {
            controls::handle_key(app, key);
        }
    }
}
