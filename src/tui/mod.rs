//! Terminal front end for the record form.

mod app;
mod ui;

pub use app::{App, Button, Focus, HandleResult, Modal, ModalKind};
pub use ui::render;

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::form::{Form, RecordBackend};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn init_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

/// Run the form until the user quits. The terminal is restored even when the loop fails.
///
/// # Errors
/// Terminal I/O failures.
pub fn run<B: RecordBackend>(form: Form<B>, title: &str) -> io::Result<()> {
    let mut terminal = init_terminal()?;
    let mut app = App::new(form, title);
    log::info!("tui started");
    let result = run_loop(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;
    log::info!("tui closed");
    result
}

fn run_loop<B: RecordBackend>(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App<B>,
) -> io::Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(frame, app))?;
        if event::poll(POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && app.handle_key(key) == HandleResult::Quit
        {
            break;
        }
    }
    Ok(())
}
