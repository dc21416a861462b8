pub mod app;
mod ui;
mod helpers;

use anyhow::Result;
use app::App;
use crossterm::{
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    cursor::{SetCursorStyle, Show},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tracing::{debug, warn};

use crate::config::Config;

pub fn run_tui(config: Config) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(config);
    debug!("tui started");

    // Терминал восстанавливается даже если цикл завершился ошибкой
    let result = ui::run_ui_loop(&mut terminal, &mut app);
    if let Err(e) = &result {
        warn!(error = %e, "tui loop failed");
    }

    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, SetCursorStyle::BlinkingBar)?;
    Terminal::new(CrosstermBackend::new(stdout)).map_err(Into::into)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen,
        Show,
        SetCursorStyle::DefaultUserShape
    )?;
    Ok(())
}
