//! Terminal front panel for the Merlin console.

pub mod app;
pub mod ui;

pub use app::{ConsoleApp, Panel};

use crate::Rom;
use std::sync::Arc;

/// CPU steps per event-loop iteration, sized so a 2 ms poll plus a batch
/// lands near the hardware's ~75 µs instruction rate.
const STEPS_PER_TICK: usize = 32;

/// Keys the Merlin matrix knows about.
const PANEL_KEYS: &str = "~0123456789scnh";

/// Run the interactive Merlin console until the player quits.
pub fn run_console(rom: Arc<Rom>) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = ConsoleApp::new(rom);

    loop {
        terminal.draw(|frame| {
            ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(2))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char(c) => {
                            let c = c.to_ascii_lowercase();
                            if PANEL_KEYS.contains(c) {
                                app.press(c);
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        app.tick(STEPS_PER_TICK);

        if app.should_quit {
            break;
        }
    }

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
