//! Terminal session for the report viewer
//!
//! Owns the ratatui terminal, switches the screen in and out of raw mode
//! and turns crossterm input into [`TuiEvent`]s for the main loop.

use anyhow::Result;
use crossterm::{
    cursor,
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind, MouseEvent},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::panic;
use std::time::Duration;
use tracing::{debug, error};

/// Input the main loop reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuiEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize { width: u16, height: u16 },
    /// No input arrived within the tick rate
    Tick,
}

impl TuiEvent {
    /// Map a crossterm event; key releases and focus changes are dropped
    pub fn from_crossterm(event: Event) -> Option<Self> {
        match event {
            // Windows reports releases as well
            Event::Key(key) if key.kind == KeyEventKind::Press => Some(TuiEvent::Key(key)),
            Event::Mouse(mouse) => Some(TuiEvent::Mouse(mouse)),
            Event::Resize(width, height) => Some(TuiEvent::Resize { width, height }),
            _ => None,
        }
    }
}

pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    tick_rate: Duration,
    entered: bool,
}

impl Tui {
    pub fn new(tick_rate: Duration) -> Result<Self> {
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend)?;
        Ok(Self {
            terminal,
            tick_rate,
            entered: false,
        })
    }

    /// Enter the alternate screen and enable raw mode
    pub fn enter(&mut self) -> Result<()> {
        install_panic_hook();
        terminal::enable_raw_mode()?;
        crossterm::execute!(
            io::stdout(),
            EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        )?;
        self.entered = true;
        self.terminal.clear()?;
        debug!(tick_ms = self.tick_rate.as_millis() as u64, "terminal entered");
        Ok(())
    }

    /// Give the screen back to the shell; does nothing unless entered
    pub fn exit(&mut self) -> Result<()> {
        if !self.entered {
            return Ok(());
        }
        self.entered = false;
        restore_terminal()?;
        debug!("terminal restored");
        Ok(())
    }

    /// Wait up to one tick for input
    ///
    /// `Ok(None)` means an event arrived that the viewer ignores.
    pub fn next_event(&self) -> Result<Option<TuiEvent>> {
        if !event::poll(self.tick_rate)? {
            return Ok(Some(TuiEvent::Tick));
        }
        Ok(TuiEvent::from_crossterm(event::read()?))
    }

    pub fn draw<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut ratatui::Frame),
    {
        self.terminal.draw(f)?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.exit();
    }
}

fn restore_terminal() -> Result<()> {
    terminal::disable_raw_mode()?;
    crossterm::execute!(
        io::stdout(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        cursor::Show
    )?;
    Ok(())
}

/// Restore the terminal before the default hook prints the panic
fn install_panic_hook() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        error!(panic = %info, "viewer panicked");
        default_hook(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEventState, KeyModifiers, MouseEventKind};

    fn key(kind: KeyEventKind) -> Event {
        Event::Key(KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn test_only_key_presses_pass() {
        assert!(matches!(
            TuiEvent::from_crossterm(key(KeyEventKind::Press)),
            Some(TuiEvent::Key(k)) if k.code == KeyCode::Char('q')
        ));
        assert_eq!(TuiEvent::from_crossterm(key(KeyEventKind::Release)), None);
        assert_eq!(TuiEvent::from_crossterm(key(KeyEventKind::Repeat)), None);
    }

    #[test]
    fn test_resize_and_mouse_are_forwarded() {
        assert_eq!(
            TuiEvent::from_crossterm(Event::Resize(120, 40)),
            Some(TuiEvent::Resize { width: 120, height: 40 })
        );

        let mouse = MouseEvent {
            kind: MouseEventKind::ScrollDown,
            column: 3,
            row: 7,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(TuiEvent::from_crossterm(Event::Mouse(mouse)), Some(TuiEvent::Mouse(mouse)));
    }

    #[test]
    fn test_focus_changes_are_ignored() {
        assert_eq!(TuiEvent::from_crossterm(Event::FocusGained), None);
        assert_eq!(TuiEvent::from_crossterm(Event::FocusLost), None);
    }

    #[test]
    fn test_exit_before_enter_leaves_terminal_alone() {
        // Creating the backend does not touch the terminal until `enter`
        if let Ok(mut tui) = Tui::new(Duration::from_millis(250)) {
            assert_eq!(tui.tick_rate, Duration::from_millis(250));
            assert!(tui.exit().is_ok());
        }
    }
}
