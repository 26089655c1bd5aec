//! Component trait - Interface for UI components
//!
//! The report grid and every dialog implement this trait. Components keep
//! only view state (cursor, scroll, text input); report data stays in
//! `ReportState` and reaches them through the App.

use crate::action::Action;
use anyhow::Result;
use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::{layout::Rect, Frame};

/// Trait for UI components
///
/// 1. `handle_key_event` / `handle_mouse_event` turn events into Actions
/// 2. `update` applies an Action to the component's view state
/// 3. `draw` renders the component
pub trait Component {
    /// Called once after the component is created
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Map a key event to an Action.
    ///
    /// Cursor movement that only concerns the component may be applied
    /// here directly.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let _ = key;
        Ok(None)
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        let _ = mouse;
        Ok(None)
    }

    /// Apply an Action, optionally producing a follow-up Action
    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        let _ = action;
        Ok(None)
    }

    /// Render into `area`
    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()>;
}
