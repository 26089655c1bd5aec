//! Modal stack for managing overlays
//!
//! Dialogs are pushed on top of the report grid; only the top one
//! receives input.

/// Represents a modal overlay that can be displayed on top of the main UI
#[derive(Debug, Clone, PartialEq)]
pub enum Modal {
    /// Quit confirmation dialog
    QuitConfirm,
    /// Keyboard shortcut overview
    Help { scroll_offset: usize },
    /// Column filter panel
    Filters,
    /// Show/hide and reorder columns
    FieldChooser,
    /// Recipients of one schedule
    Detail { schd_id: i64 },
}

/// A stack of modal overlays
///
/// Modals are rendered from bottom to top, with only the top modal
/// receiving input events.
#[derive(Debug, Default)]
pub struct ModalStack {
    stack: Vec<Modal>,
}

impl ModalStack {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    pub fn push(&mut self, modal: Modal) {
        self.stack.push(modal);
    }

    pub fn pop(&mut self) -> Option<Modal> {
        self.stack.pop()
    }

    /// Get a reference to the top modal without removing it
    pub fn top(&self) -> Option<&Modal> {
        self.stack.last()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Open a modal, or close it when it is already on top
    pub fn toggle(&mut self, modal: Modal) {
        if self.top() == Some(&modal) {
            self.stack.pop();
        } else {
            self.stack.push(modal);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modal_stack_push_pop() {
        let mut stack = ModalStack::new();
        assert!(stack.top().is_none());

        stack.push(Modal::Filters);
        stack.push(Modal::QuitConfirm);

        assert_eq!(stack.pop(), Some(Modal::QuitConfirm));
        assert_eq!(stack.pop(), Some(Modal::Filters));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_toggle_closes_open_modal() {
        let mut stack = ModalStack::new();
        stack.toggle(Modal::FieldChooser);
        assert_eq!(stack.top(), Some(&Modal::FieldChooser));

        stack.toggle(Modal::FieldChooser);
        assert!(stack.is_empty());

        stack.push(Modal::Detail { schd_id: 3 });
        stack.toggle(Modal::Filters);
        assert_eq!(stack.top(), Some(&Modal::Filters));
    }
}
