//! Action enum - All possible application actions
//!
//! Components turn key events into Actions; the App applies them to the
//! report state and the components' own view state.

use crate::model::DateRange;
use std::fmt;

/// All possible actions in the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // ─────────────────────────────────────────────────────────────────────────
    // App Lifecycle
    // ─────────────────────────────────────────────────────────────────────────
    /// Regular tick for time-based updates
    Tick,
    /// Terminal was resized
    Resize(u16, u16),
    /// Quit without confirmation
    ForceQuit,

    // ─────────────────────────────────────────────────────────────────────────
    // Grid Navigation
    // ─────────────────────────────────────────────────────────────────────────
    NextRow,
    PrevRow,
    FirstRow,
    LastRow,
    /// Focus the column to the right
    NextColumn,
    /// Focus the column to the left
    PrevColumn,
    NextPage,
    PrevPage,

    // ─────────────────────────────────────────────────────────────────────────
    // Columns
    // ─────────────────────────────────────────────────────────────────────────
    /// Cycle the focused column through ascending, descending and unsorted
    CycleSort,
    /// Swap the focused column with its left neighbour
    MoveColumnLeft,
    /// Swap the focused column with its right neighbour
    MoveColumnRight,
    /// Hide the focused column
    HideColumn,
    /// Show or hide a column by id
    ToggleColumn(String),
    /// Put a visible column where another one sits
    ReorderColumn { from: String, to: String },
    ShowAllColumns,
    HideAllColumns,

    // ─────────────────────────────────────────────────────────────────────────
    // Modals
    // ─────────────────────────────────────────────────────────────────────────
    OpenQuitDialog,
    OpenHelp,
    /// Open the filter panel
    OpenFilters,
    /// Open the field chooser
    OpenFieldChooser,
    /// Open recipients of the selected schedule row
    OpenDetail,
    /// Close the current modal
    CloseModal,

    // ─────────────────────────────────────────────────────────────────────────
    // Filters
    // ─────────────────────────────────────────────────────────────────────────
    /// Check or uncheck one option of a column
    ToggleFilterValue { column: String, value: String },
    /// Store an in-progress date range
    SetDateDraft { column: String, range: DateRange },
    /// Activate the in-progress date range of a column
    ApplyDateRange(String),
    ClearColumnFilter(String),
    /// Reset every filter and every date draft
    ClearAllFilters,

    // ─────────────────────────────────────────────────────────────────────────
    // Export
    // ─────────────────────────────────────────────────────────────────────────
    /// Write the filtered grid as CSV
    ExportCsv,

    // ─────────────────────────────────────────────────────────────────────────
    // Recipients
    // ─────────────────────────────────────────────────────────────────────────
    /// Toggle the recipient under the cursor
    ToggleRecipient,
    /// Select every address of the group under the cursor
    SelectGroup,
    DeselectAllRecipients,
    /// Build the mailto link for the selection
    ComposeEmail,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Tick => write!(f, "Tick"),
            Action::Resize(w, h) => write!(f, "Resize({}, {})", w, h),
            Action::ForceQuit => write!(f, "ForceQuit"),
            Action::NextRow => write!(f, "NextRow"),
            Action::PrevRow => write!(f, "PrevRow"),
            Action::FirstRow => write!(f, "FirstRow"),
            Action::LastRow => write!(f, "LastRow"),
            Action::NextColumn => write!(f, "NextColumn"),
            Action::PrevColumn => write!(f, "PrevColumn"),
            Action::NextPage => write!(f, "NextPage"),
            Action::PrevPage => write!(f, "PrevPage"),
            Action::CycleSort => write!(f, "CycleSort"),
            Action::MoveColumnLeft => write!(f, "MoveColumnLeft"),
            Action::MoveColumnRight => write!(f, "MoveColumnRight"),
            Action::HideColumn => write!(f, "HideColumn"),
            Action::ToggleColumn(id) => write!(f, "ToggleColumn({})", id),
            Action::ReorderColumn { from, to } => write!(f, "ReorderColumn({} -> {})", from, to),
            Action::ShowAllColumns => write!(f, "ShowAllColumns"),
            Action::HideAllColumns => write!(f, "HideAllColumns"),
            Action::OpenQuitDialog => write!(f, "OpenQuitDialog"),
            Action::OpenHelp => write!(f, "OpenHelp"),
            Action::OpenFilters => write!(f, "OpenFilters"),
            Action::OpenFieldChooser => write!(f, "OpenFieldChooser"),
            Action::OpenDetail => write!(f, "OpenDetail"),
            Action::CloseModal => write!(f, "CloseModal"),
            Action::ToggleFilterValue { column, value } => {
                write!(f, "ToggleFilterValue({}, {})", column, value)
            }
            Action::SetDateDraft { column, range } => {
                write!(f, "SetDateDraft({}, {:?}..{:?})", column, range.from, range.to)
            }
            Action::ApplyDateRange(column) => write!(f, "ApplyDateRange({})", column),
            Action::ClearColumnFilter(column) => write!(f, "ClearColumnFilter({})", column),
            Action::ClearAllFilters => write!(f, "ClearAllFilters"),
            Action::ExportCsv => write!(f, "ExportCsv"),
            Action::ToggleRecipient => write!(f, "ToggleRecipient"),
            Action::SelectGroup => write!(f, "SelectGroup"),
            Action::DeselectAllRecipients => write!(f, "DeselectAllRecipients"),
            Action::ComposeEmail => write!(f, "ComposeEmail"),
        }
    }
}
