//! UI Components
//!
//! Each component keeps its own state, turns key events into Actions and
//! draws itself. The App routes actions between them.

pub mod detail;
pub mod field_chooser;
pub mod filter_panel;
pub mod help_dialog;
pub mod layout;
pub mod quit_dialog;
pub mod report_view;
pub mod table;

pub use detail::DetailDialog;
pub use field_chooser::{ChooserEntry, FieldChooser};
pub use filter_panel::{FilterColumn, FilterPanel};
pub use help_dialog::HelpDialog;
pub use layout::centered_popup;
pub use quit_dialog::QuitDialog;
pub use report_view::{draw_report_screen, draw_unauthorized_screen, ReportRenderContext, ReportView};
