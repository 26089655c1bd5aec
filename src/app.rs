//! Root application component
//!
//! The App struct implements the Component trait, acting as the root component
//! that delegates event handling and rendering to child components.
//! It owns the `ReportState` and applies column and filter changes to it;
//! the components only describe what the user asked for.

use crate::action::Action;
use crate::component::Component;
use crate::components::{
    draw_report_screen, draw_unauthorized_screen, ChooserEntry, DetailDialog, FieldChooser,
    FilterColumn, FilterPanel, HelpDialog, QuitDialog, ReportRenderContext, ReportView,
};
use crate::config::Config;
use crate::model::layout::{hide_all, hide_column, move_column, reorder, show_all, toggle_column};
use crate::model::modal::{Modal, ModalStack};
use crate::model::selection::{schedule_id, ScheduleDetail};
use crate::model::{ColumnDescriptor, Dataset, ReportBundle, ReportState};
use crate::services::{self, LayoutStore};
use anyhow::Result;
use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, MouseEvent};
use ratatui::{layout::Rect, Frame};
use std::path::PathBuf;
use tracing::{debug, info, warn};

// ═══════════════════════════════════════════════════════════════════════════════
// App Struct
// ═══════════════════════════════════════════════════════════════════════════════

/// Main application state - coordinates between components
pub struct App {
    /// Dataset, column descriptors and active filters
    pub report: ReportState,

    /// False when the host failed its domain check
    pub authorized: bool,

    /// Column layout persistence
    pub store: LayoutStore,

    /// Directory CSV exports are written to
    pub export_dir: PathBuf,

    /// Modal overlay stack
    pub modals: ModalStack,

    /// Flag to indicate the app should quit
    pub should_quit: bool,

    /// Error message to display
    pub error: Option<String>,

    /// Status message to display
    pub status_message: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Child Components
    // ─────────────────────────────────────────────────────────────────────────
    pub view: ReportView,
    pub filter_panel: FilterPanel,
    pub field_chooser: FieldChooser,
    pub detail: DetailDialog,
    pub quit_dialog: QuitDialog,
    pub help_dialog: HelpDialog,
}

// ═══════════════════════════════════════════════════════════════════════════════
// App Implementation
// ═══════════════════════════════════════════════════════════════════════════════

impl App {
    /// Build the report from a loaded bundle and restore the stored layout
    pub fn new(bundle: ReportBundle, config: &Config) -> App {
        let authorized = bundle.host_authorized;
        let dataset = if authorized {
            bundle.data.unwrap_or_default()
        } else {
            warn!("host not authorized, report data withheld");
            Dataset::default()
        };

        let mut report = ReportState::new(dataset, bundle.labels, bundle.preferences);
        let store = LayoutStore::new(config.layout_path(), config.namespace.clone());
        let columns = store.restore(report.columns().to_vec());
        report.set_columns(columns);

        let mut view = ReportView::new(config.page_size);
        view.reset_sort(report.columns());

        info!(
            rows = report.rows().len(),
            columns = report.columns().len(),
            layout = %store.path().display(),
            authorized,
            "report ready"
        );

        App {
            report,
            authorized,
            store,
            export_dir: config.export_path(),
            modals: ModalStack::new(),
            should_quit: false,
            error: None,
            status_message: None,
            view,
            filter_panel: FilterPanel::new(),
            field_chooser: FieldChooser::new(),
            detail: DetailDialog::new(),
            quit_dialog: QuitDialog,
            help_dialog: HelpDialog::default(),
        }
    }

    /// Number of rows passing the filters
    fn total_rows(&self) -> usize {
        self.report.filtered_rows().len()
    }

    /// Install a new column layout and write it to the store
    fn apply_layout(&mut self, columns: Option<Vec<ColumnDescriptor>>) {
        let Some(columns) = columns else {
            return;
        };
        self.report.set_columns(columns);

        if let Err(e) = self.store.persist(self.report.columns()) {
            warn!(error = %e, "failed to persist column layout");
            self.error = Some(format!("Failed to save column layout: {:#}", e));
        }

        let total = self.total_rows();
        self.view.clamp(&self.report, total);
        self.refresh_open_dialog();
    }

    /// Back to the first row after the filtered set changed
    fn filters_changed(&mut self) {
        self.view.first_row();
        let total = self.total_rows();
        self.view.clamp(&self.report, total);
        self.filter_panel.sync_session(&self.report.filters);
        debug!(rows = total, "filters changed");
    }

    fn chooser_entries(&self) -> Vec<ChooserEntry> {
        let ctx = self.report.context();
        self.report
            .columns()
            .iter()
            .map(|column| ChooserEntry {
                id: column.id.clone(),
                header: ctx.header(column),
                visible: column.visible,
                order_number: column.order_number,
            })
            .collect()
    }

    fn filter_columns(&self) -> Vec<FilterColumn> {
        let ctx = self.report.context();
        self.report
            .visible_columns()
            .into_iter()
            .map(|column| FilterColumn {
                id: column.id.clone(),
                header: ctx.header(column),
                date_field: column.date_field,
                options: if column.date_field {
                    self.report.date_options(&column.id)
                } else {
                    self.report.options(&column.id)
                },
                bounds: self.report.date_bounds(&column.id),
                time_zone: ctx.time_zone(),
            })
            .collect()
    }

    /// Feed the open dialog the current layout
    fn refresh_open_dialog(&mut self) {
        match self.modals.top() {
            Some(Modal::FieldChooser) => {
                let entries = self.chooser_entries();
                self.field_chooser.set_entries(entries);
            }
            Some(Modal::Filters) => {
                let columns = self.filter_columns();
                self.filter_panel.set_columns(columns, &self.report.filters);
            }
            _ => {}
        }
    }

    fn focused_column_id(&self) -> Option<String> {
        self.view.focused_column_id(&self.report)
    }

    fn move_focused_column(&mut self, delta: isize) {
        let Some(column_id) = self.focused_column_id() else {
            return;
        };
        let columns = move_column(self.report.columns(), &column_id, delta);
        self.apply_layout(columns);
        self.view.focus_column(&self.report, &column_id);
    }

    fn export_csv(&mut self) {
        let projection = self.report.projection(self.view.sort.as_ref());
        match services::export_to_file(&self.export_dir, Local::now().date_naive(), &projection) {
            Ok(path) => {
                self.status_message = Some(format!(
                    "Exported {} row(s) to {}",
                    projection.rows.len(),
                    path.display()
                ));
            }
            Err(e) => {
                warn!(error = %e, "export failed");
                self.error = Some(format!("Export failed: {:#}", e));
            }
        }
    }

    fn open_detail(&mut self) {
        let rows = self.report.sorted_rows(self.view.sort.as_ref());
        let Some(schd_id) = rows
            .get(self.view.selected_index())
            .and_then(|row| schedule_id(row))
        else {
            self.status_message = Some("Selected row has no schedule".to_string());
            return;
        };

        match ScheduleDetail::build(&self.report.dataset, schd_id) {
            Some(detail) => {
                let requests_label = self.report.labels.lookup("label.Requests");
                self.detail.open(detail, requests_label);
                self.modals.push(Modal::Detail { schd_id });
            }
            None => {
                self.status_message = Some(format!("Schedule {} not found", schd_id));
            }
        }
    }

    fn compose_email(&mut self) {
        if self.detail.selection.is_empty() {
            self.status_message = Some("No recipients selected".to_string());
            return;
        }
        let link = self.detail.mailto_link();
        info!(recipients = self.detail.selection.len(), "e-mail composed");
        self.status_message = Some(link);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Component Implementation
// ═══════════════════════════════════════════════════════════════════════════════

impl Component for App {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if !self.authorized {
            return self.handle_unauthorized_key_event(key);
        }

        if let Some(modal) = self.modals.top().cloned() {
            self.handle_modal_key_event(&modal, key)
        } else {
            self.error = None;
            self.status_message = None;
            self.view.handle_key_event(key)
        }
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        if self.authorized && self.modals.is_empty() {
            self.view.handle_mouse_event(mouse)
        } else {
            Ok(None)
        }
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            // ─────────────────────────────────────────────────────────────────
            // App Lifecycle
            // ─────────────────────────────────────────────────────────────────
            Action::Tick | Action::Resize(_, _) => {}
            Action::ForceQuit => {
                self.should_quit = true;
            }

            // ─────────────────────────────────────────────────────────────────
            // Grid Navigation (delegate to ReportView)
            // ─────────────────────────────────────────────────────────────────
            Action::NextRow => {
                let total = self.total_rows();
                self.view.next_row(total);
            }
            Action::PrevRow => {
                let total = self.total_rows();
                self.view.previous_row(total);
            }
            Action::FirstRow => self.view.first_row(),
            Action::LastRow => {
                let total = self.total_rows();
                self.view.last_row(total);
            }
            Action::NextPage => {
                let total = self.total_rows();
                self.view.next_page(total);
            }
            Action::PrevPage => self.view.previous_page(),
            Action::NextColumn => {
                let visible = self.report.visible_columns().len();
                self.view.next_column(visible);
            }
            Action::PrevColumn => self.view.previous_column(),

            // ─────────────────────────────────────────────────────────────────
            // Columns
            // ─────────────────────────────────────────────────────────────────
            Action::CycleSort => self.view.cycle_sort(&self.report),
            Action::MoveColumnLeft => self.move_focused_column(-1),
            Action::MoveColumnRight => self.move_focused_column(1),
            Action::HideColumn => {
                if let Some(column_id) = self.focused_column_id() {
                    let columns = hide_column(self.report.columns(), &column_id);
                    if columns.is_none() {
                        self.status_message =
                            Some("The last visible column cannot be hidden".to_string());
                    }
                    self.apply_layout(columns);
                }
            }
            Action::ToggleColumn(column_id) => {
                let columns = toggle_column(self.report.columns(), &column_id);
                self.apply_layout(columns);
            }
            Action::ReorderColumn { from, to } => {
                let columns = reorder(self.report.columns(), &from, &to);
                self.apply_layout(columns);
            }
            Action::ShowAllColumns => {
                let columns = show_all(self.report.columns());
                self.apply_layout(Some(columns));
            }
            Action::HideAllColumns => {
                let columns = hide_all(self.report.columns());
                self.apply_layout(Some(columns));
            }

            // ─────────────────────────────────────────────────────────────────
            // Modals
            // ─────────────────────────────────────────────────────────────────
            Action::OpenQuitDialog => {
                self.modals.push(Modal::QuitConfirm);
            }
            Action::OpenHelp => {
                self.help_dialog.scroll_offset = 0;
                self.modals.toggle(Modal::Help { scroll_offset: 0 });
            }
            Action::OpenFilters => {
                let columns = self.filter_columns();
                self.filter_panel.set_columns(columns, &self.report.filters);
                self.modals.push(Modal::Filters);
            }
            Action::OpenFieldChooser => {
                let entries = self.chooser_entries();
                self.field_chooser.open(entries);
                self.modals.push(Modal::FieldChooser);
            }
            Action::OpenDetail => self.open_detail(),
            Action::CloseModal => {
                self.modals.pop();
            }

            // ─────────────────────────────────────────────────────────────────
            // Filters
            // ─────────────────────────────────────────────────────────────────
            Action::ToggleFilterValue { column, value } => {
                self.report.filters.active.toggle_value(&column, &value);
                self.filters_changed();
            }
            Action::SetDateDraft { column, range } => {
                self.report.filters.set_draft(&column, range);
                self.filter_panel.sync_session(&self.report.filters);
            }
            Action::ApplyDateRange(column) => {
                self.report.filters.commit_draft(&column);
                self.filters_changed();
            }
            Action::ClearColumnFilter(column) => {
                self.report.filters.clear_column(&column);
                self.filter_panel.clear_column_inputs(&column);
                self.filters_changed();
            }
            Action::ClearAllFilters => {
                self.report.filters.clear_all();
                self.filter_panel.reset_inputs();
                self.filters_changed();
            }

            // ─────────────────────────────────────────────────────────────────
            // Export
            // ─────────────────────────────────────────────────────────────────
            Action::ExportCsv => self.export_csv(),

            // ─────────────────────────────────────────────────────────────────
            // Recipients (delegate to DetailDialog)
            // ─────────────────────────────────────────────────────────────────
            Action::ToggleRecipient | Action::SelectGroup | Action::DeselectAllRecipients => {
                self.detail.update(action)?;
            }
            Action::ComposeEmail => self.compose_email(),
        }

        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        if !self.authorized {
            draw_unauthorized_screen(frame, area);
            return Ok(());
        }

        let ctx = ReportRenderContext {
            state: &self.report,
            error: self.error.as_deref(),
            status_message: self.status_message.as_deref(),
        };
        draw_report_screen(frame, area, &mut self.view, &ctx)?;

        // Draw modal overlay if active
        if let Some(modal) = self.modals.top().cloned() {
            self.draw_modal(frame, area, &modal)?;
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Helper Methods
// ═══════════════════════════════════════════════════════════════════════════════

impl App {
    fn handle_modal_key_event(&mut self, modal: &Modal, key: KeyEvent) -> Result<Option<Action>> {
        match modal {
            Modal::QuitConfirm => self.quit_dialog.handle_key_event(key),
            Modal::Help { .. } => self.help_dialog.handle_key_event(key),
            Modal::Filters => self.filter_panel.handle_key_event(key),
            Modal::FieldChooser => self.field_chooser.handle_key_event(key),
            Modal::Detail { .. } => self.detail.handle_key_event(key),
        }
    }

    fn handle_unauthorized_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Ok(Some(Action::ForceQuit)),
            _ => Ok(None),
        }
    }

    fn draw_modal(&mut self, frame: &mut Frame, area: Rect, modal: &Modal) -> Result<()> {
        match modal {
            Modal::QuitConfirm => self.quit_dialog.draw(frame, area)?,
            Modal::Help { .. } => self.help_dialog.draw(frame, area)?,
            Modal::Filters => self.filter_panel.draw(frame, area)?,
            Modal::FieldChooser => self.field_chooser.draw(frame, area)?,
            Modal::Detail { .. } => self.detail.draw(frame, area)?,
        }
        Ok(())
    }
}
