//! sched-report - a terminal viewer for the schedule report
//!
//! Loads a report bundle, then hands the terminal to the ratatui
//! component tree.

mod action;
mod app;
mod component;
mod components;
mod config;
mod logging;
mod model;
mod services;
mod tui;

use crate::action::Action;
use crate::app::App;
use crate::component::Component;
use crate::config::Config;
use crate::model::ReportBundle;
use crate::tui::{Tui, TuiEvent};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "sched-report")]
#[command(about = "Schedule report viewer")]
struct Cli {
    /// Report bundle (JSON) to display
    #[arg(long, env = "SCHED_REPORT_BUNDLE", required_unless_present = "preview")]
    bundle: Option<PathBuf>,
    /// Show the built-in sample bundle instead
    #[arg(long, default_value_t = false)]
    preview: bool,
    #[arg(long)]
    layout_file: Option<String>,
    /// Slot of the layout file used by this report
    #[arg(long)]
    namespace: Option<String>,
    #[arg(long)]
    page_size: Option<usize>,
    #[arg(long)]
    export_dir: Option<String>,
    /// Input poll interval in milliseconds
    #[arg(long)]
    tick_rate: Option<u64>,
    /// Write the effective settings to the config file
    #[arg(long, default_value_t = false)]
    save_config: bool,
}

impl Cli {
    /// Flags win over the config file
    fn apply(&self, mut config: Config) -> Config {
        if let Some(path) = &self.layout_file {
            config.layout_file = Some(path.clone());
        }
        if let Some(namespace) = &self.namespace {
            config.namespace = namespace.clone();
        }
        if let Some(page_size) = self.page_size.filter(|n| *n > 0) {
            config.page_size = page_size;
        }
        if let Some(dir) = &self.export_dir {
            config.export_dir = Some(dir.clone());
        }
        if let Some(tick_rate) = self.tick_rate {
            config.tick_rate_ms = tick_rate;
        }
        config
    }

    fn load_bundle(&self) -> Result<ReportBundle> {
        match (&self.bundle, self.preview) {
            (_, true) => services::preview_bundle(),
            (Some(path), false) => services::load_bundle(path),
            (None, false) => anyhow::bail!("No bundle given; pass --bundle or --preview"),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The terminal belongs to the UI, so logs go to a file
    let log_dir = Config::config_dir().unwrap_or_else(|| PathBuf::from("."));
    let _ = logging::init(&log_dir);

    let config = cli.apply(Config::load().unwrap_or_default());
    if cli.save_config {
        if let Err(e) = config.save() {
            warn!(error = %e, "failed to save config");
        }
    }

    let bundle = cli.load_bundle().context("Failed to load report bundle")?;

    // Setup terminal
    let mut tui = Tui::new(config.tick_rate())?;
    tui.enter()?;

    let mut app = App::new(bundle, &config);
    app.init()?;

    // Main event loop
    let result = run_app(&mut tui, &mut app);

    // Cleanup terminal
    tui.exit()?;

    if let Err(err) = result {
        eprintln!("Error: {:?}", err);
        std::process::exit(1);
    }

    Ok(())
}

/// Run the main application loop
fn run_app(tui: &mut Tui, app: &mut App) -> Result<()> {
    while !app.should_quit {
        tui.draw(|frame| {
            if let Err(e) = app.draw(frame, frame.area()) {
                warn!(error = %e, "draw failed");
            }
        })?;

        let action = match tui.next_event()? {
            Some(TuiEvent::Key(key)) => app.handle_key_event(key)?,
            Some(TuiEvent::Mouse(mouse)) => app.handle_mouse_event(mouse)?,
            Some(TuiEvent::Resize { width, height }) => Some(Action::Resize(width, height)),
            Some(TuiEvent::Tick) => Some(Action::Tick),
            None => None,
        };

        // Action might produce a follow-up action
        let mut current_action = action;
        while let Some(a) = current_action {
            current_action = app.update(a)?;
        }
    }

    Ok(())
}
