//! External service interactions
//!
//! This module contains the file-backed services around the report:
//! - Bundle loading and schema validation
//! - Column layout persistence
//! - CSV export

pub mod bundle;
pub mod export;
pub mod layout_store;

pub use bundle::{load_bundle, preview_bundle};
pub use export::export_to_file;
pub use layout_store::{LayoutStore, DEFAULT_NAMESPACE, LAYOUT_FILE_NAME};
