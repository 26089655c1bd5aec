//! Model layer - report data and the pure logic over it
//!
//! - `dataset` / `column` - host data and typed column descriptors
//! - `builder` / `layout` - building descriptors and keeping their order
//! - `resolve` / `datetime` - display values and headers
//! - `filter` / `projection` - option lists, filtering, sorting, paging
//! - `selection` - schedule recipients and mail links
//! - `domain` - the central `ReportState`
//! - `modal` - modal overlay management

pub mod builder;
pub mod column;
pub mod dataset;
pub mod datetime;
pub mod domain;
pub mod filter;
pub mod layout;
pub mod modal;
pub mod projection;
pub mod resolve;
pub mod selection;

// Re-export commonly used types
pub use column::{ColumnDescriptor, SortDirection};
pub use dataset::{Dataset, ReportBundle, Schema};
pub use domain::ReportState;
pub use filter::{DateRange, FilterBadge};
pub use projection::{Pagination, SortState, TableProjection};
