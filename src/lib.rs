// Sales Explorer - Core Library
// Exposes the filter-and-aggregate pipeline for the CLI, API server, and tests

pub mod aggregate;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod pivot;
pub mod record;
pub mod series;

// Only compile the HTTP layer when the server feature is enabled
#[cfg(feature = "server")]
pub mod api;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use aggregate::{
    aggregate_by, by_category, by_hierarchy, by_region, by_segment,
    AggregateRow, AggregateTable, GroupKey, KeyField,
};
pub use config::Config;
pub use dashboard::{Dashboard, PreviewRow, ScatterPoint, Session, Totals};
pub use error::LoadError;
pub use export::{export_dashboard, read_aggregate_csv, to_csv_bytes, write_csv, Tabular};
pub use filter::{filter, parse_selection, CascadeView, FilterCriteria, FilterOptions};
pub use loader::{load_csv, load_from_reader, Dataset, LoadOptions};
pub use pivot::{pivot, pivot_with, sub_category_by_month, Measure, PivotAgg, PivotRow, PivotTable};
pub use record::{RawSalesRow, SalesRecord, REQUIRED_COLUMNS};
pub use series::{monthly_series, MonthlyPoint, YearMonth};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
