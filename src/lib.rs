//! AEGIS equipment portfolio analyzer.
//!
//! A fixed table of equipment-upgrade records, derived financial metrics,
//! row filtering, chart validation and rendering, a custom chart query box
//! and a self-contained HTML dashboard.

pub mod chart;
pub mod config;
pub mod data;
pub mod error;
pub mod figure;
pub mod filter;
pub mod logging;
pub mod metrics;
pub mod params;
pub mod query;
pub mod report;
pub mod schema;
pub mod stats;
pub mod table;

pub use chart::{build_chart_spec, ChartKind, ChartOptions, ChartSpec};
pub use data::{load_dataset, EquipmentRecord, Table};
pub use error::{ReportError, ValidationError};
pub use filter::{filter_rows, FilterSet, Preset};
pub use metrics::derive_metrics;
pub use query::{interpret_query, parse_free_text, QueryOutcome};
pub use schema::{ColorBy, Field};
