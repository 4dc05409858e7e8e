use std::fmt;
use std::path::PathBuf;

/// Which axis of a chart a field was requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "X"),
            Axis::Y => write!(f, "Y"),
        }
    }
}

/// Rejected chart configuration. Every variant names the offending value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("unknown chart type: {0:?} (expected one of: Bar Chart, Scatter Plot, Box Plot, Histogram)")]
    UnknownChartType(String),

    #[error("unknown field: {0:?}")]
    UnknownField(String),

    #[error("unknown color option: {0:?} (expected one of: None, department, category, priority)")]
    UnknownColor(String),

    #[error("{chart} requires a numeric {axis}-axis field, got {field}")]
    NotNumeric {
        chart: &'static str,
        axis: Axis,
        field: &'static str,
    },

    #[error("{chart} requires a categorical {axis}-axis field, got {field}")]
    NotCategorical {
        chart: &'static str,
        axis: Axis,
        field: &'static str,
    },

    #[error("trendline cannot be shown when X and Y are the same field ({0})")]
    TrendlineSameField(&'static str),

    #[error("histogram needs at least one bin")]
    ZeroBins,

    #[error("histogram supports at most 200 bins, got {0}")]
    TooManyBins(usize),

    #[error("unknown preset: {0:?}")]
    UnknownPreset(String),

    #[error("unknown {what}: {value:?}")]
    UnknownValue { what: &'static str, value: String },

    #[error("invalid {param}: {value:?} is not a number")]
    InvalidNumber { param: String, value: String },
}

/// Failure writing dashboard artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode dashboard: {0}")]
    Encode(#[from] serde_json::Error),
}
