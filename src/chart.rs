//! Chart requests and their field/type compatibility rules.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Axis, ValidationError};
use crate::schema::{ColorBy, Field};

pub const DEFAULT_BINS: usize = 15;
pub const MAX_BINS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartKind {
    #[serde(rename = "Bar Chart")]
    Bar,
    #[serde(rename = "Scatter Plot")]
    Scatter,
    #[serde(rename = "Box Plot")]
    Box,
    #[serde(rename = "Histogram")]
    Histogram,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::Bar,
        ChartKind::Scatter,
        ChartKind::Box,
        ChartKind::Histogram,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Bar => "Bar Chart",
            ChartKind::Scatter => "Scatter Plot",
            ChartKind::Box => "Box Plot",
            ChartKind::Histogram => "Histogram",
        }
    }

    /// Exact display-name match.
    pub fn parse(name: &str) -> Result<ChartKind, ValidationError> {
        ChartKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == name)
            .ok_or_else(|| ValidationError::UnknownChartType(name.to_string()))
    }

    /// Fields selectable on the X axis for this kind.
    pub fn x_options(&self) -> &'static [Field] {
        match self {
            ChartKind::Bar => &Field::ALL,
            ChartKind::Box => &Field::CATEGORICAL,
            ChartKind::Scatter | ChartKind::Histogram => &Field::NUMERIC,
        }
    }

    /// Fields selectable on the Y axis for this kind.
    pub fn y_options(&self) -> &'static [Field] {
        &Field::NUMERIC
    }

    pub fn uses_y(&self) -> bool {
        !matches!(self, ChartKind::Histogram)
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChartKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartKind::parse(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartOptions {
    /// OLS trendline, scatter plots only.
    pub trendline: bool,
    /// Histogram bin count.
    pub bins: usize,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            trendline: false,
            bins: DEFAULT_BINS,
        }
    }
}

impl ChartOptions {
    pub fn with_trendline(mut self, trendline: bool) -> Self {
        self.trendline = trendline;
        self
    }

    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }
}

/// A validated chart request, ready to render against any table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub x: Field,
    /// `None` for histograms.
    pub y: Option<Field>,
    pub color: ColorBy,
    pub trendline: bool,
    pub bins: usize,
    pub title: String,
    pub x_label: String,
    pub y_label: Option<String>,
}

impl Default for ChartSpec {
    /// Bar chart of initial cost by department, coloured by category.
    fn default() -> Self {
        Self {
            kind: ChartKind::Bar,
            x: Field::Department,
            y: Some(Field::CostM),
            color: ColorBy::Category,
            trendline: false,
            bins: DEFAULT_BINS,
            title: format!(
                "{} by {}",
                Field::CostM.display_name(),
                Field::Department.display_name()
            ),
            x_label: Field::Department.display_name().to_string(),
            y_label: Some(Field::CostM.display_name().to_string()),
        }
    }
}

fn require_numeric(kind: ChartKind, axis: Axis, field: Field) -> Result<(), ValidationError> {
    if field.is_numeric() {
        Ok(())
    } else {
        Err(ValidationError::NotNumeric {
            chart: kind.as_str(),
            axis,
            field: field.as_str(),
        })
    }
}

fn require_categorical(kind: ChartKind, axis: Axis, field: Field) -> Result<(), ValidationError> {
    if field.is_categorical() {
        Ok(())
    } else {
        Err(ValidationError::NotCategorical {
            chart: kind.as_str(),
            axis,
            field: field.as_str(),
        })
    }
}

/// Check field/type compatibility for `kind` and produce a titled spec.
///
/// `y` is ignored for histograms and `options.trendline` for everything but
/// scatter plots.
pub fn build_chart_spec(
    kind: ChartKind,
    x: Field,
    y: Field,
    color: ColorBy,
    options: ChartOptions,
) -> Result<ChartSpec, ValidationError> {
    let x_name = x.display_name();
    let y_name = y.display_name();

    let (y, trendline, title) = match kind {
        ChartKind::Bar => {
            require_numeric(kind, Axis::Y, y)?;
            (Some(y), false, format!("{} by {}", y_name, x_name))
        }
        ChartKind::Scatter => {
            require_numeric(kind, Axis::X, x)?;
            require_numeric(kind, Axis::Y, y)?;
            if options.trendline && x == y {
                return Err(ValidationError::TrendlineSameField(x.as_str()));
            }
            (Some(y), options.trendline, format!("{} vs {}", y_name, x_name))
        }
        ChartKind::Box => {
            require_categorical(kind, Axis::X, x)?;
            require_numeric(kind, Axis::Y, y)?;
            (Some(y), false, format!("{} Distribution by {}", y_name, x_name))
        }
        ChartKind::Histogram => {
            require_numeric(kind, Axis::X, x)?;
            if options.bins == 0 {
                return Err(ValidationError::ZeroBins);
            }
            if options.bins > MAX_BINS {
                return Err(ValidationError::TooManyBins(options.bins));
            }
            (None, false, format!("Distribution of {}", x_name))
        }
    };

    Ok(ChartSpec {
        kind,
        x,
        y,
        color,
        trendline,
        bins: options.bins,
        title,
        x_label: x_name.to_string(),
        y_label: y.map(|f| f.display_name().to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(kind: ChartKind, x: Field, y: Field) -> Result<ChartSpec, ValidationError> {
        build_chart_spec(kind, x, y, ColorBy::None, ChartOptions::default())
    }

    #[test]
    fn bar_accepts_any_x_but_numeric_y() {
        assert!(build(ChartKind::Bar, Field::Department, Field::CostM).is_ok());
        assert!(build(ChartKind::Bar, Field::AgeYears, Field::CostM).is_ok());
        let err = build(ChartKind::Bar, Field::Department, Field::Category).unwrap_err();
        assert_eq!(
            err,
            ValidationError::NotNumeric {
                chart: "Bar Chart",
                axis: Axis::Y,
                field: "category"
            }
        );
    }

    #[test]
    fn scatter_needs_numeric_axes() {
        let err = build(ChartKind::Scatter, Field::Department, Field::Roi).unwrap_err();
        assert!(matches!(err, ValidationError::NotNumeric { axis: Axis::X, .. }));
        let spec = build(ChartKind::Scatter, Field::CostM, Field::Roi).unwrap();
        assert_eq!(spec.title, "Return on Investment vs Initial Cost ($M)");
    }

    #[test]
    fn scatter_trendline_rejects_same_field() {
        let opts = ChartOptions::default().with_trendline(true);
        let err = build_chart_spec(ChartKind::Scatter, Field::Roi, Field::Roi, ColorBy::None, opts)
            .unwrap_err();
        assert_eq!(err, ValidationError::TrendlineSameField("roi"));
        // without a trendline the same field on both axes is allowed
        assert!(build(ChartKind::Scatter, Field::Roi, Field::Roi).is_ok());
    }

    #[test]
    fn box_needs_categorical_x() {
        let spec = build(ChartKind::Box, Field::Priority, Field::ValueScore).unwrap();
        assert_eq!(spec.title, "Value Score Distribution by Priority Level");
        let err = build(ChartKind::Box, Field::CostM, Field::ValueScore).unwrap_err();
        assert!(matches!(err, ValidationError::NotCategorical { axis: Axis::X, .. }));
    }

    #[test]
    fn histogram_ignores_y() {
        let spec = build(ChartKind::Histogram, Field::Roi, Field::Department).unwrap();
        assert_eq!(spec.y, None);
        assert_eq!(spec.title, "Distribution of Return on Investment");
        assert!(build(ChartKind::Histogram, Field::Department, Field::Roi).is_err());
        let zero = ChartOptions::default().with_bins(0);
        assert_eq!(
            build_chart_spec(ChartKind::Histogram, Field::Roi, Field::Roi, ColorBy::None, zero),
            Err(ValidationError::ZeroBins)
        );
    }

    #[test]
    fn histogram_bins_are_capped() {
        let at_cap = ChartOptions::default().with_bins(MAX_BINS);
        assert!(
            build_chart_spec(ChartKind::Histogram, Field::Roi, Field::Roi, ColorBy::None, at_cap)
                .is_ok()
        );
        let huge = ChartOptions::default().with_bins(usize::MAX);
        assert_eq!(
            build_chart_spec(ChartKind::Histogram, Field::Roi, Field::Roi, ColorBy::None, huge),
            Err(ValidationError::TooManyBins(usize::MAX))
        );
    }

    #[test]
    fn trendline_only_survives_on_scatter() {
        let opts = ChartOptions::default().with_trendline(true);
        let spec =
            build_chart_spec(ChartKind::Bar, Field::Department, Field::CostM, ColorBy::None, opts)
                .unwrap();
        assert!(!spec.trendline);
    }

    #[test]
    fn options_follow_kind() {
        assert_eq!(ChartKind::Box.x_options(), &Field::CATEGORICAL);
        assert_eq!(ChartKind::Bar.x_options().len(), 13);
        assert!(ChartKind::Scatter.x_options().iter().all(|f| f.is_numeric()));
    }

    #[test]
    fn default_spec() {
        let spec = ChartSpec::default();
        assert_eq!(spec.kind, ChartKind::Bar);
        assert_eq!(spec.title, "Initial Cost ($M) by Department");
        assert_eq!(spec.color, ColorBy::Category);
        let built = build_chart_spec(
            ChartKind::Bar,
            Field::Department,
            Field::CostM,
            ColorBy::Category,
            ChartOptions::default(),
        )
        .unwrap();
        assert_eq!(spec, built);
    }

    #[test]
    fn kind_names_are_exact() {
        assert_eq!(ChartKind::parse("Box Plot").unwrap(), ChartKind::Box);
        assert!(ChartKind::parse("box plot").is_err());
    }
}
