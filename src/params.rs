//! Filter and chart settings from `key=value` pairs (URL query strings).
//!
//! Keys: `department`, `category`, `priority` (repeatable or comma
//! separated), `max_budget`, `min_roi`, `preset`, `type`, `x`, `y`, `color`,
//! `trendline`, `bins`. Unknown keys are ignored. A preset sets the starting
//! filters; explicit keys override it.

use crate::chart::{build_chart_spec, ChartKind, ChartOptions, ChartSpec, MAX_BINS};
use crate::data::{Category, Department, Priority};
use crate::error::ValidationError;
use crate::filter::{FilterSet, Preset};
use crate::schema::{ColorBy, Field};

#[derive(Debug, Clone, PartialEq)]
pub struct ViewParams {
    pub filters: FilterSet,
    pub chart: ChartSpec,
}

fn parse_number(param: &str, value: &str) -> Result<f64, ValidationError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ValidationError::InvalidNumber {
            param: param.to_string(),
            value: value.to_string(),
        })
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn values<'a, K: AsRef<str>, V: AsRef<str>>(
    pairs: &'a [(K, V)],
    key: &'a str,
) -> impl Iterator<Item = &'a str> + 'a {
    pairs
        .iter()
        .filter(move |(k, _)| k.as_ref() == key)
        .map(|(_, v)| v.as_ref())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl ViewParams {
    /// `default_filters` applies when no preset is named; `default_bins` when
    /// `bins` is absent.
    pub fn from_pairs<I, K, V>(
        pairs: I,
        default_filters: FilterSet,
        default_bins: usize,
    ) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let pairs: Vec<(K, V)> = pairs.into_iter().collect();
        let pairs = pairs.as_slice();

        let mut filters = match values(pairs, "preset").last() {
            Some(name) => Preset::parse(name)?.filters(),
            None => default_filters,
        };

        let departments = values(pairs, "department")
            .flat_map(split_list)
            .map(Department::parse)
            .collect::<Result<Vec<_>, _>>()?;
        if !departments.is_empty() {
            filters = filters.with_departments(departments);
        }
        let categories = values(pairs, "category")
            .flat_map(split_list)
            .map(Category::parse)
            .collect::<Result<Vec<_>, _>>()?;
        if !categories.is_empty() {
            filters = filters.with_categories(categories);
        }
        let priorities = values(pairs, "priority")
            .flat_map(split_list)
            .map(Priority::parse)
            .collect::<Result<Vec<_>, _>>()?;
        if !priorities.is_empty() {
            filters = filters.with_priorities(priorities);
        }
        if let Some(v) = values(pairs, "max_budget").last() {
            filters = filters.with_max_budget(parse_number("max_budget", v)?);
        }
        if let Some(v) = values(pairs, "min_roi").last() {
            filters = filters.with_min_roi(parse_number("min_roi", v)?);
        }

        let defaults = ChartSpec::default();
        let kind = values(pairs, "type")
            .last()
            .map(ChartKind::parse)
            .transpose()?
            .unwrap_or(defaults.kind);
        let x = values(pairs, "x").last().map(Field::parse).transpose()?.unwrap_or(defaults.x);
        let y = values(pairs, "y")
            .last()
            .map(Field::parse)
            .transpose()?
            .or(defaults.y)
            .unwrap_or(Field::CostM);
        let color = values(pairs, "color")
            .last()
            .map(ColorBy::parse)
            .transpose()?
            .unwrap_or(defaults.color);
        let bins = match values(pairs, "bins").last() {
            Some(v) => {
                let n = parse_number("bins", v)?;
                if n < 0.0 || n.fract() != 0.0 {
                    return Err(ValidationError::InvalidNumber {
                        param: "bins".to_string(),
                        value: v.to_string(),
                    });
                }
                if n > MAX_BINS as f64 {
                    return Err(ValidationError::TooManyBins(n as usize));
                }
                n as usize
            }
            None => default_bins,
        };
        let options = ChartOptions::default()
            .with_trendline(values(pairs, "trendline").last().map(parse_flag).unwrap_or(false))
            .with_bins(bins);

        Ok(Self {
            filters,
            chart: build_chart_spec(kind, x, y, color, options)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::DEFAULT_BINS;

    fn parse(pairs: &[(&str, &str)]) -> Result<ViewParams, ValidationError> {
        ViewParams::from_pairs(pairs.iter().copied(), FilterSet::default(), DEFAULT_BINS)
    }

    #[test]
    fn empty_pairs_give_defaults() {
        let params = parse(&[]).unwrap();
        assert_eq!(params.filters, FilterSet::default());
        assert_eq!(params.chart, ChartSpec::default());
    }

    #[test]
    fn repeated_and_comma_lists() {
        let params = parse(&[
            ("department", "Navy"),
            ("department", "army,Marines"),
            ("priority", "Critical"),
        ])
        .unwrap();
        assert_eq!(params.filters.departments.len(), 3);
        assert_eq!(params.filters.priorities.len(), 1);
        assert_eq!(params.filters.categories.len(), 4);
    }

    #[test]
    fn preset_then_overrides() {
        let params = parse(&[("preset", "budget"), ("min_roi", "2.0")]).unwrap();
        assert_eq!(params.filters.max_budget, 200.0);
        assert_eq!(params.filters.min_roi, 2.0);
        assert_eq!(params.filters.priorities.len(), 2);
    }

    #[test]
    fn chart_params() {
        let params = parse(&[
            ("type", "Scatter Plot"),
            ("x", "cost_m"),
            ("y", "roi"),
            ("color", "priority"),
            ("trendline", "true"),
        ])
        .unwrap();
        assert_eq!(params.chart.kind, ChartKind::Scatter);
        assert!(params.chart.trendline);
        assert_eq!(params.chart.color, ColorBy::Priority);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(matches!(
            parse(&[("max_budget", "lots")]),
            Err(ValidationError::InvalidNumber { .. })
        ));
        assert!(parse(&[("department", "Coast Guard")]).is_err());
        assert!(parse(&[("bins", "2.5")]).is_err());
        assert!(parse(&[("type", "Scatter Plot"), ("x", "department")]).is_err());
        assert!(parse(&[("preset", "cheap")]).is_err());
    }

    #[test]
    fn oversized_bins_are_rejected_before_rendering() {
        let huge = [("type", "Histogram"), ("x", "roi"), ("bins", "100000000000000000000")];
        assert!(matches!(parse(&huge), Err(ValidationError::TooManyBins(_))));
        let billion = [("type", "Histogram"), ("x", "roi"), ("bins", "1000000000")];
        assert!(matches!(parse(&billion), Err(ValidationError::TooManyBins(_))));
        let params = parse(&[("type", "Histogram"), ("x", "roi"), ("bins", "200")]).unwrap();
        assert_eq!(params.chart.bins, MAX_BINS);
    }
}
