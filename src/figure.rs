//! Rendering a [`ChartSpec`] against a table.
//!
//! A [`Figure`] holds fully computed traces (sorted bars, box statistics,
//! histogram bins, trendline fits) so it can be inspected in tests and
//! serialized without a plotting library. [`Figure::to_plotly`] turns it into
//! plotly-compatible JSON for the HTML dashboard.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::chart::{build_chart_spec, ChartKind, ChartOptions, ChartSpec, MAX_BINS};
use crate::config::palette;
use crate::data::{EquipmentRecord, FieldValue, Table};
use crate::logging::{log_chart_rejected, log_chart_rendered};
use crate::schema::{ColorBy, Field};
use crate::stats::{Bin, BinEdges, BoxStats, LinearFit};

pub const EMPTY_MESSAGE: &str = "No data available for selected filters";
pub const FIGURE_HEIGHT: u32 = 550;

/// A category label or a number, as plotted on an axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Datum {
    Number(f64),
    Text(String),
}

impl From<FieldValue<'_>> for Datum {
    fn from(v: FieldValue<'_>) -> Self {
        match v {
            FieldValue::Number(n) => Datum::Number(n),
            FieldValue::Text(s) => Datum::Text(s.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxGroup {
    pub category: String,
    pub stats: BoxStats,
}

/// One plotted series. `name` is the colour group, `None` when uncoloured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trace {
    Bar {
        name: Option<String>,
        color: String,
        x: Vec<Datum>,
        y: Vec<f64>,
    },
    Scatter {
        name: Option<String>,
        color: String,
        x: Vec<f64>,
        y: Vec<f64>,
        labels: Vec<String>,
    },
    Trendline {
        name: Option<String>,
        color: String,
        fit: LinearFit,
        x: [f64; 2],
        y: [f64; 2],
    },
    Box {
        name: Option<String>,
        color: String,
        groups: Vec<BoxGroup>,
    },
    Histogram {
        name: Option<String>,
        color: String,
        bins: Vec<Bin>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureMessage {
    pub text: String,
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub kind: Option<ChartKind>,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub traces: Vec<Trace>,
    pub message: Option<FigureMessage>,
}

impl Figure {
    /// An axis-less figure carrying a centred notice.
    pub fn message(text: impl Into<String>) -> Self {
        Self::annotated(text.into(), false)
    }

    /// Like [`Figure::message`], drawn in the error colour.
    pub fn error(text: impl Into<String>) -> Self {
        Self::annotated(text.into(), true)
    }

    fn annotated(text: String, is_error: bool) -> Self {
        Self {
            kind: None,
            title: String::new(),
            x_label: String::new(),
            y_label: String::new(),
            traces: Vec::new(),
            message: Some(FigureMessage { text, is_error }),
        }
    }

    pub fn is_error(&self) -> bool {
        self.message.as_ref().map(|m| m.is_error).unwrap_or(false)
    }

    /// Plotly figure JSON (`data` + `layout`) in the dashboard theme.
    pub fn to_plotly(&self) -> Value {
        let mut data = Vec::new();
        for trace in &self.traces {
            plotly_traces(trace, &mut data);
        }

        let axis = |title: &str| {
            json!({
                "title": {"text": title, "font": {"size": 14, "color": palette::TEXT}},
                "gridcolor": palette::BORDER,
                "showgrid": true,
                "tickfont": {"size": 12, "color": palette::TEXT},
            })
        };

        let mut layout = json!({
            "title": {
                "text": self.title,
                "font": {"size": 16, "color": palette::TEXT, "family": palette::FONT_FAMILY},
            },
            "paper_bgcolor": palette::PANEL,
            "plot_bgcolor": palette::BACKGROUND,
            "font": {"color": palette::TEXT, "size": 13, "family": palette::FONT_FAMILY},
            "margin": {"l": 70, "r": 40, "t": 60, "b": 70},
            "height": FIGURE_HEIGHT,
            "hoverlabel": {
                "bgcolor": palette::PANEL_LIGHT,
                "font": {"size": 13, "color": palette::TEXT, "family": palette::FONT_FAMILY},
            },
            "xaxis": axis(&self.x_label),
            "yaxis": axis(&self.y_label),
        });

        match self.kind {
            Some(ChartKind::Bar) | Some(ChartKind::Histogram) => {
                layout["barmode"] = json!("relative");
            }
            Some(ChartKind::Box) => {
                layout["boxmode"] = json!("group");
            }
            _ => {}
        }

        if let Some(msg) = &self.message {
            let (size, color) = if msg.is_error {
                (16, palette::ACCENT_RED)
            } else {
                (18, palette::TEXT)
            };
            layout["annotations"] = json!([{
                "text": msg.text,
                "xref": "paper",
                "yref": "paper",
                "x": 0.5,
                "y": 0.5,
                "showarrow": false,
                "font": {"size": size, "color": color, "family": palette::FONT_FAMILY},
            }]);
        }

        json!({"data": data, "layout": layout})
    }
}

fn plotly_traces(trace: &Trace, out: &mut Vec<Value>) {
    match trace {
        Trace::Bar { name, color, x, y } => out.push(json!({
            "type": "bar",
            "name": name,
            "showlegend": name.is_some(),
            "x": x,
            "y": y,
            "marker": {"color": color},
        })),
        Trace::Scatter {
            name,
            color,
            x,
            y,
            labels,
        } => out.push(json!({
            "type": "scatter",
            "mode": "markers",
            "name": name,
            "showlegend": name.is_some(),
            "x": x,
            "y": y,
            "text": labels,
            "marker": {"color": color, "size": 10},
        })),
        Trace::Trendline {
            name, color, x, y, ..
        } => out.push(json!({
            "type": "scatter",
            "mode": "lines",
            "name": name
                .as_deref()
                .map(|n| format!("{} (OLS)", n))
                .unwrap_or_else(|| "OLS".to_string()),
            "showlegend": false,
            "x": x,
            "y": y,
            "line": {"color": color, "dash": "dash"},
        })),
        Trace::Box {
            name,
            color,
            groups,
        } => {
            let pick = |f: fn(&BoxStats) -> f64| {
                groups.iter().map(|g| f(&g.stats)).collect::<Vec<_>>()
            };
            out.push(json!({
                "type": "box",
                "name": name,
                "showlegend": name.is_some(),
                "x": groups.iter().map(|g| g.category.as_str()).collect::<Vec<_>>(),
                "q1": pick(|s| s.q1),
                "median": pick(|s| s.median),
                "q3": pick(|s| s.q3),
                "lowerfence": pick(|s| s.lower_fence),
                "upperfence": pick(|s| s.upper_fence),
                "marker": {"color": color},
            }));
            let (ox, oy): (Vec<&str>, Vec<f64>) = groups
                .iter()
                .flat_map(|g| g.stats.outliers.iter().map(move |v| (g.category.as_str(), *v)))
                .unzip();
            if !ox.is_empty() {
                out.push(json!({
                    "type": "scatter",
                    "mode": "markers",
                    "showlegend": false,
                    "x": ox,
                    "y": oy,
                    "marker": {"color": color, "symbol": "circle-open"},
                }));
            }
        }
        Trace::Histogram { name, color, bins } => out.push(json!({
            "type": "bar",
            "name": name,
            "showlegend": name.is_some(),
            "x": bins.iter().map(|b| (b.start + b.end) / 2.0).collect::<Vec<_>>(),
            "y": bins.iter().map(|b| b.count).collect::<Vec<_>>(),
            "width": bins.iter().map(|b| b.end - b.start).collect::<Vec<_>>(),
            "marker": {"color": color, "line": {"color": palette::BACKGROUND, "width": 1}},
        })),
    }
}

// =============================================================================
// Colour groups
// =============================================================================

struct Group<'a> {
    name: Option<String>,
    color: &'static str,
    rows: Vec<&'a EquipmentRecord>,
}

fn group_color(record: &EquipmentRecord, color: ColorBy) -> &'static str {
    match color {
        ColorBy::None => palette::ACCENT_BLUE,
        ColorBy::Department => record.department.color(),
        ColorBy::Category => record.category.color(),
        ColorBy::Priority => record.priority.color(),
    }
}

/// Split rows by colour field, groups in first-appearance order.
fn colour_groups<'a, I>(rows: I, color: ColorBy) -> Vec<Group<'a>>
where
    I: IntoIterator<Item = &'a EquipmentRecord>,
{
    let mut groups: Vec<Group<'a>> = Vec::new();
    for row in rows {
        let name = color
            .field()
            .and_then(|f| row.value(f))
            .map(|v| v.label());
        match groups.iter_mut().find(|g| g.name == name) {
            Some(group) => group.rows.push(row),
            None => groups.push(Group {
                name,
                color: group_color(row, color),
                rows: vec![row],
            }),
        }
    }
    groups
}

// =============================================================================
// Rendering
// =============================================================================

/// Render `spec` over `table`. Rows lacking a plotted value are skipped.
pub fn render_chart(table: &Table, spec: &ChartSpec) -> Figure {
    if table.is_empty() {
        return Figure::message(EMPTY_MESSAGE);
    }

    let traces = match (spec.kind, spec.y) {
        (ChartKind::Bar, Some(y)) => bar_traces(table, spec.x, y, spec.color),
        (ChartKind::Scatter, Some(y)) => {
            scatter_traces(table, spec.x, y, spec.color, spec.trendline)
        }
        (ChartKind::Box, Some(y)) => box_traces(table, spec.x, y, spec.color),
        (ChartKind::Histogram, _) => {
            histogram_traces(table, spec.x, spec.bins.min(MAX_BINS), spec.color)
        }
        (_, None) => Vec::new(),
    };
    log_chart_rendered(spec, table.len(), traces.len());

    let y_label = match (spec.kind.uses_y(), &spec.y_label) {
        (true, Some(label)) => label.clone(),
        _ => "Count".to_string(),
    };

    Figure {
        kind: Some(spec.kind),
        title: spec.title.clone(),
        x_label: spec.x_label.clone(),
        y_label,
        traces,
        message: None,
    }
}

/// Validate the request and render it, or return an error figure.
pub fn render_request(
    table: &Table,
    kind: ChartKind,
    x: Field,
    y: Field,
    color: ColorBy,
    options: ChartOptions,
) -> Figure {
    match build_chart_spec(kind, x, y, color, options) {
        Ok(spec) => render_chart(table, &spec),
        Err(err) => {
            log_chart_rejected(&err);
            Figure::error(err.to_string())
        }
    }
}

fn bar_traces(table: &Table, x: Field, y: Field, color: ColorBy) -> Vec<Trace> {
    let mut rows: Vec<(&EquipmentRecord, FieldValue<'_>, f64)> = table
        .iter()
        .filter_map(|r| Some((r, r.value(x)?, r.number(y)?)))
        .collect();
    rows.sort_by(|a, b| b.2.total_cmp(&a.2));

    colour_groups(rows.iter().map(|(r, _, _)| *r), color)
        .into_iter()
        .map(|g| {
            let (xs, ys) = g
                .rows
                .iter()
                .filter_map(|r| Some((Datum::from(r.value(x)?), r.number(y)?)))
                .unzip();
            Trace::Bar {
                name: g.name,
                color: g.color.to_string(),
                x: xs,
                y: ys,
            }
        })
        .collect()
}

fn scatter_traces(
    table: &Table,
    x: Field,
    y: Field,
    color: ColorBy,
    trendline: bool,
) -> Vec<Trace> {
    let mut traces = Vec::new();
    for g in colour_groups(table, color) {
        let points: Vec<(f64, f64, String)> = g
            .rows
            .iter()
            .filter_map(|r| Some((r.number(x)?, r.number(y)?, r.upgrade_name.clone())))
            .collect();
        let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.1).collect();

        let fit = if trendline {
            LinearFit::ols(&xs, &ys).map(|fit| {
                let lo = xs.iter().copied().fold(f64::INFINITY, f64::min);
                let hi = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                Trace::Trendline {
                    name: g.name.clone(),
                    color: g.color.to_string(),
                    fit,
                    x: [lo, hi],
                    y: [fit.predict(lo), fit.predict(hi)],
                }
            })
        } else {
            None
        };

        traces.push(Trace::Scatter {
            name: g.name,
            color: g.color.to_string(),
            x: xs,
            y: ys,
            labels: points.into_iter().map(|p| p.2).collect(),
        });
        traces.extend(fit);
    }
    traces
}

fn box_traces(table: &Table, x: Field, y: Field, color: ColorBy) -> Vec<Trace> {
    colour_groups(table, color)
        .into_iter()
        .map(|g| {
            let mut categories: Vec<(String, Vec<f64>)> = Vec::new();
            for row in &g.rows {
                let (Some(cat), Some(v)) = (row.value(x), row.number(y)) else {
                    continue;
                };
                let cat = cat.label();
                match categories.iter_mut().find(|(c, _)| *c == cat) {
                    Some((_, values)) => values.push(v),
                    None => categories.push((cat, vec![v])),
                }
            }
            let groups = categories
                .into_iter()
                .filter_map(|(category, values)| {
                    BoxStats::from_values(&values).map(|stats| BoxGroup { category, stats })
                })
                .collect();
            Trace::Box {
                name: g.name,
                color: g.color.to_string(),
                groups,
            }
        })
        .collect()
}

fn histogram_traces(table: &Table, x: Field, bins: usize, color: ColorBy) -> Vec<Trace> {
    let all: Vec<f64> = table.iter().filter_map(|r| r.number(x)).collect();
    let Some(edges) = BinEdges::spanning(&all, bins) else {
        return Vec::new();
    };
    colour_groups(table, color)
        .into_iter()
        .map(|g| {
            let values: Vec<f64> = g.rows.iter().filter_map(|r| r.number(x)).collect();
            Trace::Histogram {
                name: g.name,
                color: g.color.to_string(),
                bins: edges.count(&values),
            }
        })
        .collect()
}
