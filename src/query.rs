//! Custom chart input: a JSON chart configuration or a plain-English request.
//!
//! JSON input is validated field by field and reported back as a list of
//! messages. Anything that is not JSON goes through keyword heuristics that
//! always produce some request.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

use crate::chart::{build_chart_spec, ChartKind, ChartOptions, ChartSpec};
use crate::error::ValidationError;
use crate::logging::log_query;
use crate::schema::{ColorBy, Field};

pub const INVALID_JSON_NOTICE: &str =
    "Invalid JSON format. Please check your syntax (commas, quotes, braces).";

/// A chart request as typed by the user, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRequest {
    pub chart_type: String,
    pub x_axis: String,
    pub y_axis: String,
    pub color_by: String,
    pub show_trendline: bool,
}

impl Default for ChartRequest {
    fn default() -> Self {
        Self {
            chart_type: ChartKind::Bar.as_str().to_string(),
            x_axis: Field::Department.as_str().to_string(),
            y_axis: Field::CostM.as_str().to_string(),
            color_by: ColorBy::None.as_str().to_string(),
            show_trendline: false,
        }
    }
}

impl ChartRequest {
    /// Read a JSON object, filling missing keys with defaults. Values of the
    /// wrong JSON type count as missing.
    pub fn from_json(value: &Value) -> Self {
        let defaults = Self::default();
        let text = |key: &str, fallback: String| {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or(fallback)
        };
        Self {
            chart_type: text("chart_type", defaults.chart_type),
            x_axis: text("x_axis", defaults.x_axis),
            y_axis: text("y_axis", defaults.y_axis),
            color_by: text("color_by", defaults.color_by),
            show_trendline: value
                .get("show_trendline")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.show_trendline),
        }
    }

    pub fn to_spec(&self, bins: usize) -> Result<ChartSpec, ValidationError> {
        let kind = ChartKind::parse(&self.chart_type)?;
        let x = Field::parse(&self.x_axis)?;
        let y = Field::parse(&self.y_axis)?;
        let color = ColorBy::parse(&self.color_by)?;
        let options = ChartOptions::default()
            .with_trendline(self.show_trendline)
            .with_bins(bins);
        build_chart_spec(kind, x, y, color, options)
    }

    /// `"<chart type>: <X display> vs <Y display>"`, unknown fields shown raw.
    pub fn status_line(&self) -> String {
        let display = |name: &str| {
            Field::parse(name)
                .map(|f| f.display_name().to_string())
                .unwrap_or_else(|_| name.to_string())
        };
        format!(
            "{}: {} vs {}",
            self.chart_type,
            display(&self.x_axis),
            display(&self.y_axis)
        )
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

/// Check a parsed JSON configuration. Returns every problem found; empty
/// means valid. A missing `chart_type` is invalid, the other keys are
/// optional.
pub fn validate_chart_config(config: &Value) -> Vec<String> {
    let Some(obj) = config.as_object() else {
        return vec!["Chart configuration must be a JSON object".to_string()];
    };
    let mut errors = Vec::new();

    let chart_ok = obj
        .get("chart_type")
        .and_then(Value::as_str)
        .map(|t| ChartKind::parse(t).is_ok())
        .unwrap_or(false);
    if !chart_ok {
        errors.push(format!(
            "Invalid chart type. Must be one of: {}",
            join_names(ChartKind::ALL.iter().map(|k| k.as_str()))
        ));
    }

    for key in ["x_axis", "y_axis"] {
        if let Some(v) = obj.get(key).filter(|v| is_truthy(v)) {
            let known = v.as_str().map(|s| Field::parse(s).is_ok()).unwrap_or(false);
            if !known {
                errors.push(format!("Invalid {} field: {}", key, raw(v)));
            }
        }
    }

    if let Some(v) = obj.get("color_by").filter(|v| is_truthy(v)) {
        let known = v.as_str().map(|s| ColorBy::parse(s).is_ok()).unwrap_or(false);
        if !known {
            errors.push(format!(
                "Invalid color_by. Must be one of: {}",
                join_names(ColorBy::ALL.iter().map(|c| c.as_str()))
            ));
        }
    }

    errors
}

// Empty strings, null and false are treated as absent.
fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn raw(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn pair_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:of|plot)\s+(\w+(?:\s+\w+)?)\s+(?:and|vs)\s+(\w+(?:\s+\w+)?)").ok()
    })
    .as_ref()
}

/// Turn a plain-English request into a chart request. Never fails; anything
/// unrecognised keeps its default.
pub fn parse_free_text(text: &str) -> ChartRequest {
    let text = text.trim().to_lowercase();
    let has = |needle: &str| text.contains(needle);
    let mut req = ChartRequest::default();

    let kind = if has("scatter") {
        ChartKind::Scatter
    } else if has("box") {
        ChartKind::Box
    } else if has("histogram") || has("distribution") {
        ChartKind::Histogram
    } else {
        ChartKind::Bar
    };
    req.chart_type = kind.as_str().to_string();

    if has("trendline") || has("trend") {
        req.show_trendline = true;
    }

    if let Some(pos) = text.find("cost").filter(|_| !has("ownership")) {
        let before = text[..pos].chars().count() as f64;
        let half = text.chars().count() as f64 / 2.0;
        if has("x") || before < half {
            req.x_axis = Field::CostM.as_str().to_string();
        } else {
            req.y_axis = Field::CostM.as_str().to_string();
        }
    }

    if has("roi") || has("return") {
        if has("vs") || has("against") {
            req.y_axis = Field::Roi.as_str().to_string();
        } else {
            req.x_axis = Field::Roi.as_str().to_string();
        }
    }

    if has("value") {
        req.y_axis = Field::ValueScore.as_str().to_string();
    }
    if has("age") {
        req.x_axis = Field::AgeYears.as_str().to_string();
    }
    if has("maintenance") {
        req.y_axis = Field::MaintenancePct.as_str().to_string();
    }

    let colour = [ColorBy::Department, ColorBy::Category, ColorBy::Priority]
        .into_iter()
        .find(|c| {
            let name = c.as_str();
            has(&format!("colored by {name}"))
                || has(&format!("color {name}"))
                || has(&format!("by {name}"))
        });
    if let Some(c) = colour {
        req.color_by = c.as_str().to_string();
    }

    if let Some(caps) = pair_pattern().and_then(|re| re.captures(&text)) {
        let first = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        let second = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
        if first.contains("value") {
            req.x_axis = Field::ValueScore.as_str().to_string();
        }
        if second.contains("age") {
            req.y_axis = Field::AgeYears.as_str().to_string();
        }
    }

    req
}

/// What the custom chart box should do with its current input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum QueryOutcome {
    /// Blank input; nothing to do.
    Empty,
    /// Valid JSON configuration.
    Config { request: ChartRequest, status: String },
    /// JSON that failed validation.
    Invalid { errors: Vec<String> },
    /// Not JSON; interpreted as plain English.
    FreeText { request: ChartRequest, notice: String },
}

impl QueryOutcome {
    /// The request to chart, if the input produced one.
    pub fn request(&self) -> Option<&ChartRequest> {
        match self {
            QueryOutcome::Config { request, .. } | QueryOutcome::FreeText { request, .. } => {
                Some(request)
            }
            QueryOutcome::Empty | QueryOutcome::Invalid { .. } => None,
        }
    }
}

pub fn interpret_query(input: &str) -> QueryOutcome {
    if input.trim().is_empty() {
        return QueryOutcome::Empty;
    }
    let outcome = match serde_json::from_str::<Value>(input) {
        Ok(config) => {
            let errors = validate_chart_config(&config);
            if errors.is_empty() {
                let request = ChartRequest::from_json(&config);
                let status = request.status_line();
                QueryOutcome::Config { request, status }
            } else {
                QueryOutcome::Invalid { errors }
            }
        }
        Err(_) => QueryOutcome::FreeText {
            request: parse_free_text(input),
            notice: INVALID_JSON_NOTICE.to_string(),
        },
    };
    match &outcome {
        QueryOutcome::Config { status, .. } => log_query("config", status),
        QueryOutcome::Invalid { errors } => log_query("invalid", &errors.join("; ")),
        QueryOutcome::FreeText { request, .. } => log_query("free_text", &request.status_line()),
        QueryOutcome::Empty => {}
    }
    outcome
}
