//! Chart normalizer: validate a raw chart payload and convert it to the canonical
//! [`ChartSpec`] consumed by the charting collaborator.
//!
//! Validation short-circuits in this order: envelope check, heuristic syntax check, JSON
//! parse, required fields, schema migration, sanitization and defaults.

mod schema;
mod syntax;

pub use schema::SchemaVersion;
pub use syntax::SyntaxIssue;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reason string used by [`ChartError::SchemaError`] for absent required fields.
pub const MISSING_FIELD: &str = "missing required field";

/// Canonical, version-normalized chart description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub chart_type: String,
    pub data: ChartData,
    pub options: NormalizedOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    #[serde(rename = "data")]
    pub values: Vec<f64>,
    /// Colors, border widths and any other per-dataset attributes.
    #[serde(flatten)]
    pub style: Map<String, Value>,
}

/// Options in current-schema form: axes keyed by name, title/legend under `plugins`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedOptions {
    pub responsive: bool,
    pub maintain_aspect_ratio: bool,
    pub scales: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub plugins: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Why a chart payload was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChartError {
    #[error("chart payload must be a JSON object enclosed in {{ and }}")]
    MalformedEnvelope,
    #[error("chart payload has syntax issues: {}", join_issues(.0))]
    SyntaxIssue(Vec<SyntaxIssue>),
    #[error("chart payload is not valid JSON: {0}")]
    ParseError(String),
    #[error("chart field `{field}`: {reason}")]
    SchemaError { field: String, reason: String },
}

fn join_issues(issues: &[SyntaxIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ChartError {
    /// Stable kind name shown in error fragments.
    pub fn kind(&self) -> &'static str {
        match self {
            ChartError::MalformedEnvelope => "MalformedEnvelope",
            ChartError::SyntaxIssue(_) => "SyntaxIssue",
            ChartError::ParseError(_) => "ParseError",
            ChartError::SchemaError { .. } => "SchemaError",
        }
    }

    /// Short, user-facing summary.
    pub fn summary(&self) -> &'static str {
        match self {
            ChartError::MalformedEnvelope => "Chart data is not a JSON object",
            ChartError::SyntaxIssue(_) => "Chart data contains syntax errors",
            ChartError::ParseError(_) => "Chart data could not be parsed",
            ChartError::SchemaError { .. } => "Chart data does not describe a chart",
        }
    }

    /// Itemized details for the debug view.
    pub fn details(&self) -> Vec<String> {
        match self {
            ChartError::MalformedEnvelope => {
                vec!["payload must start with '{' and end with '}'".to_string()]
            }
            ChartError::SyntaxIssue(issues) => issues.iter().map(|i| i.to_string()).collect(),
            ChartError::ParseError(msg) => vec![msg.clone()],
            ChartError::SchemaError { field, reason } => vec![format!("{}: {}", field, reason)],
        }
    }

    fn schema(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ChartError::SchemaError {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Render-ready description of a rejected chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartFailure {
    pub kind: &'static str,
    pub message: String,
    pub issues: Vec<String>,
    /// Start of the offending payload, at most `preview_len` characters plus an ellipsis.
    pub preview: String,
}

impl ChartFailure {
    pub fn new(err: &ChartError, raw: &str, preview_len: usize) -> Self {
        Self {
            kind: err.kind(),
            message: err.summary().to_string(),
            issues: err.details(),
            preview: preview(raw, preview_len),
        }
    }

    /// Failure for a block that wraps or overlaps another delimited block.
    pub fn nested(raw: &str, preview_len: usize) -> Self {
        Self {
            kind: "NestedSegment",
            message: "Nested chart and annotation blocks are not supported".to_string(),
            issues: vec!["a <chartjs> block and a <special> block overlap".to_string()],
            preview: preview(raw, preview_len),
        }
    }
}

fn preview(raw: &str, max_chars: usize) -> String {
    let trimmed = raw.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(max_chars).collect();
    out.push('…');
    out
}

/// Run the full validation pipeline on a raw payload.
pub fn normalize_payload(raw: &str) -> Result<ChartSpec, ChartError> {
    let trimmed = raw.trim();
    if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
        return Err(ChartError::MalformedEnvelope);
    }
    let issues = syntax::check(trimmed);
    if !issues.is_empty() {
        return Err(ChartError::SyntaxIssue(issues));
    }
    let value: Value =
        serde_json::from_str(trimmed).map_err(|e| ChartError::ParseError(e.to_string()))?;
    normalize_value(value)
}

/// Validate and normalize an already-parsed chart object.
pub fn normalize_value(value: Value) -> Result<ChartSpec, ChartError> {
    let Value::Object(mut spec) = value else {
        return Err(ChartError::MalformedEnvelope);
    };
    for field in ["type", "data"] {
        if !spec.contains_key(field) {
            return Err(ChartError::schema(field, MISSING_FIELD));
        }
    }

    schema::migrate(&mut spec);
    let mut value = Value::Object(spec);
    schema::sanitize(&mut value);
    let Value::Object(mut spec) = value else {
        return Err(ChartError::MalformedEnvelope);
    };
    schema::apply_defaults(&mut spec);

    build_spec(spec)
}

fn take_object(
    map: &mut Map<String, Value>,
    key: &str,
    field: &str,
) -> Result<Map<String, Value>, ChartError> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(obj)) => Ok(obj),
        Some(_) => Err(ChartError::schema(field, "must be an object")),
    }
}

fn take_array(
    map: &mut Map<String, Value>,
    key: &str,
    field: &str,
) -> Result<Vec<Value>, ChartError> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(ChartError::schema(field, "must be an array")),
    }
}

fn build_spec(mut spec: Map<String, Value>) -> Result<ChartSpec, ChartError> {
    let chart_type = match spec.remove("type") {
        Some(Value::String(t)) if !t.trim().is_empty() => t.trim().to_string(),
        _ => return Err(ChartError::schema("type", "must be a non-empty string")),
    };
    let data = match spec.remove("data") {
        Some(Value::Object(obj)) => obj,
        _ => return Err(ChartError::schema("data", "must be an object")),
    };
    let data = build_data(data)?;
    let options = build_options(take_object(&mut spec, "options", "options")?);
    if !spec.is_empty() {
        log::debug!(
            "Ignoring unknown chart keys: {}",
            spec.keys().cloned().collect::<Vec<_>>().join(", ")
        );
    }
    Ok(ChartSpec {
        chart_type,
        data,
        options,
    })
}

fn build_data(mut data: Map<String, Value>) -> Result<ChartData, ChartError> {
    let labels = take_array(&mut data, "labels", "data.labels")?
        .into_iter()
        .enumerate()
        .map(|(i, label)| label_text(&label, &format!("data.labels[{}]", i)))
        .collect::<Result<Vec<_>, _>>()?;
    let datasets = take_array(&mut data, "datasets", "data.datasets")?
        .into_iter()
        .enumerate()
        .map(|(i, ds)| build_dataset(i, ds))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ChartData { labels, datasets })
}

fn label_text(value: &Value, field: &str) -> Result<String, ChartError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        // Multi-line labels are arrays of lines.
        Value::Array(parts) => parts
            .iter()
            .map(|p| label_text(p, field))
            .collect::<Result<Vec<_>, _>>()
            .map(|lines| lines.join(" ")),
        Value::Null | Value::Object(_) => {
            Err(ChartError::schema(field, "must be a string or number"))
        }
    }
}

fn build_dataset(index: usize, value: Value) -> Result<Dataset, ChartError> {
    let Value::Object(mut style) = value else {
        return Err(ChartError::schema(
            format!("data.datasets[{}]", index),
            "must be an object",
        ));
    };
    let label = match style.remove("label") {
        None | Some(Value::Null) => String::new(),
        Some(v) => label_text(&v, &format!("data.datasets[{}].label", index))?,
    };
    let field = format!("data.datasets[{}].data", index);
    let values = take_array(&mut style, "data", &field)?
        .iter()
        .map(|v| data_point(v, &field))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Dataset {
        label,
        values,
        style,
    })
}

fn data_point(value: &Value, field: &str) -> Result<f64, ChartError> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
        .ok_or_else(|| ChartError::schema(field, format!("non-numeric value {}", value)))
}

fn build_options(mut opts: Map<String, Value>) -> NormalizedOptions {
    let scales = match opts.remove("scales") {
        Some(Value::Object(obj)) => obj,
        _ => Map::new(),
    };
    let plugins = match opts.remove("plugins") {
        Some(Value::Object(obj)) => obj,
        _ => Map::new(),
    };
    let responsive = opts.remove("responsive") != Some(Value::Bool(false));
    let maintain_aspect_ratio = opts.remove("maintainAspectRatio") != Some(Value::Bool(false));
    NormalizedOptions {
        responsive,
        maintain_aspect_ratio,
        scales,
        plugins,
        extra: opts,
    }
}

impl ChartSpec {
    /// JSON form handed to the charting library.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
