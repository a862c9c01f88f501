//! Decoding of raw analysis-service payloads.
//!
//! Every function here is total: absent, empty, or malformed payloads degrade
//! to sentinel values instead of returning an error.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::{Issue, IssueType, MetricKey, Metrics, QualityGateStatus, Severity};

#[derive(Debug, Deserialize)]
struct MeasuresResponse {
    component: MeasuresComponent,
}

#[derive(Debug, Deserialize)]
struct MeasuresComponent {
    #[serde(default)]
    measures: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawMeasure {
    metric: String,
    #[serde(default)]
    value: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct IssuesResponse {
    issues: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QualityGateResponse {
    project_status: ProjectStatus,
}

#[derive(Debug, Deserialize)]
struct ProjectStatus {
    #[serde(default)]
    status: Option<String>,
}

/// Extract the recognized metrics from a `measures/component` payload.
pub fn parse_metrics(payload: Option<&str>) -> Metrics {
    let mut metrics = Metrics::unavailable();
    let Some(response) = decode::<MeasuresResponse>("metrics", payload) else {
        return metrics;
    };

    for raw in response.component.measures {
        let Ok(measure) = serde_json::from_value::<RawMeasure>(raw) else {
            continue;
        };
        let Some(key) = MetricKey::from_wire(&measure.metric) else {
            continue;
        };
        if let Some(value) = measure.value.as_ref().and_then(scalar_to_string) {
            metrics = metrics.with_value(key, value);
        }
    }

    metrics
}

/// Extract open issues from an `issues/search` payload.
///
/// Fields are read independently, so a malformed detail field never hides the
/// severity or type of its entry. Entries that are not objects are kept as
/// unclassified issues so the total still reflects the length of the `issues`
/// sequence.
pub fn parse_issues(payload: Option<&str>) -> Vec<Issue> {
    let Some(response) = decode::<IssuesResponse>("issues", payload) else {
        return Vec::new();
    };

    let mut unreadable = 0usize;
    let issues = response
        .issues
        .into_iter()
        .map(|raw| match raw {
            Value::Object(fields) => issue_from_fields(&fields),
            _ => {
                unreadable += 1;
                Issue::default()
            }
        })
        .collect();

    if unreadable > 0 {
        log::warn!("{unreadable} issue entries are not objects; counted as unclassified");
    }
    issues
}

/// Extract the quality gate status from a `qualitygates/project_status` payload.
pub fn parse_quality_gate(payload: Option<&str>) -> QualityGateStatus {
    decode::<QualityGateResponse>("quality gate", payload)
        .and_then(|response| response.project_status.status)
        .map(|status| QualityGateStatus::from_wire(&status))
        .unwrap_or(QualityGateStatus::Unknown)
}

fn decode<T: for<'de> Deserialize<'de>>(label: &str, payload: Option<&str>) -> Option<T> {
    let Some(payload) = payload else {
        log::warn!("{label} payload unavailable; using defaults");
        return None;
    };
    if payload.trim().is_empty() {
        log::warn!("{label} payload empty; using defaults");
        return None;
    }
    match serde_json::from_str(payload) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("{label} payload malformed ({err}); using defaults");
            None
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}

fn text_field<'a>(fields: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    fields.get(name).and_then(Value::as_str)
}

fn issue_from_fields(fields: &Map<String, Value>) -> Issue {
    let text = |name| text_field(fields, name);
    Issue {
        severity: text("severity").and_then(Severity::from_wire),
        issue_type: text("type").and_then(IssueType::from_wire),
        rule: text("rule").unwrap_or_default().to_string(),
        message: text("message").unwrap_or_default().to_string(),
        component: text("component").unwrap_or_default().to_string(),
        line: fields.get("line").and_then(Value::as_u64),
        is_new: fields.get("isNew").and_then(Value::as_bool).unwrap_or(false),
    }
}
