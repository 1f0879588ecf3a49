use serde::Deserialize;
use serde_json::Value;

/// A catalog entry retained for export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDefinition {
    pub key: String,
    pub description: Option<String>,
}

impl MetricDefinition {
    pub fn new(key: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            key: key.into(),
            description: description.map(str::to_string),
        }
    }
}

/// Outcome of one (project, metric) read.
///
/// `Degraded` means the read failed and was already logged; it is published
/// as zero like a genuine zero, but does not refresh the last-success time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Fresh(f64),
    Degraded,
}

impl Reading {
    pub fn value(self) -> f64 {
        match self {
            Reading::Fresh(v) => v,
            Reading::Degraded => 0.0,
        }
    }

    pub fn is_fresh(self) -> bool {
        matches!(self, Reading::Fresh(_))
    }
}

// Upstream response shapes. Everything is optional so that partial bodies
// degrade instead of failing the whole parse.

#[derive(Debug, Deserialize)]
pub struct MetricsSearchResponse {
    #[serde(default)]
    pub metrics: Vec<RawMetric>,
}

#[derive(Debug, Deserialize)]
pub struct RawMetric {
    pub key: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectsSearchResponse {
    #[serde(default)]
    pub components: Vec<RawComponent>,
}

#[derive(Debug, Deserialize)]
pub struct RawComponent {
    pub key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MeasuresResponse {
    pub component: Option<MeasuredComponent>,
}

#[derive(Debug, Deserialize)]
pub struct MeasuredComponent {
    #[serde(default)]
    pub measures: Vec<Measure>,
}

#[derive(Debug, Deserialize)]
pub struct Measure {
    pub value: Option<Value>,
}

impl MeasuresResponse {
    /// `component.measures[0].value`, if any
    pub fn first_value(&self) -> Option<&Value> {
        self.component
            .as_ref()?
            .measures
            .first()?
            .value
            .as_ref()
    }
}
