use crate::config::Config;
use crate::constants::{
    is_exported_metric, MEASURES_COMPONENT_PATH, METRICS_SEARCH_PATH, PROJECTS_SEARCH_PATH,
    SEARCH_PAGE_SIZE,
};
use crate::error::{ExporterError, Result};
use crate::types::{
    MeasuresResponse, MetricDefinition, MetricsSearchResponse, ProjectsSearchResponse, Reading,
};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

/// Authenticated client for the SonarQube web API.
///
/// Every public fetch degrades instead of failing: an unreachable or
/// misbehaving server yields empty lists and zero readings, never an error.
#[derive(Clone)]
pub struct SonarQubeClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl SonarQubeClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.server_url.clone(),
            token: config.token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Token as the basic-auth user with an empty password, the scheme the
    /// SonarQube web API accepts for user tokens.
    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .basic_auth(&self.token, Some(""))
    }

    /// Fetch the metric catalog, minus the structured metrics that cannot be
    /// expressed as a gauge.
    #[instrument(skip(self))]
    pub async fn fetch_metrics(&self) -> Vec<MetricDefinition> {
        let response = match self
            .get(METRICS_SEARCH_PATH)
            .query(&[("ps", SEARCH_PAGE_SIZE)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Failed to fetch metrics from SonarQube");
                return Vec::new();
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status != StatusCode::OK {
            warn!(
                status = status.as_u16(),
                body = %body,
                "Failed to fetch metrics from SonarQube"
            );
            return Vec::new();
        }

        match parse_metric_catalog(&body) {
            Ok(metrics) => {
                info!("Fetched {} exportable metrics from catalog", metrics.len());
                metrics
            }
            Err(e) => {
                warn!(error = %e, body = %body, "Failed to decode metric catalog JSON");
                Vec::new()
            }
        }
    }

    /// Current project keys. Called every cycle; never cached.
    #[instrument(skip(self))]
    pub async fn fetch_projects(&self) -> Vec<String> {
        match self.try_fetch_projects().await {
            Ok(keys) => {
                debug!("Fetched {} projects", keys.len());
                keys
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch projects from SonarQube");
                Vec::new()
            }
        }
    }

    async fn try_fetch_projects(&self) -> Result<Vec<String>> {
        let response = self
            .get(PROJECTS_SEARCH_PATH)
            .query(&[("ps", SEARCH_PAGE_SIZE)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            return Err(ExporterError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ProjectsSearchResponse = serde_json::from_str(&body)?;
        Ok(parsed
            .components
            .into_iter()
            .filter_map(|component| component.key)
            .collect())
    }

    /// Read one metric for one project. Failures are logged and reported as
    /// [`Reading::Degraded`], which publishes as `0.0`.
    pub async fn fetch_metric_value(&self, project_key: &str, metric_key: &str) -> Reading {
        match self.try_fetch_metric_value(project_key, metric_key).await {
            Ok(value) => Reading::Fresh(value),
            Err(e) => {
                warn!(
                    project_key,
                    metric_key,
                    error = %e,
                    "Invalid or missing metric value"
                );
                Reading::Degraded
            }
        }
    }

    async fn try_fetch_metric_value(&self, project_key: &str, metric_key: &str) -> Result<f64> {
        let response = self
            .get(MEASURES_COMPONENT_PATH)
            .query(&[("component", project_key), ("metricKeys", metric_key)])
            .send()
            .await?
            .error_for_status()?;

        let parsed: MeasuresResponse = serde_json::from_str(&response.text().await?)?;
        normalize_value(parsed.first_value())
    }
}

/// Parse a `metrics/search` body into the exportable catalog. Entries without
/// a key are skipped.
pub fn parse_metric_catalog(body: &str) -> Result<Vec<MetricDefinition>> {
    let parsed: MetricsSearchResponse = serde_json::from_str(body)?;

    Ok(parsed
        .metrics
        .into_iter()
        .filter_map(|raw| match raw.key {
            Some(key) => Some(MetricDefinition {
                key,
                description: raw.description,
            }),
            None => {
                debug!("Skipping catalog entry without a key");
                None
            }
        })
        .filter(|metric| is_exported_metric(&metric.key))
        .collect())
}

/// Map a measure value onto a gauge reading.
///
/// Absent values read as `0.0`, the status keywords as `0.0`/`1.0`, and
/// anything else must parse as a number.
pub fn normalize_value(value: Option<&Value>) -> Result<f64> {
    match value {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::String(s)) => match s.as_str() {
            "true" | "OK" => Ok(1.0),
            "false" | "ERROR" => Ok(0.0),
            other => parse_number(other.trim())
                .ok_or_else(|| ExporterError::InvalidValue(other.to_string())),
        },
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| ExporterError::InvalidValue(n.to_string())),
        Some(Value::Bool(b)) => Ok(if *b { 1.0 } else { 0.0 }),
        Some(other) => Err(ExporterError::InvalidValue(other.to_string())),
    }
}

/// Float parse that also accepts single `_` separators between digits (`1_000`).
fn parse_number(raw: &str) -> Option<f64> {
    if !raw.contains('_') {
        return raw.parse().ok();
    }

    let bytes = raw.as_bytes();
    let separators_ok = bytes.iter().enumerate().all(|(i, b)| {
        *b != b'_'
            || (i > 0
                && i + 1 < bytes.len()
                && bytes[i - 1].is_ascii_digit()
                && bytes[i + 1].is_ascii_digit())
    });
    if !separators_ok {
        return None;
    }

    raw.replace('_', "").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(value: Value) -> Result<f64> {
        normalize_value(Some(&value))
    }

    #[test]
    fn test_absent_value_is_zero() {
        assert_eq!(normalize_value(None).unwrap(), 0.0);
        assert_eq!(normalize(Value::Null).unwrap(), 0.0);
    }

    #[test]
    fn test_status_keywords() {
        assert_eq!(normalize(json!("false")).unwrap(), 0.0);
        assert_eq!(normalize(json!("ERROR")).unwrap(), 0.0);
        assert_eq!(normalize(json!("true")).unwrap(), 1.0);
        assert_eq!(normalize(json!("OK")).unwrap(), 1.0);
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        assert!(normalize(json!("True")).is_err());
        assert!(normalize(json!("WARN")).is_err());
    }

    #[test]
    fn test_numeric_strings() {
        assert_eq!(normalize(json!("42.5")).unwrap(), 42.5);
        assert_eq!(normalize(json!("7")).unwrap(), 7.0);
        assert_eq!(normalize(json!("-3")).unwrap(), -3.0);
        assert_eq!(normalize(json!("1e3")).unwrap(), 1000.0);
    }

    #[test]
    fn test_digit_separators() {
        assert_eq!(normalize(json!("1_000")).unwrap(), 1000.0);
        assert_eq!(normalize(json!("2_500.5")).unwrap(), 2500.5);
        assert!(normalize(json!("_1")).is_err());
        assert!(normalize(json!("1_")).is_err());
        assert!(normalize(json!("1__0")).is_err());
        assert!(normalize(json!("1_.5")).is_err());
    }

    #[test]
    fn test_bare_json_numbers() {
        assert_eq!(normalize(json!(12)).unwrap(), 12.0);
        assert_eq!(normalize(json!(0.25)).unwrap(), 0.25);
    }

    #[test]
    fn test_non_numeric_string_is_an_error() {
        let err = normalize(json!("A")).unwrap_err();
        assert!(matches!(err, ExporterError::InvalidValue(ref v) if v == "A"));
        assert!(normalize(json!("")).is_err());
    }

    #[test]
    fn test_catalog_drops_excluded_and_keyless_entries() {
        let body = json!({
            "metrics": [
                {"key": "bugs", "description": "Bugs"},
                {"key": "ncloc_language_distribution", "description": "x"},
                {"key": "quality_profiles", "description": "x"},
                {"key": "quality_gate_details", "description": "x"},
                {"description": "orphan"},
                {"key": "coverage"}
            ],
            "total": 6
        })
        .to_string();

        let catalog = parse_metric_catalog(&body).unwrap();
        assert_eq!(
            catalog,
            vec![
                MetricDefinition::new("bugs", Some("Bugs")),
                MetricDefinition::new("coverage", None),
            ]
        );
    }

    #[test]
    fn test_catalog_without_metrics_field_is_empty() {
        assert!(parse_metric_catalog("{}").unwrap().is_empty());
        assert!(parse_metric_catalog("not json").is_err());
    }
}
