use super::METADATA;
use crate::constants::{NO_DESCRIPTION, PROJECT_LABEL};
use crate::types::MetricDefinition;
use ::metrics::{Key, KeyName, Label, Recorder};
use metrics_exporter_prometheus::{PrometheusHandle, PrometheusRecorder};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// One republished SonarQube metric, labeled by project key.
pub struct GaugeHandle {
    name: String,
    help: String,
    recorder: Arc<PrometheusRecorder>,
}

impl GaugeHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    /// Overwrite the value for one project. The recorder resolves repeated
    /// registrations of the same key to the same series.
    pub fn set(&self, project_key: &str, value: f64) {
        let key = Key::from_parts(
            self.name.clone(),
            vec![Label::new(PROJECT_LABEL, project_key.to_string())],
        );
        self.recorder.register_gauge(&key, &METADATA).set(value);
    }
}

/// Metric key to gauge, fixed once built from the catalog.
pub struct GaugeRegistry {
    recorder: Arc<PrometheusRecorder>,
    gauges: HashMap<String, GaugeHandle>,
}

impl GaugeRegistry {
    /// Describe one gauge per catalog entry. A key that appears twice keeps
    /// the later description.
    pub fn from_catalog(recorder: Arc<PrometheusRecorder>, catalog: &[MetricDefinition]) -> Self {
        let mut gauges = HashMap::with_capacity(catalog.len());

        for metric in catalog {
            let help = metric
                .description
                .clone()
                .unwrap_or_else(|| NO_DESCRIPTION.to_string());

            recorder.describe_gauge(KeyName::from(metric.key.clone()), None, help.clone().into());

            let handle = GaugeHandle {
                name: metric.key.clone(),
                help: help.clone(),
                recorder: recorder.clone(),
            };
            if gauges.insert(metric.key.clone(), handle).is_some() {
                warn!(metric = %metric.key, "Duplicate metric key in catalog; keeping the later entry");
            }

            info!(metric = %metric.key, description = %help, "Processed metric");
        }

        Self { recorder, gauges }
    }

    pub fn get(&self, metric_key: &str) -> Option<&GaugeHandle> {
        self.gauges.get(metric_key)
    }

    pub fn len(&self) -> usize {
        self.gauges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gauges.is_empty()
    }

    /// Cloneable view used by the HTTP endpoint
    pub fn handle(&self) -> PrometheusHandle {
        self.recorder.handle()
    }

    pub fn render(&self) -> String {
        self.recorder.handle().render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::build_recorder;

    fn catalog() -> Vec<MetricDefinition> {
        vec![
            MetricDefinition::new("bugs", Some("Bug count")),
            MetricDefinition::new("coverage", None),
        ]
    }

    #[test]
    fn test_one_gauge_per_metric() {
        let registry = GaugeRegistry::from_catalog(build_recorder(), &catalog());

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("bugs").unwrap().help(), "Bug count");
        assert_eq!(registry.get("coverage").unwrap().help(), NO_DESCRIPTION);
        assert!(registry.get("ncloc").is_none());
    }

    #[test]
    fn test_duplicate_keys_keep_last_description() {
        let catalog = vec![
            MetricDefinition::new("bugs", Some("first")),
            MetricDefinition::new("bugs", Some("second")),
        ];
        let registry = GaugeRegistry::from_catalog(build_recorder(), &catalog);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("bugs").unwrap().help(), "second");
    }

    #[test]
    fn test_set_is_rendered_per_project() {
        let registry = GaugeRegistry::from_catalog(build_recorder(), &catalog());
        let bugs = registry.get("bugs").unwrap();

        bugs.set("proj-a", 7.0);
        bugs.set("proj-b", 2.0);
        bugs.set("proj-a", 3.0);

        let rendered = registry.render();
        assert!(rendered.contains("# HELP bugs Bug count"));
        assert!(rendered.contains("# TYPE bugs gauge"));
        assert!(rendered.contains("bugs{project_key=\"proj-a\"} 3"));
        assert!(rendered.contains("bugs{project_key=\"proj-b\"} 2"));
        assert!(!rendered.contains("bugs{project_key=\"proj-a\"} 7"));
    }

    #[test]
    fn test_registries_do_not_share_state() {
        let first = GaugeRegistry::from_catalog(build_recorder(), &catalog());
        let second = GaugeRegistry::from_catalog(build_recorder(), &catalog());

        first.get("bugs").unwrap().set("proj-a", 1.0);

        assert!(first.render().contains("proj-a"));
        assert!(!second.render().contains("proj-a"));
    }
}
