//! Bookkeeping metrics about the exporter itself.
//!
//! These make staleness observable: a zero on a republished gauge can be told
//! apart from a failed read by comparing against the last-success timestamp.

use super::{exporter_metric, MetricDoc, MetricType, METADATA};
use crate::constants::{METRIC_LABEL, PROJECT_LABEL};
use ::metrics::{Key, KeyName, Label, Recorder, Unit};
use metrics_exporter_prometheus::PrometheusRecorder;
use std::sync::Arc;

const POLL_CYCLES: &str = exporter_metric!(counter, "poll_cycles");
const POLL_CYCLE_DURATION: &str = exporter_metric!(histogram, "poll_cycle_duration_seconds");
const PROJECTS: &str = exporter_metric!(gauge, "projects");
const DEGRADED_READS: &str = exporter_metric!(counter, "degraded_reads");
const LAST_SUCCESS: &str = exporter_metric!(gauge, "last_success_timestamp_seconds");

pub struct ExporterMetrics {
    recorder: Arc<PrometheusRecorder>,
}

impl ExporterMetrics {
    pub fn new(recorder: Arc<PrometheusRecorder>) -> Self {
        let metrics = Self { recorder };
        metrics.register_metrics();
        metrics
    }

    fn register_metrics(&self) {
        for doc in Self::metrics_documentation() {
            let name = KeyName::from_const_str(doc.name);
            let unit = doc.name.ends_with("_seconds").then_some(Unit::Seconds);
            match doc.metric_type {
                MetricType::Counter => self.recorder.describe_counter(name, unit, doc.help.into()),
                MetricType::Histogram => {
                    self.recorder.describe_histogram(name, unit, doc.help.into())
                }
                MetricType::Gauge => self.recorder.describe_gauge(name, unit, doc.help.into()),
            }
        }

        // Cycle counter shows up as 0 before the first cycle completes
        let _ = self
            .recorder
            .register_counter(&Key::from_static_name(POLL_CYCLES), &METADATA);
    }

    /// Record a completed poll cycle
    pub fn record_cycle(&self, duration_secs: f64, projects: usize) {
        self.recorder
            .register_counter(&Key::from_static_name(POLL_CYCLES), &METADATA)
            .increment(1);
        self.recorder
            .register_histogram(&Key::from_static_name(POLL_CYCLE_DURATION), &METADATA)
            .record(duration_secs);
        self.recorder
            .register_gauge(&Key::from_static_name(PROJECTS), &METADATA)
            .set(projects as f64);
    }

    /// Record a read that failed and was published as zero
    pub fn record_degraded(&self) {
        self.recorder
            .register_counter(&Key::from_static_name(DEGRADED_READS), &METADATA)
            .increment(1);
    }

    /// Stamp the series as freshly read at `timestamp` (Unix seconds)
    pub fn record_success(&self, project_key: &str, metric_key: &str, timestamp: i64) {
        let key = Key::from_parts(
            LAST_SUCCESS,
            vec![
                Label::new(PROJECT_LABEL, project_key.to_string()),
                Label::new(METRIC_LABEL, metric_key.to_string()),
            ],
        );
        self.recorder
            .register_gauge(&key, &METADATA)
            .set(timestamp as f64);
    }

    pub fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: POLL_CYCLES,
                metric_type: MetricType::Counter,
                help: "Completed poll cycles",
                labels: vec![],
            },
            MetricDoc {
                name: POLL_CYCLE_DURATION,
                metric_type: MetricType::Histogram,
                help: "Wall time of one full poll cycle",
                labels: vec![],
            },
            MetricDoc {
                name: PROJECTS,
                metric_type: MetricType::Gauge,
                help: "Projects returned by the last project listing",
                labels: vec![],
            },
            MetricDoc {
                name: DEGRADED_READS,
                metric_type: MetricType::Counter,
                help: "Measure reads that failed and were published as zero",
                labels: vec![],
            },
            MetricDoc {
                name: LAST_SUCCESS,
                metric_type: MetricType::Gauge,
                help: "Unix time of the last successful read of a series",
                labels: vec![PROJECT_LABEL, METRIC_LABEL],
            },
        ]
    }
}
