//! Gauge storage and rendering.
//!
//! Both the republished SonarQube gauges and the exporter's own bookkeeping
//! metrics are registered against one explicit [`PrometheusRecorder`] rather
//! than the process-global recorder, so the poll loop, the HTTP endpoint and
//! the tests each hold a handle to exactly the state they share.

pub mod exporter;
pub mod registry;

pub use exporter::ExporterMetrics;
pub use registry::{GaugeHandle, GaugeRegistry};

use ::metrics::{Level, Metadata};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusRecorder};
use std::sync::Arc;

/// Metadata attached to every registration; the Prometheus recorder ignores it.
pub(crate) const METADATA: Metadata<'static> =
    Metadata::new(module_path!(), Level::INFO, Some(module_path!()));

/// A fresh recorder with no listener of its own; rendering is served by
/// [`crate::server`].
pub fn build_recorder() -> Arc<PrometheusRecorder> {
    Arc::new(PrometheusBuilder::new().build_recorder())
}

/// Documentation for a single exporter metric
#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: &'static str,
    pub labels: Vec<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
    Gauge,
}

/// Names the exporter's own metrics so they cannot collide with upstream keys:
/// sonarqube_exporter_{metric_name}[_total]
macro_rules! exporter_metric {
    (counter, $name:literal) => {
        concat!("sonarqube_exporter_", $name, "_total")
    };
    (histogram, $name:literal) => {
        concat!("sonarqube_exporter_", $name)
    };
    (gauge, $name:literal) => {
        concat!("sonarqube_exporter_", $name)
    };
}

pub(crate) use exporter_metric;
