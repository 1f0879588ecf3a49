use crate::apis::SonarQubeClient;
use crate::config::Config;
use crate::error::Result;
use crate::metrics::{build_recorder, ExporterMetrics, GaugeRegistry};
use crate::types::MetricDefinition;
use metrics_exporter_prometheus::{PrometheusHandle, PrometheusRecorder};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument};

/// Result of one poll cycle
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CycleResult {
    pub projects: usize,
    pub updated_series: usize,
    pub degraded_series: usize,
}

/// The polling half of the exporter: owns the catalog and the gauges built
/// from it, and refreshes every (project, metric) series once per cycle.
pub struct Pipeline {
    client: SonarQubeClient,
    catalog: Vec<MetricDefinition>,
    registry: GaugeRegistry,
    stats: ExporterMetrics,
    poll_interval: Duration,
}

impl Pipeline {
    /// Startup: fetch the catalog once and build the gauge registry from it.
    /// An unreachable server leaves the exporter running with zero gauges.
    pub async fn bootstrap(config: &Config) -> Result<Self> {
        let client = SonarQubeClient::new(config)?;
        info!(server = %client.base_url(), "Fetching metric catalog");
        let catalog = client.fetch_metrics().await;

        Ok(Self::new(client, catalog, build_recorder(), config.poll_interval))
    }

    pub fn new(
        client: SonarQubeClient,
        catalog: Vec<MetricDefinition>,
        recorder: Arc<PrometheusRecorder>,
        poll_interval: Duration,
    ) -> Self {
        let registry = GaugeRegistry::from_catalog(recorder.clone(), &catalog);
        let stats = ExporterMetrics::new(recorder);
        info!("Registered {} gauges", registry.len());

        Self {
            client,
            catalog,
            registry,
            stats,
            poll_interval,
        }
    }

    pub fn registry(&self) -> &GaugeRegistry {
        &self.registry
    }

    pub fn handle(&self) -> PrometheusHandle {
        self.registry.handle()
    }

    /// One pass over the current projects. Every (project, metric) pair is
    /// read sequentially; no failure ends the cycle early.
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> CycleResult {
        let started = Instant::now();
        let projects = self.client.fetch_projects().await;
        let mut result = CycleResult {
            projects: projects.len(),
            ..CycleResult::default()
        };

        for project_key in &projects {
            for metric in &self.catalog {
                let Some(gauge) = self.registry.get(&metric.key) else {
                    continue;
                };

                let reading = self.client.fetch_metric_value(project_key, &metric.key).await;
                gauge.set(project_key, reading.value());
                result.updated_series += 1;

                if reading.is_fresh() {
                    self.stats.record_success(
                        project_key,
                        &metric.key,
                        chrono::Utc::now().timestamp(),
                    );
                } else {
                    self.stats.record_degraded();
                    result.degraded_series += 1;
                }
            }
        }

        let elapsed = started.elapsed();
        self.stats.record_cycle(elapsed.as_secs_f64(), result.projects);
        info!(
            projects = result.projects,
            updated = result.updated_series,
            degraded = result.degraded_series,
            elapsed_ms = elapsed.as_millis() as u64,
            "Poll cycle finished"
        );

        result
    }

    /// Poll forever. Only process termination stops the loop.
    pub async fn run(&self) {
        loop {
            self.run_cycle().await;
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
