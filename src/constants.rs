/// Upstream endpoints, relative to the configured server URL
pub const METRICS_SEARCH_PATH: &str = "/api/metrics/search";
pub const PROJECTS_SEARCH_PATH: &str = "/api/projects/search";
pub const MEASURES_COMPONENT_PATH: &str = "/api/measures/component";

/// Largest page size the search endpoints accept; the default of 100 truncates
/// the stock metric catalog.
pub const SEARCH_PAGE_SIZE: &str = "500";

/// Catalog entries that are structured documents rather than numbers
pub const EXCLUDED_METRICS: [&str; 3] = [
    "ncloc_language_distribution",
    "quality_profiles",
    "quality_gate_details",
];

pub const PROJECT_LABEL: &str = "project_key";
pub const METRIC_LABEL: &str = "metric_key";
pub const NO_DESCRIPTION: &str = "No description";

// Configuration variables and their defaults
pub const SERVER_ENV: &str = "SONARQUBE_SERVER";
pub const TOKEN_ENV: &str = "SONARQUBE_TOKEN";
pub const PORT_ENV: &str = "EXPORTER_PORT";
pub const POLL_INTERVAL_ENV: &str = "EXPORTER_POLL_INTERVAL_SECONDS";
pub const REQUEST_TIMEOUT_ENV: &str = "SONARQUBE_REQUEST_TIMEOUT_SECONDS";

pub const DEFAULT_PORT: u16 = 8198;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 600;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Whether a catalog key is published as a gauge
pub fn is_exported_metric(key: &str) -> bool {
    !EXCLUDED_METRICS.contains(&key)
}
