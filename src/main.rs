use anyhow::Context;
use sonarqube_exporter::config::Config;
use sonarqube_exporter::logging;
use sonarqube_exporter::pipeline::Pipeline;
use sonarqube_exporter::server;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Keep the guard alive so the file writer flushes on exit
    let _log_guard = logging::init_logging();

    let config = Config::from_env().context("failed to load configuration")?;
    info!(?config, "Starting SonarQube exporter");

    let pipeline = Pipeline::bootstrap(&config)
        .await
        .context("failed to initialize exporter")?;

    server::start_server(pipeline.handle(), config.port)
        .with_context(|| format!("failed to bind metrics endpoint on port {}", config.port))?;

    pipeline.run().await;
    Ok(())
}
