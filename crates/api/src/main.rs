use anyhow::Context;

use stockbridge_infra::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockbridge_observability::init();

    let config = AppConfig::from_env().context("reading configuration")?;
    let services = stockbridge_api::app::services::build_services(&config).await?;

    match services.start_scheduler_from_settings().await {
        Ok(status) => tracing::info!(armed = status.armed, "scheduler initialised"),
        Err(e) => tracing::warn!(error = %e, "could not read settings; scheduler left disarmed"),
    }

    let app = stockbridge_api::app::build_app(services.clone());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    services.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
    tracing::info!("shutting down");
}
