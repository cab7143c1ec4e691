use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::trace::{self, TraceLayer};
use tracing::{error, info, info_span, Instrument, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use alerting_cell::{ChannelRegistry, SmsClient};
use messaging_cell::{welcome_owners, CommandService};
use monitoring_cell::{
    ConnectivityCheck, HealthMonitor, HttpConnectivityCheck, ProbePipeline, ServiceRegistry,
    TickLoop,
};
use shared_config::LoadedConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".into());
    let root = info_span!("watchtower", host = %host);

    let result = run().instrument(root.clone()).await;
    if let Err(e) = &result {
        root.in_scope(|| error!(error = %format!("{e:#}"), "Watchtower stopped with a fatal error"));
    }
    result
}

async fn run() -> anyhow::Result<()> {
    info!("Starting Watchtower");

    let config = LoadedConfig::from_env().context("Failed to load configuration")?;
    let app_config = &config.app;

    let channels = ChannelRegistry::from_config(&app_config.alerters);
    let registry = Arc::new(ServiceRegistry::from_config(&config.services, &channels)?);

    let connectivity = Arc::new(HttpConnectivityCheck::from_config(app_config));
    if !connectivity.is_online().await {
        bail!("No internet connection via {}", app_config.connectivity_url);
    }

    let messenger = Arc::new(SmsClient::new(app_config.messaging.twilio.clone()));
    if app_config.messaging.welcome_owners {
        welcome_owners(&registry, messenger.as_ref()).await;
    }

    let monitor = Arc::new(HealthMonitor::new(ProbePipeline::new()?, connectivity));
    let ticks = TickLoop::new(
        registry.clone(),
        monitor,
        Duration::from_secs(app_config.test_interval),
    )
    .spawn();

    // Build the application router
    let app = router::create_router(
        registry.clone(),
        CommandService::new(registry, messenger),
        &app_config.messaging.callback_path,
    )
    .layer(
        TraceLayer::new_for_http()
            .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
            .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
    );

    let listener = TcpListener::bind(&app_config.messaging.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", app_config.messaging.listen_addr))?;
    info!(
        "Listening on {}, SMS replies at {}",
        listener.local_addr()?,
        app_config.messaging.callback_path
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    ticks.shutdown().await;
    info!("Watchtower stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
