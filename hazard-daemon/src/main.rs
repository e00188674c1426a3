use hazard_core::{AppConfig, Notifier, Pipeline};
use reqwest::{redirect, ClientBuilder};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = AppConfig::load();
    if let Err(err) = config.validate() {
        error!(error = %err, "invalid configuration");
        std::process::exit(1);
    }

    let client = ClientBuilder::new()
        .redirect(redirect::Policy::limited(5))
        .user_agent("HazardWatch/0.1")
        .build()
        .expect("failed to build HTTP client");

    let notifier = Notifier::from_config(&config, client.clone());
    info!(
        channels = notifier.channel_count(),
        "notification channels configured"
    );

    let pipeline = Pipeline::new(config, client, notifier);
    let handle = pipeline.spawn();
    info!("hazard watcher started");

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
    }

    info!("shutdown requested, waiting for in-flight ticks");
    if let Err(err) = handle.stop().await {
        error!(error = %err, "pipeline task failed during shutdown");
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
