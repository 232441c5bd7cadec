use crate::api;
use crate::config::Config;
use profile::snapshots::{self, StoreError};
use profile::{AggregatedProfile, ProfileAggregator, ProfileError, RiotId};
use riot_client::{ClientError, RiotClient};
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpListener;

#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not build API client: {0}")]
    Client(#[from] ClientError),
    #[error("could not open snapshot store: {0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    InvalidRiotId(#[from] ProfileError),
}

/// Wires the upstream client, its caches and the snapshot store into an
/// aggregator. Every call builds fresh caches.
pub fn build_aggregator(config: &Config) -> Result<ProfileAggregator, ServerError> {
    let client = RiotClient::new(&config.riot)?;
    let store = snapshots::open_store(&config.profile.snapshots)?;
    Ok(ProfileAggregator::new(Arc::new(client), store, &config.profile))
}

/// Serves the profile API and the admin probes until either listener fails.
pub async fn serve(config: Config) -> Result<(), ServerError> {
    let aggregator = Arc::new(build_aggregator(&config)?);

    let listener =
        TcpListener::bind(format!("{}:{}", config.listener.host, config.listener.port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "Serving profile API");

    let ready = Arc::new(AtomicBool::new(false));
    let probe = ready.clone();
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        AdminService::new(move || probe.load(Ordering::Relaxed)),
    );
    let api_task = async {
        ready.store(true, Ordering::Relaxed);
        axum::serve(listener, api::router(aggregator)).await
    };

    tokio::try_join!(api_task, admin_task)?;
    Ok(())
}

/// One-shot lookup of `Name#TAG`.
pub async fn lookup(config: &Config, riot_id: &str) -> Result<AggregatedProfile, ServerError> {
    let riot_id: RiotId = riot_id.parse()?;
    let aggregator = build_aggregator(config)?;
    Ok(aggregator
        .aggregate(&riot_id.game_name, &riot_id.tag_line)
        .await)
}
