use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use transfer_server::config::AppConfig;
use transfer_server::feasibility::FeasibilityEvaluator;
use transfer_server::graph::GraphCache;
use transfer_server::planner::JourneyAssembler;
use transfer_server::pool::BlockingPool;
use transfer_server::schedule::TransitousClient;
use transfer_server::snapshot::{JsonSnapshotStore, SnapshotProvider};
use transfer_server::stations::StationDirectory;
use transfer_server::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("transfer_server=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    let store = Arc::new(
        JsonSnapshotStore::open(&config.snapshot_path)
            .await
            .expect("Failed to load snapshot"),
    );
    let stations =
        StationDirectory::open(&config.stations_path).expect("Failed to load station list");
    info!(stations = stations.len().await, "loaded station directory");

    let client = Arc::new(
        TransitousClient::new(config.transitous.clone()).expect("Failed to create schedule client"),
    );

    let pool = BlockingPool::new(config.workers);
    let provider: Arc<dyn SnapshotProvider> = store.clone();
    let graphs = Arc::new(GraphCache::new(
        provider,
        config.graph.clone(),
        &config.graph_cache,
        pool.clone(),
    ));
    let evaluator = FeasibilityEvaluator::new(config.policy.clone());

    // Re-read the snapshot and station list; a failed reload keeps the old data
    let refresh_store = store.clone();
    let refresh_graphs = graphs.clone();
    let refresh_stations = stations.clone();
    let refresh_interval = config.refresh_interval;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(refresh_interval);
        interval.tick().await; // First tick is immediate, skip it
        loop {
            interval.tick().await;
            match refresh_store.reload().await {
                Ok(true) => {
                    refresh_graphs.observe_version(refresh_store.version());
                }
                Ok(false) => {}
                Err(e) => warn!(error = %e, "failed to reload snapshot"),
            }
            match refresh_stations.reload().await {
                Ok(count) => info!(stations = count, "refreshed station directory"),
                Err(e) => warn!(error = %e, "failed to reload station directory"),
            }
        }
    });

    let assembler = JourneyAssembler::new(
        stations,
        client.clone(),
        client,
        graphs,
        pool,
        evaluator,
        config.assembler.clone(),
    );
    let app = create_router(AppState::new(assembler));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .expect("Failed to bind");
    info!(addr = %config.bind, "transfer server listening");
    axum::serve(listener, app).await.expect("Server error");
}
