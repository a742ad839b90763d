use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use pool_advisor::artifacts::FsArtifactStore;
use pool_advisor::config::ServiceConfig;
use pool_advisor::dataset::HistoricalDataset;
use pool_advisor::predictor::Predictor;
use pool_advisor::server::{router, AppState};
use pool_advisor::store::ModelStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // ---------- Config ----------
    let cfg = ServiceConfig::load().context("failed to load service config")?;
    tracing::info!(?cfg, "starting pool advisor");

    // ---------- Model store ----------
    let dataset = HistoricalDataset::seeded(&cfg.seed(), cfg.label_rule);
    let store = ModelStore::new(
        dataset,
        Arc::new(FsArtifactStore::new(&cfg.model_dir)),
        cfg.forest_params(),
    );
    // Load or train before accepting traffic
    let pair = store.ensure_ready().context("failed to prepare model")?;
    tracing::info!(fit_id = pair.fit_id, trees = pair.forest.n_trees(), "model ready");

    // ---------- Server ----------
    let state = AppState {
        predictor: Arc::new(Predictor::new(Arc::new(store), cfg.context_defaults())),
    };
    let app = router(state);

    let addr = format!("{}:{}", cfg.bind_addr, cfg.port);
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
