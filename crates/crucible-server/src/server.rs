use crate::config::ServerConfig;
use crate::routes;
use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use crucible_core::catalog::AssetCatalog;
use crucible_core::dispatch::{HttpRunnerNotifier, NullRunnerNotifier, RunnerNotifier};
use crucible_core::runs::RunRequestGateway;
use crucible_core::storage::Store;
use crucible_core::upload::UploadStore;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    pub catalog: AssetCatalog,
    pub uploads: UploadStore,
    pub gateway: RunRequestGateway,
}

impl AppState {
    pub fn new(
        store: Store,
        data_root: impl Into<PathBuf>,
        notifier: Arc<dyn RunnerNotifier>,
    ) -> Self {
        Self {
            catalog: AssetCatalog::new(store.clone()),
            uploads: UploadStore::new(store.clone(), data_root),
            gateway: RunRequestGateway::new(store, notifier),
        }
    }
}

pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(routes::healthz))
        .route("/assets", get(routes::assets))
        .route("/test-file", post(routes::upload_test_file))
        .route(
            "/test-run",
            post(routes::create_test_run).get(routes::list_test_runs),
        )
        .route("/test-run/{id}", get(routes::get_test_run))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

pub async fn serve(cfg: ServerConfig) -> anyhow::Result<()> {
    let store = Store::open(&cfg.db_path)?;
    store.init_schema()?;
    std::fs::create_dir_all(&cfg.data_root)
        .with_context(|| format!("failed to create data root {}", cfg.data_root.display()))?;

    let notifier: Arc<dyn RunnerNotifier> = match &cfg.runner_url {
        Some(url) => Arc::new(HttpRunnerNotifier::new(url.clone())),
        None => {
            tracing::warn!("no runner endpoint configured; run requests will not be dispatched");
            Arc::new(NullRunnerNotifier)
        }
    };

    let state = AppState::new(store, &cfg.data_root, notifier);
    let app = build_router(state, cfg.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&cfg.bind)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind))?;
    tracing::info!(
        bind = %cfg.bind,
        db = %cfg.db_path.display(),
        data_root = %cfg.data_root.display(),
        "listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
