use std::net::SocketAddr;

use axum::{
    routing::{get, post},
    Router,
};
use url::Url;

use crate::storage::Storage;
use crate::uploads::UploadStore;

mod handlers;
mod models;

use handlers::{create_point, get_point, health, list_items, list_points, not_found};

#[derive(Clone)]
pub struct AppState<S: Storage> {
    pub storage: S,
    pub started_at: std::time::SystemTime,
    pub public_url: Url,
    pub uploads: UploadStore,
}

pub fn router<S: Storage + Clone + Send + Sync + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health::<S>))
        .route("/items", get(list_items::<S>))
        .route("/points", get(list_points::<S>).post(create_point::<S>))
        .route("/points/:id", get(get_point::<S>))
        .fallback(not_found)
        .with_state(state)
}

pub async fn serve<S: Storage + Clone + Send + Sync + 'static>(
    addr: SocketAddr,
    storage: S,
    public_url: Url,
    uploads: UploadStore,
    shutdown: tokio_util::sync::CancellationToken,
) -> anyhow::Result<()> {
    log::info!("🌐 REST service on http://{}", addr);

    let state = AppState {
        storage,
        started_at: std::time::SystemTime::now(),
        public_url,
        uploads,
    };

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            log::info!("🛑 REST shutdown requested");
        })
        .await?;
    log::info!("👋 REST server exited");
    Ok(())
}
