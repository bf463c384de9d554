//! Webhook command - serve template admission reviews over HTTP
//!
//! No TLS is served here; HTTPS is terminated in front of the listener.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use hmc_core::OperatorConfig;
use hmc_kube::{ClusterStore, DeletionGuard, KubeStore, review_template};
use kube::api::DynamicObject;
use kube::core::admission::AdmissionReview;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::error::Result;

/// Routes served by the admission webhook
pub fn router<S: ClusterStore + 'static>(guard: Arc<DeletionGuard<S>>) -> Router {
    Router::new()
        .route("/validate-template", post(validate_template::<S>))
        .route("/healthz", get(healthz))
        .with_state(guard)
}

async fn validate_template<S: ClusterStore + 'static>(
    State(guard): State<Arc<DeletionGuard<S>>>,
    Json(review): Json<AdmissionReview<DynamicObject>>,
) -> Json<AdmissionReview<DynamicObject>> {
    Json(review_template(&guard, review).await)
}

async fn healthz() -> &'static str {
    "ok"
}

/// Serve plain HTTP until interrupted
pub async fn run(config: &OperatorConfig, listen: SocketAddr) -> Result<()> {
    let store = KubeStore::new(config.field_manager.clone()).await?;
    let app = router(Arc::new(DeletionGuard::new(store)));

    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!("admission webhook listening on {}", listen);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
