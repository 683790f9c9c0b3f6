use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::adapter::http::controller::{healthz, receive_event, HttpController};

/// Builds the ingress router: events on `POST /`, liveness on `GET /healthz`.
pub fn build_router(controller: Arc<HttpController>) -> Router {
    Router::new()
        .route("/", post(receive_event))
        .route("/healthz", get(healthz))
        .with_state(controller)
}
