use crate::app::AppEnv;
use std::sync::Arc;

use axum::routing::any;
use axum::{Router, routing::get};
use tower::ServiceBuilder;
use tower_http::{normalize_path::NormalizePathLayer, trace::TraceLayer};

mod webhook;

pub fn new(app: AppEnv) -> Router {
    let app_state = Arc::new(app);
    Router::new()
        .route("/", get(|| async { "Hello!" }))
        .route("/webhook", any(webhook::webhook_handler))
        .route("/webhook/bling", any(webhook::webhook_handler))
        .with_state(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(NormalizePathLayer::trim_trailing_slash()),
        )
}
