use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use http::StatusCode;

use common::prelude::build_info;

use crate::ServiceState;

mod data_source;
mod readiness;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/livez", get(liveness))
        .route("/readyz", get(readiness::handler))
        .route("/version", get(version))
        .with_state(state)
}

async fn liveness() -> Response {
    let msg = serde_json::json!({"status": "ok"});
    (StatusCode::OK, Json(msg)).into_response()
}

async fn version() -> Response {
    (StatusCode::OK, Json(build_info())).into_response()
}
