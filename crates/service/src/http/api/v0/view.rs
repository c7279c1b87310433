use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::access::View;
use common::gate::GateError;
use common::manifest::{EntryKind, Stats};

use crate::http::caller::Caller;
use crate::http::handlers::unavailable_handler;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewItem {
    pub uuid: Uuid,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub size: u64,
    pub mtime: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewResponse {
    pub stats: Stats,
    pub entries: Vec<ViewItem>,
}

impl From<&View> for ViewResponse {
    fn from(view: &View) -> Self {
        let entries = view
            .entries()
            .iter()
            .map(|visible| {
                let entry = visible.entry();
                ViewItem {
                    uuid: *entry.uuid(),
                    path: entry.path().to_string(),
                    kind: entry.kind(),
                    size: entry.size(),
                    mtime: *entry.mtime(),
                    mime: entry.mime().map(|m| m.to_string()),
                }
            })
            .collect();
        Self {
            stats: *view.stats(),
            entries,
        }
    }
}

/// `GET /api/v0/view`: everything the caller may resolve. Which bucket an
///  entry came from is never reported.
pub async fn handler(State(state): State<ServiceState>, caller: Caller, headers: HeaderMap) -> Response {
    let Some(principal) = caller.identity() else {
        let msg = serde_json::json!({"msg": "unauthorized"});
        return (StatusCode::UNAUTHORIZED, Json(msg)).into_response();
    };
    let principal = principal.cloned();

    let gate = state.gate().clone();
    match tokio::task::spawn_blocking(move || gate.view(principal.as_ref())).await {
        Ok(Ok(view)) => (StatusCode::OK, Json(ViewResponse::from(&view))).into_response(),
        Ok(Err(GateError::Config(e))) => {
            tracing::error!(error = %e, "view failed closed");
            unavailable_handler(headers).await
        }
        Ok(Err(GateError::Denied(e))) => {
            // listing never denies per token; keep the answer generic anyway
            tracing::error!(error = %e, "unexpected denial while listing");
            unavailable_handler(headers).await
        }
        Err(e) => {
            tracing::error!(error = %e, "view task failed");
            unavailable_handler(headers).await
        }
    }
}
