use axum::extract::{Path, Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use common::gate::GateError;
use common::resolve::Resolved;

use super::caller::Caller;
use super::handlers::{not_found_handler, unavailable_handler};
use crate::ServiceState;

/// `GET /gw/:token`
///
/// Resolves the token for the caller and streams the file. Range and
///  conditional requests are handled by [`ServeFile`]. Every denial is the
///  shared not-found response.
pub async fn handler(
    State(state): State<ServiceState>,
    caller: Caller,
    Path(token): Path<String>,
    request: Request,
) -> Response {
    let headers = request.headers().clone();
    let Some(principal) = caller.identity() else {
        return not_found_handler(headers).await;
    };
    let principal = principal.cloned();

    let gate = state.gate().clone();
    let outcome =
        tokio::task::spawn_blocking(move || gate.resolve(principal.as_ref(), &token)).await;

    let resolved = match outcome {
        Ok(Ok(resolved)) => resolved,
        Ok(Err(GateError::Denied(_))) => return not_found_handler(headers).await,
        Ok(Err(GateError::Config(_))) => return unavailable_handler(headers).await,
        Err(e) => {
            tracing::error!(error = %e, "resolution task failed");
            return unavailable_handler(headers).await;
        }
    };

    serve(resolved, request, headers).await
}

async fn serve(resolved: Resolved, request: Request, headers: http::HeaderMap) -> Response {
    let disposition = content_disposition(&resolved);
    let mut response = match ServeFile::new_with_mime(&resolved.path, &resolved.mime)
        .oneshot(request)
        .await
    {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    };

    // the file vanished between resolution and open
    if response.status() == StatusCode::NOT_FOUND {
        return not_found_handler(headers).await;
    }
    if let Some(disposition) = disposition {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, disposition);
    }
    response
}

/// `inline; filename="<basename>"`, with anything outside printable ASCII
///  (and quotes or backslashes) replaced.
fn content_disposition(resolved: &Resolved) -> Option<HeaderValue> {
    let name: String = resolved
        .file_name()?
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();
    HeaderValue::from_str(&format!("inline; filename=\"{name}\"")).ok()
}
