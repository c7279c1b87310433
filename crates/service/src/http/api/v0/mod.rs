use axum::routing::get;
use axum::Router;

use crate::ServiceState;

pub mod view;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/view", get(view::handler))
        .with_state(state)
}
