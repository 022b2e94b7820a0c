pub mod delete;
pub mod login;
pub mod signup;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::AppState;

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// State backed by an in-memory store.
#[cfg(test)]
pub(crate) fn state(
    store: std::sync::Arc<crate::database::MemoryStore>,
) -> AppState {
    AppState::new(
        std::sync::Arc::new(crate::config::Configuration::default()),
        store,
    )
}
