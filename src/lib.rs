//! loginform is a small account manager: signup, login and account deletion
//! on top of a MongoDB collection.

#![forbid(unsafe_code)]
pub mod config;
pub mod database;
pub mod error;
mod router;
pub mod telemetry;
pub mod user;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{StatusCode, header};
use axum::routing::{any, get, get_service, post};
use axum::{Router, middleware};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

pub use error::ServerError;

use config::Configuration;
use user::{AccountService, UserRepository};

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    app: Router,
    method: axum::http::Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    app.oneshot(
        Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(axum::body::Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Configuration>,
    pub accounts: AccountService,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create a new [`AppState`] around a record store.
    pub fn new(config: Arc<Configuration>, store: Arc<dyn UserRepository>) -> Self {
        Self {
            config,
            accounts: AccountService::new(store),
            metrics: None,
        }
    }

    /// Serve Prometheus metrics on `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let assets = state.config.assets.clone();

    let layers = ServiceBuilder::new()
        // Mark sensitive headers before they reach the trace layer.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE]))
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(state.config.request_timeout),
        ));

    let mut routes = Router::new()
        // `GET /` serves the login form.
        .route("/", get_service(ServeFile::new(assets.join("login.html"))))
        // `GET /signup` serves the signup form, `POST /signup` goes to `signup`.
        .route(
            "/signup",
            get_service(ServeFile::new(assets.join("signup.html")))
                .post(router::signup::handler),
        )
        // `POST /login` goes to `login`.
        .route("/login", post(router::login::handler))
        // methods are checked by `delete` itself.
        .route("/delete-account", any(router::delete::handler))
        .nest_service("/css", ServeDir::new(assets.join("css")));

    if state.metrics.is_some() {
        routes = routes.route("/metrics", get(router::metrics));
    }

    routes
        .with_state(state)
        .route_layer(middleware::from_fn(telemetry::track))
        .layer(layers)
}
