//! Router assembly and the serve loop.

use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::{Router, middleware as axum_middleware};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::handlers;
use crate::middleware;
use crate::state::{AppState, build_state};

/// Assemble the full router: routes, request-id propagation, tracing, and
/// the authentication middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::health::healthz))
        .route("/auth/v1/login", post(handlers::session::login))
        .route("/auth/v1/logout", post(handlers::session::logout))
        .route(
            "/documents/v1/documents/{id}",
            get(handlers::documents::get_document).put(handlers::documents::update_document),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(axum_middleware::from_fn_with_state(
                    state.clone(),
                    middleware::authenticate,
                )),
        )
        .with_state(state)
}

/// Bind and serve until the process is stopped.
///
/// # Errors
///
/// Fails on startup wiring problems or when the listener cannot bind.
pub async fn run(config: &AppConfig) -> anyhow::Result<()> {
    let state = build_state(config).await?;
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.server.listen_addr).await?;
    tracing::info!(addr = %config.server.listen_addr, "gateway listening");
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
