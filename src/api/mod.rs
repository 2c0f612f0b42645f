//! REST API exposing one simulator run's sizing, layout, and event log.
mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::layout::LayoutResult;
use crate::sim::materializer::ResultBundle;
use crate::sizing::VehicleTypeSizing;

pub struct AppState {
    pub bundle: ResultBundle,
    pub layout: LayoutResult,
    pub sizes: Vec<VehicleTypeSizing>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/events", get(handlers::get_events))
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>, addr: SocketAddr) {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind to {addr}: {e}"));
    eprintln!("API server listening on http://{addr}");
    axum::serve(listener, app)
        .await
        .unwrap_or_else(|e| panic!("server error: {e}"));
}
