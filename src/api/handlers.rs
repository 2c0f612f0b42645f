//! Route handlers for the depot-sim REST API.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use super::types::{ErrorResponse, EventsQuery, EventsResponse, StateResponse};
use super::AppState;

pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    Json(StateResponse::new(&state.bundle, &state.layout, &state.sizes))
}

pub async fn get_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(state.bundle.events.len());

    if from > to {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("invalid range: from ({from}) > to ({to})"),
            }),
        )
            .into_response();
    }

    let events = state
        .bundle
        .events
        .iter()
        .skip(from)
        .take(to.saturating_sub(from))
        .cloned()
        .collect();

    Json(EventsResponse { events }).into_response()
}
