//! HTTP binding for the two booking operations. Handlers do no business
//! logic: validate, allocate, serialize.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tracing::error;

use crate::engine::{Allocator, EngineError};
use crate::memory::MemoryStore;
use crate::observability;
use crate::wire::{self, RawBooking};

#[derive(Clone)]
pub struct AppState {
    pub allocator: Arc<Allocator<MemoryStore>>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/bookings", post(create_booking))
        .route("/api/bookings/multiple", post(create_bookings))
        .with_state(state)
}

async fn create_booking(
    State(state): State<AppState>,
    Json(raw): Json<RawBooking>,
) -> Response {
    metrics::counter!(observability::REQUESTS_TOTAL, "op" => "create_booking").increment(1);

    let (space_id, window) = match wire::validate_booking(&raw) {
        Ok(valid) => valid,
        Err(errors) => return unprocessable(wire::ValidationBody { errors }),
    };

    match state.allocator.create_booking(space_id, window).await {
        Ok(booking) => (StatusCode::OK, Json(wire::BookingBody::from(booking))).into_response(),
        Err(e) => failure_response(e),
    }
}

async fn create_bookings(
    State(state): State<AppState>,
    Json(items): Json<Vec<Value>>,
) -> Response {
    metrics::counter!(observability::REQUESTS_TOTAL, "op" => "create_bookings").increment(1);

    let requests = match wire::validate_room_bookings(&items) {
        Ok(requests) => requests,
        Err(errors) => return unprocessable(wire::ValidationBody { errors }),
    };

    match state.allocator.create_bookings(requests).await {
        Ok(outcome) => (StatusCode::OK, Json(wire::BatchBody::from(&outcome))).into_response(),
        Err(e) => failure_response(e),
    }
}

fn unprocessable(body: wire::ValidationBody) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
}

/// Domain errors map to their contract bodies; anything unclassified is the
/// generic 500, logged but never masked.
fn failure_response(e: EngineError) -> Response {
    let (status, body) = wire::failure_body(&e);
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!("booking request failed: {e}");
    }
    (status, Json(body)).into_response()
}
