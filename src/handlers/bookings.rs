use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::errors::AppError;
use crate::models::{BookingDetails, BookingRequest};
use crate::services::booking;
use crate::state::AppState;

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BookingDetails>), AppError> {
    let Json(request) = body?;
    let new_booking = booking::prepare(request)?;

    let details = {
        let mut db = state.conn()?;
        booking::create_booking(&mut db, &new_booking)?
    };

    Ok((StatusCode::CREATED, Json(details)))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<BookingDetails>, AppError> {
    let db = state.conn()?;
    Ok(Json(booking::get_booking(&db, id)?))
}
