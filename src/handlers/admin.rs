use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::handlers::auth::check_auth;
use crate::models::{
    BookingDetails, BookingStatus, FleetEntry, StatusChangeRequest, Vehicle, VehicleCategory,
    VehicleDetail, VehicleInput, VehicleStatus, VehicleStatusRequest, VehicleUpdate,
};
use crate::services::fleet::{self, RetirementCheck};
use crate::services::{booking, status};
use crate::state::AppState;

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingDetails>>, AppError> {
    check_auth(&headers, &state.config.session_secret)?;

    let db = state.conn()?;
    Ok(Json(booking::list_bookings(&db, query.status.as_deref())?))
}

// PATCH /api/admin/bookings/:id/status
pub async fn update_booking_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    body: Result<Json<StatusChangeRequest>, JsonRejection>,
) -> Result<Json<BookingDetails>, AppError> {
    let admin = check_auth(&headers, &state.config.session_secret)?;
    let Json(request) = body?;
    let target = BookingStatus::parse(&request.status).ok_or_else(|| {
        AppError::validation("status", format!("unknown status: {}", request.status))
    })?;

    let details = {
        let mut db = state.conn()?;
        status::transition_booking(&mut db, id, target)?
    };
    tracing::info!(
        booking_id = id,
        admin = %admin.username,
        to = target.as_str(),
        "admin changed booking status"
    );
    Ok(Json(details))
}

// GET /api/admin/vehicles
#[derive(Deserialize)]
pub struct FleetQuery {
    pub status: Option<String>,
    pub category: Option<String>,
}

fn parse_filter<T>(
    field: &str,
    raw: Option<&str>,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>, AppError> {
    match raw {
        None | Some("") | Some("ALL") => Ok(None),
        Some(v) => parse(v)
            .map(Some)
            .ok_or_else(|| AppError::validation(field, format!("unknown {field}: {v}"))),
    }
}

pub async fn list_fleet(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<FleetQuery>,
) -> Result<Json<Vec<FleetEntry>>, AppError> {
    check_auth(&headers, &state.config.session_secret)?;
    let status = parse_filter("status", query.status.as_deref(), VehicleStatus::parse)?;
    let category = parse_filter("category", query.category.as_deref(), VehicleCategory::parse)?;

    let db = state.conn()?;
    Ok(Json(fleet::list_fleet(&db, status, category)?))
}

// POST /api/admin/vehicles
pub async fn create_vehicle(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<VehicleInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Vehicle>), AppError> {
    check_auth(&headers, &state.config.session_secret)?;
    let Json(input) = body?;

    let db = state.conn()?;
    let vehicle = fleet::create_vehicle(&db, &input)?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

// GET /api/admin/vehicles/:id
pub async fn get_vehicle(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<VehicleDetail>, AppError> {
    check_auth(&headers, &state.config.session_secret)?;

    let db = state.conn()?;
    Ok(Json(fleet::get_vehicle_detail(&db, id)?))
}

// PATCH /api/admin/vehicles/:id
pub async fn update_vehicle(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    body: Result<Json<VehicleUpdate>, JsonRejection>,
) -> Result<Json<Vehicle>, AppError> {
    check_auth(&headers, &state.config.session_secret)?;
    let Json(update) = body?;

    let db = state.conn()?;
    Ok(Json(fleet::update_vehicle(&db, id, &update)?))
}

// POST /api/admin/vehicles/:id/status
pub async fn set_vehicle_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    body: Result<Json<VehicleStatusRequest>, JsonRejection>,
) -> Result<Json<Vehicle>, AppError> {
    check_auth(&headers, &state.config.session_secret)?;
    let Json(request) = body?;
    let target = VehicleStatus::parse(&request.status).ok_or_else(|| {
        AppError::validation("status", format!("unknown status: {}", request.status))
    })?;

    let mut db = state.conn()?;
    Ok(Json(fleet::set_vehicle_status(&mut db, id, target)?))
}

// GET /api/admin/vehicles/:id/check-deletable
pub async fn check_deletable(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<RetirementCheck>, AppError> {
    check_auth(&headers, &state.config.session_secret)?;

    let db = state.conn()?;
    Ok(Json(fleet::can_retire(&db, id)?))
}

// DELETE /api/admin/vehicles/:id
pub async fn retire_vehicle(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Vehicle>, AppError> {
    check_auth(&headers, &state.config.session_secret)?;

    let mut db = state.conn()?;
    Ok(Json(fleet::retire_vehicle(&mut db, id)?))
}
