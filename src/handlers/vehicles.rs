use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::validation::parse_timestamp;
use crate::models::Vehicle;
use crate::services::availability::{self, AvailableVehicle};
use crate::services::fleet;
use crate::services::pricing::RentalPeriod;
use crate::state::AppState;

// GET /api/vehicles
pub async fn list_vehicles(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Vehicle>>, AppError> {
    let db = state.conn()?;
    Ok(Json(fleet::list_vehicles(&db)?))
}

// GET /api/vehicles/available
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn required_timestamp(field: &str, raw: Option<&str>) -> Result<chrono::NaiveDateTime, AppError> {
    let raw = raw
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::validation(field, format!("{field} is required")))?;
    parse_timestamp(raw).ok_or_else(|| AppError::validation(field, "invalid date, expected ISO-8601"))
}

pub async fn available_vehicles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<AvailableVehicle>>, AppError> {
    let start = required_timestamp("startDate", query.start_date.as_deref())?;
    let end = required_timestamp("endDate", query.end_date.as_deref())?;
    let period = RentalPeriod::new(start, end)?;

    let db = state.conn()?;
    Ok(Json(availability::list_available(&db, &period)?))
}
