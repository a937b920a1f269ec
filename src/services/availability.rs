use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Vehicle, VehicleStatus};
use crate::services::pricing::{self, PriceQuote, RentalPeriod};

/// A vehicle offered for a search window, with what that window would cost.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableVehicle {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    pub pricing: PriceQuote,
}

/// Fails with a conflict unless `vehicle` can take a new booking over
/// `period` right now. Run it inside the transaction that writes the booking.
pub fn ensure_bookable(
    conn: &Connection,
    vehicle: &Vehicle,
    period: &RentalPeriod,
) -> Result<(), AppError> {
    if vehicle.status != VehicleStatus::Disponible {
        return Err(AppError::conflict(format!(
            "vehicle not available (status {})",
            vehicle.status.as_str()
        )));
    }

    let blocking = queries::overlapping_booking_ids(conn, vehicle.id, &period.start, &period.end)?;
    if !blocking.is_empty() {
        tracing::warn!(
            vehicle_id = vehicle.id,
            blocking = ?blocking,
            "requested dates overlap existing bookings"
        );
        return Err(AppError::Conflict {
            message: "dates unavailable for this vehicle".to_string(),
            blocking_booking_ids: blocking,
        });
    }

    Ok(())
}

pub fn is_available(
    conn: &Connection,
    vehicle_id: i64,
    period: &RentalPeriod,
) -> Result<bool, AppError> {
    let vehicle = queries::get_vehicle(conn, vehicle_id)?
        .ok_or_else(|| AppError::NotFound(format!("vehicle {vehicle_id}")))?;

    match ensure_bookable(conn, &vehicle, period) {
        Ok(()) => Ok(true),
        Err(AppError::Conflict { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

pub fn list_available(
    conn: &Connection,
    period: &RentalPeriod,
) -> Result<Vec<AvailableVehicle>, AppError> {
    let vehicles = queries::list_available_vehicles(conn, &period.start, &period.end)?;
    Ok(vehicles
        .into_iter()
        .map(|vehicle| AvailableVehicle {
            pricing: pricing::calculate_price(&vehicle.rates, period),
            vehicle,
        })
        .collect())
}
