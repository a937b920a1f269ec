use chrono::{Datelike, Utc};
use rusqlite::{Connection, ErrorCode, TransactionBehavior};
use serde::Serialize;
use validator::Validate;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{
    FleetEntry, Vehicle, VehicleCategory, VehicleDetail, VehicleInput, VehicleRates,
    VehicleStatus, VehicleUpdate,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetirementCheck {
    pub allowed: bool,
    pub active_count: i64,
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

fn plate_taken() -> AppError {
    AppError::conflict("plate number is already registered")
}

fn check_year(year: i32) -> Result<(), AppError> {
    let max = Utc::now().year() + 1;
    if year > max {
        return Err(AppError::validation("year", format!("maximum year is {max}")));
    }
    Ok(())
}

fn check_rates(rates: &VehicleRates) -> Result<(), AppError> {
    if !rates.is_non_increasing() {
        return Err(AppError::validation(
            "rates",
            "rates must not increase with rental length",
        ));
    }
    Ok(())
}

fn load(conn: &Connection, id: i64) -> Result<Vehicle, AppError> {
    queries::get_vehicle(conn, id)?.ok_or_else(|| AppError::NotFound(format!("vehicle {id}")))
}

pub fn list_vehicles(conn: &Connection) -> Result<Vec<Vehicle>, AppError> {
    Ok(queries::list_vehicles(conn)?)
}

/// Back-office fleet table: every vehicle with its nearest pending, confirmed
/// or active booking and its lifetime booking count.
pub fn list_fleet(
    conn: &Connection,
    status: Option<VehicleStatus>,
    category: Option<VehicleCategory>,
) -> Result<Vec<FleetEntry>, AppError> {
    let now = Utc::now().naive_utc();
    let vehicles = queries::list_vehicles_filtered(conn, status, category)?;

    let mut entries = Vec::with_capacity(vehicles.len());
    for vehicle in vehicles {
        let next_booking = queries::next_booking_for_vehicle(conn, vehicle.id, &now)?;
        let booking_count = queries::count_bookings_for_vehicle(conn, vehicle.id)?;
        entries.push(FleetEntry {
            vehicle,
            next_booking,
            booking_count,
        });
    }
    Ok(entries)
}

pub fn get_vehicle_detail(conn: &Connection, id: i64) -> Result<VehicleDetail, AppError> {
    let vehicle = load(conn, id)?;
    let booking_count = queries::count_bookings_for_vehicle(conn, id)?;
    let active_bookings = queries::active_booking_ids(conn, id, None)?.len() as i64;
    Ok(VehicleDetail {
        vehicle,
        booking_count,
        active_bookings,
    })
}

pub fn create_vehicle(conn: &Connection, input: &VehicleInput) -> Result<Vehicle, AppError> {
    input.validate()?;
    check_year(input.year)?;
    check_rates(&input.rates())?;

    if queries::get_vehicle_by_plate(conn, &input.plate_number)?.is_some() {
        return Err(plate_taken());
    }

    let id = match queries::insert_vehicle(conn, input) {
        Ok(id) => id,
        Err(e) if is_unique_violation(&e) => return Err(plate_taken()),
        Err(e) => return Err(e.into()),
    };

    tracing::info!(vehicle_id = id, plate = %input.plate_number, "vehicle created");
    load(conn, id)
}

/// Applies the fields present in `update`. Existing bookings keep the
/// rates they were priced with.
pub fn update_vehicle(
    conn: &Connection,
    id: i64,
    update: &VehicleUpdate,
) -> Result<Vehicle, AppError> {
    update.validate()?;
    let mut vehicle = load(conn, id)?;

    if let Some(plate) = &update.plate_number {
        if *plate != vehicle.plate_number
            && queries::get_vehicle_by_plate(conn, plate)?.is_some()
        {
            return Err(plate_taken());
        }
    }

    update.apply_to(&mut vehicle);
    check_year(vehicle.year)?;
    check_rates(&vehicle.rates)?;

    match queries::update_vehicle(conn, &vehicle) {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => return Err(plate_taken()),
        Err(e) => return Err(e.into()),
    }

    tracing::info!(vehicle_id = id, "vehicle updated");
    load(conn, id)
}

pub fn can_retire(conn: &Connection, id: i64) -> Result<RetirementCheck, AppError> {
    load(conn, id)?;
    let active_count = queries::active_booking_ids(conn, id, None)?.len() as i64;
    Ok(RetirementCheck {
        allowed: active_count == 0,
        active_count,
    })
}

/// Soft-deletes a vehicle by marking it `RETIRADO`. Blocked while any
/// `ACTIVO` booking holds it; future pending or confirmed bookings do not block.
pub fn retire_vehicle(conn: &mut Connection, id: i64) -> Result<Vehicle, AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let vehicle = load(&tx, id)?;
    if vehicle.status == VehicleStatus::Retirado {
        return Ok(vehicle);
    }

    let blocking = queries::active_booking_ids(&tx, id, None)?;
    if !blocking.is_empty() {
        tracing::warn!(vehicle_id = id, blocking = ?blocking, "retirement blocked");
        return Err(AppError::Conflict {
            message: format!(
                "vehicle has {} active booking(s) and cannot be retired",
                blocking.len()
            ),
            blocking_booking_ids: blocking,
        });
    }

    queries::set_vehicle_status(&tx, id, VehicleStatus::Retirado)?;
    let retired = load(&tx, id)?;
    tx.commit()?;

    tracing::info!(vehicle_id = id, "vehicle retired");
    Ok(retired)
}

/// Manual lifecycle moves from the back office. `RENTADO` belongs to the
/// booking status machine and cannot be set here; retirement goes through
/// the active-booking guard.
pub fn set_vehicle_status(
    conn: &mut Connection,
    id: i64,
    target: VehicleStatus,
) -> Result<Vehicle, AppError> {
    let vehicle = load(conn, id)?;
    if vehicle.status == target {
        return Ok(vehicle);
    }

    use VehicleStatus::*;
    match (vehicle.status, target) {
        (_, Retirado) => return retire_vehicle(conn, id),
        (_, Rentado) => {
            return Err(AppError::conflict(
                "vehicles are marked RENTADO only by activating a booking",
            ))
        }
        (Rentado, _) => {
            return Err(AppError::conflict(
                "vehicle is rented; complete or cancel its active booking first",
            ))
        }
        (Retirado, Mantenimiento) => {
            return Err(AppError::conflict(
                "retired vehicles can only be returned to DISPONIBLE",
            ))
        }
        (Disponible, Mantenimiento)
        | (Mantenimiento, Disponible)
        | (Retirado, Disponible) => {}
        (Disponible, Disponible) | (Mantenimiento, Mantenimiento) => {}
    }

    queries::set_vehicle_status(conn, id, target)?;
    tracing::info!(
        vehicle_id = id,
        from = vehicle.status.as_str(),
        to = target.as_str(),
        "vehicle status changed"
    );
    load(conn, id)
}
