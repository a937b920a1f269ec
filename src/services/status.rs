use chrono::Utc;
use rusqlite::{Connection, TransactionBehavior};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{BookingDetails, BookingStatus, VehicleStatus};

/// Permitted next states. `Completado` and `Cancelado` are terminal.
pub fn allowed_transitions(status: BookingStatus) -> &'static [BookingStatus] {
    match status {
        BookingStatus::Pendiente => &[BookingStatus::Confirmado, BookingStatus::Cancelado],
        BookingStatus::Confirmado => &[BookingStatus::Activo, BookingStatus::Cancelado],
        BookingStatus::Activo => &[BookingStatus::Completado, BookingStatus::Cancelado],
        BookingStatus::Completado => &[],
        BookingStatus::Cancelado => &[],
    }
}

pub fn can_transition(from: BookingStatus, to: BookingStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

/// Moves a booking to `target` and updates its vehicle in the same transaction.
/// Activation rents the vehicle out and is refused for a retired vehicle.
/// Completing or cancelling makes the vehicle `DISPONIBLE` again once no other
/// `ACTIVO` booking holds it; a retired vehicle keeps its status.
pub fn transition_booking(
    conn: &mut Connection,
    booking_id: i64,
    target: BookingStatus,
) -> Result<BookingDetails, AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let booking = queries::get_booking(&tx, booking_id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?;

    if !can_transition(booking.status, target) {
        tracing::warn!(
            booking_id,
            from = booking.status.as_str(),
            to = target.as_str(),
            "rejected booking status change"
        );
        return Err(AppError::InvalidTransition {
            from: booking.status,
            to: target,
        });
    }

    let vehicle = queries::get_vehicle(&tx, booking.vehicle_id)?
        .ok_or_else(|| AppError::NotFound(format!("vehicle {}", booking.vehicle_id)))?;
    let retired = vehicle.status == VehicleStatus::Retirado;

    if target == BookingStatus::Activo && retired {
        tracing::warn!(
            booking_id,
            vehicle_id = vehicle.id,
            "refused to activate booking on a retired vehicle"
        );
        return Err(AppError::conflict(format!(
            "vehicle {} is retired and cannot be rented out",
            vehicle.plate_number
        )));
    }

    let now = Utc::now().naive_utc();
    queries::update_booking_status(&tx, booking_id, target, &now)?;

    match target {
        BookingStatus::Activo => {
            queries::set_vehicle_status(&tx, booking.vehicle_id, VehicleStatus::Rentado)?;
        }
        BookingStatus::Completado | BookingStatus::Cancelado => {
            let others = queries::active_booking_ids(&tx, booking.vehicle_id, Some(booking_id))?;
            if others.is_empty() && !retired {
                queries::set_vehicle_status(&tx, booking.vehicle_id, VehicleStatus::Disponible)?;
            }
        }
        BookingStatus::Pendiente | BookingStatus::Confirmado => {}
    }

    let details = queries::get_booking_details(&tx, booking_id)?
        .ok_or_else(|| anyhow::anyhow!("booking {booking_id} missing after status change"))?;
    tx.commit()?;

    tracing::info!(
        booking_id,
        vehicle_id = booking.vehicle_id,
        from = booking.status.as_str(),
        to = target.as_str(),
        "booking status changed"
    );

    Ok(details)
}
