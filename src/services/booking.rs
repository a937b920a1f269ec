use chrono::Utc;
use rusqlite::{Connection, TransactionBehavior};
use validator::Validate;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::validation::parse_timestamp;
use crate::models::{
    Booking, BookingDetails, BookingRequest, BookingStatus, NewBooking, PaymentStatus,
};
use crate::services::availability;
use crate::services::pricing::{self, RentalPeriod};

/// Validates a raw booking body and resolves its timestamps. A missing
/// dropoff location means the car comes back where it was picked up.
pub fn prepare(request: BookingRequest) -> Result<NewBooking, AppError> {
    request.validate()?;

    let start = parse_timestamp(&request.start_date)
        .ok_or_else(|| AppError::validation("start_date", "invalid date, expected ISO-8601"))?;
    let end = parse_timestamp(&request.end_date)
        .ok_or_else(|| AppError::validation("end_date", "invalid date, expected ISO-8601"))?;

    Ok(NewBooking {
        vehicle_id: request.vehicle_id,
        start,
        end,
        customer: request.customer,
        pickup_location: request.pickup_location,
        dropoff_location: request.dropoff_location,
        special_requests: request.special_requests,
    })
}

/// Books `request.vehicle_id` for the requested window.
///
/// The vehicle lookup, the overlap check, the customer upsert and the insert
/// share one `IMMEDIATE` transaction. SQLite hands out the write lock at
/// `BEGIN`, so a second request for the same vehicle waits and then sees the
/// first booking during its own overlap check. Any error rolls back every write.
pub fn create_booking(
    conn: &mut Connection,
    request: &NewBooking,
) -> Result<BookingDetails, AppError> {
    let period = RentalPeriod::new(request.start, request.end)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let vehicle = queries::get_vehicle(&tx, request.vehicle_id)?
        .ok_or_else(|| AppError::NotFound(format!("vehicle {}", request.vehicle_id)))?;
    availability::ensure_bookable(&tx, &vehicle, &period)?;

    let quote = pricing::calculate_price(&vehicle.rates, &period);
    let customer_id = queries::upsert_customer(&tx, &request.customer)?;

    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: 0,
        vehicle_id: vehicle.id,
        customer_id,
        start_date: period.start,
        end_date: period.end,
        total_days: quote.total_days,
        daily_rate_applied: quote.daily_rate,
        subtotal: quote.subtotal,
        tax_amount: quote.tax,
        total_amount: quote.total,
        deposit_amount: pricing::deposit_for(quote.total),
        status: BookingStatus::Pendiente,
        payment_status: PaymentStatus::Pendiente,
        pickup_location: request.pickup_location.clone(),
        dropoff_location: request
            .dropoff_location
            .clone()
            .unwrap_or_else(|| request.pickup_location.clone()),
        special_requests: request.special_requests.clone(),
        created_at: now,
        updated_at: now,
        cancelled_at: None,
    };
    let booking_id = queries::insert_booking(&tx, &booking)?;

    let details = queries::get_booking_details(&tx, booking_id)?
        .ok_or_else(|| anyhow::anyhow!("booking {booking_id} missing right after insert"))?;
    tx.commit()?;

    tracing::info!(
        booking_id,
        vehicle_id = vehicle.id,
        customer_id,
        total_days = quote.total_days,
        total = quote.total,
        "booking created"
    );

    Ok(details)
}

pub fn get_booking(conn: &Connection, id: i64) -> Result<BookingDetails, AppError> {
    queries::get_booking_details(conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))
}

/// `ALL` or no filter lists every booking; anything else must be a known status.
pub fn list_bookings(
    conn: &Connection,
    status_filter: Option<&str>,
) -> Result<Vec<BookingDetails>, AppError> {
    let status = match status_filter {
        None | Some("") | Some("ALL") => None,
        Some(raw) => Some(
            BookingStatus::parse(raw)
                .ok_or_else(|| AppError::validation("status", format!("unknown status: {raw}")))?,
        ),
    };
    Ok(queries::list_booking_details(conn, status)?)
}
