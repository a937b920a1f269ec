use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{
    Booking, BookingDetails, BookingStatus, Customer, CustomerInput, FuelType, PaymentStatus,
    Transmission, UpcomingBooking, Vehicle, VehicleCategory, VehicleInput, VehicleRates,
    VehicleStatus,
};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

const VEHICLE_COLUMNS: &str = "v.id, v.plate_number, v.brand, v.model, v.year, v.category, \
     v.daily_rate_1_2, v.daily_rate_3_6, v.weekly_rate, v.monthly_rate, v.transmission, \
     v.fuel_type, v.passenger_capacity, v.has_ac, v.has_gps, v.image_url, v.status, \
     v.created_at, v.updated_at";
const VEHICLE_COLUMN_COUNT: usize = 19;

const CUSTOMER_COLUMNS: &str = "c.id, c.first_name, c.last_name, c.email, c.phone, c.dpi, \
     c.license_number, c.license_expiry, c.address, c.city, c.department, c.created_at, \
     c.updated_at";
const CUSTOMER_COLUMN_COUNT: usize = 13;

const BOOKING_COLUMNS: &str = "b.id, b.vehicle_id, b.customer_id, b.start_date, b.end_date, \
     b.total_days, b.daily_rate_applied, b.subtotal, b.tax_amount, b.total_amount, \
     b.deposit_amount, b.status, b.payment_status, b.pickup_location, b.dropoff_location, \
     b.special_requests, b.created_at, b.updated_at, b.cancelled_at";
const BOOKING_COLUMN_COUNT: usize = 19;

// ── Row parsing ──

fn conversion_error(idx: usize, raw: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        Type::Text,
        format!("unexpected value: {raw}").into(),
    )
}

fn enum_column<T>(row: &Row, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| conversion_error(idx, &raw))
}

fn ts_column(row: &Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, TS_FORMAT).map_err(|_| conversion_error(idx, &raw))
}

fn optional_ts_column(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDateTime>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|r| NaiveDateTime::parse_from_str(&r, TS_FORMAT).map_err(|_| conversion_error(idx, &r)))
        .transpose()
}

fn date_column(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|_| conversion_error(idx, &raw))
}

fn parse_vehicle_row(row: &Row, base: usize) -> rusqlite::Result<Vehicle> {
    Ok(Vehicle {
        id: row.get(base)?,
        plate_number: row.get(base + 1)?,
        brand: row.get(base + 2)?,
        model: row.get(base + 3)?,
        year: row.get(base + 4)?,
        category: enum_column(row, base + 5, VehicleCategory::parse)?,
        rates: VehicleRates {
            daily_rate_1_2: row.get(base + 6)?,
            daily_rate_3_6: row.get(base + 7)?,
            weekly_rate: row.get(base + 8)?,
            monthly_rate: row.get(base + 9)?,
        },
        transmission: enum_column(row, base + 10, Transmission::parse)?,
        fuel_type: enum_column(row, base + 11, FuelType::parse)?,
        passenger_capacity: row.get(base + 12)?,
        has_ac: row.get::<_, i32>(base + 13)? != 0,
        has_gps: row.get::<_, i32>(base + 14)? != 0,
        image_url: row.get(base + 15)?,
        status: enum_column(row, base + 16, VehicleStatus::parse)?,
        created_at: ts_column(row, base + 17)?,
        updated_at: ts_column(row, base + 18)?,
    })
}

fn parse_customer_row(row: &Row, base: usize) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(base)?,
        first_name: row.get(base + 1)?,
        last_name: row.get(base + 2)?,
        email: row.get(base + 3)?,
        phone: row.get(base + 4)?,
        dpi: row.get(base + 5)?,
        license_number: row.get(base + 6)?,
        license_expiry: date_column(row, base + 7)?,
        address: row.get(base + 8)?,
        city: row.get(base + 9)?,
        department: row.get(base + 10)?,
        created_at: ts_column(row, base + 11)?,
        updated_at: ts_column(row, base + 12)?,
    })
}

fn parse_booking_row(row: &Row, base: usize) -> rusqlite::Result<Booking> {
    Ok(Booking {
        id: row.get(base)?,
        vehicle_id: row.get(base + 1)?,
        customer_id: row.get(base + 2)?,
        start_date: ts_column(row, base + 3)?,
        end_date: ts_column(row, base + 4)?,
        total_days: row.get(base + 5)?,
        daily_rate_applied: row.get(base + 6)?,
        subtotal: row.get(base + 7)?,
        tax_amount: row.get(base + 8)?,
        total_amount: row.get(base + 9)?,
        deposit_amount: row.get(base + 10)?,
        status: enum_column(row, base + 11, BookingStatus::parse)?,
        payment_status: enum_column(row, base + 12, PaymentStatus::parse)?,
        pickup_location: row.get(base + 13)?,
        dropoff_location: row.get(base + 14)?,
        special_requests: row.get(base + 15)?,
        created_at: ts_column(row, base + 16)?,
        updated_at: ts_column(row, base + 17)?,
        cancelled_at: optional_ts_column(row, base + 18)?,
    })
}

fn collect<T>(rows: impl Iterator<Item = rusqlite::Result<T>>) -> rusqlite::Result<Vec<T>> {
    let mut out = vec![];
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

// ── Vehicles ──

pub fn insert_vehicle(conn: &Connection, input: &VehicleInput) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO vehicles (plate_number, brand, model, year, category, daily_rate_1_2,
            daily_rate_3_6, weekly_rate, monthly_rate, transmission, fuel_type,
            passenger_capacity, has_ac, has_gps, image_url, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, 'DISPONIBLE')",
        params![
            input.plate_number,
            input.brand,
            input.model,
            input.year,
            input.category.as_str(),
            input.daily_rate_1_2,
            input.daily_rate_3_6,
            input.weekly_rate,
            input.monthly_rate,
            input.transmission.as_str(),
            input.fuel_type.as_str(),
            input.passenger_capacity,
            input.has_ac as i32,
            input.has_gps as i32,
            input.image_url,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_vehicle(conn: &Connection, id: i64) -> rusqlite::Result<Option<Vehicle>> {
    conn.query_row(
        &format!("SELECT {VEHICLE_COLUMNS} FROM vehicles v WHERE v.id = ?1"),
        params![id],
        |row| parse_vehicle_row(row, 0),
    )
    .optional()
}

pub fn get_vehicle_by_plate(conn: &Connection, plate: &str) -> rusqlite::Result<Option<Vehicle>> {
    conn.query_row(
        &format!("SELECT {VEHICLE_COLUMNS} FROM vehicles v WHERE v.plate_number = ?1"),
        params![plate],
        |row| parse_vehicle_row(row, 0),
    )
    .optional()
}

/// Public fleet listing, grouped by category.
pub fn list_vehicles(conn: &Connection) -> rusqlite::Result<Vec<Vehicle>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {VEHICLE_COLUMNS} FROM vehicles v ORDER BY v.category ASC, v.id ASC"
    ))?;
    let rows = stmt.query_map([], |row| parse_vehicle_row(row, 0))?;
    collect(rows)
}

/// Back-office listing with optional filters, ordered by status then brand.
pub fn list_vehicles_filtered(
    conn: &Connection,
    status: Option<VehicleStatus>,
    category: Option<VehicleCategory>,
) -> rusqlite::Result<Vec<Vehicle>> {
    let mut sql = format!("SELECT {VEHICLE_COLUMNS} FROM vehicles v WHERE 1 = 1");
    let mut params_vec: Vec<&'static str> = vec![];
    if let Some(status) = status {
        params_vec.push(status.as_str());
        sql.push_str(&format!(" AND v.status = ?{}", params_vec.len()));
    }
    if let Some(category) = category {
        params_vec.push(category.as_str());
        sql.push_str(&format!(" AND v.category = ?{}", params_vec.len()));
    }
    sql.push_str(" ORDER BY v.status ASC, v.brand ASC, v.id ASC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params_vec), |row| {
        parse_vehicle_row(row, 0)
    })?;
    collect(rows)
}

/// Vehicles that are `DISPONIBLE` and have no non-cancelled booking touching
/// `[start, end]`.
pub fn list_available_vehicles(
    conn: &Connection,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> rusqlite::Result<Vec<Vehicle>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {VEHICLE_COLUMNS} FROM vehicles v
         WHERE v.status = 'DISPONIBLE'
           AND NOT EXISTS (
               SELECT 1 FROM bookings b
               WHERE b.vehicle_id = v.id
                 AND b.status != 'CANCELADO'
                 AND b.start_date <= ?2
                 AND b.end_date >= ?1
           )
         ORDER BY v.category ASC, v.id ASC"
    ))?;
    let rows = stmt.query_map(params![format_ts(start), format_ts(end)], |row| {
        parse_vehicle_row(row, 0)
    })?;
    collect(rows)
}

pub fn update_vehicle(conn: &Connection, vehicle: &Vehicle) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE vehicles SET plate_number = ?1, brand = ?2, model = ?3, year = ?4, category = ?5,
            daily_rate_1_2 = ?6, daily_rate_3_6 = ?7, weekly_rate = ?8, monthly_rate = ?9,
            transmission = ?10, fuel_type = ?11, passenger_capacity = ?12, has_ac = ?13,
            has_gps = ?14, image_url = ?15, updated_at = datetime('now')
         WHERE id = ?16",
        params![
            vehicle.plate_number,
            vehicle.brand,
            vehicle.model,
            vehicle.year,
            vehicle.category.as_str(),
            vehicle.rates.daily_rate_1_2,
            vehicle.rates.daily_rate_3_6,
            vehicle.rates.weekly_rate,
            vehicle.rates.monthly_rate,
            vehicle.transmission.as_str(),
            vehicle.fuel_type.as_str(),
            vehicle.passenger_capacity,
            vehicle.has_ac as i32,
            vehicle.has_gps as i32,
            vehicle.image_url,
            vehicle.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn set_vehicle_status(
    conn: &Connection,
    id: i64,
    status: VehicleStatus,
) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE vehicles SET status = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(count > 0)
}

pub fn next_booking_for_vehicle(
    conn: &Connection,
    vehicle_id: i64,
    now: &NaiveDateTime,
) -> rusqlite::Result<Option<UpcomingBooking>> {
    conn.query_row(
        "SELECT b.id, b.start_date, b.end_date, b.status, c.first_name || ' ' || c.last_name
         FROM bookings b JOIN customers c ON c.id = b.customer_id
         WHERE b.vehicle_id = ?1
           AND b.status IN ('ACTIVO', 'CONFIRMADO', 'PENDIENTE')
           AND b.end_date >= ?2
         ORDER BY b.start_date ASC
         LIMIT 1",
        params![vehicle_id, format_ts(now)],
        |row| {
            Ok(UpcomingBooking {
                id: row.get(0)?,
                start_date: ts_column(row, 1)?,
                end_date: ts_column(row, 2)?,
                status: enum_column(row, 3, BookingStatus::parse)?,
                customer_name: row.get(4)?,
            })
        },
    )
    .optional()
}

pub fn count_bookings_for_vehicle(conn: &Connection, vehicle_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE vehicle_id = ?1",
        params![vehicle_id],
        |row| row.get(0),
    )
}

// ── Customers ──

/// Inserts the customer, or replaces every mutable field of the row that
/// already owns this email. Returns the row id either way.
pub fn upsert_customer(conn: &Connection, input: &CustomerInput) -> rusqlite::Result<i64> {
    conn.query_row(
        "INSERT INTO customers (first_name, last_name, email, phone, dpi, license_number,
            license_expiry, address, city, department)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(email) DO UPDATE SET
           first_name = excluded.first_name,
           last_name = excluded.last_name,
           phone = excluded.phone,
           dpi = excluded.dpi,
           license_number = excluded.license_number,
           license_expiry = excluded.license_expiry,
           address = excluded.address,
           city = excluded.city,
           department = excluded.department,
           updated_at = datetime('now')
         RETURNING id",
        params![
            input.first_name,
            input.last_name,
            input.email,
            input.phone,
            input.dpi,
            input.license_number,
            input.license_expiry.format(DATE_FORMAT).to_string(),
            input.address,
            input.city,
            input.department,
        ],
        |row| row.get(0),
    )
}

pub fn get_customer(conn: &Connection, id: i64) -> rusqlite::Result<Option<Customer>> {
    conn.query_row(
        &format!("SELECT {CUSTOMER_COLUMNS} FROM customers c WHERE c.id = ?1"),
        params![id],
        |row| parse_customer_row(row, 0),
    )
    .optional()
}

pub fn get_customer_by_email(conn: &Connection, email: &str) -> rusqlite::Result<Option<Customer>> {
    conn.query_row(
        &format!("SELECT {CUSTOMER_COLUMNS} FROM customers c WHERE c.email = ?1"),
        params![email],
        |row| parse_customer_row(row, 0),
    )
    .optional()
}

pub fn count_customers(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM customers", [], |row| row.get(0))
}

// ── Bookings ──

/// Inserts `booking`; its `id` is ignored and the assigned id is returned.
pub fn insert_booking(conn: &Connection, booking: &Booking) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO bookings (vehicle_id, customer_id, start_date, end_date, total_days,
            daily_rate_applied, subtotal, tax_amount, total_amount, deposit_amount, status,
            payment_status, pickup_location, dropoff_location, special_requests, created_at,
            updated_at, cancelled_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        params![
            booking.vehicle_id,
            booking.customer_id,
            format_ts(&booking.start_date),
            format_ts(&booking.end_date),
            booking.total_days,
            booking.daily_rate_applied,
            booking.subtotal,
            booking.tax_amount,
            booking.total_amount,
            booking.deposit_amount,
            booking.status.as_str(),
            booking.payment_status.as_str(),
            booking.pickup_location,
            booking.dropoff_location,
            booking.special_requests,
            format_ts(&booking.created_at),
            format_ts(&booking.updated_at),
            booking.cancelled_at.as_ref().map(format_ts),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_booking(conn: &Connection, id: i64) -> rusqlite::Result<Option<Booking>> {
    conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.id = ?1"),
        params![id],
        |row| parse_booking_row(row, 0),
    )
    .optional()
}

fn details_sql() -> String {
    format!(
        "SELECT {BOOKING_COLUMNS}, {CUSTOMER_COLUMNS}, {VEHICLE_COLUMNS}
         FROM bookings b
         JOIN customers c ON c.id = b.customer_id
         JOIN vehicles v ON v.id = b.vehicle_id"
    )
}

fn parse_details_row(row: &Row) -> rusqlite::Result<BookingDetails> {
    Ok(BookingDetails {
        booking: parse_booking_row(row, 0)?,
        customer: parse_customer_row(row, BOOKING_COLUMN_COUNT)?,
        vehicle: parse_vehicle_row(row, BOOKING_COLUMN_COUNT + CUSTOMER_COLUMN_COUNT)?,
    })
}

pub fn get_booking_details(conn: &Connection, id: i64) -> rusqlite::Result<Option<BookingDetails>> {
    conn.query_row(
        &format!("{} WHERE b.id = ?1", details_sql()),
        params![id],
        parse_details_row,
    )
    .optional()
}

/// Newest first; `None` lists every status.
pub fn list_booking_details(
    conn: &Connection,
    status: Option<BookingStatus>,
) -> rusqlite::Result<Vec<BookingDetails>> {
    let bookings = match status {
        Some(status) => {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE b.status = ?1 ORDER BY b.created_at DESC, b.id DESC",
                details_sql()
            ))?;
            let rows = stmt.query_map(params![status.as_str()], parse_details_row)?;
            collect(rows)?
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "{} ORDER BY b.created_at DESC, b.id DESC",
                details_sql()
            ))?;
            let rows = stmt.query_map([], parse_details_row)?;
            collect(rows)?
        }
    };
    Ok(bookings)
}

/// Ids of non-cancelled bookings of `vehicle_id` whose range touches
/// `[start, end]`. Touching boundaries count as overlap.
pub fn overlapping_booking_ids(
    conn: &Connection,
    vehicle_id: i64,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> rusqlite::Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM bookings
         WHERE vehicle_id = ?1
           AND status != 'CANCELADO'
           AND start_date <= ?3
           AND end_date >= ?2
         ORDER BY start_date ASC",
    )?;
    let rows = stmt.query_map(
        params![vehicle_id, format_ts(start), format_ts(end)],
        |row| row.get(0),
    )?;
    collect(rows)
}

/// Ids of `ACTIVO` bookings on `vehicle_id`, optionally leaving one out.
pub fn active_booking_ids(
    conn: &Connection,
    vehicle_id: i64,
    excluding: Option<i64>,
) -> rusqlite::Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM bookings
         WHERE vehicle_id = ?1 AND status = 'ACTIVO' AND (?2 IS NULL OR id != ?2)
         ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![vehicle_id, excluding], |row| row.get(0))?;
    collect(rows)
}

pub fn update_booking_status(
    conn: &Connection,
    id: i64,
    status: BookingStatus,
    now: &NaiveDateTime,
) -> rusqlite::Result<bool> {
    let cancelled_at = (status == BookingStatus::Cancelado).then(|| format_ts(now));
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2, cancelled_at = COALESCE(?3, cancelled_at)
         WHERE id = ?4",
        params![status.as_str(), format_ts(now), cancelled_at, id],
    )?;
    Ok(count > 0)
}
