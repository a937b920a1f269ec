use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::customer::{Customer, CustomerInput};
use crate::models::validation::validate_timestamp;
use crate::models::vehicle::Vehicle;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub vehicle_id: i64,
    pub customer_id: i64,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub total_days: i64,
    pub daily_rate_applied: i64,
    pub subtotal: i64,
    pub tax_amount: i64,
    pub total_amount: i64,
    pub deposit_amount: i64,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub special_requests: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub cancelled_at: Option<NaiveDateTime>,
}

/// A booking with its customer and vehicle, as shown on confirmation and
/// admin detail views.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    pub booking: Booking,
    pub customer: Customer,
    pub vehicle: Vehicle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    Pendiente,
    Confirmado,
    Activo,
    Completado,
    Cancelado,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pendiente,
        BookingStatus::Confirmado,
        BookingStatus::Activo,
        BookingStatus::Completado,
        BookingStatus::Cancelado,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pendiente => "PENDIENTE",
            BookingStatus::Confirmado => "CONFIRMADO",
            BookingStatus::Activo => "ACTIVO",
            BookingStatus::Completado => "COMPLETADO",
            BookingStatus::Cancelado => "CANCELADO",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDIENTE" => Some(BookingStatus::Pendiente),
            "CONFIRMADO" => Some(BookingStatus::Confirmado),
            "ACTIVO" => Some(BookingStatus::Activo),
            "COMPLETADO" => Some(BookingStatus::Completado),
            "CANCELADO" => Some(BookingStatus::Cancelado),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recorded for the back office only; no transition depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pendiente,
    Parcial,
    Pagado,
    Reembolsado,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pendiente => "PENDIENTE",
            PaymentStatus::Parcial => "PARCIAL",
            PaymentStatus::Pagado => "PAGADO",
            PaymentStatus::Reembolsado => "REEMBOLSADO",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDIENTE" => Some(PaymentStatus::Pendiente),
            "PARCIAL" => Some(PaymentStatus::Parcial),
            "PAGADO" => Some(PaymentStatus::Pagado),
            "REEMBOLSADO" => Some(PaymentStatus::Reembolsado),
            _ => None,
        }
    }
}

/// Body of `POST /api/bookings`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BookingRequest {
    #[validate(range(min = 1, message = "invalid vehicle id"))]
    pub vehicle_id: i64,

    #[validate(custom = "validate_timestamp")]
    pub start_date: String,

    #[validate(custom = "validate_timestamp")]
    pub end_date: String,

    #[validate]
    pub customer: CustomerInput,

    #[validate(length(min = 5, message = "pickup location is required"))]
    pub pickup_location: String,

    #[validate(length(min = 5, message = "dropoff location is too short"))]
    pub dropoff_location: Option<String>,

    #[validate(length(max = 1000, message = "special requests are too long"))]
    pub special_requests: Option<String>,
}

/// A reservation request that passed boundary validation, with its
/// timestamps resolved to UTC.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub vehicle_id: i64,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub customer: CustomerInput,
    pub pickup_location: String,
    pub dropoff_location: Option<String>,
    pub special_requests: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StatusChangeRequest {
    pub status: String,
}
