use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::booking::BookingStatus;
use crate::models::validation::validate_plate_number;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: i64,
    pub plate_number: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub category: VehicleCategory,
    #[serde(flatten)]
    pub rates: VehicleRates,
    pub transmission: Transmission,
    pub fuel_type: FuelType,
    pub passenger_capacity: i32,
    #[serde(rename = "hasAC")]
    pub has_ac: bool,
    #[serde(rename = "hasGPS")]
    pub has_gps: bool,
    pub image_url: Option<String>,
    pub status: VehicleStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Highest per-day rate accepted, in centavos.
pub const MAX_DAILY_RATE: i64 = 100_000_000;

/// Per-day prices in centavos, one per rental-length tier. The weekly and
/// monthly tiers are still charged per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleRates {
    #[serde(rename = "dailyRate1_2")]
    pub daily_rate_1_2: i64,
    #[serde(rename = "dailyRate3_6")]
    pub daily_rate_3_6: i64,
    #[serde(rename = "weeklyRate")]
    pub weekly_rate: i64,
    #[serde(rename = "monthlyRate")]
    pub monthly_rate: i64,
}

impl VehicleRates {
    /// Longer tiers must never cost more per day than shorter ones.
    pub fn is_non_increasing(&self) -> bool {
        self.daily_rate_1_2 >= self.daily_rate_3_6
            && self.daily_rate_3_6 >= self.weekly_rate
            && self.weekly_rate >= self.monthly_rate
    }
}

/// Body of `POST /api/admin/vehicles`. New vehicles always start `DISPONIBLE`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VehicleInput {
    #[validate(custom = "validate_plate_number")]
    pub plate_number: String,

    #[validate(length(min = 2, message = "brand is required"))]
    pub brand: String,

    #[validate(length(min = 1, message = "model is required"))]
    pub model: String,

    #[validate(range(min = 2020, message = "minimum year is 2020"))]
    pub year: i32,

    pub category: VehicleCategory,

    #[serde(rename = "dailyRate1_2")]
    #[validate(range(
        min = 1,
        max = 100000000,
        message = "rate must be between 1 and 100000000 centavos"
    ))]
    pub daily_rate_1_2: i64,

    #[serde(rename = "dailyRate3_6")]
    #[validate(range(
        min = 1,
        max = 100000000,
        message = "rate must be between 1 and 100000000 centavos"
    ))]
    pub daily_rate_3_6: i64,

    #[validate(range(
        min = 1,
        max = 100000000,
        message = "rate must be between 1 and 100000000 centavos"
    ))]
    pub weekly_rate: i64,

    #[validate(range(
        min = 1,
        max = 100000000,
        message = "rate must be between 1 and 100000000 centavos"
    ))]
    pub monthly_rate: i64,

    pub transmission: Transmission,
    pub fuel_type: FuelType,

    #[validate(range(min = 2, max = 15, message = "capacity must be between 2 and 15"))]
    pub passenger_capacity: i32,

    #[serde(rename = "hasAC")]
    pub has_ac: bool,

    #[serde(rename = "hasGPS")]
    pub has_gps: bool,

    #[validate(url(message = "invalid image url"))]
    pub image_url: Option<String>,
}

impl VehicleInput {
    pub fn rates(&self) -> VehicleRates {
        VehicleRates {
            daily_rate_1_2: self.daily_rate_1_2,
            daily_rate_3_6: self.daily_rate_3_6,
            weekly_rate: self.weekly_rate,
            monthly_rate: self.monthly_rate,
        }
    }
}

/// Body of `PATCH /api/admin/vehicles/:id`. Absent fields keep their value.
/// Lifecycle status is changed through its own endpoint, never here.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VehicleUpdate {
    #[validate(custom = "validate_plate_number")]
    pub plate_number: Option<String>,

    #[validate(length(min = 2, message = "brand is required"))]
    pub brand: Option<String>,

    #[validate(length(min = 1, message = "model is required"))]
    pub model: Option<String>,

    #[validate(range(min = 2020, message = "minimum year is 2020"))]
    pub year: Option<i32>,

    pub category: Option<VehicleCategory>,

    #[serde(rename = "dailyRate1_2")]
    #[validate(range(
        min = 1,
        max = 100000000,
        message = "rate must be between 1 and 100000000 centavos"
    ))]
    pub daily_rate_1_2: Option<i64>,

    #[serde(rename = "dailyRate3_6")]
    #[validate(range(
        min = 1,
        max = 100000000,
        message = "rate must be between 1 and 100000000 centavos"
    ))]
    pub daily_rate_3_6: Option<i64>,

    #[validate(range(
        min = 1,
        max = 100000000,
        message = "rate must be between 1 and 100000000 centavos"
    ))]
    pub weekly_rate: Option<i64>,

    #[validate(range(
        min = 1,
        max = 100000000,
        message = "rate must be between 1 and 100000000 centavos"
    ))]
    pub monthly_rate: Option<i64>,

    pub transmission: Option<Transmission>,
    pub fuel_type: Option<FuelType>,

    #[validate(range(min = 2, max = 15, message = "capacity must be between 2 and 15"))]
    pub passenger_capacity: Option<i32>,

    #[serde(rename = "hasAC")]
    pub has_ac: Option<bool>,

    #[serde(rename = "hasGPS")]
    pub has_gps: Option<bool>,

    #[validate(url(message = "invalid image url"))]
    pub image_url: Option<String>,
}

impl VehicleUpdate {
    pub fn apply_to(&self, vehicle: &mut Vehicle) {
        if let Some(v) = &self.plate_number {
            vehicle.plate_number = v.clone();
        }
        if let Some(v) = &self.brand {
            vehicle.brand = v.clone();
        }
        if let Some(v) = &self.model {
            vehicle.model = v.clone();
        }
        if let Some(v) = self.year {
            vehicle.year = v;
        }
        if let Some(v) = self.category {
            vehicle.category = v;
        }
        if let Some(v) = self.daily_rate_1_2 {
            vehicle.rates.daily_rate_1_2 = v;
        }
        if let Some(v) = self.daily_rate_3_6 {
            vehicle.rates.daily_rate_3_6 = v;
        }
        if let Some(v) = self.weekly_rate {
            vehicle.rates.weekly_rate = v;
        }
        if let Some(v) = self.monthly_rate {
            vehicle.rates.monthly_rate = v;
        }
        if let Some(v) = self.transmission {
            vehicle.transmission = v;
        }
        if let Some(v) = self.fuel_type {
            vehicle.fuel_type = v;
        }
        if let Some(v) = self.passenger_capacity {
            vehicle.passenger_capacity = v;
        }
        if let Some(v) = self.has_ac {
            vehicle.has_ac = v;
        }
        if let Some(v) = self.has_gps {
            vehicle.has_gps = v;
        }
        if let Some(v) = &self.image_url {
            vehicle.image_url = Some(v.clone());
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VehicleStatusRequest {
    pub status: String,
}

/// Nearest non-finished booking of a vehicle, for the fleet table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingBooking {
    pub id: i64,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub status: BookingStatus,
    pub customer_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetEntry {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    pub next_booking: Option<UpcomingBooking>,
    pub booking_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDetail {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    pub booking_count: i64,
    pub active_bookings: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VehicleCategory {
    Economico,
    Suv,
    Lujo,
    Van,
}

impl VehicleCategory {
    pub const ALL: [VehicleCategory; 4] = [
        VehicleCategory::Economico,
        VehicleCategory::Suv,
        VehicleCategory::Lujo,
        VehicleCategory::Van,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleCategory::Economico => "ECONOMICO",
            VehicleCategory::Suv => "SUV",
            VehicleCategory::Lujo => "LUJO",
            VehicleCategory::Van => "VAN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ECONOMICO" => Some(VehicleCategory::Economico),
            "SUV" => Some(VehicleCategory::Suv),
            "LUJO" => Some(VehicleCategory::Lujo),
            "VAN" => Some(VehicleCategory::Van),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Transmission {
    Manual,
    Automatica,
}

impl Transmission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transmission::Manual => "MANUAL",
            Transmission::Automatica => "AUTOMATICA",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MANUAL" => Some(Transmission::Manual),
            "AUTOMATICA" => Some(Transmission::Automatica),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FuelType {
    Gasolina,
    Diesel,
    Hibrido,
    Electrico,
}

impl FuelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Gasolina => "GASOLINA",
            FuelType::Diesel => "DIESEL",
            FuelType::Hibrido => "HIBRIDO",
            FuelType::Electrico => "ELECTRICO",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "GASOLINA" => Some(FuelType::Gasolina),
            "DIESEL" => Some(FuelType::Diesel),
            "HIBRIDO" => Some(FuelType::Hibrido),
            "ELECTRICO" => Some(FuelType::Electrico),
            _ => None,
        }
    }
}

/// Lifecycle of a fleet unit. Only `Disponible` vehicles are offered for booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VehicleStatus {
    Disponible,
    Rentado,
    Mantenimiento,
    Retirado,
}

impl VehicleStatus {
    pub const ALL: [VehicleStatus; 4] = [
        VehicleStatus::Disponible,
        VehicleStatus::Rentado,
        VehicleStatus::Mantenimiento,
        VehicleStatus::Retirado,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Disponible => "DISPONIBLE",
            VehicleStatus::Rentado => "RENTADO",
            VehicleStatus::Mantenimiento => "MANTENIMIENTO",
            VehicleStatus::Retirado => "RETIRADO",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DISPONIBLE" => Some(VehicleStatus::Disponible),
            "RENTADO" => Some(VehicleStatus::Rentado),
            "MANTENIMIENTO" => Some(VehicleStatus::Mantenimiento),
            "RETIRADO" => Some(VehicleStatus::Retirado),
            _ => None,
        }
    }
}
