use chrono::NaiveDateTime;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::VehicleRates;

/// VAT, in percent.
pub const TAX_PERCENT: i64 = 12;
pub const DEPOSIT_PERCENT: i64 = 30;
/// Longest rental quoted or booked in one go.
pub const MAX_RENTAL_DAYS: i64 = 365;

/// A validated rental window. Always spans at least one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RentalPeriod {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl RentalPeriod {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, AppError> {
        if end <= start {
            return Err(AppError::validation(
                "end_date",
                "end date must be after start date",
            ));
        }
        let period = Self { start, end };
        if period.total_days() < 1 {
            return Err(AppError::validation(
                "end_date",
                "rental must span at least one calendar day",
            ));
        }
        if period.total_days() > MAX_RENTAL_DAYS {
            return Err(AppError::validation(
                "end_date",
                format!("rental cannot exceed {MAX_RENTAL_DAYS} days"),
            ));
        }
        Ok(period)
    }

    /// Calendar days between the two dates; times of day are ignored.
    pub fn total_days(&self) -> i64 {
        (self.end.date() - self.start.date()).num_days()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub daily_rate: i64,
    pub total_days: i64,
    pub subtotal: i64,
    pub tax: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateTier {
    OneToTwoDays,
    ThreeToSixDays,
    Weekly,
    Monthly,
}

impl RateTier {
    pub fn for_days(total_days: i64) -> Self {
        match total_days {
            i64::MIN..=2 => RateTier::OneToTwoDays,
            3..=6 => RateTier::ThreeToSixDays,
            7..=13 => RateTier::Weekly,
            _ => RateTier::Monthly,
        }
    }
}

pub fn daily_rate_for(rates: &VehicleRates, total_days: i64) -> i64 {
    match RateTier::for_days(total_days) {
        RateTier::OneToTwoDays => rates.daily_rate_1_2,
        RateTier::ThreeToSixDays => rates.daily_rate_3_6,
        RateTier::Weekly => rates.weekly_rate,
        RateTier::Monthly => rates.monthly_rate,
    }
}

/// `percent`% of `amount`, rounded half-up to the nearest centavo.
fn percent_of(amount: i64, percent: i64) -> i64 {
    (amount * percent + 50) / 100
}

pub fn tax_for(subtotal: i64) -> i64 {
    percent_of(subtotal, TAX_PERCENT)
}

pub fn deposit_for(total: i64) -> i64 {
    percent_of(total, DEPOSIT_PERCENT)
}

pub fn calculate_price(rates: &VehicleRates, period: &RentalPeriod) -> PriceQuote {
    let total_days = period.total_days();
    let daily_rate = daily_rate_for(rates, total_days);
    let subtotal = daily_rate * total_days;
    let tax = tax_for(subtotal);
    PriceQuote {
        daily_rate,
        total_days,
        subtotal,
        tax,
        total: subtotal + tax,
    }
}
