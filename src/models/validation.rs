use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use validator::ValidationError;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Accepts RFC 3339 (any offset, normalized to UTC), a naive `YYYY-MM-DDTHH:MM:SS`
/// taken as UTC, or a bare `YYYY-MM-DD` meaning midnight UTC.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn validate_timestamp(value: &str) -> Result<(), ValidationError> {
    match parse_timestamp(value) {
        Some(_) => Ok(()),
        None => Err(error("timestamp", "invalid date, expected ISO-8601")),
    }
}

/// Guatemalan DPI: exactly 13 digits.
pub fn validate_dpi(value: &str) -> Result<(), ValidationError> {
    if value.len() == 13 && value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(error("dpi", "DPI must have 13 digits"))
    }
}

pub fn validate_license_expiry(value: &NaiveDate) -> Result<(), ValidationError> {
    if *value > Utc::now().date_naive() {
        Ok(())
    } else {
        Err(error("license_expiry", "driver's license is expired"))
    }
}

/// Plates look like `P-123456`.
pub fn validate_plate_number(value: &str) -> Result<(), ValidationError> {
    let valid = value
        .strip_prefix("P-")
        .map(|digits| digits.len() == 6 && digits.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false);
    if valid {
        Ok(())
    } else {
        Err(error("plate_number", "invalid plate format, use P-XXXXXX"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_formats() {
        let midnight = NaiveDate::from_ymd_opt(2025, 7, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2025-07-01"), Some(midnight));
        assert_eq!(parse_timestamp("2025-07-01T00:00:00Z"), Some(midnight));
        assert_eq!(parse_timestamp("2025-07-01T00:00:00.000Z"), Some(midnight));
        assert_eq!(parse_timestamp("2025-07-01T00:00:00"), Some(midnight));
        // 18:00 in Guatemala (UTC-6) is midnight UTC the next day
        assert_eq!(parse_timestamp("2025-06-30T18:00:00-06:00"), Some(midnight));
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp("tomorrow"), None);
        assert_eq!(parse_timestamp("2025-13-01"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_dpi() {
        assert!(validate_dpi("1234567890123").is_ok());
        assert!(validate_dpi("123456789012").is_err());
        assert!(validate_dpi("12345678901a3").is_err());
    }

    #[test]
    fn test_plate_number() {
        assert!(validate_plate_number("P-123456").is_ok());
        assert!(validate_plate_number("P-12345").is_err());
        assert!(validate_plate_number("X-123456").is_err());
        assert!(validate_plate_number("P-12345a").is_err());
    }

    #[test]
    fn test_license_expiry_must_be_future() {
        let today = Utc::now().date_naive();
        assert!(validate_license_expiry(&today).is_err());
        assert!(validate_license_expiry(&(today + chrono::Duration::days(30))).is_ok());
    }
}
