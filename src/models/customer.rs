use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::validation::{validate_dpi, validate_license_expiry};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub dpi: String,
    pub license_number: String,
    pub license_expiry: NaiveDate,
    pub address: Option<String>,
    pub city: Option<String>,
    pub department: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Contact and identity fields submitted with a booking. The email is the
/// lookup key; every other field replaces what is stored.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CustomerInput {
    #[validate(length(min = 2, message = "first name must have at least 2 characters"))]
    pub first_name: String,

    #[validate(length(min = 2, message = "last name must have at least 2 characters"))]
    pub last_name: String,

    #[validate(email(message = "invalid email"))]
    pub email: String,

    #[validate(length(min = 8, message = "invalid phone number"))]
    pub phone: String,

    #[validate(custom = "validate_dpi")]
    pub dpi: String,

    #[validate(length(min = 5, message = "invalid license number"))]
    pub license_number: String,

    #[validate(custom = "validate_license_expiry")]
    pub license_expiry: NaiveDate,

    pub address: Option<String>,
    pub city: Option<String>,
    pub department: Option<String>,
}
