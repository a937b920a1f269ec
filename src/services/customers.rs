use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Customer, CustomerInput};

/// Creates the customer or overwrites the stored profile for this email.
/// Previous field values are discarded, not merged; the email never changes.
pub fn upsert_customer(conn: &Connection, input: &CustomerInput) -> Result<Customer, AppError> {
    let id = queries::upsert_customer(conn, input)?;
    let customer = queries::get_customer(conn, id)?
        .ok_or_else(|| anyhow::anyhow!("customer {id} missing right after upsert"))?;
    tracing::debug!(customer_id = id, "customer upserted");
    Ok(customer)
}
