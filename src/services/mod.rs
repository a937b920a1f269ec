pub mod availability;
pub mod booking;
pub mod customers;
pub mod fleet;
pub mod pricing;
pub mod rate_limit;
pub mod session;
pub mod status;
