pub mod booking;
pub mod customer;
pub mod validation;
pub mod vehicle;

pub use booking::{
    Booking, BookingDetails, BookingRequest, BookingStatus, NewBooking, PaymentStatus,
    StatusChangeRequest,
};
pub use customer::{Customer, CustomerInput};
pub use vehicle::{
    FleetEntry, FuelType, Transmission, UpcomingBooking, Vehicle, VehicleCategory, VehicleDetail,
    VehicleInput, VehicleRates, VehicleStatus, VehicleStatusRequest, VehicleUpdate,
};
