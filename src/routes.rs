use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/vehicles", get(handlers::vehicles::list_vehicles))
        .route(
            "/api/vehicles/available",
            get(handlers::vehicles::available_vehicles),
        )
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route("/api/bookings/:id", get(handlers::bookings::get_booking))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/admin/bookings", get(handlers::admin::list_bookings))
        .route(
            "/api/admin/bookings/:id/status",
            patch(handlers::admin::update_booking_status),
        )
        .route(
            "/api/admin/vehicles",
            get(handlers::admin::list_fleet).post(handlers::admin::create_vehicle),
        )
        .route(
            "/api/admin/vehicles/:id",
            get(handlers::admin::get_vehicle)
                .patch(handlers::admin::update_vehicle)
                .delete(handlers::admin::retire_vehicle),
        )
        .route(
            "/api/admin/vehicles/:id/status",
            post(handlers::admin::set_vehicle_status),
        )
        .route(
            "/api/admin/vehicles/:id/check-deletable",
            get(handlers::admin::check_deletable),
        )
        .with_state(state)
}
