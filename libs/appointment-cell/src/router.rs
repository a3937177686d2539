// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, patch},
    Router,
};

use crate::handlers;
use crate::services::AppointmentService;

pub fn appointment_routes(service: Arc<AppointmentService>) -> Router {
    Router::new()
        .route(
            "/",
            get(handlers::search_appointments).post(handlers::create_appointment),
        )
        .route("/today", get(handlers::get_todays_appointments))
        .route(
            "/{appointment_id}",
            get(handlers::get_appointment).patch(handlers::update_appointment),
        )
        .route("/{appointment_id}/status", patch(handlers::update_appointment_status))
        .with_state(service)
}
