use std::sync::Arc;

use axum::{
    routing::{get, put},
    Router,
};

use crate::handlers::*;
use crate::services::DoctorService;

pub fn doctor_routes(service: Arc<DoctorService>) -> Router {
    Router::new()
        .route("/", get(list_doctors).post(create_doctor))
        .route("/search", get(search_doctors))
        .route(
            "/{doctor_id}",
            get(get_doctor).put(update_doctor).delete(delete_doctor),
        )
        .route("/{doctor_id}/status", put(update_doctor_status))
        .with_state(service)
}
