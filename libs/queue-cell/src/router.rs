use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::handlers;
use crate::services::DailyQueueSequencer;

pub fn queue_routes(sequencer: Arc<DailyQueueSequencer>) -> Router {
    Router::new()
        .route("/", get(handlers::get_queue).post(handlers::add_to_queue))
        .route("/call-next", post(handlers::call_next_patient))
        .route("/stats", get(handlers::get_queue_stats))
        .route("/position/{patient_id}", get(handlers::get_queue_position))
        .route(
            "/{entry_id}",
            get(handlers::get_queue_entry).delete(handlers::remove_from_queue),
        )
        .route("/{entry_id}/status", patch(handlers::update_queue_status))
        .route("/{entry_id}/priority", patch(handlers::update_queue_priority))
        .with_state(sequencer)
}
