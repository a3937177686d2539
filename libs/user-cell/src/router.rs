use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers::*;
use crate::services::UserService;

pub fn user_routes(service: Arc<UserService>) -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{user_id}", get(get_user))
        .with_state(service)
}
