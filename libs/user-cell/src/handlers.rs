use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::CreateUserRequest;
use crate::services::UserService;

#[axum::debug_handler]
pub async fn create_user(
    State(service): State<Arc<UserService>>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let user = service.create_user(request).await?;

    Ok((StatusCode::CREATED, Json(json!(user))))
}

#[axum::debug_handler]
pub async fn list_users(
    State(service): State<Arc<UserService>>,
) -> Result<Json<Value>, AppError> {
    let users = service.list_users().await?;

    Ok(Json(json!(users)))
}

#[axum::debug_handler]
pub async fn get_user(
    State(service): State<Arc<UserService>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let user = service.get_user(user_id).await?;

    Ok(Json(json!(user)))
}
