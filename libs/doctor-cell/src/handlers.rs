use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{
    CreateDoctorRequest, DoctorSearchFilters, UpdateDoctorRequest, UpdateDoctorStatusRequest,
};
use crate::services::DoctorService;

// ==============================================================================
// DOCTOR PROFILE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_doctor(
    State(service): State<Arc<DoctorService>>,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let doctor = service.create_doctor(request).await?;

    Ok((StatusCode::CREATED, Json(json!(doctor))))
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(service): State<Arc<DoctorService>>,
) -> Result<Json<Value>, AppError> {
    let doctors = service.list_doctors().await?;

    Ok(Json(json!(doctors)))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(service): State<Arc<DoctorService>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let doctor = service.get_doctor(doctor_id).await?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(service): State<Arc<DoctorService>>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor = service.update_doctor(doctor_id, request).await?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(service): State<Arc<DoctorService>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    service.delete_doctor(doctor_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// SEARCH AND STATUS HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn search_doctors(
    State(service): State<Arc<DoctorService>>,
    Query(filters): Query<DoctorSearchFilters>,
) -> Result<Json<Value>, AppError> {
    let doctors = service.search_doctors(&filters).await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn update_doctor_status(
    State(service): State<Arc<DoctorService>>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<UpdateDoctorStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor = service.update_status(doctor_id, request.status).await?;

    Ok(Json(json!(doctor)))
}
