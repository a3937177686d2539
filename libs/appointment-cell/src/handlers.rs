// libs/appointment-cell/src/handlers.rs
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
    AppointmentSearchQuery, CreateAppointmentRequest, UpdateAppointmentRequest,
    UpdateAppointmentStatusRequest,
};
use crate::services::AppointmentService;

// ==============================================================================
// APPOINTMENT BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_appointment(
    State(service): State<Arc<AppointmentService>>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let appointment = service.create_appointment(request).await?;

    Ok((StatusCode::CREATED, Json(json!(appointment))))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(service): State<Arc<AppointmentService>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = service.get_appointment(appointment_id).await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn search_appointments(
    State(service): State<Arc<AppointmentService>>,
    Query(query): Query<AppointmentSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = service.search_appointments(&query).await?;

    Ok(Json(json!(appointments)))
}

#[axum::debug_handler]
pub async fn get_todays_appointments(
    State(service): State<Arc<AppointmentService>>,
) -> Result<Json<Value>, AppError> {
    let appointments = service.todays_appointments().await?;

    Ok(Json(json!(appointments)))
}

// ==============================================================================
// APPOINTMENT MANAGEMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn update_appointment(
    State(service): State<Arc<AppointmentService>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = service.update_appointment(appointment_id, request).await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(service): State<Arc<AppointmentService>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateAppointmentStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = service.update_status(appointment_id, request.status).await?;

    Ok(Json(json!(appointment)))
}
