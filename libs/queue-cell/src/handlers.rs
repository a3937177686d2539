use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{
    CallNextRequest, CreateQueueEntryRequest, QueueListQuery, UpdateQueuePriorityRequest,
    UpdateQueueStatusRequest,
};
use crate::services::DailyQueueSequencer;

#[axum::debug_handler]
pub async fn get_queue(
    State(sequencer): State<Arc<DailyQueueSequencer>>,
    Query(query): Query<QueueListQuery>,
) -> Result<Json<Value>, AppError> {
    let entries = match query.date {
        Some(day) => sequencer.list_queue_for_day(day).await?,
        None => sequencer.list_todays_queue().await?,
    };

    Ok(Json(json!(entries)))
}

#[axum::debug_handler]
pub async fn add_to_queue(
    State(sequencer): State<Arc<DailyQueueSequencer>>,
    Json(request): Json<CreateQueueEntryRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let entry = sequencer.enqueue(request).await?;

    Ok((StatusCode::CREATED, Json(json!(entry))))
}

#[axum::debug_handler]
pub async fn get_queue_entry(
    State(sequencer): State<Arc<DailyQueueSequencer>>,
    Path(entry_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let entry = sequencer.get(entry_id).await?;

    Ok(Json(json!(entry)))
}

#[axum::debug_handler]
pub async fn update_queue_status(
    State(sequencer): State<Arc<DailyQueueSequencer>>,
    Path(entry_id): Path<Uuid>,
    Json(request): Json<UpdateQueueStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let entry = sequencer.transition_queue_status(entry_id, request.status).await?;

    Ok(Json(json!(entry)))
}

#[axum::debug_handler]
pub async fn update_queue_priority(
    State(sequencer): State<Arc<DailyQueueSequencer>>,
    Path(entry_id): Path<Uuid>,
    Json(request): Json<UpdateQueuePriorityRequest>,
) -> Result<Json<Value>, AppError> {
    let entry = sequencer.update_priority(entry_id, request.priority).await?;

    Ok(Json(json!(entry)))
}

#[axum::debug_handler]
pub async fn call_next_patient(
    State(sequencer): State<Arc<DailyQueueSequencer>>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    // The body is optional: an empty POST calls the next patient for any doctor.
    let request: CallNextRequest = if body.is_empty() {
        CallNextRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::BadRequest(e.to_string()))?
    };
    let entry = sequencer.call_next(request.doctor_id).await?;

    Ok(Json(json!(entry)))
}

#[axum::debug_handler]
pub async fn remove_from_queue(
    State(sequencer): State<Arc<DailyQueueSequencer>>,
    Path(entry_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let entry = sequencer.remove(entry_id).await?;

    Ok(Json(json!(entry)))
}

#[axum::debug_handler]
pub async fn get_queue_position(
    State(sequencer): State<Arc<DailyQueueSequencer>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let position = sequencer.queue_position(patient_id).await?;

    Ok(Json(json!(position)))
}

#[axum::debug_handler]
pub async fn get_queue_stats(
    State(sequencer): State<Arc<DailyQueueSequencer>>,
) -> Result<Json<Value>, AppError> {
    let stats = sequencer.stats().await?;

    Ok(Json(json!(stats)))
}
