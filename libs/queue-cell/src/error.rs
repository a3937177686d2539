use thiserror::Error;
use uuid::Uuid;

use shared_database::DbError;
use shared_models::error::AppError;

use crate::models::QueueStatus;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Queue entry not found: {0}")]
    NotFound(Uuid),

    #[error("No patient is waiting in today's queue")]
    NobodyWaiting,

    #[error("Patient {0} is not waiting in today's queue")]
    PatientNotWaiting(Uuid),

    #[error("Invalid queue status transition from {from} to {to}")]
    InvalidStatusTransition { from: QueueStatus, to: QueueStatus },

    /// Every attempt collided with a number another writer had just taken.
    #[error("Could not assign a queue number after {attempts} attempts")]
    NumberingContention { attempts: u32 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Persistence(#[from] DbError),
}

impl From<QueueError> for AppError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::NotFound(_) | QueueError::NobodyWaiting | QueueError::PatientNotWaiting(_) => {
                AppError::NotFound(err.to_string())
            }
            QueueError::InvalidStatusTransition { .. } | QueueError::NumberingContention { .. } => {
                AppError::Conflict(err.to_string())
            }
            QueueError::Validation(msg) => AppError::ValidationError(msg),
            QueueError::Persistence(db) => AppError::from(db),
        }
    }
}
