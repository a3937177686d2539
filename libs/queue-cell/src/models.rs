use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use uuid::Uuid;

use doctor_cell::DoctorSummary;
use patient_cell::PatientSummary;

// ==============================================================================
// CORE QUEUE MODELS
// ==============================================================================

/// A walk-in patient's place in the day's waiting line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueEntry {
    pub id: Uuid,
    /// Position label, unique within `queue_day`.
    pub queue_number: i32,
    /// Clinic-local day the number was issued for.
    pub queue_day: NaiveDate,
    pub status: QueueStatus,
    pub priority: Priority,
    pub notes: Option<String>,
    pub patient_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub user_id: Uuid,
    pub called_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QueueEntry {
    pub fn new(
        request: &CreateQueueEntryRequest,
        queue_day: NaiveDate,
        queue_number: i32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            queue_number,
            queue_day,
            status: QueueStatus::Waiting,
            priority: request.priority,
            notes: request.notes.clone(),
            patient_id: request.patient_id,
            doctor_id: request.doctor_id,
            user_id: request.user_id,
            called_at: None,
            completed_at: None,
            created_at,
            updated_at: created_at,
        }
    }
}

/// A queue entry as the front-desk board reads it, with the patient and
/// the assigned doctor embedded next to their ids.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueEntryDetails {
    #[serde(flatten)]
    pub entry: QueueEntry,
    #[serde(default)]
    pub patient: Option<PatientSummary>,
    #[serde(default)]
    pub doctor: Option<DoctorSummary>,
}

impl Deref for QueueEntryDetails {
    type Target = QueueEntry;

    fn deref(&self) -> &QueueEntry {
        &self.entry
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Waiting,
    WithDoctor,
    Completed,
    Cancelled,
}

impl QueueStatus {
    /// Statuses reachable from `self` in one step.
    pub fn allowed_transitions(&self) -> &'static [QueueStatus] {
        match self {
            QueueStatus::Waiting => &[QueueStatus::WithDoctor, QueueStatus::Cancelled],
            // Waiting again is the "hold" move: the patient steps back into line.
            QueueStatus::WithDoctor => &[
                QueueStatus::Completed,
                QueueStatus::Cancelled,
                QueueStatus::Waiting,
            ],
            QueueStatus::Completed | QueueStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: QueueStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueStatus::Waiting => write!(f, "waiting"),
            QueueStatus::WithDoctor => write!(f, "with_doctor"),
            QueueStatus::Completed => write!(f, "completed"),
            QueueStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Urgency tag. Advisory only: it never changes numbering or call order.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Normal => write!(f, "normal"),
            Priority::High => write!(f, "high"),
            Priority::Urgent => write!(f, "urgent"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQueueEntryRequest {
    pub patient_id: Uuid,
    pub user_id: Uuid,
    pub doctor_id: Option<Uuid>,
    #[serde(default)]
    pub priority: Priority,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateQueueStatusRequest {
    pub status: QueueStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateQueuePriorityRequest {
    pub priority: Priority,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallNextRequest {
    pub doctor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueListQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueuePosition {
    pub entry_id: Uuid,
    pub patient_id: Uuid,
    pub queue_number: i32,
    /// 1 means "next to be called".
    pub position: usize,
    pub waiting_ahead: usize,
    pub estimated_wait_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueStats {
    pub day: NaiveDate,
    pub total: usize,
    pub waiting: usize,
    pub with_doctor: usize,
    pub completed: usize,
    pub cancelled: usize,
    /// Urgent entries that are still waiting or with a doctor.
    pub urgent_active: usize,
}

impl QueueStats {
    pub fn from_entries(day: NaiveDate, entries: &[QueueEntry]) -> Self {
        let count = |status: QueueStatus| entries.iter().filter(|e| e.status == status).count();

        Self {
            day,
            total: entries.len(),
            waiting: count(QueueStatus::Waiting),
            with_doctor: count(QueueStatus::WithDoctor),
            completed: count(QueueStatus::Completed),
            cancelled: count(QueueStatus::Cancelled),
            urgent_active: entries
                .iter()
                .filter(|e| e.priority == Priority::Urgent && !e.status.is_terminal())
                .count(),
        }
    }
}
