use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use doctor_cell::{DoctorStore, DoctorSummary};
use patient_cell::{PatientStore, PatientSummary};
use shared_database::supabase::{eq, filter, timestamp};
use shared_database::{DbError, MemoryTable, SupabaseClient};
use shared_utils::DayWindow;

use crate::models::{QueueEntry, QueueEntryDetails};

/// Persistence collaborator for queue entries.
///
/// Implementations must reject an insert whose `(queue_day, queue_number)`
/// is already taken with [`DbError::Conflict`]; the sequencer relies on that
/// to retry numbering.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// The entry with the highest queue number created inside `window`.
    async fn latest_in_window(&self, window: &DayWindow) -> Result<Option<QueueEntry>, DbError>;

    async fn insert(&self, entry: QueueEntry) -> Result<QueueEntry, DbError>;

    async fn get(&self, id: Uuid) -> Result<Option<QueueEntry>, DbError>;

    /// Like `get`, with the patient and doctor summaries embedded.
    async fn get_detailed(&self, id: Uuid) -> Result<Option<QueueEntryDetails>, DbError>;

    /// Entries created inside `window`, ordered by queue number ascending.
    async fn list_in_window(&self, window: &DayWindow) -> Result<Vec<QueueEntry>, DbError>;

    async fn list_detailed_in_window(&self, window: &DayWindow) -> Result<Vec<QueueEntryDetails>, DbError>;

    /// Persists the mutable fields of an existing entry.
    async fn save(&self, entry: &QueueEntry) -> Result<QueueEntry, DbError>;
}

/// Process-local queue table. Without a directory the detailed reads carry
/// no patient or doctor summaries.
#[derive(Default)]
pub struct InMemoryQueueStore {
    table: MemoryTable<QueueEntry>,
    patients: Option<Arc<dyn PatientStore>>,
    doctors: Option<Arc<dyn DoctorStore>>,
}

impl InMemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves embedded patients and doctors through the given stores.
    pub fn with_directory(patients: Arc<dyn PatientStore>, doctors: Arc<dyn DoctorStore>) -> Self {
        Self {
            table: MemoryTable::new(),
            patients: Some(patients),
            doctors: Some(doctors),
        }
    }

    async fn join(&self, entry: QueueEntry) -> Result<QueueEntryDetails, DbError> {
        let patient = match &self.patients {
            Some(patients) => patients.get(entry.patient_id).await?.as_ref().map(PatientSummary::from),
            None => None,
        };
        let doctor = match (&self.doctors, entry.doctor_id) {
            (Some(doctors), Some(doctor_id)) => doctors.get(doctor_id).await?.as_ref().map(DoctorSummary::from),
            _ => None,
        };

        Ok(QueueEntryDetails { entry, patient, doctor })
    }
}

fn same_slot(existing: &QueueEntry, candidate: &QueueEntry) -> Option<String> {
    (existing.queue_day == candidate.queue_day && existing.queue_number == candidate.queue_number).then(|| {
        format!(
            "queue number {} already issued for {}",
            candidate.queue_number, candidate.queue_day
        )
    })
}

#[async_trait]
impl QueueStore for InMemoryQueueStore {
    async fn latest_in_window(&self, window: &DayWindow) -> Result<Option<QueueEntry>, DbError> {
        let entries = self.table.find(|e| window.contains(e.created_at)).await;
        Ok(entries.into_iter().max_by_key(|e| e.queue_number))
    }

    async fn insert(&self, entry: QueueEntry) -> Result<QueueEntry, DbError> {
        self.table.insert_unique(entry.id, entry, same_slot).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<QueueEntry>, DbError> {
        Ok(self.table.get(id).await)
    }

    async fn get_detailed(&self, id: Uuid) -> Result<Option<QueueEntryDetails>, DbError> {
        match self.table.get(id).await {
            Some(entry) => Ok(Some(self.join(entry).await?)),
            None => Ok(None),
        }
    }

    async fn list_in_window(&self, window: &DayWindow) -> Result<Vec<QueueEntry>, DbError> {
        let mut entries = self.table.find(|e| window.contains(e.created_at)).await;
        entries.sort_by_key(|e| e.queue_number);
        Ok(entries)
    }

    async fn list_detailed_in_window(&self, window: &DayWindow) -> Result<Vec<QueueEntryDetails>, DbError> {
        let mut detailed = Vec::new();
        for entry in self.list_in_window(window).await? {
            detailed.push(self.join(entry).await?);
        }
        Ok(detailed)
    }

    async fn save(&self, entry: &QueueEntry) -> Result<QueueEntry, DbError> {
        self.table
            .update(entry.id, |row| *row = entry.clone())
            .await?
            .ok_or_else(|| DbError::NotFound(format!("queue entry {}", entry.id)))
    }
}

const TABLE: &str = "queue_entries";

/// `queue_entries` table behind PostgREST. The table needs a unique index on
/// `(queue_day, queue_number)` so concurrent writers surface as HTTP 409.
#[derive(Clone)]
pub struct SupabaseQueueStore {
    client: SupabaseClient,
}

impl SupabaseQueueStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Resource embedding for the `patient_id` and `doctor_id` foreign keys.
    fn embed_people() -> String {
        format!(
            "select=*,patient:patients({}),doctor:doctors({})",
            PatientSummary::COLUMNS,
            DoctorSummary::COLUMNS
        )
    }

    fn window_filter(window: &DayWindow) -> String {
        format!(
            "{}&{}",
            filter("created_at", "gte", timestamp(window.start)),
            filter("created_at", "lt", timestamp(window.end)),
        )
    }
}

#[async_trait]
impl QueueStore for SupabaseQueueStore {
    async fn latest_in_window(&self, window: &DayWindow) -> Result<Option<QueueEntry>, DbError> {
        debug!("Fetching highest queue number for {}", window.day);
        let query = format!("{}&order=queue_number.desc&limit=1", Self::window_filter(window));
        self.client.select_one(TABLE, &query).await
    }

    async fn insert(&self, entry: QueueEntry) -> Result<QueueEntry, DbError> {
        self.client.insert(TABLE, &entry).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<QueueEntry>, DbError> {
        self.client.select_one(TABLE, &eq("id", id)).await
    }

    async fn get_detailed(&self, id: Uuid) -> Result<Option<QueueEntryDetails>, DbError> {
        let query = format!("{}&{}", Self::embed_people(), eq("id", id));
        self.client.select_one(TABLE, &query).await
    }

    async fn list_in_window(&self, window: &DayWindow) -> Result<Vec<QueueEntry>, DbError> {
        let query = format!("{}&order=queue_number.asc", Self::window_filter(window));
        self.client.select(TABLE, &query).await
    }

    async fn list_detailed_in_window(&self, window: &DayWindow) -> Result<Vec<QueueEntryDetails>, DbError> {
        let query = format!(
            "{}&{}&order=queue_number.asc",
            Self::embed_people(),
            Self::window_filter(window)
        );
        self.client.select(TABLE, &query).await
    }

    async fn save(&self, entry: &QueueEntry) -> Result<QueueEntry, DbError> {
        let patch = json!({
            "status": entry.status,
            "priority": entry.priority,
            "doctor_id": entry.doctor_id,
            "notes": entry.notes,
            "called_at": entry.called_at,
            "completed_at": entry.completed_at,
            "updated_at": entry.updated_at,
        });

        self.client
            .update(TABLE, &eq("id", entry.id), patch)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("queue entry {}", entry.id)))
    }
}
