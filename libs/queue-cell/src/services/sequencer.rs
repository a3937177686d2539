use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::DbError;
use shared_utils::{Clock, DayWindow};

use crate::error::QueueError;
use crate::models::{
    CreateQueueEntryRequest, Priority, QueueEntry, QueueEntryDetails, QueuePosition, QueueStats,
    QueueStatus,
};
use crate::services::lifecycle::apply_status;
use crate::services::store::QueueStore;

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_AVERAGE_CONSULTATION_MINUTES: i64 = 15;

/// Issues day-scoped queue numbers and drives queue entries through their
/// status machine.
///
/// Numbering is protected twice: every mutation in this process runs inside
/// `write_lock`, and the store's `(queue_day, queue_number)` uniqueness check
/// catches writers in other processes, in which case the number is recomputed
/// and the insert retried up to `max_attempts` times.
pub struct DailyQueueSequencer {
    store: Arc<dyn QueueStore>,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
    max_attempts: u32,
    average_consultation_minutes: i64,
    write_lock: Mutex<()>,
}

impl DailyQueueSequencer {
    pub fn new(store: Arc<dyn QueueStore>, clock: Arc<dyn Clock>, offset: FixedOffset) -> Self {
        Self {
            store,
            clock,
            offset,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            average_consultation_minutes: DEFAULT_AVERAGE_CONSULTATION_MINUTES,
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(store: Arc<dyn QueueStore>, clock: Arc<dyn Clock>, config: &AppConfig) -> Self {
        Self::new(store, clock, config.clinic_utc_offset)
            .with_max_attempts(config.queue_number_max_attempts)
            .with_average_consultation_minutes(config.average_consultation_minutes)
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_average_consultation_minutes(mut self, minutes: i64) -> Self {
        self.average_consultation_minutes = minutes.max(0);
        self
    }

    /// Today's window according to the injected clock.
    pub fn today(&self) -> DayWindow {
        DayWindow::containing(self.clock.now(), self.offset)
    }

    /// Next free number for the day containing `creation_instant`: one past
    /// the highest number already issued that day, or 1.
    pub async fn assign_next_number(&self, creation_instant: DateTime<Utc>) -> Result<i32, QueueError> {
        let window = DayWindow::containing(creation_instant, self.offset);
        self.next_number_in(&window).await
    }

    async fn next_number_in(&self, window: &DayWindow) -> Result<i32, QueueError> {
        let latest = self.store.latest_in_window(window).await?;
        let next = latest.map_or(1, |entry| entry.queue_number + 1);
        debug!("Next queue number for {} is {}", window.day, next);
        Ok(next)
    }

    pub async fn enqueue(&self, request: CreateQueueEntryRequest) -> Result<QueueEntry, QueueError> {
        if request.patient_id.is_nil() {
            return Err(QueueError::Validation("patient_id is required".to_string()));
        }
        if request.user_id.is_nil() {
            return Err(QueueError::Validation("user_id is required".to_string()));
        }

        let _guard = self.write_lock.lock().await;

        let mut attempt = 0;
        loop {
            attempt += 1;

            let now = self.clock.now();
            let window = DayWindow::containing(now, self.offset);
            let queue_number = self.next_number_in(&window).await?;
            let entry = QueueEntry::new(&request, window.day, queue_number, now);

            match self.store.insert(entry).await {
                Ok(stored) => {
                    info!(
                        "Patient {} joined the queue for {} as #{} ({})",
                        stored.patient_id, stored.queue_day, stored.queue_number, stored.priority
                    );
                    return Ok(stored);
                }
                Err(DbError::Conflict(reason)) if attempt < self.max_attempts => {
                    warn!(
                        "Queue number {} for {} was taken concurrently (attempt {}/{}): {}",
                        queue_number, window.day, attempt, self.max_attempts, reason
                    );
                }
                Err(DbError::Conflict(_)) => {
                    warn!("Giving up on queue numbering for {} after {} attempts", window.day, attempt);
                    return Err(QueueError::NumberingContention { attempts: attempt });
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<QueueEntryDetails, QueueError> {
        self.store.get_detailed(id).await?.ok_or(QueueError::NotFound(id))
    }

    async fn load(&self, id: Uuid) -> Result<QueueEntry, QueueError> {
        self.store.get(id).await?.ok_or(QueueError::NotFound(id))
    }

    /// Today's entries in queue-number order.
    pub async fn list_todays_queue(&self) -> Result<Vec<QueueEntryDetails>, QueueError> {
        let window = self.today();
        Ok(self.store.list_detailed_in_window(&window).await?)
    }

    pub async fn list_queue_for_day(&self, day: NaiveDate) -> Result<Vec<QueueEntryDetails>, QueueError> {
        let window = DayWindow::for_day(day, self.offset);
        Ok(self.store.list_detailed_in_window(&window).await?)
    }

    pub async fn transition_queue_status(&self, id: Uuid, target: QueueStatus) -> Result<QueueEntry, QueueError> {
        let _guard = self.write_lock.lock().await;

        let mut entry = self.load(id).await?;
        let from = entry.status;
        if !apply_status(&mut entry, target, self.clock.now())? {
            return Ok(entry);
        }

        let saved = self.store.save(&entry).await?;
        info!("Queue entry #{} moved {} -> {}", saved.queue_number, from, saved.status);
        Ok(saved)
    }

    /// Calls the lowest-numbered waiting patient of today.
    pub async fn call_next(&self, doctor_id: Option<Uuid>) -> Result<QueueEntry, QueueError> {
        let _guard = self.write_lock.lock().await;

        let window = self.today();
        let mut entry = self
            .store
            .list_in_window(&window)
            .await?
            .into_iter()
            .find(|e| e.status == QueueStatus::Waiting)
            .ok_or(QueueError::NobodyWaiting)?;

        apply_status(&mut entry, QueueStatus::WithDoctor, self.clock.now())?;
        if doctor_id.is_some() {
            entry.doctor_id = doctor_id;
        }

        let saved = self.store.save(&entry).await?;
        info!("Called queue entry #{} for patient {}", saved.queue_number, saved.patient_id);
        Ok(saved)
    }

    pub async fn update_priority(&self, id: Uuid, priority: Priority) -> Result<QueueEntry, QueueError> {
        let _guard = self.write_lock.lock().await;

        let mut entry = self.load(id).await?;
        if entry.priority == priority {
            return Ok(entry);
        }
        entry.priority = priority;
        entry.updated_at = self.clock.now();

        Ok(self.store.save(&entry).await?)
    }

    /// Takes the entry out of the line by cancelling it. The row and its
    /// number stay, so the number is never handed to another patient.
    pub async fn remove(&self, id: Uuid) -> Result<QueueEntry, QueueError> {
        let removed = self.transition_queue_status(id, QueueStatus::Cancelled).await?;
        info!("Removed queue entry #{} from the line", removed.queue_number);
        Ok(removed)
    }

    /// Where the patient's earliest waiting entry of today stands.
    pub async fn queue_position(&self, patient_id: Uuid) -> Result<QueuePosition, QueueError> {
        let waiting: Vec<QueueEntry> = self
            .store
            .list_in_window(&self.today())
            .await?
            .into_iter()
            .filter(|e| e.status == QueueStatus::Waiting)
            .collect();

        let (ahead, entry) = waiting
            .iter()
            .enumerate()
            .find(|(_, e)| e.patient_id == patient_id)
            .ok_or(QueueError::PatientNotWaiting(patient_id))?;

        Ok(QueuePosition {
            entry_id: entry.id,
            patient_id,
            queue_number: entry.queue_number,
            position: ahead + 1,
            waiting_ahead: ahead,
            estimated_wait_minutes: (ahead as i64).saturating_mul(self.average_consultation_minutes),
        })
    }

    pub async fn stats(&self) -> Result<QueueStats, QueueError> {
        let window = self.today();
        let entries = self.store.list_in_window(&window).await?;
        Ok(QueueStats::from_entries(window.day, &entries))
    }
}
