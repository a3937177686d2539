// libs/appointment-cell/src/services/appointment.rs
use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate};
use tracing::{debug, info};
use uuid::Uuid;

use shared_utils::validation::non_blank;
use shared_utils::{Clock, DayWindow};

use crate::models::{
    Appointment, AppointmentDetails, AppointmentError, AppointmentSearchQuery, AppointmentStatus,
    CreateAppointmentRequest, UpdateAppointmentRequest, DEFAULT_DURATION_MINUTES,
    MAX_DURATION_MINUTES,
};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::store::AppointmentStore;

pub struct AppointmentService {
    store: Arc<dyn AppointmentStore>,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
    lifecycle_service: AppointmentLifecycleService,
}

impl AppointmentService {
    pub fn new(store: Arc<dyn AppointmentStore>, clock: Arc<dyn Clock>, offset: FixedOffset) -> Self {
        Self {
            store,
            clock,
            offset,
            lifecycle_service: AppointmentLifecycleService::new(),
        }
    }

    /// The clinic-local calendar day according to the injected clock.
    pub fn today(&self) -> NaiveDate {
        DayWindow::containing(self.clock.now(), self.offset).day
    }

    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        for (field, id) in [
            ("patient_id", request.patient_id),
            ("doctor_id", request.doctor_id),
            ("user_id", request.user_id),
        ] {
            if id.is_nil() {
                return Err(AppointmentError::Validation(format!("{} is required", field)));
            }
        }

        let duration_minutes = request.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
        validate_duration(duration_minutes)?;

        let now = self.clock.now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: request.patient_id,
            doctor_id: request.doctor_id,
            user_id: request.user_id,
            appointment_date: request.appointment_date,
            appointment_time: request.appointment_time,
            duration_minutes,
            status: AppointmentStatus::Scheduled,
            notes: request.notes.as_deref().and_then(non_blank).map(str::to_string),
            reason_for_visit: request.reason_for_visit.as_deref().and_then(non_blank).map(str::to_string),
            created_at: now,
            updated_at: now,
        };

        let stored = self.store.insert(appointment).await?;
        info!(
            "Appointment {} booked for patient {} with doctor {} on {} at {}",
            stored.id, stored.patient_id, stored.doctor_id, stored.appointment_date, stored.appointment_time
        );
        Ok(stored)
    }

    pub async fn get_appointment(&self, id: Uuid) -> Result<AppointmentDetails, AppointmentError> {
        debug!("Fetching appointment {}", id);
        self.store.get_detailed(id).await?.ok_or(AppointmentError::NotFound(id))
    }

    async fn load(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        self.store.get(id).await?.ok_or(AppointmentError::NotFound(id))
    }

    pub async fn search_appointments(
        &self,
        query: &AppointmentSearchQuery,
    ) -> Result<Vec<AppointmentDetails>, AppointmentError> {
        if query.date.is_some() && (query.start_date.is_some() || query.end_date.is_some()) {
            return Err(AppointmentError::Validation(
                "date cannot be combined with start_date or end_date".to_string(),
            ));
        }
        if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
            if start > end {
                return Err(AppointmentError::Validation(
                    "start_date must not be after end_date".to_string(),
                ));
            }
        }

        Ok(self.store.search(query).await?)
    }

    pub async fn todays_appointments(&self) -> Result<Vec<AppointmentDetails>, AppointmentError> {
        self.search_appointments(&AppointmentSearchQuery::on(self.today())).await
    }

    pub async fn update_appointment(
        &self,
        id: Uuid,
        request: UpdateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointment = self.load(id).await?;

        if request.reschedules() && self.lifecycle_service.is_terminal(appointment.status) {
            return Err(AppointmentError::NotReschedulable(appointment.status));
        }
        if let Some(target) = request.status {
            if target != appointment.status {
                self.lifecycle_service
                    .validate_status_transition(appointment.status, target)?;
            }
        }
        if let Some(minutes) = request.duration_minutes {
            validate_duration(minutes)?;
        }
        if request.doctor_id.is_some_and(|id| id.is_nil()) {
            return Err(AppointmentError::Validation("doctor_id must not be nil".to_string()));
        }

        if let Some(doctor_id) = request.doctor_id {
            appointment.doctor_id = doctor_id;
        }
        if let Some(date) = request.appointment_date {
            appointment.appointment_date = date;
        }
        if let Some(time) = request.appointment_time {
            appointment.appointment_time = time;
        }
        if let Some(minutes) = request.duration_minutes {
            appointment.duration_minutes = minutes;
        }
        if let Some(notes) = request.notes {
            appointment.notes = non_blank(&notes).map(str::to_string);
        }
        if let Some(reason) = request.reason_for_visit {
            appointment.reason_for_visit = non_blank(&reason).map(str::to_string);
        }
        if let Some(status) = request.status {
            appointment.status = status;
        }
        appointment.updated_at = self.clock.now();

        let saved = self.store.save(&appointment).await?;
        info!("Appointment {} updated", saved.id);
        Ok(saved)
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        target: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointment = self.load(id).await?;
        if appointment.status == target {
            debug!("Appointment {} already {}", id, target);
            return Ok(appointment);
        }

        let from = appointment.status;
        self.lifecycle_service.validate_status_transition(from, target)?;

        appointment.status = target;
        appointment.updated_at = self.clock.now();

        let saved = self.store.save(&appointment).await?;
        info!("Appointment {} moved {} -> {}", saved.id, from, saved.status);
        Ok(saved)
    }
}

fn validate_duration(minutes: i32) -> Result<(), AppointmentError> {
    if !(1..=MAX_DURATION_MINUTES).contains(&minutes) {
        return Err(AppointmentError::Validation(format!(
            "duration_minutes must be between 1 and {}",
            MAX_DURATION_MINUTES
        )));
    }
    Ok(())
}
