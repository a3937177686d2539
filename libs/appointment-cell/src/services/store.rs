use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use doctor_cell::{DoctorStore, DoctorSummary};
use patient_cell::{PatientStore, PatientSummary};
use shared_database::supabase::{eq, filter};
use shared_database::{DbError, MemoryTable, SupabaseClient};

use crate::models::{Appointment, AppointmentDetails, AppointmentSearchQuery};

/// Appointments are never deleted; reads that feed listings come back with
/// the patient and doctor embedded.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn insert(&self, appointment: Appointment) -> Result<Appointment, DbError>;

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, DbError>;

    async fn get_detailed(&self, id: Uuid) -> Result<Option<AppointmentDetails>, DbError>;

    /// Matching appointments ordered by date, then time.
    async fn search(&self, query: &AppointmentSearchQuery) -> Result<Vec<AppointmentDetails>, DbError>;

    async fn save(&self, appointment: &Appointment) -> Result<Appointment, DbError>;
}

#[derive(Default)]
pub struct InMemoryAppointmentStore {
    table: MemoryTable<Appointment>,
    patients: Option<Arc<dyn PatientStore>>,
    doctors: Option<Arc<dyn DoctorStore>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_directory(patients: Arc<dyn PatientStore>, doctors: Arc<dyn DoctorStore>) -> Self {
        Self {
            table: MemoryTable::new(),
            patients: Some(patients),
            doctors: Some(doctors),
        }
    }

    async fn join(&self, appointment: Appointment) -> Result<AppointmentDetails, DbError> {
        let patient = match &self.patients {
            Some(patients) => patients
                .get(appointment.patient_id)
                .await?
                .as_ref()
                .map(PatientSummary::from),
            None => None,
        };
        let doctor = match &self.doctors {
            Some(doctors) => doctors
                .get(appointment.doctor_id)
                .await?
                .as_ref()
                .map(DoctorSummary::from),
            None => None,
        };

        Ok(AppointmentDetails {
            appointment,
            patient,
            doctor,
        })
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn insert(&self, appointment: Appointment) -> Result<Appointment, DbError> {
        self.table.insert(appointment.id, appointment).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, DbError> {
        Ok(self.table.get(id).await)
    }

    async fn get_detailed(&self, id: Uuid) -> Result<Option<AppointmentDetails>, DbError> {
        match self.table.get(id).await {
            Some(appointment) => Ok(Some(self.join(appointment).await?)),
            None => Ok(None),
        }
    }

    async fn search(&self, query: &AppointmentSearchQuery) -> Result<Vec<AppointmentDetails>, DbError> {
        let mut appointments = self.table.find(|a| query.matches(a)).await;
        appointments.sort_by_key(|a| (a.appointment_date, a.appointment_time, a.created_at));

        let mut detailed = Vec::with_capacity(appointments.len());
        for appointment in appointments {
            detailed.push(self.join(appointment).await?);
        }
        Ok(detailed)
    }

    async fn save(&self, appointment: &Appointment) -> Result<Appointment, DbError> {
        self.table
            .update(appointment.id, |row| *row = appointment.clone())
            .await?
            .ok_or_else(|| DbError::NotFound(format!("appointment {}", appointment.id)))
    }
}

const TABLE: &str = "appointments";

#[derive(Clone)]
pub struct SupabaseAppointmentStore {
    client: SupabaseClient,
}

impl SupabaseAppointmentStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    fn embed_people() -> String {
        format!(
            "select=*,patient:patients({}),doctor:doctors({})",
            PatientSummary::COLUMNS,
            DoctorSummary::COLUMNS
        )
    }

    fn search_filter(query: &AppointmentSearchQuery) -> String {
        let mut parts = vec![Self::embed_people()];

        if let Some(date) = query.date {
            parts.push(eq("appointment_date", date));
        }
        if let Some(start) = query.start_date {
            parts.push(filter("appointment_date", "gte", start));
        }
        if let Some(end) = query.end_date {
            parts.push(filter("appointment_date", "lte", end));
        }
        if let Some(patient_id) = query.patient_id {
            parts.push(eq("patient_id", patient_id));
        }
        if let Some(doctor_id) = query.doctor_id {
            parts.push(eq("doctor_id", doctor_id));
        }
        if let Some(status) = query.status {
            parts.push(eq("status", status));
        }

        parts.push("order=appointment_date.asc,appointment_time.asc".to_string());
        parts.join("&")
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn insert(&self, appointment: Appointment) -> Result<Appointment, DbError> {
        self.client.insert(TABLE, &appointment).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, DbError> {
        self.client.select_one(TABLE, &eq("id", id)).await
    }

    async fn get_detailed(&self, id: Uuid) -> Result<Option<AppointmentDetails>, DbError> {
        let query = format!("{}&{}", Self::embed_people(), eq("id", id));
        self.client.select_one(TABLE, &query).await
    }

    async fn search(&self, query: &AppointmentSearchQuery) -> Result<Vec<AppointmentDetails>, DbError> {
        self.client.select(TABLE, &Self::search_filter(query)).await
    }

    async fn save(&self, appointment: &Appointment) -> Result<Appointment, DbError> {
        let patch = json!({
            "doctor_id": appointment.doctor_id,
            "appointment_date": appointment.appointment_date,
            "appointment_time": appointment.appointment_time,
            "duration_minutes": appointment.duration_minutes,
            "status": appointment.status,
            "notes": appointment.notes,
            "reason_for_visit": appointment.reason_for_visit,
            "updated_at": appointment.updated_at,
        });

        self.client
            .update(TABLE, &eq("id", appointment.id), patch)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("appointment {}", appointment.id)))
    }
}
