use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use shared_database::DbError;
use shared_utils::validation::{is_valid_email, is_valid_phone, non_blank};
use shared_utils::Clock;

use crate::models::{
    CreateDoctorRequest, Doctor, DoctorError, DoctorSearchFilters, DoctorStatus,
    UpdateDoctorRequest,
};
use crate::services::store::DoctorStore;

pub struct DoctorService {
    store: Arc<dyn DoctorStore>,
    clock: Arc<dyn Clock>,
}

impl DoctorService {
    pub fn new(store: Arc<dyn DoctorStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Create a new doctor profile
    pub async fn create_doctor(&self, request: CreateDoctorRequest) -> Result<Doctor, DoctorError> {
        debug!("Creating new doctor profile for: {}", request.email);

        let email = normalize_email(&request.email)?;
        if self.store.find_by_email(&email).await?.is_some() {
            return Err(DoctorError::EmailAlreadyExists { email });
        }

        let now = self.clock.now();
        let doctor = Doctor {
            id: Uuid::new_v4(),
            first_name: required("first_name", &request.first_name)?,
            last_name: required("last_name", &request.last_name)?,
            email: email.clone(),
            phone: phone(&request.phone)?,
            specialization: required("specialization", &request.specialization)?,
            gender: request.gender,
            location: required("location", &request.location)?,
            availability: request.availability.as_deref().and_then(non_blank).map(str::to_string),
            is_active: true,
            status: request.status,
            created_at: now,
            updated_at: now,
        };

        let stored = self.store.insert(doctor).await.map_err(|e| email_conflict(e, &email))?;
        info!("Doctor profile created with ID: {}", stored.id);
        Ok(stored)
    }

    /// Active doctor by id; removed doctors are reported as missing.
    pub async fn get_doctor(&self, id: Uuid) -> Result<Doctor, DoctorError> {
        self.store
            .get(id)
            .await?
            .filter(|doctor| doctor.is_active)
            .ok_or(DoctorError::NotFound(id))
    }

    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, DoctorError> {
        self.search_doctors(&DoctorSearchFilters::default()).await
    }

    pub async fn search_doctors(&self, filters: &DoctorSearchFilters) -> Result<Vec<Doctor>, DoctorError> {
        Ok(self.store.search(filters).await?)
    }

    pub async fn update_doctor(&self, id: Uuid, request: UpdateDoctorRequest) -> Result<Doctor, DoctorError> {
        let mut doctor = self.get_doctor(id).await?;

        if let Some(first_name) = request.first_name {
            doctor.first_name = required("first_name", &first_name)?;
        }
        if let Some(last_name) = request.last_name {
            doctor.last_name = required("last_name", &last_name)?;
        }
        if let Some(email) = request.email {
            doctor.email = normalize_email(&email)?;
        }
        if let Some(value) = request.phone {
            doctor.phone = phone(&value)?;
        }
        if let Some(specialization) = request.specialization {
            doctor.specialization = required("specialization", &specialization)?;
        }
        if let Some(gender) = request.gender {
            doctor.gender = gender;
        }
        if let Some(location) = request.location {
            doctor.location = required("location", &location)?;
        }
        if let Some(availability) = request.availability {
            doctor.availability = non_blank(&availability).map(str::to_string);
        }

        self.persist(doctor).await
    }

    pub async fn update_status(&self, id: Uuid, status: DoctorStatus) -> Result<Doctor, DoctorError> {
        let mut doctor = self.get_doctor(id).await?;
        if doctor.status == status {
            return Ok(doctor);
        }

        info!("Doctor {} status {} -> {}", id, doctor.status, status);
        doctor.status = status;
        self.persist(doctor).await
    }

    /// Soft delete: the record stays but disappears from every lookup.
    pub async fn delete_doctor(&self, id: Uuid) -> Result<(), DoctorError> {
        let mut doctor = self.get_doctor(id).await?;
        doctor.is_active = false;
        doctor.status = DoctorStatus::Inactive;

        self.persist(doctor).await?;
        info!("Doctor profile {} deactivated", id);
        Ok(())
    }

    async fn persist(&self, mut doctor: Doctor) -> Result<Doctor, DoctorError> {
        doctor.updated_at = self.clock.now();
        self.store
            .save(&doctor)
            .await
            .map_err(|e| email_conflict(e, &doctor.email))
    }
}

fn email_conflict(err: DbError, email: &str) -> DoctorError {
    match err {
        DbError::Conflict(_) => DoctorError::EmailAlreadyExists {
            email: email.to_string(),
        },
        other => other.into(),
    }
}

fn normalize_email(email: &str) -> Result<String, DoctorError> {
    let email = email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(DoctorError::Validation(format!("invalid email address: {}", email)));
    }
    Ok(email)
}

fn required(field: &str, value: &str) -> Result<String, DoctorError> {
    non_blank(value)
        .map(str::to_string)
        .ok_or_else(|| DoctorError::Validation(format!("{} is required", field)))
}

fn phone(value: &str) -> Result<String, DoctorError> {
    let value = required("phone", value)?;
    if !is_valid_phone(&value) {
        return Err(DoctorError::Validation(format!("invalid phone: {}", value)));
    }
    Ok(value)
}
