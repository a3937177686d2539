use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate};
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::DbError;
use shared_utils::validation::{is_valid_email, is_valid_phone, non_blank};
use shared_utils::{Clock, DayWindow};

use crate::models::{CreatePatientRequest, Patient, PatientError, UpdatePatientRequest};
use crate::services::store::PatientStore;

pub struct PatientService {
    store: Arc<dyn PatientStore>,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
}

impl PatientService {
    pub fn new(store: Arc<dyn PatientStore>, clock: Arc<dyn Clock>, offset: FixedOffset) -> Self {
        Self { store, clock, offset }
    }

    pub async fn create_patient(&self, request: CreatePatientRequest) -> Result<Patient, PatientError> {
        debug!("Creating new patient profile for: {}", request.email);

        let email = normalize_email(&request.email)?;
        let now = self.clock.now();
        self.check_date_of_birth(request.date_of_birth)?;

        if self.store.find_by_email(&email).await?.is_some() {
            return Err(PatientError::EmailAlreadyExists { email });
        }

        let patient = Patient {
            id: Uuid::new_v4(),
            first_name: required("first_name", &request.first_name)?,
            last_name: required("last_name", &request.last_name)?,
            email: email.clone(),
            phone: phone("phone", &request.phone)?,
            date_of_birth: request.date_of_birth,
            address: required("address", &request.address)?,
            emergency_contact: optional(request.emergency_contact.as_deref()),
            emergency_contact_phone: optional_phone(request.emergency_contact_phone.as_deref())?,
            created_at: now,
            updated_at: now,
        };

        let stored = self.store.insert(patient).await.map_err(|e| email_conflict(e, &email))?;
        info!("Patient profile created with ID: {}", stored.id);
        Ok(stored)
    }

    pub async fn get_patient(&self, id: Uuid) -> Result<Patient, PatientError> {
        self.store.get(id).await?.ok_or(PatientError::NotFound(id))
    }

    pub async fn list_patients(&self) -> Result<Vec<Patient>, PatientError> {
        Ok(self.store.list().await?)
    }

    pub async fn search_patients(&self, term: &str) -> Result<Vec<Patient>, PatientError> {
        let term = non_blank(term)
            .ok_or_else(|| PatientError::Validation("search term must not be empty".to_string()))?;
        Ok(self.store.search(term).await?)
    }

    pub async fn update_patient(
        &self,
        id: Uuid,
        request: UpdatePatientRequest,
    ) -> Result<Patient, PatientError> {
        let mut patient = self.get_patient(id).await?;

        if let Some(first_name) = request.first_name {
            patient.first_name = required("first_name", &first_name)?;
        }
        if let Some(last_name) = request.last_name {
            patient.last_name = required("last_name", &last_name)?;
        }
        if let Some(email) = request.email {
            patient.email = normalize_email(&email)?;
        }
        if let Some(value) = request.phone {
            patient.phone = phone("phone", &value)?;
        }
        if let Some(date_of_birth) = request.date_of_birth {
            self.check_date_of_birth(date_of_birth)?;
            patient.date_of_birth = date_of_birth;
        }
        if let Some(address) = request.address {
            patient.address = required("address", &address)?;
        }
        if let Some(contact) = request.emergency_contact {
            patient.emergency_contact = optional(Some(&contact));
        }
        if let Some(contact_phone) = request.emergency_contact_phone {
            patient.emergency_contact_phone = optional_phone(Some(&contact_phone))?;
        }
        patient.updated_at = self.clock.now();

        let saved = self
            .store
            .save(&patient)
            .await
            .map_err(|e| email_conflict(e, &patient.email))?;
        info!("Patient profile {} updated", saved.id);
        Ok(saved)
    }

    pub async fn delete_patient(&self, id: Uuid) -> Result<(), PatientError> {
        if !self.store.delete(id).await? {
            return Err(PatientError::NotFound(id));
        }
        info!("Patient profile {} deleted", id);
        Ok(())
    }

    /// Birth dates up to the clinic-local today are accepted.
    fn check_date_of_birth(&self, date_of_birth: NaiveDate) -> Result<(), PatientError> {
        let today = DayWindow::containing(self.clock.now(), self.offset).day;
        if date_of_birth > today {
            return Err(PatientError::InvalidDateOfBirth);
        }
        Ok(())
    }
}

fn email_conflict(err: DbError, email: &str) -> PatientError {
    match err {
        DbError::Conflict(_) => PatientError::EmailAlreadyExists {
            email: email.to_string(),
        },
        other => other.into(),
    }
}

fn normalize_email(email: &str) -> Result<String, PatientError> {
    let email = email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(PatientError::Validation(format!("invalid email address: {}", email)));
    }
    Ok(email)
}

fn required(field: &str, value: &str) -> Result<String, PatientError> {
    non_blank(value)
        .map(str::to_string)
        .ok_or_else(|| PatientError::Validation(format!("{} is required", field)))
}

fn phone(field: &str, value: &str) -> Result<String, PatientError> {
    let value = required(field, value)?;
    if !is_valid_phone(&value) {
        return Err(PatientError::Validation(format!("invalid {}: {}", field, value)));
    }
    Ok(value)
}

fn optional(value: Option<&str>) -> Option<String> {
    value.and_then(non_blank).map(str::to_string)
}

fn optional_phone(value: Option<&str>) -> Result<Option<String>, PatientError> {
    match optional(value) {
        Some(number) => phone("emergency_contact_phone", &number).map(Some),
        None => Ok(None),
    }
}
