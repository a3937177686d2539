use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use shared_database::DbError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub specialization: String,
    pub gender: Gender,
    pub location: String,
    /// Free-text or JSON-encoded weekly schedule.
    pub availability: Option<String>,
    pub is_active: bool,
    pub status: DoctorStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        format!("Dr. {} {}", self.first_name, self.last_name)
    }
}

/// The part of a doctor record embedded in queue and appointment listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub specialization: String,
    pub status: DoctorStatus,
}

impl DoctorSummary {
    pub const COLUMNS: &'static str = "id,first_name,last_name,specialization,status";
}

impl From<&Doctor> for DoctorSummary {
    fn from(doctor: &Doctor) -> Self {
        Self {
            id: doctor.id,
            first_name: doctor.first_name.clone(),
            last_name: doctor.last_name.clone(),
            specialization: doctor.specialization.clone(),
            status: doctor.status,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
            Gender::Other => write!(f, "other"),
        }
    }
}

/// Working status shown on the front-desk board. Independent of `is_active`,
/// which only the removal operation clears.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DoctorStatus {
    #[default]
    Active,
    OnLeave,
    Break,
    Inactive,
}

impl fmt::Display for DoctorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoctorStatus::Active => write!(f, "active"),
            DoctorStatus::OnLeave => write!(f, "on_leave"),
            DoctorStatus::Break => write!(f, "break"),
            DoctorStatus::Inactive => write!(f, "inactive"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDoctorRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub specialization: String,
    pub gender: Gender,
    pub location: String,
    pub availability: Option<String>,
    #[serde(default)]
    pub status: DoctorStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDoctorRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub specialization: Option<String>,
    pub gender: Option<Gender>,
    pub location: Option<String>,
    pub availability: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDoctorStatusRequest {
    pub status: DoctorStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoctorSearchFilters {
    pub specialization: Option<String>,
    pub location: Option<String>,
    pub gender: Option<Gender>,
    pub status: Option<DoctorStatus>,
}

impl DoctorSearchFilters {
    /// Substring match on specialization and location (case-insensitive),
    /// exact match on gender and status. Inactive doctors never match.
    pub fn matches(&self, doctor: &Doctor) -> bool {
        fn contains(haystack: &str, needle: &Option<String>) -> bool {
            needle
                .as_deref()
                .map_or(true, |n| haystack.to_lowercase().contains(&n.to_lowercase()))
        }

        doctor.is_active
            && contains(&doctor.specialization, &self.specialization)
            && contains(&doctor.location, &self.location)
            && self.gender.map_or(true, |g| doctor.gender == g)
            && self.status.map_or(true, |s| doctor.status == s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found: {0}")]
    NotFound(Uuid),

    #[error("Doctor with email {email} already exists")]
    EmailAlreadyExists { email: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Persistence(#[from] DbError),
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound(_) => AppError::NotFound(err.to_string()),
            DoctorError::EmailAlreadyExists { .. } => AppError::Conflict(err.to_string()),
            DoctorError::Validation(msg) => AppError::ValidationError(msg),
            DoctorError::Persistence(db) => AppError::from(db),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctor() -> Doctor {
        let now = Utc::now();
        Doctor {
            id: Uuid::new_v4(),
            first_name: "Maeve".to_string(),
            last_name: "Doyle".to_string(),
            email: "maeve.doyle@clinic.example".to_string(),
            phone: "+353 1 555 0199".to_string(),
            specialization: "Paediatric Cardiology".to_string(),
            gender: Gender::Female,
            location: "Cork City".to_string(),
            availability: None,
            is_active: true,
            status: DoctorStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn filters_mix_substring_and_exact_matches() {
        let doctor = doctor();

        let by_specialty = DoctorSearchFilters {
            specialization: Some("cardio".to_string()),
            location: Some("CORK".to_string()),
            ..DoctorSearchFilters::default()
        };
        assert!(by_specialty.matches(&doctor));

        let wrong_gender = DoctorSearchFilters {
            gender: Some(Gender::Male),
            ..DoctorSearchFilters::default()
        };
        assert!(!wrong_gender.matches(&doctor));

        let on_leave = DoctorSearchFilters {
            status: Some(DoctorStatus::OnLeave),
            ..DoctorSearchFilters::default()
        };
        assert!(!on_leave.matches(&doctor));
    }

    #[test]
    fn removed_doctors_never_match() {
        let mut doctor = doctor();
        doctor.is_active = false;
        assert!(!DoctorSearchFilters::default().matches(&doctor));
    }

    #[test]
    fn summary_keeps_the_board_fields() {
        let doctor = doctor();
        let summary = DoctorSummary::from(&doctor);

        assert_eq!(summary.id, doctor.id);
        assert_eq!(summary.specialization, "Paediatric Cardiology");
        assert_eq!(summary.status, DoctorStatus::Active);
        let columns: Vec<&str> = DoctorSummary::COLUMNS.split(',').collect();
        let wire = serde_json::to_value(&summary).unwrap();
        assert_eq!(wire.as_object().unwrap().len(), columns.len());
        assert!(columns.iter().all(|c| wire.get(*c).is_some()));
    }

    #[test]
    fn status_wire_names() {
        assert_eq!(serde_json::to_string(&DoctorStatus::OnLeave).unwrap(), "\"on_leave\"");
        assert_eq!(DoctorStatus::Break.to_string(), "break");
    }
}
