use async_trait::async_trait;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::eq;
use shared_database::{DbError, MemoryTable, SupabaseClient};

use crate::models::Patient;

/// Persistence collaborator for patient records. Inserts and saves that
/// would duplicate another patient's email fail with [`DbError::Conflict`].
#[async_trait]
pub trait PatientStore: Send + Sync {
    async fn insert(&self, patient: Patient) -> Result<Patient, DbError>;

    async fn get(&self, id: Uuid) -> Result<Option<Patient>, DbError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Patient>, DbError>;

    /// All patients ordered by last name, then first name.
    async fn list(&self) -> Result<Vec<Patient>, DbError>;

    async fn search(&self, term: &str) -> Result<Vec<Patient>, DbError>;

    async fn save(&self, patient: &Patient) -> Result<Patient, DbError>;

    async fn delete(&self, id: Uuid) -> Result<bool, DbError>;
}

#[derive(Default)]
pub struct InMemoryPatientStore {
    table: MemoryTable<Patient>,
}

impl InMemoryPatientStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn sorted(&self, term: Option<&str>) -> Vec<Patient> {
        let mut patients = self
            .table
            .find(|p| term.map_or(true, |t| p.matches(t)))
            .await;
        patients.sort_by(|a, b| {
            (a.last_name.to_lowercase(), a.first_name.to_lowercase())
                .cmp(&(b.last_name.to_lowercase(), b.first_name.to_lowercase()))
        });
        patients
    }
}

fn same_email(existing: &Patient, candidate: &Patient) -> Option<String> {
    existing
        .email
        .eq_ignore_ascii_case(&candidate.email)
        .then(|| format!("email {} already registered", candidate.email))
}

#[async_trait]
impl PatientStore for InMemoryPatientStore {
    async fn insert(&self, patient: Patient) -> Result<Patient, DbError> {
        self.table.insert_unique(patient.id, patient, same_email).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Patient>, DbError> {
        Ok(self.table.get(id).await)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Patient>, DbError> {
        Ok(self
            .table
            .find(|p| p.email.eq_ignore_ascii_case(email))
            .await
            .into_iter()
            .next())
    }

    async fn list(&self) -> Result<Vec<Patient>, DbError> {
        Ok(self.sorted(None).await)
    }

    async fn search(&self, term: &str) -> Result<Vec<Patient>, DbError> {
        Ok(self.sorted(Some(term)).await)
    }

    async fn save(&self, patient: &Patient) -> Result<Patient, DbError> {
        self.table
            .update_unique(patient.id, |row| *row = patient.clone(), same_email)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("patient {}", patient.id)))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        Ok(self.table.remove(id).await.is_some())
    }
}

const TABLE: &str = "patients";
const ORDER: &str = "order=last_name.asc,first_name.asc";

/// `patients` table behind PostgREST, with a unique index on `email`.
#[derive(Clone)]
pub struct SupabasePatientStore {
    client: SupabaseClient,
}

impl SupabasePatientStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// `or=(first_name.ilike.*term*,...)`. Characters that delimit PostgREST
    /// logic trees are dropped from the term.
    fn search_filter(term: &str) -> String {
        let cleaned: String = term
            .chars()
            .filter(|c| !matches!(c, ',' | '(' | ')' | '*'))
            .collect();
        let pattern = urlencoding::encode(&cleaned).into_owned();

        let clauses = ["first_name", "last_name", "email", "phone"]
            .iter()
            .map(|column| format!("{}.ilike.*{}*", column, pattern))
            .collect::<Vec<_>>()
            .join(",");
        format!("or=({})&{}", clauses, ORDER)
    }
}

#[async_trait]
impl PatientStore for SupabasePatientStore {
    async fn insert(&self, patient: Patient) -> Result<Patient, DbError> {
        self.client.insert(TABLE, &patient).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Patient>, DbError> {
        self.client.select_one(TABLE, &eq("id", id)).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Patient>, DbError> {
        self.client.select_one(TABLE, &eq("email", email)).await
    }

    async fn list(&self) -> Result<Vec<Patient>, DbError> {
        self.client.select(TABLE, ORDER).await
    }

    async fn search(&self, term: &str) -> Result<Vec<Patient>, DbError> {
        debug!("Searching patients for {:?}", term);
        self.client.select(TABLE, &Self::search_filter(term)).await
    }

    async fn save(&self, patient: &Patient) -> Result<Patient, DbError> {
        let patch = json!({
            "first_name": patient.first_name,
            "last_name": patient.last_name,
            "email": patient.email,
            "phone": patient.phone,
            "date_of_birth": patient.date_of_birth,
            "address": patient.address,
            "emergency_contact": patient.emergency_contact,
            "emergency_contact_phone": patient.emergency_contact_phone,
            "updated_at": patient.updated_at,
        });

        self.client
            .update(TABLE, &eq("id", patient.id), patch)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("patient {}", patient.id)))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        Ok(self.client.delete(TABLE, &eq("id", id)).await? > 0)
    }
}
