use async_trait::async_trait;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::eq;
use shared_database::{DbError, MemoryTable, SupabaseClient};

use crate::models::{Doctor, DoctorSearchFilters};

/// Persistence collaborator for doctor records. `get` and `find_by_email`
/// see removed doctors too; `search` only returns active ones.
#[async_trait]
pub trait DoctorStore: Send + Sync {
    async fn insert(&self, doctor: Doctor) -> Result<Doctor, DbError>;

    async fn get(&self, id: Uuid) -> Result<Option<Doctor>, DbError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Doctor>, DbError>;

    /// Active doctors matching `filters`, ordered by last name then first name.
    async fn search(&self, filters: &DoctorSearchFilters) -> Result<Vec<Doctor>, DbError>;

    async fn save(&self, doctor: &Doctor) -> Result<Doctor, DbError>;
}

#[derive(Default)]
pub struct InMemoryDoctorStore {
    table: MemoryTable<Doctor>,
}

impl InMemoryDoctorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn same_email(existing: &Doctor, candidate: &Doctor) -> Option<String> {
    existing
        .email
        .eq_ignore_ascii_case(&candidate.email)
        .then(|| format!("email {} already registered", candidate.email))
}

#[async_trait]
impl DoctorStore for InMemoryDoctorStore {
    async fn insert(&self, doctor: Doctor) -> Result<Doctor, DbError> {
        self.table.insert_unique(doctor.id, doctor, same_email).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Doctor>, DbError> {
        Ok(self.table.get(id).await)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Doctor>, DbError> {
        Ok(self
            .table
            .find(|d| d.email.eq_ignore_ascii_case(email))
            .await
            .into_iter()
            .next())
    }

    async fn search(&self, filters: &DoctorSearchFilters) -> Result<Vec<Doctor>, DbError> {
        let mut doctors = self.table.find(|d| filters.matches(d)).await;
        doctors.sort_by(|a, b| (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name)));
        Ok(doctors)
    }

    async fn save(&self, doctor: &Doctor) -> Result<Doctor, DbError> {
        self.table
            .update_unique(doctor.id, |row| *row = doctor.clone(), same_email)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("doctor {}", doctor.id)))
    }
}

const TABLE: &str = "doctors";

#[derive(Clone)]
pub struct SupabaseDoctorStore {
    client: SupabaseClient,
}

impl SupabaseDoctorStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    fn search_filter(filters: &DoctorSearchFilters) -> String {
        let mut query_parts = vec!["is_active=eq.true".to_string()];

        if let Some(specialization) = &filters.specialization {
            query_parts.push(format!(
                "specialization=ilike.*{}*",
                urlencoding::encode(specialization)
            ));
        }
        if let Some(location) = &filters.location {
            query_parts.push(format!("location=ilike.*{}*", urlencoding::encode(location)));
        }
        if let Some(gender) = filters.gender {
            query_parts.push(eq("gender", gender));
        }
        if let Some(status) = filters.status {
            query_parts.push(eq("status", status));
        }

        query_parts.push("order=last_name.asc,first_name.asc".to_string());
        query_parts.join("&")
    }
}

#[async_trait]
impl DoctorStore for SupabaseDoctorStore {
    async fn insert(&self, doctor: Doctor) -> Result<Doctor, DbError> {
        self.client.insert(TABLE, &doctor).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Doctor>, DbError> {
        self.client.select_one(TABLE, &eq("id", id)).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Doctor>, DbError> {
        self.client.select_one(TABLE, &eq("email", email)).await
    }

    async fn search(&self, filters: &DoctorSearchFilters) -> Result<Vec<Doctor>, DbError> {
        debug!("Searching doctors with filters: {:?}", filters);
        self.client.select(TABLE, &Self::search_filter(filters)).await
    }

    async fn save(&self, doctor: &Doctor) -> Result<Doctor, DbError> {
        let patch = json!({
            "first_name": doctor.first_name,
            "last_name": doctor.last_name,
            "email": doctor.email,
            "phone": doctor.phone,
            "specialization": doctor.specialization,
            "gender": doctor.gender,
            "location": doctor.location,
            "availability": doctor.availability,
            "is_active": doctor.is_active,
            "status": doctor.status,
            "updated_at": doctor.updated_at,
        });

        self.client
            .update(TABLE, &eq("id", doctor.id), patch)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("doctor {}", doctor.id)))
    }
}
