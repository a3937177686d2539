use async_trait::async_trait;
use uuid::Uuid;

use shared_database::supabase::eq;
use shared_database::{DbError, MemoryTable, SupabaseClient};

use crate::models::User;

/// Staff directory persistence. Username, email and employee id are each
/// unique; an insert that repeats one fails with [`DbError::Conflict`].
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: User) -> Result<User, DbError>;

    async fn get(&self, id: Uuid) -> Result<Option<User>, DbError>;

    /// Every staff member ordered by last name, then first name.
    async fn list(&self) -> Result<Vec<User>, DbError>;
}

#[derive(Default)]
pub struct InMemoryUserStore {
    table: MemoryTable<User>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn same_identity(existing: &User, candidate: &User) -> Option<String> {
    if existing.username.eq_ignore_ascii_case(&candidate.username) {
        return Some(format!("username {}", candidate.username));
    }
    if existing.email.eq_ignore_ascii_case(&candidate.email) {
        return Some(format!("email {}", candidate.email));
    }
    match (&existing.employee_id, &candidate.employee_id) {
        (Some(a), Some(b)) if a == b => Some(format!("employee id {}", b)),
        _ => None,
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: User) -> Result<User, DbError> {
        self.table.insert_unique(user.id, user, same_identity).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>, DbError> {
        Ok(self.table.get(id).await)
    }

    async fn list(&self) -> Result<Vec<User>, DbError> {
        let mut users = self.table.find(|_| true).await;
        users.sort_by(|a, b| (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name)));
        Ok(users)
    }
}

const TABLE: &str = "users";

/// `users` table behind PostgREST with unique indexes on `username`,
/// `email` and `employee_id`.
#[derive(Clone)]
pub struct SupabaseUserStore {
    client: SupabaseClient,
}

impl SupabaseUserStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UserStore for SupabaseUserStore {
    async fn insert(&self, user: User) -> Result<User, DbError> {
        self.client.insert(TABLE, &user).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>, DbError> {
        self.client.select_one(TABLE, &eq("id", id)).await
    }

    async fn list(&self) -> Result<Vec<User>, DbError> {
        self.client.select(TABLE, "order=last_name.asc,first_name.asc").await
    }
}
