use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use shared_database::DbError;
use shared_utils::validation::{is_valid_email, non_blank};
use shared_utils::Clock;

use crate::models::{CreateUserRequest, User, UserError};
use crate::services::store::UserStore;

/// Front-desk staff directory: register and look up the people that queue
/// entries and appointments record as `user_id`.
pub struct UserService {
    store: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User, UserError> {
        debug!("Registering staff member {}", request.username);

        let username = required("username", &request.username)?.to_lowercase();
        if username.chars().any(char::is_whitespace) {
            return Err(UserError::Validation("username must not contain spaces".to_string()));
        }
        let email = request.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(UserError::Validation(format!("invalid email address: {}", email)));
        }

        let now = self.clock.now();
        let user = User {
            id: Uuid::new_v4(),
            username,
            first_name: required("first_name", &request.first_name)?,
            last_name: required("last_name", &request.last_name)?,
            email,
            employee_id: request.employee_id.as_deref().and_then(non_blank).map(str::to_string),
            role: request.role,
            created_at: now,
            updated_at: now,
        };

        let stored = self.store.insert(user).await.map_err(|e| match e {
            DbError::Conflict(reason) => UserError::AlreadyExists(reason),
            other => other.into(),
        })?;
        info!("Staff member {} registered as {}", stored.username, stored.role);
        Ok(stored)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, UserError> {
        self.store.get(id).await?.ok_or(UserError::NotFound(id))
    }

    pub async fn list_users(&self) -> Result<Vec<User>, UserError> {
        Ok(self.store.list().await?)
    }
}

fn required(field: &str, value: &str) -> Result<String, UserError> {
    non_blank(value)
        .map(str::to_string)
        .ok_or_else(|| UserError::Validation(format!("{} is required", field)))
}
