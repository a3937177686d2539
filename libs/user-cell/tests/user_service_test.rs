use std::sync::Arc;

use assert_matches::assert_matches;
use uuid::Uuid;

use shared_utils::test_utils::instant;
use shared_utils::FixedClock;
use user_cell::*;

fn service() -> UserService {
    let clock = Arc::new(FixedClock::new(instant("2026-01-12T08:30:00Z")));
    UserService::new(Arc::new(InMemoryUserStore::new()), clock)
}

fn staff(username: &str, last_name: &str, email: &str) -> CreateUserRequest {
    CreateUserRequest {
        username: username.to_string(),
        first_name: "Gr\u{e1}inne".to_string(),
        last_name: last_name.to_string(),
        email: email.to_string(),
        employee_id: None,
        role: UserRole::FrontDesk,
    }
}

#[tokio::test]
async fn create_normalizes_identity_fields() {
    let service = service();
    let mut request = staff(" GBrennan ", "Brennan", "Grainne.Brennan@Clinic.example");
    request.employee_id = Some("  ".to_string());

    let user = service.create_user(request).await.unwrap();

    assert_eq!(user.username, "gbrennan");
    assert_eq!(user.email, "grainne.brennan@clinic.example");
    assert_eq!(user.employee_id, None);
    assert_eq!(user.role, UserRole::FrontDesk);
    assert_eq!(user.created_at, instant("2026-01-12T08:30:00Z"));
    assert_eq!(service.get_user(user.id).await.unwrap(), user);
}

#[tokio::test]
async fn usernames_emails_and_employee_ids_are_unique() {
    let service = service();
    let mut first = staff("gbrennan", "Brennan", "gb@clinic.example");
    first.employee_id = Some("FD-001".to_string());
    service.create_user(first).await.unwrap();

    assert_matches!(
        service.create_user(staff("GBRENNAN", "Other", "other@clinic.example")).await,
        Err(UserError::AlreadyExists(reason)) if reason.contains("username")
    );
    assert_matches!(
        service.create_user(staff("someone", "Other", "GB@clinic.example")).await,
        Err(UserError::AlreadyExists(reason)) if reason.contains("email")
    );

    let mut same_badge = staff("third", "Other", "third@clinic.example");
    same_badge.employee_id = Some("FD-001".to_string());
    assert_matches!(
        service.create_user(same_badge).await,
        Err(UserError::AlreadyExists(reason)) if reason.contains("FD-001")
    );

    assert_eq!(service.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_registrations_are_rejected() {
    let service = service();

    assert_matches!(
        service.create_user(staff("g brennan", "Brennan", "gb@clinic.example")).await,
        Err(UserError::Validation(_))
    );
    assert_matches!(
        service.create_user(staff("gbrennan", "Brennan", "not-an-email")).await,
        Err(UserError::Validation(_))
    );
    assert_matches!(
        service.create_user(staff("gbrennan", " ", "gb@clinic.example")).await,
        Err(UserError::Validation(msg)) if msg.contains("last_name")
    );
}

#[tokio::test]
async fn directory_lists_by_surname() {
    let service = service();
    service.create_user(staff("zquinn", "Quinn", "zq@clinic.example")).await.unwrap();
    let mut admin = staff("afarrell", "Farrell", "af@clinic.example");
    admin.role = UserRole::Admin;
    service.create_user(admin).await.unwrap();

    let users = service.list_users().await.unwrap();
    let surnames: Vec<&str> = users.iter().map(|u| u.last_name.as_str()).collect();
    assert_eq!(surnames, vec!["Farrell", "Quinn"]);
    assert_eq!(users[0].role, UserRole::Admin);

    assert_matches!(service.get_user(Uuid::new_v4()).await, Err(UserError::NotFound(_)));
}
