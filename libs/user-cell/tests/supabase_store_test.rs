use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_database::{DbError, SupabaseClient};
use user_cell::*;

fn user_json(username: &str) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4(),
        "username": username,
        "first_name": "Declan",
        "last_name": "Hughes",
        "email": format!("{}@clinic.example", username),
        "employee_id": null,
        "role": "front_desk",
        "created_at": "2026-01-12T08:30:00Z",
        "updated_at": "2026-01-12T08:30:00Z"
    })
}

fn store(server: &MockServer) -> SupabaseUserStore {
    SupabaseUserStore::new(SupabaseClient::with_base_url(server.uri(), "test-anon-key"))
}

#[tokio::test]
async fn list_orders_by_surname() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("order", "last_name.asc,first_name.asc"))
        .and(header("apikey", "test-anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([user_json("dhughes")])))
        .expect(1)
        .mount(&server)
        .await;

    let users = store(&server).list().await.unwrap();
    assert_eq!(users[0].role, UserRole::FrontDesk);
}

#[tokio::test]
async fn insert_posts_the_row_and_maps_unique_violations() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .and(body_partial_json(json!({ "username": "dhughes" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([user_json("dhughes")])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .and(body_partial_json(json!({ "username": "taken" })))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"users_username_key\""
        })))
        .mount(&server)
        .await;

    let store = store(&server);
    let user: User = serde_json::from_value(user_json("dhughes")).unwrap();
    assert_eq!(store.insert(user).await.unwrap().username, "dhughes");

    let taken: User = serde_json::from_value(user_json("taken")).unwrap();
    assert_matches!(store.insert(taken).await, Err(DbError::Conflict(_)));
}
