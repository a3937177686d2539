use std::sync::Arc;

use anyhow::bail;
use axum::{routing::get, Router};
use tracing::info;

use appointment_cell::{
    appointment_routes, AppointmentService, AppointmentStore, InMemoryAppointmentStore,
    SupabaseAppointmentStore,
};
use doctor_cell::{doctor_routes, DoctorService, DoctorStore, InMemoryDoctorStore, SupabaseDoctorStore};
use patient_cell::{
    patient_routes, InMemoryPatientStore, PatientService, PatientStore, SupabasePatientStore,
};
use queue_cell::{queue_routes, DailyQueueSequencer, InMemoryQueueStore, QueueStore, SupabaseQueueStore};
use shared_config::{AppConfig, StorageBackend};
use shared_database::SupabaseClient;
use shared_utils::{Clock, SystemClock};
use user_cell::{user_routes, InMemoryUserStore, SupabaseUserStore, UserService, UserStore};

/// One service per cell, sharing a clock and a storage backend.
pub struct AppServices {
    pub queue: Arc<DailyQueueSequencer>,
    pub appointments: Arc<AppointmentService>,
    pub patients: Arc<PatientService>,
    pub doctors: Arc<DoctorService>,
    pub users: Arc<UserService>,
}

impl AppServices {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AppConfig, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let (queue, appointments, patients, doctors, users): (
            Arc<dyn QueueStore>,
            Arc<dyn AppointmentStore>,
            Arc<dyn PatientStore>,
            Arc<dyn DoctorStore>,
            Arc<dyn UserStore>,
        ) = match config.storage_backend {
            StorageBackend::Memory => {
                info!("Using in-memory storage; records are lost on restart");
                let patients: Arc<dyn PatientStore> = Arc::new(InMemoryPatientStore::new());
                let doctors: Arc<dyn DoctorStore> = Arc::new(InMemoryDoctorStore::new());
                (
                    Arc::new(InMemoryQueueStore::with_directory(patients.clone(), doctors.clone())),
                    Arc::new(InMemoryAppointmentStore::with_directory(patients.clone(), doctors.clone())),
                    patients,
                    doctors,
                    Arc::new(InMemoryUserStore::new()),
                )
            }
            StorageBackend::Supabase => {
                if !config.is_supabase_configured() {
                    bail!("STORAGE_BACKEND=supabase requires SUPABASE_URL and SUPABASE_ANON_PUBLIC_KEY");
                }
                info!("Using Supabase storage at {}", config.supabase_url);
                let client = SupabaseClient::new(config);
                (
                    Arc::new(SupabaseQueueStore::new(client.clone())),
                    Arc::new(SupabaseAppointmentStore::new(client.clone())),
                    Arc::new(SupabasePatientStore::new(client.clone())),
                    Arc::new(SupabaseDoctorStore::new(client.clone())),
                    Arc::new(SupabaseUserStore::new(client)),
                )
            }
        };

        Ok(Self {
            queue: Arc::new(DailyQueueSequencer::from_config(queue, clock.clone(), config)),
            appointments: Arc::new(AppointmentService::new(
                appointments,
                clock.clone(),
                config.clinic_utc_offset,
            )),
            patients: Arc::new(PatientService::new(patients, clock.clone(), config.clinic_utc_offset)),
            doctors: Arc::new(DoctorService::new(doctors, clock.clone())),
            users: Arc::new(UserService::new(users, clock)),
        })
    }
}

pub fn create_router(services: AppServices) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic front-desk API is running!" }))
        .nest("/queue", queue_routes(services.queue))
        .nest("/appointments", appointment_routes(services.appointments))
        .nest("/patients", patient_routes(services.patients))
        .nest("/doctors", doctor_routes(services.doctors))
        .nest("/users", user_routes(services.users))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use shared_utils::test_utils::{instant, TestConfig};
    use shared_utils::FixedClock;

    use super::*;

    fn app() -> Router {
        let config = TestConfig::default().to_app_config();
        let clock = Arc::new(FixedClock::new(instant("2026-06-01T08:00:00Z")));
        create_router(AppServices::with_clock(&config, clock).unwrap())
    }

    #[tokio::test]
    async fn liveness_route_answers() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn every_cell_is_mounted() {
        let app = app();
        for uri in ["/queue", "/appointments", "/patients", "/doctors", "/users"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);

            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body: Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(body, json!([]), "{}", uri);
        }
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Value) -> Value {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn queue_and_appointments_see_the_shared_registries() {
        let app = app();
        let user = call(
            &app,
            "POST",
            "/users",
            json!({
                "username": "frontdesk",
                "first_name": "Maura",
                "last_name": "Finn",
                "email": "maura.finn@clinic.example",
                "employee_id": null,
            }),
        )
        .await;
        let patient = call(
            &app,
            "POST",
            "/patients",
            json!({
                "first_name": "Oisin",
                "last_name": "Keane",
                "email": "oisin.keane@example.ie",
                "phone": "+353 87 555 0123",
                "date_of_birth": "1985-09-30",
                "address": "2 Mill Lane",
            }),
        )
        .await;
        let doctor = call(
            &app,
            "POST",
            "/doctors",
            json!({
                "first_name": "Ruth",
                "last_name": "Nolan",
                "email": "ruth.nolan@clinic.example",
                "phone": "+353 1 555 0150",
                "specialization": "General Practice",
                "gender": "female",
                "location": "Sligo",
                "availability": null,
            }),
        )
        .await;

        call(
            &app,
            "POST",
            "/queue",
            json!({ "patient_id": patient["id"], "user_id": user["id"], "doctor_id": doctor["id"] }),
        )
        .await;
        call(
            &app,
            "POST",
            "/appointments",
            json!({
                "patient_id": patient["id"],
                "doctor_id": doctor["id"],
                "user_id": user["id"],
                "appointment_date": "2026-06-01",
                "appointment_time": "15:00:00",
            }),
        )
        .await;

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/queue").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let queue: Value = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
        assert_eq!(queue[0]["patient"]["first_name"], "Oisin");
        assert_eq!(queue[0]["doctor"]["last_name"], "Nolan");

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/appointments/today").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let today: Value = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
        assert_eq!(today[0]["patient"]["last_name"], "Keane");
        assert_eq!(today[0]["doctor"]["specialization"], "General Practice");
    }

    #[test]
    fn supabase_backend_without_credentials_is_rejected() {
        let mut config = TestConfig::default().to_app_config();
        config.storage_backend = StorageBackend::Supabase;
        config.supabase_url = String::new();

        assert!(AppServices::from_config(&config).is_err());
    }
}
