use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use appointment_cell::*;
use doctor_cell::{Doctor, DoctorStatus, DoctorStore, Gender, InMemoryDoctorStore};
use patient_cell::{InMemoryPatientStore, Patient, PatientStore};
use shared_utils::test_utils::{instant, TestConfig};
use shared_utils::FixedClock;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn service_at(rfc3339: &str, offset_minutes: i32) -> AppointmentService {
    let clock = Arc::new(FixedClock::new(instant(rfc3339)));
    let offset = TestConfig::with_offset_minutes(offset_minutes).offset();
    AppointmentService::new(Arc::new(InMemoryAppointmentStore::new()), clock, offset)
}

fn booking(doctor_id: Uuid, on: NaiveDate, at: NaiveTime) -> CreateAppointmentRequest {
    CreateAppointmentRequest {
        patient_id: Uuid::new_v4(),
        doctor_id,
        user_id: Uuid::new_v4(),
        appointment_date: on,
        appointment_time: at,
        duration_minutes: None,
        notes: None,
        reason_for_visit: Some("Follow-up".to_string()),
    }
}

#[tokio::test]
async fn create_applies_defaults() {
    let service = service_at("2026-04-10T07:00:00Z", 0);
    let created = service
        .create_appointment(booking(Uuid::new_v4(), date(2026, 4, 12), time(10, 0)))
        .await
        .unwrap();

    assert_eq!(created.status, AppointmentStatus::Scheduled);
    assert_eq!(created.duration_minutes, DEFAULT_DURATION_MINUTES);
    assert_eq!(created.created_at, instant("2026-04-10T07:00:00Z"));
    assert_eq!(service.get_appointment(created.id).await.unwrap().appointment, created);
}

#[tokio::test]
async fn create_rejects_out_of_range_duration_and_missing_references() {
    let service = service_at("2026-04-10T07:00:00Z", 0);

    for minutes in [0, -15, MAX_DURATION_MINUTES + 1] {
        let mut request = booking(Uuid::new_v4(), date(2026, 4, 12), time(10, 0));
        request.duration_minutes = Some(minutes);
        assert_matches!(
            service.create_appointment(request).await,
            Err(AppointmentError::Validation(_))
        );
    }

    let mut request = booking(Uuid::new_v4(), date(2026, 4, 12), time(10, 0));
    request.patient_id = Uuid::nil();
    assert_matches!(
        service.create_appointment(request).await,
        Err(AppointmentError::Validation(msg)) if msg.contains("patient_id")
    );
}

#[tokio::test]
async fn overlapping_bookings_for_one_doctor_are_accepted() {
    let service = service_at("2026-04-10T07:00:00Z", 0);
    let doctor = Uuid::new_v4();

    service.create_appointment(booking(doctor, date(2026, 4, 12), time(10, 0))).await.unwrap();
    service.create_appointment(booking(doctor, date(2026, 4, 12), time(10, 15))).await.unwrap();

    let query = AppointmentSearchQuery {
        doctor_id: Some(doctor),
        ..AppointmentSearchQuery::default()
    };
    assert_eq!(service.search_appointments(&query).await.unwrap().len(), 2);
}

#[tokio::test]
async fn search_orders_by_date_then_time() {
    let service = service_at("2026-04-10T07:00:00Z", 0);
    let doctor = Uuid::new_v4();

    for (on, at) in [
        (date(2026, 4, 13), time(9, 0)),
        (date(2026, 4, 12), time(14, 0)),
        (date(2026, 4, 12), time(8, 30)),
    ] {
        service.create_appointment(booking(doctor, on, at)).await.unwrap();
    }

    let listed = service.search_appointments(&AppointmentSearchQuery::default()).await.unwrap();
    let slots: Vec<_> = listed.iter().map(|a| (a.appointment_date, a.appointment_time)).collect();
    assert_eq!(
        slots,
        vec![
            (date(2026, 4, 12), time(8, 30)),
            (date(2026, 4, 12), time(14, 0)),
            (date(2026, 4, 13), time(9, 0)),
        ]
    );

    let range = AppointmentSearchQuery {
        start_date: Some(date(2026, 4, 13)),
        end_date: Some(date(2026, 4, 30)),
        ..AppointmentSearchQuery::default()
    };
    assert_eq!(service.search_appointments(&range).await.unwrap().len(), 1);
}

#[tokio::test]
async fn search_rejects_inconsistent_date_filters() {
    let service = service_at("2026-04-10T07:00:00Z", 0);

    let inverted = AppointmentSearchQuery {
        start_date: Some(date(2026, 4, 20)),
        end_date: Some(date(2026, 4, 1)),
        ..AppointmentSearchQuery::default()
    };
    assert_matches!(
        service.search_appointments(&inverted).await,
        Err(AppointmentError::Validation(_))
    );

    let mixed = AppointmentSearchQuery {
        date: Some(date(2026, 4, 10)),
        end_date: Some(date(2026, 4, 11)),
        ..AppointmentSearchQuery::default()
    };
    assert_matches!(
        service.search_appointments(&mixed).await,
        Err(AppointmentError::Validation(_))
    );
}

#[tokio::test]
async fn todays_appointments_follow_the_clinic_calendar() {
    // 22:30 UTC on the 10th is already the 11th at UTC+02:00.
    let service = service_at("2026-04-10T22:30:00Z", 120);
    let doctor = Uuid::new_v4();

    service.create_appointment(booking(doctor, date(2026, 4, 10), time(9, 0))).await.unwrap();
    let tomorrow = service
        .create_appointment(booking(doctor, date(2026, 4, 11), time(9, 0)))
        .await
        .unwrap();

    assert_eq!(service.today(), date(2026, 4, 11));
    let today = service.todays_appointments().await.unwrap();
    assert_eq!(today.len(), 1);
    assert_eq!(today[0].id, tomorrow.id);
}

#[tokio::test]
async fn status_walks_through_the_visit() {
    let service = service_at("2026-04-10T07:00:00Z", 0);
    let created = service
        .create_appointment(booking(Uuid::new_v4(), date(2026, 4, 10), time(9, 0)))
        .await
        .unwrap();

    for status in [
        AppointmentStatus::Confirmed,
        AppointmentStatus::InProgress,
        AppointmentStatus::Completed,
    ] {
        let updated = service.update_status(created.id, status).await.unwrap();
        assert_eq!(updated.status, status);
    }

    assert_matches!(
        service.update_status(created.id, AppointmentStatus::Scheduled).await,
        Err(AppointmentError::InvalidStatusTransition {
            from: AppointmentStatus::Completed,
            to: AppointmentStatus::Scheduled
        })
    );
}

#[tokio::test]
async fn same_status_is_a_no_op() {
    let service = service_at("2026-04-10T07:00:00Z", 0);
    let created = service
        .create_appointment(booking(Uuid::new_v4(), date(2026, 4, 10), time(9, 0)))
        .await
        .unwrap();

    let unchanged = service
        .update_status(created.id, AppointmentStatus::Scheduled)
        .await
        .unwrap();
    assert_eq!(unchanged, created);
}

#[tokio::test]
async fn update_reschedules_and_routes_status_through_lifecycle() {
    let service = service_at("2026-04-10T07:00:00Z", 0);
    let created = service
        .create_appointment(booking(Uuid::new_v4(), date(2026, 4, 10), time(9, 0)))
        .await
        .unwrap();

    let moved = service
        .update_appointment(
            created.id,
            UpdateAppointmentRequest {
                appointment_time: Some(time(11, 30)),
                duration_minutes: Some(60),
                status: Some(AppointmentStatus::Confirmed),
                ..UpdateAppointmentRequest::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.appointment_time, time(11, 30));
    assert_eq!(moved.duration_minutes, 60);
    assert_eq!(moved.status, AppointmentStatus::Confirmed);

    assert_matches!(
        service
            .update_appointment(
                created.id,
                UpdateAppointmentRequest {
                    status: Some(AppointmentStatus::Completed),
                    ..UpdateAppointmentRequest::default()
                },
            )
            .await,
        Err(AppointmentError::InvalidStatusTransition { .. })
    );
    // A rejected update leaves the stored appointment untouched.
    assert_eq!(service.get_appointment(created.id).await.unwrap().appointment, moved);
}

#[tokio::test]
async fn finished_appointments_cannot_be_rescheduled() {
    let service = service_at("2026-04-10T07:00:00Z", 0);
    let created = service
        .create_appointment(booking(Uuid::new_v4(), date(2026, 4, 10), time(9, 0)))
        .await
        .unwrap();
    service.update_status(created.id, AppointmentStatus::Cancelled).await.unwrap();

    assert_matches!(
        service
            .update_appointment(
                created.id,
                UpdateAppointmentRequest {
                    appointment_date: Some(date(2026, 4, 17)),
                    ..UpdateAppointmentRequest::default()
                },
            )
            .await,
        Err(AppointmentError::NotReschedulable(AppointmentStatus::Cancelled))
    );

    // Notes remain editable.
    let annotated = service
        .update_appointment(
            created.id,
            UpdateAppointmentRequest {
                notes: Some("Patient called to cancel".to_string()),
                ..UpdateAppointmentRequest::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(annotated.notes.as_deref(), Some("Patient called to cancel"));
}

#[tokio::test]
async fn finished_visits_stay_on_record() {
    let service = service_at("2026-04-10T07:00:00Z", 0);
    let created = service
        .create_appointment(booking(Uuid::new_v4(), date(2026, 4, 10), time(9, 0)))
        .await
        .unwrap();
    for status in [
        AppointmentStatus::Confirmed,
        AppointmentStatus::InProgress,
        AppointmentStatus::Completed,
    ] {
        service.update_status(created.id, status).await.unwrap();
    }

    let kept = service.get_appointment(created.id).await.unwrap();
    assert_eq!(kept.id, created.id);
    assert_eq!(kept.status, AppointmentStatus::Completed);
    assert_eq!(service.todays_appointments().await.unwrap().len(), 1);
}

#[tokio::test]
async fn withdrawn_bookings_are_cancelled_not_erased() {
    let service = service_at("2026-04-10T07:00:00Z", 0);
    let created = service
        .create_appointment(booking(Uuid::new_v4(), date(2026, 4, 14), time(9, 0)))
        .await
        .unwrap();

    service.update_status(created.id, AppointmentStatus::Cancelled).await.unwrap();

    let cancelled = AppointmentSearchQuery {
        status: Some(AppointmentStatus::Cancelled),
        ..AppointmentSearchQuery::default()
    };
    let listed = service.search_appointments(&cancelled).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, created.id);
}

fn registered_patient() -> Patient {
    let now = instant("2026-03-01T09:00:00Z");
    Patient {
        id: Uuid::new_v4(),
        first_name: "Niamh".to_string(),
        last_name: "Kelly".to_string(),
        email: "niamh.kelly@example.ie".to_string(),
        phone: "+353 86 555 0101".to_string(),
        date_of_birth: date(1990, 5, 17),
        address: "9 Harbour Road".to_string(),
        emergency_contact: None,
        emergency_contact_phone: None,
        created_at: now,
        updated_at: now,
    }
}

fn staff_doctor() -> Doctor {
    let now = instant("2026-03-01T09:00:00Z");
    Doctor {
        id: Uuid::new_v4(),
        first_name: "Eoin".to_string(),
        last_name: "Murphy".to_string(),
        email: "eoin.murphy@clinic.example".to_string(),
        phone: "+353 1 555 0177".to_string(),
        specialization: "Dermatology".to_string(),
        gender: Gender::Male,
        location: "Limerick".to_string(),
        availability: None,
        is_active: true,
        status: DoctorStatus::Active,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn reads_embed_patient_and_doctor_summaries() {
    let patients = Arc::new(InMemoryPatientStore::new());
    let doctors = Arc::new(InMemoryDoctorStore::new());
    let patient = patients.insert(registered_patient()).await.unwrap();
    let doctor = doctors.insert(staff_doctor()).await.unwrap();

    let store = InMemoryAppointmentStore::with_directory(patients, doctors);
    let clock = Arc::new(FixedClock::new(instant("2026-04-10T07:00:00Z")));
    let service = AppointmentService::new(Arc::new(store), clock, TestConfig::default().offset());

    let mut request = booking(doctor.id, date(2026, 4, 10), time(9, 0));
    request.patient_id = patient.id;
    let created = service.create_appointment(request).await.unwrap();

    let fetched = service.get_appointment(created.id).await.unwrap();
    assert_eq!(fetched.patient.as_ref().unwrap().last_name, "Kelly");
    assert_eq!(fetched.doctor.as_ref().unwrap().specialization, "Dermatology");

    let today = service.todays_appointments().await.unwrap();
    assert_eq!(today[0].patient.as_ref().unwrap().id, patient.id);

    // Unknown references embed as nothing rather than failing the read.
    let stray = service
        .create_appointment(booking(Uuid::new_v4(), date(2026, 4, 10), time(10, 0)))
        .await
        .unwrap();
    let fetched = service.get_appointment(stray.id).await.unwrap();
    assert!(fetched.patient.is_none());
    assert!(fetched.doctor.is_none());
}
