use axum::http::StatusCode;
use chrono::Duration;
use medshare_core::models::{
    availability::{AvailabilityResponse, Slot},
    provider::Role,
};
use medshare_db::{MockClinicStore, models::DbWorkingHours};
use mockall::predicate;
use pretty_assertions::assert_eq;
use uuid::Uuid;

use crate::test_utils::*;

fn availability_path(provider_id: Uuid) -> String {
    format!("/api/providers/{}/availability", provider_id)
}

#[test_log::test(tokio::test)]
async fn test_availability_with_default_hours_skips_booked_slot() {
    let provider_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let provider = provider_row(provider_id);
    let provider_name = provider.name.clone();
    let range_start = june_2099(1, 0, 0);
    let range_end = june_2099(5, 23, 59);

    let mut store = MockClinicStore::new();
    store
        .expect_get_provider()
        .with(predicate::eq(provider_id))
        .times(1)
        .returning(move |_| Ok(Some(provider.clone())));
    store
        .expect_get_working_hours()
        .times(1)
        .returning(|_| Ok(None));
    store
        .expect_get_active_appointments()
        .withf(move |id, start, end| {
            *id == provider_id
                && *start == range_start - Duration::days(1)
                && *end == range_end + Duration::days(1)
        })
        .times(1)
        .returning(move |_, _, _| {
            Ok(vec![appointment_row(
                provider_id,
                patient_id,
                june_2099(1, 9, 0),
                "scheduled",
            )])
        });
    expect_audit(&mut store, "availability.check");

    let (name, value) = bearer(patient_id, Role::Patient);
    let response = server(store)
        .get(&availability_path(provider_id))
        .add_query_param("start", "2099-06-01T00:00:00Z")
        .add_query_param("end", "2099-06-05T23:59:00Z")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<AvailabilityResponse>();
    assert_eq!(body.provider_id, provider_id);
    assert_eq!(body.provider_name, provider_name);
    // Five weekdays of sixteen half-hour slots, less the booking
    assert_eq!(body.available_slots.len(), 79);
    assert_eq!(body.available_slots[0], Slot::new(june_2099(1, 9, 30)));
    assert_eq!(body.working_hours.slot_duration_minutes, 30);
}

#[tokio::test]
async fn test_availability_serializes_slots_as_iso_strings() {
    let provider_id = Uuid::new_v4();

    let mut store = MockClinicStore::new();
    store
        .expect_get_provider()
        .returning(move |_| Ok(Some(provider_row(provider_id))));
    store.expect_get_working_hours().returning(|_| Ok(None));
    store
        .expect_get_active_appointments()
        .returning(|_, _, _| Ok(vec![]));
    expect_audit(&mut store, "availability.check");

    let (name, value) = bearer(Uuid::new_v4(), Role::Patient);
    let response = server(store)
        .get(&availability_path(provider_id))
        .add_query_param("startDate", "2099-06-01T00:00:00Z")
        .add_query_param("endDate", "2099-06-01T23:00:00Z")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["availableSlots"][0], "2099-06-01T09:00:00.000Z");
    assert_eq!(body["availableSlots"][15], "2099-06-01T16:30:00.000Z");
    assert_eq!(body["workingHours"]["slotDurationMinutes"], 30);
}

#[tokio::test]
async fn test_availability_over_weekend_is_empty() {
    let provider_id = Uuid::new_v4();

    let mut store = MockClinicStore::new();
    store
        .expect_get_provider()
        .returning(move |_| Ok(Some(provider_row(provider_id))));
    store.expect_get_working_hours().returning(|_| Ok(None));
    store
        .expect_get_active_appointments()
        .returning(|_, _, _| Ok(vec![]));
    expect_audit(&mut store, "availability.check");

    let (name, value) = bearer(Uuid::new_v4(), Role::Patient);
    let response = server(store)
        .get(&availability_path(provider_id))
        .add_query_param("start", "2099-06-06T00:00:00Z")
        .add_query_param("end", "2099-06-07T23:59:00Z")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.json::<AvailabilityResponse>().available_slots.is_empty());
}

#[tokio::test]
async fn test_availability_uses_stored_working_hours() {
    let provider_id = Uuid::new_v4();

    let mut store = MockClinicStore::new();
    store
        .expect_get_provider()
        .returning(move |_| Ok(Some(provider_row(provider_id))));
    store.expect_get_working_hours().returning(move |_| {
        Ok(Some(DbWorkingHours {
            provider_id,
            start_hour: 10,
            end_hour: 12,
            slot_duration_minutes: 60,
            excluded_weekdays: vec![],
            timezone: "UTC".to_string(),
            updated_at: june_2099(1, 0, 0),
        }))
    });
    store
        .expect_get_active_appointments()
        .returning(|_, _, _| Ok(vec![]));
    expect_audit(&mut store, "availability.check");

    let (name, value) = bearer(Uuid::new_v4(), Role::Admin);
    let response = server(store)
        .get(&availability_path(provider_id))
        .add_query_param("start", "2099-06-06T00:00:00Z")
        .add_query_param("end", "2099-06-06T23:59:00Z")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<AvailabilityResponse>();
    assert_eq!(
        body.available_slots,
        vec![Slot::new(june_2099(6, 10, 0)), Slot::new(june_2099(6, 11, 0))]
    );
    assert!(body.working_hours.excluded_weekdays.is_empty());
}

#[tokio::test]
async fn test_availability_overlap_mode_blocks_covered_slots() {
    let provider_id = Uuid::new_v4();
    let range_start = june_2099(1, 0, 0);

    let mut store = MockClinicStore::new();
    store
        .expect_get_provider()
        .returning(move |_| Ok(Some(provider_row(provider_id))));
    store.expect_get_working_hours().returning(|_| Ok(None));
    store
        .expect_get_active_appointments()
        .withf(move |_, start, _| {
            *start == range_start - Duration::days(1) - Duration::minutes(45)
        })
        .returning(move |_, _, _| {
            Ok(vec![appointment_row(
                provider_id,
                Uuid::new_v4(),
                june_2099(1, 9, 10),
                "scheduled",
            )])
        });
    expect_audit(&mut store, "availability.check");

    let (name, value) = bearer(Uuid::new_v4(), Role::Patient);
    let response = server(store)
        .get(&availability_path(provider_id))
        .add_query_param("start", "2099-06-01T00:00:00Z")
        .add_query_param("end", "2099-06-01T23:00:00Z")
        .add_query_param("collision", "overlap")
        .add_query_param("bookingMinutes", "45")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<AvailabilityResponse>();
    // 09:10-09:55 covers the 09:00 and 09:30 slots
    assert_eq!(body.available_slots.len(), 14);
    assert_eq!(body.available_slots[0], Slot::new(june_2099(1, 10, 0)));
}

#[tokio::test]
async fn test_availability_range_too_long() {
    let provider_id = Uuid::new_v4();

    let mut store = MockClinicStore::new();
    store
        .expect_get_provider()
        .returning(move |_| Ok(Some(provider_row(provider_id))));
    store.expect_get_working_hours().returning(|_| Ok(None));
    store.expect_get_active_appointments().never();
    store.expect_record_audit().never();

    let (name, value) = bearer(Uuid::new_v4(), Role::Patient);
    let response = server(store)
        .get(&availability_path(provider_id))
        .add_query_param("start", "2099-01-01T00:00:00Z")
        .add_query_param("end", "2099-12-31T00:00:00Z")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body = response.json::<serde_json::Value>();
    assert!(body["error"].as_str().unwrap().starts_with("Invalid range"));
}

#[tokio::test]
async fn test_availability_unknown_provider() {
    let mut store = MockClinicStore::new();
    store.expect_get_provider().times(1).returning(|_| Ok(None));
    store.expect_get_working_hours().never();

    let (name, value) = bearer(Uuid::new_v4(), Role::Patient);
    let response = server(store)
        .get(&availability_path(Uuid::new_v4()))
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_availability_survives_audit_failure() {
    let provider_id = Uuid::new_v4();

    let mut store = MockClinicStore::new();
    store
        .expect_get_provider()
        .returning(move |_| Ok(Some(provider_row(provider_id))));
    store.expect_get_working_hours().returning(|_| Ok(None));
    store
        .expect_get_active_appointments()
        .returning(|_, _, _| Ok(vec![]));
    store
        .expect_record_audit()
        .times(1)
        .returning(|_| Err(eyre::eyre!("audit table unavailable")));

    let (name, value) = bearer(Uuid::new_v4(), Role::Patient);
    let response = server(store)
        .get(&availability_path(provider_id))
        .add_query_param("start", "2099-06-01T00:00:00Z")
        .add_query_param("end", "2099-06-01T23:00:00Z")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<AvailabilityResponse>().available_slots.len(), 16);
}

#[tokio::test]
async fn test_availability_database_error() {
    let mut store = MockClinicStore::new();
    store
        .expect_get_provider()
        .returning(|_| Err(eyre::eyre!("connection reset")));

    let (name, value) = bearer(Uuid::new_v4(), Role::Patient);
    let response = server(store)
        .get(&availability_path(Uuid::new_v4()))
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

/// Provider and default hours resolve; bookings must never be loaded.
fn store_rejecting_before_bookings(provider_id: Uuid) -> MockClinicStore {
    let mut store = MockClinicStore::new();
    store
        .expect_get_provider()
        .returning(move |_| Ok(Some(provider_row(provider_id))));
    store.expect_get_working_hours().returning(|_| Ok(None));
    store.expect_get_active_appointments().never();
    store.expect_record_audit().never();
    store
}

#[tokio::test]
async fn test_availability_at_earliest_representable_date_is_invalid_range() {
    let provider_id = Uuid::new_v4();

    let (name, value) = bearer(Uuid::new_v4(), Role::Patient);
    let response = server(store_rejecting_before_bookings(provider_id))
        .get(&availability_path(provider_id))
        .add_query_param("start", "-262143-01-01T00:00:00Z")
        .add_query_param("end", "-262143-01-01T00:00:00Z")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body = response.json::<serde_json::Value>();
    assert!(body["error"].as_str().unwrap().starts_with("Invalid range"));
}

#[tokio::test]
async fn test_availability_default_end_past_latest_date_is_invalid_range() {
    let provider_id = Uuid::new_v4();

    let (name, value) = bearer(Uuid::new_v4(), Role::Patient);
    let response = server(store_rejecting_before_bookings(provider_id))
        .get(&availability_path(provider_id))
        .add_query_param("start", "+262142-12-31T00:00:00Z")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body = response.json::<serde_json::Value>();
    assert!(body["error"].as_str().unwrap().starts_with("Invalid range"));
}

#[tokio::test]
async fn test_availability_with_corrupt_stored_hours_is_server_error() {
    let provider_id = Uuid::new_v4();

    let mut store = MockClinicStore::new();
    store
        .expect_get_provider()
        .returning(move |_| Ok(Some(provider_row(provider_id))));
    store.expect_get_working_hours().returning(move |_| {
        Ok(Some(DbWorkingHours {
            provider_id,
            start_hour: 9,
            end_hour: 17,
            slot_duration_minutes: 45,
            excluded_weekdays: vec![],
            timezone: "UTC".to_string(),
            updated_at: june_2099(1, 0, 0),
        }))
    });
    store.expect_get_active_appointments().never();

    let (name, value) = bearer(Uuid::new_v4(), Role::Patient);
    let response = server(store)
        .get(&availability_path(provider_id))
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}
