use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use medshare_core::{
    booking_window, compute_available_slots,
    errors::ShareError,
    models::{
        appointment::{
            Appointment, AppointmentStatus, CancelAppointmentResponse, CreateAppointmentRequest,
        },
        availability::{BookedInstant, CollisionMode, Slot, SlotQuery},
        provider::Role,
    },
};
use medshare_db::models::NewAppointment;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    ApiState, audit,
    handlers::{load_provider, resolve_working_hours},
    middleware::{auth::AuthUser, error_handling::AppError},
};

/// Who the appointment is for, given the caller.
fn booking_patient(user: &AuthUser, requested: Option<Uuid>) -> Result<Uuid, ShareError> {
    match (user.role, requested) {
        (Role::Patient, None) => Ok(user.user_id),
        (Role::Patient, Some(id)) if id == user.user_id => Ok(id),
        (Role::Patient, Some(_)) => Err(ShareError::Authorization(
            "Patients may only book appointments for themselves".to_string(),
        )),
        (Role::Admin, Some(id)) => Ok(id),
        (Role::Admin, None) => Err(ShareError::Validation(
            "patientId is required when booking on a patient's behalf".to_string(),
        )),
        (Role::Provider, _) => Err(ShareError::Authorization(
            "Providers may not book appointments".to_string(),
        )),
    }
}

/// Makes sure the patient has a `users` row before an appointment points at it.
///
/// A patient booking for themselves is mirrored from their token. A patient
/// booked by an admin must already be known.
async fn ensure_patient_row(
    state: &ApiState,
    user: &AuthUser,
    patient_id: Uuid,
) -> Result<(), AppError> {
    if user.role == Role::Patient && user.user_id == patient_id {
        state
            .store
            .upsert_user(user.user_id, user.name.clone(), Role::Patient)
            .await?;
        return Ok(());
    }

    match state.store.get_user(patient_id).await? {
        Some(row) if row.role == Role::Patient.as_str() => Ok(()),
        _ => Err(AppError(ShareError::NotFound(format!(
            "Patient with ID {} not found",
            patient_id
        )))),
    }
}

/// Books an appointment at an open slot
///
/// The requested start time is checked against the provider's availability
/// for that day, computed exactly as the availability endpoint does. A time
/// that is off the slot grid, in the past, on an excluded day, or already
/// booked is rejected with `ShareError::Conflict`.
#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<ApiState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    let patient_id = booking_patient(&user, payload.patient_id)?;
    let provider = load_provider(&state, payload.provider_id).await?;
    let (working_hours, _) = resolve_working_hours(&state, provider.id).await?;

    let start_time = payload.start_time;
    let (fetch_start, fetch_end) = booking_window(start_time, start_time, CollisionMode::Exact)?;
    let booked = state
        .store
        .get_active_appointments(provider.id, fetch_start, fetch_end)
        .await?;

    let slot_query = SlotQuery::new(start_time, start_time, working_hours.clone(), Utc::now())
        .with_booked(booked.iter().map(|a| BookedInstant::from(a.start_time)));
    let open = compute_available_slots(&slot_query)?;
    if !open.contains(&Slot::new(start_time)) {
        return Err(AppError(ShareError::Conflict(format!(
            "{} is not an available slot for this provider",
            start_time
        ))));
    }

    ensure_patient_row(&state, &user, patient_id).await?;

    let created = state
        .store
        .create_appointment(NewAppointment {
            provider_id: provider.id,
            patient_id,
            start_time,
            duration_minutes: working_hours.slot_duration_minutes as i32,
            reason: payload.reason,
        })
        .await?
        .ok_or_else(|| ShareError::Conflict(format!("{} was booked by someone else", start_time)))?;

    audit::record(
        state.store.as_ref(),
        &user,
        audit::APPOINTMENT_CREATE,
        "appointment",
        created.id.to_string(),
        Some(json!({
            "providerId": provider.id,
            "patientId": patient_id,
            "startTime": start_time,
        })),
    )
    .await;

    Ok((StatusCode::CREATED, Json(created.to_appointment()?)))
}

/// Cancels an appointment, freeing its slot
///
/// Allowed for the appointment's patient, its provider, and admins.
#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<ApiState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<CancelAppointmentResponse>, AppError> {
    let appointment = state
        .store
        .get_appointment(id)
        .await?
        .ok_or_else(|| ShareError::NotFound(format!("Appointment with ID {} not found", id)))?;

    let involved = user.user_id == appointment.patient_id || user.user_id == appointment.provider_id;
    if !involved && !user.is_admin() {
        return Err(AppError(ShareError::Authorization(
            "Only the patient, the provider or an admin may cancel this appointment".to_string(),
        )));
    }

    let status: AppointmentStatus = appointment.status.parse()?;
    if !status.blocks_slot() {
        return Err(AppError(ShareError::Conflict(format!(
            "Appointment {} is already cancelled",
            id
        ))));
    }

    let updated = state.store.cancel_appointment(id).await?;

    audit::record(
        state.store.as_ref(),
        &user,
        audit::APPOINTMENT_CANCEL,
        "appointment",
        id.to_string(),
        None,
    )
    .await;

    Ok(Json(CancelAppointmentResponse {
        id: updated.id,
        status: updated.status.parse()?,
        updated_at: Utc::now(),
    }))
}
