use crate::models::{DbAppointment, NewAppointment};
use chrono::{DateTime, Utc};
use eyre::{Result, eyre};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

/// Inserts a scheduled appointment.
///
/// Returns `None` when the provider already has an active appointment at the
/// same start time.
pub async fn create_appointment(
    pool: &Pool<Postgres>,
    appointment: &NewAppointment,
) -> Result<Option<DbAppointment>> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let created = sqlx::query_as::<_, DbAppointment>(
        r#"
        INSERT INTO appointments
            (id, provider_id, patient_id, start_time, duration_minutes, status, reason, created_at)
        VALUES ($1, $2, $3, $4, $5, 'scheduled', $6, $7)
        ON CONFLICT DO NOTHING
        RETURNING id, provider_id, patient_id, start_time, duration_minutes, status, reason, created_at
        "#,
    )
    .bind(id)
    .bind(appointment.provider_id)
    .bind(appointment.patient_id)
    .bind(appointment.start_time)
    .bind(appointment.duration_minutes)
    .bind(&appointment.reason)
    .bind(now)
    .fetch_optional(pool)
    .await?;

    match &created {
        Some(_) => tracing::debug!("Appointment created: id={}", id),
        None => tracing::debug!(
            "Appointment slot already taken: provider_id={}, start_time={}",
            appointment.provider_id,
            appointment.start_time
        ),
    }
    Ok(created)
}

pub async fn get_appointment_by_id(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<DbAppointment>> {
    let appointment = sqlx::query_as::<_, DbAppointment>(
        r#"
        SELECT id, provider_id, patient_id, start_time, duration_minutes, status, reason, created_at
        FROM appointments
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(appointment)
}

/// Non-cancelled appointments of a provider starting within `[start, end]`.
pub async fn get_active_appointments_in_range(
    pool: &Pool<Postgres>,
    provider_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<DbAppointment>> {
    let appointments = sqlx::query_as::<_, DbAppointment>(
        r#"
        SELECT id, provider_id, patient_id, start_time, duration_minutes, status, reason, created_at
        FROM appointments
        WHERE provider_id = $1
          AND status <> 'cancelled'
          AND start_time >= $2
          AND start_time <= $3
        ORDER BY start_time ASC
        "#,
    )
    .bind(provider_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(appointments)
}

pub async fn update_appointment_status(
    pool: &Pool<Postgres>,
    id: Uuid,
    status: &str,
) -> Result<DbAppointment> {
    let updated = sqlx::query_as::<_, DbAppointment>(
        r#"
        UPDATE appointments
        SET status = $2
        WHERE id = $1
        RETURNING id, provider_id, patient_id, start_time, duration_minutes, status, reason, created_at
        "#,
    )
    .bind(id)
    .bind(status)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| eyre!("Appointment not found"))?;

    Ok(updated)
}
