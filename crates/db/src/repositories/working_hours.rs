use crate::models::DbWorkingHours;
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub async fn get_working_hours_by_provider_id(
    pool: &Pool<Postgres>,
    provider_id: Uuid,
) -> Result<Option<DbWorkingHours>> {
    let hours = sqlx::query_as::<_, DbWorkingHours>(
        r#"
        SELECT provider_id, start_hour, end_hour, slot_duration_minutes,
               excluded_weekdays, timezone, updated_at
        FROM working_hours
        WHERE provider_id = $1
        "#,
    )
    .bind(provider_id)
    .fetch_optional(pool)
    .await?;

    Ok(hours)
}

pub async fn upsert_working_hours(
    pool: &Pool<Postgres>,
    hours: &DbWorkingHours,
) -> Result<DbWorkingHours> {
    tracing::debug!(
        "Saving working hours: provider_id={}, {}-{} every {} minutes, timezone={}",
        hours.provider_id,
        hours.start_hour,
        hours.end_hour,
        hours.slot_duration_minutes,
        hours.timezone
    );

    let saved = sqlx::query_as::<_, DbWorkingHours>(
        r#"
        INSERT INTO working_hours
            (provider_id, start_hour, end_hour, slot_duration_minutes, excluded_weekdays, timezone, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (provider_id) DO UPDATE
        SET start_hour = EXCLUDED.start_hour,
            end_hour = EXCLUDED.end_hour,
            slot_duration_minutes = EXCLUDED.slot_duration_minutes,
            excluded_weekdays = EXCLUDED.excluded_weekdays,
            timezone = EXCLUDED.timezone,
            updated_at = EXCLUDED.updated_at
        RETURNING provider_id, start_hour, end_hour, slot_duration_minutes,
                  excluded_weekdays, timezone, updated_at
        "#,
    )
    .bind(hours.provider_id)
    .bind(hours.start_hour)
    .bind(hours.end_hour)
    .bind(hours.slot_duration_minutes)
    .bind(&hours.excluded_weekdays)
    .bind(&hours.timezone)
    .bind(hours.updated_at)
    .fetch_one(pool)
    .await?;

    Ok(saved)
}
