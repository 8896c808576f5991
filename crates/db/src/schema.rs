use eyre::Result;
use sqlx::{Executor, Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Users mirrored from the identity provider
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            role VARCHAR(32) NOT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_role CHECK (role IN ('patient', 'provider', 'admin'))
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Per-provider working hours; weekdays use 0=Sunday numbering
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS working_hours (
            provider_id UUID PRIMARY KEY REFERENCES users(id),
            start_hour SMALLINT NOT NULL,
            end_hour SMALLINT NOT NULL,
            slot_duration_minutes SMALLINT NOT NULL,
            excluded_weekdays SMALLINT[] NOT NULL DEFAULT '{0,6}',
            timezone VARCHAR(64) NOT NULL DEFAULT 'UTC',
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_hours CHECK (start_hour >= 0 AND end_hour <= 23 AND start_hour < end_hour),
            CONSTRAINT valid_slot_duration CHECK (slot_duration_minutes > 0)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create appointments table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS appointments (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            provider_id UUID NOT NULL REFERENCES users(id),
            patient_id UUID NOT NULL REFERENCES users(id),
            start_time TIMESTAMP WITH TIME ZONE NOT NULL,
            duration_minutes INTEGER NOT NULL,
            status VARCHAR(32) NOT NULL DEFAULT 'scheduled',
            reason TEXT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_status CHECK (status IN ('scheduled', 'completed', 'cancelled')),
            CONSTRAINT valid_duration CHECK (duration_minutes > 0)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create audit_log table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS audit_log (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            actor_id UUID NOT NULL,
            action VARCHAR(64) NOT NULL,
            resource_type VARCHAR(64) NOT NULL,
            resource_id VARCHAR(255) NOT NULL,
            detail JSONB NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Several statements in one string need the simple query protocol
    pool.execute(
        r#"
        CREATE INDEX IF NOT EXISTS idx_appointments_provider_start ON appointments(provider_id, start_time);
        CREATE INDEX IF NOT EXISTS idx_appointments_patient_id ON appointments(patient_id);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_appointments_active_slot
            ON appointments(provider_id, start_time) WHERE status <> 'cancelled';
        CREATE INDEX IF NOT EXISTS idx_audit_log_actor_id ON audit_log(actor_id);
        CREATE INDEX IF NOT EXISTS idx_audit_log_created_at ON audit_log(created_at);
        "#,
    )
    .await?;

    info!("Database schema initialized successfully.");
    Ok(())
}
