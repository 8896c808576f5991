use crate::models::{DbAuditEntry, NewAuditEntry};
use chrono::Utc;
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub async fn record_audit_entry(pool: &Pool<Postgres>, entry: &NewAuditEntry) -> Result<DbAuditEntry> {
    let saved = sqlx::query_as::<_, DbAuditEntry>(
        r#"
        INSERT INTO audit_log (id, actor_id, action, resource_type, resource_id, detail, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, actor_id, action, resource_type, resource_id, detail, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(entry.actor_id)
    .bind(&entry.action)
    .bind(&entry.resource_type)
    .bind(&entry.resource_id)
    .bind(&entry.detail)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(saved)
}
