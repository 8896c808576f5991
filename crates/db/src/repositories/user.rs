use crate::models::DbUser;
use eyre::Result;
use medshare_core::models::provider::Role;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub async fn get_provider_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbUser>> {
    let provider = sqlx::query_as::<_, DbUser>(
        r#"
        SELECT id, name, role, created_at
        FROM users
        WHERE id = $1 AND role = 'provider'
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    if provider.is_none() {
        tracing::debug!("Provider not found: id={}", id);
    }

    Ok(provider)
}

pub async fn get_user_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(
        r#"
        SELECT id, name, role, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Mirrors an identity provider account into `users`.
///
/// The role always follows the token. A missing name keeps the stored one,
/// or is stored empty for a new row.
pub async fn upsert_user(
    pool: &Pool<Postgres>,
    id: Uuid,
    name: Option<&str>,
    role: Role,
) -> Result<DbUser> {
    tracing::debug!("Mirroring user: id={}, role={}", id, role);

    let user = sqlx::query_as::<_, DbUser>(
        r#"
        INSERT INTO users (id, name, role)
        VALUES ($1, COALESCE($2, ''), $3)
        ON CONFLICT (id) DO UPDATE
        SET name = COALESCE($2, users.name),
            role = EXCLUDED.role
        RETURNING id, name, role, created_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;

    Ok(user)
}
