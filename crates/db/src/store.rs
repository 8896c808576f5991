//! Persistence seam used by the API.
//!
//! Handlers depend on [`ClinicStore`] rather than on a connection pool so they
//! can be exercised against [`MockClinicStore`] in tests. [`PgStore`] forwards
//! to the repository functions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::Result;
use medshare_core::models::provider::Role;
use mockall::automock;
use uuid::Uuid;

use crate::{
    DbPool,
    models::{DbAppointment, DbUser, DbWorkingHours, NewAppointment, NewAuditEntry},
    repositories,
};

#[automock]
#[async_trait]
pub trait ClinicStore: Send + Sync {
    /// A user with the provider role, if one exists with this id.
    async fn get_provider(&self, id: Uuid) -> Result<Option<DbUser>>;

    async fn get_user(&self, id: Uuid) -> Result<Option<DbUser>>;

    /// Creates or refreshes the row for a verified caller.
    async fn upsert_user(&self, id: Uuid, name: Option<String>, role: Role) -> Result<DbUser>;

    async fn get_working_hours(&self, provider_id: Uuid) -> Result<Option<DbWorkingHours>>;

    async fn save_working_hours(&self, hours: DbWorkingHours) -> Result<DbWorkingHours>;

    /// Non-cancelled appointments starting within `[start, end]`.
    async fn get_active_appointments(
        &self,
        provider_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DbAppointment>>;

    /// `None` when the slot was taken concurrently.
    async fn create_appointment(&self, appointment: NewAppointment) -> Result<Option<DbAppointment>>;

    async fn get_appointment(&self, id: Uuid) -> Result<Option<DbAppointment>>;

    async fn cancel_appointment(&self, id: Uuid) -> Result<DbAppointment>;

    async fn record_audit(&self, entry: NewAuditEntry) -> Result<()>;
}

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClinicStore for PgStore {
    async fn get_provider(&self, id: Uuid) -> Result<Option<DbUser>> {
        repositories::user::get_provider_by_id(&self.pool, id).await
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<DbUser>> {
        repositories::user::get_user_by_id(&self.pool, id).await
    }

    async fn upsert_user(&self, id: Uuid, name: Option<String>, role: Role) -> Result<DbUser> {
        repositories::user::upsert_user(&self.pool, id, name.as_deref(), role).await
    }

    async fn get_working_hours(&self, provider_id: Uuid) -> Result<Option<DbWorkingHours>> {
        repositories::working_hours::get_working_hours_by_provider_id(&self.pool, provider_id).await
    }

    async fn save_working_hours(&self, hours: DbWorkingHours) -> Result<DbWorkingHours> {
        repositories::working_hours::upsert_working_hours(&self.pool, &hours).await
    }

    async fn get_active_appointments(
        &self,
        provider_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DbAppointment>> {
        repositories::appointment::get_active_appointments_in_range(&self.pool, provider_id, start, end)
            .await
    }

    async fn create_appointment(&self, appointment: NewAppointment) -> Result<Option<DbAppointment>> {
        repositories::appointment::create_appointment(&self.pool, &appointment).await
    }

    async fn get_appointment(&self, id: Uuid) -> Result<Option<DbAppointment>> {
        repositories::appointment::get_appointment_by_id(&self.pool, id).await
    }

    async fn cancel_appointment(&self, id: Uuid) -> Result<DbAppointment> {
        repositories::appointment::update_appointment_status(&self.pool, id, "cancelled").await
    }

    async fn record_audit(&self, entry: NewAuditEntry) -> Result<()> {
        repositories::audit::record_audit_entry(&self.pool, &entry).await?;
        Ok(())
    }
}
