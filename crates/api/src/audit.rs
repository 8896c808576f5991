//! Audit trail for access to patient-facing scheduling data.
//!
//! Every entry is emitted as a structured tracing event and persisted through
//! the store. A failed write is logged but never fails the request it
//! describes.

use medshare_db::{ClinicStore, models::NewAuditEntry};
use serde_json::Value;

use crate::middleware::auth::AuthUser;

pub const AVAILABILITY_CHECK: &str = "availability.check";
pub const APPOINTMENT_CREATE: &str = "appointment.create";
pub const APPOINTMENT_CANCEL: &str = "appointment.cancel";
pub const WORKING_HOURS_UPDATE: &str = "working_hours.update";

pub async fn record(
    store: &dyn ClinicStore,
    actor: &AuthUser,
    action: &str,
    resource_type: &str,
    resource_id: String,
    detail: Option<Value>,
) {
    tracing::info!(
        actor_id = %actor.user_id,
        actor_role = %actor.role,
        action = action,
        resource_type = resource_type,
        resource_id = %resource_id,
        "Audit: {} {}/{}",
        action,
        resource_type,
        resource_id
    );

    let entry = NewAuditEntry {
        actor_id: actor.user_id,
        action: action.to_string(),
        resource_type: resource_type.to_string(),
        resource_id,
        detail,
    };

    if let Err(e) = store.record_audit(entry).await {
        tracing::error!("Failed to write audit entry for {}: {:?}", action, e);
    }
}
