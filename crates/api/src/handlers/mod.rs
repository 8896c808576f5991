pub mod appointment;
pub mod availability;
pub mod working_hours;

use medshare_core::{errors::ShareError, models::availability::WorkingHours};
use medshare_db::models::{DbUser, DbWorkingHours};
use uuid::Uuid;

use crate::{ApiState, middleware::error_handling::AppError};

async fn load_provider(state: &ApiState, provider_id: Uuid) -> Result<DbUser, AppError> {
    let provider = state
        .store
        .get_provider(provider_id)
        .await?
        .ok_or_else(|| ShareError::NotFound(format!("Provider with ID {} not found", provider_id)))?;
    Ok(provider)
}

/// Stored settings for the provider, or the configured default.
///
/// The flag is true when the default was used.
async fn resolve_working_hours(
    state: &ApiState,
    provider_id: Uuid,
) -> Result<(WorkingHours, bool), AppError> {
    match state.store.get_working_hours(provider_id).await? {
        Some(stored) => Ok((stored_working_hours(&stored)?, false)),
        None => Ok((state.config.default_working_hours.clone(), true)),
    }
}

/// Converts a stored settings row.
///
/// A row that fails validation is reported as an internal error.
fn stored_working_hours(stored: &DbWorkingHours) -> Result<WorkingHours, AppError> {
    stored.to_working_hours().map_err(|e| {
        tracing::error!(provider_id = %stored.provider_id, "Stored working hours are corrupt: {}", e);
        AppError(ShareError::Internal(Box::new(e)))
    })
}
