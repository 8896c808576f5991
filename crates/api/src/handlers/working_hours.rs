use axum::{
    Extension, Json,
    extract::{Path, State},
};
use medshare_core::{
    errors::ShareError,
    models::{
        availability::{UpdateWorkingHoursRequest, WorkingHoursResponse},
        provider::Role,
    },
};
use medshare_db::models::DbWorkingHours;
use serde_json::to_value;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    ApiState, audit,
    handlers::{load_provider, resolve_working_hours, stored_working_hours},
    middleware::{auth::AuthUser, error_handling::AppError},
};

#[axum::debug_handler]
pub async fn get_working_hours(
    State(state): State<Arc<ApiState>>,
    Path(provider_id): Path<Uuid>,
) -> Result<Json<WorkingHoursResponse>, AppError> {
    load_provider(&state, provider_id).await?;
    let (working_hours, is_default) = resolve_working_hours(&state, provider_id).await?;

    Ok(Json(WorkingHoursResponse {
        provider_id,
        working_hours,
        is_default,
    }))
}

#[axum::debug_handler]
pub async fn update_working_hours(
    State(state): State<Arc<ApiState>>,
    Extension(user): Extension<AuthUser>,
    Path(provider_id): Path<Uuid>,
    Json(payload): Json<UpdateWorkingHoursRequest>,
) -> Result<Json<WorkingHoursResponse>, AppError> {
    if user.role == Role::Provider && user.user_id != provider_id {
        return Err(AppError(ShareError::Authorization(
            "Providers may only change their own working hours".to_string(),
        )));
    }

    let working_hours = payload.into_working_hours()?;
    if user.role == Role::Provider {
        // Providers are mirrored on first use
        state
            .store
            .upsert_user(user.user_id, user.name.clone(), Role::Provider)
            .await?;
    }
    load_provider(&state, provider_id).await?;

    let saved = state
        .store
        .save_working_hours(DbWorkingHours::from_working_hours(provider_id, &working_hours))
        .await?;

    audit::record(
        state.store.as_ref(),
        &user,
        audit::WORKING_HOURS_UPDATE,
        "provider",
        provider_id.to_string(),
        to_value(&working_hours).ok(),
    )
    .await;

    Ok(Json(WorkingHoursResponse {
        provider_id,
        working_hours: stored_working_hours(&saved)?,
        is_default: false,
    }))
}
