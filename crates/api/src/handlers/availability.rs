//! # Availability Handlers
//!
//! Answers "when can I book this provider?" for a date range.
//!
//! The handler gathers everything the pure calculator needs and nothing more:
//!
//! 1. Resolve the provider and their working hours (stored or default)
//! 2. Normalize the requested range and reject spans over the configured limit
//! 3. Load the provider's non-cancelled appointments around the range
//! 4. Run `compute_available_slots` with the current time
//! 5. Record an audit entry naming the requester

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Duration, Utc};
use medshare_core::{
    booking_window, compute_available_slots,
    errors::ShareError,
    models::availability::{AvailabilityResponse, BookedInstant, CollisionMode, SlotQuery},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    ApiState, audit,
    handlers::{load_provider, resolve_working_hours},
    middleware::{auth::AuthUser, error_handling::AppError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionParam {
    Exact,
    Overlap,
}

/// Query parameters for the availability endpoint
///
/// * `start`/`end` - ISO-8601 date-times; `startDate`/`endDate` are accepted too
/// * `collision` - `exact` (default) or `overlap`
/// * `bookingMinutes` - booking length for `overlap`; defaults to the slot length
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    #[serde(alias = "startDate")]
    pub start: Option<DateTime<Utc>>,

    #[serde(alias = "endDate")]
    pub end: Option<DateTime<Utc>>,

    pub collision: Option<CollisionParam>,

    pub booking_minutes: Option<u32>,
}

/// Lists the open appointment slots of a provider
///
/// # Endpoint
///
/// ```text
/// GET /api/providers/:id/availability?start=2024-06-03T00:00:00Z&end=2024-06-07T23:59:59Z
/// ```
///
/// # Errors
///
/// * `ShareError::NotFound` - No provider with this ID
/// * `ShareError::InvalidRange` - The range spans more than the configured maximum,
///   or sits at the edge of the representable dates
/// * `ShareError::InvalidConfiguration` - Stored working hours are malformed
/// * `ShareError::Database` - Database error
#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<ApiState>>,
    Extension(user): Extension<AuthUser>,
    Path(provider_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let provider = load_provider(&state, provider_id).await?;
    let (working_hours, _) = resolve_working_hours(&state, provider_id).await?;

    let now = Utc::now();
    let range_start = query.start.unwrap_or(now);
    let range_end = match query.end {
        Some(end) => end,
        None => range_start
            .checked_add_signed(Duration::days(state.config.default_range_days))
            .ok_or_else(|| {
                ShareError::InvalidRange(format!("{} is too far in the future", range_start))
            })?,
    };
    if range_end - range_start > Duration::days(state.config.max_range_days) {
        return Err(AppError(ShareError::InvalidRange(format!(
            "Availability can be requested for at most {} days",
            state.config.max_range_days
        ))));
    }

    let collision = match query.collision.unwrap_or(CollisionParam::Exact) {
        CollisionParam::Exact => CollisionMode::Exact,
        CollisionParam::Overlap => CollisionMode::Overlap {
            booking_minutes: query
                .booking_minutes
                .unwrap_or(working_hours.slot_duration_minutes),
        },
    };

    let (fetch_start, fetch_end) = booking_window(range_start, range_end, collision)?;
    let appointments = state
        .store
        .get_active_appointments(provider_id, fetch_start, fetch_end)
        .await?;

    let slot_query = SlotQuery::new(range_start, range_end, working_hours.clone(), now)
        .with_booked(appointments.iter().map(|a| BookedInstant::from(a.start_time)))
        .with_collision(collision);
    let available_slots = compute_available_slots(&slot_query)?;

    tracing::debug!(
        "Computed {} slots for provider {} between {} and {}",
        available_slots.len(),
        provider_id,
        range_start,
        range_end
    );

    audit::record(
        state.store.as_ref(),
        &user,
        audit::AVAILABILITY_CHECK,
        "provider",
        provider_id.to_string(),
        Some(json!({
            "start": range_start,
            "end": range_end,
            "slots": available_slots.len(),
        })),
    )
    .await;

    Ok(Json(AvailabilityResponse {
        provider_id: provider.id,
        provider_name: provider.name,
        available_slots,
        working_hours,
    }))
}
