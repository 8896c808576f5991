use axum::{routing::get, Router};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/providers/:id/availability",
            get(handlers::availability::get_availability),
        )
        .route(
            "/api/providers/:id/working-hours",
            get(handlers::working_hours::get_working_hours)
                .put(handlers::working_hours::update_working_hours),
        )
}
