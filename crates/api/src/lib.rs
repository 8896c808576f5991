//! # MedShare API
//!
//! The API crate provides the web server for MedShare scheduling: provider
//! availability, appointment booking and cancellation, and working-hours
//! settings.
//!
//! ## Architecture
//!
//! This crate follows a layered architecture:
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Gather inputs, call the core calculator, shape responses
//! - **Middleware**: Token verification, role policy, and error mapping
//! - **Audit**: Records who looked at or changed scheduling data
//! - **Config**: Handle environment and application configuration
//!
//! Handlers reach persistence only through the `ClinicStore` trait, so the
//! whole router can run against a mock store in tests.

/// Audit trail of scheduling access
pub mod audit;
/// Configuration module for API settings
pub mod config;
/// Request handlers
pub mod handlers;
/// Middleware for authentication, authorization, and error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
};
use eyre::Result;
use medshare_db::ClinicStore;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

/// Shared application state that is accessible to all request handlers
pub struct ApiState {
    /// Persistence for providers, appointments, settings and audit entries
    pub store: Arc<dyn ClinicStore>,
    pub config: config::ApiConfig,
}

/// Builds the router with every route, authentication, and request tracing.
///
/// CORS and request timeouts are added by [`start_server`].
pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        // Liveness and build info
        .merge(routes::health::routes())
        // Availability and working-hours endpoints
        .merge(routes::availability::routes())
        // Appointment booking endpoints
        .merge(routes::appointment::routes())
        // Only runs for matched routes, so unknown paths still 404
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_origin(origins)
        .allow_credentials(true)
}

/// Starts the API server with the provided configuration and store
///
/// Initializes logging, assembles the router, and serves until the listener
/// fails.
pub async fn start_server(config: config::ApiConfig, store: Arc<dyn ClinicStore>) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let addr = config.server_addr();
    let timeout = Duration::from_secs(config.request_timeout);
    let cors_origins = config.cors_origins.clone();

    let state = Arc::new(ApiState { store, config });
    let app = build_router(state);

    // Apply CORS configuration if origins are specified
    let app = match cors_origins {
        Some(origins) => app.layer(cors_layer(&origins)),
        None => app,
    };

    let app = app.layer(ServiceBuilder::new().layer(TimeoutLayer::new(timeout)));

    // Start the HTTP server
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
