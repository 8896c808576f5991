//! # API Configuration Module
//!
//! This module handles loading and managing configuration for the MedShare API server.
//! It retrieves configuration values from environment variables and provides defaults
//! where appropriate.
//!
//! ## Environment Variables
//!
//! The following environment variables are used:
//!
//! - `API_HOST`: The host address to bind the server to (default: "0.0.0.0")
//! - `API_PORT`: The port to listen on (default: 3000)
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `LOG_LEVEL`: Logging level (default: "info")
//! - `API_CORS_ORIGINS`: Comma-separated list of allowed CORS origins
//! - `JWT_SECRET`: Secret used to verify identity provider tokens (required)
//! - `JWT_AUDIENCE`: Expected `aud` claim; unchecked when unset
//! - `API_REQUEST_TIMEOUT_SECONDS`: Request timeout (default: 30)
//! - `API_MAX_RANGE_DAYS`: Longest availability range a request may ask for (default: 62)
//! - `API_DEFAULT_RANGE_DAYS`: Range used when a request gives no end (default: 7)
//! - `DEFAULT_WORKDAY_START`, `DEFAULT_WORKDAY_END`, `DEFAULT_SLOT_MINUTES`,
//!   `DEFAULT_TIMEZONE`: Working hours for providers without stored settings
//!   (default: 9, 17, 30, "UTC")

use eyre::{Result, WrapErr};
use medshare_core::models::availability::{WorkingHours, parse_timezone};
use std::{env, str::FromStr};
use tracing::Level;

/// Configuration for the MedShare API server
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host address for the API server (e.g., "127.0.0.1", "0.0.0.0")
    pub host: String,

    /// Port for the API server to listen on
    pub port: u16,

    /// PostgreSQL database connection string
    pub database_url: String,

    /// Log level for the application
    pub log_level: Level,

    /// CORS allowed origins (optional)
    pub cors_origins: Option<Vec<String>>,

    /// HS256 secret shared with the identity provider
    pub jwt_secret: String,

    pub jwt_audience: Option<String>,

    /// Request timeout in seconds
    pub request_timeout: u64,

    pub max_range_days: i64,

    pub default_range_days: i64,

    /// Working hours applied to providers that have none stored
    pub default_working_hours: WorkingHours,
}

fn var_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .wrap_err_with(|| format!("Invalid {} value", name)),
        Err(_) => Ok(default),
    }
}

impl ApiConfig {
    /// Creates a new ApiConfig from environment variables
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - `DATABASE_URL` or `JWT_SECRET` is not set
    /// - A numeric variable cannot be parsed
    /// - The default working hours are malformed
    pub fn from_env() -> Result<Self> {
        // Network settings
        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = var_or("API_PORT", 3000u16)?;

        // Database settings
        let database_url = env::var("DATABASE_URL")
            .wrap_err("DATABASE_URL environment variable must be set")?;

        // Logging settings
        let log_level = match env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()).as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        // CORS settings
        let cors_origins = env::var("API_CORS_ORIGINS").ok().map(|origins| {
            origins.split(',').map(|s| s.trim().to_string()).collect()
        });

        // Security settings
        let jwt_secret = env::var("JWT_SECRET")
            .wrap_err("JWT_SECRET environment variable must be set")?;
        let jwt_audience = env::var("JWT_AUDIENCE").ok();

        // Performance settings
        let request_timeout = var_or("API_REQUEST_TIMEOUT_SECONDS", 30u64)?;
        let max_range_days = var_or("API_MAX_RANGE_DAYS", 62i64)?;
        let default_range_days = var_or("API_DEFAULT_RANGE_DAYS", 7i64)?;

        // Scheduling defaults
        let fallback = WorkingHours::default();
        let timezone = match env::var("DEFAULT_TIMEZONE") {
            Ok(name) => parse_timezone(name.trim())?,
            Err(_) => fallback.timezone,
        };
        let default_working_hours = WorkingHours::new(
            var_or("DEFAULT_WORKDAY_START", fallback.start)?,
            var_or("DEFAULT_WORKDAY_END", fallback.end)?,
            var_or("DEFAULT_SLOT_MINUTES", fallback.slot_duration_minutes)?,
        )
        .with_timezone(timezone);
        default_working_hours
            .validate()
            .wrap_err("Invalid default working hours")?;

        Ok(Self {
            host,
            port,
            database_url,
            log_level,
            cors_origins,
            jwt_secret,
            jwt_audience,
            request_timeout,
            max_range_days,
            default_range_days,
            default_working_hours,
        })
    }

    /// Returns the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
