//! # API Configuration Module
//!
//! This module handles loading and managing configuration for the OfficeHours
//! API server. It retrieves configuration values from environment variables
//! and provides defaults where appropriate.
//!
//! ## Environment Variables
//!
//! - `API_HOST`: The host address to bind the server to (default: "0.0.0.0")
//! - `API_PORT`: The port to listen on (default: 3000)
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `LOG_LEVEL`: Logging level (default: "info")
//! - `API_CORS_ORIGINS`: Comma-separated list of allowed CORS origins
//! - `API_REQUEST_TIMEOUT_SECONDS`: Request timeout (default: 30)
//! - `SESSION_DURATION_MINUTES`: Length of one appointment (default: 60)
//! - `SCHEDULE_TIMEZONE`: IANA zone used for calendar-day statistics (default: "UTC")
//! - `NOTIFICATION_CAPACITY`: Buffered notification events (default: 1024)

use chrono::Duration;
use chrono_tz::Tz;
use eyre::{eyre, Result, WrapErr};
use std::env;
use tracing::Level;

/// Scheduling knobs that shape engine behavior rather than the transport.
#[derive(Debug, Clone)]
pub struct SchedulingSettings {
    /// How long a session lasts; approved appointments auto-complete after it
    pub session_duration: Duration,

    /// Zone in which "today" and "yesterday" are evaluated
    pub timezone: Tz,

    /// Capacity of the notification broadcast buffer
    pub notification_capacity: usize,
}

impl Default for SchedulingSettings {
    fn default() -> Self {
        Self {
            session_duration: Duration::minutes(60),
            timezone: Tz::UTC,
            notification_capacity: 1024,
        }
    }
}

/// Configuration for the OfficeHours API server
///
/// # Example
///
/// ```no_run
/// use eyre::Result;
/// use officehours_api::config::ApiConfig;
///
/// fn example() -> Result<()> {
///     let config = ApiConfig::from_env()?;
///     println!("Starting server on {}:{}", config.host, config.port);
///     Ok(())
/// }
/// ```
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

    /// Request timeout in seconds
    pub request_timeout: u64,

    pub scheduling: SchedulingSettings,
}

impl ApiConfig {
    /// Creates a new ApiConfig from environment variables
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The DATABASE_URL environment variable is not set
    /// - The API_PORT value cannot be parsed as a u16
    /// - SESSION_DURATION_MINUTES is not a positive integer
    /// - SCHEDULE_TIMEZONE is not a known IANA zone
    pub fn from_env() -> Result<Self> {
        // Network settings
        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("API_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .wrap_err("Invalid API_PORT value")?;

        // Database settings
        let database_url = env::var("DATABASE_URL")
            .wrap_err("DATABASE_URL environment variable must be set")?;

        // Logging settings
        let log_level = parse_log_level(&env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()));

        // CORS settings
        let cors_origins = env::var("API_CORS_ORIGINS").ok().map(|origins| {
            origins.split(',').map(|s| s.trim().to_string()).collect()
        });

        // Performance settings
        let request_timeout = env::var("API_REQUEST_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        // Scheduling settings
        let defaults = SchedulingSettings::default();
        let session_duration = match env::var("SESSION_DURATION_MINUTES") {
            Ok(raw) => parse_session_minutes(&raw)?,
            Err(_) => defaults.session_duration,
        };
        let timezone = match env::var("SCHEDULE_TIMEZONE") {
            Ok(raw) => parse_timezone(&raw)?,
            Err(_) => defaults.timezone,
        };
        let notification_capacity = env::var("NOTIFICATION_CAPACITY")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(defaults.notification_capacity);

        Ok(Self {
            host,
            port,
            database_url,
            log_level,
            cors_origins,
            request_timeout,
            scheduling: SchedulingSettings {
                session_duration,
                timezone,
                notification_capacity,
            },
        })
    }

    /// Returns the server address as a string (e.g., "127.0.0.1:8080")
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub fn parse_log_level(raw: &str) -> Level {
    match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

pub fn parse_session_minutes(raw: &str) -> Result<Duration> {
    let minutes: i64 = raw
        .trim()
        .parse()
        .wrap_err_with(|| format!("Invalid SESSION_DURATION_MINUTES value: {}", raw))?;
    if minutes <= 0 {
        return Err(eyre!("SESSION_DURATION_MINUTES must be positive, got {}", minutes));
    }
    Ok(Duration::minutes(minutes))
}

pub fn parse_timezone(raw: &str) -> Result<Tz> {
    raw.trim()
        .parse::<Tz>()
        .map_err(|e| eyre!("Invalid SCHEDULE_TIMEZONE value {}: {}", raw, e))
}
