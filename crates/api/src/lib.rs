//! # OfficeHours API
//!
//! The API crate serves the appointment scheduling engine over HTTP. Teachers
//! publish availability and work a queue of requests; students book open
//! slots and follow their appointments.
//!
//! ## Architecture
//!
//! This crate follows a layered architecture:
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Decode requests and encode responses
//! - **Services**: Own the scheduling rules (lifecycle, ranking, statistics)
//! - **Middleware**: Caller identity and error mapping
//! - **Config**: Environment and application configuration
//!
//! Storage sits behind [`SchedulingStore`], so the same services run over
//! PostgreSQL in production and an in-memory store in tests.

/// Configuration module for API settings
pub mod config;
/// Request handlers
pub mod handlers;
/// Middleware for caller identity and error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;
/// Scheduling services
pub mod services;

use std::{sync::Arc, time::Duration};

use axum::{
    error_handling::HandleErrorLayer,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    BoxError, Router,
};
use eyre::Result;
use officehours_core::clock::{Clock, SystemClock};
use officehours_db::SchedulingStore;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use config::{ApiConfig, SchedulingSettings};
use middleware::identity::{USER_ID_HEADER, USER_KIND_HEADER};
use services::{
    notifications, AppointmentService, AvailabilityService, NotificationBus, ProfileService,
    StatsService,
};

/// Shared application state that is accessible to all request handlers
///
/// Every service holds the same store and clock, so a slot booked through
/// one is immediately visible to the others.
pub struct ApiState {
    pub availability: AvailabilityService,
    pub appointments: Arc<AppointmentService>,
    pub stats: StatsService,
    pub profiles: ProfileService,
    pub notifications: NotificationBus,
    pub clock: Arc<dyn Clock>,
}

impl ApiState {
    pub fn new(
        store: Arc<dyn SchedulingStore>,
        clock: Arc<dyn Clock>,
        settings: &SchedulingSettings,
    ) -> Self {
        let notifications = NotificationBus::new(settings.notification_capacity);
        let appointments = Arc::new(AppointmentService::new(
            store.clone(),
            clock.clone(),
            notifications.clone(),
            settings.session_duration,
        ));

        Self {
            availability: AvailabilityService::new(store.clone(), clock.clone()),
            stats: StatsService::new(appointments.clone(), settings.timezone),
            profiles: ProfileService::new(store),
            appointments,
            notifications,
            clock,
        }
    }
}

/// Builds the application router with all routes attached to `state`
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Caller profile endpoints
        .merge(routes::users::routes())
        // Availability management endpoints
        .merge(routes::availability::routes())
        // Appointment lifecycle endpoints
        .merge(routes::appointments::routes())
        // Teacher dashboard statistics
        .merge(routes::stats::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring malformed CORS origin");
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
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(USER_KIND_HEADER),
            HeaderName::from_static(USER_ID_HEADER),
        ])
        .allow_origin(origins)
        .allow_credentials(true)
}

/// Starts the API server with the provided configuration and store
///
/// Installs logging, starts the notification dispatcher, and serves until
/// the listener fails.
///
/// # Example
///
/// ```rust,ignore
/// let config = ApiConfig::from_env()?;
/// let pool = officehours_db::create_pool(&config.database_url).await?;
/// start_server(config, Arc::new(PgStore::new(pool))).await?;
/// ```
pub async fn start_server(config: ApiConfig, store: Arc<dyn SchedulingStore>) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = Arc::new(ApiState::new(store, clock, &config.scheduling));
    notifications::spawn_dispatcher(state.notifications.subscribe());

    let app = router(state);

    // Apply CORS configuration if origins are specified
    let app = match &config.cors_origins {
        Some(origins) => app.layer(cors_layer(origins)),
        None => app,
    };

    let app = app.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(|_: BoxError| async {
                StatusCode::REQUEST_TIMEOUT
            }))
            .timeout(Duration::from_secs(config.request_timeout)),
    );

    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(
        session_minutes = config.scheduling.session_duration.num_minutes(),
        timezone = %config.scheduling.timezone,
        "Server listening on http://{}",
        addr
    );
    axum::serve(listener, app).await?;

    Ok(())
}
