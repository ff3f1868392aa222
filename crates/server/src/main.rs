//! Lectern server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use lectern_api::{AppState, app};
use lectern_common::Config;
use lectern_core::{LectureService, PermissionService, RatingService, StaffService};
use lectern_db::repositories::{
    CourseRepository, LectureContentRepository, LectureRepository, RatingRepository,
    RoleRepository, UserRepository,
};
use lectern_scheduler::{ProcessCommandRunner, default_schedule, run_scheduler};
use axum::extract::DefaultBodyLimit;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Largest accepted request body.
const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lectern=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting lectern server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = lectern_db::init(&config.database).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    lectern_db::migrate(&db).await?;
    info!("Migrations completed");

    let db = Arc::new(db);

    // Create repositories
    let user_repo = UserRepository::new(Arc::clone(&db));
    let role_repo = RoleRepository::new(Arc::clone(&db));
    let course_repo = CourseRepository::new(Arc::clone(&db));
    let lecture_repo = LectureRepository::new(Arc::clone(&db));
    let content_repo = LectureContentRepository::new(Arc::clone(&db));
    let rating_repo = RatingRepository::new(Arc::clone(&db));

    // Create services
    let state = AppState {
        lecture_service: LectureService::new(course_repo.clone(), lecture_repo, content_repo),
        staff_service: StaffService::new(
            user_repo.clone(),
            role_repo.clone(),
            config.staff.system_role.clone(),
        ),
        permission_service: PermissionService::new(role_repo),
        rating_service: RatingService::new(rating_repo, course_repo, user_repo),
        base_url: config.server.url.clone(),
    };

    // Build router
    let app = app(state)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start the command scheduler
    if config.scheduler.enabled {
        let schedule = default_schedule(&config.scheduler, &config.app);
        let runner = Arc::new(ProcessCommandRunner::from_config(&config.scheduler));
        let handles = run_scheduler(schedule, runner);
        info!(commands = handles.len(), "Command scheduler started");
    }

    // Start server with graceful shutdown
    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
