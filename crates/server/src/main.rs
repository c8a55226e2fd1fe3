//! Brototype Connect server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, extract::DefaultBodyLimit, middleware};
use connect_api::{AppState, TokenVerifier, auth_middleware, router as api_router};
use connect_common::{Config, LocalStorage};
use connect_core::{
    AnalyticsService, AnnouncementService, BadgeService, CenterService, ChangeBus,
    ComplaintService, FeedbackService, MeetingService, MessagingService, ProfileService,
    TimelineService,
};
use connect_db::repositories::{
    AnnouncementRepository, CenterRepository, ComplaintRepository, FeedbackRepository,
    MeetingRepository, MessageRepository, ProfileRepository, TimelineRepository,
    UserRoleRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Upper bound on producing response headers. SSE bodies are not affected.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
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
                error!(error = %e, "Failed to listen for SIGTERM");
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
    // JSON lines when LOG_FORMAT=json, human-readable otherwise
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "brototype_connect=debug,connect_api=debug,connect_core=debug,tower_http=debug"
                    .into()
            }),
        )
        .init();

    info!("Starting Brototype Connect server...");

    let config = Config::load()?;

    let db = Arc::new(connect_db::init(&config).await?);
    info!("Connected to database");

    info!("Running database migrations...");
    connect_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let complaint_repo = ComplaintRepository::new(Arc::clone(&db));
    let timeline_repo = TimelineRepository::new(Arc::clone(&db));
    let message_repo = MessageRepository::new(Arc::clone(&db));
    let feedback_repo = FeedbackRepository::new(Arc::clone(&db));
    let announcement_repo = AnnouncementRepository::new(Arc::clone(&db));
    let meeting_repo = MeetingRepository::new(Arc::clone(&db));
    let profile_repo = ProfileRepository::new(Arc::clone(&db));
    let user_role_repo = UserRoleRepository::new(Arc::clone(&db));
    let center_repo = CenterRepository::new(Arc::clone(&db));

    // Change bus feeding the SSE views
    let change_bus = ChangeBus::new(config.realtime.channel_capacity);

    // Initialize services
    let mut complaint_service = ComplaintService::new(
        complaint_repo.clone(),
        profile_repo.clone(),
        user_role_repo.clone(),
    );
    complaint_service.set_event_publisher(Arc::new(change_bus.clone()));

    let mut messaging_service = MessagingService::new(
        message_repo.clone(),
        complaint_repo.clone(),
        profile_repo.clone(),
    );
    messaging_service.set_event_publisher(Arc::new(change_bus.clone()));

    let mut meeting_service = MeetingService::new(meeting_repo.clone(), complaint_repo.clone());
    meeting_service.set_event_publisher(Arc::new(change_bus.clone()));

    let timeline_service =
        TimelineService::new(timeline_repo, complaint_repo.clone(), profile_repo.clone());
    let badge_service = BadgeService::new(complaint_repo.clone(), message_repo, meeting_repo);
    let feedback_service = FeedbackService::new(feedback_repo.clone(), complaint_repo.clone());
    let announcement_service = AnnouncementService::new(announcement_repo);
    let profile_service = ProfileService::new(
        profile_repo,
        user_role_repo.clone(),
        complaint_repo.clone(),
    );
    let center_service = CenterService::new(center_repo.clone());
    let analytics_service =
        AnalyticsService::new(complaint_repo, user_role_repo, center_repo, feedback_repo);

    let storage = LocalStorage::new(
        config.storage.base_path.clone(),
        config.storage.base_url.clone(),
    );

    let state = AppState {
        complaint_service,
        timeline_service,
        messaging_service,
        badge_service,
        feedback_service,
        announcement_service,
        meeting_service,
        profile_service,
        center_service,
        analytics_service,
        change_bus,
        storage: Arc::new(storage),
        token_verifier: Arc::new(TokenVerifier::new(&config.auth)),
        keep_alive: Duration::from_secs(config.realtime.keep_alive_secs),
        max_upload_bytes: config.storage.max_upload_bytes,
    };

    // Multipart framing needs some room on top of the file itself.
    let body_limit = config.storage.max_upload_bytes + 64 * 1024;

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .nest_service("/files", ServeDir::new(&config.storage.base_path))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
