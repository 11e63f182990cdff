use super::handlers;
use super::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    // Oversized resumes must reach the gate to be rejected with a reason
    let upload_limit = state
        .session_config
        .resume_limits
        .max_bytes
        .saturating_mul(2);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Catalog
        .route("/categories", get(handlers::list_categories))
        // Session lifecycle
        .route(
            "/session",
            post(handlers::create_session).get(handlers::get_session),
        )
        .route(
            "/session/resume",
            post(handlers::upload_resume).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/session/start", post(handlers::start_session))
        .route("/session/end", post(handlers::end_session))
        // Devices
        .route("/session/media/video", post(handlers::toggle_video))
        .route("/session/media/audio", post(handlers::toggle_audio))
        .route("/session/media/screen", post(handlers::screen_share))
        .route("/session/media/lost", post(handlers::device_lost))
        .route("/session/transcript", post(handlers::record_transcript))
        // Technical interviews
        .route("/session/code/run", post(handlers::run_code))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
