//! Local control API for the presentation layer
//!
//! This module exposes the single interview session over HTTP:
//! - GET /health - Health check
//! - GET /categories - Interview catalog (with built-in fallback)
//! - POST /session - Create a session for a category
//! - GET /session - Session snapshot (phase, media, captions, question)
//! - POST /session/resume - Upload the resume
//! - POST /session/start, POST /session/end - Lifecycle
//! - POST /session/media/{video,audio,screen} - Device toggles
//! - POST /session/media/lost - Report a held device that stopped
//! - POST /session/transcript - Caption locally recognized speech
//! - POST /session/code/run - Run code (technical interviews)

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
