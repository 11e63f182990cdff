use std::sync::Arc;

use tokio::sync::RwLock;

use crate::backend::CategorySource;
use crate::session::{Collaborators, SessionConfig, SessionHandle};

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The one session this client drives (none until a category is picked)
    pub session: Arc<RwLock<Option<SessionHandle>>>,

    /// Services handed to each new session
    pub collaborators: Collaborators,

    pub catalog: Arc<dyn CategorySource>,

    pub session_config: SessionConfig,
}

impl AppState {
    pub fn new(
        collaborators: Collaborators,
        catalog: Arc<dyn CategorySource>,
        session_config: SessionConfig,
    ) -> Self {
        Self {
            session: Arc::new(RwLock::new(None)),
            collaborators,
            catalog,
            session_config,
        }
    }
}
