use std::sync::Arc;

use crate::config::Config;
use crate::interview::InterviewCoach;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Turn orchestrator. Owns the process-wide conversation store.
    pub coach: Arc<InterviewCoach>,
    pub config: Config,
}
