use std::sync::Arc;

use crate::checker::delegate::ScoringDelegate;
use crate::checker::sink::ScoreSink;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub delegate: Arc<ScoringDelegate>,
    /// Pluggable persistence. `PgScoreSink` when `DATABASE_URL` is set,
    /// `DisabledSink` otherwise. The pool is only reachable through here.
    pub sink: Arc<dyn ScoreSink>,
}
