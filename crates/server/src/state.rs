use std::sync::Arc;

use printqueue_core::{AssignmentEngine, Config, SanitizedConfig, SqliteWorkQueue};

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<SqliteWorkQueue>,
    engine: AssignmentEngine<SqliteWorkQueue>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<SqliteWorkQueue>) -> Self {
        let engine = AssignmentEngine::new(Arc::clone(&store), config.assignment.clone());
        Self {
            config,
            store,
            engine,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn store(&self) -> &Arc<SqliteWorkQueue> {
        &self.store
    }

    pub fn engine(&self) -> &AssignmentEngine<SqliteWorkQueue> {
        &self.engine
    }
}
