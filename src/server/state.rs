use crate::config::PathConfig;
use crate::orchestrator::Orchestrator;
use crate::remote::Session;
use crate::server::jobs::JobStore;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared state behind every handler
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Remote endpoint pasted into the UI, if any
    pub session: RwLock<Option<Session>>,
    pub jobs: JobStore,
    pub paths: PathConfig,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, paths: PathConfig) -> Arc<Self> {
        Arc::new(Self {
            orchestrator,
            session: RwLock::new(None),
            jobs: JobStore::new(),
            paths,
        })
    }
}
