use crate::call::CallRegistry;
use crate::config::Config;
use crate::dashboard::DashboardSink;
use crate::speech::SpeechBackend;
use std::sync::Arc;

/// Process-scoped state injected into every handler: created once at
/// startup, gone at shutdown, no ambient globals.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    /// Live call sessions (call SID → session)
    pub registry: CallRegistry,

    /// Dashboard fan-out and committed histories
    pub sink: DashboardSink,

    /// Streaming recognition backend
    pub speech: Arc<dyn SpeechBackend>,
}

impl AppState {
    pub fn new(config: Config, speech: Arc<dyn SpeechBackend>) -> Self {
        Self {
            config: Arc::new(config),
            registry: CallRegistry::new(),
            sink: DashboardSink::new(),
            speech,
        }
    }
}
