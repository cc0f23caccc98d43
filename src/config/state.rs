// Application state module
// Everything a connection task needs, shared read-only behind an Arc

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use super::types::Config;
use crate::function::FunctionRegistry;
use crate::server::signal::SignalHandler;

/// Application state
pub struct AppState {
    pub config: Config,
    pub functions: FunctionRegistry,
    /// Normalized `functions.base_path`
    pub base_path: String,
    pub signals: Arc<SignalHandler>,

    // Cached config values for fast access without locks
    pub cached_access_log: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(config: &Config, functions: FunctionRegistry) -> Self {
        Self {
            base_path: config.functions.normalized_base_path(),
            cached_access_log: Arc::new(AtomicBool::new(config.logging.access_log)),
            signals: Arc::new(SignalHandler::new()),
            config: config.clone(),
            functions,
        }
    }
}
