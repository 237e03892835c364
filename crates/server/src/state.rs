use std::sync::Arc;

use kharcha_core::Classifier;

use crate::config::AppConfig;
use crate::whatsapp::ReplySender;

/// Shared, read-only per-process state. Cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub classifier: Arc<Classifier>,
    pub sender: Arc<dyn ReplySender>,
}

impl AppState {
    pub fn new(config: AppConfig, classifier: Classifier, sender: Arc<dyn ReplySender>) -> Self {
        Self {
            config: Arc::new(config),
            classifier: Arc::new(classifier),
            sender,
        }
    }
}
