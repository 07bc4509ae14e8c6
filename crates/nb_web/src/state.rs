use std::sync::Arc;

use nb_core::BiasClassifier;
use nb_scrapers::IngestionManager;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<IngestionManager>,
    pub classifier: Arc<dyn BiasClassifier>,
}
