use std::sync::Arc;

use nb_core::config::ClassifierConfig;
use nb_core::{BiasClassifier, Error, Result};
use tracing::info;

pub mod lexicon;
pub mod remote;

pub use lexicon::LexiconModel;
pub use remote::RemoteModel;

pub async fn create_model(config: &ClassifierConfig) -> Result<Arc<dyn BiasClassifier>> {
    let model: Arc<dyn BiasClassifier> = match config.model.as_str() {
        "lexicon" => Arc::new(LexiconModel::new(&config.lexicon)),
        "remote" => {
            let url = config
                .url
                .as_deref()
                .ok_or_else(|| Error::Config("The remote model needs a url".to_string()))?;
            Arc::new(RemoteModel::new(url)?)
        }
        other => return Err(Error::Config(format!("Unknown model: {}", other))),
    };
    info!("🧠 Inference model initialized (using {})", model.name());
    Ok(model)
}
