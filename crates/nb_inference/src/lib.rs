pub mod models;
pub mod preprocess;

pub use models::create_model;

pub mod prelude {
    pub use super::models::{create_model, LexiconModel, RemoteModel};
    pub use nb_core::{Bias, BiasClassifier, Error, Result};
}
